//! Bounded history of past analyses
//!
//! Newest record first; once full, the oldest record is evicted. Persisted as
//! a JSON array so the CLI can list and re-open earlier analyses.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;
use crate::loan::LoanInput;
use crate::scenario::ScenarioSet;

/// Records kept before the oldest is evicted
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One stored analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Millisecond timestamp, unique enough for a single user
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub input: LoanInput,
    pub scenarios: ScenarioSet,
}

impl HistoryRecord {
    pub fn new(input: LoanInput, scenarios: ScenarioSet) -> Self {
        Self::at(Utc::now(), input, scenarios)
    }

    pub fn at(recorded_at: DateTime<Utc>, input: LoanInput, scenarios: ScenarioSet) -> Self {
        Self {
            id: recorded_at.timestamp_millis(),
            recorded_at,
            input,
            scenarios,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Load from a JSON file; a missing file is an empty history
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::default();

        let text = match fs::read_to_string(path.as_ref()) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(store),
            Err(e) => return Err(e.into()),
        };

        let records: Vec<HistoryRecord> = serde_json::from_str(&text)?;
        // File is newest first; keep only what fits
        store.records = records.into_iter().take(store.capacity).collect();
        debug!("loaded {} history records from {}", store.len(), path.as_ref().display());
        Ok(store)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Insert as newest; returns the evicted record if the store was full
    pub fn push(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        self.records.push_front(record);
        if self.records.len() > self.capacity {
            self.records.pop_back()
        } else {
            None
        }
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: i64) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
