// src/core/history.rs

//! Append-only log of finished analyses, plus the listing and statistics
//! queries run over it. The pipeline never depends on these succeeding.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::models::AnalysisResult;

/// Bucket boundaries used by the statistics view.
pub const DEFAULT_BOUNDARIES: &[u8] = &[0, 20, 40, 60, 80, 100];

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode analysis: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("history lock poisoned")]
    Poisoned,
}

pub trait ResultLog: Send + Sync {
    fn insert(&self, result: &AnalysisResult) -> Result<(), HistoryError>;

    /// Newest first.
    fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisResult>, HistoryError>;

    fn histogram(&self, boundaries: &[u8]) -> Result<ScoreHistogram, HistoryError>;
}

// --- Statistics ---

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScoreBucket {
    pub lower: u8,
    /// Exclusive.
    pub upper: u8,
    pub count: usize,
}

/// Trust-score distribution over half-open `[lower, upper)` buckets.
///
/// Scores outside every bucket (including the last boundary itself) are
/// counted in `other`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScoreHistogram {
    pub total: usize,
    pub buckets: Vec<ScoreBucket>,
    pub other: usize,
}

impl ScoreHistogram {
    pub fn from_scores(scores: impl IntoIterator<Item = u8>, boundaries: &[u8]) -> Self {
        let mut buckets: Vec<ScoreBucket> = boundaries
            .windows(2)
            .map(|w| ScoreBucket { lower: w[0], upper: w[1], count: 0 })
            .collect();
        let mut total = 0;
        let mut other = 0;

        for score in scores {
            total += 1;
            match buckets.iter_mut().find(|b| b.lower <= score && score < b.upper) {
                Some(bucket) => bucket.count += 1,
                None => other += 1,
            }
        }

        Self { total, buckets, other }
    }
}

fn newest_first(mut results: Vec<AnalysisResult>, limit: usize) -> Vec<AnalysisResult> {
    results.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    results.truncate(limit);
    results
}

// --- In-Memory Log ---

/// Bounded in-process log; the oldest entries are evicted first.
pub struct MemoryResultLog {
    entries: RwLock<VecDeque<AnalysisResult>>,
    capacity: usize,
}

impl MemoryResultLog {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for MemoryResultLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ResultLog for MemoryResultLog {
    fn insert(&self, result: &AnalysisResult) -> Result<(), HistoryError> {
        let mut entries = self.entries.write().map_err(|_| HistoryError::Poisoned)?;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(result.clone());
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisResult>, HistoryError> {
        let entries = self.entries.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(newest_first(entries.iter().cloned().collect(), limit))
    }

    fn histogram(&self, boundaries: &[u8]) -> Result<ScoreHistogram, HistoryError> {
        let entries = self.entries.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(ScoreHistogram::from_scores(entries.iter().map(|r| r.trust_score()), boundaries))
    }
}

// --- JSON Lines Log ---

/// One JSON document per line in an append-only file.
pub struct JsonlResultLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io { path: self.path.clone(), source }
    }

    fn read_all(&self) -> Result<Vec<AnalysisResult>, HistoryError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let results = data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<AnalysisResult>(line) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(path = %self.path.display(), line = n + 1, error = %e, "Skipping unreadable history entry.");
                    None
                }
            })
            .collect();
        Ok(results)
    }
}

impl ResultLog for JsonlResultLog {
    fn insert(&self, result: &AnalysisResult) -> Result<(), HistoryError> {
        let line = serde_json::to_string(result)?;
        let _guard = self.write_lock.lock().map_err(|_| HistoryError::Poisoned)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        writeln!(file, "{line}").map_err(|e| self.io_err(e))?;

        debug!(path = %self.path.display(), id = %result.id(), "Analysis appended to history.");
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisResult>, HistoryError> {
        Ok(newest_first(self.read_all()?, limit))
    }

    fn histogram(&self, boundaries: &[u8]) -> Result<ScoreHistogram, HistoryError> {
        Ok(ScoreHistogram::from_scores(
            self.read_all()?.iter().map(|r| r.trust_score()),
            boundaries,
        ))
    }
}
