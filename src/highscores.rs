//! Best-score persistence
//!
//! Only the high-water mark is kept. Stores never fail loudly: a missing or
//! unreadable file loads as 0, and a failed save is logged and forgotten.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the best score lives between runs
pub trait ScoreStore {
    fn load(&self) -> u64;
    fn save(&mut self, best: u64);
}

/// On-disk record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BestScoreRecord {
    best: u64,
}

/// Best score kept in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> u64 {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) => {
                log::info!("No best score at {} ({err}), starting fresh", self.path.display());
                return 0;
            }
        };
        match serde_json::from_str::<BestScoreRecord>(&json) {
            Ok(record) => {
                log::info!("Loaded best score {}", record.best);
                record.best
            }
            Err(err) => {
                log::warn!("Ignoring corrupt best score file {}: {err}", self.path.display());
                0
            }
        }
    }

    fn save(&mut self, best: u64) {
        let record = BestScoreRecord { best };
        let result = serde_json::to_string(&record)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(&self.path, json));
        match result {
            Ok(()) => log::debug!("Best score {best} saved"),
            Err(err) => log::warn!("Failed to save best score to {}: {err}", self.path.display()),
        }
    }
}

/// In-memory store for tests and sessions without a disk
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    best: u64,
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> u64 {
        self.best
    }

    fn save(&mut self, best: u64) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("merge_drop_{}_{name}.json", std::process::id()))
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = temp_path("round_trip");
        let mut store = JsonFileStore::new(&path);
        store.save(1234);
        assert_eq!(JsonFileStore::new(&path).load(), 1234);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_loads_zero() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_corrupt_file_loads_zero() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ best: oops").unwrap();
        assert_eq!(JsonFileStore::new(&path).load(), 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let mut store = JsonFileStore::new(std::env::temp_dir().join("no_such_dir_merge_drop/best.json"));
        store.save(10);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        store.save(7);
        assert_eq!(store.load(), 7);
    }
}
