use crate::history::HistoryEntry;
use chrono::{
    DateTime,
    Utc,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::warn;

pub const CACHE_FILE_NAME: &str = "history.json";

pub fn default_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("rps-client"))
}

pub fn resolve_config_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_config_dir(),
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    saved_at: DateTime<Utc>,
    entries: Vec<HistoryEntry>,
}

/// On-disk mirror of the bounded history list. The chain stays
/// authoritative: the mirror is reloaded at startup for a warm first paint
/// and overwritten after every reconcile.
pub struct HistoryCache {
    path: PathBuf,
}

impl HistoryCache {
    pub fn new(dir: &Path) -> Self {
        HistoryCache {
            path: dir.join(CACHE_FILE_NAME),
        }
    }

    pub fn load(&self) -> Vec<HistoryEntry> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load history cache"
                );
                Vec::new()
            }
        }
    }

    pub fn store(&self, entries: &[HistoryEntry]) {
        if let Err(e) = self.try_store(entries) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write history cache"
            );
        }
    }

    fn try_load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .wrap_err("failed to read history cache")?;
        let file: CacheFile =
            serde_json::from_str(&raw).wrap_err("invalid history cache contents")?;
        Ok(file.entries)
    }

    fn try_store(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).wrap_err("failed to create cache directory")?;
        }
        let file = CacheFile {
            saved_at: Utc::now(),
            entries: entries.to_vec(),
        };
        let raw = serde_json::to_string_pretty(&file)
            .wrap_err("failed to encode history cache")?;
        fs::write(&self.path, raw).wrap_err("failed to write history cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{
        GameResult,
        Move,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("rps-client-cache-tests")
            .join(format!("{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn entry(seq: u64) -> HistoryEntry {
        HistoryEntry {
            player_move: Move::Rock,
            ai_move: Move::Scissors,
            result: GameResult::PlayerWins,
            sequence_number: seq,
        }
    }

    #[test]
    fn store_then_load__round_trips_entries() {
        let cache = HistoryCache::new(&scratch_dir("round-trip"));
        let entries = vec![entry(2), entry(1)];

        cache.store(&entries);

        assert_eq!(cache.load(), entries);
    }

    #[test]
    fn load__missing_file_yields_empty_list() {
        let cache = HistoryCache::new(&scratch_dir("missing"));

        assert!(cache.load().is_empty());
    }

    #[test]
    fn load__corrupt_file_yields_empty_list() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CACHE_FILE_NAME), "not json").unwrap();
        let cache = HistoryCache::new(&dir);

        assert!(cache.load().is_empty());
    }

    #[test]
    fn store__overwrites_previous_contents() {
        let cache = HistoryCache::new(&scratch_dir("overwrite"));
        cache.store(&[entry(1)]);

        cache.store(&[entry(9)]);

        assert_eq!(cache.load(), vec![entry(9)]);
    }
}
