use crate::upload::DEFAULT_STAT_BATCH_SIZE;

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// Tuning knobs for conflict detection and processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Paths per stat request.
    pub stat_batch_size: usize,
    pub max_concurrent_transfers: usize,
    /// Suffix candidates tried before a rename gives up.
    pub max_rename_attempts: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            stat_batch_size: DEFAULT_STAT_BATCH_SIZE,
            max_concurrent_transfers: DEFAULT_UPLOAD_CONCURRENCY,
            max_rename_attempts: DEFAULT_MAX_RENAME_ATTEMPTS,
        }
    }
}

impl ReconcileConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset, unparsable and zero values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            stat_batch_size: read_usize(
                lookup("UPTREE_STAT_BATCH_SIZE"),
                DEFAULT_STAT_BATCH_SIZE,
            ),
            max_concurrent_transfers: read_usize(
                lookup("UPTREE_UPLOAD_CONCURRENCY"),
                DEFAULT_UPLOAD_CONCURRENCY,
            ),
            max_rename_attempts: read_u32(
                lookup("UPTREE_MAX_RENAME_ATTEMPTS"),
                DEFAULT_MAX_RENAME_ATTEMPTS,
            ),
        }
    }
}

fn read_usize(value: Option<String>, default: usize) -> usize {
    value
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn read_u32(value: Option<String>, default: u32) -> u32 {
    value
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
