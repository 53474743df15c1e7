use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_GRID_SIZE: u32 = 8;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Tunables for an [`EditorStore`](crate::EditorStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub page_id: Uuid,
    /// Quiet period before a pending write is sent.
    pub debounce: Duration,
    /// Snap step for element position and size. 0 or 1 disables snapping.
    pub grid_size: u32,
    /// Maximum number of undo snapshots.
    pub history_limit: usize,
}

impl EditorConfig {
    pub fn new(page_id: Uuid) -> Self {
        Self {
            page_id,
            debounce: DEFAULT_DEBOUNCE,
            grid_size: DEFAULT_GRID_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Defaults overridden by `EDITOR_DEBOUNCE_MS`, `EDITOR_GRID_SIZE` and
    /// `EDITOR_HISTORY_LIMIT` when set.
    pub fn from_env(page_id: Uuid) -> Result<Self, ConfigError> {
        Self::from_lookup(page_id, |var| std::env::var(var).ok())
    }

    pub fn from_lookup(
        page_id: Uuid,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::new(page_id);

        if let Some(ms) = parse_var::<u64>(&lookup, "EDITOR_DEBOUNCE_MS", "duration in milliseconds")? {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(grid) = parse_var(&lookup, "EDITOR_GRID_SIZE", "grid size in pixels")? {
            config.grid_size = grid;
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "EDITOR_HISTORY_LIMIT", "history length")? {
            if limit == 0 {
                return Err(ConfigError::Invalid {
                    var: "EDITOR_HISTORY_LIMIT",
                    value: limit.to_string(),
                    expected: "history length of at least 1",
                });
            }
            config.history_limit = limit;
        }

        Ok(config)
    }

    /// Rounds `v` to the nearest grid line.
    pub fn snap(&self, v: f64) -> f64 {
        if self.grid_size <= 1 {
            return v;
        }
        let g = self.grid_size as f64;
        (v / g).round() * g
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                value,
                expected,
            }),
    }
}
