//! JSON output for scripted runs
//!
//! When --json-progress flag is enabled, all progress and status information
//! is emitted as JSON lines to stdout, suppressing all other output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// A spread was skipped because one of its inputs is missing
    Skipped {
        spread: String,
        reason: String,
        path: String,
    },
    /// A page was sliced into tiles
    PageCropped {
        image: String,
        page_dir: String,
        cols: u32,
        rows: u32,
        tiles: usize,
        duration_secs: f64,
    },
    /// Face pasting summary
    Summary {
        total_tiles: usize,
        labeled: usize,
        background: usize,
        skipped_spreads: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit progress message (throttled to ~25 FPS)
    ///
    /// The final progress (current == total) is always emitted.
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms.saturating_sub(last_ms) >= 40 || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Create and emit skipped spread message
    pub fn skipped(spread: &str, reason: impl Into<String>, path: &Path) {
        Self::Skipped {
            spread: spread.to_string(),
            reason: reason.into(),
            path: path.display().to_string(),
        }
        .emit();
    }

    /// Create and emit page cropped message
    pub fn page_cropped(
        image: &Path,
        page_dir: &Path,
        cols: u32,
        rows: u32,
        tiles: usize,
        duration_secs: f64,
    ) {
        Self::PageCropped {
            image: image.display().to_string(),
            page_dir: page_dir.display().to_string(),
            cols,
            rows,
            tiles,
            duration_secs,
        }
        .emit();
    }

    /// Create and emit summary message
    pub fn summary(
        total_tiles: usize,
        labeled: usize,
        skipped_spreads: usize,
        duration_secs: f64,
    ) {
        Self::Summary {
            total_tiles,
            labeled,
            background: total_tiles - labeled,
            skipped_spreads,
            duration_secs,
        }
        .emit();
    }
}
