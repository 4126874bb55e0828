//! JSON output for tool integration
//!
//! When --json-progress flag is enabled, batch progress and status information
//! is emitted as JSON lines to stdout instead of the progress bar.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_processing::batch::{BatchItem, BatchStats};

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// Badge created for one archive entry
    FileCompleted {
        input_path: String,
        name: String,
        output_path: String,
    },
    /// Archive entry could not be turned into a badge
    FileFailed { input_path: String, error: String },
    /// Processing summary
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        collisions: usize,
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
    /// The final progress (current == total) is always emitted to ensure 100% completion.
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

    /// Completed or failed message for a finished batch item
    pub fn for_item(item: &BatchItem) -> Self {
        match item.failure_reason() {
            None => Self::FileCompleted {
                input_path: item.source_filename.clone(),
                name: item.derived_name.clone(),
                output_path: item.output_filename(),
            },
            Some(error) => Self::FileFailed {
                input_path: item.source_filename.clone(),
                error,
            },
        }
    }

    pub fn summary(stats: &BatchStats) -> Self {
        Self::Summary {
            total_files: stats.total,
            processed: stats.successful,
            failed: stats.failed,
            collisions: stats.collisions,
            duration_secs: stats.duration.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BadgeError;
    use std::time::Duration;

    #[test]
    fn test_messages_are_tagged() {
        let item = BatchItem {
            source_filename: "Jane_Doe.jpg".into(),
            derived_name: "Jane Doe".into(),
            outcome: Ok(vec![1]),
        };
        let json = serde_json::to_value(JsonMessage::for_item(&item)).unwrap();
        assert_eq!(json["type"], "filecompleted");
        assert_eq!(json["output_path"], "Jane_Doe.png");

        let failed = BatchItem {
            source_filename: "x.png".into(),
            derived_name: "x".into(),
            outcome: Err(BadgeError::Decode("bad".into())),
        };
        let json = serde_json::to_value(JsonMessage::for_item(&failed)).unwrap();
        assert_eq!(json["type"], "filefailed");
    }

    #[test]
    fn test_summary_from_stats() {
        let stats = BatchStats {
            total: 4,
            successful: 3,
            failed: 1,
            collisions: 1,
            duration: Duration::from_millis(1500),
        };
        assert_eq!(
            JsonMessage::summary(&stats),
            JsonMessage::Summary {
                total_files: 4,
                processed: 3,
                failed: 1,
                collisions: 1,
                duration_secs: 1.5,
            }
        );
    }
}
