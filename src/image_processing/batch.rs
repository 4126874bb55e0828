use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::archive::{build_archive, extract_archive};
use super::BadgeEngine;
use crate::error::BadgeError;
use crate::utils::{derive_name_from_filename, entry_basename, has_valid_extension, output_filename};

/// One image found in an input archive and what happened to it.
#[derive(Debug)]
pub struct BatchItem {
    /// Entry name inside the input archive.
    pub source_filename: String,
    /// Person's name derived from the filename.
    pub derived_name: String,
    /// PNG bytes of the badge, or why it could not be produced.
    pub outcome: Result<Vec<u8>, BadgeError>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Entry name the badge gets in the output archive.
    pub fn output_filename(&self) -> String {
        output_filename(&self.derived_name)
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.outcome.as_ref().err().map(|e| e.to_string())
    }
}

/// Batch processing statistics
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Successful items whose output name was already taken by an earlier item.
    pub collisions: usize,
    pub duration: Duration,
}

impl BatchStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total as f64) * 100.0
        }
    }
}

/// Result of a batch request that produced at least one badge.
#[derive(Debug)]
pub struct BatchOutcome {
    /// ZIP archive of `<Derived_Name>.png` entries.
    pub archive: Vec<u8>,
    /// Every processed item, in source filename order.
    pub items: Vec<BatchItem>,
    pub stats: BatchStats,
}

/// Completion counter shared by the workers
struct BatchProgress {
    total: usize,
    processed_count: AtomicUsize,
}

impl BatchProgress {
    fn new(total: usize) -> Self {
        Self {
            total,
            processed_count: AtomicUsize::new(0),
        }
    }

    /// Increment processed count and return current count
    fn increment(&self) -> usize {
        self.processed_count.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Archive metadata written by macOS Finder (`__MACOSX/`, `._name.jpg`).
fn is_metadata_entry(entry_name: &str) -> bool {
    entry_name.starts_with("__MACOSX/")
        || entry_name.contains("/__MACOSX/")
        || entry_basename(entry_name).starts_with("._")
}

/// Turn every supported image in `archive_bytes` into a badge.
///
/// Items are processed concurrently on the engine's thread pool and fail
/// independently; a failed item is logged, recorded in `items` and left out
/// of the output archive. The archive is only assembled after every item has
/// finished. `progress` is called once per finished item with the number of
/// completed items and the total.
///
/// Output names that collide are resolved last-writer-wins in source
/// filename order.
pub fn process_archive<P>(
    engine: &BadgeEngine,
    archive_bytes: &[u8],
    progress: P,
) -> Result<BatchOutcome, BadgeError>
where
    P: Fn(&BatchItem, usize, usize) + Send + Sync,
{
    let start_time = Instant::now();
    let extensions = &engine.config().extensions;

    let candidates: Vec<(String, Vec<u8>)> = extract_archive(archive_bytes)?
        .into_iter()
        .filter(|(name, _)| !is_metadata_entry(name) && has_valid_extension(name, extensions))
        .collect();

    if candidates.is_empty() {
        return Err(BadgeError::EmptyBatch);
    }

    let total = candidates.len();
    tracing::info!(images = total, "processing archive");

    let counter = BatchProgress::new(total);
    let items: Vec<BatchItem> = engine.pool().install(|| {
        candidates
            .into_par_iter()
            .map(|(source_filename, bytes)| {
                let derived_name = derive_name_from_filename(&source_filename);
                let outcome = engine.process(&bytes, &derived_name);

                if let Err(e) = &outcome {
                    tracing::warn!(file = %source_filename, error = %e, "skipping image");
                }

                let item = BatchItem {
                    source_filename,
                    derived_name,
                    outcome,
                };
                progress(&item, counter.increment(), counter.total);
                item
            })
            .collect()
    });

    let successful = items.iter().filter(|item| item.is_success()).count();
    let failed = total - successful;

    if successful == 0 {
        tracing::warn!(failed, "every image in the archive failed");
        return Err(BadgeError::AllFailed { failed });
    }

    let mut outputs: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut collisions = 0;
    for item in &items {
        if let Ok(png) = &item.outcome {
            let name = item.output_filename();
            if outputs.insert(name.clone(), png.clone()).is_some() {
                collisions += 1;
                tracing::warn!(
                    output = %name,
                    source = %item.source_filename,
                    "output name collision, keeping the later file"
                );
            }
        }
    }

    let archive = build_archive(&outputs)?;
    let stats = BatchStats {
        total,
        successful,
        failed,
        collisions,
        duration: start_time.elapsed(),
    };

    tracing::info!(
        total = stats.total,
        successful = stats.successful,
        failed = stats.failed,
        collisions = stats.collisions,
        "batch finished"
    );

    Ok(BatchOutcome {
        archive,
        items,
        stats,
    })
}
