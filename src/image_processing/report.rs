use prettytable::{format, Cell, Row, Table};

use super::batch::{BatchItem, BatchStats};
use crate::utils::format_duration;

/// Per-item table of a finished batch, printed with `--report`.
pub struct BatchReport<'a> {
    items: &'a [BatchItem],
    stats: &'a BatchStats,
}

impl<'a> BatchReport<'a> {
    pub fn new(items: &'a [BatchItem], stats: &'a BatchStats) -> Self {
        Self { items, stats }
    }

    pub fn build_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        table.add_row(Row::new(vec![
            Cell::new("Source"),
            Cell::new("Name"),
            Cell::new("Output"),
            Cell::new("Status"),
        ]));

        for item in self.items {
            let (output, status) = match item.failure_reason() {
                None => (item.output_filename(), "✓".to_string()),
                Some(reason) => ("-".to_string(), format!("✗ {}", truncate(&reason, 50))),
            };
            table.add_row(Row::new(vec![
                Cell::new(&truncate(&item.source_filename, 30)),
                Cell::new(&truncate(&item.derived_name, 25)),
                Cell::new(&truncate(&output, 30)),
                Cell::new(&status),
            ]));
        }

        table
    }

    pub fn print(&self) {
        println!();
        println!("BATCH REPORT ({} images)\n", self.stats.total);
        self.build_table().printstd();
        println!(
            "\n{} succeeded, {} failed, {} name collisions in {} ({:.1}% success)",
            self.stats.successful,
            self.stats.failed,
            self.stats.collisions,
            format_duration(self.stats.duration),
            self.stats.success_rate()
        );
        println!();
    }
}

/// Truncate to `max_len` characters, marking the cut with an ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
