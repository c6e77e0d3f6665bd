//! Comparison aggregation between two tags.

pub mod aggregator;
pub mod window;

pub use aggregator::{changed_files, commit_titles, fetch_comparison_data, scan_releases};
pub use window::{ReleaseWindow, Scan};
