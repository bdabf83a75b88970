pub mod output;
pub mod progress;
pub mod store;

pub use output::{create_writer, print_terminal_summary, OutputWriter};
pub use store::{JsonStore, StoreStats, TestRunReader};
