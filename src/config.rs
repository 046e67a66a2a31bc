//! Runtime configuration shared by the library and the `og` binary.

use crate::query::DEFAULT_STRONGEST_LIMIT;
use crate::storage::{DB_FILE, STORE_DIR};
use std::path::PathBuf;

/// Default number of rows shown per section of the report.
pub const DEFAULT_REPORT_ROWS: usize = 20;

/// Default export file name, relative to the root directory.
pub const DEFAULT_EXPORT_FILE: &str = "ontograph_export.json";

/// Where the knowledge base lives and how much of it reports show.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root directory containing .ontograph
    pub root: PathBuf,

    /// Rows in the strongest-relations ranking
    pub strongest_limit: usize,

    /// Rows per report section
    pub report_rows: usize,

    pub export_file: PathBuf,
}

impl Config {
    /// Create config with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strongest_limit: DEFAULT_STRONGEST_LIMIT,
            report_rows: DEFAULT_REPORT_ROWS,
            export_file: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }

    /// Config rooted at `dir`, or at the current directory when absent.
    pub fn resolve(dir: Option<PathBuf>) -> Self {
        let root = dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self::new(root)
    }

    pub fn with_strongest_limit(mut self, limit: usize) -> Self {
        self.strongest_limit = limit;
        self
    }

    pub fn with_report_rows(mut self, rows: usize) -> Self {
        self.report_rows = rows;
        self
    }

    pub fn with_export_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_file = path.into();
        self
    }

    /// Path of the SQLite database.
    pub fn db_path(&self) -> PathBuf {
        self.root.join(STORE_DIR).join(DB_FILE)
    }

    /// Export destination; relative paths are taken from the root.
    pub fn export_path(&self) -> PathBuf {
        self.root.join(&self.export_file)
    }
}
