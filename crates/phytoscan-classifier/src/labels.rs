//! Class label table
//!
//! The label file lists one class name per line. Line order defines the
//! mapping from the model's output index to a label, so the table is never
//! reordered or deduplicated after loading.

use phytoscan_core::{Error, Result};
use std::path::Path;

/// Ordered, immutable list of class names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    labels: Vec<String>,
}

impl ClassLabels {
    /// Create a label table from already-split names
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::resource("class label list is empty"));
        }

        if let Some(idx) = labels.iter().position(|l| l.is_empty()) {
            return Err(Error::resource(format!(
                "empty class label at index {}",
                idx
            )));
        }

        Ok(Self { labels })
    }

    /// Parse the contents of a label file.
    ///
    /// Trailing whitespace is stripped from every line. Blank lines at the
    /// end of the file are ignored; a blank line anywhere else would shift
    /// every following index and is rejected.
    pub fn parse(contents: &str) -> Result<Self> {
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

        let mut labels: Vec<String> = contents
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();

        while labels.last().is_some_and(|l| l.is_empty()) {
            labels.pop();
        }

        if let Some(idx) = labels.iter().position(|l| l.is_empty()) {
            return Err(Error::resource(format!(
                "empty class label on line {}",
                idx + 1
            )));
        }

        Self::new(labels)
    }

    /// Load a label file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::resource(format!(
                "Failed to read class labels {}: {}",
                path.display(),
                e
            ))
        })?;

        let labels = Self::parse(&contents).map_err(|e| match e {
            Error::Resource(msg) => Error::resource(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        tracing::debug!("Loaded {} class labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed table
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for an output index
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Iterate labels in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// The first `n` labels (fewer if the table is shorter)
    pub fn sample(&self, n: usize) -> &[String] {
        &self.labels[..n.min(self.labels.len())]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
