//! Response Sink
//!
//! Where a successful response body goes after it has been delivered.
//! The app overwrites a single fixed-name file on every success;
//! failures never write. The trait seam exists so tests can capture
//! writes without touching the filesystem.

use std::io;
use std::path::{Path, PathBuf};

/// Default output file, overwritten on every successful response
pub const DEFAULT_OUTPUT_FILE: &str = "content_out@ollama.md";

/// Destination for successful response bodies
pub trait ResponseSink: Send + Sync {
    /// Write the response body, replacing any previous content
    fn write(&self, text: &str) -> io::Result<()>;
}

/// Sink that overwrites a single file with the latest response
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink writing to the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this sink writes to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_FILE)
    }
}

impl ResponseSink for FileSink {
    fn write(&self, text: &str) -> io::Result<()> {
        std::fs::write(&self.path, format!("{text}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content_out@ollama.md");
        let sink = FileSink::new(&path);

        sink.write("first response").unwrap();
        sink.write("second response").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "second response\n");
    }

    #[test]
    fn test_write_to_unwritable_path_fails() {
        let sink = FileSink::new("/nonexistent/dir/out.md");
        assert!(sink.write("text").is_err());
    }
}
