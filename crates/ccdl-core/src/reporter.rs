//! Reporter trait for dependency injection
//!
//! Core operations report progress and status through this trait so they
//! stay independent of the console implementation in the CLI.

/// Progress sink shared by downloads and setup.
pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Downloading PHSP").
    fn section(&self, title: &str);

    /// Updates the progress of a file transfer.
    fn downloading(&self, file: &str, current: u64, total: Option<u64>);

    /// Updates the progress of an archive extraction.
    fn extracting(&self, file: &str, current: u64, total: Option<u64>);

    /// Marks a file as finished (`detail` is e.g. "downloaded", "skipped").
    fn done(&self, file: &str, detail: &str, size: Option<u64>);

    /// Marks a file as failed with a specific reason.
    fn failed(&self, file: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title)
    }
    fn downloading(&self, file: &str, current: u64, total: Option<u64>) {
        (**self).downloading(file, current, total)
    }
    fn extracting(&self, file: &str, current: u64, total: Option<u64>) {
        (**self).extracting(file, current, total)
    }
    fn done(&self, file: &str, detail: &str, size: Option<u64>) {
        (**self).done(file, detail, size)
    }
    fn failed(&self, file: &str, reason: &str) {
        (**self).failed(file, reason)
    }
    fn info(&self, msg: &str) {
        (**self).info(msg)
    }
    fn success(&self, msg: &str) {
        (**self).success(msg)
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg)
    }
    fn error(&self, msg: &str) {
        (**self).error(msg)
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs)
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &str, _: u64, _: Option<u64>) {}
    fn done(&self, _: &str, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
