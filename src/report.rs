//! Reporting sink used by the engines for user-facing progress lines.
//! The engines never decide where lines end up; the caller picks the sink.

use tracing::info;

pub trait Reporter {
    fn report(&mut self, message: &str);
}

/// Forwards each line to `tracing` on target `katal::report`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, message: &str) {
        info!(target: "katal::report", "{message}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    pub lines: Vec<String>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}

/// Drops every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _message: &str) {}
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, message: &str) {
        (**self).report(message)
    }
}
