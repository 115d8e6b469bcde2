use tracing::warn;

/// Side channel for recoverable conditions. Fatal contract violations
/// travel through `Result`; everything else lands here and never mixes
/// with the error channel.
pub trait DiagnosticSink {
    fn warn(&mut self, message: String);
}

/// Default sink: forwards to the active `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
    }
}

/// Buffers warnings for later inspection. Used by tests and by hosts
/// that fold warnings into their own reporting.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub warnings: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}
