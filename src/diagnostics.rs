use std::sync::Mutex;

/// Destination for out-of-band diagnostic lines
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, message: &str);
}

/// Prints each line to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl DiagnosticSink for ConsoleSink {
    fn emit(&self, message: &str) {
        println!("{}", message);
    }
}

/// Drops every line; the log facade and the kept entries still see them
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn emit(&self, _message: &str) {}
}

/// Diagnostic task: forwards a message to the console and the log, and keeps it for the run report
pub struct Diagnostics {
    sink: Box<dyn DiagnosticSink>,
    entries: Mutex<Vec<String>>,
}

impl Diagnostics {
    pub fn new(sink: impl DiagnosticSink + 'static) -> Self {
        Self { sink: Box::new(sink), entries: Mutex::new(Vec::new()) }
    }

    pub fn console() -> Self {
        Self::new(ConsoleSink)
    }

    pub fn silent() -> Self {
        Self::new(SilentSink)
    }

    /// Emit one diagnostic line
    pub fn task(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!(target: "diagnostics", "{}", message);
        self.sink.emit(message);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(message.to_string());
        }
    }

    /// Lines emitted so far
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Take the lines emitted since the last drain
    pub fn drain(&self) -> Vec<String> {
        self.entries.lock().map(|mut e| std::mem::take(&mut *e)).unwrap_or_default()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::console()
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").field("entries", &self.entries()).finish()
    }
}
