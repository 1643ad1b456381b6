use chrono::Local;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A captured log line with its timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Clone, Default)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        // A panic while holding the lock leaves the deque intact
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.lock();
        if entries.len() >= MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The last `count` entries, oldest first
    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Writer handed to the fmt layer; each formatted line becomes a LogEntry
#[derive(Clone)]
pub struct RingBufferWriter {
    buffer: LogRingBuffer,
}

impl RingBufferWriter {
    pub fn new(buffer: LogRingBuffer) -> Self {
        Self { buffer }
    }
}

/// Split a compact fmt line, `LEVEL target: message`, into its parts
fn parse_line(line: &str) -> (Level, &str, &str) {
    let levels = [
        ("TRACE ", Level::TRACE),
        ("DEBUG ", Level::DEBUG),
        ("INFO ", Level::INFO),
        ("WARN ", Level::WARN),
        ("ERROR ", Level::ERROR),
    ];
    let Some((level, rest)) = levels
        .iter()
        .find_map(|&(prefix, level)| line.strip_prefix(prefix).map(|rest| (level, rest)))
    else {
        return (Level::INFO, "general", line);
    };

    match rest.split_once(": ") {
        Some((target, message)) if !target.contains(' ') => (level, target, message.trim()),
        _ => (level, "general", rest),
    }
}

impl std::io::Write for RingBufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                let (level, target, message) = parse_line(line);
                self.buffer
                    .push(LogEntry::new(level, target, message.to_string()));
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RingBufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Global log buffer, set by the first `init_tracing` call
static LOG_BUFFER: OnceLock<LogRingBuffer> = OnceLock::new();

pub fn get_log_buffer() -> Option<LogRingBuffer> {
    LOG_BUFFER.get().cloned()
}

/// Install a tracing subscriber that captures into the global ring buffer.
///
/// `RUST_LOG` controls the filter (default `info`). Calling this more than
/// once returns the existing buffer.
pub fn init_tracing() -> LogRingBuffer {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if let Some(buffer) = get_log_buffer() {
        return buffer;
    }
    let buffer = LOG_BUFFER.get_or_init(LogRingBuffer::new).clone();

    let fmt_layer = fmt::layer()
        .with_writer(RingBufferWriter::new(buffer.clone()))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time()
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Another subscriber may already be installed (e.g. by a test harness)
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(target: "system", "Logging initialized");
    }

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ring_buffer_caps_entries() {
        let buffer = LogRingBuffer::new();
        for i in 0..MAX_LOG_ENTRIES + 5 {
            buffer.push(LogEntry::new(Level::DEBUG, "grid", format!("entry {}", i)));
        }
        assert_eq!(buffer.len(), MAX_LOG_ENTRIES);

        let recent = buffer.get_recent(2);
        assert_eq!(recent[0].message, format!("entry {}", MAX_LOG_ENTRIES + 3));
        assert_eq!(recent[1].message, format!("entry {}", MAX_LOG_ENTRIES + 4));

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_writer_parses_compact_lines() {
        let buffer = LogRingBuffer::new();
        let mut writer = RingBufferWriter::new(buffer.clone());
        writer
            .write_all(b" INFO sql_workbench::services: Query finished in 12ms\n")
            .unwrap();
        writer.write_all(b"plain text\n").unwrap();

        let entries = buffer.get_recent(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "INFO");
        assert_eq!(entries[0].target, "sql_workbench::services");
        assert_eq!(entries[0].message, "Query finished in 12ms");
        assert_eq!(entries[1].target, "general");
        assert!(entries[1].format_for_display().ends_with("[general] plain text"));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        let first = init_tracing();
        let second = init_tracing();
        first.push(LogEntry::new(Level::INFO, "test", "shared".to_string()));
        assert!(second
            .get_recent(MAX_LOG_ENTRIES)
            .iter()
            .any(|e| e.message == "shared"));
    }
}
