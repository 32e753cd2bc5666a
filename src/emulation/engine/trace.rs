//! Execution tracing for landing-pad evaluation.
//!
//! When enabled, pad entry, every evaluated clause, the firing of a pad and
//! exception propagation are recorded to help diagnose unwinding issues in
//! interpreted code.
//!
//! # Usage
//!
//! Enable tracing via [`TracingConfig`](crate::emulation::TracingConfig):
//!
//! ```rust,no_run
//! use landingpad::emulation::{EmulationConfig, TracingConfig};
//!
//! let config = EmulationConfig::default()
//!     .with_tracing(TracingConfig::full_trace("unwind.log").with_context("startup"));
//! ```
//!
//! # Output Format
//!
//! Trace events are written as newline-delimited JSON (NDJSON/JSONL).
//! Each line is a complete JSON object representing one trace event.

use std::{
    collections::VecDeque,
    fmt::Write as FmtWrite,
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    mem,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use crate::emulation::{exception::ClauseKind, memory::NativeAddress};

/// A trace event recorded during landing-pad evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// An exception unwound into a landing pad.
    LandingPadEnter {
        /// Name of the landing pad.
        pad: Arc<str>,
        /// Unwind header of the in-flight exception.
        unwind_header: NativeAddress,
        /// Number of clauses on the pad.
        clause_count: usize,
        /// Whether the pad is a cleanup pad.
        cleanup: bool,
    },

    /// A clause was evaluated.
    ClauseEvaluated {
        /// Name of the landing pad.
        pad: Arc<str>,
        /// Position of the clause on the pad.
        index: usize,
        /// Catch or filter.
        kind: ClauseKind,
        /// Selector the clause produced (0 = no match).
        selector: i32,
    },

    /// The pad fired and the landing-pad record was written.
    LandingPadFired {
        /// Name of the landing pad.
        pad: Arc<str>,
        /// Final selector.
        selector: i32,
        /// Address of the written record.
        record: NativeAddress,
    },

    /// No clause matched on a non-cleanup pad; the exception keeps unwinding.
    ExceptionPropagated {
        /// Name of the landing pad.
        pad: Arc<str>,
        /// Unwind header of the propagated exception.
        unwind_header: NativeAddress,
    },
}

impl TraceEvent {
    /// Converts the event to a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_json_with_context(None)
    }

    /// Converts the event to a JSON string with an optional context prefix.
    ///
    /// When a context is provided, it is included as a "context" field at the
    /// beginning of the JSON object.
    #[must_use]
    pub fn to_json_with_context(&self, context: Option<&str>) -> String {
        let context_prefix = context
            .map(|c| format!(r#""context":"{}","#, escape_json(c)))
            .unwrap_or_default();

        match self {
            TraceEvent::LandingPadEnter {
                pad,
                unwind_header,
                clause_count,
                cleanup,
            } => {
                format!(
                    r#"{{{}"type":"landingpad_enter","pad":"{}","unwind_header":"0x{:X}","clause_count":{},"cleanup":{}}}"#,
                    context_prefix,
                    escape_json(pad),
                    unwind_header.value(),
                    clause_count,
                    cleanup
                )
            }
            TraceEvent::ClauseEvaluated {
                pad,
                index,
                kind,
                selector,
            } => {
                let kind: &'static str = kind.into();
                format!(
                    r#"{{{}"type":"clause","pad":"{}","index":{},"kind":"{}","selector":{}}}"#,
                    context_prefix,
                    escape_json(pad),
                    index,
                    kind,
                    selector
                )
            }
            TraceEvent::LandingPadFired {
                pad,
                selector,
                record,
            } => {
                format!(
                    r#"{{{}"type":"landingpad_fired","pad":"{}","selector":{},"record":"0x{:X}"}}"#,
                    context_prefix,
                    escape_json(pad),
                    selector,
                    record.value()
                )
            }
            TraceEvent::ExceptionPropagated { pad, unwind_header } => {
                format!(
                    r#"{{{}"type":"propagate","pad":"{}","unwind_header":"0x{:X}"}}"#,
                    context_prefix,
                    escape_json(pad),
                    unwind_header.value()
                )
            }
        }
    }
}

/// Escapes a string for JSON output.
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(result, "\\u{:04X}", c as u32);
            }
            c => result.push(c),
        }
    }
    result
}

/// A writer for trace events.
///
/// Handles writing trace events to either a file or an in-memory buffer.
/// Thread-safe via internal locking.
pub struct TraceWriter {
    /// File writer if file-based tracing is enabled.
    file: Option<Mutex<BufWriter<File>>>,
    /// In-memory buffer if memory-based tracing is enabled.
    buffer: Option<Mutex<VecDeque<TraceEvent>>>,
    /// Maximum buffer size (0 = unlimited).
    max_entries: usize,
    /// Number of events written.
    event_count: AtomicU64,
    /// Context prefix to include in trace output.
    context_prefix: Option<String>,
}

impl TraceWriter {
    /// Creates a new trace writer for file-based tracing.
    ///
    /// The file is opened in append mode so that several interpreter instances
    /// can share one trace file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or opened.
    pub fn new_file<P: AsRef<Path>>(path: P, context: Option<String>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Mutex::new(BufWriter::new(file))),
            buffer: None,
            max_entries: 0,
            event_count: AtomicU64::new(0),
            context_prefix: context,
        })
    }

    /// Creates a new trace writer for memory-based tracing.
    ///
    /// # Arguments
    ///
    /// * `max_entries` - Maximum trace entries to keep (0 for unlimited)
    /// * `context` - Context prefix included in each trace event
    #[must_use]
    pub fn new_memory(max_entries: usize, context: Option<String>) -> Self {
        Self {
            file: None,
            buffer: Some(Mutex::new(VecDeque::with_capacity(max_entries.min(10_000)))),
            max_entries,
            event_count: AtomicU64::new(0),
            context_prefix: context,
        }
    }

    /// Returns the context prefix, if any.
    #[must_use]
    pub fn context_prefix(&self) -> Option<&str> {
        self.context_prefix.as_deref()
    }

    /// Writes a trace event.
    pub fn write(&self, event: TraceEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);

        if let Some(ref file) = self.file {
            if let Ok(mut writer) = file.lock() {
                let json = event.to_json_with_context(self.context_prefix.as_deref());
                let _ = writeln!(writer, "{json}");
            }
        } else if let Some(ref buffer) = self.buffer {
            if let Ok(mut buf) = buffer.lock() {
                if self.max_entries > 0 && buf.len() >= self.max_entries {
                    buf.pop_front();
                }
                buf.push_back(event);
            }
        }
    }

    /// Flushes any buffered output.
    pub fn flush(&self) {
        if let Some(ref file) = self.file {
            if let Ok(mut writer) = file.lock() {
                let _ = writer.flush();
            }
        }
    }

    /// Returns the number of events written.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    /// Takes the in-memory buffer, leaving it empty.
    ///
    /// Returns `None` if this is a file-based writer.
    pub fn take_buffer(&self) -> Option<Vec<TraceEvent>> {
        self.buffer
            .as_ref()
            .and_then(|buf| buf.lock().ok().map(|mut b| Vec::from(mem::take(&mut *b))))
    }
}

impl Drop for TraceWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

impl std::fmt::Debug for TraceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceWriter")
            .field("is_file_based", &self.file.is_some())
            .field("max_entries", &self.max_entries)
            .field("event_count", &self.event_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn clause_event(index: usize) -> TraceEvent {
        TraceEvent::ClauseEvaluated {
            pad: Arc::from("lpad"),
            index,
            kind: ClauseKind::Filter,
            selector: -1,
        }
    }

    #[test]
    fn test_trace_event_json() {
        let json = clause_event(2).to_json();
        assert!(json.contains("\"type\":\"clause\""));
        assert!(json.contains("\"kind\":\"filter\""));
        assert!(json.contains("\"selector\":-1"));
        assert!(json.contains("\"index\":2"));
        assert!(!json.contains("\"context\""));
    }

    #[test]
    fn test_trace_event_json_with_context() {
        let event = TraceEvent::LandingPadFired {
            pad: Arc::from("main.lpad"),
            selector: 1,
            record: NativeAddress::new(0x7FFF_0000_0000),
        };

        let json = event.to_json_with_context(Some("warmup"));
        assert!(json.starts_with(r#"{"context":"warmup","#));
        assert!(json.contains("\"record\":\"0x7FFF00000000\""));
    }

    #[test]
    fn test_trace_writer_memory_bounded() {
        let writer = TraceWriter::new_memory(2, Some("test".to_string()));

        for index in 0..3 {
            writer.write(clause_event(index));
        }

        assert_eq!(writer.event_count(), 3);
        assert_eq!(writer.context_prefix(), Some("test"));

        let buffer = writer.take_buffer().unwrap();
        assert_eq!(buffer, vec![clause_event(1), clause_event(2)]);
        assert!(writer.take_buffer().unwrap().is_empty());
    }

    #[test]
    fn test_trace_writer_keeps_newest_in_order() {
        let writer = TraceWriter::new_memory(10, None);

        for index in 0..1_000 {
            writer.write(clause_event(index));
        }

        let expected: Vec<TraceEvent> = (990..1_000).map(clause_event).collect();
        assert_eq!(writer.take_buffer().unwrap(), expected);
        assert_eq!(writer.event_count(), 1_000);
    }

    #[test]
    fn test_trace_writer_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");

        let writer = TraceWriter::new_file(&path, Some("ctx".to_string())).unwrap();
        writer.write(TraceEvent::ExceptionPropagated {
            pad: Arc::from("lpad"),
            unwind_header: NativeAddress::new(0x40),
        });
        writer.flush();
        assert!(writer.take_buffer().is_none());

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"type\":\"propagate\""));
        assert!(contents.contains("\"context\":\"ctx\""));
    }

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json("hello"), "hello");
        assert_eq!(escape_json("hello\"world"), "hello\\\"world");
        assert_eq!(escape_json("line1\nline2"), "line1\\nline2");
    }
}
