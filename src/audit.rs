//! Human-readable audit log of processed events
//!
//! Every accepted event, including the ones the engine synthesizes, becomes
//! one `[HH:MM:SS.mmm] ...` line. Kinds outside the known set produce no line.

use crate::traits::EventSink;
use crate::types::{format_clock, CompetitorId, Event, EventKind};
use std::io::{self, Write};

/// Render the audit line for an event, or `None` for unknown kinds
pub fn render(event: &Event) -> Option<String> {
    let id = event.competitor_id;
    let param = event.param().unwrap_or_default();
    let message = match event.kind {
        EventKind::Register => format!("The competitor({}) registered", id),
        EventKind::Draw => format!(
            "The start time for the competitor({}) was set by a draw to {}",
            id, param
        ),
        EventKind::OnLine => format!("The competitor({}) is on the start line", id),
        EventKind::Start => format!("The competitor({}) has started", id),
        EventKind::Firing => format!("The competitor({}) is on the firing range({})", id, param),
        EventKind::Hit => format!("The target({}) has been hit by competitor({})", param, id),
        EventKind::LeaveFiring => format!("The competitor({}) left the firing range", id),
        EventKind::PenaltyEnter => format!("The competitor({}) entered the penalty laps", id),
        EventKind::PenaltyLeave => format!("The competitor({}) left the penalty laps", id),
        EventKind::LapEnd => format!("The competitor({}) ended the main lap", id),
        EventKind::NotContinue => {
            format!("The competitor({}) can`t continue: {}", id, event.comment())
        }
        EventKind::Disqualification => format!("The competitor({}) is disqualified", id),
        EventKind::Finished => format!("The competitor({}) has finished", id),
        EventKind::Unknown(_) => return None,
    };
    Some(format!("[{}] {}", format_clock(event.time), message))
}

/// Sink writing one audit line per event to any writer
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink and return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for WriterSink<W> {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        match render(event) {
            Some(line) => writeln!(self.writer, "{}", line),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A recorded event together with its rendered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub event: Event,
    pub line: Option<String>,
}

/// In-memory audit trail that keeps every recorded event
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded entries
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Rendered lines, skipping events that have none
    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().filter_map(|e| e.line.as_deref()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filter entries by event kind
    pub fn filter_by_kind(&self, kind: EventKind) -> Vec<&Event> {
        self.entries
            .iter()
            .filter(|e| e.event.kind == kind)
            .map(|e| &e.event)
            .collect()
    }

    /// Filter entries by competitor
    pub fn filter_by_competitor(&self, competitor_id: CompetitorId) -> Vec<&Event> {
        self.entries
            .iter()
            .filter(|e| e.event.competitor_id == competitor_id)
            .map(|e| &e.event)
            .collect()
    }
}

impl EventSink for AuditTrail {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        self.entries.push(AuditEntry {
            event: event.clone(),
            line: render(event),
        });
        Ok(())
    }
}
