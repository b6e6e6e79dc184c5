//! Core data types: event kinds, events and clock helpers

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::ValidationError;

/// Identifier of a competitor as it appears in the event stream
pub type CompetitorId = u32;

/// Clock format used for event timestamps and drawn start times
pub const CLOCK_FORMAT: &str = "%H:%M:%S%.3f";

/// Kind of a race event, with the stable integer tags used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The competitor registered
    Register,
    /// The start time was set by a draw
    Draw,
    /// The competitor is on the start line
    OnLine,
    /// The competitor has started
    Start,
    /// The competitor is on the firing range
    Firing,
    /// The target has been hit
    Hit,
    /// The competitor left the firing range
    LeaveFiring,
    /// The competitor entered the penalty laps
    PenaltyEnter,
    /// The competitor left the penalty laps
    PenaltyLeave,
    /// The competitor ended the main lap
    LapEnd,
    /// The competitor can't continue
    NotContinue,
    /// Outgoing: the competitor is disqualified
    Disqualification,
    /// Outgoing: the competitor has finished
    Finished,
    /// Any tag outside the known set
    Unknown(u32),
}

impl EventKind {
    /// Map a wire tag to an event kind
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => EventKind::Register,
            2 => EventKind::Draw,
            3 => EventKind::OnLine,
            4 => EventKind::Start,
            5 => EventKind::Firing,
            6 => EventKind::Hit,
            7 => EventKind::LeaveFiring,
            8 => EventKind::PenaltyEnter,
            9 => EventKind::PenaltyLeave,
            10 => EventKind::LapEnd,
            11 => EventKind::NotContinue,
            32 => EventKind::Disqualification,
            33 => EventKind::Finished,
            other => EventKind::Unknown(other),
        }
    }

    /// The wire tag of this event kind
    pub fn code(self) -> u32 {
        match self {
            EventKind::Register => 1,
            EventKind::Draw => 2,
            EventKind::OnLine => 3,
            EventKind::Start => 4,
            EventKind::Firing => 5,
            EventKind::Hit => 6,
            EventKind::LeaveFiring => 7,
            EventKind::PenaltyEnter => 8,
            EventKind::PenaltyLeave => 9,
            EventKind::LapEnd => 10,
            EventKind::NotContinue => 11,
            EventKind::Disqualification => 32,
            EventKind::Finished => 33,
            EventKind::Unknown(code) => code,
        }
    }

    /// Whether this kind may legitimately appear in the input stream
    pub fn is_incoming(self) -> bool {
        matches!(
            self,
            EventKind::Register
                | EventKind::Draw
                | EventKind::OnLine
                | EventKind::Start
                | EventKind::Firing
                | EventKind::Hit
                | EventKind::LeaveFiring
                | EventKind::PenaltyEnter
                | EventKind::PenaltyLeave
                | EventKind::LapEnd
                | EventKind::NotContinue
        )
    }

    /// Whether this kind is only ever produced by the engine
    pub fn is_synthetic(self) -> bool {
        matches!(self, EventKind::Disqualification | EventKind::Finished)
    }

    /// Number of leading parameters this kind cannot do without
    pub fn required_params(self) -> usize {
        match self {
            EventKind::Draw => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single timestamped race event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: NaiveTime,
    pub kind: EventKind,
    pub competitor_id: CompetitorId,
    pub params: Vec<String>,
}

impl Event {
    /// Create an event without extra parameters
    pub fn new(time: NaiveTime, kind: EventKind, competitor_id: CompetitorId) -> Self {
        Self {
            time,
            kind,
            competitor_id,
            params: Vec::new(),
        }
    }

    /// Attach extra parameters to the event
    pub fn with_params<I, P>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// First extra parameter, if any
    pub fn param(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    /// All extra parameters joined by single spaces
    pub fn comment(&self) -> String {
        self.params.join(" ")
    }

    /// Check that the event carries the parameters its kind requires
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.params.len() < self.kind.required_params() {
            return Err(ValidationError::MissingParameter {
                kind: self.kind,
                competitor_id: self.competitor_id,
            });
        }
        Ok(())
    }
}

/// Parse a strict `HH:MM:SS.mmm` clock value
///
/// Exactly three fractional digits are required; chrono alone would accept
/// any number of them.
pub fn parse_clock(token: &str) -> Option<NaiveTime> {
    let bytes = token.as_bytes();
    if bytes.len() != 12 || bytes[2] != b':' || bytes[5] != b':' || bytes[8] != b'.' {
        return None;
    }
    if !token
        .bytes()
        .enumerate()
        .all(|(i, b)| matches!(i, 2 | 5 | 8) || b.is_ascii_digit())
    {
        return None;
    }
    NaiveTime::parse_from_str(token, CLOCK_FORMAT).ok()
}

/// Render a clock value as `HH:MM:SS.mmm`
pub fn format_clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}
