//! Error types for the biathlon results engine

use thiserror::Error;
use crate::types::{CompetitorId, EventKind};

#[derive(Debug, Error)]
pub enum BiathlonError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid event line, expected [time] eventID competitorID extraParams: {line:?}")]
    TooFewTokens { line: String },

    #[error("Invalid timestamp, expected [HH:MM:SS.mmm], but received: {token}")]
    InvalidTimestamp { token: String },

    #[error("Invalid event ID {token}")]
    InvalidEventKind { token: String },

    #[error("Invalid competitor ID {token}")]
    InvalidCompetitorId { token: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid start time {token:?} for competitor {competitor_id}")]
    InvalidDrawTime { competitor_id: CompetitorId, token: String },

    #[error("Event {kind:?} for competitor {competitor_id} is missing a required parameter")]
    MissingParameter { kind: EventKind, competitor_id: CompetitorId },

    #[error("Event at {time} for competitor {competitor_id} precedes the previous event at {previous}")]
    OutOfOrder { competitor_id: CompetitorId, time: String, previous: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Competitor {competitor_id} left the penalty laps without entering them")]
    NoOpenPenalty { competitor_id: CompetitorId },

    #[error("Engine already finalized")]
    AlreadyFinalized,

    #[error("Report requested before the engine was finalized")]
    NotFinalized,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse {field} {value:?}")]
    InvalidTime { field: &'static str, value: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{field} is required")]
    Missing { field: &'static str },
}
