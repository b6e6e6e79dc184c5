//! Biathlon competition results engine
//!
//! Turns a chronological stream of timestamped race events into per-competitor
//! results: lap splits and speeds, penalty-loop time and speed, hit/shot tally
//! and a final status, ordered for a results table.

pub mod audit;
pub mod competitor;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod report;
pub mod traits;
pub mod types;

// Re-export core types and traits
pub use audit::{AuditEntry, AuditTrail, WriterSink};
pub use competitor::{CompetitorState, PenaltyInterval, SHOTS_PER_BOUT};
pub use config::CompetitionConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{BiathlonError, ConfigError, ParseError, ProtocolError, ValidationError};
pub use parser::parse_line;
pub use report::{format_duration, ReportRow, Split, Status};
pub use traits::EventSink;
pub use types::{format_clock, parse_clock, CompetitorId, Event, EventKind};
