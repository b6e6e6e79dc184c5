//! Tokenizer for raw event lines
//!
//! Lines have the shape `[HH:MM:SS.mmm] <eventKind> <competitorID> [extraParam ...]`.

use crate::error::ParseError;
use crate::types::{parse_clock, CompetitorId, Event, EventKind};

/// Parse one raw line into an [`Event`]
pub fn parse_line(line: &str) -> Result<Event, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(ParseError::TooFewTokens {
            line: line.to_string(),
        });
    }

    let time_token = tokens[0];
    let time = time_token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .and_then(parse_clock)
        .ok_or_else(|| ParseError::InvalidTimestamp {
            token: time_token.to_string(),
        })?;

    let kind = tokens[1]
        .parse::<u32>()
        .map(EventKind::from_code)
        .map_err(|_| ParseError::InvalidEventKind {
            token: tokens[1].to_string(),
        })?;

    let competitor_id = tokens[2]
        .parse::<CompetitorId>()
        .map_err(|_| ParseError::InvalidCompetitorId {
            token: tokens[2].to_string(),
        })?;

    Ok(Event::new(time, kind, competitor_id).with_params(tokens[3..].iter().copied()))
}
