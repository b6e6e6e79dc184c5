//! Report rows derived from final competitor state

use crate::competitor::CompetitorState;
use crate::config::CompetitionConfig;
use crate::types::CompetitorId;
use chrono::{Duration, NaiveTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// Final outcome of a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Finished,
    NotFinished,
    NotStarted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Finished => "Finished",
            Status::NotFinished => "NotFinished",
            Status::NotStarted => "NotStarted",
        };
        f.write_str(name)
    }
}

/// A time and the average speed over it, in meters per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Split {
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub speed: f64,
}

impl Split {
    /// Split covering `distance` meters in `duration`
    ///
    /// Speed is 0 unless the duration is strictly positive.
    pub fn over(duration: Duration, distance: f64) -> Self {
        Self {
            duration,
            speed: speed(distance, duration),
        }
    }

    pub fn zero() -> Self {
        Self {
            duration: Duration::zero(),
            speed: 0.0,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {:.3}}}", format_duration(self.duration), self.speed)
    }
}

/// One line of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub competitor_id: CompetitorId,
    pub status: Status,
    pub laps: Vec<Split>,
    pub penalty: Split,
    pub hits: u32,
    pub shots: u32,
    /// Used for ordering only, never rendered
    #[serde(skip)]
    pub scheduled_start: Option<NaiveTime>,
}

impl ReportRow {
    /// Derive the row for a competitor from their final state
    pub fn derive(state: &CompetitorState, config: &CompetitionConfig) -> Self {
        let status = if state.not_finished {
            Status::NotFinished
        } else if !state.has_started() {
            Status::NotStarted
        } else {
            Status::Finished
        };

        // Official timing runs against the drawn schedule
        let mut boundary = state.scheduled_start.or(state.actual_start);
        let laps = state
            .lap_end_times
            .iter()
            .map(|&end| {
                let split = match boundary {
                    Some(prev) => Split::over(end.signed_duration_since(prev), config.lap_len),
                    None => Split::zero(),
                };
                boundary = Some(end);
                split
            })
            .collect();

        let penalty_time = state.penalty_time();
        let misses = state.misses();
        let penalty = if misses > 0 {
            Split::over(penalty_time, config.penalty_len * f64::from(misses))
        } else {
            Split {
                duration: penalty_time,
                speed: 0.0,
            }
        };

        Self {
            competitor_id: state.competitor_id,
            status,
            laps,
            penalty,
            hits: state.hits,
            shots: state.shots,
            scheduled_start: state.scheduled_start,
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} [", self.status, self.competitor_id)?;
        for (i, lap) in self.laps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", lap)?;
        }
        write!(f, "] {} {}/{}", self.penalty, self.hits, self.shots)
    }
}

/// Meters per second over `duration`, or 0 when the duration is not positive
pub fn speed(distance: f64, duration: Duration) -> f64 {
    let millis = duration.num_milliseconds();
    if millis > 0 {
        distance / (millis as f64 / 1000.0)
    } else {
        0.0
    }
}

/// Render a duration as `MM:SS.mmm`; minutes are never wrapped into hours
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    format!(
        "{}{:02}:{:02}.{:03}",
        sign,
        millis / 60_000,
        millis / 1000 % 60,
        millis % 1000
    )
}

pub(crate) fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_milliseconds())
}
