//! Per-competitor race state accumulated from the event stream

use crate::error::ProtocolError;
use crate::types::CompetitorId;
use chrono::{Duration, NaiveTime};
use serde::Serialize;

/// Shots fired in one visit to the firing range
pub const SHOTS_PER_BOUT: u32 = 5;

/// One entry/exit pair in the penalty loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PenaltyInterval {
    pub entered: NaiveTime,
    pub left: Option<NaiveTime>,
}

impl PenaltyInterval {
    /// Time spent in the loop, or `None` while the interval is still open
    pub fn duration(&self) -> Option<Duration> {
        self.left.map(|left| left.signed_duration_since(self.entered))
    }

    pub fn is_open(&self) -> bool {
        self.left.is_none()
    }
}

/// Mutable aggregate for a single competitor, owned by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorState {
    pub competitor_id: CompetitorId,
    pub registered_time: Option<NaiveTime>,
    pub scheduled_start: Option<NaiveTime>,
    pub actual_start: Option<NaiveTime>,
    pub lap_end_times: Vec<NaiveTime>,
    pub penalty_intervals: Vec<PenaltyInterval>,
    pub shots: u32,
    pub hits: u32,
    pub bouts: u32,
    pub not_finished: bool,
    pub not_finished_msg: String,
    pub finish_time: Option<NaiveTime>,
    /// Hits in the firing bout currently in progress
    bout_hits: u32,
    /// Time of the last event applied, for ordering checks
    last_event: Option<NaiveTime>,
}

impl CompetitorState {
    /// Create an empty state for a competitor seen for the first time
    pub fn new(competitor_id: CompetitorId) -> Self {
        Self {
            competitor_id,
            registered_time: None,
            scheduled_start: None,
            actual_start: None,
            lap_end_times: Vec::new(),
            penalty_intervals: Vec::new(),
            shots: 0,
            hits: 0,
            bouts: 0,
            not_finished: false,
            not_finished_msg: String::new(),
            finish_time: None,
            bout_hits: 0,
            last_event: None,
        }
    }

    /// Record the registration time
    pub fn register(&mut self, time: NaiveTime) {
        self.registered_time = Some(time);
    }

    /// Record the drawn start time
    pub fn draw(&mut self, scheduled: NaiveTime) {
        self.scheduled_start = Some(scheduled);
    }

    /// Record the actual start time
    pub fn start(&mut self, time: NaiveTime) {
        self.actual_start = Some(time);
    }

    /// Begin a firing bout
    pub fn enter_firing(&mut self) {
        self.bout_hits = 0;
    }

    pub fn hit(&mut self) {
        self.bout_hits += 1;
    }

    /// Close the current firing bout, folding its hits into the totals
    ///
    /// Returns the number of hits the bout contributed.
    pub fn leave_firing(&mut self) -> u32 {
        let bout_hits = self.bout_hits;
        self.shots += SHOTS_PER_BOUT;
        self.hits += bout_hits;
        self.bouts += 1;
        self.bout_hits = 0;
        bout_hits
    }

    /// Hits recorded so far in the bout in progress
    pub fn bout_hits(&self) -> u32 {
        self.bout_hits
    }

    pub fn enter_penalty(&mut self, time: NaiveTime) {
        self.penalty_intervals.push(PenaltyInterval {
            entered: time,
            left: None,
        });
    }

    /// Close the most recently opened penalty interval
    pub fn leave_penalty(&mut self, time: NaiveTime) -> Result<(), ProtocolError> {
        match self.penalty_intervals.last_mut() {
            Some(interval) if interval.is_open() => {
                interval.left = Some(time);
                Ok(())
            }
            _ => Err(ProtocolError::NoOpenPenalty {
                competitor_id: self.competitor_id,
            }),
        }
    }

    /// Whether the last penalty interval can be closed
    pub fn has_open_penalty(&self) -> bool {
        self.penalty_intervals.last().is_some_and(PenaltyInterval::is_open)
    }

    /// Record a completed lap and return the number of laps so far
    pub fn end_lap(&mut self, time: NaiveTime) -> usize {
        self.lap_end_times.push(time);
        self.lap_end_times.len()
    }

    pub fn finish(&mut self, time: NaiveTime) {
        self.finish_time = Some(time);
    }

    /// Mark the competitor as unable to continue
    pub fn withdraw(&mut self, message: String) {
        self.not_finished = true;
        self.not_finished_msg = message;
    }

    pub fn has_started(&self) -> bool {
        self.actual_start.is_some()
    }

    /// Sum of closed penalty intervals; open ones contribute nothing
    pub fn penalty_time(&self) -> Duration {
        self.penalty_intervals
            .iter()
            .filter_map(PenaltyInterval::duration)
            .fold(Duration::zero(), |total, d| total + d)
    }

    /// Number of penalty intervals that were never closed
    pub fn open_penalties(&self) -> usize {
        self.penalty_intervals.iter().filter(|i| i.is_open()).count()
    }

    /// Shots that did not hit a target
    pub fn misses(&self) -> u32 {
        self.shots.saturating_sub(self.hits)
    }

    /// Time of the last applied event
    pub fn last_event(&self) -> Option<NaiveTime> {
        self.last_event
    }

    pub(crate) fn touch(&mut self, time: NaiveTime) {
        self.last_event = Some(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = CompetitorState::new(3);
        assert_eq!(state.competitor_id, 3);
        assert!(!state.has_started());
        assert!(state.lap_end_times.is_empty());
        assert_eq!(state.penalty_time(), Duration::zero());
        assert_eq!(state.misses(), 0);
    }

    #[test]
    fn test_bout_hits_fold_on_leave() {
        let mut state = CompetitorState::new(1);
        state.enter_firing();
        state.hit();
        state.hit();
        assert_eq!(state.hits, 0);
        assert_eq!(state.leave_firing(), 2);
        assert_eq!(state.shots, 5);
        assert_eq!(state.hits, 2);
        assert_eq!(state.bouts, 1);

        state.enter_firing();
        state.hit();
        state.leave_firing();
        assert_eq!(state.shots, 10);
        assert_eq!(state.hits, 3);
        assert_eq!(state.misses(), 7);
    }

    #[test]
    fn test_enter_firing_discards_stray_hits() {
        let mut state = CompetitorState::new(1);
        state.hit();
        state.enter_firing();
        assert_eq!(state.bout_hits(), 0);
    }

    #[test]
    fn test_leave_penalty_without_enter_fails() {
        let mut state = CompetitorState::new(9);
        assert_eq!(
            state.leave_penalty(at(10, 0, 0)),
            Err(ProtocolError::NoOpenPenalty { competitor_id: 9 })
        );
    }

    #[test]
    fn test_leave_penalty_twice_fails() {
        let mut state = CompetitorState::new(9);
        state.enter_penalty(at(10, 0, 0));
        state.leave_penalty(at(10, 0, 30)).unwrap();
        assert!(state.leave_penalty(at(10, 0, 40)).is_err());
        assert_eq!(state.penalty_time(), Duration::seconds(30));
    }

    #[test]
    fn test_open_penalty_excluded_from_total() {
        let mut state = CompetitorState::new(2);
        state.enter_penalty(at(10, 0, 0));
        state.leave_penalty(at(10, 0, 20)).unwrap();
        state.enter_penalty(at(10, 5, 0));
        assert!(state.has_open_penalty());
        assert_eq!(state.open_penalties(), 1);
        assert_eq!(state.penalty_time(), Duration::seconds(20));
    }
}
