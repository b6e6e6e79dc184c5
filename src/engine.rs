//! Event-driven race engine with a builder for configuration
//!
//! The engine consumes events one at a time, in stream order, and keeps one
//! [`CompetitorState`] per competitor. Once the stream is exhausted,
//! [`Engine::finalize`] infers disqualifications and [`Engine::report`]
//! derives the ordered results table.

use crate::competitor::{CompetitorState, SHOTS_PER_BOUT};
use crate::config::CompetitionConfig;
use crate::error::{BiathlonError, ConfigError, ProtocolError, ValidationError};
use crate::report::ReportRow;
use crate::traits::EventSink;
use crate::types::{format_clock, parse_clock, CompetitorId, Event, EventKind};
use chrono::{Duration, NaiveTime};
use std::collections::HashMap;

/// Race state machine for a single competition
#[derive(Debug)]
pub struct Engine<L: EventSink> {
    config: CompetitionConfig,
    sink: L,
    /// Competitors in order of first appearance
    competitors: Vec<CompetitorState>,
    index: HashMap<CompetitorId, usize>,
    finalized: bool,
}

impl<L: EventSink> Engine<L> {
    /// Create an engine writing accepted events to `sink`
    ///
    /// The configuration is used as given; [`EngineBuilder::build`] validates it.
    pub fn new(config: CompetitionConfig, sink: L) -> Self {
        Self {
            config,
            sink,
            competitors: Vec::new(),
            index: HashMap::new(),
            finalized: false,
        }
    }

    /// Create a builder for constructing an engine
    pub fn builder() -> EngineBuilder<L> {
        EngineBuilder::new()
    }

    /// Apply one event to the addressed competitor and forward it to the sink
    ///
    /// Unknown kinds, and synthetic kinds found in the input, are logged and
    /// dropped. On error nothing is mutated and nothing is forwarded.
    pub fn process_event(&mut self, event: Event) -> Result<(), BiathlonError> {
        if self.finalized {
            return Err(ProtocolError::AlreadyFinalized.into());
        }
        if !event.kind.is_incoming() {
            log::warn!(
                "Unknown event kind {} for competitor {} at {}, skipping",
                event.kind,
                event.competitor_id,
                format_clock(event.time)
            );
            return Ok(());
        }
        event.validate()?;

        // A competitor's state only exists once one of their events is accepted
        let finished = match self.index.get(&event.competitor_id) {
            Some(&slot) => Self::apply(&mut self.competitors[slot], &event, &self.config)?,
            None => {
                let mut state = CompetitorState::new(event.competitor_id);
                let finished = Self::apply(&mut state, &event, &self.config)?;
                self.insert(state);
                finished
            }
        };
        log::trace!("Processed {:?}", event);

        self.sink.record(&event)?;
        if let Some(finished) = finished {
            log::debug!(
                "Competitor {} finished at {}",
                finished.competitor_id,
                format_clock(finished.time)
            );
            self.sink.record(&finished)?;
        }
        Ok(())
    }

    /// Process a sequence of events in order, stopping at the first error
    pub fn process_events<I>(&mut self, events: I) -> Result<usize, BiathlonError>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut processed = 0;
        for event in events {
            self.process_event(event)?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Close the stream: disqualify every competitor who never started and
    /// did not withdraw, timestamped at their drawn start
    pub fn finalize(&mut self) -> Result<(), BiathlonError> {
        if self.finalized {
            return Err(ProtocolError::AlreadyFinalized.into());
        }
        self.finalized = true;

        for state in &self.competitors {
            let open = state.open_penalties();
            if open > 0 {
                log::warn!(
                    "Competitor {} left {} penalty interval(s) open; they are not counted",
                    state.competitor_id,
                    open
                );
            }

            if !state.has_started() && !state.not_finished {
                let time = state
                    .scheduled_start
                    .or(state.registered_time)
                    .or(state.last_event())
                    .unwrap_or(NaiveTime::MIN);
                log::debug!("Competitor {} never started, disqualifying", state.competitor_id);
                self.sink
                    .record(&Event::new(time, EventKind::Disqualification, state.competitor_id))?;
            }
        }

        self.sink.flush()?;
        Ok(())
    }

    /// Results table ordered by drawn start time
    ///
    /// Competitors sharing a start time keep the order in which they first
    /// appeared; competitors without a draw come last.
    pub fn report(&self) -> Result<Vec<ReportRow>, ProtocolError> {
        if !self.finalized {
            return Err(ProtocolError::NotFinalized);
        }

        let mut rows: Vec<ReportRow> = self
            .competitors
            .iter()
            .map(|state| ReportRow::derive(state, &self.config))
            .collect();
        rows.sort_by_key(|row| (row.scheduled_start.is_none(), row.scheduled_start));
        Ok(rows)
    }

    /// Process a whole stream, finalize and return the results table
    pub fn run<I>(&mut self, events: I) -> Result<Vec<ReportRow>, BiathlonError>
    where
        I: IntoIterator<Item = Event>,
    {
        self.process_events(events)?;
        self.finalize()?;
        Ok(self.report()?)
    }

    /// Get the state of a competitor, if they have appeared
    pub fn competitor(&self, competitor_id: CompetitorId) -> Option<&CompetitorState> {
        self.index
            .get(&competitor_id)
            .map(|&slot| &self.competitors[slot])
    }

    /// All competitor states in order of first appearance
    pub fn competitors(&self) -> &[CompetitorState] {
        &self.competitors
    }

    /// Get the competition configuration
    pub fn config(&self) -> &CompetitionConfig {
        &self.config
    }

    /// Get the sink receiving accepted events
    pub fn sink(&self) -> &L {
        &self.sink
    }

    /// Whether `finalize` has already run
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Consume the engine and return its sink
    pub fn into_sink(self) -> L {
        self.sink
    }

    /// Track a competitor seen for the first time
    fn insert(&mut self, state: CompetitorState) {
        log::trace!("New competitor {}", state.competitor_id);
        self.index.insert(state.competitor_id, self.competitors.len());
        self.competitors.push(state);
    }

    /// Transition a single competitor; returns the Finished event when the
    /// last lap is completed
    fn apply(
        state: &mut CompetitorState,
        event: &Event,
        config: &CompetitionConfig,
    ) -> Result<Option<Event>, BiathlonError> {
        if let Some(previous) = state.last_event() {
            if event.time < previous {
                return Err(ValidationError::OutOfOrder {
                    competitor_id: state.competitor_id,
                    time: format_clock(event.time),
                    previous: format_clock(previous),
                }
                .into());
            }
        }

        // A withdrawal is terminal
        if state.not_finished {
            log::debug!(
                "Competitor {} already withdrew, ignoring event {}",
                state.competitor_id,
                event.kind
            );
            state.touch(event.time);
            return Ok(None);
        }

        let mut finished = None;
        match event.kind {
            EventKind::Register => state.register(event.time),
            EventKind::Draw => {
                let token = event.param().unwrap_or_default();
                let scheduled = parse_clock(token).ok_or_else(|| ValidationError::InvalidDrawTime {
                    competitor_id: state.competitor_id,
                    token: token.to_string(),
                })?;
                if scheduled < config.start {
                    log::warn!(
                        "Competitor {} drawn at {}, before the planned start {}",
                        state.competitor_id,
                        token,
                        format_clock(config.start)
                    );
                }
                state.draw(scheduled);
            }
            EventKind::OnLine => {}
            EventKind::Start => {
                if let Some(scheduled) = state.scheduled_start {
                    if config.start_delta > Duration::zero()
                        && event.time > scheduled + config.start_delta
                    {
                        log::warn!(
                            "Competitor {} started at {}, outside the start window from {}",
                            state.competitor_id,
                            format_clock(event.time),
                            format_clock(scheduled)
                        );
                    }
                }
                state.start(event.time);
            }
            EventKind::Firing => state.enter_firing(),
            EventKind::Hit => state.hit(),
            EventKind::LeaveFiring => {
                let hits = state.leave_firing();
                if hits > SHOTS_PER_BOUT {
                    log::warn!(
                        "Competitor {} reported {} hits in a {}-shot bout",
                        state.competitor_id,
                        hits,
                        SHOTS_PER_BOUT
                    );
                }
            }
            EventKind::PenaltyEnter => {
                if state.has_open_penalty() {
                    log::warn!(
                        "Competitor {} entered the penalty laps again without leaving them",
                        state.competitor_id
                    );
                }
                state.enter_penalty(event.time);
            }
            EventKind::PenaltyLeave => state.leave_penalty(event.time)?,
            EventKind::LapEnd => {
                let laps = state.end_lap(event.time);
                if laps == config.laps as usize {
                    state.finish(event.time);
                    if config.firing_lines > 0 && state.bouts != config.expected_bouts() {
                        log::warn!(
                            "Competitor {} finished after {} firing bouts, expected {}",
                            state.competitor_id,
                            state.bouts,
                            config.expected_bouts()
                        );
                    }
                    finished = Some(Event::new(event.time, EventKind::Finished, state.competitor_id));
                }
            }
            EventKind::NotContinue => state.withdraw(event.comment()),
            // Not incoming; process_event drops these before dispatch
            EventKind::Disqualification | EventKind::Finished | EventKind::Unknown(_) => {
                return Ok(None)
            }
        }

        state.touch(event.time);
        Ok(finished)
    }
}

/// Builder for constructing engines with a fluent API
pub struct EngineBuilder<L: EventSink> {
    config: Option<CompetitionConfig>,
    sink: Option<L>,
}

impl<L: EventSink> EngineBuilder<L> {
    pub fn new() -> Self {
        Self {
            config: None,
            sink: None,
        }
    }

    /// Set the competition configuration
    pub fn with_config(mut self, config: CompetitionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the sink receiving accepted events
    pub fn with_sink(mut self, sink: L) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validate the configuration and build the engine
    pub fn build(self) -> Result<Engine<L>, ConfigError> {
        let config = self.config.ok_or(ConfigError::Missing { field: "config" })?;
        let sink = self.sink.ok_or(ConfigError::Missing { field: "sink" })?;
        config.validate()?;
        Ok(Engine::new(config, sink))
    }
}

impl<L: EventSink> Default for EngineBuilder<L> {
    fn default() -> Self {
        Self::new()
    }
}
