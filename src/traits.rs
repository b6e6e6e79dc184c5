//! Core traits for the engine

use crate::types::Event;
use std::io;

/// Receiver of every accepted event, raw and synthesized, in processing order
pub trait EventSink {
    /// Record a single event
    fn record(&mut self, event: &Event) -> io::Result<()>;

    /// Flush any buffered output
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        (**self).record(event)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        (**self).record(event)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
