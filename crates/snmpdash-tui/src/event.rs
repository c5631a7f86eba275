//! Terminal input merged with the header clock.
//!
//! Polled inline by the app loop; there is no background reader task.

use std::time::Duration;

use crossterm::event::{Event as TermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::time::{Interval, MissedTickBehavior};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// The terminal changed size; the next draw picks up the new area.
    Resize,
    /// One clock period passed, so "updated … ago" needs a redraw.
    Clock,
}

pub struct TerminalEvents {
    input: EventStream,
    clock: Interval,
}

impl TerminalEvents {
    pub fn new(clock_period: Duration) -> Self {
        let mut clock = tokio::time::interval(clock_period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            input: EventStream::new(),
            clock,
        }
    }

    /// `None` once terminal input has closed or failed.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            tokio::select! {
                _ = self.clock.tick() => return Some(Event::Clock),
                input = self.input.next() => match input? {
                    Ok(TermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        return Some(Event::Key(key));
                    }
                    Ok(TermEvent::Resize(..)) => return Some(Event::Resize),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "terminal input failed");
                        return None;
                    }
                },
            }
        }
    }
}
