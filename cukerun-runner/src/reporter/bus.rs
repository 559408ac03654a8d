// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::events::TestEvent;
use crate::errors::{DisplayErrorChain, ReporterError};
use tracing::warn;

/// Something that observes the events of a run.
pub trait EventSubscriber {
    /// A short name used in log messages.
    fn name(&self) -> &str;

    /// Handles a single event.
    fn handle_event(&mut self, event: &TestEvent) -> Result<(), ReporterError>;
}

impl<T: EventSubscriber + ?Sized> EventSubscriber for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn handle_event(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        (**self).handle_event(event)
    }
}

/// Delivers every event to every subscriber, in subscription order.
///
/// A failing subscriber doesn't stop delivery to the others: its error is logged and kept for
/// [`into_errors`](Self::into_errors).
#[derive(Default)]
pub struct EventBus<'a> {
    subscribers: Vec<Box<dyn EventSubscriber + 'a>>,
    errors: Vec<(String, ReporterError)>,
}

impl<'a> EventBus<'a> {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber.
    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'a) -> &mut Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Returns the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers `event` to every subscriber.
    pub fn publish(&mut self, event: &TestEvent) {
        for subscriber in &mut self.subscribers {
            if let Err(err) = subscriber.handle_event(event) {
                warn!(
                    "subscriber `{}` failed to handle {}: {}",
                    subscriber.name(),
                    event.kind,
                    DisplayErrorChain::new(&err),
                );
                self.errors.push((subscriber.name().to_owned(), err));
            }
        }
    }

    /// Returns the errors collected so far, with the name of the subscriber that produced each.
    pub fn errors(&self) -> &[(String, ReporterError)] {
        &self.errors
    }

    /// Consumes the bus, returning every error collected.
    pub fn into_errors(self) -> Vec<(String, ReporterError)> {
        self.errors
    }
}

impl std::fmt::Debug for EventBus<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "subscribers",
                &self.subscribers.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("errors", &self.errors)
            .finish()
    }
}
