//! Event channel built on crossbeam-channel.
//!
//! Lets the search engine report progress without knowing who is listening.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use tracing::trace;

use super::Event;

/// Sending half handed to the search engine. Clones share one queue.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Queue an event without ever blocking the search.
    ///
    /// With no receiver left the event is discarded. On a bounded channel
    /// that is full the event is dropped rather than waiting for the
    /// listener to catch up.
    pub fn send(&self, event: Event) {
        match self.inner.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => trace!("Event queue full, dropping event"),
        }
    }
}

/// Listening half.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Blocking iterator that ends when every sender is gone
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything queued right now, oldest first
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; nothing is ever dropped while the receiver lives.
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(unbounded())
    }

    /// Channel holding at most `capacity` events. Events sent while it is
    /// full are lost, so a slow listener only sees fewer progress updates.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(bounded(capacity))
    }

    fn wrap((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender nobody listens to.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MatchEvent, SearchEvent};
    use std::thread;
    use uuid::Uuid;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Match(MatchEvent::Started { catalog_size: 25 }));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Match(MatchEvent::Started { catalog_size }) => {
                assert_eq!(catalog_size, 25);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Search(SearchEvent::Started {
            query_id: Uuid::nil(),
        }));
    }

    #[test]
    fn full_bounded_channel_drops_instead_of_blocking() {
        let (sender, receiver) = EventChannel::bounded(1);

        // Same thread as the receiver: a blocking send would hang here
        for size in 0..3 {
            sender.send(Event::Match(MatchEvent::Started { catalog_size: size }));
        }

        let events = receiver.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::Match(MatchEvent::Started { catalog_size: 0 })
        ));
    }

    #[test]
    fn bounded_channel_respects_capacity() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.send(Event::Search(SearchEvent::Started {
            query_id: Uuid::nil(),
        }));
        sender.send(Event::Search(SearchEvent::Started {
            query_id: Uuid::nil(),
        }));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn drain_returns_queued_events_in_order() {
        let (sender, receiver) = EventChannel::new();

        sender.send(Event::Match(MatchEvent::Started { catalog_size: 1 }));
        sender.send(Event::Search(SearchEvent::Started {
            query_id: Uuid::nil(),
        }));

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Match(_)));
        assert!(receiver.drain().is_empty());
    }
}
