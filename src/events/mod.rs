//! # Events Module
//!
//! Progress and observability events for visual search.
//!
//! The engine emits events through a channel so any front-end (CLI, web
//! handler, test) can subscribe. Skipped catalog entries are reported here
//! as well as in the search result.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Match(MatchEvent::EntrySkipped { id, reason }) = event {
//!             eprintln!("skipped {}: {}", id, reason);
//!         }
//!     }
//! });
//!
//! engine.search_with_events(&request, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
