//! Рассылка состояния игрокам и зрителям.
//!
//! - `UpdateBatch` - что изменилось за одну единицу работы;
//! - `DiffBroadcaster` - подписи, дедупликация и порядок отправки;
//! - `OutboundEvent` / `EventSink` - исходящие события и их приёмник.

pub mod batch;
pub mod diff;
pub mod events;

pub use batch::{GameMessage, MessageKind, PendingMessage, UpdateBatch};
pub use diff::{slot_signature, DiffBroadcaster};
pub use events::{EventSink, OutboundEvent, RecordingSink};
