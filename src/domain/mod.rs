//! Доменная модель: карты, слоты, хранилище слотов, сессия, раздача.

pub mod builder;
pub mod card;
pub mod deck;
pub mod layout;
pub mod session;
pub mod slot;
pub mod slot_store;

// Базовые идентификаторы
pub type PlayerId = u64;
pub type SessionId = u64;
pub type CardId = u64;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::Card и т.п.
pub use builder::create_session;
pub use card::*;
pub use deck::*;
pub use layout::LayoutRules;
pub use session::*;
pub use slot::*;
pub use slot_store::SlotStore;
