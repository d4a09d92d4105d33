// src/time_ctrl/mod.rs
//! Контроль времени хода.
//!
//! Здесь собираем:
//! - правила (`TimeRules`);
//! - состояние и переходы таймера хода (`TurnState`);
//! - результат начисления бонуса (`BonusGrant`).

pub mod clock;
pub mod extra_time;
pub mod time_rules;

pub use clock::TurnState;
pub use extra_time::BonusGrant;
pub use time_rules::{TimeProfile, TimeRules};
