//! Серверный движок партии на двоих в карточную игру со слотами.
//!
//! Слои:
//! - `domain` - карты, колоды, слоты и сама сессия;
//! - `engine` - правила хода, применение, пил, смена хода и таймаут;
//! - `time_ctrl` - таймер хода, пауза и бонусы;
//! - `broadcast` - дифф-рассылка игрокам и зрителям;
//! - `api` - команды, запросы и DTO для клиента;
//! - `state` / `presence` - реестр сессий, отключения и возвращения;
//! - `infra` - RNG, ID, хранилище, маппинг слотов и логирование.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod presence;
pub mod state;
pub mod time_ctrl;

pub use api::{ApiError, Command, Query, QueryResponse};
pub use config::{ConfigError, EngineConfig};
pub use presence::PresenceChange;
pub use state::{SessionError, SessionRegistry};
