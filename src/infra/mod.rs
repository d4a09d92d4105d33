//! Инфраструктурный слой вокруг движка сессий:
//! - генерация ID;
//! - RNG-реализации для движка и seed сессии;
//! - контракт хранения сессий;
//! - маппинг слотов между сервером и клиентом;
//! - настройка логирования.

pub mod ids;
pub mod mapping;
pub mod persistence;
pub mod rng;
pub mod rng_seed;
pub mod telemetry;

pub use ids::*;
pub use mapping::*;
pub use persistence::{InMemorySessionStore, PersistenceError, SessionStore};
pub use rng::*;
pub use rng_seed::RngSeed;
