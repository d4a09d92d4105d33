use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{PlayerId, SessionId};

/// Простая генерация ID на основе монотонных счётчиков.
/// Удобно для локальных тестов, симуляций и однопроцессного сервера.
#[derive(Debug)]
pub struct IdGenerator {
    session_counter: AtomicU64,
    player_counter: AtomicU64,
}

impl IdGenerator {
    /// Создать генератор с начальным значением 1 для всех сущностей.
    pub fn new() -> Self {
        Self {
            session_counter: AtomicU64::new(1),
            player_counter: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_session_id(&self) -> SessionId {
        self.session_counter.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn next_player_id(&self) -> PlayerId {
        self.player_counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
