//! Сохранение сессий.
//!
//! Сама запись на диск - забота внешнего коллаборатора; здесь контракт
//! `save`/`load`, кодирование в JSON и in-memory реализация для тестов.
//! Карта слотов сериализуется как объект со строковыми ключами `"<owner>:<KIND>:<index>"`.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::domain::{GameSession, SessionId};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Ошибка сериализации сессии: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Сохранение сессии {0} повреждено: карты есть, слотов нет")]
    Corrupt(SessionId),

    #[error("Хранилище недоступно: {0}")]
    Unavailable(String),
}

/// Абстракция хранилища сессий.
pub trait SessionStore {
    fn save(&mut self, id: SessionId, session: &GameSession) -> Result<(), PersistenceError>;

    /// `None`, если сохранения нет или оно повреждено.
    fn load(&self, id: SessionId) -> Option<GameSession>;

    fn delete(&mut self, id: SessionId);
}

pub fn encode_session(session: &GameSession) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(session)?)
}

/// Разобрать сохранение. Карты при пустой карте слотов - повреждение.
pub fn decode_session(raw: &str) -> Result<GameSession, PersistenceError> {
    let session: GameSession = serde_json::from_str(raw)?;
    if !session.cards.is_empty() && session.slots.slot_count() == 0 {
        return Err(PersistenceError::Corrupt(session.id));
    }
    Ok(session)
}

/// Простая in-memory реализация: хранит закодированный JSON.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    saves: HashMap<SessionId, String>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Положить сырое сохранение как есть.
    pub fn put_raw(&mut self, id: SessionId, raw: impl Into<String>) {
        self.saves.insert(id, raw.into());
    }

    pub fn raw(&self, id: SessionId) -> Option<&str> {
        self.saves.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&mut self, id: SessionId, session: &GameSession) -> Result<(), PersistenceError> {
        let raw = encode_session(session)?;
        self.saves.insert(id, raw);
        Ok(())
    }

    fn load(&self, id: SessionId) -> Option<GameSession> {
        let raw = self.saves.get(&id)?;
        match decode_session(raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(session_id = id, %err, "сохранение отброшено");
                None
            }
        }
    }

    fn delete(&mut self, id: SessionId) {
        self.saves.remove(&id);
    }
}
