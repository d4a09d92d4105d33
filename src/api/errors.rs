use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, SessionId};
use crate::engine::{DenialParams, MoveDenial};

/// Ошибки внешнего API (то, что отдаём фронту / клиенту).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    /// Неправильные входные данные (битый или несуществующий слот).
    BadRequest(String),

    /// Сессия не найдена.
    SessionNotFound(SessionId),

    /// Пользователь не игрок этой сессии (например, зритель).
    NotAPlayer(PlayerId),

    /// Партия на паузе (кто-то отключился).
    GamePaused,

    /// Партия уже закончена.
    GameEnded,

    /// Ход отклонён правилами.
    MoveDenied { code: String, params: DenialParams },

    /// Внутренняя ошибка сервера.
    Internal(String),
}

impl From<MoveDenial> for ApiError {
    fn from(err: MoveDenial) -> Self {
        match err {
            MoveDenial::User { code, params } => ApiError::MoveDenied {
                code: code.as_str().to_string(),
                params,
            },
            MoveDenial::Technical { debug_reason } => ApiError::Internal(debug_reason),
        }
    }
}
