use serde::{Deserialize, Serialize};

use crate::domain::{CardId, PlayerId, SessionId};

/// Команда верхнего уровня от клиента (уже аутентифицированного).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Command {
    /// Переложить карту.
    MoveCard(MoveCardCommand),

    /// Игрок увидел итог партии.
    AcknowledgeGameEnd { session_id: SessionId, user: PlayerId },

    /// Игрок сдаётся и покидает партию.
    Abandon { session_id: SessionId, user: PlayerId },
}

/// Ход: слоты в системе координат клиента (`"1:HAND:1"` - всегда своя рука).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveCardCommand {
    pub session_id: SessionId,
    pub user: PlayerId,
    pub card_id: CardId,
    pub from_slot_id: String,
    pub to_slot_id: String,
}
