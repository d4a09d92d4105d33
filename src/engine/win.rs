//! Проверка конца партии.

use serde::{Deserialize, Serialize};

use crate::domain::{GameEndReason, GameSession, PlayerId, SlotId};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEnd {
    pub winner: Option<PlayerId>,
    pub reason: GameEndReason,
}

/// Пустая личная колода актёра - победа актёра.
/// Иначе пустой пил - конец без победителя.
/// Колода проверяется первой: если оба условия сработали одновременно, актёр выигрывает.
pub fn check_game_end(session: &GameSession, actor: PlayerId) -> Option<GameEnd> {
    let seat = session.seat_of(actor)?;

    if session.slots.is_empty(&SlotId::deck(seat)) {
        return Some(GameEnd {
            winner: Some(actor),
            reason: GameEndReason::DeckEmpty,
        });
    }

    if session.slots.is_empty(&SlotId::pile()) {
        return Some(GameEnd {
            winner: None,
            reason: GameEndReason::PileEmpty,
        });
    }

    None
}
