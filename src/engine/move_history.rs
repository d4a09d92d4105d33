use serde::{Deserialize, Serialize};

use crate::domain::{CardId, GameEndReason, PlayerId, SlotId};

/// Тип события в партии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MoveEventKind {
    /// Первый ход назначен.
    TurnStarted { starter: PlayerId },

    /// Карта переложена игроком.
    CardMoved {
        player_id: PlayerId,
        card_id: CardId,
        from: SlotId,
        to: SlotId,
    },

    /// Рука добрана из пила.
    HandRefilled { seat: u8, cards: Vec<CardId> },

    /// Полные стопки стола ушли в пил.
    TableRecycled { slots: Vec<SlotId> },

    /// Ход перешёл к другому игроку.
    TurnSwitched {
        ended_by: PlayerId,
        next: PlayerId,
        number: u32,
        timeout: bool,
    },

    /// По таймауту туз из руки автоматически ушёл на стол.
    AutoAcePlayed {
        player_id: PlayerId,
        card_id: CardId,
        to: SlotId,
    },

    /// Партия закончена.
    GameEnded {
        winner: Option<PlayerId>,
        reason: GameEndReason,
    },
}

/// Событие с порядковым номером.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveEvent {
    pub index: u32,
    pub kind: MoveEventKind,
}

/// Полная история партии.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveHistory {
    pub events: Vec<MoveEvent>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, kind: MoveEventKind) {
        let idx = self.events.len() as u32;
        self.events.push(MoveEvent { index: idx, kind });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
