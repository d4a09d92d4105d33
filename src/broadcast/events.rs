//! Исходящие события и приёмник, через который их отправляет транспорт.

use serde::{Deserialize, Serialize};

use crate::api::dto::{CardView, ResultDto, SnapshotDto, TurnDto, ViewKind};
use crate::domain::{GameEndReason, PlayerId, SessionId};

use super::batch::GameMessage;

/// Событие для одного получателя. Слоты уже в его системе координат.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Актуальный состав слотов стола.
    TableSync { table: Vec<String> },

    /// Содержимое одного слота.
    SlotState {
        view: ViewKind,
        slot_id: String,
        cards: Vec<CardView>,
    },

    TurnUpdate(TurnDto),

    /// Полный снимок (после паузы, переподключения, конца партии).
    StateSnapshot {
        seq: u64,
        reason: String,
        snapshot: SnapshotDto,
    },

    GameEnd {
        winner: Option<PlayerId>,
        reason: GameEndReason,
        result: ResultDto,
    },

    GameMessage(GameMessage),

    /// Игрок снова в партии (для самого переподключившегося).
    StartGame {
        session_id: SessionId,
        spectator: bool,
    },

    OpponentDisconnected { user: PlayerId },

    OpponentRejoined { user: PlayerId },
}

impl OutboundEvent {
    /// Имя события на проводе.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::TableSync { .. } => "table_sync",
            OutboundEvent::SlotState { .. } => "slot_state",
            OutboundEvent::TurnUpdate(_) => "turn_update",
            OutboundEvent::StateSnapshot { .. } => "state_snapshot",
            OutboundEvent::GameEnd { .. } => "game_end",
            OutboundEvent::GameMessage(_) => "game_message",
            OutboundEvent::StartGame { .. } => "start_game",
            OutboundEvent::OpponentDisconnected { .. } => "opponent_disconnected",
            OutboundEvent::OpponentRejoined { .. } => "opponent_rejoined",
        }
    }
}

/// Куда уходят события. Доставка - забота транспорта.
pub trait EventSink {
    fn send(&mut self, to: PlayerId, event: OutboundEvent);
}

/// Приёмник, который просто запоминает всё отправленное (тесты, симуляция).
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<(PlayerId, OutboundEvent)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }

    /// Имена событий в порядке отправки.
    pub fn names(&self) -> Vec<&'static str> {
        self.sent.iter().map(|(_, e)| e.name()).collect()
    }

    pub fn for_user(&self, user: PlayerId) -> Vec<&OutboundEvent> {
        self.sent
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, e)| e)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn send(&mut self, to: PlayerId, event: OutboundEvent) {
        self.sent.push((to, event));
    }
}
