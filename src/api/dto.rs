use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{BackColor, CardId, GameEndReason, GameResult, PlayerId, Suit};
use crate::time_ctrl::TurnState;

/// Чьими глазами построено состояние.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Player,
    Spectator,
}

/// Карта так, как её видит конкретный зритель.
/// У карты рубашкой вверх ранг и масть не передаются.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardView {
    pub card_id: CardId,
    /// Слот в системе координат получателя.
    pub slot_id: String,
    pub rank: Option<String>,
    pub suit: Option<Suit>,
    pub face_down: bool,
    pub back: BackColor,
    pub draggable: bool,
}

/// DTO хода.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnDto {
    /// `None`, если ход ещё не назначен.
    pub current: Option<PlayerId>,
    pub turn_number: u32,
    pub ends_at: u64,
    pub duration_ms: u64,
    pub paused: bool,
    pub remaining_ms: u64,
    pub server_now: u64,
}

impl TurnDto {
    pub fn from_turn(turn: Option<&TurnState>, server_now: u64) -> Self {
        match turn {
            Some(t) => TurnDto {
                current: Some(t.current),
                turn_number: t.number,
                ends_at: t.ends_at,
                duration_ms: t.duration_ms,
                paused: t.paused,
                remaining_ms: t.remaining_ms,
                server_now,
            },
            None => TurnDto {
                current: None,
                turn_number: 0,
                ends_at: 0,
                duration_ms: 0,
                paused: false,
                remaining_ms: 0,
                server_now,
            },
        }
    }
}

/// Итог партии для клиента.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultDto {
    pub winner: Option<PlayerId>,
    pub reason: GameEndReason,
    pub by: Option<PlayerId>,
    pub at: u64,
}

impl From<&GameResult> for ResultDto {
    fn from(r: &GameResult) -> Self {
        ResultDto {
            winner: r.winner,
            reason: r.reason,
            by: r.by,
            at: r.at,
        }
    }
}

/// Полный снимок состояния для одного получателя.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotDto {
    pub view: ViewKind,
    /// Слоты стола по возрастанию индекса.
    pub table: Vec<String>,
    pub slots: BTreeMap<String, Vec<CardView>>,
    pub turn: Option<TurnDto>,
    pub result: Option<ResultDto>,
}

/// Ответ на успешный ход (слоты - в системе координат игрока).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveResponseDto {
    pub card_id: CardId,
    pub from_slot_id: String,
    pub to_slot_id: String,
    pub turn_ended: bool,
    pub winner: Option<PlayerId>,
    pub game_end_reason: Option<GameEndReason>,
}
