use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId, GameSession, PlayerId, SessionId, SlotId, SlotKind};
use crate::infra::mapping::map_slot_for_viewer;

use super::dto::{CardView, ResultDto, SnapshotDto, TurnDto, ViewKind};

/// Запросы "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Query {
    /// Полный снимок сессии для пользователя (игрока или зрителя).
    GetSnapshot { session_id: SessionId, user: PlayerId },

    /// Текущий ход.
    GetTurn { session_id: SessionId },
}

/// Результат запроса "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum QueryResponse {
    Snapshot(SnapshotDto),
    Turn(TurnDto),
}

/// Кто смотрит.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewer {
    /// Игрок на месте 1 или 2.
    Player { seat: u8 },
    Spectator,
}

impl Viewer {
    /// Игрок сессии - его место, иначе зритель.
    pub fn for_user(session: &GameSession, user: PlayerId) -> Self {
        match session.seat_of(user) {
            Some(seat) => Viewer::Player { seat },
            None => Viewer::Spectator,
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Viewer::Player { .. } => ViewKind::Player,
            Viewer::Spectator => ViewKind::Spectator,
        }
    }

    /// Id слота в системе координат получателя.
    pub fn slot_key(&self, slot: &SlotId) -> String {
        match self {
            Viewer::Player { seat } => map_slot_for_viewer(slot, *seat).to_string(),
            Viewer::Spectator => slot.to_string(),
        }
    }

    fn owns(&self, slot: &SlotId) -> bool {
        match self {
            Viewer::Player { seat } => !slot.is_shared() && slot.owner == *seat,
            Viewer::Spectator => false,
        }
    }
}

fn card_view(card: &Card, slot_key: &str, face_down: bool, draggable: bool) -> CardView {
    CardView {
        card_id: card.id,
        slot_id: slot_key.to_string(),
        rank: (!face_down).then(|| card.rank.code().to_string()),
        suit: (!face_down).then_some(card.suit),
        face_down,
        back: card.back,
        draggable,
    }
}

/// Видимые карты слота с учётом видимости и правил перетаскивания.
///
/// Рука и скамейка показываются целиком, колода, стол и пил - только верх.
/// Пил всегда рубашкой вверх, чужая рука тоже.
/// Тащить можно: любую карту своей руки, верх своей колоды, нижнюю карту
/// своей скамейки. Стол и пил - никогда. Зрители не тащат ничего.
pub fn build_slot_view(session: &GameSession, slot: &SlotId, viewer: Viewer) -> (String, Vec<CardView>) {
    let key = viewer.slot_key(slot);
    let stack = session.slots.stack_of(slot);
    let is_owner = viewer.owns(slot);

    let face_down = match slot.kind {
        SlotKind::Pile => true,
        SlotKind::Hand => !is_owner,
        _ => false,
    };

    let visible: Vec<(usize, CardId)> = match slot.kind {
        SlotKind::Hand | SlotKind::Bench => stack.iter().copied().enumerate().collect(),
        SlotKind::Deck | SlotKind::Table | SlotKind::Pile => stack
            .last()
            .map(|&id| vec![(stack.len() - 1, id)])
            .unwrap_or_default(),
    };

    let cards = visible
        .into_iter()
        .filter_map(|(pos, id)| {
            let card = session.card(id)?;
            let draggable = is_owner
                && match slot.kind {
                    SlotKind::Hand | SlotKind::Deck => true,
                    SlotKind::Bench => pos == 0,
                    SlotKind::Table | SlotKind::Pile => false,
                };
            Some(card_view(card, &key, face_down, draggable))
        })
        .collect();

    (key, cards)
}

/// Слоты стола в системе координат получателя.
pub fn build_table_list(session: &GameSession, viewer: Viewer) -> Vec<String> {
    session
        .slots
        .table_slots()
        .iter()
        .map(|s| viewer.slot_key(s))
        .collect()
}

/// Полный снимок сессии для получателя.
pub fn build_snapshot(session: &GameSession, viewer: Viewer, server_now: u64) -> SnapshotDto {
    let slots: BTreeMap<String, Vec<CardView>> = session
        .slots
        .slot_ids()
        .map(|slot| build_slot_view(session, &slot, viewer))
        .collect();

    SnapshotDto {
        view: viewer.kind(),
        table: build_table_list(session, viewer),
        slots,
        turn: session
            .turn
            .as_ref()
            .map(|t| TurnDto::from_turn(Some(t), server_now)),
        result: session.meta.result().map(ResultDto::from),
    }
}
