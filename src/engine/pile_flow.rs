//! Пил: добор руки и возврат полных стопок стола.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CardId, GameSession, SlotId};

use super::RandomSource;

/// Итог переработки полных стопок стола.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecycleReport {
    /// Удалённые слоты стола.
    pub recycled: Vec<SlotId>,
    /// Изменилась ли видимая верхняя карта пила.
    pub pile_top_changed: bool,
}

impl RecycleReport {
    pub fn is_empty(&self) -> bool {
        self.recycled.is_empty()
    }
}

/// Добрать руку из пила, только если рука полностью пуста.
pub fn refill_hand_if_empty(
    session: &mut GameSession,
    seat: u8,
    hand_size: usize,
) -> Vec<(SlotId, CardId)> {
    if !session.slots.is_empty(&SlotId::hand(seat)) {
        return Vec::new();
    }
    refill_hand_from_pile(session, seat, hand_size)
}

/// Дополнить руку из верха пила до `hand_size` (или пока пил не кончится).
pub fn refill_hand_from_pile(
    session: &mut GameSession,
    seat: u8,
    hand_size: usize,
) -> Vec<(SlotId, CardId)> {
    let hand = SlotId::hand(seat);
    let pile = SlotId::pile();
    let mut given = Vec::new();

    while session.slots.count(&hand) < hand_size {
        let Some(card) = session.slots.pop_top(&pile) else {
            break;
        };
        session.slots.push_top(hand, card);
        given.push((hand, card));
    }

    if !given.is_empty() {
        debug!(session_id = session.id, seat, drawn = given.len(), "добор руки из пила");
    }
    given
}

/// Каждую стопку стола ровно из `full_count` карт перемешать, подложить под низ
/// пила и удалить слот.
pub fn recycle_full_table_slots<R: RandomSource>(
    session: &mut GameSession,
    full_count: usize,
    rng: &mut R,
) -> RecycleReport {
    let pile = SlotId::pile();
    let top_before = session.slots.top(&pile);
    let mut report = RecycleReport::default();

    for slot in session.slots.table_slots() {
        if session.slots.count(&slot) != full_count {
            continue;
        }
        let Some(mut cards) = session.slots.remove_slot(&slot) else {
            continue;
        };
        rng.shuffle(&mut cards);
        for card in cards {
            session.slots.push_bottom(pile, card);
        }
        debug!(session_id = session.id, %slot, "стопка стола ушла в пил");
        report.recycled.push(slot);
    }

    report.pile_top_changed = session.slots.top(&pile) != top_before;
    report
}
