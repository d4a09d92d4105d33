//! Применение уже проверенного хода к хранилищу слотов.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{CardId, GameSession, PlayerId, SlotId, SlotKind};
use crate::time_ctrl::BonusGrant;

/// Что реально произошло при перекладывании.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedMove {
    pub from: SlotId,
    pub to: SlotId,
    /// Новый пустой слот стола, если пришлось его завести.
    pub created_table_slot: Option<SlotId>,
    pub bonus: BonusGrant,
}

/// Переложить карту. `None`, если форма слотов или владение нарушены
/// (правила должны были отсечь это раньше).
pub fn apply_move(
    session: &mut GameSession,
    card: CardId,
    from: SlotId,
    to: SlotId,
    actor: PlayerId,
    now: u64,
    move_bonus_ms: u64,
) -> Option<AppliedMove> {
    let seat = session.seat_of(actor)?;

    let owned = |slot: &SlotId| slot.is_shared() || slot.owner == seat;
    if !owned(&from) || !owned(&to) {
        warn!(actor, %from, %to, "apply_move: чужой слот");
        return None;
    }
    if to.is_shared() != to.kind.is_shared() || from.is_shared() != from.kind.is_shared() {
        warn!(actor, %from, %to, "apply_move: некорректный владелец слота");
        return None;
    }
    if !session.slots.has_slot(&to) {
        warn!(actor, %to, "apply_move: слот назначения не существует");
        return None;
    }

    if !session.slots.remove(&from, card) {
        warn!(actor, card_id = card, %from, "apply_move: карты нет в исходном слоте");
        return None;
    }

    match to.kind {
        SlotKind::Table | SlotKind::Bench => session.slots.push_top(to, card),
        _ => session.slots.push_bottom(to, card),
    }

    let mut created_table_slot = None;
    let mut bonus = BonusGrant::none();

    if to.kind == SlotKind::Table {
        let (slot, created) = session.slots.ensure_empty_table_slot();
        if created {
            debug!(session_id = session.id, %slot, "новый пустой слот стола");
            created_table_slot = Some(slot);
        }

        if from.kind != SlotKind::Table {
            if let Some(turn) = session.turn.as_mut().filter(|t| t.current == actor) {
                let cap = turn.duration_ms;
                bonus = turn.add_bonus(move_bonus_ms, now, cap);
            }
        }
    }

    Some(AppliedMove {
        from,
        to,
        created_table_slot,
        bonus,
    })
}
