//! Перевод слотов между серверной системой координат и клиентской.
//!
//! Клиент-игрок всегда видит себя на месте 1, соперника на месте 2.
//! Зрители получают абсолютные id.

use crate::domain::{GameSession, SlotId};

/// Слот глазами игрока на месте `viewer_seat`.
pub fn map_slot_for_viewer(slot: &SlotId, viewer_seat: u8) -> SlotId {
    if slot.is_shared() {
        return *slot;
    }
    let owner = if slot.owner == viewer_seat { 1 } else { 2 };
    SlotId { owner, ..*slot }
}

/// Обратный перевод клиентской строки слота в серверный `SlotId`.
///
/// `None`, если строка битая, слота нет в сессии или общий слот
/// указан с типом, который общим не бывает.
pub fn map_slot_from_client(session: &GameSession, raw: &str, actor_seat: u8) -> Option<SlotId> {
    let client: SlotId = raw.trim().parse().ok()?;

    let server = if client.is_shared() {
        if !client.kind.is_shared() {
            return None;
        }
        client
    } else {
        if client.kind.is_shared() {
            return None;
        }
        let owner = match client.owner {
            1 => actor_seat,
            _ => 3 - actor_seat,
        };
        SlotId { owner, ..client }
    };

    session.slots.has_slot(&server).then_some(server)
}
