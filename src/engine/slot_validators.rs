//! Проверки по типу слота назначения.

use tracing::debug;

use crate::domain::{Card, GameSession, Rank, SlotId, SlotKind};

use super::errors::{DenialCode, MoveDenial};

/// Какие ранги принимает слот стола при текущем числе карт.
/// 0 карт: A или K, 1: 2 или K, …, 9: 10 или K, 10: J или K, 11: только Q.
pub fn table_accepts(count: usize) -> &'static [Rank] {
    const SEQUENCE: [&[Rank]; 12] = [
        &[Rank::Ace, Rank::King],
        &[Rank::Two, Rank::King],
        &[Rank::Three, Rank::King],
        &[Rank::Four, Rank::King],
        &[Rank::Five, Rank::King],
        &[Rank::Six, Rank::King],
        &[Rank::Seven, Rank::King],
        &[Rank::Eight, Rank::King],
        &[Rank::Nine, Rank::King],
        &[Rank::Ten, Rank::King],
        &[Rank::Jack, Rank::King],
        &[Rank::Queen],
    ];
    SEQUENCE.get(count).copied().unwrap_or(&[])
}

/// Проверка слота назначения по его типу.
pub fn validate_destination(
    session: &GameSession,
    card: &Card,
    to: &SlotId,
) -> Result<(), MoveDenial> {
    match to.kind {
        SlotKind::Table => validate_table(session, card, to),
        SlotKind::Bench => Ok(()),
        SlotKind::Deck => Err(MoveDenial::user(DenialCode::RuleCannotPlayOnDeck)),
        SlotKind::Hand => Err(MoveDenial::user(DenialCode::RuleCannotPlayOnHand)),
        SlotKind::Pile => Err(MoveDenial::user(DenialCode::RuleCannotPlayOnPile)),
    }
}

fn validate_table(session: &GameSession, card: &Card, to: &SlotId) -> Result<(), MoveDenial> {
    if !session.slots.has_slot(to) {
        return Err(MoveDenial::technical(format!("слот стола {to} не существует")));
    }

    let count = session.slots.count(to);
    let allowed = table_accepts(count);

    if allowed.is_empty() {
        return Err(MoveDenial::user(DenialCode::RuleTableFull));
    }

    if !allowed.contains(&card.rank) {
        let expected = allowed
            .iter()
            .map(|r| r.code())
            .collect::<Vec<_>>()
            .join(",");
        debug!(card_id = card.id, slot = %to, count, tried = %card.rank, %expected, "ранг не подходит к столу");
        return Err(MoveDenial::user_with(
            DenialCode::RuleTableRankNotAllowed,
            &[("expected", expected), ("got", card.rank.code().to_string())],
        ));
    }

    Ok(())
}
