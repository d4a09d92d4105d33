//! Проверка хода: цепочка глобальных правил, затем проверка слота назначения.

use tracing::debug;

use crate::domain::{Card, GameSession, PlayerId, SlotId, SlotKind};

use super::errors::{DenialCode, MoveDenial};
use super::slot_validators::validate_destination;

/// Всё, что нужно одному правилу.
pub struct MoveContext<'a> {
    pub session: &'a GameSession,
    pub actor: PlayerId,
    /// Место актёра (1 или 2).
    pub seat: u8,
    pub card: &'a Card,
    pub from: &'a SlotId,
    pub to: &'a SlotId,
}

type Rule = fn(&MoveContext<'_>) -> Result<(), MoveDenial>;

/// Порядок важен: первая нарушенная проверка и есть ответ.
const GLOBAL_RULES: [Rule; 8] = [
    card_must_be_in_source,
    must_be_players_turn,
    not_on_opponent_side,
    deck_only_to_table,
    bench_only_to_table,
    ace_blocks_bench,
    source_must_be_movable,
    bench_source_must_be_bottom,
];

/// Проверка, можно ли `actor` переложить `card` из `from` в `to`.
pub fn validate_move(
    session: &GameSession,
    actor: PlayerId,
    card: &Card,
    from: &SlotId,
    to: &SlotId,
) -> Result<(), MoveDenial> {
    let Some(seat) = session.seat_of(actor) else {
        return Err(MoveDenial::technical(format!(
            "игрок {actor} не участвует в сессии {}",
            session.id
        )));
    };

    let ctx = MoveContext {
        session,
        actor,
        seat,
        card,
        from,
        to,
    };

    for rule in GLOBAL_RULES {
        if let Err(denial) = rule(&ctx) {
            debug!(actor, card_id = card.id, from = %from, to = %to, ?denial, "ход отклонён");
            return Err(denial);
        }
    }

    validate_destination(session, card, to).inspect_err(|denial| {
        debug!(actor, card_id = card.id, from = %from, to = %to, ?denial, "ход отклонён слотом");
    })
}

fn card_must_be_in_source(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    if ctx.session.slots.stack_of(ctx.from).contains(&ctx.card.id) {
        Ok(())
    } else {
        Err(MoveDenial::user(DenialCode::RuleCardNotInSource))
    }
}

fn must_be_players_turn(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    match &ctx.session.turn {
        Some(turn) if turn.current != ctx.actor => Err(MoveDenial::user(DenialCode::RuleNotYourTurn)),
        _ => Ok(()),
    }
}

fn not_on_opponent_side(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    let foreign = |slot: &SlotId| !slot.is_shared() && slot.owner != ctx.seat;
    if foreign(ctx.from) || foreign(ctx.to) {
        Err(MoveDenial::user(DenialCode::RuleOpponentSlot))
    } else {
        Ok(())
    }
}

fn deck_only_to_table(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    if ctx.from.kind == SlotKind::Deck && ctx.to.kind != SlotKind::Table {
        Err(MoveDenial::user(DenialCode::RuleDeckOnlyToTable))
    } else {
        Ok(())
    }
}

fn bench_only_to_table(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    if ctx.from.kind == SlotKind::Bench && ctx.to.kind != SlotKind::Table {
        Err(MoveDenial::user(DenialCode::RuleBenchOnlyToTable))
    } else {
        Ok(())
    }
}

fn ace_blocks_bench(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    if ctx.to.kind == SlotKind::Bench && ctx.session.has_blocking_ace(ctx.seat) {
        Err(MoveDenial::user(DenialCode::RuleAceBlocksBench))
    } else {
        Ok(())
    }
}

/// Со стола и из пила карты не берут.
fn source_must_be_movable(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    if ctx.from.is_shared() {
        Err(MoveDenial::user(DenialCode::RuleSourceNotMovable))
    } else {
        Ok(())
    }
}

/// Со скамейки берут только нижнюю карту.
fn bench_source_must_be_bottom(ctx: &MoveContext<'_>) -> Result<(), MoveDenial> {
    if ctx.from.kind != SlotKind::Bench {
        return Ok(());
    }
    match ctx.session.slots.stack_of(ctx.from).first() {
        Some(bottom) if *bottom == ctx.card.id => Ok(()),
        _ => Err(MoveDenial::user(DenialCode::RuleBenchNotBottom)),
    }
}
