//! Ход: выбор первого игрока, конец хода, истечение таймера.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::{CardId, GameSession, PlayerId, SlotId};
use crate::time_ctrl::{TimeRules, TurnState};

use super::errors::MoveDenial;
use super::move_history::MoveEventKind;
use super::pile_flow::{recycle_full_table_slots, refill_hand_from_pile, RecycleReport};
use super::win::{check_game_end, GameEnd};
use super::RandomSource;

/// Почему начинает именно этот игрок.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StarterReason {
    /// Верхняя карта колоды старше.
    DeckTop,
    /// Верхние равны, решила вторая сверху.
    SecondCard,
    /// Полное равенство - ходит первое место.
    TieDefault,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnInit {
    pub starter: PlayerId,
    pub reason: StarterReason,
}

/// Что сделал конец хода.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndTurnReport {
    pub prev: PlayerId,
    pub next: PlayerId,
    /// Карты, добранные сопернику из пила.
    pub given: Vec<(SlotId, CardId)>,
    pub recycle: RecycleReport,
    pub created_table_slot: Option<SlotId>,
    pub removed_table_slots: Vec<SlotId>,
}

impl EndTurnReport {
    /// Поменялся ли состав слотов стола.
    pub fn table_changed(&self) -> bool {
        !self.recycle.is_empty()
            || self.created_table_slot.is_some()
            || !self.removed_table_slots.is_empty()
    }
}

/// Туз, автоматически сыгранный по таймауту.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoAce {
    pub card_id: CardId,
    pub from: SlotId,
    pub to: SlotId,
}

/// Итог истечения хода.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpiryReport {
    pub prev: PlayerId,
    pub next: PlayerId,
    pub played_ace: Option<AutoAce>,
    pub end_turn: EndTurnReport,
    /// Нужно ли разослать новый состав слотов стола.
    pub table_sync_needed: bool,
    pub turn: TurnState,
    pub game_end: Option<GameEnd>,
}

fn turn_value(session: &GameSession, card: Option<&CardId>) -> u8 {
    card.and_then(|id| session.card(*id))
        .map(|c| c.rank.turn_rank())
        .unwrap_or(0)
}

/// Выбрать первого игрока по верху личных колод и запустить первый ход.
pub fn init_turn_for_game(session: &mut GameSession, now: u64, time: &TimeRules) -> TurnInit {
    let d1 = session.slots.stack_of(&SlotId::deck(1));
    let d2 = session.slots.stack_of(&SlotId::deck(2));

    let top = |d: &[CardId]| d.last().copied();
    let second = |d: &[CardId]| d.iter().rev().nth(1).copied();

    let mut cmp = turn_value(session, top(d1).as_ref()).cmp(&turn_value(session, top(d2).as_ref()));
    let mut reason = StarterReason::DeckTop;

    if cmp.is_eq() {
        cmp = turn_value(session, second(d1).as_ref())
            .cmp(&turn_value(session, second(d2).as_ref()));
        reason = if cmp.is_eq() {
            StarterReason::TieDefault
        } else {
            StarterReason::SecondCard
        };
    }

    let starter = if cmp.is_ge() {
        session.players[0]
    } else {
        session.players[1]
    };

    session.turn = Some(TurnState::begin(starter, 1, now, time.turn_ms));
    session.history.push(MoveEventKind::TurnStarted { starter });

    info!(session_id = session.id, starter, ?reason, "первый ход назначен");
    TurnInit { starter, reason }
}

/// Конец хода: переработка стола, добор сопернику, смена игрока, новый таймер.
pub fn end_turn<R: RandomSource>(
    session: &mut GameSession,
    ended_by: PlayerId,
    now: u64,
    config: &EngineConfig,
    rng: &mut R,
    timeout: bool,
) -> Result<EndTurnReport, MoveDenial> {
    let next = session
        .opponent_of(ended_by)
        .ok_or_else(|| MoveDenial::technical(format!("игрок {ended_by} не в сессии")))?;
    let next_seat = session
        .seat_of(next)
        .ok_or_else(|| MoveDenial::technical(format!("нет места для игрока {next}")))?;

    let recycle = recycle_full_table_slots(session, config.layout.table_full_count, rng);

    let mut created_table_slot = None;
    let mut removed_table_slots = Vec::new();
    if !recycle.is_empty() {
        let (slot, created) = session.slots.ensure_empty_table_slot();
        if created {
            created_table_slot = Some(slot);
        }
        removed_table_slots = session.slots.cleanup_extra_empty_table_slots();
        session.history.push(MoveEventKind::TableRecycled {
            slots: recycle.recycled.clone(),
        });
    }

    let given = refill_hand_from_pile(session, next_seat, config.layout.hand_size);
    if !given.is_empty() {
        session.history.push(MoveEventKind::HandRefilled {
            seat: next_seat,
            cards: given.iter().map(|(_, c)| *c).collect(),
        });
    }

    let number = match session.turn.as_mut() {
        Some(turn) => {
            turn.current = next;
            turn.number += 1;
            turn.start(now, config.time.turn_ms);
            turn.number
        }
        None => {
            session.turn = Some(TurnState::begin(next, 1, now, config.time.turn_ms));
            1
        }
    };

    session.history.push(MoveEventKind::TurnSwitched {
        ended_by,
        next,
        number,
        timeout,
    });
    info!(session_id = session.id, ended_by, next, number, timeout, "смена хода");

    Ok(EndTurnReport {
        prev: ended_by,
        next,
        given,
        recycle,
        created_table_slot,
        removed_table_slots,
    })
}

/// Если ход истёк: сыграть туз из руки на пустой слот стола (если есть),
/// затем обычный конец хода. `None`, если ход не истёк.
pub fn try_expire_turn<R: RandomSource>(
    session: &mut GameSession,
    now: u64,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<Option<ExpiryReport>, MoveDenial> {
    let Some(turn) = session.turn.as_ref() else {
        return Ok(None);
    };
    if !turn.is_expired(now) {
        return Ok(None);
    }

    let prev = turn.current;
    let seat = session
        .seat_of(prev)
        .ok_or_else(|| MoveDenial::technical(format!("текущий игрок {prev} не в сессии")))?;

    let mut played_ace = None;
    let mut table_sync_needed = false;

    let hand = SlotId::hand(seat);
    let ace = session
        .hand_top_cards(seat, config.layout.hand_size)
        .into_iter()
        .find(|id| session.card(*id).is_some_and(|c| c.rank.is_ace()));

    if let Some(card_id) = ace {
        let (table_slot, created) = session.slots.ensure_empty_table_slot();
        if session.slots.remove(&hand, card_id) {
            session.slots.push_top(table_slot, card_id);
            table_sync_needed = created;
            if session.slots.ensure_empty_table_slot().1 {
                table_sync_needed = true;
            }
            played_ace = Some(AutoAce {
                card_id,
                from: hand,
                to: table_slot,
            });
            session.history.push(MoveEventKind::AutoAcePlayed {
                player_id: prev,
                card_id,
                to: table_slot,
            });
            debug!(session_id = session.id, prev, card_id, to = %table_slot, "туз сыгран по таймауту");
        }
    }

    let end_turn = end_turn(session, prev, now, config, rng, true)?;
    table_sync_needed |= end_turn.table_changed();

    let turn = match session.turn.as_mut() {
        Some(turn) => {
            turn.start(now, config.time.turn_ms);
            turn.clone()
        }
        None => return Err(MoveDenial::technical("ход пропал после смены игрока")),
    };

    let game_end = check_game_end(session, prev);

    Ok(Some(ExpiryReport {
        prev,
        next: end_turn.next,
        played_ace,
        end_turn,
        table_sync_needed,
        turn,
        game_end,
    }))
}
