//! Один ход игрока как атомарная единица работы:
//! проверка → перекладывание → добор → проверка конца → смена хода.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::broadcast::{GameMessage, MessageKind, UpdateBatch};
use crate::config::EngineConfig;
use crate::domain::{CardId, GameSession, PlayerId, SlotId, SlotKind};

use super::applier::{apply_move, AppliedMove};
use super::errors::MoveDenial;
use super::move_history::MoveEventKind;
use super::pile_flow::refill_hand_if_empty;
use super::rules::validate_move;
use super::turn_flow::{end_turn, EndTurnReport};
use super::win::{check_game_end, GameEnd};
use super::RandomSource;

/// Намерение хода в серверных координатах.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveIntent {
    pub card_id: CardId,
    pub from: SlotId,
    pub to: SlotId,
}

/// Итог успешного хода.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub card_id: CardId,
    pub from: SlotId,
    pub to: SlotId,
    pub applied: AppliedMove,
    /// Ход ушёл на скамейку и передал ход сопернику.
    pub turn_ended: bool,
    /// Добор руки актёра после опустошения.
    pub refilled: Vec<(SlotId, CardId)>,
    pub end_turn: Option<EndTurnReport>,
    pub game_end: Option<GameEnd>,
    /// Изменения для рассылки, сбрасываются по порядку.
    pub updates: Vec<UpdateBatch>,
}

impl MoveOutcome {
    pub fn winner(&self) -> Option<PlayerId> {
        self.game_end.and_then(|g| g.winner)
    }
}

pub fn orchestrate<R: RandomSource>(
    session: &mut GameSession,
    actor: PlayerId,
    intent: MoveIntent,
    now: u64,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<MoveOutcome, MoveDenial> {
    let MoveIntent { card_id, from, to } = intent;

    let card = session.card(card_id).copied().ok_or_else(|| {
        warn!(session_id = session.id, actor, card_id, "неизвестная карта");
        MoveDenial::technical(format!("карта {card_id} неизвестна"))
    })?;

    validate_move(session, actor, &card, &from, &to)?;

    let applied = apply_move(session, card_id, from, to, actor, now, config.time.move_bonus_ms)
        .ok_or_else(|| {
            warn!(session_id = session.id, actor, card_id, %from, %to, "apply_move отказал после проверки");
            MoveDenial::technical("apply_move не применил проверенный ход")
        })?;

    session.history.push(MoveEventKind::CardMoved {
        player_id: actor,
        card_id,
        from,
        to,
    });

    let seat = session
        .seat_of(actor)
        .ok_or_else(|| MoveDenial::technical(format!("игрок {actor} не в сессии")))?;

    let turn_ended = to.kind == SlotKind::Bench;

    let refilled = if turn_ended {
        Vec::new()
    } else {
        refill_hand_if_empty(session, seat, config.layout.hand_size)
    };
    if !refilled.is_empty() {
        session.history.push(MoveEventKind::HandRefilled {
            seat,
            cards: refilled.iter().map(|(_, c)| *c).collect(),
        });
    }

    let mut game_end = check_game_end(session, actor);

    let mut first = UpdateBatch::new();
    if let Some(created) = applied.created_table_slot {
        first.sync_table();
        first.touch(created);
    }
    first.touch(from).touch(to);
    if !refilled.is_empty() {
        first.touch(SlotId::hand(seat)).touch(SlotId::pile());
    }
    if !turn_ended {
        first.turn();
    }

    let mut outcome = MoveOutcome {
        card_id,
        from,
        to,
        applied,
        turn_ended,
        refilled,
        end_turn: None,
        game_end,
        updates: vec![first],
    };

    if game_end.is_some() {
        info!(session_id = session.id, actor, ?game_end, "партия закончена ходом");
        return Ok(outcome);
    }

    if turn_ended {
        let report = end_turn(session, actor, now, config, rng, false)?;

        let mut second = UpdateBatch::new();
        if report.table_changed() {
            second.sync_table();
        }
        if let Some(created) = report.created_table_slot {
            second.touch(created);
        }
        if !report.recycle.is_empty() || !report.given.is_empty() {
            second.touch(SlotId::pile());
        }
        second.touch_all(report.given.iter().map(|(slot, _)| *slot));
        second.turn();

        game_end = check_game_end(session, actor);
        if game_end.is_none() {
            let number = session.turn.as_ref().map(|t| t.number).unwrap_or(0);
            second.message(
                Some(vec![report.next]),
                GameMessage::new(MessageKind::Info, "TURN_START").with_param("turn_number", number),
            );
        }
        outcome.game_end = game_end;
        outcome.end_turn = Some(report);
        outcome.updates.push(second);
    }

    Ok(outcome)
}
