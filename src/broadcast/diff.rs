//! Дифф-рассылка: отправляем только то, что изменилось с прошлой отправки.
//!
//! Порядок сброса одного `UpdateBatch` фиксирован:
//! 1. `table_sync` (и чистка подписей исчезнувших слотов стола);
//! 2. `slot_state` игрокам (в их системе координат) и зрителям (абсолютные id);
//! 3. `turn_update`;
//! 4. накопленные сообщения.
//! Так клиент никогда не получает слот стола, о котором ещё не знает.

use tracing::trace;

use crate::api::dto::{ResultDto, TurnDto};
use crate::api::queries::{build_slot_view, build_snapshot, build_table_list, Viewer};
use crate::domain::{GameSession, PlayerId, SlotId, SlotKind};

use super::batch::UpdateBatch;
use super::events::{EventSink, OutboundEvent};

/// Подпись содержимого слота: id карт через `|`, пустая строка для пустого слота.
pub fn slot_signature(session: &GameSession, slot: &SlotId) -> String {
    session
        .slots
        .stack_of(slot)
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

pub struct DiffBroadcaster<'a, S: EventSink> {
    session: &'a mut GameSession,
    sink: &'a mut S,
    now: u64,
}

impl<'a, S: EventSink> DiffBroadcaster<'a, S> {
    pub fn new(session: &'a mut GameSession, sink: &'a mut S, now: u64) -> Self {
        Self { session, sink, now }
    }

    /// Отправить событие всем игрокам и зрителям.
    pub fn broadcast(&mut self, event: OutboundEvent) {
        for user in self.session.audience() {
            self.sink.send(user, event.clone());
        }
    }

    pub fn send_to(&mut self, user: PlayerId, event: OutboundEvent) {
        self.sink.send(user, event);
    }

    /// Разослать состав стола и забыть подписи слотов стола, которых больше нет.
    pub fn sync_table(&mut self) {
        let tables = self.session.slots.table_slots();
        self.session
            .meta
            .signatures
            .slots
            .retain(|slot, _| slot.kind != SlotKind::Table || tables.contains(slot));

        let table = build_table_list(self.session, Viewer::Spectator);
        self.broadcast(OutboundEvent::TableSync { table });
    }

    /// Отправить слот, если его содержимое изменилось. `true`, если отправили.
    pub fn touch(&mut self, slot: &SlotId) -> bool {
        if !self.session.slots.has_slot(slot) {
            return false;
        }

        let sig = slot_signature(self.session, slot);
        if self.session.meta.signatures.slots.get(slot) == Some(&sig) {
            return false;
        }
        self.session.meta.signatures.slots.insert(*slot, sig);

        for (i, player) in self.session.players.into_iter().enumerate() {
            let viewer = Viewer::Player { seat: i as u8 + 1 };
            let (slot_id, cards) = build_slot_view(self.session, slot, viewer);
            self.sink.send(
                player,
                OutboundEvent::SlotState {
                    view: viewer.kind(),
                    slot_id,
                    cards,
                },
            );
        }

        let spectators: Vec<PlayerId> = self.session.meta.spectators.iter().copied().collect();
        if !spectators.is_empty() {
            let (slot_id, cards) = build_slot_view(self.session, slot, Viewer::Spectator);
            for spectator in spectators {
                self.sink.send(
                    spectator,
                    OutboundEvent::SlotState {
                        view: Viewer::Spectator.kind(),
                        slot_id: slot_id.clone(),
                        cards: cards.clone(),
                    },
                );
            }
        }

        trace!(session_id = self.session.id, %slot, "slot_state отправлен");
        true
    }

    /// Отправить ход, если он изменился. `true`, если отправили.
    pub fn push_turn(&mut self) -> bool {
        let sig = self
            .session
            .turn
            .as_ref()
            .map(|t| t.signature())
            .unwrap_or_default();
        if self.session.meta.signatures.turn.as_deref() == Some(sig.as_str()) {
            return false;
        }
        self.session.meta.signatures.turn = Some(sig);

        let dto = TurnDto::from_turn(self.session.turn.as_ref(), self.now);
        self.broadcast(OutboundEvent::TurnUpdate(dto));
        true
    }

    /// Сбросить накопленные изменения в каноническом порядке.
    pub fn flush(&mut self, batch: UpdateBatch) {
        let (table_sync, slots, turn, messages) = batch.into_parts();

        if table_sync {
            self.sync_table();
        }
        for slot in &slots {
            self.touch(slot);
        }
        if turn {
            self.push_turn();
        }
        for pending in messages {
            let event = OutboundEvent::GameMessage(pending.message);
            match pending.to {
                Some(users) => {
                    for user in users {
                        self.sink.send(user, event.clone());
                    }
                }
                None => self.broadcast(event),
            }
        }
    }

    /// Полный снимок одному пользователю (игроку или зрителю).
    pub fn snapshot_to(&mut self, user: PlayerId, reason: &str) {
        let viewer = Viewer::for_user(self.session, user);
        let snapshot = build_snapshot(self.session, viewer, self.now);
        self.sink.send(
            user,
            OutboundEvent::StateSnapshot {
                seq: self.session.meta.snapshot_seq,
                reason: reason.to_string(),
                snapshot,
            },
        );
    }

    /// Полные снимки всей аудитории. Кэш подписей сбрасывается: после
    /// снимка следующий дифф считается от нуля.
    pub fn snapshots_to_audience(&mut self, reason: &str) {
        self.session.meta.signatures.reset();
        self.session.meta.snapshot_seq += 1;
        self.session.meta.last_snapshot_reason = Some(reason.to_string());

        for user in self.session.audience() {
            self.snapshot_to(user, reason);
        }
    }

    /// `game_end`, затем свежие снимки всем.
    pub fn game_end_then_snapshot(&mut self) {
        if let Some(result) = self.session.meta.result().cloned() {
            self.broadcast(OutboundEvent::GameEnd {
                winner: result.winner,
                reason: result.reason,
                result: ResultDto::from(&result),
            });
        }
        self.snapshots_to_audience("game_end");
    }
}
