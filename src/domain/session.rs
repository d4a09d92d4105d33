//! Сессия игры: игроки, слоты, индекс карт, ход и служебные метаданные.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::card::Card;
use super::layout::LayoutRules;
use super::slot::SlotId;
use super::slot_store::SlotStore;
use super::{CardId, PlayerId, SessionId};
use crate::engine::move_history::MoveHistory;
use crate::time_ctrl::TurnState;

/// Почему партия закончилась.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    /// Игрок покинул партию.
    Abandon,
    /// Личная колода игрока опустела - он победил.
    DeckEmpty,
    /// Общий пил опустел - партия закончена без победителя.
    PileEmpty,
}

impl GameEndReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            GameEndReason::Abandon => "abandon",
            GameEndReason::DeckEmpty => "deck_empty",
            GameEndReason::PileEmpty => "pile_empty",
        }
    }
}

/// Итог партии. Пишется один раз.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Option<PlayerId>,
    pub reason: GameEndReason,
    /// Кто спровоцировал конец (для abandon - ушедший игрок).
    pub by: Option<PlayerId>,
    pub at: u64,
}

/// Кэш подписей для дифф-рассылки. Не сохраняется.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureCache {
    pub slots: HashMap<SlotId, String>,
    pub turn: Option<String>,
}

impl SignatureCache {
    pub fn reset(&mut self) {
        self.slots.clear();
        self.turn = None;
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(default)]
    pub disconnected: BTreeSet<PlayerId>,
    #[serde(default)]
    pub last_seen: BTreeMap<PlayerId, u64>,
    #[serde(default)]
    result: Option<GameResult>,
    #[serde(default)]
    pub end_acks: BTreeSet<PlayerId>,
    #[serde(default)]
    pub snapshot_seq: u64,
    #[serde(default)]
    pub last_snapshot_reason: Option<String>,
    #[serde(skip)]
    pub spectators: BTreeSet<PlayerId>,
    #[serde(skip)]
    pub signatures: SignatureCache,
}

impl SessionMeta {
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Записать итог. `false`, если итог уже был.
    pub fn set_result(&mut self, result: GameResult) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result);
        true
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    /// `players[0]` - место 1, `players[1]` - место 2.
    pub players: [PlayerId; 2],
    pub slots: SlotStore,
    pub cards: BTreeMap<CardId, Card>,
    pub turn: Option<TurnState>,
    #[serde(default)]
    pub meta: SessionMeta,
    #[serde(default)]
    pub history: MoveHistory,
}

impl GameSession {
    /// Пустая сессия с каноническим набором слотов:
    /// DECK/HAND/BENCH 1..n у каждого игрока, PILE и первый TABLE.
    pub fn new_empty(id: SessionId, players: [PlayerId; 2], layout: &LayoutRules) -> Self {
        let mut slots = SlotStore::new();
        for seat in [1u8, 2] {
            slots.ensure_slot(SlotId::deck(seat));
            slots.ensure_slot(SlotId::hand(seat));
            for i in 1..=layout.bench_slots {
                slots.ensure_slot(SlotId::bench(seat, i));
            }
        }
        slots.ensure_slot(SlotId::pile());
        slots.ensure_slot(SlotId::table(1));

        Self {
            id,
            players,
            slots,
            cards: BTreeMap::new(),
            turn: None,
            meta: SessionMeta::default(),
            history: MoveHistory::new(),
        }
    }

    /// Зарегистрировать карту и положить её на верх слота.
    pub fn add_card(&mut self, card: Card, slot: SlotId) {
        self.cards.insert(card.id, card);
        self.slots.push_top(slot, card.id);
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    /// Место игрока (1 или 2).
    pub fn seat_of(&self, player: PlayerId) -> Option<u8> {
        self.players
            .iter()
            .position(|&p| p == player)
            .map(|i| i as u8 + 1)
    }

    pub fn player_at(&self, seat: u8) -> Option<PlayerId> {
        match seat {
            1 | 2 => Some(self.players[seat as usize - 1]),
            _ => None,
        }
    }

    pub fn is_player(&self, user: PlayerId) -> bool {
        self.players.contains(&user)
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        match self.seat_of(player)? {
            1 => Some(self.players[1]),
            _ => Some(self.players[0]),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.meta.result().is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.turn.as_ref().is_some_and(|t| t.paused)
    }

    /// Игроки и зрители - все, кому уходит рассылка.
    pub fn audience(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .copied()
            .chain(self.meta.spectators.iter().copied())
            .collect()
    }

    /// Карты руки игрока сверху вниз, не больше `limit`.
    pub fn hand_top_cards(&self, seat: u8, limit: usize) -> Vec<CardId> {
        self.slots
            .stack_of(&SlotId::hand(seat))
            .iter()
            .rev()
            .take(limit)
            .copied()
            .collect()
    }

    /// Снимок расположения: карта -> слот. Для проверок сохранности карт.
    pub fn card_locations(&self) -> BTreeMap<CardId, Vec<SlotId>> {
        let mut out: BTreeMap<CardId, Vec<SlotId>> = BTreeMap::new();
        for (slot, stack) in self.slots.slots() {
            for card in stack {
                out.entry(*card).or_default().push(*slot);
            }
        }
        out
    }

    /// Есть ли у игрока туз на верху колоды или в руке.
    pub fn has_blocking_ace(&self, seat: u8) -> bool {
        let is_ace = |id: &CardId| self.card(*id).is_some_and(|c| c.rank.is_ace());

        let deck_top_ace = self
            .slots
            .top(&SlotId::deck(seat))
            .is_some_and(|id| is_ace(&id));
        let hand_ace = self.slots.stack_of(&SlotId::hand(seat)).iter().any(is_ace);

        deck_top_ace || hand_ace
    }
}
