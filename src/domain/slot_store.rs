//! Хранилище слотов: стопки id карт по адресу `SlotId`.
//!
//! Никаких игровых правил здесь нет. Индекс 0 стопки - низ, последний - верх.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::slot::{SlotId, SlotKind};
use super::CardId;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SlotStore {
    stacks: BTreeMap<SlotId, Vec<CardId>>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Завести пустой слот (если уже есть - ничего не делаем).
    pub fn ensure_slot(&mut self, slot: SlotId) {
        self.stacks.entry(slot).or_default();
    }

    pub fn has_slot(&self, slot: &SlotId) -> bool {
        self.stacks.contains_key(slot)
    }

    /// Стопка слота (пустая, если слота нет).
    pub fn stack_of(&self, slot: &SlotId) -> &[CardId] {
        self.stacks.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn top(&self, slot: &SlotId) -> Option<CardId> {
        self.stack_of(slot).last().copied()
    }

    pub fn push_top(&mut self, slot: SlotId, card: CardId) {
        self.stacks.entry(slot).or_default().push(card);
    }

    pub fn push_bottom(&mut self, slot: SlotId, card: CardId) {
        self.stacks.entry(slot).or_default().insert(0, card);
    }

    pub fn pop_top(&mut self, slot: &SlotId) -> Option<CardId> {
        self.stacks.get_mut(slot).and_then(Vec::pop)
    }

    /// Убрать карту из слота. `false`, если её там не было.
    pub fn remove(&mut self, slot: &SlotId, card: CardId) -> bool {
        let Some(stack) = self.stacks.get_mut(slot) else {
            return false;
        };
        match stack.iter().position(|&c| c == card) {
            Some(pos) => {
                stack.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn count(&self, slot: &SlotId) -> usize {
        self.stack_of(slot).len()
    }

    pub fn is_empty(&self, slot: &SlotId) -> bool {
        self.count(slot) == 0
    }

    /// Удалить слот целиком, вернуть его карты.
    pub fn remove_slot(&mut self, slot: &SlotId) -> Option<Vec<CardId>> {
        self.stacks.remove(slot)
    }

    /// Найти слот, в котором лежит карта.
    pub fn find_card(&self, card: CardId) -> Option<SlotId> {
        self.stacks
            .iter()
            .find(|(_, stack)| stack.contains(&card))
            .map(|(slot, _)| *slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&SlotId, &Vec<CardId>)> {
        self.stacks.iter()
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.stacks.keys().copied()
    }

    pub fn slot_count(&self) -> usize {
        self.stacks.len()
    }

    pub fn total_cards(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }

    // ---- стол ----

    /// Слоты стола по возрастанию индекса.
    pub fn table_slots(&self) -> Vec<SlotId> {
        self.stacks
            .keys()
            .filter(|s| s.kind == SlotKind::Table)
            .copied()
            .collect()
    }

    /// Добавить новый слот стола с индексом max + 1.
    pub fn add_table_slot(&mut self) -> SlotId {
        let next = self
            .table_slots()
            .iter()
            .map(|s| s.index)
            .max()
            .unwrap_or(0)
            + 1;
        let slot = SlotId::table(next);
        self.ensure_slot(slot);
        slot
    }

    /// Гарантировать хотя бы один пустой слот стола.
    /// Возвращает `(слот, создан_ли_новый)`.
    pub fn ensure_empty_table_slot(&mut self) -> (SlotId, bool) {
        if let Some(slot) = self
            .table_slots()
            .into_iter()
            .find(|s| self.is_empty(s))
        {
            return (slot, false);
        }
        (self.add_table_slot(), true)
    }

    /// Оставить только первый пустой слот стола, остальные пустые удалить.
    pub fn cleanup_extra_empty_table_slots(&mut self) -> Vec<SlotId> {
        let empties: Vec<SlotId> = self
            .table_slots()
            .into_iter()
            .filter(|s| self.is_empty(s))
            .collect();

        let removed: Vec<SlotId> = empties.into_iter().skip(1).collect();
        for slot in &removed {
            self.stacks.remove(slot);
        }
        removed
    }
}
