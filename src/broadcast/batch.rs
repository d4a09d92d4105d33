//! Накопитель изменений одной логической единицы работы.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, SlotId};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Warn,
    Error,
}

/// Прикладное сообщение для клиента (код + параметры шаблона).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameMessage {
    pub kind: MessageKind,
    pub code: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl GameMessage {
    pub fn new(kind: MessageKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }
}

/// Сообщение в очереди: `to == None` - вся аудитория.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMessage {
    pub to: Option<Vec<PlayerId>>,
    pub message: GameMessage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    table_sync: bool,
    slots: Vec<SlotId>,
    turn: bool,
    messages: Vec<PendingMessage>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Слот мог измениться. Порядок первых касаний сохраняется.
    pub fn touch(&mut self, slot: SlotId) -> &mut Self {
        if !self.slots.contains(&slot) {
            self.slots.push(slot);
        }
        self
    }

    pub fn touch_all(&mut self, slots: impl IntoIterator<Item = SlotId>) -> &mut Self {
        for slot in slots {
            self.touch(slot);
        }
        self
    }

    /// Состав слотов стола изменился.
    pub fn sync_table(&mut self) -> &mut Self {
        self.table_sync = true;
        self
    }

    pub fn turn(&mut self) -> &mut Self {
        self.turn = true;
        self
    }

    pub fn message(&mut self, to: Option<Vec<PlayerId>>, message: GameMessage) -> &mut Self {
        self.messages.push(PendingMessage { to, message });
        self
    }

    pub fn wants_table_sync(&self) -> bool {
        self.table_sync
    }

    pub fn touched(&self) -> &[SlotId] {
        &self.slots
    }

    pub fn wants_turn(&self) -> bool {
        self.turn
    }

    pub fn messages(&self) -> &[PendingMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        !self.table_sync && self.slots.is_empty() && !self.turn && self.messages.is_empty()
    }

    pub(crate) fn into_parts(self) -> (bool, Vec<SlotId>, bool, Vec<PendingMessage>) {
        (self.table_sync, self.slots, self.turn, self.messages)
    }
}
