//! Адресация слотов: `(owner, kind, index)`.
//!
//! `owner = 0` - общий слот (стол, пил), `1`/`2` - слоты игроков.
//! Текстовая форма: `"<owner>:<KIND>:<index>"`, например `"0:TABLE:3"`.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Владелец общих слотов.
pub const SHARED_OWNER: u8 = 0;

/// Тип слота.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotKind {
    Deck,
    Hand,
    Bench,
    Table,
    Pile,
}

impl SlotKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SlotKind::Deck => "DECK",
            SlotKind::Hand => "HAND",
            SlotKind::Bench => "BENCH",
            SlotKind::Table => "TABLE",
            SlotKind::Pile => "PILE",
        }
    }

    /// Слоты, которые существуют только как общие.
    pub const fn is_shared(self) -> bool {
        matches!(self, SlotKind::Table | SlotKind::Pile)
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotKind {
    type Err = SlotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DECK" => Ok(SlotKind::Deck),
            "HAND" => Ok(SlotKind::Hand),
            "BENCH" => Ok(SlotKind::Bench),
            "TABLE" => Ok(SlotKind::Table),
            "PILE" => Ok(SlotKind::Pile),
            other => Err(SlotIdError::UnknownKind(other.to_string())),
        }
    }
}

/// Ошибки разбора текстового id слота.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlotIdError {
    #[error("Неверный формат слота: {0}")]
    Malformed(String),

    #[error("Неизвестный тип слота: {0}")]
    UnknownKind(String),

    #[error("Недопустимый владелец слота: {0}")]
    InvalidOwner(u8),

    #[error("Индекс слота должен быть >= 1")]
    InvalidIndex,
}

/// Идентификатор слота. Равные тройки - один и тот же слот.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    pub owner: u8,
    pub kind: SlotKind,
    pub index: u32,
}

impl SlotId {
    /// Строгий конструктор.
    pub fn new(owner: u8, kind: SlotKind, index: u32) -> Result<Self, SlotIdError> {
        if owner > 2 {
            return Err(SlotIdError::InvalidOwner(owner));
        }
        if index == 0 {
            return Err(SlotIdError::InvalidIndex);
        }
        Ok(Self { owner, kind, index })
    }

    pub const fn deck(owner: u8) -> Self {
        Self { owner, kind: SlotKind::Deck, index: 1 }
    }

    pub const fn hand(owner: u8) -> Self {
        Self { owner, kind: SlotKind::Hand, index: 1 }
    }

    pub const fn bench(owner: u8, index: u32) -> Self {
        Self { owner, kind: SlotKind::Bench, index }
    }

    pub const fn table(index: u32) -> Self {
        Self { owner: SHARED_OWNER, kind: SlotKind::Table, index }
    }

    pub const fn pile() -> Self {
        Self { owner: SHARED_OWNER, kind: SlotKind::Pile, index: 1 }
    }

    pub const fn is_shared(&self) -> bool {
        self.owner == SHARED_OWNER
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.owner, self.kind, self.index)
    }
}

impl FromStr for SlotId {
    type Err = SlotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(owner), Some(kind), Some(index), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SlotIdError::Malformed(s.to_string()));
        };

        let owner: u8 = owner
            .parse()
            .map_err(|_| SlotIdError::Malformed(s.to_string()))?;
        let kind: SlotKind = kind.parse()?;
        let index: u32 = index
            .parse()
            .map_err(|_| SlotIdError::Malformed(s.to_string()))?;

        SlotId::new(owner, kind, index)
    }
}

impl TryFrom<String> for SlotId {
    type Error = SlotIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(value: SlotId) -> Self {
        value.to_string()
    }
}
