use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Стабильные коды пользовательских отказов (клиент переводит их сам).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialCode {
    RuleCardNotInSource,
    RuleNotYourTurn,
    RuleOpponentSlot,
    RuleDeckOnlyToTable,
    RuleBenchOnlyToTable,
    RuleAceBlocksBench,
    RuleSourceNotMovable,
    RuleBenchNotBottom,
    RuleTableRankNotAllowed,
    RuleTableFull,
    RuleCannotPlayOnDeck,
    RuleCannotPlayOnHand,
    RuleCannotPlayOnPile,
}

impl DenialCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            DenialCode::RuleCardNotInSource => "RULE_CARD_NOT_IN_SOURCE",
            DenialCode::RuleNotYourTurn => "RULE_NOT_YOUR_TURN",
            DenialCode::RuleOpponentSlot => "RULE_OPPONENT_SLOT",
            DenialCode::RuleDeckOnlyToTable => "RULE_DECK_ONLY_TO_TABLE",
            DenialCode::RuleBenchOnlyToTable => "RULE_BENCH_ONLY_TO_TABLE",
            DenialCode::RuleAceBlocksBench => "RULE_ACE_BLOCKS_BENCH",
            DenialCode::RuleSourceNotMovable => "RULE_SOURCE_NOT_MOVABLE",
            DenialCode::RuleBenchNotBottom => "RULE_BENCH_NOT_BOTTOM",
            DenialCode::RuleTableRankNotAllowed => "RULE_TABLE_RANK_NOT_ALLOWED",
            DenialCode::RuleTableFull => "RULE_TABLE_FULL",
            DenialCode::RuleCannotPlayOnDeck => "RULE_CANNOT_PLAY_ON_DECK",
            DenialCode::RuleCannotPlayOnHand => "RULE_CANNOT_PLAY_ON_HAND",
            DenialCode::RuleCannotPlayOnPile => "RULE_CANNOT_PLAY_ON_PILE",
        }
    }
}

impl std::fmt::Display for DenialCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Параметры шаблона сообщения (например, `expected` / `got`).
pub type DenialParams = BTreeMap<String, String>;

/// Отказ в ходе.
///
/// `User` - нарушение правил игры, показывается игроку.
/// `Technical` - нарушен инвариант движка, от корректного клиента не приходит.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveDenial {
    #[error("Ход отклонён правилами: {code}")]
    User { code: DenialCode, params: DenialParams },

    #[error("Техническая ошибка хода: {debug_reason}")]
    Technical { debug_reason: String },
}

impl MoveDenial {
    pub fn user(code: DenialCode) -> Self {
        MoveDenial::User {
            code,
            params: DenialParams::new(),
        }
    }

    pub fn user_with(code: DenialCode, params: &[(&str, String)]) -> Self {
        MoveDenial::User {
            code,
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }

    pub fn technical(reason: impl Into<String>) -> Self {
        MoveDenial::Technical {
            debug_reason: reason.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, MoveDenial::User { .. })
    }

    pub fn code(&self) -> Option<DenialCode> {
        match self {
            MoveDenial::User { code, .. } => Some(*code),
            MoveDenial::Technical { .. } => None,
        }
    }
}
