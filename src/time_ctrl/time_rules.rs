// src/time_ctrl/time_rules.rs
//! Конфигурация тайминга хода.
//!
//! Здесь описываем только "правила", без состояния и без привязки к конкретной сессии.

use serde::{Deserialize, Serialize};

/// Профиль тайминга.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeProfile {
    /// 15 сек на ход, +1 сек за карту на стол.
    Standard,
    /// 8 сек на ход, +0.5 сек за карту на стол.
    Blitz,
}

/// Правила тайминга для одной сессии.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeRules {
    /// Полная длительность хода.
    pub turn_ms: u64,
    /// Бонус за карту, положенную на стол не со стола.
    pub move_bonus_ms: u64,
    /// Как часто внешний цикл проверяет истёкшие ходы.
    pub sweep_interval_ms: u64,
}

impl TimeRules {
    /// Строгий конструктор.
    pub const fn new(turn_ms: u64, move_bonus_ms: u64, sweep_interval_ms: u64) -> Self {
        Self {
            turn_ms,
            move_bonus_ms,
            sweep_interval_ms,
        }
    }

    pub const fn standard() -> Self {
        Self::new(15_000, 1_000, 250)
    }

    pub const fn blitz() -> Self {
        Self::new(8_000, 500, 250)
    }

    /// Получить правила по профилю.
    pub const fn from_profile(profile: TimeProfile) -> Self {
        match profile {
            TimeProfile::Standard => Self::standard(),
            TimeProfile::Blitz => Self::blitz(),
        }
    }
}

impl Default for TimeRules {
    fn default() -> Self {
        Self::standard()
    }
}
