//! Конфигурация движка: тайминг + раскладка.
//!
//! Можно собрать из кода (`EngineConfig::standard()`) или прочитать из JSON,
//! где отсутствующие поля берутся из стандартного профиля.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::LayoutRules;
use crate::time_ctrl::TimeRules;

/// Размер одной колоды.
const DECK_SIZE: usize = 52;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Не удалось разобрать конфиг: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Некорректное значение {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub time: TimeRules,
    pub layout: LayoutRules,
}

impl EngineConfig {
    pub const fn standard() -> Self {
        Self {
            time: TimeRules::standard(),
            layout: LayoutRules::standard(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Проверка, что раздача и таймер вообще возможны.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;

        if layout.hand_size == 0 {
            return Err(invalid("layout.hand_size", "должен быть > 0"));
        }
        if layout.hand_size * 2 > DECK_SIZE {
            return Err(invalid(
                "layout.hand_size",
                format!("две руки не помещаются в колоду из {DECK_SIZE} карт"),
            ));
        }
        if layout.personal_deck_size == 0 || layout.personal_deck_size * 2 > DECK_SIZE {
            return Err(invalid(
                "layout.personal_deck_size",
                format!("должен быть в диапазоне 1..={}", DECK_SIZE / 2),
            ));
        }
        if layout.bench_slots == 0 {
            return Err(invalid("layout.bench_slots", "должен быть > 0"));
        }
        if layout.table_full_count == 0 || layout.table_full_count > 12 {
            return Err(invalid(
                "layout.table_full_count",
                "должен быть в диапазоне 1..=12",
            ));
        }
        if self.time.turn_ms == 0 {
            return Err(invalid("time.turn_ms", "должен быть > 0"));
        }
        if self.time.sweep_interval_ms == 0 {
            return Err(invalid("time.sweep_interval_ms", "должен быть > 0"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
