// src/time_ctrl/extra_time.rs
//! Бонусное время, начисленное за ход на стол.

use serde::{Deserialize, Serialize};

/// Сколько реально добавили к ходу (после ограничения сверху).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BonusGrant {
    pub granted_ms: u64,
}

impl BonusGrant {
    pub fn none() -> Self {
        Self { granted_ms: 0 }
    }

    pub fn new(granted_ms: u64) -> Self {
        Self { granted_ms }
    }

    pub fn is_active(&self) -> bool {
        self.granted_ms > 0
    }
}
