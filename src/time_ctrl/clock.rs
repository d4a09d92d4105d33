// src/time_ctrl/clock.rs
//! Таймер хода: чистые переходы над `TurnState`, без I/O.
//!
//! Инвариант: либо активен `ends_at` (`paused == false`), либо таймер на паузе
//! и остаток хранится в `remaining_ms`.

use serde::{Deserialize, Serialize};

use crate::domain::PlayerId;

use super::BonusGrant;

/// Состояние текущего хода.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnState {
    /// Чей сейчас ход.
    pub current: PlayerId,
    /// Номер хода, начиная с 1.
    pub number: u32,
    /// Момент окончания хода (мс, unix epoch). Значим только без паузы.
    pub ends_at: u64,
    /// Полная длительность хода.
    pub duration_ms: u64,
    pub paused: bool,
    /// Остаток времени, значим только на паузе.
    pub remaining_ms: u64,
}

impl TurnState {
    /// Новый ход, сразу запущенный.
    pub fn begin(current: PlayerId, number: u32, now: u64, duration_ms: u64) -> Self {
        let mut turn = Self {
            current,
            number,
            ends_at: 0,
            duration_ms,
            paused: false,
            remaining_ms: 0,
        };
        turn.start(now, duration_ms);
        turn
    }

    /// Сколько осталось на текущий момент.
    pub fn remaining(&self, now: u64) -> u64 {
        if self.paused {
            return self.remaining_ms;
        }
        self.ends_at.saturating_sub(now)
    }

    /// Перезапустить таймер на полную длительность.
    pub fn start(&mut self, now: u64, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.ends_at = now.saturating_add(duration_ms);
        self.paused = false;
        self.remaining_ms = 0;
    }

    /// Заморозить остаток. `false`, если уже на паузе.
    pub fn pause(&mut self, now: u64) -> bool {
        if self.paused {
            return false;
        }
        self.remaining_ms = self.remaining(now);
        self.paused = true;
        true
    }

    /// Снять паузу. `remaining_override` заменяет сохранённый остаток.
    pub fn resume(&mut self, now: u64, remaining_override: Option<u64>) -> bool {
        if !self.paused {
            return false;
        }
        let remaining = remaining_override.unwrap_or(self.remaining_ms);
        self.ends_at = now.saturating_add(remaining);
        self.paused = false;
        self.remaining_ms = 0;
        true
    }

    /// Добавить бонус. Остаток не превышает `cap_ms`. На паузе ничего не делает.
    pub fn add_bonus(&mut self, bonus_ms: u64, now: u64, cap_ms: u64) -> BonusGrant {
        if self.paused {
            return BonusGrant::none();
        }
        let before = self.remaining(now);
        let after = before.saturating_add(bonus_ms).min(cap_ms);
        self.ends_at = now.saturating_add(after);
        BonusGrant::new(after.saturating_sub(before))
    }

    pub fn is_expired(&self, now: u64) -> bool {
        if self.paused || self.ends_at == 0 {
            return false;
        }
        now >= self.ends_at
    }

    /// Подпись для дедупликации `turn_update`.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.current, self.number, self.ends_at, self.duration_ms, self.paused, self.remaining_ms
        )
    }
}
