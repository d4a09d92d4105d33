//! Параметры раскладки: размеры руки, колоды, скамейки, полной стопки стола.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutRules {
    /// Сколько карт держит рука после добора.
    pub hand_size: usize,
    /// Сколько карт в личной колоде каждого игрока при раздаче.
    pub personal_deck_size: usize,
    /// Сколько слотов скамейки у игрока.
    pub bench_slots: u32,
    /// При таком числе карт стопка стола уходит в пил.
    pub table_full_count: usize,
}

impl LayoutRules {
    pub const fn standard() -> Self {
        Self {
            hand_size: 5,
            personal_deck_size: 26,
            bench_slots: 4,
            table_full_count: 12,
        }
    }
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self::standard()
    }
}
