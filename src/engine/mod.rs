//! Движок сессии: правила, применение хода, пил, ход и таймер, оркестрация.
//!
//! Точки входа:
//!   - `validate_move` – можно ли переложить карту
//!   - `apply_move` – переложить уже проверенную карту
//!   - `orchestrate` – полный ход игрока как одна атомарная операция
//!   - `init_turn_for_game` / `try_expire_turn` – первый ход и таймаут

pub mod applier;
pub mod errors;
pub mod move_history;
pub mod orchestrator;
pub mod pile_flow;
pub mod rules;
pub mod slot_validators;
pub mod turn_flow;
pub mod win;

pub use applier::{apply_move, AppliedMove};
pub use errors::{DenialCode, DenialParams, MoveDenial};
pub use move_history::{MoveEvent, MoveEventKind, MoveHistory};
pub use orchestrator::{orchestrate, MoveIntent, MoveOutcome};
pub use pile_flow::{recycle_full_table_slots, refill_hand_from_pile, refill_hand_if_empty, RecycleReport};
pub use rules::validate_move;
pub use slot_validators::table_accepts;
pub use turn_flow::{
    end_turn, init_turn_for_game, try_expire_turn, AutoAce, EndTurnReport, ExpiryReport,
    StarterReason, TurnInit,
};
pub use win::{check_game_end, GameEnd};

/// RNG интерфейс для engine.
/// Реализации - в infra (обёртки над `rand`).
pub trait RandomSource {
    fn shuffle<T>(&mut self, slice: &mut [T]);
}
