//! Seed раздачи.
//!
//! Из одного мастер-seed выводится отдельный seed на каждую сессию:
//! `SHA-256(тег || мастер || session_id || игроки || поток)`.
//! Раздачу можно повторить, зная мастер и состав сессии.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{PlayerId, SessionId};
use crate::infra::rng::DeterministicRng;

const DERIVE_TAG: &[u8] = b"SESSION_ENGINE_RNG_V1";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RngSeed([u8; 32]);

impl RngSeed {
    /// Мастер-seed из числа (CLI, тесты).
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// Seed для сессии. `stream` разводит независимые потоки одной сессии
    /// (раздача, боты симулятора и т.п.).
    pub fn derive(&self, session_id: SessionId, players: [PlayerId; 2], stream: u64) -> Self {
        let digest = Sha256::new()
            .chain_update(DERIVE_TAG)
            .chain_update(self.0)
            .chain_update(session_id.to_le_bytes())
            .chain_update(players[0].to_le_bytes())
            .chain_update(players[1].to_le_bytes())
            .chain_update(stream.to_le_bytes())
            .finalize();

        Self(digest.into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_rng(&self) -> DeterministicRng {
        DeterministicRng::from_seed_bytes(self.0)
    }
}
