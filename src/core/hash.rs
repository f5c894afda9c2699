//! State Hashing for Verification
//!
//! Deterministic SHA-256 digests of game state for:
//! - Integrity checks by the transport layer between calls
//! - Replay validation of recorded games
//!
//! Every digest starts with the same domain tag, so a state hash can never
//! collide with some other SHA-256 use of the same bytes.

use sha2::{Sha256, Digest};
use super::position::Position;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Domain tag prefixed to every state digest.
const STATE_DOMAIN: &[u8] = b"RPSICQ_STATE_V1";

/// Flag bits packed by [`StateHasher::update_piece_flags`].
const FLAG_REVEALED: u8 = 1;
const FLAG_KING: u8 = 1 << 1;
const FLAG_TRAP: u8 = 1 << 2;

/// Deterministic hasher for game state.
///
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    fn with_domain(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for game state.
    pub fn for_game_state() -> Self {
        Self::with_domain(STATE_DOMAIN)
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a board position, x then y.
    #[inline]
    pub fn update_position(&mut self, pos: Position) {
        self.hasher.update(pos.x.to_le_bytes());
        self.hasher.update(pos.y.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Update with an optional UUID: a presence byte, then the bytes.
    pub fn update_optional_uuid(&mut self, uuid: Option<&[u8; 16]>) {
        match uuid {
            Some(uuid) => {
                self.update_bool(true);
                self.update_uuid(uuid);
            }
            None => self.update_bool(false),
        }
    }

    /// Update with a piece's visibility and special markers as one byte.
    pub fn update_piece_flags(&mut self, revealed: bool, is_king: bool, is_trap: bool) {
        let mut flags = 0;
        if revealed {
            flags |= FLAG_REVEALED;
        }
        if is_king {
            flags |= FLAG_KING;
        }
        if is_trap {
            flags |= FLAG_TRAP;
        }
        self.update_u8(flags);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for game verification.
///
/// Called by `Game::compute_hash()`; the closure adds the board and
/// phase data after the fixed header.
pub fn compute_state_hash<F>(game_id: &[u8; 16], turn: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_game_state();

    hasher.update_uuid(game_id);
    hasher.update_u32(turn);
    hasher.hasher.update(rng_seed.to_le_bytes());

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
