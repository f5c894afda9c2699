//! Core deterministic primitives.
//!
//! Board coordinates, the seeded RNG and state hashing. Nothing here knows
//! about pieces or phases.

pub mod position;
pub mod rng;
pub mod hash;

// Re-export core types
pub use position::{Position, BOARD_WIDTH, BOARD_HEIGHT};
pub use rng::{DeterministicRng, derive_game_seed};
pub use hash::{StateHash, StateHasher, compute_state_hash};
