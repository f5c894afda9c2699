//! # RPSICQ Rules Engine
//!
//! Authoritative, deterministic rules for RPSICQ: two players, a 7x6 board,
//! hidden rock/paper/scissors roles, one king and one trap each.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RPSICQ SERVER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── position.rs - Board coordinates and adjacency           │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── piece.rs    - Roles and pieces                          │
//! │  ├── board.rs    - Tile grid                                 │
//! │  ├── state.rs    - Game aggregate and phases                 │
//! │  ├── combat.rs   - Contact and duel resolution               │
//! │  ├── engine.rs   - Setup, coin flip, moves, battles          │
//! │  ├── view.rs     - Redacted per-player snapshots             │
//! │  ├── request.rs  - Player request messages                   │
//! │  └── record.rs   - Game records and replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same game id, players, seed and request sequence, the engine
//! produces the same state hash on every platform:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - The coin flip draws from seeded Xorshift128+
//!
//! ## Example
//!
//! ```
//! use rpsicq::game::{Player, PlayerId, Role, RoleAssignment, RulesEngine};
//! use rpsicq::core::Position;
//!
//! let engine = RulesEngine::default();
//! let alice = PlayerId::new([1; 16]);
//! let bob = PlayerId::new([2; 16]);
//! let game = engine
//!     .create_game_with_seed([0; 16], Player::new(alice, "alice"), Player::new(bob, "bob"), 7)
//!     .unwrap();
//!
//! // Every movable piece needs a role before setup completes
//! let roles: Vec<RoleAssignment> = game
//!     .board
//!     .pieces_of(alice)
//!     .map(|(position, _)| RoleAssignment { position, role: Role::Rock })
//!     .collect();
//! let game = engine.process_role_assignment(&game, alice, &roles).unwrap();
//! let game = engine
//!     .process_setup_phase(&game, alice, Position::new(0, 0), Position::new(1, 0))
//!     .unwrap();
//! assert!(game.is_setup_complete(alice));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::position::{Position, BOARD_WIDTH, BOARD_HEIGHT};
pub use crate::core::rng::DeterministicRng;
pub use crate::game::engine::{EngineConfig, PostSetupPhase, RulesEngine};
pub use crate::game::error::{EngineError, IllegalState, RuleViolation};
pub use crate::game::state::{Game, GamePhase, Player, PlayerId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the demo seed.
pub const SEED_ENV: &str = "RPSICQ_SEED";
