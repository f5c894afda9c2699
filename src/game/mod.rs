//! Game Logic Module
//!
//! The rules of RPSICQ. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `piece`: Roles, role slots, pieces
//! - `board`: The 7x6 tile grid
//! - `state`: Players, phases, combat record, the `Game` aggregate
//! - `combat`: Contact and duel evaluation
//! - `engine`: Rules engine operations
//! - `request`: Serializable player requests
//! - `view`: Per-player redacted snapshots
//! - `record`: Game records and replay
//! - `events`: Game events for broadcasting and logging
//! - `error`: Rule violations and illegal states

pub mod piece;
pub mod board;
pub mod state;
pub mod combat;
pub mod engine;
pub mod request;
pub mod view;
pub mod record;
pub mod events;
pub mod error;

// Re-export key types
pub use piece::{Piece, PieceId, Role, RoleSlot};
pub use board::{Board, Tile};
pub use state::{CombatRecord, Game, GameId, GamePhase, Player, PlayerId, PlayerStatus};
pub use combat::CombatOutcome;
pub use engine::{EngineConfig, PostSetupPhase, RulesEngine};
pub use request::{GameRequest, RoleAssignment};
pub use view::PlayerView;
pub use record::{GameRecord, RecordedStep, RecordError, replay};
pub use events::{GameEvent, GameEventData};
pub use error::{EngineError, EngineResult, IllegalState, RuleViolation};
