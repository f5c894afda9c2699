//! Engine Errors
//!
//! `RuleViolation` is a rejected request: the caller may retry with a
//! different one and the game is untouched. `IllegalState` means the game
//! aggregate itself is inconsistent and must not be played further.

use thiserror::Error;

use crate::core::position::Position;
use crate::game::combat::CombatOutcome;
use crate::game::piece::PieceId;
use crate::game::state::{GamePhase, PlayerId};

/// A precondition of the requested action does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// Action not allowed in the current phase.
    #[error("action requires phase {expected:?}, game is in {actual:?}")]
    WrongPhase {
        /// Phase the action needs.
        expected: GamePhase,
        /// Phase the game is in.
        actual: GamePhase,
    },

    /// Position lies off the board.
    #[error("position {0} is off the board")]
    OutOfBounds(Position),

    /// Move is not a single orthogonal step.
    #[error("{from} -> {to} is not a single orthogonal step")]
    NotAdjacent {
        /// Origin.
        from: Position,
        /// Destination.
        to: Position,
    },

    /// Player is not one of the two participants.
    #[error("player {0} is not part of this game")]
    NotAParticipant(PlayerId),

    /// Both players of a new game share an id.
    #[error("a game needs two distinct players")]
    DuplicatePlayers,

    /// Another player holds the turn.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),

    /// Player already locked in king and trap.
    #[error("player {0} already completed setup")]
    SetupAlreadyCompleted(PlayerId),

    /// King and trap requested on the same tile.
    #[error("king and trap cannot share tile {0}")]
    KingAndTrapOnSameTile(Position),

    /// No piece where one is required.
    #[error("no piece at {0}")]
    EmptyTile(Position),

    /// Piece belongs to the other player.
    #[error("piece at {0} belongs to the opponent")]
    NotYourPiece(Position),

    /// Kings and traps never move.
    #[error("piece at {0} is a king or trap and cannot move")]
    ImmovablePiece(Position),

    /// Destination holds one of the mover's own pieces.
    #[error("cannot attack own piece at {0}")]
    SelfCapture(Position),

    /// Attacking piece has no role yet.
    #[error("piece {piece} at {at} has no role assigned")]
    RoleUnassigned {
        /// Piece id.
        piece: PieceId,
        /// Its position.
        at: Position,
    },

    /// Setup completion attempted while movable pieces lack a role.
    #[error("player {player} has {missing} movable pieces without a role, first at {first}")]
    RolesIncomplete {
        /// Player.
        player: PlayerId,
        /// Pieces still unassigned.
        missing: usize,
        /// First such piece, row-major.
        first: Position,
    },

    /// Same position listed twice in one role assignment.
    #[error("position {0} assigned more than once")]
    DuplicateAssignment(Position),

    /// Player is not fighting in the active combat.
    #[error("player {0} is not part of the active battle")]
    NotInCombat(PlayerId),

    /// Player already locked in a role this round.
    #[error("player {0} already submitted a role this round")]
    RoleAlreadySubmitted(PlayerId),
}

/// The game aggregate violates an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalState {
    /// Phase is BATTLE but no combat record exists.
    #[error("game is in BATTLE without a combat record")]
    MissingCombat,

    /// A combat record exists outside BATTLE.
    #[error("combat record present in phase {0:?}")]
    StrayCombat(GamePhase),

    /// A tile referenced by the combat record is empty.
    #[error("combat tile {0} holds no piece")]
    CombatTileEmpty(Position),

    /// Both combatants belong to the same player.
    #[error("combat participants at {attacker} and {defender} share an owner")]
    CombatantsShareOwner {
        /// Attacking tile.
        attacker: Position,
        /// Defending tile.
        defender: Position,
    },

    /// Combat role map does not match the pieces on the combat tiles.
    #[error("combat role map does not match the combatants")]
    CombatRosterMismatch,

    /// A non-special defender reached role comparison without a role.
    #[error("defending piece {piece} at {at} has no role")]
    DefenderWithoutRole {
        /// Piece id.
        piece: PieceId,
        /// Its position.
        at: Position,
    },

    /// A movable piece of a player who completed setup has no role.
    #[error("movable piece {piece} at {at} has no role after setup")]
    MovablePieceWithoutRole {
        /// Piece id.
        piece: PieceId,
        /// Its position.
        at: Position,
    },

    /// A piece id occurs on more than one tile.
    #[error("piece id {0} appears more than once")]
    DuplicatePieceId(PieceId),

    /// Wrong number of kings or traps for a player.
    #[error("player {player} has {kings} kings and {traps} traps")]
    SpecialPieceCount {
        /// Player.
        player: PlayerId,
        /// Kings found.
        kings: usize,
        /// Traps found.
        traps: usize,
    },

    /// A role duel produced a first-contact-only outcome.
    #[error("battle produced outcome {0:?}")]
    UnexpectedBattleOutcome(CombatOutcome),

    /// Turn owner is not a participant.
    #[error("turn owner {0} is not a participant")]
    TurnOwnerUnknown(PlayerId),

    /// A piece is owned by someone outside the game.
    #[error("piece {0} is owned by a non-participant")]
    ForeignPiece(PieceId),
}

/// Any failure of a rules-engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Request rejected; game unchanged.
    #[error("rule violation: {0}")]
    Rule(#[from] RuleViolation),

    /// Game state is corrupt.
    #[error("illegal state: {0}")]
    IllegalState(#[from] IllegalState),
}

impl EngineError {
    /// Check if this is a recoverable rule violation.
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, EngineError::Rule(_))
    }

    /// Check if the game should be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::IllegalState(_))
    }

    /// The rule violation, if that is what this is.
    pub fn as_rule_violation(&self) -> Option<&RuleViolation> {
        match self {
            EngineError::Rule(v) => Some(v),
            EngineError::IllegalState(_) => None,
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let rule: EngineError = RuleViolation::OutOfBounds(Position::new(-1, 0)).into();
        assert!(rule.is_rule_violation());
        assert!(!rule.is_fatal());
        assert_eq!(
            rule.as_rule_violation(),
            Some(&RuleViolation::OutOfBounds(Position::new(-1, 0)))
        );

        let fatal: EngineError = IllegalState::MissingCombat.into();
        assert!(fatal.is_fatal());
        assert!(fatal.as_rule_violation().is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = RuleViolation::NotAdjacent {
            from: Position::new(0, 0),
            to: Position::new(1, 1),
        };
        assert_eq!(err.to_string(), "(0, 0) -> (1, 1) is not a single orthogonal step");

        let err = EngineError::from(IllegalState::CombatTileEmpty(Position::new(2, 2)));
        assert_eq!(err.to_string(), "illegal state: combat tile (2, 2) holds no piece");
    }
}
