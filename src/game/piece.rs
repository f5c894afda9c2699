//! Pieces and Roles
//!
//! A piece's role is hidden from the opponent until it fights.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::state::PlayerId;

/// Unique piece identifier (monotonic counter per game).
pub type PieceId = u32;

// =============================================================================
// ROLE
// =============================================================================

/// Combat role of a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Beats Scissors
    Rock = 0,
    /// Beats Rock
    Paper = 1,
    /// Beats Paper
    Scissors = 2,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 3] = [Role::Rock, Role::Paper, Role::Scissors];

    /// The role this one defeats.
    #[inline]
    pub fn beats(self) -> Role {
        match self {
            Role::Rock => Role::Scissors,
            Role::Paper => Role::Rock,
            Role::Scissors => Role::Paper,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Rock => "rock",
            Role::Paper => "paper",
            Role::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// A piece's role slot: either still unchosen or a concrete role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoleSlot {
    /// No role chosen yet
    #[default]
    Unassigned,
    /// Role chosen by the owner
    Assigned(Role),
}

impl RoleSlot {
    /// The assigned role, if any.
    #[inline]
    pub fn role(self) -> Option<Role> {
        match self {
            RoleSlot::Unassigned => None,
            RoleSlot::Assigned(role) => Some(role),
        }
    }

    /// Hash encoding: 0 = unassigned, 1..=3 = role index + 1.
    #[inline]
    pub(crate) fn code(self) -> u8 {
        match self {
            RoleSlot::Unassigned => 0,
            RoleSlot::Assigned(role) => role as u8 + 1,
        }
    }
}

impl From<Role> for RoleSlot {
    fn from(role: Role) -> Self {
        RoleSlot::Assigned(role)
    }
}

// =============================================================================
// PIECE
// =============================================================================

/// A single game piece. Lives on exactly one tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Unique id within the game
    pub id: PieceId,

    /// Owning player
    pub owner: PlayerId,

    /// Hidden combat role
    pub role: RoleSlot,

    /// Set once the piece has taken part in a role comparison
    pub revealed: bool,

    /// The owner's king: capturing it ends the game
    pub is_king: bool,

    /// The owner's trap: destroys any attacker
    pub is_trap: bool,
}

impl Piece {
    /// Create a fresh, un-roled, unrevealed piece.
    pub fn new(id: PieceId, owner: PlayerId) -> Self {
        Self {
            id,
            owner,
            role: RoleSlot::Unassigned,
            revealed: false,
            is_king: false,
            is_trap: false,
        }
    }

    /// Builder-style role assignment.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = RoleSlot::Assigned(role);
        self
    }

    /// Kings and traps never move.
    #[inline]
    pub fn is_movable(&self) -> bool {
        !self.is_king && !self.is_trap
    }

    /// Check ownership.
    #[inline]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == player
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_cycle() {
        assert_eq!(Role::Rock.beats(), Role::Scissors);
        assert_eq!(Role::Scissors.beats(), Role::Paper);
        assert_eq!(Role::Paper.beats(), Role::Rock);
        for role in Role::ALL {
            assert_ne!(role.beats(), role);
            assert_ne!(role.beats().beats(), role);
        }
    }

    #[test]
    fn test_new_piece_is_blank() {
        let piece = Piece::new(4, PlayerId::new([1; 16]));
        assert_eq!(piece.role, RoleSlot::Unassigned);
        assert_eq!(piece.role.role(), None);
        assert!(!piece.revealed);
        assert!(piece.is_movable());
    }

    #[test]
    fn test_special_pieces_are_immovable() {
        let mut piece = Piece::new(0, PlayerId::new([1; 16]));
        piece.is_king = true;
        assert!(!piece.is_movable());

        let mut piece = Piece::new(1, PlayerId::new([1; 16]));
        piece.is_trap = true;
        assert!(!piece.is_movable());
    }

    #[test]
    fn test_role_slot_codes_distinct() {
        let codes: Vec<u8> = std::iter::once(RoleSlot::Unassigned)
            .chain(Role::ALL.into_iter().map(RoleSlot::from))
            .map(RoleSlot::code)
            .collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }
}
