//! Combat Resolution
//!
//! Pure evaluation of a contact between two pieces. Nothing here mutates
//! the board; the engine applies the returned outcome.
//!
//! First-contact rule order:
//! 1. Defender is a trap: attacker destroyed, no reveal.
//! 2. Attacker must have a role.
//! 3. Defender is a king: attacker wins the game.
//! 4. Cyclic role comparison, equal roles tie.

use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::game::error::{EngineResult, IllegalState, RuleViolation};
use crate::game::piece::{Piece, Role};

/// Result of a contact or of a battle round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// Attacker takes the defender's tile
    AttackerWins,
    /// Attacker is removed, defender stays
    DefenderWins,
    /// Equal roles, goes to simultaneous battle
    Tie,
    /// Defender was the king, game over
    KingCaptured,
    /// Defender was the trap, attacker destroyed
    Trapped,
}

/// Compare two roles: Rock beats Scissors, Scissors beats Paper,
/// Paper beats Rock.
#[inline]
pub fn duel(attacker: Role, defender: Role) -> CombatOutcome {
    if attacker == defender {
        CombatOutcome::Tie
    } else if attacker.beats() == defender {
        CombatOutcome::AttackerWins
    } else {
        CombatOutcome::DefenderWins
    }
}

/// Roles disclosed by a contact, if any comparison happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResult {
    /// Outcome of the contact
    pub outcome: CombatOutcome,
    /// Attacker's role, `None` when it hit a trap
    pub attacker_role: Option<Role>,
    /// Defender's role, `None` for traps and kings
    pub defender_role: Option<Role>,
}

impl ContactResult {
    /// Whether both pieces are revealed by this contact.
    #[inline]
    pub fn reveals(&self) -> bool {
        !matches!(self.outcome, CombatOutcome::Trapped)
    }
}

/// Evaluate the first contact of a move.
///
/// `from` and `to` are only used for error reporting.
pub fn resolve_contact(
    attacker: &Piece,
    defender: &Piece,
    from: Position,
    to: Position,
) -> EngineResult<ContactResult> {
    if defender.is_trap {
        return Ok(ContactResult {
            outcome: CombatOutcome::Trapped,
            attacker_role: None,
            defender_role: None,
        });
    }

    let attacker_role = attacker.role.role().ok_or(RuleViolation::RoleUnassigned {
        piece: attacker.id,
        at: from,
    })?;

    if defender.is_king {
        return Ok(ContactResult {
            outcome: CombatOutcome::KingCaptured,
            attacker_role: Some(attacker_role),
            defender_role: defender.role.role(),
        });
    }

    let defender_role = defender.role.role().ok_or(IllegalState::DefenderWithoutRole {
        piece: defender.id,
        at: to,
    })?;

    Ok(ContactResult {
        outcome: duel(attacker_role, defender_role),
        attacker_role: Some(attacker_role),
        defender_role: Some(defender_role),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::error::EngineError;
    use crate::game::state::PlayerId;
    use proptest::prelude::*;

    const WINNING: [(Role, Role); 3] = [
        (Role::Rock, Role::Scissors),
        (Role::Scissors, Role::Paper),
        (Role::Paper, Role::Rock),
    ];

    fn piece(id: u32, owner: u8, role: Option<Role>) -> Piece {
        let p = Piece::new(id, PlayerId::new([owner; 16]));
        match role {
            Some(r) => p.with_role(r),
            None => p,
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Rock), Just(Role::Paper), Just(Role::Scissors)]
    }

    #[test]
    fn test_duel_table() {
        for (a, d) in WINNING {
            assert_eq!(duel(a, d), CombatOutcome::AttackerWins);
            assert_eq!(duel(d, a), CombatOutcome::DefenderWins);
        }
        for r in Role::ALL {
            assert_eq!(duel(r, r), CombatOutcome::Tie);
        }
    }

    #[test]
    fn test_trap_short_circuits_without_roles() {
        let attacker = piece(0, 1, None);
        let mut trap = piece(1, 2, None);
        trap.is_trap = true;

        let result = resolve_contact(&attacker, &trap, Position::new(0, 0), Position::new(0, 1)).unwrap();
        assert_eq!(result.outcome, CombatOutcome::Trapped);
        assert!(!result.reveals());
        assert_eq!(result.attacker_role, None);
    }

    #[test]
    fn test_unassigned_attacker_is_rule_violation() {
        let attacker = piece(0, 1, None);
        let defender = piece(1, 2, Some(Role::Rock));
        let err = resolve_contact(&attacker, &defender, Position::new(0, 0), Position::new(0, 1)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Rule(RuleViolation::RoleUnassigned { piece: 0, at: Position::new(0, 0) })
        );
    }

    #[test]
    fn test_unassigned_defender_is_illegal_state() {
        let attacker = piece(0, 1, Some(Role::Rock));
        let defender = piece(1, 2, None);
        let err = resolve_contact(&attacker, &defender, Position::new(0, 0), Position::new(0, 1)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_king_needs_no_role() {
        let attacker = piece(0, 1, Some(Role::Paper));
        let mut king = piece(1, 2, None);
        king.is_king = true;
        let result = resolve_contact(&attacker, &king, Position::new(0, 0), Position::new(0, 1)).unwrap();
        assert_eq!(result.outcome, CombatOutcome::KingCaptured);
        assert!(result.reveals());
    }

    proptest! {
        #[test]
        fn prop_trap_always_wins(attacker_role in role_strategy(), trap_role in proptest::option::of(role_strategy())) {
            let attacker = piece(0, 1, Some(attacker_role));
            let mut trap = piece(1, 2, trap_role);
            trap.is_trap = true;
            let result = resolve_contact(&attacker, &trap, Position::new(0, 0), Position::new(1, 0)).unwrap();
            prop_assert_eq!(result.outcome, CombatOutcome::Trapped);
        }

        #[test]
        fn prop_king_always_falls(attacker_role in role_strategy(), king_role in proptest::option::of(role_strategy())) {
            let attacker = piece(0, 1, Some(attacker_role));
            let mut king = piece(1, 2, king_role);
            king.is_king = true;
            let result = resolve_contact(&attacker, &king, Position::new(0, 0), Position::new(1, 0)).unwrap();
            prop_assert_eq!(result.outcome, CombatOutcome::KingCaptured);
        }

        #[test]
        fn prop_duel_is_antisymmetric(a in role_strategy(), d in role_strategy()) {
            let forward = duel(a, d);
            let backward = duel(d, a);
            match forward {
                CombatOutcome::AttackerWins => prop_assert_eq!(backward, CombatOutcome::DefenderWins),
                CombatOutcome::DefenderWins => prop_assert_eq!(backward, CombatOutcome::AttackerWins),
                CombatOutcome::Tie => prop_assert_eq!(backward, CombatOutcome::Tie),
                other => prop_assert!(false, "duel returned {:?}", other),
            }
        }
    }
}
