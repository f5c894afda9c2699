//! Game Events
//!
//! Events generated by engine operations, for broadcasting and logging.
//! Events never carry a hidden role: roles appear only once a contact has
//! revealed them, and battle submissions are announced without the role.

use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::game::combat::CombatOutcome;
use crate::game::piece::{PieceId, Role};
use crate::game::state::{GamePhase, PlayerId};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player set roles on some of their pieces
    RolesAssigned {
        player_id: PlayerId,
        count: u32,
    },

    /// Player locked in king and trap
    SetupCompleted {
        player_id: PlayerId,
    },

    /// Phase changed
    PhaseChanged {
        old_phase: GamePhase,
        new_phase: GamePhase,
    },

    /// Coin flip decided the first player
    CoinFlipped {
        first_player: PlayerId,
    },

    /// Piece stepped onto an empty tile
    PieceMoved {
        player_id: PlayerId,
        piece_id: PieceId,
        from: Position,
        to: Position,
    },

    /// Attacker walked into a trap
    TrapSprung {
        attacker_owner: PlayerId,
        attacker_piece: PieceId,
        trap_at: Position,
    },

    /// Contact or battle round settled with revealed roles
    CombatResolved {
        attacker_at: Position,
        defender_at: Position,
        attacker_role: Option<Role>,
        defender_role: Option<Role>,
        outcome: CombatOutcome,
    },

    /// Tied contact opened a battle
    BattleStarted {
        attacker_at: Position,
        defender_at: Position,
    },

    /// A combatant locked in a role (role withheld)
    BattleRoleSubmitted {
        player_id: PlayerId,
    },

    /// Both submitted the same role, round reset
    BattleTied {
        round: u32,
        role: Role,
    },

    /// King fell
    KingCaptured {
        winner_id: PlayerId,
        king_at: Position,
    },

    /// Game over
    GameEnded {
        winner_id: PlayerId,
        turns: u32,
    },
}

/// A game event stamped with the turn counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Turn number when the event occurred
    pub turn: u32,

    /// Player involved (for filtering per client)
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(turn: u32, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::RolesAssigned { player_id, .. } => Some(*player_id),
            GameEventData::SetupCompleted { player_id } => Some(*player_id),
            GameEventData::CoinFlipped { first_player } => Some(*first_player),
            GameEventData::PieceMoved { player_id, .. } => Some(*player_id),
            GameEventData::TrapSprung { attacker_owner, .. } => Some(*attacker_owner),
            GameEventData::BattleRoleSubmitted { player_id } => Some(*player_id),
            GameEventData::KingCaptured { winner_id, .. } => Some(*winner_id),
            GameEventData::GameEnded { winner_id, .. } => Some(*winner_id),
            _ => None,
        };

        Self { turn, player_id, data }
    }

    /// Create phase changed event.
    pub fn phase_changed(turn: u32, old_phase: GamePhase, new_phase: GamePhase) -> Self {
        Self::new(turn, GameEventData::PhaseChanged { old_phase, new_phase })
    }

    /// Create piece moved event.
    pub fn piece_moved(turn: u32, player_id: PlayerId, piece_id: PieceId, from: Position, to: Position) -> Self {
        Self::new(turn, GameEventData::PieceMoved { player_id, piece_id, from, to })
    }

    /// Create combat resolved event.
    pub fn combat_resolved(
        turn: u32,
        attacker_at: Position,
        defender_at: Position,
        attacker_role: Option<Role>,
        defender_role: Option<Role>,
        outcome: CombatOutcome,
    ) -> Self {
        Self::new(
            turn,
            GameEventData::CombatResolved {
                attacker_at,
                defender_at,
                attacker_role,
                defender_role,
                outcome,
            },
        )
    }

    /// Create game ended event.
    pub fn game_ended(turn: u32, winner_id: PlayerId) -> Self {
        Self::new(turn, GameEventData::GameEnded { winner_id, turns: turn })
    }

    /// Check if this event is only meant for one player.
    ///
    /// Role assignments are private to the assigning player.
    pub fn is_private(&self) -> bool {
        matches!(self.data, GameEventData::RolesAssigned { .. })
    }

    /// Check if a viewer may receive this event.
    pub fn visible_to(&self, viewer: PlayerId) -> bool {
        !self.is_private() || self.player_id == Some(viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_extraction() {
        let id = PlayerId::new([1; 16]);
        let event = GameEvent::piece_moved(3, id, 7, Position::new(0, 1), Position::new(0, 2));
        assert_eq!(event.player_id, Some(id));
        assert_eq!(event.turn, 3);

        let event = GameEvent::phase_changed(0, GamePhase::Setup, GamePhase::CoinFlip);
        assert_eq!(event.player_id, None);
    }

    #[test]
    fn test_private_events_filtered() {
        let me = PlayerId::new([1; 16]);
        let them = PlayerId::new([2; 16]);
        let event = GameEvent::new(0, GameEventData::RolesAssigned { player_id: me, count: 12 });

        assert!(event.visible_to(me));
        assert!(!event.visible_to(them));

        let public = GameEvent::game_ended(9, me);
        assert!(public.visible_to(them));
    }
}
