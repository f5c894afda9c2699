//! Player Requests
//!
//! Every action a player can take, as one serializable type. Requests are
//! what a game record stores and what `RulesEngine::apply` consumes.
//!
//! JSON only: internally tagged enums do not deserialize from bincode.

use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::game::piece::Role;

/// One role choice during setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Tile of the player's piece
    pub position: Position,
    /// Role to give it
    pub role: Role,
}

/// A player action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameRequest {
    /// Give hidden roles to own pieces.
    AssignRoles {
        /// Choices, at most one per tile
        assignments: Vec<RoleAssignment>,
    },

    /// Lock in king and trap, completing setup.
    Setup {
        /// King tile
        king: Position,
        /// Trap tile
        trap: Position,
    },

    /// Step one tile orthogonally.
    Move {
        /// Origin
        from: Position,
        /// Destination
        to: Position,
    },

    /// Submit a role for the active battle.
    Battle {
        /// Chosen role
        role: Role,
    },
}

impl GameRequest {
    /// Short name for logs. Never includes a hidden role.
    pub fn kind(&self) -> &'static str {
        match self {
            GameRequest::AssignRoles { .. } => "assign_roles",
            GameRequest::Setup { .. } => "setup",
            GameRequest::Move { .. } => "move",
            GameRequest::Battle { .. } => "battle",
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let request = GameRequest::Move {
            from: Position::new(1, 1),
            to: Position::new(1, 2),
        };
        let json = request.to_json().unwrap();
        assert!(json.contains("\"type\":\"move\""));
        assert_eq!(GameRequest::from_json(&json).unwrap(), request);
    }

    #[test]
    fn test_parse_client_setup() {
        let json = r#"{"type":"setup","king":{"x":0,"y":0},"trap":{"x":1,"y":0}}"#;
        assert_eq!(
            GameRequest::from_json(json).unwrap(),
            GameRequest::Setup {
                king: Position::new(0, 0),
                trap: Position::new(1, 0),
            }
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(GameRequest::from_json(r#"{"type":"resign"}"#).is_err());
    }

    #[test]
    fn test_kind_hides_role() {
        let request = GameRequest::Battle { role: Role::Paper };
        assert_eq!(request.kind(), "battle");
    }
}
