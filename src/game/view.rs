//! Player Views
//!
//! The redacted snapshot of a game sent to one player. Opponent roles
//! appear only once revealed; opponent kings and traps never appear; an
//! opponent's battle submission shows up as a flag without the role.
//!
//! No state hash is included: with three roles per piece the hidden
//! assignment is small enough to brute-force from a digest.

use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::game::error::RuleViolation;
use crate::game::piece::{Piece, PieceId, Role};
use crate::game::state::{Game, GameId, GamePhase, PlayerId};

/// A piece as one player sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceView {
    /// Piece id
    pub id: PieceId,
    /// Tile
    pub position: Position,
    /// Owner
    pub owner: PlayerId,
    /// Role, if owned by the viewer or revealed
    pub role: Option<Role>,
    /// Revealed by combat
    pub revealed: bool,
    /// Viewer's own king
    pub is_king: bool,
    /// Viewer's own trap
    pub is_trap: bool,
}

impl PieceView {
    fn of(position: Position, piece: &Piece, viewer: PlayerId) -> Self {
        let own = piece.is_owned_by(viewer);
        Self {
            id: piece.id,
            position,
            owner: piece.owner,
            role: if own || piece.revealed { piece.role.role() } else { None },
            revealed: piece.revealed,
            is_king: own && piece.is_king,
            is_trap: own && piece.is_trap,
        }
    }
}

/// The active battle as one combatant sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleView {
    /// Attacker's tile
    pub attacker: Position,
    /// Defender's tile
    pub defender: Position,
    /// Tied rounds so far
    pub round: u32,
    /// Viewer's own submission this round
    pub own_submission: Option<Role>,
    /// Whether the opponent has submitted this round
    pub opponent_submitted: bool,
}

/// Redacted game snapshot for one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Game id
    pub game_id: GameId,
    /// Who this view is for
    pub viewer: PlayerId,
    /// The opponent
    pub opponent: PlayerId,
    /// Current phase
    pub phase: GamePhase,
    /// Turn owner
    pub current_turn: Option<PlayerId>,
    /// Turn counter
    pub turn_number: u32,
    /// Winner, once ended
    pub winner: Option<PlayerId>,
    /// Viewer finished setup
    pub setup_done: bool,
    /// Opponent finished setup
    pub opponent_setup_done: bool,
    /// Every piece on the board, row-major
    pub pieces: Vec<PieceView>,
    /// Active battle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battle: Option<BattleView>,
}

impl PlayerView {
    /// Build the view of `viewer`, who must be a participant.
    pub fn for_player(game: &Game, viewer: PlayerId) -> Result<Self, RuleViolation> {
        let opponent = game
            .opponent_of(viewer)
            .ok_or(RuleViolation::NotAParticipant(viewer))?;

        let pieces = game
            .board
            .pieces()
            .map(|(pos, piece)| PieceView::of(pos, piece, viewer))
            .collect();

        let battle = game.combat.as_ref().map(|combat| BattleView {
            attacker: combat.attacker,
            defender: combat.defender,
            round: combat.round,
            own_submission: combat.role_of(viewer),
            opponent_submitted: combat.has_submitted(opponent),
        });

        Ok(Self {
            game_id: game.id,
            viewer,
            opponent,
            phase: game.phase,
            current_turn: game.current_turn,
            turn_number: game.turn_number,
            winner: game.winner,
            setup_done: game.is_setup_complete(viewer),
            opponent_setup_done: game.is_setup_complete(opponent),
            pieces,
            battle,
        })
    }

    /// Check if the viewer holds the turn.
    pub fn is_my_turn(&self) -> bool {
        self.phase == GamePhase::PlayerTurn && self.current_turn == Some(self.viewer)
    }

    /// The piece on a tile, as the viewer sees it.
    pub fn piece_at(&self, pos: Position) -> Option<&PieceView> {
        self.pieces.iter().find(|p| p.position == pos)
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
    use crate::game::state::{CombatRecord, Player};

    const A: PlayerId = PlayerId::new([1; 16]);
    const B: PlayerId = PlayerId::new([2; 16]);

    fn game() -> Game {
        let mut game = Game::new([5; 16], Player::new(A, "alice"), Player::new(B, "bob"), 1);
        game.board.place(Position::new(0, 0), Piece::new(0, A).with_role(Role::Rock));
        let mut trap = Piece::new(1, A);
        trap.is_trap = true;
        game.board.place(Position::new(1, 0), trap);
        game.board.place(Position::new(0, 5), Piece::new(2, B).with_role(Role::Paper));
        let mut shown = Piece::new(3, B).with_role(Role::Scissors);
        shown.revealed = true;
        game.board.place(Position::new(1, 5), shown);
        let mut king = Piece::new(4, B).with_role(Role::Rock);
        king.is_king = true;
        game.board.place(Position::new(2, 5), king);
        game
    }

    #[test]
    fn test_own_pieces_fully_visible() {
        let view = PlayerView::for_player(&game(), A).unwrap();
        assert_eq!(view.opponent, B);
        assert!(!view.setup_done);
        assert!(!view.is_my_turn());
        assert_eq!(view.piece_at(Position::new(0, 0)).unwrap().role, Some(Role::Rock));
        assert!(view.piece_at(Position::new(1, 0)).unwrap().is_trap);
    }

    #[test]
    fn test_opponent_pieces_redacted() {
        let view = PlayerView::for_player(&game(), A).unwrap();
        assert_eq!(view.piece_at(Position::new(0, 5)).unwrap().role, None);
        assert_eq!(view.piece_at(Position::new(1, 5)).unwrap().role, Some(Role::Scissors));

        let king = view.piece_at(Position::new(2, 5)).unwrap();
        assert!(!king.is_king);
        assert_eq!(king.role, None);

        // B sees the mirror image
        let theirs = PlayerView::for_player(&game(), B).unwrap();
        assert!(!theirs.piece_at(Position::new(1, 0)).unwrap().is_trap);
        assert!(theirs.piece_at(Position::new(2, 5)).unwrap().is_king);
    }

    #[test]
    fn test_battle_submission_withheld() {
        let mut game = game();
        game.phase = GamePhase::Battle;
        let mut combat = CombatRecord::new(Position::new(0, 0), Position::new(0, 1), A, B);
        combat.roles.insert(B, Some(Role::Paper));
        game.combat = Some(combat);

        let view = PlayerView::for_player(&game, A).unwrap();
        let battle = view.battle.as_ref().unwrap();
        assert!(battle.opponent_submitted);
        assert_eq!(battle.own_submission, None);

        let json = view.to_json().unwrap();
        assert!(!json.contains("Paper"));

        let theirs = PlayerView::for_player(&game, B).unwrap();
        assert_eq!(theirs.battle.unwrap().own_submission, Some(Role::Paper));
    }

    #[test]
    fn test_view_json_roundtrip() {
        let view = PlayerView::for_player(&game(), B).unwrap();
        let restored = PlayerView::from_json(&view.to_json().unwrap()).unwrap();
        assert_eq!(restored, view);
    }

    #[test]
    fn test_non_participant_rejected() {
        let stranger = PlayerId::new([9; 16]);
        assert_eq!(
            PlayerView::for_player(&game(), stranger).unwrap_err(),
            RuleViolation::NotAParticipant(stranger)
        );
    }
}
