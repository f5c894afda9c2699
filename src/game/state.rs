//! Game State Definitions
//!
//! The `Game` aggregate is the only unit of mutation. The rules engine
//! clones it, applies one validated action and hands the result back.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::position::Position;
use crate::game::board::Board;
use crate::game::error::IllegalState;
use crate::game::events::GameEvent;
use crate::game::piece::{Piece, PieceId, Role};

/// Unique game identifier (UUID bytes).
pub type GameId = [u8; 16];

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a random (v4) id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Coarse lifecycle state, owned by matchmaking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Not queued, not playing
    #[default]
    Idle,
    /// Waiting for an opponent
    Queued,
    /// Seated in a game
    InGame,
}

/// A participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique id
    pub id: PlayerId,
    /// Display name
    pub username: String,
    /// Lifecycle state
    pub status: PlayerStatus,
}

impl Player {
    /// Create an idle player.
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            status: PlayerStatus::Idle,
        }
    }
}

// =============================================================================
// GAME PHASE
// =============================================================================

/// Current phase of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Players place king and trap, assign roles
    #[default]
    Setup,
    /// Both setups done, first player not yet drawn
    CoinFlip,
    /// Current turn owner may move
    PlayerTurn,
    /// Tied combat awaiting simultaneous role submissions
    Battle,
    /// A king was captured
    End,
}

impl GamePhase {
    /// Hash encoding.
    fn code(self) -> u8 {
        match self {
            GamePhase::Setup => 0,
            GamePhase::CoinFlip => 1,
            GamePhase::PlayerTurn => 2,
            GamePhase::Battle => 3,
            GamePhase::End => 4,
        }
    }
}

// =============================================================================
// COMBAT RECORD
// =============================================================================

/// Two pieces locked in a tied combat.
///
/// `roles` is a two-slot commit map: a slot is `None` until its owner
/// submits. Neither slot may be shown to the other player before both are
/// filled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    /// Tile of the moving piece (still standing on its origin)
    pub attacker: Position,
    /// Tile of the attacked piece
    pub defender: Position,
    /// Submitted roles keyed by participant
    pub roles: BTreeMap<PlayerId, Option<Role>>,
    /// Number of tied resubmission rounds so far
    pub round: u32,
}

impl CombatRecord {
    /// Open a combat between the owners of the two tiles.
    pub fn new(
        attacker: Position,
        defender: Position,
        attacker_owner: PlayerId,
        defender_owner: PlayerId,
    ) -> Self {
        let mut roles = BTreeMap::new();
        roles.insert(attacker_owner, None);
        roles.insert(defender_owner, None);
        Self {
            attacker,
            defender,
            roles,
            round: 0,
        }
    }

    /// Check if a player fights in this combat.
    #[inline]
    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.roles.contains_key(&player)
    }

    /// Check if a player has locked in a role this round.
    #[inline]
    pub fn has_submitted(&self, player: PlayerId) -> bool {
        matches!(self.roles.get(&player), Some(Some(_)))
    }

    /// Check if both slots are filled.
    #[inline]
    pub fn all_submitted(&self) -> bool {
        self.roles.values().all(Option::is_some)
    }

    /// Submitted role of a player.
    pub fn role_of(&self, player: PlayerId) -> Option<Role> {
        self.roles.get(&player).copied().flatten()
    }

    /// Clear both slots for another round.
    pub fn reset_round(&mut self) {
        for slot in self.roles.values_mut() {
            *slot = None;
        }
        self.round += 1;
    }
}

// =============================================================================
// GAME
// =============================================================================

/// Complete authoritative state of one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Game identifier
    pub id: GameId,

    /// The two participants, first player's home rows are 0-1
    pub players: [Player; 2],

    /// The board
    pub board: Board,

    /// Current phase
    pub phase: GamePhase,

    /// Player allowed to move; `None` before the coin flip
    pub current_turn: Option<PlayerId>,

    /// Per-player setup completion
    pub setup_completed: BTreeMap<PlayerId, bool>,

    /// Active tied combat (present iff phase is Battle)
    pub combat: Option<CombatRecord>,

    /// Set when a king falls
    pub winner: Option<PlayerId>,

    /// Completed moves and resolved battles
    pub turn_number: u32,

    /// Seed for the coin flip
    pub rng_seed: u64,

    /// Next piece id (monotonic counter)
    pub next_piece_id: PieceId,

    /// Events generated by the last operation(s)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl Game {
    /// Create a game with an empty board in SETUP.
    pub fn new(id: GameId, first: Player, second: Player, rng_seed: u64) -> Self {
        let mut setup_completed = BTreeMap::new();
        setup_completed.insert(first.id, false);
        setup_completed.insert(second.id, false);

        Self {
            id,
            players: [first, second],
            board: Board::new(),
            phase: GamePhase::Setup,
            current_turn: None,
            setup_completed,
            combat: None,
            winner: None,
            turn_number: 0,
            rng_seed,
            next_piece_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Ids of both participants, in seat order.
    pub fn player_ids(&self) -> [PlayerId; 2] {
        [self.players[0].id, self.players[1].id]
    }

    /// Check if a player takes part in this game.
    #[inline]
    pub fn is_participant(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// The other participant.
    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        match self.player_ids() {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }

    /// Check if a player finished setup.
    pub fn is_setup_complete(&self, id: PlayerId) -> bool {
        self.setup_completed.get(&id).copied().unwrap_or(false)
    }

    /// Place a fresh piece, assigning the next id.
    ///
    /// Returns `None` if the position is off the board or occupied.
    pub fn spawn_piece(&mut self, pos: Position, owner: PlayerId) -> Option<PieceId> {
        let tile = self.board.tile(pos)?;
        if tile.is_occupied() {
            return None;
        }
        let id = self.next_piece_id;
        self.next_piece_id += 1;
        self.board.place(pos, Piece::new(id, owner));
        Some(id)
    }

    /// Check if the game is over.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, GamePhase::End)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(&self.id, self.turn_number, self.rng_seed, |hasher| {
            for player in &self.players {
                hasher.update_uuid(player.id.as_bytes());
            }

            hasher.update_u8(self.phase.code());
            hasher.update_optional_uuid(self.current_turn.as_ref().map(PlayerId::as_bytes));
            hasher.update_optional_uuid(self.winner.as_ref().map(PlayerId::as_bytes));

            for (id, done) in &self.setup_completed {
                hasher.update_uuid(id.as_bytes());
                hasher.update_bool(*done);
            }

            for (pos, piece) in self.board.pieces() {
                hasher.update_position(pos);
                hasher.update_u32(piece.id);
                hasher.update_uuid(piece.owner.as_bytes());
                hasher.update_u8(piece.role.code());
                hasher.update_piece_flags(piece.revealed, piece.is_king, piece.is_trap);
            }

            match &self.combat {
                Some(combat) => {
                    hasher.update_bool(true);
                    hasher.update_position(combat.attacker);
                    hasher.update_position(combat.defender);
                    hasher.update_u32(combat.round);
                    for (id, role) in &combat.roles {
                        hasher.update_uuid(id.as_bytes());
                        hasher.update_u8(role.map_or(0, |r| r as u8 + 1));
                    }
                }
                None => hasher.update_bool(false),
            }

            hasher.update_u32(self.next_piece_id);
        })
    }

    /// Check every structural invariant of the aggregate.
    pub fn verify_invariants(&self) -> Result<(), IllegalState> {
        let mut seen = std::collections::BTreeSet::new();
        for (_, piece) in self.board.pieces() {
            if !seen.insert(piece.id) {
                return Err(IllegalState::DuplicatePieceId(piece.id));
            }
            if !self.is_participant(piece.owner) {
                return Err(IllegalState::ForeignPiece(piece.id));
            }
        }

        match (self.phase, &self.combat) {
            (GamePhase::Battle, None) => return Err(IllegalState::MissingCombat),
            (GamePhase::Battle, Some(_)) | (_, None) => {}
            (phase, Some(_)) => return Err(IllegalState::StrayCombat(phase)),
        }

        if let Some(turn) = self.current_turn {
            if !self.is_participant(turn) {
                return Err(IllegalState::TurnOwnerUnknown(turn));
            }
        }

        for id in self.player_ids() {
            if self.is_setup_complete(id) {
                let unroled = self
                    .board
                    .pieces_of(id)
                    .find(|(_, p)| p.is_movable() && p.role.role().is_none());
                if let Some((at, piece)) = unroled {
                    return Err(IllegalState::MovablePieceWithoutRole { piece: piece.id, at });
                }
            }

            let kings = self.board.pieces_of(id).filter(|(_, p)| p.is_king).count();
            let traps = self.board.pieces_of(id).filter(|(_, p)| p.is_trap).count();
            let expected = usize::from(self.is_setup_complete(id));
            // A captured king leaves zero behind once the game is over.
            let kings_ok = kings == expected || (self.is_ended() && kings < expected);
            if !kings_ok || traps != expected {
                return Err(IllegalState::SpecialPieceCount { player: id, kings, traps });
            }
        }

        Ok(())
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Serialize to bytes using bincode. Pending events are not included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

// =============================================================================
// TESTS
// =============================================================================
