//! Game Records
//!
//! Everything needed to replay a game and prove the result: the creation
//! parameters, the ordered list of accepted steps and a state hash after
//! each one. Replaying with the same engine configuration must reproduce
//! every checkpoint.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::hash::StateHash;
use crate::game::engine::RulesEngine;
use crate::game::error::{EngineError, EngineResult};
use crate::game::request::GameRequest;
use crate::game::state::{Game, GameId, Player, PlayerId};

/// Current record format version.
pub const RECORD_VERSION: u8 = 1;

/// One accepted step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RecordedStep {
    /// A player request
    Player {
        /// Acting player
        player_id: PlayerId,
        /// What they asked for
        request: GameRequest,
    },
    /// The coin flip that starts play
    CoinFlip,
}

/// Replay failure.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Written by an incompatible version.
    #[error("unsupported record version {0}")]
    Version(u8),

    /// The engine rejected a recorded step.
    #[error("step {step} rejected: {source}")]
    Rejected {
        /// Step index
        step: usize,
        /// Engine error
        #[source]
        source: EngineError,
    },

    /// The state after a step differs from the recorded checkpoint.
    #[error("state diverged at step {step}: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    Diverged {
        /// Step index
        step: usize,
        /// Recorded hash
        expected: StateHash,
        /// Replayed hash
        actual: StateHash,
    },

    /// Replayed final state differs from the recorded final hash.
    #[error("final state hash mismatch: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    HashMismatch {
        /// Recorded hash
        expected: StateHash,
        /// Replayed hash
        actual: StateHash,
    },

    /// Checkpoint list does not line up with the steps.
    #[error("record has {steps} steps but {checkpoints} checkpoints")]
    Malformed {
        /// Step count
        steps: usize,
        /// Checkpoint count
        checkpoints: usize,
    },

    /// Record was never finished.
    #[error("record has no final hash")]
    Unfinished,
}

/// Complete record of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Format version
    pub version: u8,
    /// Game id
    pub game_id: GameId,
    /// Players in seat order
    pub players: [Player; 2],
    /// Coin flip seed
    pub rng_seed: u64,
    /// Hash of the freshly deployed game
    pub initial_hash: StateHash,
    /// Accepted steps, in order
    pub steps: Vec<RecordedStep>,
    /// State hash after each step
    pub checkpoints: Vec<StateHash>,
    /// Hash of the final state
    pub final_hash: Option<StateHash>,
}

impl GameRecord {
    /// Start recording a freshly created game.
    pub fn start(game: &Game) -> Self {
        Self {
            version: RECORD_VERSION,
            game_id: game.id,
            players: game.players.clone(),
            rng_seed: game.rng_seed,
            initial_hash: game.compute_hash(),
            steps: Vec::new(),
            checkpoints: Vec::new(),
            final_hash: None,
        }
    }

    /// Apply a step through the engine and record it if accepted.
    ///
    /// Rejected steps are not recorded.
    pub fn play(&mut self, engine: &RulesEngine, game: &Game, step: RecordedStep) -> EngineResult<Game> {
        let next = apply_step(engine, game, &step)?;
        self.checkpoints.push(next.compute_hash());
        self.steps.push(step);
        Ok(next)
    }

    /// Seal the record with the final state.
    pub fn finish(&mut self, game: &Game) {
        self.final_hash = Some(game.compute_hash());
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
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

fn apply_step(engine: &RulesEngine, game: &Game, step: &RecordedStep) -> EngineResult<Game> {
    match step {
        RecordedStep::Player { player_id, request } => engine.apply(game, *player_id, request),
        RecordedStep::CoinFlip => engine.resolve_coin_flip(game),
    }
}

/// Replay a finished record and verify every checkpoint.
///
/// Returns the final game state.
pub fn replay(engine: &RulesEngine, record: &GameRecord) -> Result<Game, RecordError> {
    if record.version != RECORD_VERSION {
        return Err(RecordError::Version(record.version));
    }
    if record.steps.len() != record.checkpoints.len() {
        return Err(RecordError::Malformed {
            steps: record.steps.len(),
            checkpoints: record.checkpoints.len(),
        });
    }
    let expected_final = record.final_hash.ok_or(RecordError::Unfinished)?;

    let [first, second] = record.players.clone();
    let mut game = engine
        .create_game_with_seed(record.game_id, first, second, record.rng_seed)
        .map_err(|source| RecordError::Rejected { step: 0, source })?;

    let initial = game.compute_hash();
    if initial != record.initial_hash {
        return Err(RecordError::Diverged {
            step: 0,
            expected: record.initial_hash,
            actual: initial,
        });
    }

    for (index, (step, expected)) in record.steps.iter().zip(&record.checkpoints).enumerate() {
        game = apply_step(engine, &game, step).map_err(|source| RecordError::Rejected {
            step: index + 1,
            source,
        })?;
        game.take_events();

        let actual = game.compute_hash();
        if actual != *expected {
            warn!("Replay diverged at step {}", index + 1);
            return Err(RecordError::Diverged {
                step: index + 1,
                expected: *expected,
                actual,
            });
        }
        debug!("Replayed step {} ok", index + 1);
    }

    let actual = game.compute_hash();
    if actual != expected_final {
        return Err(RecordError::HashMismatch {
            expected: expected_final,
            actual,
        });
    }

    info!(
        "Replay of game {} verified: {} steps, hash {}",
        hex::encode(&record.game_id[..4]),
        record.steps.len(),
        hex::encode(actual)
    );
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::Position;
    use crate::game::piece::Role;
    use crate::game::request::RoleAssignment;

    const A: PlayerId = PlayerId::new([1; 16]);
    const B: PlayerId = PlayerId::new([2; 16]);

    fn step(player_id: PlayerId, request: GameRequest) -> RecordedStep {
        RecordedStep::Player { player_id, request }
    }

    fn recorded_game(engine: &RulesEngine) -> (Game, GameRecord) {
        let mut game = engine
            .create_game_with_seed([8; 16], Player::new(A, "alice"), Player::new(B, "bob"), 77)
            .unwrap();
        let mut record = GameRecord::start(&game);

        let assign = |player: PlayerId, game: &Game, role: Role| GameRequest::AssignRoles {
            assignments: game
                .board
                .pieces_of(player)
                .map(|(position, _)| RoleAssignment { position, role })
                .collect(),
        };

        let request = assign(A, &game, Role::Rock);
        game = record.play(engine, &game, step(A, request)).unwrap();
        let request = assign(B, &game, Role::Paper);
        game = record.play(engine, &game, step(B, request)).unwrap();

        let setup = GameRequest::Setup {
            king: Position::new(0, 0),
            trap: Position::new(1, 0),
        };
        game = record.play(engine, &game, step(A, setup)).unwrap();
        let setup = GameRequest::Setup {
            king: Position::new(6, 5),
            trap: Position::new(5, 5),
        };
        game = record.play(engine, &game, step(B, setup)).unwrap();
        game = record.play(engine, &game, RecordedStep::CoinFlip).unwrap();

        let player = game.current_turn.unwrap();
        let (from, to) = engine.legal_moves(&game, player)[0];
        game = record.play(engine, &game, step(player, GameRequest::Move { from, to })).unwrap();

        record.finish(&game);
        (game, record)
    }

    #[test]
    fn test_replay_reproduces_final_state() {
        let engine = RulesEngine::default();
        let (game, record) = recorded_game(&engine);

        let replayed = replay(&engine, &record).unwrap();
        assert_eq!(replayed.compute_hash(), game.compute_hash());
        assert_eq!(record.len(), 6);
    }

    #[test]
    fn test_rejected_step_not_recorded() {
        let engine = RulesEngine::default();
        let game = engine
            .create_game_with_seed([8; 16], Player::new(A, "alice"), Player::new(B, "bob"), 77)
            .unwrap();
        let mut record = GameRecord::start(&game);

        assert!(record.play(&engine, &game, RecordedStep::CoinFlip).is_err());
        assert!(record.is_empty());
    }

    #[test]
    fn test_tampered_record_detected() {
        let engine = RulesEngine::default();
        let (_, record) = recorded_game(&engine);

        let mut tampered = record.clone();
        tampered.checkpoints[2][0] ^= 0xFF;
        assert!(matches!(replay(&engine, &tampered), Err(RecordError::Diverged { step: 3, .. })));

        let mut tampered = record.clone();
        tampered.steps.swap(0, 1);
        assert!(matches!(replay(&engine, &tampered), Err(RecordError::Diverged { step: 1, .. })));

        let mut unfinished = record.clone();
        unfinished.final_hash = None;
        assert!(matches!(replay(&engine, &unfinished), Err(RecordError::Unfinished)));

        let mut truncated = record;
        truncated.checkpoints.pop();
        assert!(matches!(replay(&engine, &truncated), Err(RecordError::Malformed { .. })));
    }

    #[test]
    fn test_record_json_roundtrip() {
        let engine = RulesEngine::default();
        let (_, record) = recorded_game(&engine);

        let json = record.to_json().unwrap();
        assert!(json.contains("\"step\":\"coin_flip\""));
        let restored = GameRecord::from_json(&json).unwrap();
        assert_eq!(restored, record);
        assert!(replay(&engine, &restored).is_ok());
    }
}
