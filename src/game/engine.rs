//! Rules Engine
//!
//! Every operation takes the current `Game` by reference, validates the
//! request completely, then applies it to a clone and returns the clone.
//! A rejected request therefore never leaves a partially applied game.
//! The engine holds configuration only, no per-game state.
//!
//! ## Phase flow
//!
//! ```text
//! SETUP ──both done──► COIN_FLIP ──flip──► PLAYER_TURN ◄──decisive── BATTLE
//!                                              │   └──────tie──────────►│
//!                                              └──king captured──► END
//! ```

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::core::position::{Position, BOARD_WIDTH};
use crate::core::rng::{DeterministicRng, derive_game_seed};
use crate::game::combat::{duel, resolve_contact, CombatOutcome, ContactResult};
use crate::game::error::{EngineResult, IllegalState, RuleViolation};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::piece::{Piece, PieceId, Role, RoleSlot};
use crate::game::request::{GameRequest, RoleAssignment};
use crate::game::state::{CombatRecord, Game, GameId, GamePhase, Player, PlayerId, PlayerStatus};

/// Home rows of the first seated player.
pub const FIRST_PLAYER_ROWS: [i32; 2] = [0, 1];

/// Home rows of the second seated player.
pub const SECOND_PLAYER_ROWS: [i32; 2] = [4, 5];

/// Pieces each player starts with (two full rows).
pub const PIECES_PER_PLAYER: usize = 2 * BOARD_WIDTH as usize;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Phase entered once both players complete setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PostSetupPhase {
    /// Wait for an explicit `resolve_coin_flip`
    #[default]
    CoinFlip,
    /// Flip immediately and start play
    PlayerTurn,
}

/// Configuration for the rules engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Where setup leads
    pub post_setup_phase: PostSetupPhase,
    /// Hand the turn to the defender after a decisive battle
    pub alternate_turn_after_battle: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            post_setup_phase: PostSetupPhase::CoinFlip,
            alternate_turn_after_battle: true,
        }
    }
}

// =============================================================================
// MOVE VALIDATION
// =============================================================================

/// A fully validated move, ready to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePlan {
    /// Moving player
    pub player: PlayerId,
    /// Moving piece
    pub piece: PieceId,
    /// Origin
    pub from: Position,
    /// Destination
    pub to: Position,
    /// Contact with an enemy piece, if the destination is occupied
    pub contact: Option<Contact>,
}

/// Enemy contact details of a planned move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    /// Owner of the attacked piece
    pub defender_owner: PlayerId,
    /// Evaluated result
    pub result: ContactResult,
}

// =============================================================================
// RULES ENGINE
// =============================================================================

/// Stateless rules engine.
#[derive(Clone, Debug, Default)]
pub struct RulesEngine {
    config: EngineConfig,
}

impl RulesEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Deployment
    // -------------------------------------------------------------------------

    /// Create a game with a random id and deploy both armies.
    pub fn create_initial_game(&self, first: Player, second: Player) -> EngineResult<Game> {
        let id = *uuid::Uuid::new_v4().as_bytes();
        self.create_game_with_id(id, first, second)
    }

    /// Create a game with a known id; the seed is derived from id and players.
    pub fn create_game_with_id(&self, id: GameId, first: Player, second: Player) -> EngineResult<Game> {
        let seed = derive_game_seed(&id, &[first.id.0, second.id.0]);
        self.create_game_with_seed(id, first, second, seed)
    }

    /// Create a game with explicit id and seed.
    ///
    /// The first player fills rows 0-1, the second rows 4-5, one blank
    /// piece per tile. Piece ids run row-major from 0.
    pub fn create_game_with_seed(
        &self,
        id: GameId,
        mut first: Player,
        mut second: Player,
        rng_seed: u64,
    ) -> EngineResult<Game> {
        if first.id == second.id {
            return Err(RuleViolation::DuplicatePlayers.into());
        }

        first.status = PlayerStatus::InGame;
        second.status = PlayerStatus::InGame;
        let (first_id, second_id) = (first.id, second.id);

        let mut game = Game::new(id, first, second, rng_seed);

        for pos in Position::all() {
            let owner = if FIRST_PLAYER_ROWS.contains(&pos.y) {
                first_id
            } else if SECOND_PLAYER_ROWS.contains(&pos.y) {
                second_id
            } else {
                continue;
            };
            game.spawn_piece(pos, owner);
        }

        info!(
            "Created game {} ({} vs {}), {} pieces",
            hex::encode(&id[..4]),
            first_id.short(),
            second_id.short(),
            game.board.piece_count()
        );

        Ok(game)
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Assign hidden roles to some of a player's pieces.
    ///
    /// Allowed in SETUP until the player completes setup; later calls
    /// overwrite earlier choices.
    pub fn process_role_assignment(
        &self,
        game: &Game,
        player_id: PlayerId,
        assignments: &[RoleAssignment],
    ) -> EngineResult<Game> {
        self.check_role_assignment(game, player_id, assignments)
            .inspect_err(|e| debug!("Rejected role assignment from {}: {}", player_id.short(), e))?;

        let mut next = game.clone();
        for assignment in assignments {
            if let Some(piece) = next.board.piece_at_mut(assignment.position) {
                piece.role = RoleSlot::Assigned(assignment.role);
            }
        }

        next.push_event(GameEvent::new(
            next.turn_number,
            GameEventData::RolesAssigned {
                player_id,
                count: assignments.len() as u32,
            },
        ));
        debug!("Player {} assigned {} roles", player_id.short(), assignments.len());

        Ok(next)
    }

    fn check_role_assignment(
        &self,
        game: &Game,
        player_id: PlayerId,
        assignments: &[RoleAssignment],
    ) -> EngineResult<()> {
        require_phase(game, GamePhase::Setup)?;
        require_participant(game, player_id)?;
        if game.is_setup_complete(player_id) {
            return Err(RuleViolation::SetupAlreadyCompleted(player_id).into());
        }

        let mut seen = BTreeSet::new();
        for assignment in assignments {
            let pos = assignment.position;
            require_in_bounds(pos)?;
            if !seen.insert(pos) {
                return Err(RuleViolation::DuplicateAssignment(pos).into());
            }
            require_own_piece(game, player_id, pos)?;
        }

        Ok(())
    }

    /// Mark a player's king and trap.
    ///
    /// Every other piece of the player must already hold a role. When the second player finishes, the game moves on to the configured
    /// post-setup phase.
    pub fn process_setup_phase(
        &self,
        game: &Game,
        player_id: PlayerId,
        king: Position,
        trap: Position,
    ) -> EngineResult<Game> {
        self.check_setup(game, player_id, king, trap)
            .inspect_err(|e| debug!("Rejected setup from {}: {}", player_id.short(), e))?;

        let mut next = game.clone();
        if let Some(piece) = next.board.piece_at_mut(king) {
            piece.is_king = true;
        }
        if let Some(piece) = next.board.piece_at_mut(trap) {
            piece.is_trap = true;
        }
        next.setup_completed.insert(player_id, true);
        next.push_event(GameEvent::new(next.turn_number, GameEventData::SetupCompleted { player_id }));
        info!("Player {} completed setup", player_id.short());

        if next.setup_completed.values().all(|done| *done) {
            match self.config.post_setup_phase {
                PostSetupPhase::CoinFlip => transition(&mut next, GamePhase::CoinFlip),
                PostSetupPhase::PlayerTurn => flip_coin(&mut next),
            }
        }

        Ok(next)
    }

    fn check_setup(&self, game: &Game, player_id: PlayerId, king: Position, trap: Position) -> EngineResult<()> {
        require_phase(game, GamePhase::Setup)?;
        require_in_bounds(king)?;
        require_in_bounds(trap)?;
        require_participant(game, player_id)?;
        if game.is_setup_complete(player_id) {
            return Err(RuleViolation::SetupAlreadyCompleted(player_id).into());
        }
        if king == trap {
            return Err(RuleViolation::KingAndTrapOnSameTile(king).into());
        }
        if game.board.piece_at(king).is_none() {
            return Err(RuleViolation::EmptyTile(king).into());
        }
        if game.board.piece_at(trap).is_none() {
            return Err(RuleViolation::EmptyTile(trap).into());
        }
        require_own_piece(game, player_id, king)?;
        require_own_piece(game, player_id, trap)?;

        // Every piece that can move must be able to fight.
        let mut unassigned = game
            .board
            .pieces_of(player_id)
            .filter(|(pos, piece)| *pos != king && *pos != trap && piece.role.role().is_none())
            .map(|(pos, _)| pos);
        if let Some(first) = unassigned.next() {
            return Err(RuleViolation::RolesIncomplete {
                player: player_id,
                missing: 1 + unassigned.count(),
                first,
            }
            .into());
        }
        Ok(())
    }

    /// Draw the first player and start play.
    pub fn resolve_coin_flip(&self, game: &Game) -> EngineResult<Game> {
        require_phase(game, GamePhase::CoinFlip)?;
        let mut next = game.clone();
        flip_coin(&mut next);
        Ok(next)
    }

    // -------------------------------------------------------------------------
    // Moves
    // -------------------------------------------------------------------------

    /// Validate a move without applying it.
    pub fn plan_move(
        &self,
        game: &Game,
        player_id: PlayerId,
        from: Position,
        to: Position,
    ) -> EngineResult<MovePlan> {
        require_phase(game, GamePhase::PlayerTurn)?;
        require_in_bounds(from)?;
        require_in_bounds(to)?;
        if !from.is_adjacent(to) {
            return Err(RuleViolation::NotAdjacent { from, to }.into());
        }
        require_participant(game, player_id)?;
        if game.current_turn != Some(player_id) {
            return Err(RuleViolation::NotYourTurn(player_id).into());
        }

        let mover = require_own_piece(game, player_id, from)?;
        if !mover.is_movable() {
            return Err(RuleViolation::ImmovablePiece(from).into());
        }

        let contact = match game.board.piece_at(to) {
            None => None,
            Some(defender) if defender.is_owned_by(player_id) => {
                return Err(RuleViolation::SelfCapture(to).into());
            }
            Some(defender) => Some(Contact {
                defender_owner: defender.owner,
                result: resolve_contact(mover, defender, from, to)?,
            }),
        };

        Ok(MovePlan {
            player: player_id,
            piece: mover.id,
            from,
            to,
            contact,
        })
    }

    /// Move a piece one step, attacking whatever stands on the destination.
    pub fn process_move(
        &self,
        game: &Game,
        player_id: PlayerId,
        from: Position,
        to: Position,
    ) -> EngineResult<Game> {
        let plan = self
            .plan_move(game, player_id, from, to)
            .inspect_err(|e| debug!("Rejected move {} -> {} from {}: {}", from, to, player_id.short(), e))?;

        let mut next = game.clone();
        match plan.contact {
            None => {
                next.board.relocate(from, to);
                next.push_event(GameEvent::piece_moved(next.turn_number, player_id, plan.piece, from, to));
                debug!("Player {} moved {} -> {}", player_id.short(), from, to);
                end_turn(&mut next, player_id);
            }
            Some(contact) => apply_contact(&mut next, &plan, contact),
        }

        #[cfg(feature = "debug-tracing")]
        trace_board(&next);

        Ok(next)
    }

    /// Every move `process_move` would accept for this player right now.
    pub fn legal_moves(&self, game: &Game, player_id: PlayerId) -> Vec<(Position, Position)> {
        if game.phase != GamePhase::PlayerTurn || game.current_turn != Some(player_id) {
            return Vec::new();
        }

        game.board
            .pieces_of(player_id)
            .filter(|(_, piece)| piece.is_movable())
            .flat_map(|(from, _)| from.neighbors().map(move |to| (from, to)))
            .filter(|(from, to)| self.plan_move(game, player_id, *from, *to).is_ok())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Battle
    // -------------------------------------------------------------------------

    /// Submit a role for the active tied combat.
    ///
    /// Resolves once both combatants have submitted. A tie clears both
    /// submissions for another round.
    pub fn process_battle(&self, game: &Game, player_id: PlayerId, role: Role) -> EngineResult<Game> {
        let (attacker_owner, defender_owner) = self
            .check_battle(game, player_id)
            .inspect_err(|e| debug!("Rejected battle submission from {}: {}", player_id.short(), e))?;

        let mut next = game.clone();
        let Some(combat) = next.combat.as_mut() else {
            return Err(IllegalState::MissingCombat.into());
        };
        combat.roles.insert(player_id, Some(role));
        let (attacker_at, defender_at) = (combat.attacker, combat.defender);

        let roles = if combat.all_submitted() {
            combat.role_of(attacker_owner).zip(combat.role_of(defender_owner))
        } else {
            None
        };

        next.push_event(GameEvent::new(next.turn_number, GameEventData::BattleRoleSubmitted { player_id }));
        debug!("Player {} submitted a battle role", player_id.short());

        let Some((attacker_role, defender_role)) = roles else {
            return Ok(next);
        };

        let outcome = duel(attacker_role, defender_role);
        match outcome {
            CombatOutcome::Tie => {
                let round = match next.combat.as_mut() {
                    Some(combat) => {
                        combat.reset_round();
                        combat.round
                    }
                    None => return Err(IllegalState::MissingCombat.into()),
                };
                next.push_event(GameEvent::new(
                    next.turn_number,
                    GameEventData::BattleTied { round, role: attacker_role },
                ));
                info!("Battle at {} tied on {}, round {}", defender_at, attacker_role, round);
                return Ok(next);
            }
            CombatOutcome::AttackerWins => {
                next.board.relocate(attacker_at, defender_at);
            }
            CombatOutcome::DefenderWins => {
                next.board.take(attacker_at);
            }
            CombatOutcome::KingCaptured | CombatOutcome::Trapped => {
                return Err(IllegalState::UnexpectedBattleOutcome(outcome).into());
            }
        }

        next.push_event(GameEvent::combat_resolved(
            next.turn_number,
            attacker_at,
            defender_at,
            Some(attacker_role),
            Some(defender_role),
            outcome,
        ));
        info!("Battle at {} resolved: {:?}", defender_at, outcome);

        next.combat = None;
        transition(&mut next, GamePhase::PlayerTurn);
        next.turn_number += 1;
        if self.config.alternate_turn_after_battle {
            next.current_turn = Some(defender_owner);
        }

        #[cfg(feature = "debug-tracing")]
        trace_board(&next);

        Ok(next)
    }

    /// Validate a battle submission; returns (attacker owner, defender owner).
    fn check_battle(&self, game: &Game, player_id: PlayerId) -> EngineResult<(PlayerId, PlayerId)> {
        require_phase(game, GamePhase::Battle)?;
        let combat = game.combat.as_ref().ok_or(IllegalState::MissingCombat)?;

        let attacker = game
            .board
            .piece_at(combat.attacker)
            .ok_or(IllegalState::CombatTileEmpty(combat.attacker))?;
        let defender = game
            .board
            .piece_at(combat.defender)
            .ok_or(IllegalState::CombatTileEmpty(combat.defender))?;

        if attacker.owner == defender.owner {
            return Err(IllegalState::CombatantsShareOwner {
                attacker: combat.attacker,
                defender: combat.defender,
            }
            .into());
        }
        if combat.roles.len() != 2
            || !combat.is_participant(attacker.owner)
            || !combat.is_participant(defender.owner)
        {
            return Err(IllegalState::CombatRosterMismatch.into());
        }

        if !combat.is_participant(player_id) {
            return Err(RuleViolation::NotInCombat(player_id).into());
        }
        if combat.has_submitted(player_id) {
            return Err(RuleViolation::RoleAlreadySubmitted(player_id).into());
        }

        Ok((attacker.owner, defender.owner))
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Apply a player request.
    pub fn apply(&self, game: &Game, player_id: PlayerId, request: &GameRequest) -> EngineResult<Game> {
        match request {
            GameRequest::AssignRoles { assignments } => {
                self.process_role_assignment(game, player_id, assignments)
            }
            GameRequest::Setup { king, trap } => self.process_setup_phase(game, player_id, *king, *trap),
            GameRequest::Move { from, to } => self.process_move(game, player_id, *from, *to),
            GameRequest::Battle { role } => self.process_battle(game, player_id, *role),
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn require_phase(game: &Game, expected: GamePhase) -> Result<(), RuleViolation> {
    if game.phase != expected {
        return Err(RuleViolation::WrongPhase {
            expected,
            actual: game.phase,
        });
    }
    Ok(())
}

fn require_in_bounds(pos: Position) -> Result<(), RuleViolation> {
    if !pos.is_in_bounds() {
        return Err(RuleViolation::OutOfBounds(pos));
    }
    Ok(())
}

fn require_participant(game: &Game, player_id: PlayerId) -> Result<(), RuleViolation> {
    if !game.is_participant(player_id) {
        return Err(RuleViolation::NotAParticipant(player_id));
    }
    Ok(())
}

fn require_own_piece(
    game: &Game,
    player_id: PlayerId,
    pos: Position,
) -> Result<&Piece, RuleViolation> {
    let piece = game.board.piece_at(pos).ok_or(RuleViolation::EmptyTile(pos))?;
    if !piece.is_owned_by(player_id) {
        return Err(RuleViolation::NotYourPiece(pos));
    }
    Ok(piece)
}

/// Change phase and record it.
fn transition(game: &mut Game, new_phase: GamePhase) {
    let old_phase = game.phase;
    if old_phase == new_phase {
        return;
    }
    game.phase = new_phase;
    game.push_event(GameEvent::phase_changed(game.turn_number, old_phase, new_phase));
    info!("Game {} phase {:?} -> {:?}", hex::encode(&game.id[..4]), old_phase, new_phase);
}

/// Draw the first player from the game seed and enter PLAYER_TURN.
fn flip_coin(game: &mut Game) {
    let mut rng = DeterministicRng::new(game.rng_seed);
    let [first, second] = game.player_ids();
    let starter = if rng.next_bool() { first } else { second };

    game.current_turn = Some(starter);
    game.push_event(GameEvent::new(game.turn_number, GameEventData::CoinFlipped { first_player: starter }));
    info!("Coin flip: player {} starts", starter.short());
    transition(game, GamePhase::PlayerTurn);
}

/// Count a completed move and hand the turn over.
fn end_turn(game: &mut Game, mover: PlayerId) {
    game.turn_number += 1;
    game.current_turn = game.opponent_of(mover);
}

fn reveal(game: &mut Game, positions: [Position; 2]) {
    for pos in positions {
        if let Some(piece) = game.board.piece_at_mut(pos) {
            piece.revealed = true;
        }
    }
}

/// Apply a validated contact. The plan was checked against this exact
/// board, so the tiles are known to be occupied.
fn apply_contact(game: &mut Game, plan: &MovePlan, contact: Contact) {
    let MovePlan { player, piece, from, to, .. } = *plan;
    let result = contact.result;

    if result.reveals() {
        reveal(game, [from, to]);
    }

    match result.outcome {
        CombatOutcome::Trapped => {
            game.board.take(from);
            game.push_event(GameEvent::new(
                game.turn_number,
                GameEventData::TrapSprung {
                    attacker_owner: player,
                    attacker_piece: piece,
                    trap_at: to,
                },
            ));
            info!("Player {} lost piece {} to the trap at {}", player.short(), piece, to);
            end_turn(game, player);
        }
        CombatOutcome::KingCaptured => {
            game.board.relocate(from, to);
            push_contact_event(game, from, to, result);
            game.push_event(GameEvent::new(
                game.turn_number,
                GameEventData::KingCaptured { winner_id: player, king_at: to },
            ));
            game.winner = Some(player);
            game.turn_number += 1;
            transition(game, GamePhase::End);
            game.push_event(GameEvent::game_ended(game.turn_number, player));
            info!("Player {} captured the king at {} and wins", player.short(), to);
        }
        CombatOutcome::AttackerWins => {
            game.board.relocate(from, to);
            push_contact_event(game, from, to, result);
            end_turn(game, player);
        }
        CombatOutcome::DefenderWins => {
            game.board.take(from);
            push_contact_event(game, from, to, result);
            end_turn(game, player);
        }
        CombatOutcome::Tie => {
            game.combat = Some(CombatRecord::new(from, to, player, contact.defender_owner));
            push_contact_event(game, from, to, result);
            game.push_event(GameEvent::new(
                game.turn_number,
                GameEventData::BattleStarted { attacker_at: from, defender_at: to },
            ));
            transition(game, GamePhase::Battle);
        }
    }
}

/// Dump occupancy row by row. Shows owners only, never roles.
#[cfg(feature = "debug-tracing")]
fn trace_board(game: &Game) {
    let first = game.players[0].id;
    for y in 0..crate::core::position::BOARD_HEIGHT {
        let row: String = (0..BOARD_WIDTH)
            .map(|x| match game.board.piece_at(Position::new(x, y)) {
                None => '.',
                Some(piece) if piece.owner == first => 'a',
                Some(_) => 'b',
            })
            .collect();
        tracing::trace!("row {}: {}", y, row);
    }
}

fn push_contact_event(game: &mut Game, from: Position, to: Position, result: ContactResult) {
    game.push_event(GameEvent::combat_resolved(
        game.turn_number,
        from,
        to,
        result.attacker_role,
        result.defender_role,
        result.outcome,
    ));
    debug!("Contact {} -> {}: {:?}", from, to, result.outcome);
}

// =============================================================================
// TESTS
// =============================================================================
