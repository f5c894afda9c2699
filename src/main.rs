//! RPSICQ Server
//!
//! Plays a seeded self-play game through the rules engine, then replays
//! the record and checks the final state hash.
//!
//! Usage: `rpsicq-server [SEED]` (or set `RPSICQ_SEED`).

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rpsicq::{
    DeterministicRng, SEED_ENV, VERSION,
    core::Position,
    game::{
        Game, GameEvent, GameEventData, GamePhase, GameRecord, GameRequest, Player, PlayerId,
        PlayerView, RecordedStep, Role, RoleAssignment, RulesEngine, replay,
    },
};

/// Seed used when none is given.
const DEFAULT_SEED: u64 = 12345;

/// Safety stop for games that shuffle pieces forever.
const MAX_STEPS: usize = 2000;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("RPSICQ Server v{}", VERSION);

    let seed = read_seed()?;
    info!("RNG Seed: {}", seed);

    demo_game(seed)
}

fn read_seed() -> Result<u64> {
    match std::env::args().nth(1).or_else(|| std::env::var(SEED_ENV).ok()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid seed {:?}", raw)),
        None => Ok(DEFAULT_SEED),
    }
}

fn random_role(rng: &mut DeterministicRng) -> Role {
    Role::ALL[rng.next_int(Role::ALL.len() as u32) as usize]
}

/// Play one game with random but reproducible choices.
fn demo_game(seed: u64) -> Result<()> {
    info!("=== Starting Demo Game ===");

    let engine = RulesEngine::default();
    let mut rng = DeterministicRng::new(seed);

    let mut game_id = [0u8; 16];
    game_id[..8].copy_from_slice(&seed.to_le_bytes());
    let alice = PlayerId::new([1; 16]);
    let bob = PlayerId::new([2; 16]);

    let mut game = engine.create_game_with_seed(
        game_id,
        Player::new(alice, "alice"),
        Player::new(bob, "bob"),
        seed,
    )?;
    let mut record = GameRecord::start(&game);
    info!("Game ID: {}", hex::encode(game_id));

    // Setup
    for player in game.player_ids() {
        let mut positions: Vec<Position> = game.board.pieces_of(player).map(|(pos, _)| pos).collect();
        let assignments = positions
            .iter()
            .map(|&position| RoleAssignment {
                position,
                role: random_role(&mut rng),
            })
            .collect();
        game = record.play(
            &engine,
            &game,
            RecordedStep::Player {
                player_id: player,
                request: GameRequest::AssignRoles { assignments },
            },
        )?;

        rng.shuffle(&mut positions);
        let (king, trap) = (positions[0], positions[1]);
        game = record.play(
            &engine,
            &game,
            RecordedStep::Player {
                player_id: player,
                request: GameRequest::Setup { king, trap },
            },
        )?;
        info!("Player {} hid king at {} and trap at {}", player.short(), king, trap);
    }

    game = record.play(&engine, &game, RecordedStep::CoinFlip)?;
    let mut total_events = game.take_events().len();

    // Play
    for _ in 0..MAX_STEPS {
        let step = match game.phase {
            GamePhase::PlayerTurn => {
                let player = game.current_turn.context("PLAYER_TURN without a turn owner")?;
                let moves = engine.legal_moves(&game, player);
                let Some(&(from, to)) = rng.choose(&moves) else {
                    info!("Player {} has no legal move", player.short());
                    break;
                };
                RecordedStep::Player {
                    player_id: player,
                    request: GameRequest::Move { from, to },
                }
            }
            GamePhase::Battle => {
                let combat = game.combat.as_ref().context("BATTLE without a combat record")?;
                let player = combat
                    .roles
                    .iter()
                    .find(|(_, role)| role.is_none())
                    .map(|(id, _)| *id)
                    .context("battle has no open slot")?;
                RecordedStep::Player {
                    player_id: player,
                    request: GameRequest::Battle { role: random_role(&mut rng) },
                }
            }
            GamePhase::End => break,
            other => bail!("unexpected phase {:?}", other),
        };

        game = record.play(&engine, &game, step)?;
        for event in game.take_events() {
            log_event(&event);
            total_events += 1;
        }
        game.verify_invariants()?;
    }

    record.finish(&game);

    // Results
    info!("=== Game Results ===");
    match game.winner {
        Some(winner) => info!("Winner: {} after {} turns", winner.short(), game.turn_number),
        None => warn!("No winner after {} turns ({:?})", game.turn_number, game.phase),
    }
    for player in game.player_ids() {
        info!("Player {}: {} pieces left", player.short(), game.board.pieces_of(player).count());
    }
    info!("Total events: {}", total_events);
    info!("Final State Hash: {}", hex::encode(game.compute_hash()));

    report_view(&game, alice)?;

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let json = record.to_json()?;
    info!("Record: {} steps, {} bytes", record.len(), json.len());
    let restored = GameRecord::from_json(&json)?;
    let replayed = replay(&engine, &restored)?;

    if replayed.compute_hash() == game.compute_hash() {
        info!("Determinism verified: replay hash matches");
    } else {
        bail!("determinism check failed: replay hash differs");
    }

    Ok(())
}

fn report_view(game: &Game, viewer: PlayerId) -> Result<()> {
    let view = PlayerView::for_player(game, viewer)?;
    let hidden = view.pieces.iter().filter(|p| p.role.is_none()).count();
    info!(
        "View for {}: {} pieces visible, {} roles hidden, {} bytes",
        viewer.short(),
        view.pieces.len(),
        hidden,
        view.to_json()?.len()
    );
    Ok(())
}

fn log_event(event: &GameEvent) {
    match &event.data {
        GameEventData::TrapSprung { attacker_owner, trap_at, .. } => {
            info!("Turn {}: player {} walked into the trap at {}", event.turn, attacker_owner.short(), trap_at);
        }
        GameEventData::CombatResolved { defender_at, attacker_role, defender_role, outcome, .. } => {
            info!(
                "Turn {}: combat at {} ({:?} vs {:?}) -> {:?}",
                event.turn, defender_at, attacker_role, defender_role, outcome
            );
        }
        GameEventData::BattleTied { round, role } => {
            info!("Turn {}: battle tied on {}, round {}", event.turn, role, round);
        }
        GameEventData::KingCaptured { winner_id, king_at } => {
            info!("Turn {}: player {} captured the king at {}", event.turn, winner_id.short(), king_at);
        }
        GameEventData::GameEnded { winner_id, turns } => {
            info!("Game ended! Winner: {} ({} turns)", winner_id.short(), turns);
        }
        _ => {}
    }
}
