use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rpsicq::core::Position;
use rpsicq::game::{Game, Player, PlayerId, Role, RoleAssignment, RulesEngine};

const A: PlayerId = PlayerId::new([1; 16]);
const B: PlayerId = PlayerId::new([2; 16]);

/// A game in PLAYER_TURN with every piece given a role.
fn ready_game(engine: &RulesEngine) -> Game {
    let mut game = engine
        .create_game_with_seed([1; 16], Player::new(A, "a"), Player::new(B, "b"), 42)
        .unwrap();
    for (player, role, king, trap) in [
        (A, Role::Rock, Position::new(0, 0), Position::new(1, 0)),
        (B, Role::Paper, Position::new(6, 5), Position::new(5, 5)),
    ] {
        let assignments: Vec<RoleAssignment> = game
            .board
            .pieces_of(player)
            .map(|(position, _)| RoleAssignment { position, role })
            .collect();
        game = engine.process_role_assignment(&game, player, &assignments).unwrap();
        game = engine.process_setup_phase(&game, player, king, trap).unwrap();
    }
    engine.resolve_coin_flip(&game).unwrap()
}

fn bench_create_game(c: &mut Criterion) {
    let engine = RulesEngine::default();
    c.bench_function("create_game", |b| {
        b.iter(|| {
            engine.create_game_with_seed(
                black_box([1; 16]),
                Player::new(A, "a"),
                Player::new(B, "b"),
                black_box(42),
            )
        })
    });
}

fn bench_legal_moves(c: &mut Criterion) {
    let engine = RulesEngine::default();
    let game = ready_game(&engine);
    let player = game.current_turn.unwrap();
    c.bench_function("legal_moves_opening", |b| {
        b.iter(|| engine.legal_moves(black_box(&game), black_box(player)))
    });
}

fn bench_process_move(c: &mut Criterion) {
    let engine = RulesEngine::default();
    let game = ready_game(&engine);
    let player = game.current_turn.unwrap();
    let (from, to) = engine.legal_moves(&game, player)[0];
    c.bench_function("process_move", |b| {
        b.iter(|| engine.process_move(black_box(&game), player, from, to))
    });
}

fn bench_state_hash(c: &mut Criterion) {
    let engine = RulesEngine::default();
    let game = ready_game(&engine);
    c.bench_function("compute_hash", |b| b.iter(|| black_box(&game).compute_hash()));
}

criterion_group!(
    benches,
    bench_create_game,
    bench_legal_moves,
    bench_process_move,
    bench_state_hash
);
criterion_main!(benches);
