use martian_core::{Direction, EngineConfig, GameStatus, PlayerCommand, World};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tempfile::tempdir;

/// A fixed pseudo-random command script: mostly moves, some waits and pickups.
fn script(seed: u64, len: usize) -> Vec<Option<PlayerCommand>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| match rng.next_u64() % 12 {
            0 => None,
            1 => Some(PlayerCommand::Wait),
            2 => Some(PlayerCommand::PickUp),
            n => Some(PlayerCommand::Move(Direction::ALL[(n as usize - 3) % 8])),
        })
        .collect()
}

fn play(world: &mut World, commands: &[Option<PlayerCommand>]) -> Vec<u64> {
    let mut trace = Vec::with_capacity(commands.len());
    for &command in commands {
        if world.status == GameStatus::Dead {
            break;
        }
        world.step(command);
        trace.push(world.snapshot_hash());
    }
    trace
}

#[test]
fn identical_seeds_and_commands_produce_identical_traces() {
    let commands = script(7, 300);
    let mut left = World::new(EngineConfig::default(), 12345);
    let mut right = World::new(EngineConfig::default(), 12345);

    assert_eq!(play(&mut left, &commands), play(&mut right, &commands));
    assert_eq!(left.snapshot(), right.snapshot());
}

#[test]
fn different_seeds_produce_different_hashes() {
    let left = World::new(EngineConfig::default(), 123);
    let right = World::new(EngineConfig::default(), 456);
    assert_ne!(left.snapshot_hash(), right.snapshot_hash());
}

#[test]
fn saving_mid_run_does_not_change_the_outcome() {
    let commands = script(11, 240);
    let (first_half, second_half) = commands.split_at(120);

    let mut uninterrupted = World::new(EngineConfig::default(), 2718);
    play(&mut uninterrupted, &commands);

    let dir = tempdir().unwrap();
    let path = dir.path().join("midrun.json");
    let mut original = World::new(EngineConfig::default(), 2718);
    play(&mut original, first_half);
    original.save(&path).unwrap();
    let mut resumed = World::load(&path).unwrap();
    play(&mut resumed, second_half);

    assert_eq!(resumed.snapshot_hash(), uninterrupted.snapshot_hash());
    assert_eq!(resumed.snapshot(), uninterrupted.snapshot());
}

#[test]
fn unattended_run_stays_deterministic() {
    let mut left = World::new(EngineConfig::default(), 31337);
    let mut right = World::new(EngineConfig::default(), 31337);
    let left_result = left.run(500);
    let right_result = right.run(500);

    assert_eq!(left_result, right_result);
    assert_eq!(left.snapshot_hash(), right.snapshot_hash());
    assert_eq!(left.turn, right.turn);
}
