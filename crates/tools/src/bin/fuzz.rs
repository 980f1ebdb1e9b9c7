use anyhow::{Result, bail};
use clap::Parser;
use martian_core::{
    BuildKind, DesignationKind, Direction, EngineConfig, GameStatus, ItemTarget, LevelUpChoice,
    Placement, PlayerCommand, Pos, World,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Number of consecutive seeds to run, starting at `seed`
    #[arg(short, long, default_value_t = 1)]
    runs: u64,
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn random_pos(rng: &mut ChaCha8Rng, world: &World) -> Pos {
    let grid = world.grid();
    Pos::new(
        (rng.next_u64() % grid.width() as u64) as i32,
        (rng.next_u64() % grid.height() as u64) as i32,
    )
}

fn random_command(rng: &mut ChaCha8Rng, world: &World) -> Option<PlayerCommand> {
    let inventory =
        world.player_entity().map(|player| player.inventory.clone()).unwrap_or_default();
    match rng.next_u64() % 20 {
        0 => None,
        1 => Some(PlayerCommand::Wait),
        2 | 3 => Some(PlayerCommand::PickUp),
        4 => Some(PlayerCommand::Descend),
        5 if !inventory.is_empty() => {
            let item = choose(rng, &inventory);
            let target = match rng.next_u64() % 3 {
                0 => None,
                1 => Some(ItemTarget::Tile(random_pos(rng, world))),
                _ => {
                    let objects = &world.level().objects;
                    Some(ItemTarget::Entity(choose(rng, objects)))
                }
            };
            Some(PlayerCommand::Use { item, target })
        }
        6 if !inventory.is_empty() => Some(PlayerCommand::Drop(choose(rng, &inventory))),
        7 => Some(PlayerCommand::Designate {
            from: random_pos(rng, world),
            to: random_pos(rng, world),
            kind: DesignationKind::Clearing,
        }),
        8 => {
            let kinds = [
                BuildKind::DwarfTree,
                BuildKind::Water,
                BuildKind::Beacon,
                BuildKind::HorizontalPipe,
                BuildKind::VerticalPipe,
                BuildKind::PipeJunction,
            ];
            Some(PlayerCommand::Build { kind: choose(rng, &kinds), at: random_pos(rng, world) })
        }
        _ => Some(PlayerCommand::Move(choose(rng, &Direction::ALL))),
    }
}

fn check_invariants(world: &World) -> Result<()> {
    let grid = world.grid();
    let mut occupied = Vec::new();
    for &id in &world.level().objects {
        let Some(entity) = world.entities.get(id) else {
            bail!("Invariant failed: dangling entity {id:?} in level list");
        };
        if !matches!(entity.placement, Placement::OnMap { level } if level == world.current) {
            bail!("Invariant failed: {} listed on a level it is not placed on", entity.name);
        }
        if entity.blocks && grid.is_blocked(entity.pos) {
            bail!("Invariant failed: {} inside a wall at {:?}", entity.name, entity.pos);
        }
        if entity.blocks && !entity.corpse {
            if occupied.contains(&entity.pos) {
                bail!("Invariant failed: two blocking entities share {:?}", entity.pos);
            }
            occupied.push(entity.pos);
        }
        if let Some(fighter) = &entity.fighter
            && fighter.hp > world.max_hp(id)?
        {
            bail!("Invariant failed: {} has hp above max", entity.name);
        }
    }
    if let Some(player) = world.player_entity() {
        for &item in &player.inventory {
            if world.level().objects.contains(&item) {
                bail!("Invariant failed: carried item {item:?} still lies on the map");
            }
        }
    }
    Ok(())
}

fn fuzz_seed(seed: u64, ticks: u64) -> Result<()> {
    let mut world = World::new(EngineConfig::default(), seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut turns = 0;
    while turns < ticks && world.status == GameStatus::Playing {
        if world.pending_level_up() {
            let choice = choose(
                &mut rng,
                &[LevelUpChoice::Constitution, LevelUpChoice::Strength, LevelUpChoice::Agility],
            );
            world.apply_level_up(choice)?;
        }
        let ready = world.player_entity().is_some_and(|player| player.wait == 0);
        let command = if ready { random_command(&mut rng, &world) } else { None };
        let outcome = world.step(command);
        if let Some(err) = outcome.error
            && !err.is_recoverable()
        {
            bail!("Unexpected error on seed {seed} at turn {}: {err}", outcome.turn);
        }
        check_invariants(&world)?;
        turns += 1;
    }

    println!(
        "seed {seed}: {turns} turns, depth {}, status {:?}",
        world.level().depth,
        world.status
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!(
        "Starting fuzz harness on {} seed(s) from {} for max {} turns...",
        args.runs, args.seed, args.ticks
    );
    for seed in args.seed..args.seed.saturating_add(args.runs) {
        fuzz_seed(seed, args.ticks)?;
    }

    println!("Fuzzing completed successfully.");
    Ok(())
}
