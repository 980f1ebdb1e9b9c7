//! Shared test fixtures for the core unit test suites.
//! This module exists to avoid repeating grid, world and actor setup across many tests.
//! It does not own production gameplay logic.

use crate::combat::{DeathKind, Fighter};
use crate::config::EngineConfig;
use crate::content;
use crate::entity::Entity;
use crate::grid::{Grid, Tile};
use crate::items::{Item, UseEffect};
use crate::mapgen::SpawnKind;
use crate::pathfinding::Path;
use crate::types::{EntityId, Pos, Tint};
use crate::visibility::FovSet;
use crate::world::World;

pub(crate) const TEST_SEED: u64 = 0xC0FFEE;

pub(crate) fn test_entity(name: &str, pos: Pos) -> Entity {
    Entity::new(name, '?', Tint::White, pos)
}

/// Open floor ringed by one tile of wall.
pub(crate) fn bordered_room(width: usize, height: usize) -> Grid {
    let mut grid = Grid::new(width, height);
    for pos in grid.positions().collect::<Vec<_>>() {
        let (right, bottom) = (width as i32 - 1, height as i32 - 1);
        if pos.x == 0 || pos.y == 0 || pos.x == right || pos.y == bottom {
            grid.paint(pos, Tile::wall());
        }
    }
    grid
}

pub(crate) fn draw_fov_diag(grid: &Grid, visible: &FovSet) -> String {
    let mut text = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let p = Pos { y: y as i32, x: x as i32 };
            let c = if grid.is_blocked(p) { '#' } else { '.' };
            let v = if visible.contains(&p) { 'v' } else { 'h' };
            text.push_str(&format!("{c}{v} "));
        }
        text.push('\n');
    }
    text
}

/// Follows `path` from `from` and returns where it ends. Panics on a step into a
/// blocked cell or a step longer than one tile.
pub(crate) fn walk_path(grid: &Grid, from: Pos, mut path: Path) -> Pos {
    let mut pos = from;
    while !path.is_empty() {
        let Ok((dx, dy)) = path.walk_next_step(pos) else {
            break;
        };
        assert!(dx.abs() <= 1 && dy.abs() <= 1, "step ({dx}, {dy}) from {pos:?}");
        pos = pos.offset(dx, dy);
        assert!(!grid.is_blocked(pos), "path walks into {pos:?}");
    }
    pos
}

/// A world on a single open `width` x `height` level with the player at `pos`.
pub(crate) fn open_world(width: usize, height: usize, pos: Pos) -> (World, EntityId) {
    let grid = Grid::new(width, height);
    let world = World::with_grid(EngineConfig::default(), TEST_SEED, grid, pos);
    let player = world.player;
    (world, player)
}

/// A pursuing robot on the current level, appended to the turn order.
pub(crate) fn add_robot(world: &mut World, pos: Pos) -> EntityId {
    let robot = content::build(SpawnKind::Robot, pos, &world.config, &mut world.rng);
    let level = world.current;
    world.spawn(robot, level)
}

pub(crate) fn add_item(
    world: &mut World,
    name: &str,
    pos: Pos,
    effect: Option<UseEffect>,
) -> EntityId {
    let item = Entity::new(name, '!', Tint::Violet, pos).with_item(Item { effect });
    let level = world.current;
    world.spawn(item, level)
}

/// Overrides base power and defense, adding a fighter if the entity has none.
pub(crate) fn set_stats(world: &mut World, id: EntityId, power: i32, defense: i32) {
    let entity = &mut world.entities[id];
    let fighter =
        entity.fighter.get_or_insert_with(|| Fighter::new(10, defense, power, 0, DeathKind::Npc));
    fighter.base_power = power;
    fighter.base_defense = defense;
}

/// Runs one behavior turn for `id` regardless of its wait, restoring the behavior
/// (or its replacement) afterwards the way the scheduler does.
pub(crate) fn run_behavior(world: &mut World, id: EntityId) {
    let Some(mut behavior) = world.entities[id].ai.take() else {
        panic!("entity {id:?} has no behavior");
    };
    let next = match behavior.take_turn(world, id) {
        Ok(Some(replacement)) => replacement,
        Ok(None) => behavior,
        Err(err) => panic!("behavior turn failed: {err}"),
    };
    if let Some(entity) = world.entities.get_mut(id)
        && !entity.corpse
        && entity.ai.is_none()
    {
        entity.ai = Some(next);
    }
}
