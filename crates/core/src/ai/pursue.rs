use tracing::debug;

use crate::error::CoreError;
use crate::pathfinding::compute_path;
use crate::types::{EntityId, Tint};
use crate::visibility::compute_visible;
use crate::world::World;

pub(super) fn take_turn(
    world: &mut World,
    me: EntityId,
    has_spoken: &mut bool,
) -> Result<(), CoreError> {
    let target = world.player;
    let (level, pos) = world.map_position(me)?;
    let Ok((target_level, target_pos)) = world.map_position(target) else {
        return Ok(());
    };
    if target_level != level {
        return Ok(());
    }

    let grid = &world.levels[level].grid;
    let visible = compute_visible(grid, pos, world.config.fov_radius, world.config.fov_light_walls);
    if !visible.contains(&target_pos) {
        return Ok(());
    }

    if pos.distance(target_pos) >= 2.0 {
        let mut path = compute_path(grid, pos, target_pos);
        if path.is_empty() {
            debug!(?me, ?target_pos, "pursuer has no route to target");
            return Ok(());
        }
        let (dx, dy) = path.walk_next_step(pos)?;
        world.move_entity(me, dx, dy)?;
    } else if world.entities.get(target).is_some_and(|entity| entity.is_alive()) {
        world.attack(me, target)?;
        if !*has_spoken {
            *has_spoken = true;
            if let Some(name) =
                world.entities.get(me).and_then(|entity| entity.scifi_name.clone())
            {
                world.message(
                    format!("My name is {name} and I am programmed to destroy!"),
                    Tint::Magenta,
                );
            }
        }
    }
    Ok(())
}
