use tracing::debug;

use super::Behavior;
use crate::error::CoreError;
use crate::types::{EntityId, Tint};
use crate::world::World;

/// One stumble per turn while `remaining > 0`; the turn after the counter runs out
/// hands `previous` back to the scheduler.
pub(super) fn take_turn(
    world: &mut World,
    me: EntityId,
    previous: &Behavior,
    remaining: &mut u32,
) -> Result<Option<Behavior>, CoreError> {
    if *remaining > 0 {
        let dx = world.rng.range_inclusive(-1, 1);
        let dy = world.rng.range_inclusive(-1, 1);
        world.move_entity(me, dx, dy)?;
        *remaining -= 1;
        return Ok(None);
    }

    let name = world.entities.get(me).map(|entity| entity.name.clone()).unwrap_or_default();
    world.message(format!("The {name} is no longer confused!"), Tint::Red);
    debug!(?me, resumed = previous.name(), "confusion wore off");
    Ok(Some(previous.clone()))
}
