//! Carryable items: pickup, drop, use effects and equipment slots.
//!
//! Each operation posts its own player-facing message. Refusals (full inventory,
//! unusable item) come back as recoverable [`CoreError`]s after the message is logged.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::Behavior;
use crate::entity::Placement;
use crate::error::{Component, CoreError};
use crate::types::{EntityId, Pos, Tint};
use crate::visibility::{FovSet, compute_visible};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseEffect {
    Heal,
    Lightning,
    Confuse,
    Fireball,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub effect: Option<UseEffect>,
}

impl Item {
    pub fn with_effect(effect: UseEffect) -> Self {
        Self { effect: Some(effect) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    RightHand,
    LeftHand,
}

impl EquipSlot {
    pub fn label(self) -> &'static str {
        match self {
            EquipSlot::RightHand => "right hand",
            EquipSlot::LeftHand => "left hand",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub slot: EquipSlot,
    pub power_bonus: i32,
    pub defense_bonus: i32,
    pub max_hp_bonus: i32,
    pub is_equipped: bool,
}

impl Equipment {
    pub fn new(slot: EquipSlot) -> Self {
        Self { slot, power_bonus: 0, defense_bonus: 0, max_hp_bonus: 0, is_equipped: false }
    }

    pub fn power(mut self, bonus: i32) -> Self {
        self.power_bonus = bonus;
        self
    }

    pub fn defense(mut self, bonus: i32) -> Self {
        self.defense_bonus = bonus;
        self
    }

    pub fn max_hp(mut self, bonus: i32) -> Self {
        self.max_hp_bonus = bonus;
        self
    }
}

/// What a targeted effect is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemTarget {
    Entity(EntityId),
    Tile(Pos),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseOutcome {
    /// The effect fired and the item is gone.
    Consumed,
    /// The effect could not apply; the item stays in the inventory.
    Cancelled,
    /// Equipment was put on or taken off.
    Toggled,
}

impl World {
    /// Picks up the first item lying under `carrier`. `Ok(None)` when there is nothing.
    pub fn pick_up_here(&mut self, carrier: EntityId) -> Result<Option<EntityId>, CoreError> {
        let (level, pos) = self.map_position(carrier)?;
        let found = self.levels[level].objects.iter().copied().find(|&id| {
            id != carrier
                && self
                    .entities
                    .get(id)
                    .is_some_and(|entity| entity.pos == pos && entity.item.is_some())
        });
        match found {
            Some(item) => self.pick_up(carrier, item).map(|()| Some(item)),
            None => {
                self.message("There is nothing here to pick up.", Tint::Grey);
                Ok(None)
            }
        }
    }

    pub fn pick_up(&mut self, carrier: EntityId, item: EntityId) -> Result<(), CoreError> {
        let capacity = self.config.inventory_capacity;
        let (level, _) = self.map_position(item)?;
        let holder = self.entities.get(carrier).ok_or(CoreError::NoSuchEntity)?;
        let name = self.entities[item].name.clone();
        if self.entities[item].item.is_none() {
            return Err(CoreError::ComponentMissing { entity: item, component: Component::Item });
        }
        if holder.inventory.len() >= capacity {
            self.message(format!("Your inventory is full, cannot pick up {name}."), Tint::Red);
            return Err(CoreError::InventoryFull { capacity });
        }

        self.levels[level].objects.retain(|&id| id != item);
        self.entities[item].placement = Placement::Carried { by: carrier };
        if let Some(holder) = self.entities.get_mut(carrier) {
            holder.inventory.push(item);
        }
        self.message(format!("You picked up a {name}!"), Tint::Green);
        debug!(?carrier, ?item, "picked up");

        if let Some(equipment) = self.entities[item].equipment
            && self.equipped_in_slot(carrier, equipment.slot).is_none()
        {
            self.equip(carrier, item)?;
        }
        Ok(())
    }

    /// Dequips first, then lays the item on the carrier's cell.
    pub fn drop_item(&mut self, carrier: EntityId, item: EntityId) -> Result<(), CoreError> {
        self.ensure_carried(carrier, item)?;
        let (level, pos) = self.map_position(carrier)?;
        if self.entities[item].equipment.is_some() {
            self.dequip(carrier, item)?;
        }
        if let Some(holder) = self.entities.get_mut(carrier) {
            holder.inventory.retain(|&id| id != item);
        }
        let entity = &mut self.entities[item];
        entity.placement = Placement::OnMap { level };
        entity.pos = pos;
        let name = entity.name.clone();
        self.levels[level].objects.push(item);
        self.message(format!("You dropped a {name}."), Tint::Yellow);
        Ok(())
    }

    pub fn use_item(
        &mut self,
        user: EntityId,
        item: EntityId,
        target: Option<ItemTarget>,
    ) -> Result<UseOutcome, CoreError> {
        self.ensure_carried(user, item)?;
        let entity = &self.entities[item];
        if entity.equipment.is_some() {
            self.toggle_equip(user, item)?;
            return Ok(UseOutcome::Toggled);
        }
        let Some(effect) = entity.item.and_then(|component| component.effect) else {
            let name = entity.name.clone();
            self.message(format!("The {name} cannot be used."), Tint::White);
            return Err(CoreError::ComponentMissing {
                entity: item,
                component: Component::UseEffect,
            });
        };

        let outcome = match effect {
            UseEffect::Heal => self.cast_heal(user)?,
            UseEffect::Lightning => self.cast_lightning(user)?,
            UseEffect::Confuse => self.cast_confuse(user, target)?,
            UseEffect::Fireball => self.cast_fireball(user, target)?,
        };
        if outcome == UseOutcome::Consumed {
            if let Some(holder) = self.entities.get_mut(user) {
                holder.inventory.retain(|&id| id != item);
            }
            self.entities.remove(item);
        }
        Ok(outcome)
    }

    pub fn equipped_in_slot(&self, carrier: EntityId, slot: EquipSlot) -> Option<EntityId> {
        let holder = self.entities.get(carrier)?;
        holder.inventory.iter().copied().find(|&id| {
            self.entities
                .get(id)
                .and_then(|entity| entity.equipment)
                .is_some_and(|equipment| equipment.slot == slot && equipment.is_equipped)
        })
    }

    pub fn toggle_equip(&mut self, carrier: EntityId, item: EntityId) -> Result<(), CoreError> {
        let equipment = self.equipment_of(item)?;
        if equipment.is_equipped { self.dequip(carrier, item) } else { self.equip(carrier, item) }
    }

    /// Equipping into an occupied slot takes the previous piece off first.
    pub fn equip(&mut self, carrier: EntityId, item: EntityId) -> Result<(), CoreError> {
        let equipment = self.equipment_of(item)?;
        if equipment.is_equipped {
            return Ok(());
        }
        if let Some(old) = self.equipped_in_slot(carrier, equipment.slot) {
            self.dequip(carrier, old)?;
        }
        if let Some(equipment) = self.entities[item].equipment.as_mut() {
            equipment.is_equipped = true;
        }
        let name = self.entities[item].name.clone();
        self.message(format!("Equipped {name} on {}.", equipment.slot.label()), Tint::LightGreen);
        Ok(())
    }

    /// Taking off a max-hp bonus clamps current hp to the new maximum.
    pub fn dequip(&mut self, carrier: EntityId, item: EntityId) -> Result<(), CoreError> {
        let equipment = self.equipment_of(item)?;
        if !equipment.is_equipped {
            return Ok(());
        }
        if let Some(equipment) = self.entities[item].equipment.as_mut() {
            equipment.is_equipped = false;
        }
        let name = self.entities[item].name.clone();
        self.message(
            format!("You've unequipped {name} from {}.", equipment.slot.label()),
            Tint::LightYellow,
        );
        if let Ok(max_hp) = self.max_hp(carrier)
            && let Some(fighter) = self.entities.get_mut(carrier).and_then(|e| e.fighter.as_mut())
        {
            fighter.hp = fighter.hp.min(max_hp);
        }
        Ok(())
    }

    fn equipment_of(&self, item: EntityId) -> Result<Equipment, CoreError> {
        self.entities
            .get(item)
            .ok_or(CoreError::NoSuchEntity)?
            .equipment
            .ok_or(CoreError::ComponentMissing { entity: item, component: Component::Equipment })
    }

    fn ensure_carried(&self, carrier: EntityId, item: EntityId) -> Result<(), CoreError> {
        let entity = self.entities.get(item).ok_or(CoreError::NoSuchEntity)?;
        if entity.placement != (Placement::Carried { by: carrier }) {
            return Err(CoreError::NotCarried);
        }
        Ok(())
    }

    fn cast_heal(&mut self, user: EntityId) -> Result<UseOutcome, CoreError> {
        let max_hp = self.max_hp(user)?;
        let hp = self.fighter(user)?.hp;
        if hp >= max_hp {
            self.message("You are already at full health.", Tint::Red);
            return Ok(UseOutcome::Cancelled);
        }
        self.message("Your wounds start to feel better!", Tint::LightViolet);
        self.heal(user, self.config.heal_amount)?;
        Ok(UseOutcome::Consumed)
    }

    fn cast_lightning(&mut self, user: EntityId) -> Result<UseOutcome, CoreError> {
        let (level, origin) = self.map_position(user)?;
        let range = self.config.lightning_range;
        let visible = self.fov_from(level, origin);
        let target = self.levels[level]
            .objects
            .iter()
            .copied()
            .filter(|&id| id != user)
            .filter_map(|id| self.entities.get(id).map(|entity| (id, entity)))
            .filter(|(_, entity)| entity.is_alive() && visible.contains(&entity.pos))
            .map(|(id, entity)| (id, entity.distance(origin)))
            .filter(|&(_, dist)| dist <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((target, _)) = target else {
            self.message("No enemy is close enough to strike.", Tint::Sky);
            return Ok(UseOutcome::Cancelled);
        };
        let damage = self.config.lightning_damage;
        let name = self.entities[target].name.clone();
        self.message(
            format!(
                "A lightning bolt strikes the {name} with a loud thunderclap! The damage is {damage} hit points."
            ),
            Tint::LightBlue,
        );
        self.take_damage(target, damage, Some(user))?;
        Ok(UseOutcome::Consumed)
    }

    fn cast_confuse(
        &mut self,
        user: EntityId,
        target: Option<ItemTarget>,
    ) -> Result<UseOutcome, CoreError> {
        let (level, origin) = self.map_position(user)?;
        let visible = self.fov_from(level, origin);
        let victim = match target {
            Some(ItemTarget::Entity(id)) if id != user => self.entities.get(id).and_then(|entity| {
                let valid = entity.is_on_level(level)
                    && entity.is_alive()
                    && entity.ai.is_some()
                    && visible.contains(&entity.pos)
                    && entity.distance(origin) <= self.config.confuse_range;
                valid.then_some(id)
            }),
            _ => None,
        };
        let Some(victim) = victim else {
            self.message("No valid target to confuse.", Tint::LightGreen);
            return Ok(UseOutcome::Cancelled);
        };

        let turns = self.config.confuse_turns;
        let entity = &mut self.entities[victim];
        if let Some(previous) = entity.ai.take() {
            entity.ai = Some(Behavior::Confused { previous: Box::new(previous), remaining: turns });
        }
        let name = entity.name.clone();
        self.message(format!("The {name} starts to stumble around!"), Tint::LightGreen);
        Ok(UseOutcome::Consumed)
    }

    fn cast_fireball(
        &mut self,
        user: EntityId,
        target: Option<ItemTarget>,
    ) -> Result<UseOutcome, CoreError> {
        let (level, _) = self.map_position(user)?;
        let Some(ItemTarget::Tile(center)) = target else {
            self.message("No target tile chosen for the fireball.", Tint::Orange);
            return Ok(UseOutcome::Cancelled);
        };
        self.levels[level].grid.tile_at(center)?;

        let radius = self.config.fireball_radius;
        let damage = self.config.fireball_damage;
        self.message(
            format!("The fireball explodes, burning everything within {radius} tiles!"),
            Tint::Orange,
        );
        let victims: Vec<EntityId> = self.levels[level]
            .objects
            .iter()
            .copied()
            .filter(|&id| {
                self.entities
                    .get(id)
                    .is_some_and(|entity| entity.is_alive() && entity.distance(center) <= radius)
            })
            .collect();
        for victim in victims {
            let name = self.entities[victim].name.clone();
            self.message(format!("The {name} gets burned for {damage} hit points."), Tint::Orange);
            self.take_damage(victim, damage, Some(user))?;
        }
        Ok(UseOutcome::Consumed)
    }

    fn fov_from(&self, level: usize, origin: Pos) -> FovSet {
        compute_visible(
            &self.levels[level].grid,
            origin,
            self.config.fov_radius,
            self.config.fov_light_walls,
        )
    }
}
