//! Melee resolution, damage, healing, death and experience.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Component, CoreError};
use crate::types::{EntityId, Tint};
use crate::world::{GameStatus, World};

/// How an entity reacts to its hit points reaching zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathKind {
    /// Ends the game; the player keeps its components for the final screen.
    Player,
    /// Leaves an inert, non-blocking corpse.
    Npc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    pub base_max_hp: i32,
    pub hp: i32,
    pub base_defense: i32,
    pub base_power: i32,
    /// Experience held; for NPCs, what killing them is worth.
    pub xp: i32,
    pub attack_speed: u32,
    pub death: DeathKind,
}

impl Fighter {
    pub fn new(hp: i32, defense: i32, power: i32, xp: i32, death: DeathKind) -> Self {
        Self {
            base_max_hp: hp,
            hp,
            base_defense: defense,
            base_power: power,
            xp,
            attack_speed: 20,
            death,
        }
    }

    pub fn with_attack_speed(mut self, attack_speed: u32) -> Self {
        self.attack_speed = attack_speed;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelUpChoice {
    /// +20 max hp, and the same amount healed.
    Constitution,
    /// +1 attack power.
    Strength,
    /// +1 defense.
    Agility,
}

/// Summed bonuses of everything an entity has equipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatBonus {
    pub power: i32,
    pub defense: i32,
    pub max_hp: i32,
}

impl World {
    pub fn fighter(&self, id: EntityId) -> Result<&Fighter, CoreError> {
        self.entities
            .get(id)
            .ok_or(CoreError::NoSuchEntity)?
            .fighter
            .as_ref()
            .ok_or(CoreError::ComponentMissing { entity: id, component: Component::Fighter })
    }

    pub fn equipment_bonus(&self, id: EntityId) -> StatBonus {
        let Some(holder) = self.entities.get(id) else {
            return StatBonus::default();
        };
        holder
            .inventory
            .iter()
            .filter_map(|&item| self.entities.get(item).and_then(|entity| entity.equipment))
            .filter(|equipment| equipment.is_equipped)
            .fold(StatBonus::default(), |acc, equipment| StatBonus {
                power: acc.power + equipment.power_bonus,
                defense: acc.defense + equipment.defense_bonus,
                max_hp: acc.max_hp + equipment.max_hp_bonus,
            })
    }

    pub fn power(&self, id: EntityId) -> Result<i32, CoreError> {
        Ok(self.fighter(id)?.base_power + self.equipment_bonus(id).power)
    }

    pub fn defense(&self, id: EntityId) -> Result<i32, CoreError> {
        Ok(self.fighter(id)?.base_defense + self.equipment_bonus(id).defense)
    }

    pub fn max_hp(&self, id: EntityId) -> Result<i32, CoreError> {
        Ok(self.fighter(id)?.base_max_hp + self.equipment_bonus(id).max_hp)
    }

    /// Damage is power minus defense; zero or less leaves the defender untouched.
    /// The attacker waits out its attack speed whether or not the blow landed.
    pub fn attack(&mut self, attacker: EntityId, defender: EntityId) -> Result<(), CoreError> {
        let damage = self.power(attacker)? - self.defense(defender)?;
        let attacker_name = self.entities[attacker].display_name();
        let defender_name = self.entities[defender].name.clone();

        if damage > 0 {
            self.message(
                format!("{attacker_name} attacks {defender_name} for {damage} hit points."),
                Tint::White,
            );
            self.take_damage(defender, damage, Some(attacker))?;
        } else {
            self.message(
                format!("{attacker_name} attacks {defender_name} but it has no effect!"),
                Tint::Yellow,
            );
        }

        let attack_speed = self.fighter(attacker)?.attack_speed;
        if let Some(entity) = self.entities.get_mut(attacker) {
            entity.wait = attack_speed;
        }
        Ok(())
    }

    /// Applies `damage` and runs the death transition when hp drops to zero or below.
    /// The victim's xp goes to `instigator` unless the victim hurt itself.
    pub fn take_damage(
        &mut self,
        victim: EntityId,
        damage: i32,
        instigator: Option<EntityId>,
    ) -> Result<(), CoreError> {
        if damage <= 0 {
            return Ok(());
        }
        let entity = self.entities.get_mut(victim).ok_or(CoreError::NoSuchEntity)?;
        if entity.corpse {
            return Ok(());
        }
        let fighter = entity
            .fighter
            .as_mut()
            .ok_or(CoreError::ComponentMissing { entity: victim, component: Component::Fighter })?;
        fighter.hp -= damage;
        if fighter.hp > 0 {
            return Ok(());
        }

        let reward = fighter.xp;
        let credited = instigator.filter(|&who| who != victim);
        let announced = credited.filter(|&who| who == self.player).map(|_| reward);
        self.kill(victim, announced)?;
        if let Some(who) = credited
            && let Some(fighter) = self.entities.get_mut(who).and_then(|e| e.fighter.as_mut())
        {
            fighter.xp += reward;
            if who == self.player {
                self.check_level_up();
            }
        }
        Ok(())
    }

    /// Death transition. Running it on an entity that is already dead changes nothing.
    /// `reward` is the xp announced to the player, if the player earned any.
    pub fn kill(&mut self, id: EntityId, reward: Option<i32>) -> Result<(), CoreError> {
        let entity = self.entities.get_mut(id).ok_or(CoreError::NoSuchEntity)?;
        if entity.corpse {
            return Ok(());
        }
        let kind = entity.fighter.as_ref().map_or(DeathKind::Npc, |fighter| fighter.death);
        entity.corpse = true;
        entity.glyph = '%';
        entity.tint = Tint::DarkRed;
        let name = entity.display_name();
        entity.name = format!("remains of {}", entity.name);

        match kind {
            DeathKind::Player => {
                info!("player died");
                self.status = GameStatus::Dead;
                self.message("Game Over!", Tint::Red);
            }
            DeathKind::Npc => {
                entity.blocks = false;
                entity.fighter = None;
                entity.ai = None;
                info!(name = %name, "npc died");
                let text = match reward {
                    Some(xp) => format!("{name} dies! You gain {xp} experience points."),
                    None => format!("{name} dies!"),
                };
                self.message(text, Tint::Orange);
                self.send_to_back(id);
            }
        }
        Ok(())
    }

    /// Restores hp up to the effective maximum.
    pub fn heal(&mut self, id: EntityId, amount: i32) -> Result<(), CoreError> {
        let max_hp = self.max_hp(id)?;
        if let Some(fighter) = self.entities.get_mut(id).and_then(|e| e.fighter.as_mut()) {
            fighter.hp = (fighter.hp + amount).min(max_hp);
        }
        Ok(())
    }

    pub fn pending_level_up(&self) -> bool {
        self.pending_level_ups > 0
    }

    pub fn apply_level_up(&mut self, choice: LevelUpChoice) -> Result<(), CoreError> {
        if self.pending_level_ups == 0 {
            return Err(CoreError::NoLevelUpPending);
        }
        let player = self.player;
        let fighter = self
            .entities
            .get_mut(player)
            .and_then(|e| e.fighter.as_mut())
            .ok_or(CoreError::ComponentMissing { entity: player, component: Component::Fighter })?;
        match choice {
            LevelUpChoice::Constitution => {
                fighter.base_max_hp += 20;
                fighter.hp += 20;
            }
            LevelUpChoice::Strength => fighter.base_power += 1,
            LevelUpChoice::Agility => fighter.base_defense += 1,
        }
        self.pending_level_ups -= 1;
        Ok(())
    }

    fn check_level_up(&mut self) {
        let player = self.player;
        loop {
            let Some(entity) = self.entities.get_mut(player) else {
                return;
            };
            let threshold = self.config.level_up_threshold(entity.level);
            let Some(fighter) = entity.fighter.as_mut() else {
                return;
            };
            if fighter.xp < threshold {
                return;
            }
            fighter.xp -= threshold;
            entity.level += 1;
            let level = entity.level;
            self.pending_level_ups += 1;
            info!(level, "player levelled up");
            self.message(
                format!("Your battle skills grow stronger! You reached level {level}!"),
                Tint::Yellow,
            );
        }
    }
}
