use serde::{Deserialize, Serialize};

use crate::ai::Behavior;
use crate::combat::{DeathKind, Fighter};
use crate::config::EngineConfig;
use crate::entity::{Entity, scifi_name};
use crate::items::{EquipSlot, Equipment, Item, UseEffect};
use crate::mapgen::SpawnKind;
use crate::rng::GameRng;
use crate::types::{Pos, Tint};

pub struct NpcStats {
    pub hp: i32,
    pub defense: i32,
    pub power: i32,
    pub xp: i32,
}

pub fn npc_stats(kind: SpawnKind) -> Option<NpcStats> {
    match kind {
        SpawnKind::Robot => Some(NpcStats { hp: 10, defense: 0, power: 3, xp: 35 }),
        SpawnKind::SecurityBot => Some(NpcStats { hp: 16, defense: 1, power: 4, xp: 100 }),
        SpawnKind::Explorer => Some(NpcStats { hp: 10, defense: 0, power: 3, xp: 35 }),
        SpawnKind::Worker => Some(NpcStats { hp: 12, defense: 0, power: 1, xp: 10 }),
        _ => None,
    }
}

pub fn player(config: &EngineConfig, pos: Pos) -> Entity {
    let fighter = Fighter::new(30, 2, 5, 0, DeathKind::Player)
        .with_attack_speed(config.default_attack_speed);
    let mut player = Entity::new("player", '@', Tint::White, pos)
        .blocking()
        .with_speed(config.player_speed)
        .with_fighter(fighter);
    player.level = 1;
    player
}

pub fn stairs(pos: Pos) -> Entity {
    Entity::new("stairs", '>', Tint::White, pos).always_visible()
}

/// Things the player can place on the map by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildKind {
    DwarfTree,
    /// Blocks movement.
    Water,
    Beacon,
    HorizontalPipe,
    VerticalPipe,
    PipeJunction,
}

pub fn structure(kind: BuildKind, pos: Pos) -> Entity {
    let (name, glyph, tint) = match kind {
        BuildKind::DwarfTree => ("dwarf tree", '\u{2660}', Tint::DarkGreen),
        BuildKind::Water => ("liquid water", '\u{2248}', Tint::Blue),
        BuildKind::Beacon => ("beacon", '\u{00c5}', Tint::Brass),
        BuildKind::HorizontalPipe => ("pipe", '\u{2550}', Tint::Brass),
        BuildKind::VerticalPipe => ("pipe", '\u{2551}', Tint::Brass),
        BuildKind::PipeJunction => ("pipe", '\u{256c}', Tint::Brass),
    };
    let entity = Entity::new(name, glyph, tint, pos).always_visible();
    if kind == BuildKind::Water { entity.blocking() } else { entity }
}

/// Materialises one spawn from a generated level.
pub fn build(kind: SpawnKind, pos: Pos, config: &EngineConfig, rng: &mut GameRng) -> Entity {
    match kind {
        SpawnKind::Robot | SpawnKind::SecurityBot | SpawnKind::Explorer | SpawnKind::Worker => {
            npc(kind, pos, config, rng)
        }
        SpawnKind::HealingPotion => {
            consumable("healing potion", '!', Tint::Violet, pos, UseEffect::Heal)
        }
        SpawnKind::LightningScroll => {
            consumable("lightning scroll", '?', Tint::LightBlue, pos, UseEffect::Lightning)
        }
        SpawnKind::FireballScroll => {
            consumable("fireball scroll", '?', Tint::Orange, pos, UseEffect::Fireball)
        }
        SpawnKind::ConfusionScroll => {
            consumable("scroll of confusion", '?', Tint::LightYellow, pos, UseEffect::Confuse)
        }
        SpawnKind::Sword => Entity::new("sword", '/', Tint::Sky, pos)
            .always_visible()
            .with_equipment(Equipment::new(EquipSlot::RightHand).power(3)),
        SpawnKind::Shield => Entity::new("shield", '[', Tint::Brass, pos)
            .always_visible()
            .with_equipment(Equipment::new(EquipSlot::LeftHand).defense(1).max_hp(10)),
    }
}

fn consumable(name: &str, glyph: char, tint: Tint, pos: Pos, effect: UseEffect) -> Entity {
    Entity::new(name, glyph, tint, pos).always_visible().with_item(Item::with_effect(effect))
}

fn npc(kind: SpawnKind, pos: Pos, config: &EngineConfig, rng: &mut GameRng) -> Entity {
    let stats = npc_stats(kind).unwrap_or(NpcStats { hp: 1, defense: 0, power: 0, xp: 0 });
    let fighter = Fighter::new(stats.hp, stats.defense, stats.power, stats.xp, DeathKind::Npc)
        .with_attack_speed(config.default_attack_speed);
    let (name, glyph, tint, ai) = match kind {
        SpawnKind::SecurityBot => ("security bot", 'S', Tint::DarkGreen, Behavior::pursue()),
        SpawnKind::Explorer => ("explorer", 'e', Tint::Green, Behavior::explore()),
        SpawnKind::Worker => ("construction worker", 'w', Tint::Yellow, Behavior::worker()),
        _ => ("robot", 'r', Tint::LightGreen, Behavior::pursue()),
    };
    let entity = Entity::new(name, glyph, tint, pos)
        .blocking()
        .with_speed(config.default_speed)
        .with_fighter(fighter)
        .with_ai(ai);
    match kind {
        SpawnKind::Robot | SpawnKind::SecurityBot => {
            entity.with_scifi_name(scifi_name(|len| rng.index(len)))
        }
        _ => entity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_get_crew_designations_and_explorers_do_not() {
        let config = EngineConfig::default();
        let mut rng = GameRng::new(1);
        let robot = build(SpawnKind::Robot, Pos::new(2, 2), &config, &mut rng);
        let explorer = build(SpawnKind::Explorer, Pos::new(3, 2), &config, &mut rng);
        assert!(robot.scifi_name.is_some());
        assert!(explorer.scifi_name.is_none());
        assert!(robot.blocks && robot.fighter.is_some() && robot.ai.is_some());
        assert_eq!(robot.speed, config.default_speed);
    }

    #[test]
    fn equipment_spawns_are_carryable() {
        let config = EngineConfig::default();
        let mut rng = GameRng::new(1);
        let shield = build(SpawnKind::Shield, Pos::new(2, 2), &config, &mut rng);
        assert!(shield.item.is_some());
        assert_eq!(shield.equipment.map(|e| e.max_hp_bonus), Some(10));
        assert!(!shield.blocks);
    }

    #[test]
    fn only_water_blocks_among_structures() {
        let pos = Pos::new(1, 1);
        assert!(structure(BuildKind::Water, pos).blocks);
        for kind in [BuildKind::DwarfTree, BuildKind::Beacon, BuildKind::PipeJunction] {
            let built = structure(kind, pos);
            assert!(!built.blocks && built.always_visible && built.fighter.is_none());
        }
    }
}
