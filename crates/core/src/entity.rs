//! Placeable game objects and their optional components.
//!
//! An entity lives in exactly one place: loose on a level's object list or inside
//! another entity's inventory. [`Placement`] records which, and the world keeps the
//! level lists and inventories in step with it.

use serde::{Deserialize, Serialize};

use crate::ai::Behavior;
use crate::combat::Fighter;
use crate::items::{Equipment, Item};
use crate::types::{EntityId, Pos, Tint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Loose on the object list of the level with this index.
    OnMap { level: usize },
    /// Held in the inventory of another entity.
    Carried { by: EntityId },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub glyph: char,
    pub tint: Tint,
    pub pos: Pos,
    pub placement: Placement,
    /// Whether other actors may share this cell.
    pub blocks: bool,
    /// Drawn from memory once its tile has been explored.
    pub always_visible: bool,
    pub speed: u32,
    /// Ticks left before this entity may act again.
    pub wait: u32,
    pub fighter: Option<Fighter>,
    pub ai: Option<Behavior>,
    pub item: Option<Item>,
    pub equipment: Option<Equipment>,
    pub inventory: Vec<EntityId>,
    pub scifi_name: Option<String>,
    pub level: u32,
    /// Set by the death transition; never cleared.
    pub corpse: bool,
}

impl Entity {
    pub fn new(name: impl Into<String>, glyph: char, tint: Tint, pos: Pos) -> Self {
        Self {
            name: name.into(),
            glyph,
            tint,
            pos,
            placement: Placement::OnMap { level: 0 },
            blocks: false,
            always_visible: false,
            speed: 0,
            wait: 0,
            fighter: None,
            ai: None,
            item: None,
            equipment: None,
            inventory: Vec::new(),
            scifi_name: None,
            level: 0,
            corpse: false,
        }
    }

    pub fn blocking(mut self) -> Self {
        self.blocks = true;
        self
    }

    pub fn always_visible(mut self) -> Self {
        self.always_visible = true;
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_fighter(mut self, fighter: Fighter) -> Self {
        self.fighter = Some(fighter);
        self
    }

    pub fn with_ai(mut self, ai: Behavior) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.item = Some(item);
        self
    }

    /// Equipment always rides on an item component so it can be carried.
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = Some(equipment);
        if self.item.is_none() {
            self.item = Some(Item::default());
        }
        self
    }

    pub fn with_scifi_name(mut self, name: String) -> Self {
        self.scifi_name = Some(name);
        self
    }

    /// Name used in combat lines, capitalised at the start of a sentence.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.corpse && self.fighter.as_ref().is_some_and(|fighter| fighter.hp > 0)
    }

    pub fn is_on_level(&self, level: usize) -> bool {
        self.placement == Placement::OnMap { level }
    }

    pub fn distance_to(&self, other: &Entity) -> f64 {
        self.pos.distance(other.pos)
    }

    pub fn distance(&self, pos: Pos) -> f64 {
        self.pos.distance(pos)
    }
}

/// Crew designation for named robots: two to four alphanumerics, a dash, and a
/// generated given name, e.g. `K7-Vordak`.
pub fn scifi_name(mut roll: impl FnMut(usize) -> usize) -> String {
    const ALPHANUMERICS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const ONSETS: [&str; 12] = ["V", "Dr", "K", "Z", "Th", "M", "Gr", "X", "S", "B", "Az", "Ul"];
    const VOWELS: [&str; 6] = ["a", "o", "u", "e", "i", "ae"];
    const CODAS: [&str; 10] = ["rak", "x", "th", "mon", "zul", "gor", "ril", "dak", "nes", "b"];

    let mut name = String::new();
    for _ in 0..2 + roll(3) {
        name.push(char::from(ALPHANUMERICS[roll(ALPHANUMERICS.len())]));
    }
    name.push('-');
    name.push_str(ONSETS[roll(ONSETS.len())]);
    name.push_str(VOWELS[roll(VOWELS.len())]);
    if roll(2) == 1 {
        name.push_str(CODAS[roll(CODAS.len())]);
        name.push_str(VOWELS[roll(VOWELS.len())]);
    }
    name.push_str(CODAS[roll(CODAS.len())]);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::EquipSlot;
    use crate::rng::GameRng;

    #[test]
    fn equipment_brings_an_item_component_along() {
        let sword = Entity::new("sword", '/', Tint::Sky, Pos::new(1, 1))
            .with_equipment(Equipment::new(EquipSlot::RightHand).power(3));
        assert!(sword.item.is_some());
        assert!(sword.item.as_ref().is_some_and(|item| item.effect.is_none()));
    }

    #[test]
    fn display_name_capitalises_the_first_letter() {
        let bot = Entity::new("security bot", 'S', Tint::DarkGreen, Pos::default());
        assert_eq!(bot.display_name(), "Security bot");
    }

    #[test]
    fn scifi_names_have_a_code_and_a_given_name() {
        let mut rng = GameRng::new(11);
        for _ in 0..50 {
            let name = scifi_name(|len| rng.index(len));
            let (code, given) = name.split_once('-').expect("dash separated");
            assert!((2..=4).contains(&code.len()), "{name}");
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            assert!(given.chars().next().is_some_and(char::is_uppercase), "{name}");
        }
    }
}
