//! The pet record and the pure transitions applied to it.
//!
//! Every care action is expressed as a function from the current record to
//! the next one. The store decides *when* a transition runs; this module only
//! decides *what* it does.
use serde::{Deserialize, Serialize};

use crate::age::pet_age;
use crate::constants::{BATHE_HUNGER_COST, PLAY_HUNGER_COST, STAT_MAX, STAT_MIN};

/// Species of the pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetKind {
    Cat,
    Dog,
}

impl PetKind {
    pub const ALL: [Self; 2] = [Self::Cat, Self::Dog];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cat => "cat",
            Self::Dog => "dog",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

/// Coat variant. Brown variants only exist as dog sprites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetColor {
    #[default]
    Base,
    Black,
    Brown,
    WhiteAndBrown,
}

impl PetColor {
    pub const ALL: [Self; 4] = [Self::Base, Self::Black, Self::Brown, Self::WhiteAndBrown];

    /// Colors the creation flow offers for `kind`.
    #[must_use]
    pub const fn available_for(kind: PetKind) -> &'static [Self] {
        match kind {
            PetKind::Cat => &[Self::Base, Self::Black],
            PetKind::Dog => &Self::ALL,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Black => "black",
            Self::Brown => "brown",
            Self::WhiteAndBrown => "whiteandbrown",
        }
    }
}

/// Attachment point for a clothing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClothingSlot {
    Head,
    Eyes,
    Torso,
    Paws,
}

impl ClothingSlot {
    pub const ALL: [Self; 4] = [Self::Head, Self::Eyes, Self::Torso, Self::Paws];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Eyes => "eyes",
            Self::Torso => "torso",
            Self::Paws => "paws",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// Equipped item per slot. Each slot is independently empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clothes {
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub eyes: Option<String>,
    #[serde(default)]
    pub torso: Option<String>,
    #[serde(default)]
    pub paws: Option<String>,
}

impl Clothes {
    #[must_use]
    pub fn get(&self, slot: ClothingSlot) -> Option<&str> {
        match slot {
            ClothingSlot::Head => self.head.as_deref(),
            ClothingSlot::Eyes => self.eyes.as_deref(),
            ClothingSlot::Torso => self.torso.as_deref(),
            ClothingSlot::Paws => self.paws.as_deref(),
        }
    }

    pub fn set(&mut self, slot: ClothingSlot, item: Option<String>) {
        let target = match slot {
            ClothingSlot::Head => &mut self.head,
            ClothingSlot::Eyes => &mut self.eyes,
            ClothingSlot::Torso => &mut self.torso,
            ClothingSlot::Paws => &mut self.paws,
        };
        *target = item;
    }

    /// Iterate slots in display order with whatever is equipped.
    pub fn iter(&self) -> impl Iterator<Item = (ClothingSlot, Option<&str>)> + '_ {
        ClothingSlot::ALL
            .into_iter()
            .map(move |slot| (slot, self.get(slot)))
    }

    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.iter().all(|(_, item)| item.is_none())
    }
}

/// Caller-supplied identity for a new pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPet {
    pub name: String,
    pub kind: PetKind,
    pub gender: Gender,
    pub color: PetColor,
}

impl NewPet {
    pub fn new(name: impl Into<String>, kind: PetKind, gender: Gender, color: PetColor) -> Self {
        Self {
            name: name.into(),
            kind,
            gender,
            color,
        }
    }
}

/// The single persisted pet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PetKind,
    pub gender: Gender,
    pub color: PetColor,
    pub hunger: u8, // 0..=100, 100 = full
    pub hygiene: u8, // 0..=100, 100 = clean
    pub money: u64,
    pub clothes: Clothes,
    #[serde(default)]
    pub background: Option<String>,
    pub created_at: i64,
}

impl Pet {
    /// Fully fed, clean, broke, and bare.
    #[must_use]
    pub fn hatch(id: impl Into<String>, spec: NewPet, created_at: i64) -> Self {
        Self {
            id: id.into(),
            name: spec.name,
            kind: spec.kind,
            gender: spec.gender,
            color: spec.color,
            hunger: STAT_MAX,
            hygiene: STAT_MAX,
            money: 0,
            clothes: Clothes::default(),
            background: None,
            created_at,
        }
    }

    #[must_use]
    pub fn fed(&self, amount: u8) -> Self {
        Self {
            hunger: raise(self.hunger, amount),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn played(&self) -> Self {
        Self {
            hunger: lower(self.hunger, PLAY_HUNGER_COST),
            ..self.clone()
        }
    }

    /// Bathing also burns a little food.
    #[must_use]
    pub fn bathed(&self, amount: u8) -> Self {
        Self {
            hygiene: raise(self.hygiene, amount),
            hunger: lower(self.hunger, BATHE_HUNGER_COST),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn wearing(&self, slot: ClothingSlot, item: Option<String>) -> Self {
        let mut next = self.clone();
        next.clothes.set(slot, item);
        next
    }

    #[must_use]
    pub fn with_background(&self, background: Option<String>) -> Self {
        Self {
            background,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn earned(&self, amount: u64) -> Self {
        Self {
            money: self.money.saturating_add(amount),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn decayed(&self, step: u8) -> Self {
        Self {
            hunger: lower(self.hunger, step),
            hygiene: lower(self.hygiene, step),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn age(&self, now: i64) -> u8 {
        pet_age(Some(self.created_at), now)
    }

    /// Pull stats back into range after loading foreign data.
    pub fn clamp_stats(&mut self) {
        self.hunger = self.hunger.clamp(STAT_MIN, STAT_MAX);
        self.hygiene = self.hygiene.clamp(STAT_MIN, STAT_MAX);
    }
}

fn raise(value: u8, amount: u8) -> u8 {
    value.saturating_add(amount).min(STAT_MAX)
}

fn lower(value: u8, amount: u8) -> u8 {
    value.saturating_sub(amount).max(STAT_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rex() -> Pet {
        Pet::hatch(
            "pet-1",
            NewPet::new("Rex", PetKind::Dog, Gender::Male, PetColor::Brown),
            1_000,
        )
    }

    #[test]
    fn hatch_starts_full_and_bare() {
        let pet = rex();
        assert_eq!(pet.hunger, 100);
        assert_eq!(pet.hygiene, 100);
        assert_eq!(pet.money, 0);
        assert!(pet.clothes.is_bare());
        assert!(pet.background.is_none());
    }

    #[test]
    fn feeding_clamps_at_full() {
        let pet = rex().played().played().played();
        assert_eq!(pet.hunger, 40);
        assert_eq!(pet.fed(25).hunger, 65);
        assert_eq!(pet.fed(25).fed(50).hunger, 100);
    }

    #[test]
    fn playing_costs_food_only() {
        let pet = Pet {
            hunger: 15,
            hygiene: 50,
            ..rex()
        };
        let next = pet.played();
        assert_eq!(next.hunger, 0);
        assert_eq!(next.hygiene, 50);
        assert_eq!(next.money, pet.money);
    }

    #[test]
    fn bathing_raises_hygiene_and_costs_hunger() {
        let pet = Pet {
            hunger: 3,
            hygiene: 5,
            ..rex()
        };
        let next = pet.bathed(30);
        assert_eq!(next.hygiene, 35);
        assert_eq!(next.hunger, 0);
    }

    #[test]
    fn wearing_touches_only_one_slot() {
        let pet = rex().wearing(ClothingSlot::Head, Some("crown".into()));
        let pet = pet.wearing(ClothingSlot::Paws, Some("paws_boots".into()));
        let pet = pet.wearing(ClothingSlot::Head, None);
        assert_eq!(pet.clothes.get(ClothingSlot::Head), None);
        assert_eq!(pet.clothes.get(ClothingSlot::Paws), Some("paws_boots"));
    }

    #[test]
    fn decay_floors_at_zero() {
        let pet = Pet {
            hunger: 0,
            hygiene: 1,
            ..rex()
        };
        let next = pet.decayed(1);
        assert_eq!((next.hunger, next.hygiene), (0, 0));
    }

    #[test]
    fn serialized_shape_uses_storage_field_names() {
        let pet = rex().wearing(ClothingSlot::Eyes, Some("glasses".into()));
        let value = serde_json::to_value(&pet).unwrap();
        assert_eq!(value["type"], "dog");
        assert_eq!(value["color"], "brown");
        assert_eq!(value["createdAt"], 1_000);
        assert_eq!(value["clothes"]["eyes"], "glasses");
        assert!(value["clothes"]["head"].is_null());
        assert!(value["background"].is_null());
    }

    #[test]
    fn white_and_brown_key_matches_storage() {
        let json = serde_json::to_string(&PetColor::WhiteAndBrown).unwrap();
        assert_eq!(json, "\"whiteandbrown\"");
        assert_eq!(PetColor::WhiteAndBrown.key(), "whiteandbrown");
    }

    #[test]
    fn cats_only_offer_two_colors() {
        assert_eq!(
            PetColor::available_for(PetKind::Cat),
            &[PetColor::Base, PetColor::Black]
        );
        assert_eq!(PetColor::available_for(PetKind::Dog).len(), 4);
    }
}
