//! Static reference data: wardrobe, backgrounds, foods and toys.
//!
//! None of this is persisted. The pet record only stores ids that point
//! into these tables.
use crate::pet::ClothingSlot;

/// A wearable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClothingItem {
    pub id: &'static str,
    pub slot: ClothingSlot,
    pub name: &'static str,
    /// Sprite lookup key for renderers.
    pub asset_key: &'static str,
}

const fn item(id: &'static str, slot: ClothingSlot, name: &'static str) -> ClothingItem {
    ClothingItem {
        id,
        slot,
        name,
        asset_key: id,
    }
}

pub const CLOTHING_ITEMS: &[ClothingItem] = &[
    item("hat_red", ClothingSlot::Head, "Red Hat"),
    item("hat_blue", ClothingSlot::Head, "Blue Hat"),
    item("crown", ClothingSlot::Head, "Crown"),
    item("eyes_big", ClothingSlot::Eyes, "Big Eyes"),
    item("eyes_star", ClothingSlot::Eyes, "Star Eyes"),
    item("glasses", ClothingSlot::Eyes, "Glasses"),
    item("shirt_blue", ClothingSlot::Torso, "Blue Shirt"),
    item("shirt_red", ClothingSlot::Torso, "Red Shirt"),
    item("dress_pink", ClothingSlot::Torso, "Pink Dress"),
    item("paws_boots", ClothingSlot::Paws, "Boots"),
    item("paws_socks", ClothingSlot::Paws, "Socks"),
];

pub fn items_for_slot(slot: ClothingSlot) -> impl Iterator<Item = &'static ClothingItem> {
    CLOTHING_ITEMS.iter().filter(move |item| item.slot == slot)
}

#[must_use]
pub fn find_clothing(id: &str) -> Option<&'static ClothingItem> {
    CLOTHING_ITEMS.iter().find(|item| item.id == id)
}

/// Scenery drawn behind the pet. Having no background is `None` on the pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background {
    pub id: &'static str,
    pub name: &'static str,
}

pub const BACKGROUNDS: &[Background] = &[
    Background {
        id: "park",
        name: "Park",
    },
    Background {
        id: "beach",
        name: "Beach",
    },
    Background {
        id: "home",
        name: "Home",
    },
];

#[must_use]
pub fn find_background(id: &str) -> Option<&'static Background> {
    BACKGROUNDS.iter().find(|bg| bg.id == id)
}

/// Something to eat; `value` is the hunger restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    pub id: &'static str,
    pub name: &'static str,
    pub value: u8,
}

pub const FOODS: &[Food] = &[
    Food {
        id: "kibble",
        name: "Kibble",
        value: 20,
    },
    Food {
        id: "fish",
        name: "Fish",
        value: 25,
    },
    Food {
        id: "treat",
        name: "Treat",
        value: 15,
    },
    Food {
        id: "milk",
        name: "Milk",
        value: 10,
    },
];

#[must_use]
pub fn find_food(id: &str) -> Option<&'static Food> {
    FOODS.iter().find(|food| food.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayActivity {
    pub id: &'static str,
    pub name: &'static str,
}

pub const PLAY_ACTIVITIES: &[PlayActivity] = &[
    PlayActivity {
        id: "yarn_ball",
        name: "Yarn Ball",
    },
    PlayActivity {
        id: "small_ball",
        name: "Small Ball",
    },
];

#[must_use]
pub fn find_activity(id: &str) -> Option<&'static PlayActivity> {
    PLAY_ACTIVITIES.iter().find(|activity| activity.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn clothing_ids_are_unique() {
        let ids: HashSet<_> = CLOTHING_ITEMS.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), CLOTHING_ITEMS.len());
    }

    #[test]
    fn every_slot_has_items() {
        for slot in ClothingSlot::ALL {
            assert!(items_for_slot(slot).count() >= 2, "{slot:?} is empty");
        }
        assert_eq!(items_for_slot(ClothingSlot::Paws).count(), 2);
    }

    #[test]
    fn lookups_resolve_known_ids() {
        let crown = find_clothing("crown").map(|item| item.slot);
        assert_eq!(crown, Some(ClothingSlot::Head));
        assert!(find_clothing("cape").is_none());
        assert_eq!(find_food("fish").map(|f| f.value), Some(25));
        assert!(find_background("park").is_some());
        assert!(find_background("none").is_none());
        assert!(find_activity("yarn_ball").is_some());
    }
}
