//! Persistence gateway: one pet record under one storage key.
//!
//! Records are stored as a single JSON blob. Loading runs every stored
//! document through [`migrate_record`] first, so records written before a
//! field existed still deserialize.
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::KeyValueStorage;
use crate::constants::STAT_MAX;
use crate::pet::{Pet, PetColor};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize pet record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage backend failed: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("write-behind queue is closed")]
    WriterClosed,
}

impl PersistError {
    fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }
}

/// Default for a field that older records may lack.
struct FieldDefault {
    field: &'static str,
    value: fn() -> Value,
}

fn base_color() -> Value {
    Value::from(PetColor::default().key())
}

fn no_money() -> Value {
    Value::from(0)
}

fn no_background() -> Value {
    Value::Null
}

fn bare_clothes() -> Value {
    json!({ "head": null, "eyes": null, "torso": null, "paws": null })
}

// New optional fields get one line here.
const FIELD_DEFAULTS: &[FieldDefault] = &[
    FieldDefault {
        field: "color",
        value: base_color,
    },
    FieldDefault {
        field: "money",
        value: no_money,
    },
    FieldDefault {
        field: "background",
        value: no_background,
    },
    FieldDefault {
        field: "clothes",
        value: bare_clothes,
    },
];

const STAT_FIELDS: [&str; 2] = ["hunger", "hygiene"];

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Pull a stored number into `0..=max` as a whole number. Non-numbers are
/// left for serde to reject.
fn normalize_count(map: &mut Map<String, Value>, field: &str, max: Option<u64>) {
    let Some(value) = map.get(field) else {
        return;
    };
    let whole = if let Some(n) = value.as_u64() {
        max.map_or(n, |max| n.min(max))
    } else if let Some(number) = value.as_f64() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = if number.is_finite() {
            number.round().max(0.0) as u64
        } else {
            0
        };
        max.map_or(rounded, |max| rounded.min(max))
    } else {
        return;
    };
    map.insert(field.to_string(), Value::from(whole));
}

/// Backfill missing optional fields with their documented defaults and pull
/// numeric stats into range. Documents that are not objects pass through.
#[must_use]
pub fn migrate_record(mut record: Value) -> Value {
    let Value::Object(map) = &mut record else {
        return record;
    };

    for rule in FIELD_DEFAULTS {
        if is_absent(map.get(rule.field)) {
            map.insert(rule.field.to_string(), (rule.value)());
        }
    }
    for field in STAT_FIELDS {
        normalize_count(map, field, Some(u64::from(STAT_MAX)));
    }
    normalize_count(map, "money", None);

    record
}

/// Reads and writes the single pet record.
#[derive(Debug, Clone)]
pub struct PetRepository<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> PetRepository<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the stored pet. Read or parse failures count as "no pet".
    #[must_use]
    pub fn load(&self) -> Option<Pet> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::error!("failed to read pet record {}: {err}", self.key);
                return None;
            }
        };

        let parsed = serde_json::from_str::<Value>(&raw)
            .map(migrate_record)
            .and_then(serde_json::from_value::<Pet>);
        match parsed {
            Ok(mut pet) => {
                pet.clamp_stats();
                Some(pet)
            }
            Err(err) => {
                log::error!("discarding unreadable pet record {}: {err}", self.key);
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn save(&self, pet: &Pet) -> Result<(), PersistError> {
        let json = serde_json::to_string(pet)?;
        self.storage
            .set_item(&self.key, &json)
            .map_err(PersistError::storage)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails to delete the record.
    pub fn remove(&self) -> Result<(), PersistError> {
        self.storage
            .remove_item(&self.key)
            .map_err(PersistError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::{ClothingSlot, Gender, NewPet, PetKind};
    use crate::storage::MemoryStorage;

    const KEY: &str = "@pet_care_game:pet";

    fn repo() -> PetRepository<MemoryStorage> {
        PetRepository::new(MemoryStorage::new(), KEY)
    }

    fn mimi() -> Pet {
        Pet::hatch(
            "abc",
            NewPet::new("Mimi", PetKind::Cat, Gender::Female, PetColor::Black),
            1_700_000_000_000,
        )
    }

    #[test]
    fn save_then_load_is_lossless() {
        let repo = repo();
        let pet = mimi()
            .earned(42)
            .wearing(ClothingSlot::Torso, Some("dress_pink".into()))
            .with_background(Some("beach".into()));
        repo.save(&pet).unwrap();
        assert_eq!(repo.load(), Some(pet));
    }

    #[test]
    fn missing_record_is_no_pet() {
        assert!(repo().load().is_none());
    }

    #[test]
    fn oldest_shape_is_backfilled() {
        let repo = repo();
        repo.storage().insert_raw(
            KEY,
            r#"{"id":"x","name":"Tom","type":"cat","gender":"male","hunger":80,"hygiene":70,"clothes":{"head":"crown","eyes":null,"torso":null,"paws":null},"createdAt":5}"#,
        );
        let pet = repo.load().unwrap();
        assert_eq!(pet.color, PetColor::Base);
        assert_eq!(pet.money, 0);
        assert_eq!(pet.background, None);
        assert_eq!(pet.clothes.get(ClothingSlot::Head), Some("crown"));
    }

    #[test]
    fn load_does_not_rewrite_the_stored_copy() {
        let repo = repo();
        let raw = json!({
            "id": "x",
            "name": "Tom",
            "type": "cat",
            "gender": "male",
            "hunger": 80,
            "hygiene": 70,
            "clothes": {},
            "createdAt": 5,
        })
        .to_string();
        repo.storage().insert_raw(KEY, raw.clone());
        assert!(repo.load().is_some());
        assert_eq!(repo.storage().raw(KEY), Some(raw));
    }

    #[test]
    fn corrupt_record_is_no_pet() {
        let repo = repo();
        repo.storage().insert_raw(KEY, "{not json");
        assert!(repo.load().is_none());
        repo.storage().insert_raw(KEY, r#"{"id":"x"}"#);
        assert!(repo.load().is_none());
    }

    #[test]
    fn migration_fills_defaults_and_clamps_stats() {
        let migrated = migrate_record(json!({
            "color": "",
            "hunger": 130.4,
            "hygiene": -3,
            "money": 12.6,
        }));
        assert_eq!(migrated["color"], "base");
        assert_eq!(migrated["hunger"], 100);
        assert_eq!(migrated["hygiene"], 0);
        assert_eq!(migrated["money"], 13);
        assert_eq!(migrated["clothes"]["paws"], Value::Null);
        assert!(migrated["background"].is_null());
    }

    #[test]
    fn migration_keeps_present_values() {
        let migrated = migrate_record(json!({ "color": "brown", "money": 7 }));
        assert_eq!(migrated["color"], "brown");
        assert_eq!(migrated["money"], 7);
        assert_eq!(migrate_record(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn write_failures_surface_to_caller() {
        let repo = repo();
        repo.storage().reject_writes(true);
        assert!(matches!(repo.save(&mimi()), Err(PersistError::Storage(_))));
        assert!(matches!(repo.remove(), Err(PersistError::Storage(_))));
    }
}
