//! Petcare Game Core
//!
//! Platform-agnostic state layer for the Petcare virtual pet game.
//! This crate owns the pet record, its care arithmetic, persistence, and
//! background decay. Screens and other front ends sit on top of [`PetStore`]
//! and never touch storage directly.

pub mod age;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
mod decay;
pub mod persistence;
pub mod pet;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use age::pet_age;
pub use catalog::{
    BACKGROUNDS, Background, CLOTHING_ITEMS, ClothingItem, FOODS, Food, PLAY_ACTIVITIES,
    PlayActivity, find_activity, find_background, find_clothing, find_food, items_for_slot,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StoreConfig};
pub use persistence::{PersistError, PetRepository, migrate_record};
pub use pet::{Clothes, ClothingSlot, Gender, NewPet, Pet, PetColor, PetKind};
pub use storage::{FileStorage, MemoryStorage, StorageError};
pub use store::{PetStore, StoreStatus, WriteTicket};

/// Trait for abstracting flat key-value storage.
/// Platform-specific implementations should provide this.
///
/// Calls are synchronous and expected to be quick local operations; the store
/// runs them off the async executor.
pub trait KeyValueStorage: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete `key`. Deleting a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to delete the value.
    fn remove_item(&self, key: &str) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::sync::Mutex;

    // Minimal backend to prove the trait is enough for the gateway.
    #[derive(Default)]
    struct ScratchStorage {
        items: Mutex<HashMap<String, String>>,
    }

    impl KeyValueStorage for ScratchStorage {
        type Error = Infallible;

        fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn repository_works_over_custom_backend() {
        let repo = PetRepository::new(ScratchStorage::default(), "slot");
        let pet = Pet::hatch(
            "id-1",
            NewPet::new("Bolt", PetKind::Dog, Gender::Other, PetColor::WhiteAndBrown),
            0,
        );
        repo.save(&pet).unwrap();
        assert_eq!(repo.load(), Some(pet));
        repo.remove().unwrap();
        assert!(repo.load().is_none());
    }
}
