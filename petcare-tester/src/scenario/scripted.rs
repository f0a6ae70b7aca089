//! Deterministic scenarios covering the store's documented behavior.
use anyhow::{Context, Result, ensure};
use std::time::Duration;

use super::{Harness, SCENARIO_EPOCH_MS, Scenario, ScenarioCtx};
use petcare_game::constants::{BATHE_DEFAULT_AMOUNT, FEED_DEFAULT_AMOUNT};
use petcare_game::{
    FileStorage, Gender, MemoryStorage, NewPet, Pet, PetColor, PetKind, PetStore, StoreConfig,
    StoreStatus,
};
use serde_json::json;

fn rex() -> NewPet {
    NewPet::new("Rex", PetKind::Dog, Gender::Male, PetColor::Brown)
}

fn seeded_storage(config: &StoreConfig, hunger: u8, hygiene: u8) -> Result<MemoryStorage> {
    let pet = Pet {
        hunger,
        hygiene,
        ..Pet::hatch("seeded", rex(), SCENARIO_EPOCH_MS)
    };
    let storage = MemoryStorage::new();
    storage.insert_raw(&config.storage_key, serde_json::to_string(&pet)?);
    Ok(storage)
}

fn stored_pet(storage: &MemoryStorage, key: &str) -> Result<Pet> {
    let raw = storage.raw(key).context("no stored record")?;
    serde_json::from_str(&raw).context("stored record does not parse")
}

fn active(store: &PetStore<MemoryStorage>) -> Result<Pet> {
    store.pet().context("expected an active pet")
}

pub struct FreshPet;

#[async_trait::async_trait]
impl Scenario for FreshPet {
    fn key(&self) -> &'static str {
        "fresh-pet"
    }

    fn description(&self) -> &'static str {
        "Created pet starts full, clean, broke and bare"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let h = Harness::quiet().await?;
        ensure!(h.store.status() == StoreStatus::Empty, "expected no pet");

        let ticket = h.store.create_pet(rex());
        let pet = active(&h.store)?;
        ensure!(
            pet.hunger == 100 && pet.hygiene == 100,
            "stats should start full"
        );
        ensure!(pet.money == 0, "money should start at 0, got {}", pet.money);
        ensure!(pet.clothes.is_bare(), "no clothes on a new pet");
        ensure!(pet.created_at == SCENARIO_EPOCH_MS, "createdAt is now");
        ticket.persisted().await?;

        let stored = stored_pet(&h.storage, &h.store.config().storage_key)?;
        ensure!(stored == pet, "stored record should match memory");
        if ctx.verbose {
            println!("  🐶 created {} ({})", pet.name, pet.id);
        }
        Ok(())
    }
}

pub struct FeedClamp;

#[async_trait::async_trait]
impl Scenario for FeedClamp {
    fn key(&self) -> &'static str {
        "feed-clamp"
    }

    fn description(&self) -> &'static str {
        "Feeding at 90 hunger clamps to 100"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let config = StoreConfig::default().without_decay();
        let storage = seeded_storage(&config, 90, 50)?;
        let h = Harness::open_with(storage, config).await?;

        h.store.feed(FEED_DEFAULT_AMOUNT).persisted().await?;
        let hunger = active(&h.store)?.hunger;
        ensure!(hunger == 100, "hunger should clamp to 100, got {hunger}");
        Ok(())
    }
}

pub struct BathCost;

#[async_trait::async_trait]
impl Scenario for BathCost {
    fn key(&self) -> &'static str {
        "bath-cost"
    }

    fn description(&self) -> &'static str {
        "Bathing raises hygiene and costs hunger down to zero"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let config = StoreConfig::default().without_decay();
        let storage = seeded_storage(&config, 3, 5)?;
        let h = Harness::open_with(storage, config).await?;

        h.store.bathe(BATHE_DEFAULT_AMOUNT).persisted().await?;
        let pet = active(&h.store)?;
        ensure!(pet.hygiene == 35, "hygiene {} instead of 35", pet.hygiene);
        ensure!(pet.hunger == 0, "hunger {} instead of 0", pet.hunger);
        Ok(())
    }
}

pub struct LegacyRecord;

#[async_trait::async_trait]
impl Scenario for LegacyRecord {
    fn key(&self) -> &'static str {
        "legacy-record"
    }

    fn description(&self) -> &'static str {
        "Record written before money/color existed loads with defaults"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let config = StoreConfig::default().without_decay();
        let storage = MemoryStorage::new();
        let legacy = json!({
            "id": "v1",
            "name": "Tom",
            "type": "cat",
            "gender": "male",
            "hunger": 64,
            "hygiene": 32,
            "clothes": { "head": "hat_red", "eyes": null, "torso": null, "paws": null },
            "createdAt": 1_690_000_000_000_i64,
        })
        .to_string();
        storage.insert_raw(&config.storage_key, legacy.clone());
        let h = Harness::open_with(storage, config).await?;

        let pet = active(&h.store)?;
        ensure!(pet.money == 0, "money should default to 0");
        ensure!(pet.color == PetColor::Base, "color should default to base");
        ensure!(pet.background.is_none(), "background defaults to none");
        ensure!(
            h.storage.raw(&h.store.config().storage_key) == Some(legacy),
            "loading must not rewrite the stored copy"
        );
        Ok(())
    }
}

pub struct ReplacePet;

#[async_trait::async_trait]
impl Scenario for ReplacePet {
    fn key(&self) -> &'static str {
        "replace-pet"
    }

    fn description(&self) -> &'static str {
        "Remove then create yields an unrelated pet under the same key"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let h = Harness::quiet().await?;
        let key = h.store.config().storage_key.clone();
        h.store.create_pet(rex()).persisted().await?;
        h.store.earn_money(40).persisted().await?;
        let first = active(&h.store)?;

        h.store.remove_pet().persisted().await?;
        ensure!(h.store.status() == StoreStatus::Empty, "expected no pet");
        ensure!(h.storage.raw(&key).is_none(), "record should be deleted");

        let cat = NewPet::new("Mimi", PetKind::Cat, Gender::Female, PetColor::Black);
        h.store.create_pet(cat).persisted().await?;
        let second = active(&h.store)?;
        ensure!(second.id != first.id, "new pet must get a new id");
        ensure!(second.money == 0, "new pet must not inherit money");
        let stored = stored_pet(&h.storage, &key)?;
        ensure!(stored == second, "stored record should be the new pet");
        Ok(())
    }
}

pub struct DecayRace;

impl DecayRace {
    const INTERVAL_MS: u64 = 25;
    const START_HUNGER: u8 = 50;
    const START_HYGIENE: u8 = 90;
    const FEED: u8 = 20;
}

#[async_trait::async_trait]
impl Scenario for DecayRace {
    fn key(&self) -> &'static str {
        "decay-race"
    }

    fn description(&self) -> &'static str {
        "Feeding between decay ticks is never overwritten by a stale tick"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let config = StoreConfig {
            decay_interval_ms: Self::INTERVAL_MS,
            ..StoreConfig::default()
        };
        let storage = seeded_storage(&config, Self::START_HUNGER, Self::START_HYGIENE)?;
        let h = Harness::open_with(storage, config).await?;
        let interval = Duration::from_millis(Self::INTERVAL_MS);

        tokio::time::sleep(interval * 2 + interval / 2).await;
        let _ = h.store.feed(Self::FEED);
        tokio::time::sleep(interval * 2 + interval / 2).await;

        // Hygiene only moves on ticks, so it counts them.
        let pet = active(&h.store)?;
        let ticks = Self::START_HYGIENE - pet.hygiene;
        ensure!(ticks >= 2, "expected decay ticks, saw {ticks}");
        let expected = Self::START_HUNGER + Self::FEED - ticks;
        ensure!(
            pet.hunger == expected,
            "hunger {} after {ticks} ticks, expected {expected}",
            pet.hunger
        );

        let key = h.store.config().storage_key.clone();
        h.store.shutdown().await;
        let stored = stored_pet(&h.storage, &key)?;
        let stored_ticks = Self::START_HYGIENE - stored.hygiene;
        ensure!(
            stored.hunger == Self::START_HUNGER + Self::FEED - stored_ticks,
            "stored record lost the feed"
        );
        if ctx.verbose {
            println!("  ⏱️  {stored_ticks} ticks, final hunger {}", stored.hunger);
        }
        Ok(())
    }
}

pub struct StorageFailure;

#[async_trait::async_trait]
impl Scenario for StorageFailure {
    fn key(&self) -> &'static str {
        "storage-failure"
    }

    fn description(&self) -> &'static str {
        "Failed writes keep memory state and the next write catches up"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let config = StoreConfig::default().without_decay();
        let storage = seeded_storage(&config, 40, 40)?;
        let h = Harness::open_with(storage, config).await?;
        let key = h.store.config().storage_key.clone();

        h.storage.reject_writes(true);
        let failed = h.store.feed(30).persisted().await;
        ensure!(failed.is_err(), "write should fail while storage rejects");
        ensure!(active(&h.store)?.hunger == 70, "memory keeps the feed");
        let stale = stored_pet(&h.storage, &key)?;
        ensure!(stale.hunger == 40, "storage keeps the old record");

        h.storage.reject_writes(false);
        h.store.earn_money(1).persisted().await?;
        let stored = stored_pet(&h.storage, &key)?;
        ensure!(stored == active(&h.store)?, "memory carried forward");
        Ok(())
    }
}

pub struct FileRestart;

#[async_trait::async_trait]
impl Scenario for FileRestart {
    fn key(&self) -> &'static str {
        "file-restart"
    }

    fn description(&self) -> &'static str {
        "File-backed store reloads the same pet after shutdown"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let dir = tempfile::tempdir().context("creating scratch data dir")?;
        let config = StoreConfig::default().without_decay();

        let store = PetStore::open(FileStorage::new(dir.path()), config.clone()).await?;
        store.create_pet(rex()).persisted().await?;
        let _ = store.play();
        let _ = store.bathe(10);
        store.earn_money(12).persisted().await?;
        let before = store.pet().context("pet missing before restart")?;
        store.shutdown().await;

        let store = PetStore::open(FileStorage::new(dir.path()), config).await?;
        let after = store.pet().context("pet missing after restart")?;
        ensure!(
            after == before,
            "reloaded pet differs: {after:?} vs {before:?}"
        );
        store.shutdown().await;
        Ok(())
    }
}
