use anyhow::Result;
use std::sync::Arc;

use petcare_game::{ManualClock, MemoryStorage, PetStore, StoreConfig};

pub mod scripted;
pub mod soak;

/// Fixed wall-clock start for scripted sessions.
pub const SCENARIO_EPOCH_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub verbose: bool,
}

#[async_trait::async_trait]
pub trait Scenario: Send + Sync {
    fn key(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn run(&self, ctx: &ScenarioCtx) -> Result<()>;
}

/// A hydrated in-memory store plus handles for poking at it from outside.
pub struct Harness {
    pub store: PetStore<MemoryStorage>,
    pub storage: MemoryStorage,
    pub clock: ManualClock,
}

impl Harness {
    pub async fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with(MemoryStorage::new(), config).await
    }

    pub async fn open_with(storage: MemoryStorage, config: StoreConfig) -> Result<Self> {
        let clock = ManualClock::at(SCENARIO_EPOCH_MS);
        let store = PetStore::with_clock(storage.clone(), config, Arc::new(clock.clone()))?;
        store.hydrate().await;
        Ok(Self {
            store,
            storage,
            clock,
        })
    }

    /// Harness with no background decay, for exact arithmetic checks.
    pub async fn quiet() -> Result<Self> {
        Self::open(StoreConfig::default().without_decay()).await
    }
}

#[must_use]
pub fn all_scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(scripted::FreshPet),
        Box::new(scripted::FeedClamp),
        Box::new(scripted::BathCost),
        Box::new(scripted::LegacyRecord),
        Box::new(scripted::ReplacePet),
        Box::new(scripted::DecayRace),
        Box::new(scripted::StorageFailure),
        Box::new(scripted::FileRestart),
        Box::new(soak::RandomSession),
    ]
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<Box<dyn Scenario>> {
    all_scenarios().into_iter().find(|s| s.key() == key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    all_scenarios()
        .iter()
        .map(|s| (s.key(), s.description()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn scenario_keys_are_unique() {
        let keys: HashSet<_> = list_scenarios().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys.len(), all_scenarios().len());
        assert!(get_scenario("fresh-pet").is_some());
        assert!(get_scenario("nope").is_none());
    }

    #[tokio::test]
    async fn every_scenario_passes() {
        let ctx = ScenarioCtx {
            seed: 1337,
            verbose: false,
        };
        for scenario in all_scenarios() {
            if let Err(err) = scenario.run(&ctx).await {
                panic!("{} failed: {err:#}", scenario.key());
            }
        }
    }
}
