//! Seeded random play session checking invariants after every tap.
use anyhow::{Context, Result, ensure};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{Harness, Scenario, ScenarioCtx};
use crate::screens::{self, ScreenOutcome};
use petcare_game::constants::MILLIS_PER_WEEK;
use petcare_game::{
    BACKGROUNDS, ClothingSlot, FOODS, Gender, ManualClock, MemoryStorage, NewPet, PLAY_ACTIVITIES,
    Pet, PetColor, PetKind, PetStore, find_background, find_clothing, items_for_slot,
};

const SESSION_TAPS: usize = 200;

#[derive(Debug, Clone, Copy)]
enum Tap {
    Feed,
    Play,
    Bath,
    Wear,
    Undress,
    Background,
    WaitAWeek,
}

const TAPS: [Tap; 7] = [
    Tap::Feed,
    Tap::Play,
    Tap::Bath,
    Tap::Wear,
    Tap::Undress,
    Tap::Background,
    Tap::WaitAWeek,
];

fn random_pet(rng: &mut ChaCha8Rng) -> Result<NewPet> {
    let kind = *PetKind::ALL.choose(rng).context("no pet kinds")?;
    let gender = *Gender::ALL.choose(rng).context("no genders")?;
    let color = *PetColor::available_for(kind)
        .choose(rng)
        .context("no colors")?;
    let name = format!("Pet{}", rng.gen_range(1..1000));
    screens::validate_new_pet(&name, kind, gender, color)
}

fn random_slot(rng: &mut ChaCha8Rng) -> Result<ClothingSlot> {
    ClothingSlot::ALL
        .choose(rng)
        .copied()
        .context("no clothing slots")
}

async fn tap(
    store: &PetStore<MemoryStorage>,
    clock: &ManualClock,
    rng: &mut ChaCha8Rng,
    tap: Tap,
) -> Result<ScreenOutcome> {
    let outcome = match tap {
        Tap::Feed => {
            let food = FOODS.choose(rng).context("no foods")?;
            screens::feed(store, food).await
        }
        Tap::Play => {
            let activity = PLAY_ACTIVITIES.choose(rng).context("no activities")?;
            screens::play(store, activity).await
        }
        Tap::Bath => screens::bath(store, rng.gen_range(1..=screens::BATH_SCRUBS)).await,
        Tap::Wear => {
            let slot = random_slot(rng)?;
            let items: Vec<_> = items_for_slot(slot).collect();
            let item = items.choose(rng).context("empty slot catalog")?;
            screens::wear(store, slot, Some(item.id)).await?
        }
        Tap::Undress => screens::wear(store, random_slot(rng)?, None).await?,
        Tap::Background => {
            let pick = BACKGROUNDS.choose(rng).map(|bg| bg.id);
            let pick = if rng.gen_bool(0.25) { None } else { pick };
            screens::background(store, pick).await?
        }
        Tap::WaitAWeek => {
            clock.advance(MILLIS_PER_WEEK);
            ScreenOutcome::default()
        }
    };
    Ok(outcome)
}

fn check_invariants(pet: &Pet, previous_money: u64, age: u8) -> Result<()> {
    ensure!(pet.hunger <= 100, "hunger out of range: {}", pet.hunger);
    ensure!(pet.hygiene <= 100, "hygiene out of range: {}", pet.hygiene);
    ensure!(pet.money >= previous_money, "money went down");
    ensure!((1..=19).contains(&age), "age out of range: {age}");
    for (slot, item) in pet.clothes.iter() {
        if let Some(id) = item {
            let found = find_clothing(id).with_context(|| format!("unknown item {id}"))?;
            ensure!(found.slot == slot, "{id} worn on {}", slot.key());
        }
    }
    if let Some(bg) = &pet.background {
        ensure!(find_background(bg).is_some(), "unknown background {bg}");
    }
    Ok(())
}

pub struct RandomSession;

#[async_trait::async_trait]
impl Scenario for RandomSession {
    fn key(&self) -> &'static str {
        "random-session"
    }

    fn description(&self) -> &'static str {
        "Seeded random taps keep stats clamped and money monotonic"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);
        let h = Harness::quiet().await?;
        screens::create(&h.store, random_pet(&mut rng)?).await;

        let mut coins = 0;
        let mut money = 0;
        for _ in 0..SESSION_TAPS {
            let choice = *TAPS.choose(&mut rng).context("no taps")?;
            let outcome = tap(&h.store, &h.clock, &mut rng, choice).await?;
            ensure!(outcome.failed_writes == 0, "write failed during {choice:?}");
            coins += outcome.coins;

            let pet = h.store.pet().context("pet vanished mid-session")?;
            let age = h.store.age().context("no age for active pet")?;
            check_invariants(&pet, money, age)?;
            money = pet.money;
        }
        ensure!(money == coins, "money {money} != rewards paid {coins}");

        let key = h.store.config().storage_key.clone();
        let last = h.store.pet().context("pet vanished")?;
        h.store.shutdown().await;
        let raw = h.storage.raw(&key).context("nothing persisted")?;
        let stored: Pet = serde_json::from_str(&raw)?;
        ensure!(stored == last, "persisted record lags memory");

        if ctx.verbose {
            println!(
                "  🎲 seed {}: {} coins, hunger {}, hygiene {}",
                ctx.seed, money, last.hunger, last.hygiene
            );
        }
        Ok(())
    }
}
