//! Screen-level actions: what a tap on each game screen does to the store.
//!
//! Coin rewards live here, not in the store. Each screen issues its care
//! action and a separate `earn_money` call.
use anyhow::{Result, bail};
use petcare_game::{
    ClothingSlot, Food, Gender, KeyValueStorage, NewPet, PetColor, PetKind, PetStore, PlayActivity,
    WriteTicket, find_background, find_clothing,
};

pub const FEED_REWARD: u64 = 5;
pub const PLAY_REWARD: u64 = 10;
pub const BATH_REWARD: u64 = 8;

/// Scrubs needed to finish a bath; each one restores a little hygiene.
pub const BATH_SCRUBS: u8 = 5;
pub const SCRUB_HYGIENE: u8 = 5;
pub const BATH_FINISH_BONUS: u8 = 10;

/// What a screen action did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenOutcome {
    pub applied: bool,
    pub coins: u64,
    pub failed_writes: usize,
}

async fn settle(tickets: Vec<WriteTicket>) -> ScreenOutcome {
    let mut outcome = ScreenOutcome::default();
    for ticket in tickets {
        outcome.applied |= !ticket.is_noop();
        if ticket.persisted().await.is_err() {
            outcome.failed_writes += 1;
        }
    }
    outcome
}

fn reward<S: KeyValueStorage>(
    store: &PetStore<S>,
    amount: u64,
    tickets: &mut Vec<WriteTicket>,
) -> u64 {
    let ticket = store.earn_money(amount);
    let earned = if ticket.is_noop() { 0 } else { amount };
    tickets.push(ticket);
    earned
}

/// Validate the creation form the way the create screen does.
///
/// # Errors
///
/// Returns an error for a blank name or a color the species does not come in.
pub fn validate_new_pet(
    name: &str,
    kind: PetKind,
    gender: Gender,
    color: PetColor,
) -> Result<NewPet> {
    let name = name.trim();
    if name.is_empty() {
        bail!("pet name must not be blank");
    }
    if !PetColor::available_for(kind).contains(&color) {
        bail!("{} is not available for a {}", color.key(), kind.key());
    }
    Ok(NewPet::new(name, kind, gender, color))
}

pub async fn create<S: KeyValueStorage>(store: &PetStore<S>, pet: NewPet) -> ScreenOutcome {
    settle(vec![store.create_pet(pet)]).await
}

pub async fn feed<S: KeyValueStorage>(store: &PetStore<S>, food: &Food) -> ScreenOutcome {
    let mut tickets = vec![store.feed(food.value)];
    let coins = reward(store, FEED_REWARD, &mut tickets);
    ScreenOutcome {
        coins,
        ..settle(tickets).await
    }
}

pub async fn play<S: KeyValueStorage>(
    store: &PetStore<S>,
    activity: &PlayActivity,
) -> ScreenOutcome {
    log::debug!("playing with {}", activity.id);
    let mut tickets = vec![store.play()];
    let coins = reward(store, PLAY_REWARD, &mut tickets);
    ScreenOutcome {
        coins,
        ..settle(tickets).await
    }
}

/// Scrub `scrubs` times. Reaching [`BATH_SCRUBS`] finishes the bath with a
/// hygiene bonus and a reward; stopping early pays nothing.
pub async fn bath<S: KeyValueStorage>(store: &PetStore<S>, scrubs: u8) -> ScreenOutcome {
    let mut tickets: Vec<WriteTicket> = (0..scrubs.min(BATH_SCRUBS))
        .map(|_| store.bathe(SCRUB_HYGIENE))
        .collect();
    let mut coins = 0;
    if scrubs >= BATH_SCRUBS {
        tickets.push(store.bathe(BATH_FINISH_BONUS));
        coins = reward(store, BATH_REWARD, &mut tickets);
    }
    ScreenOutcome {
        coins,
        ..settle(tickets).await
    }
}

/// Equip a catalog item, or clear the slot with `None`.
///
/// # Errors
///
/// Returns an error if the item is unknown or belongs to another slot.
pub async fn wear<S: KeyValueStorage>(
    store: &PetStore<S>,
    slot: ClothingSlot,
    item: Option<&str>,
) -> Result<ScreenOutcome> {
    if let Some(id) = item {
        let Some(found) = find_clothing(id) else {
            bail!("unknown clothing item {id}");
        };
        if found.slot != slot {
            bail!("{id} goes on {}, not {}", found.slot.key(), slot.key());
        }
    }
    Ok(settle(vec![store.set_clothing(slot, item.map(str::to_string))]).await)
}

/// Pick a background, or `None` for a plain one.
///
/// # Errors
///
/// Returns an error if the background is unknown.
pub async fn background<S: KeyValueStorage>(
    store: &PetStore<S>,
    id: Option<&str>,
) -> Result<ScreenOutcome> {
    if let Some(id) = id
        && find_background(id).is_none()
    {
        bail!("unknown background {id}");
    }
    Ok(settle(vec![store.set_background(id.map(str::to_string))]).await)
}
