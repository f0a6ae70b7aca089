//! Property tests for the care arithmetic, age curve and persistence.

use petcare_game::constants::MILLIS_PER_WEEK;
use petcare_game::{
    ClothingSlot, Gender, MemoryStorage, NewPet, Pet, PetColor, PetKind, PetRepository, pet_age,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum CareOp {
    Feed(u8),
    Play,
    Bathe(u8),
    Decay(u8),
}

fn care_op() -> impl Strategy<Value = CareOp> {
    prop_oneof![
        any::<u8>().prop_map(CareOp::Feed),
        Just(CareOp::Play),
        any::<u8>().prop_map(CareOp::Bathe),
        (1u8..=100).prop_map(CareOp::Decay),
    ]
}

fn pet_with(hunger: u8, hygiene: u8, money: u64) -> Pet {
    Pet {
        hunger,
        hygiene,
        money,
        ..Pet::hatch(
            "prop",
            NewPet::new("Prop", PetKind::Cat, Gender::Other, PetColor::Base),
            0,
        )
    }
}

fn arb_pet() -> impl Strategy<Value = Pet> {
    (
        "[a-z0-9-]{1,36}",
        "[A-Za-z ]{1,20}",
        prop::sample::select(PetKind::ALL.to_vec()),
        prop::sample::select(Gender::ALL.to_vec()),
        prop::sample::select(PetColor::ALL.to_vec()),
        0u8..=100,
        0u8..=100,
        any::<u32>(),
        prop::option::of(prop::sample::select(vec!["hat_red", "crown"])),
        prop::option::of(prop::sample::select(vec!["park", "home"])),
        0i64..=4_000_000_000_000,
    )
        .prop_map(
            |(id, name, kind, gender, color, hunger, hygiene, money, hat, background, created_at)| {
                let pet = Pet {
                    hunger,
                    hygiene,
                    money: u64::from(money),
                    background: background.map(String::from),
                    ..Pet::hatch(id, NewPet::new(name, kind, gender, color), created_at)
                };
                pet.wearing(ClothingSlot::Head, hat.map(String::from))
            },
        )
}

proptest! {
    #[test]
    fn age_stays_in_range_and_never_decreases(
        created_at in 0i64..=2_000_000_000_000,
        elapsed in 0i64..=(40 * MILLIS_PER_WEEK),
        later in 0i64..=(40 * MILLIS_PER_WEEK),
    ) {
        let now = created_at + elapsed;
        let age = pet_age(Some(created_at), now);
        prop_assert!((1..=19).contains(&age));
        prop_assert!(pet_age(Some(created_at), now + later) >= age);

        let weeks = elapsed / MILLIS_PER_WEEK;
        let expected = u8::try_from((1 + weeks).min(19)).unwrap();
        prop_assert_eq!(age, expected);
    }

    #[test]
    fn future_or_negative_timestamps_are_age_one(
        now in 0i64..=2_000_000_000_000,
        ahead in 1i64..=1_000_000_000,
        negative in i64::MIN..0,
    ) {
        prop_assert_eq!(pet_age(Some(now + ahead), now), 1);
        prop_assert_eq!(pet_age(Some(negative), now), 1);
        prop_assert_eq!(pet_age(None, now), 1);
    }

    #[test]
    fn stats_stay_clamped_through_any_care_sequence(
        hunger in 0u8..=100,
        hygiene in 0u8..=100,
        ops in prop::collection::vec(care_op(), 0..64),
    ) {
        let mut pet = pet_with(hunger, hygiene, 0);
        for op in ops {
            pet = match op {
                CareOp::Feed(amount) => pet.fed(amount),
                CareOp::Play => pet.played(),
                CareOp::Bathe(amount) => pet.bathed(amount),
                CareOp::Decay(step) => pet.decayed(step),
            };
            prop_assert!(pet.hunger <= 100);
            prop_assert!(pet.hygiene <= 100);
        }
    }

    #[test]
    fn feeding_rises_until_full(hunger in 0u8..=100, amount in 1u8..=50) {
        let once = pet_with(hunger, 50, 0).fed(amount);
        let twice = once.fed(amount);
        let expected = (u16::from(hunger) + u16::from(amount)).min(100);
        prop_assert_eq!(u16::from(once.hunger), expected);
        if once.hunger < 100 {
            prop_assert!(twice.hunger > once.hunger);
        } else {
            prop_assert_eq!(twice.hunger, 100);
        }
    }

    #[test]
    fn earning_is_additive(start in any::<u32>(), a in any::<u32>(), b in any::<u32>()) {
        let pet = pet_with(50, 50, u64::from(start));
        let split = pet.earned(u64::from(a)).earned(u64::from(b));
        let joined = pet.earned(u64::from(a) + u64::from(b));
        prop_assert_eq!(split.money, joined.money);
        prop_assert!(split.money >= pet.money);
    }

    #[test]
    fn save_then_load_round_trips(pet in arb_pet()) {
        let repo = PetRepository::new(MemoryStorage::new(), "@pet_care_game:pet");
        repo.save(&pet).unwrap();
        prop_assert_eq!(repo.load(), Some(pet));
    }
}
