//! Start-list generation, exclusions and copy.

mod common;

use std::sync::Arc;

use common::{enter, fixture};
use rand::rngs::StdRng;
use rand::SeedableRng;
use slalom_core::{BibPlan, EngineConfig, Gender, RacerClass, Slalom, SlalomError};

#[tokio::test]
async fn snake_seeding_across_three_teams() {
    let fx = fixture().await;
    let race_id = fx.race.id.clone();
    for team in ["north", "south", "east"] {
        enter(&fx, team, Gender::Female, RacerClass::Varsity, 2).await;
    }

    let list = fx
        .slalom
        .start_list
        .generate_with_rng(&race_id, &mut StdRng::seed_from_u64(3))
        .await
        .unwrap();
    let draw = list.meta.draw_order.female.clone();
    assert_eq!(draw.len(), 3);

    let teams: Vec<&str> = list.entries.iter().map(|e| e.team_id.as_str()).collect();
    let expected: Vec<&str> = draw
        .iter()
        .chain(draw.iter().rev())
        .map(String::as_str)
        .collect();
    assert_eq!(teams, expected);
    let bibs: Vec<u32> = list.entries.iter().map(|e| e.bib).collect();
    assert_eq!(bibs, vec![1, 2, 3, 4, 5, 6]);
    let seeds: Vec<u32> = list.entries.iter().map(|e| e.seed).collect();
    assert_eq!(seeds, vec![1, 1, 1, 2, 2, 2]);
}

#[tokio::test]
async fn regeneration_keeps_draw_and_appends_new_teams() {
    let fx = fixture().await;
    let race_id = fx.race.id.clone();
    enter(&fx, "north", Gender::Male, RacerClass::JrVarsity, 1).await;
    enter(&fx, "south", Gender::Male, RacerClass::JrVarsity, 1).await;

    let first = fx
        .slalom
        .start_list
        .generate_with_rng(&race_id, &mut StdRng::seed_from_u64(11))
        .await
        .unwrap();
    let before = first.meta.draw_order.male.clone();
    assert!(first.entries.iter().all(|e| e.bib >= 100));

    enter(&fx, "east", Gender::Male, RacerClass::JrVarsity, 1).await;
    let second = fx
        .slalom
        .start_list
        .generate_with_rng(&race_id, &mut StdRng::seed_from_u64(99))
        .await
        .unwrap();
    let after = &second.meta.draw_order.male;
    assert_eq!(&after[..2], &before[..]);
    assert_eq!(after[2], "east");
    assert_eq!(second.entries.len(), 3);
}

#[tokio::test]
async fn excluded_bibs_are_skipped_and_survive_regeneration() {
    let fx = fixture().await;
    let race_id = fx.race.id.clone();
    enter(&fx, "north", Gender::Female, RacerClass::Varsity, 4).await;

    let stored = fx
        .slalom
        .start_list
        .set_exclusions(&race_id, vec![3, 2, 3])
        .await
        .unwrap();
    assert_eq!(stored.meta.excluded_bibs, vec![2, 3]);

    let list = fx.slalom.start_list.generate(&race_id).await.unwrap();
    let bibs: Vec<u32> = list.entries.iter().map(|e| e.bib).collect();
    assert_eq!(bibs, vec![1, 4, 5, 6]);
    assert_eq!(
        fx.slalom.start_list.exclusions(&race_id).await.unwrap(),
        vec![2, 3]
    );

    // Changing exclusions keeps the generated entries until the next run.
    let updated = fx
        .slalom
        .start_list
        .set_exclusions(&race_id, vec![])
        .await
        .unwrap();
    assert_eq!(updated.entries, list.entries);
    assert_eq!(updated.meta.draw_order, list.meta.draw_order);

    assert!(matches!(
        fx.slalom.start_list.set_exclusions(&race_id, vec![0]).await,
        Err(SlalomError::Validation(_))
    ));
}

#[tokio::test]
async fn dns_and_empty_teams_are_left_out() {
    let fx = fixture().await;
    let race_id = fx.race.id.clone();
    enter(&fx, "north", Gender::Female, RacerClass::Varsity, 1).await;
    let scratched = enter(&fx, "south", Gender::Female, RacerClass::JrVarsity, 1).await;
    fx.slalom
        .roster
        .reclassify(&race_id, "south", &scratched[0].id, RacerClass::Dns)
        .await
        .unwrap();

    let list = fx.slalom.start_list.generate(&race_id).await.unwrap();
    assert_eq!(list.entries.len(), 1);
    assert_eq!(list.meta.draw_order.female, vec!["north".to_string()]);
    assert!(list.meta.draw_order.male.is_empty());
    assert_eq!(list.by_bib(1).map(|e| e.team_name.as_str()), Some("North"));
}

#[tokio::test]
async fn copy_validates_and_clones() {
    let fx = fixture().await;
    let race_id = fx.race.id.clone();
    let other = fx.slalom.races.create("Second", None, None).await.unwrap();

    assert!(matches!(
        fx.slalom.start_list.copy(&race_id, &race_id).await,
        Err(SlalomError::Validation(_))
    ));
    assert!(matches!(
        fx.slalom.start_list.copy(&race_id, &other.id).await,
        Err(SlalomError::Validation(_))
    ));

    enter(&fx, "east", Gender::Male, RacerClass::Varsity, 2).await;
    fx.slalom
        .start_list
        .set_exclusions(&race_id, vec![101])
        .await
        .unwrap();
    let source = fx.slalom.start_list.generate(&race_id).await.unwrap();
    let copied = fx
        .slalom
        .start_list
        .copy(&race_id, &other.id)
        .await
        .unwrap();

    assert_eq!(copied.race_id, other.id);
    assert_eq!(copied.meta.excluded_bibs, vec![101]);
    assert_eq!(copied.meta.draw_order, source.meta.draw_order);
    let bibs: Vec<u32> = copied.entries.iter().map(|e| e.bib).collect();
    assert_eq!(bibs, vec![100, 102]);
    assert!(copied.entries.iter().all(|e| e.race_id == other.id));
    assert_eq!(
        fx.slalom.start_list.start_list(&other.id).await.unwrap(),
        copied
    );
}

#[tokio::test]
async fn overlapping_bib_ranges_fail_generation_without_writes() {
    let fx = fixture().await;
    enter(&fx, "north", Gender::Female, RacerClass::Varsity, 1).await;
    enter(&fx, "south", Gender::Male, RacerClass::Varsity, 1).await;
    let config = EngineConfig {
        bibs: BibPlan {
            female_first: 1,
            male_first: 1,
        },
        ..EngineConfig::default()
    };
    let slalom = Slalom::new(Arc::clone(&fx.store), config);
    let records = fx.store.len();

    assert!(matches!(
        slalom.start_list.generate(&fx.race.id).await,
        Err(SlalomError::Validation(_))
    ));
    assert_eq!(fx.store.len(), records);
    assert!(slalom
        .start_list
        .start_list(&fx.race.id)
        .await
        .unwrap()
        .entries
        .is_empty());
}
