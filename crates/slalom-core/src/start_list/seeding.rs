//! Draw order, snake seeding and bib assignment.

use std::collections::{BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::model::{DrawOrders, StartListEntry, StartListMeta};
use crate::config::BibPlan;
use crate::obs::RaceSpan;
use crate::domain::{Gender, RacerClass, Result, RosterEntry, SlalomError, Team};

/// Keep the recorded order for teams still present and append newcomers in
/// random order.
pub fn draw_order<R: Rng + ?Sized>(
    previous: &[String],
    present: &BTreeSet<String>,
    rng: &mut R,
) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(present.len());
    for team in previous {
        if present.contains(team) && !order.contains(team) {
            order.push(team.clone());
        }
    }
    let mut newcomers: Vec<String> = present
        .iter()
        .filter(|t| !order.contains(*t))
        .cloned()
        .collect();
    newcomers.shuffle(rng);
    order.extend(newcomers);
    order
}

/// Serpentine seeding of one gender's entries.
///
/// Classes run in precedence order. Within a class, position `p` walks the
/// draw order forward when `p` is odd and backward when it is even.
pub fn snake_seed<'a>(entries: &[&'a RosterEntry], draw: &[String]) -> Vec<(&'a RosterEntry, u32)> {
    let by_slot: HashMap<(&str, RacerClass, u32), &'a RosterEntry> = entries
        .iter()
        .filter_map(|e| {
            e.start_order
                .map(|order| ((e.team_id.as_str(), e.class, order), *e))
        })
        .collect();

    let mut seeded = Vec::with_capacity(by_slot.len());
    for class in RacerClass::SEEDED {
        let max = entries
            .iter()
            .filter(|e| e.class == class)
            .filter_map(|e| e.start_order)
            .max()
            .unwrap_or(0);
        for p in 1..=max {
            let teams: Box<dyn Iterator<Item = &String>> = if p % 2 == 1 {
                Box::new(draw.iter())
            } else {
                Box::new(draw.iter().rev())
            };
            for team in teams {
                if let Some(entry) = by_slot.get(&(team.as_str(), class, p)) {
                    seeded.push((*entry, p));
                }
            }
        }
    }
    seeded
}

/// `count` bibs starting at `first`, skipping exclusions and staying below
/// `limit`.
pub fn assign_bibs(
    count: usize,
    first: u32,
    limit: Option<u32>,
    excluded: &BTreeSet<u32>,
) -> Result<Vec<u32>> {
    let mut bibs = Vec::with_capacity(count);
    let mut next = first;
    while bibs.len() < count {
        if limit.is_some_and(|limit| next >= limit) {
            return Err(SlalomError::Validation(format!(
                "{count} racers do not fit in bibs {first}..{}",
                limit.unwrap_or(next)
            )));
        }
        if !excluded.contains(&next) {
            bibs.push(next);
        }
        next += 1;
    }
    Ok(bibs)
}

/// Inputs to one start-list build.
pub struct SeedingInput<'a> {
    pub race_id: &'a str,
    /// Every roster entry of the race, all teams.
    pub roster: &'a [RosterEntry],
    pub teams: &'a [Team],
    pub previous: Option<&'a StartListMeta>,
    pub bibs: BibPlan,
}

/// Build the start list for both genders.
pub fn build<R: Rng + ?Sized>(
    input: SeedingInput<'_>,
    rng: &mut R,
) -> Result<(StartListMeta, Vec<StartListEntry>)> {
    let _span = RaceSpan::enter(input.race_id);
    input.bibs.validate()?;
    let team_names: HashMap<&str, &str> = input
        .teams
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();
    let excluded_bibs = input
        .previous
        .map(|m| m.excluded_bibs.clone())
        .unwrap_or_default();
    let excluded: BTreeSet<u32> = excluded_bibs.iter().copied().collect();
    let empty = DrawOrders::default();
    let previous_draw = input.previous.map_or(&empty, |m| &m.draw_order);

    let mut draw_orders = DrawOrders::default();
    let mut entries = Vec::new();
    for gender in Gender::ALL {
        let field: Vec<&RosterEntry> = input
            .roster
            .iter()
            .filter(|e| e.gender == gender && !e.class.is_dns())
            .collect();
        let present: BTreeSet<String> = field.iter().map(|e| e.team_id.clone()).collect();
        let draw = draw_order(previous_draw.get(gender), &present, rng);

        let seeded = snake_seed(&field, &draw);
        let bibs = assign_bibs(
            seeded.len(),
            input.bibs.first_bib(gender),
            input.bibs.bib_limit(gender),
            &excluded,
        )?;
        entries.extend(seeded.into_iter().zip(bibs).map(|((e, seed), bib)| {
            StartListEntry {
                race_id: input.race_id.to_string(),
                bib,
                racer_id: e.racer_id.clone(),
                racer_name: e.racer_name.clone(),
                team_id: e.team_id.clone(),
                team_name: team_names
                    .get(e.team_id.as_str())
                    .map_or_else(|| e.team_id.clone(), |n| n.to_string()),
                gender,
                class: e.class,
                seed,
            }
        }));
        debug!(%gender, draw = ?draw, "field seeded");
        draw_orders.set(gender, draw);
    }
    entries.sort_by_key(|e| e.bib);

    let meta = StartListMeta {
        race_id: input.race_id.to_string(),
        excluded_bibs,
        draw_order: draw_orders,
        generated_at: Some(chrono::Utc::now()),
    };
    Ok((meta, entries))
}
