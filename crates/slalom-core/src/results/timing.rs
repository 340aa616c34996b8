//! Raw timing-system input.

use serde::{Deserialize, Serialize};

use super::model::RunResult;
use crate::config::TimeUnit;

/// Status code of a completed run.
pub const STATUS_FINISHED: i32 = 1;

/// One run as exported by the timing system: a status code and two instants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRun {
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub finish: i64,
}

/// One competitor block of a timing export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCompetitor {
    pub bib: u32,
    #[serde(default)]
    pub name: String,
    /// Team label as typed into the timing system.
    #[serde(default)]
    pub team: String,
    /// Class label as typed into the timing system.
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub run1: RawRun,
    #[serde(default)]
    pub run2: RawRun,
}

/// Score a run only when it finished with two positive, ordered instants.
pub fn parse_run(raw: &RawRun, unit: TimeUnit) -> RunResult {
    let elapsed = (raw.status == STATUS_FINISHED
        && raw.start > 0
        && raw.finish > 0
        && raw.finish > raw.start)
        .then(|| raw.finish - raw.start);
    RunResult {
        status: raw.status,
        time_units: elapsed,
        time: elapsed.map(|units| unit.to_seconds(units)),
        points: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(status: i32, start: i64, finish: i64) -> RawRun {
        RawRun {
            status,
            start,
            finish,
        }
    }

    #[test]
    fn quarter_second_in_micros() {
        let parsed = parse_run(&run(1, 1_000_000, 1_250_000), TimeUnit::Microseconds);
        assert_eq!(parsed.time_units, Some(250_000));
        assert_eq!(parsed.time, Some(0.25));
        assert!(parsed.completed());
    }

    #[test]
    fn unfinished_runs_are_unscored() {
        for raw in [
            run(2, 1_000, 2_000),
            run(1, 0, 2_000),
            run(1, 1_000, 0),
            run(1, 2_000, 2_000),
            run(1, 3_000, 2_000),
            RawRun::default(),
        ] {
            let parsed = parse_run(&raw, TimeUnit::Microseconds);
            assert_eq!(parsed.time, None, "{raw:?}");
            assert_eq!(parsed.status, raw.status);
        }
    }

    #[test]
    fn competitor_blocks_tolerate_missing_fields() {
        let raw: RawCompetitor =
            serde_json::from_str(r#"{"bib": 12, "name": "Doe, Jane"}"#).unwrap();
        assert_eq!(raw.bib, 12);
        assert_eq!(raw.run1, RawRun::default());
    }
}
