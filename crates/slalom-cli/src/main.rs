//! Slalom - race administration CLI
//!
//! The `slalom` command drives the roster, start-list and results engines
//! against a SurrealDB-backed document store.
//!
//! ## Commands
//!
//! - `race`: create, list, lock and delete races
//! - `team` / `racer`: maintain the directory
//! - `roster`: add, reclassify, remove, move and copy roster entries
//! - `start-list`: generate, copy and manage excluded bibs
//! - `results`: submit timing exports and show scored results
//!
//! Every command prints its resulting snapshot as pretty JSON on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use slalom_core::results::RawCompetitor;
use slalom_core::{
    BibPlan, Direction, EngineConfig, Gender, RacerClass, Slalom, TimeUnit,
};
use slalom_state::{DocumentStore, SurrealDocumentStore};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "slalom")]
#[command(author = "Slalom Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rosters, start lists and results for ski racing leagues", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Database URL (mem://, surrealkv://path, ws://host:port)
    #[arg(long, global = true, env = "SLALOM_DB_URL")]
    db_url: Option<String>,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct EngineArgs {
    /// Unit of start/finish instants in timing exports
    #[arg(long, global = true, env = "SLALOM_TIME_UNIT", default_value = "microseconds")]
    time_unit: TimeUnit,

    /// First bib handed to women
    #[arg(long, global = true, env = "SLALOM_FEMALE_FIRST_BIB", default_value_t = 1)]
    female_first_bib: u32,

    /// First bib handed to men
    #[arg(long, global = true, env = "SLALOM_MALE_FIRST_BIB", default_value_t = 100)]
    male_first_bib: u32,
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        EngineConfig {
            bibs: BibPlan {
                female_first: self.female_first_bib,
                male_first: self.male_first_bib,
            },
            time_unit: self.time_unit,
            ..EngineConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Manage races
    Race {
        #[command(subcommand)]
        action: RaceAction,
    },

    /// Manage teams
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// Manage racers
    Racer {
        #[command(subcommand)]
        action: RacerAction,
    },

    /// Edit a team's roster for a race
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },

    /// Generate and inspect start lists
    StartList {
        #[command(subcommand)]
        action: StartListAction,
    },

    /// Submit and inspect results
    Results {
        #[command(subcommand)]
        action: ResultsAction,
    },
}

#[derive(Subcommand)]
enum RaceAction {
    /// Create a race
    Create {
        name: String,

        #[arg(long)]
        venue: Option<String>,

        /// Race day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List races by date
    List,
    /// Show one race
    Show { race: String },
    /// Block roster, start-list and results changes
    Lock { race: String },
    /// Allow changes again
    Unlock { race: String },
    /// Delete a race with its rosters, start list and results
    Delete { race: String },
}

#[derive(Subcommand)]
enum TeamAction {
    /// Register or rename a team
    Add {
        /// Short team id, e.g. "north"
        id: String,
        name: String,

        /// Exclude the team from league scoring
        #[arg(long)]
        non_league: bool,
    },
    /// List teams
    List,
}

#[derive(Subcommand)]
enum RacerAction {
    /// Register a racer
    Add {
        team: String,
        name: String,

        #[arg(short, long)]
        gender: Gender,

        /// Base class: varsity, alternate, jv, provisional
        #[arg(short, long)]
        class: RacerClass,
    },
    /// List a team's racers
    List { team: String },
}

#[derive(Subcommand)]
enum RosterAction {
    /// Show a team's roster
    Show { race: String, team: String },
    /// Add a racer to the roster
    Add {
        race: String,
        team: String,
        racer: String,

        /// Requested class (defaults to the racer's base class)
        #[arg(short, long)]
        class: Option<RacerClass>,
    },
    /// Change an entry's class
    Reclassify {
        race: String,
        team: String,
        racer: String,
        class: RacerClass,
    },
    /// Remove an entry
    Remove {
        race: String,
        team: String,
        racer: String,
    },
    /// Move an entry up or down one slot
    Move {
        race: String,
        team: String,
        racer: String,
        direction: Direction,
    },
    /// Replace a team's roster in DEST with a copy of SOURCE's
    Copy {
        source: String,
        dest: String,
        team: String,
    },
    /// Entry counts for every race x team pair
    Counts {
        #[arg(long = "race", required = true)]
        races: Vec<String>,

        #[arg(long = "team", required = true)]
        teams: Vec<String>,
    },
}

#[derive(Subcommand)]
enum StartListAction {
    /// Show the current start list
    Show { race: String },
    /// Seed and number the start list
    Generate {
        race: String,

        /// Seed for the new-team draw (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Copy another race's start list
    Copy { source: String, dest: String },
    /// Show excluded bibs
    Exclusions { race: String },
    /// Replace the excluded bib list
    SetExclusions { race: String, bibs: Vec<u32> },
}

#[derive(Subcommand)]
enum ResultsAction {
    /// Show stored results
    Show { race: String },
    /// Score a timing export (JSON array of competitor blocks)
    Submit { race: String, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    slalom_core::telemetry::init_tracing(cli.json_logs, level);

    let store = match cli.db_url.as_deref() {
        Some(url) => SurrealDocumentStore::connect_url(url).await,
        None => SurrealDocumentStore::from_env().await,
    }
    .context("Failed to connect to slalom database")?;

    let slalom = Slalom::new(Arc::new(store), cli.engine.config());
    let output = execute(&slalom, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn load_timing(path: &Path) -> Result<Vec<RawCompetitor>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid timing export {}", path.display()))
}

async fn execute<S: DocumentStore>(slalom: &Slalom<S>, command: Commands) -> Result<Value> {
    match command {
        Commands::Race { action } => cmd_race(slalom, action).await,
        Commands::Team { action } => match action {
            TeamAction::Add {
                id,
                name,
                non_league,
            } => json(
                slalom
                    .directory
                    .register_team(&id, &name, non_league)
                    .await?,
            ),
            TeamAction::List => json(slalom.directory.teams().await?),
        },
        Commands::Racer { action } => match action {
            RacerAction::Add {
                team,
                name,
                gender,
                class,
            } => json(
                slalom
                    .directory
                    .register_racer(&team, &name, gender, class)
                    .await?,
            ),
            RacerAction::List { team } => json(slalom.directory.racers(&team).await?),
        },
        Commands::Roster { action } => cmd_roster(slalom, action).await,
        Commands::StartList { action } => cmd_start_list(slalom, action).await,
        Commands::Results { action } => match action {
            ResultsAction::Show { race } => json(slalom.results.results(&race).await?),
            ResultsAction::Submit { race, file } => {
                let raw = load_timing(&file)?;
                debug!(competitors = raw.len(), file = %file.display(), "timing export loaded");
                json(slalom.results.submit(&race, &raw).await?)
            }
        },
    }
}

async fn cmd_race<S: DocumentStore>(slalom: &Slalom<S>, action: RaceAction) -> Result<Value> {
    let races = &slalom.races;
    match action {
        RaceAction::Create { name, venue, date } => {
            json(races.create(&name, venue.as_deref(), date).await?)
        }
        RaceAction::List => json(races.list().await?),
        RaceAction::Show { race } => json(races.get(&race).await?),
        RaceAction::Lock { race } => json(races.set_locked(&race, true).await?),
        RaceAction::Unlock { race } => json(races.set_locked(&race, false).await?),
        RaceAction::Delete { race } => json(races.delete(&race).await?),
    }
}

async fn cmd_roster<S: DocumentStore>(slalom: &Slalom<S>, action: RosterAction) -> Result<Value> {
    let roster = &slalom.roster;
    match action {
        RosterAction::Show { race, team } => json(roster.roster(&race, &team).await?),
        RosterAction::Add {
            race,
            team,
            racer,
            class,
        } => json(roster.add(&race, &team, &racer, class).await?),
        RosterAction::Reclassify {
            race,
            team,
            racer,
            class,
        } => json(roster.reclassify(&race, &team, &racer, class).await?),
        RosterAction::Remove { race, team, racer } => {
            json(roster.remove(&race, &team, &racer).await?)
        }
        RosterAction::Move {
            race,
            team,
            racer,
            direction,
        } => json(roster.move_entry(&race, &team, &racer, direction).await?),
        RosterAction::Copy { source, dest, team } => {
            json(roster.copy(&source, &dest, &team).await?)
        }
        RosterAction::Counts { races, teams } => json(roster.counts(&races, &teams).await?),
    }
}

async fn cmd_start_list<S: DocumentStore>(
    slalom: &Slalom<S>,
    action: StartListAction,
) -> Result<Value> {
    let start_list = &slalom.start_list;
    match action {
        StartListAction::Show { race } => json(start_list.start_list(&race).await?),
        StartListAction::Generate { race, seed } => match seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                json(start_list.generate_with_rng(&race, &mut rng).await?)
            }
            None => json(start_list.generate(&race).await?),
        },
        StartListAction::Copy { source, dest } => json(start_list.copy(&source, &dest).await?),
        StartListAction::Exclusions { race } => json(start_list.exclusions(&race).await?),
        StartListAction::SetExclusions { race, bibs } => {
            json(start_list.set_exclusions(&race, bibs).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slalom_state::fakes::MemoryDocumentStore;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("slalom").chain(args.iter().copied())).unwrap()
    }

    async fn run(slalom: &Slalom<MemoryDocumentStore>, args: &[&str]) -> Result<Value> {
        execute(slalom, parse(args).command).await
    }

    fn engine() -> Slalom<MemoryDocumentStore> {
        Slalom::new(Arc::new(MemoryDocumentStore::new()), EngineConfig::default())
    }

    #[test]
    fn engine_flags_override_defaults() {
        let cli = parse(&[
            "--time-unit",
            "ms",
            "--male-first-bib",
            "200",
            "race",
            "list",
        ]);
        let config = cli.engine.config();
        assert_eq!(config.time_unit, TimeUnit::Milliseconds);
        assert_eq!(config.bibs.male_first, 200);
        assert_eq!(config.bibs.female_first, 1);
    }

    #[test]
    fn loose_class_and_direction_values_parse() {
        let cli = parse(&["roster", "move", "r1", "north", "racer-1", "up"]);
        assert!(matches!(
            cli.command,
            Commands::Roster {
                action: RosterAction::Move {
                    direction: Direction::Up,
                    ..
                }
            }
        ));
        let cli = parse(&["racer", "add", "north", "Jo", "-g", "f", "-c", "JV"]);
        assert!(matches!(
            cli.command,
            Commands::Racer {
                action: RacerAction::Add {
                    gender: Gender::Female,
                    class: RacerClass::JrVarsity,
                    ..
                }
            }
        ));
        let sideways = ["slalom", "roster", "move", "r", "t", "x", "sideways"];
        assert!(Cli::try_parse_from(sideways).is_err());
    }

    #[tokio::test]
    async fn commands_drive_the_engine() {
        let slalom = engine();
        run(&slalom, &["team", "add", "north", "North"]).await.unwrap();
        let racer = run(&slalom, &["racer", "add", "north", "Jo", "-g", "f", "-c", "v"])
            .await
            .unwrap();
        let racer_id = racer["id"].as_str().unwrap().to_string();
        let race = run(&slalom, &["race", "create", "Opener", "--date", "2025-01-11"])
            .await
            .unwrap();
        let race_id = race["id"].as_str().unwrap().to_string();
        assert_eq!(race["date"], "2025-01-11");

        let roster = run(&slalom, &["roster", "add", &race_id, "north", &racer_id])
            .await
            .unwrap();
        assert_eq!(roster[0]["start_order"], 1);

        let list = run(&slalom, &["start-list", "generate", &race_id, "--seed", "5"])
            .await
            .unwrap();
        assert_eq!(list["entries"][0]["bib"], 1);

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[{"bib": 1, "name": "Jo", "team": "North", "class": "V",
                 "run1": {"status": 1, "start": 1000000, "finish": 61000000},
                 "run2": {"status": 1, "start": 1000000, "finish": 62000000}}]"#,
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();
        let results = run(&slalom, &["results", "submit", &race_id, &path])
            .await
            .unwrap();
        assert_eq!(results["entries"][0]["total_points"], 200);
        assert_eq!(results["entries"][0]["run1"]["time"], 60.0);

        run(&slalom, &["race", "lock", &race_id]).await.unwrap();
        let err = run(&slalom, &["roster", "remove", &race_id, "north", &racer_id])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn bad_timing_file_reports_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        let err = load_timing(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid timing export"));
    }
}
