mod reports;
mod runner;
mod scenario;
mod screens;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use petcare_game::{
    BACKGROUNDS, CLOTHING_ITEMS, ClothingSlot, FOODS, FileStorage, Gender, PLAY_ACTIVITIES,
    PetColor, PetKind, PetStore, StoreConfig, find_activity, find_food,
};
use runner::{ScenarioResult, ScenarioRunner};
use scenario::{get_scenario, list_scenarios};
use screens::ScreenOutcome;
use util::{parse_seeds, split_csv, stat_bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "petcare-tester", version)]
#[command(about = "Drive the pet store and run QA scenarios against it")]
struct Args {
    /// Directory holding the persisted pet record
    #[arg(long, global = true, default_value = ".petcare")]
    data_dir: PathBuf,

    /// Optional JSON store config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the current pet
    Status,
    /// Create a pet, replacing any existing one
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_kind)]
        kind: PetKind,
        #[arg(long, value_parser = parse_gender, default_value = "other")]
        gender: Gender,
        #[arg(long, value_parser = parse_color, default_value = "base")]
        color: PetColor,
    },
    /// Feed the pet a catalog food
    Feed {
        #[arg(long, default_value = "kibble")]
        food: String,
    },
    /// Play with the pet
    Play {
        #[arg(long, default_value = "yarn_ball")]
        activity: String,
    },
    /// Give the pet a bath; fewer scrubs than a full bath pays no reward
    Bathe {
        #[arg(long, default_value_t = screens::BATH_SCRUBS)]
        scrubs: u8,
    },
    /// Put an item on a slot, or clear the slot when no item is given
    Wear {
        #[arg(value_parser = parse_slot)]
        slot: ClothingSlot,
        item: Option<String>,
    },
    /// Pick a background, or clear it when no id is given
    Background { id: Option<String> },
    /// Add coins to the pet's wallet
    Earn { amount: u64 },
    /// Delete the pet
    Remove,
    /// List foods, activities, clothing and backgrounds
    Catalog,
    /// Run QA scenarios against in-memory stores
    Scenarios(ScenarioArgs),
}

#[derive(Debug, ClapArgs)]
struct ScenarioArgs {
    /// List all available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    only: String,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per scenario and seed
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_key<T: Copy>(all: &[T], key: fn(T) -> &'static str, raw: &str) -> Result<T, String> {
    if let Some(found) = all.iter().copied().find(|v| key(*v) == raw) {
        return Ok(found);
    }
    let options: Vec<_> = all.iter().map(|v| key(*v)).collect();
    Err(format!("expected one of: {}", options.join(", ")))
}

fn parse_kind(raw: &str) -> Result<PetKind, String> {
    parse_key(&PetKind::ALL, PetKind::key, raw)
}

fn parse_gender(raw: &str) -> Result<Gender, String> {
    parse_key(&Gender::ALL, Gender::key, raw)
}

fn parse_color(raw: &str) -> Result<PetColor, String> {
    parse_key(&PetColor::ALL, PetColor::key, raw)
}

fn parse_slot(raw: &str) -> Result<ClothingSlot, String> {
    parse_key(&ClothingSlot::ALL, ClothingSlot::key, raw)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Command::Scenarios(scenario_args) = &args.command {
        if maybe_list_scenarios(scenario_args)? {
            return Ok(());
        }
        announce_banner();
        let results = run_scenarios(scenario_args, args.verbose).await?;
        if results.iter().any(|r| !r.passed) {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut out = stdout();
    run_command(&args, &mut out).await
}

fn announce_banner() {
    println!("{}", "🐾 Petcare Scenario Runner".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn load_config(path: Option<&PathBuf>) -> Result<StoreConfig> {
    let Some(path) = path else {
        return Ok(StoreConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    StoreConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn ensure_written(outcome: ScreenOutcome) -> Result<ScreenOutcome> {
    if outcome.failed_writes > 0 {
        bail!(
            "{} write(s) did not reach storage; see the log for details",
            outcome.failed_writes
        );
    }
    Ok(outcome)
}

async fn run_command(args: &Args, out: &mut dyn Write) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let store = PetStore::open(FileStorage::new(&args.data_dir), config).await?;
    let result = dispatch(&args.command, &store, out).await;
    store.shutdown().await;
    result
}

async fn dispatch(
    command: &Command,
    store: &PetStore<FileStorage>,
    out: &mut dyn Write,
) -> Result<()> {
    let outcome = match command {
        Command::Status => return write_status(store, out),
        Command::Catalog => return write_catalog(out),
        Command::Scenarios(_) => bail!("scenarios do not use the data directory"),
        Command::Create {
            name,
            kind,
            gender,
            color,
        } => {
            let spec = screens::validate_new_pet(name, *kind, *gender, *color)?;
            ensure_written(screens::create(store, spec).await)?
        }
        Command::Feed { food } => {
            let food = find_food(food).with_context(|| format!("unknown food {food}"))?;
            ensure_written(screens::feed(store, food).await)?
        }
        Command::Play { activity } => {
            let activity = find_activity(activity)
                .with_context(|| format!("unknown activity {activity}"))?;
            ensure_written(screens::play(store, activity).await)?
        }
        Command::Bathe { scrubs } => ensure_written(screens::bath(store, *scrubs).await)?,
        Command::Wear { slot, item } => {
            ensure_written(screens::wear(store, *slot, item.as_deref()).await?)?
        }
        Command::Background { id } => {
            ensure_written(screens::background(store, id.as_deref()).await?)?
        }
        Command::Earn { amount } => {
            let ticket = store.earn_money(*amount);
            let applied = !ticket.is_noop();
            ticket.persisted().await?;
            ScreenOutcome {
                applied,
                coins: if applied { *amount } else { 0 },
                failed_writes: 0,
            }
        }
        Command::Remove => {
            let ticket = store.remove_pet();
            let applied = !ticket.is_noop();
            ticket.persisted().await?;
            if applied {
                writeln!(out, "👋 Pet removed")?;
            } else {
                writeln!(out, "No pet to remove")?;
            }
            return Ok(());
        }
    };

    if !outcome.applied {
        writeln!(out, "No pet yet. Create one with `petcare-tester create`.")?;
        return Ok(());
    }
    if outcome.coins > 0 {
        writeln!(out, "🪙 +{} coins", outcome.coins)?;
    }
    write_status(store, out)
}

fn write_status(store: &PetStore<FileStorage>, out: &mut dyn Write) -> Result<()> {
    let (Some(pet), Some(age)) = (store.pet(), store.age()) else {
        writeln!(out, "No pet yet. Create one with `petcare-tester create`.")?;
        return Ok(());
    };
    writeln!(
        out,
        "{} the {} {} ({}), age {age}",
        pet.name.bold(),
        pet.color.key(),
        pet.kind.key(),
        pet.gender.key()
    )?;
    let (hunger, hygiene) = (pet.hunger, pet.hygiene);
    writeln!(out, "  Hunger  {} {hunger:>3}", stat_bar(hunger))?;
    writeln!(out, "  Hygiene {} {hygiene:>3}", stat_bar(hygiene))?;
    writeln!(out, "  Coins   {}", pet.money)?;
    for (slot, item) in pet.clothes.iter() {
        writeln!(out, "  {:<7} {}", slot.key(), item.unwrap_or("-"))?;
    }
    writeln!(
        out,
        "  Scene   {}",
        pet.background.as_deref().unwrap_or("plain")
    )?;
    Ok(())
}

fn write_catalog(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Foods:")?;
    for food in FOODS {
        writeln!(
            out,
            "  {:12} {:16} +{} hunger",
            food.id, food.name, food.value
        )?;
    }
    writeln!(out, "Activities:")?;
    for activity in PLAY_ACTIVITIES {
        writeln!(out, "  {:12} {}", activity.id, activity.name)?;
    }
    writeln!(out, "Clothing:")?;
    for item in CLOTHING_ITEMS {
        let slot = item.slot.key();
        writeln!(out, "  {:12} {:16} {slot}", item.id, item.name)?;
    }
    writeln!(out, "Backgrounds:")?;
    for background in BACKGROUNDS {
        writeln!(out, "  {:12} {}", background.id, background.name)?;
    }
    Ok(())
}

fn maybe_list_scenarios(args: &ScenarioArgs) -> Result<bool> {
    if !args.list {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

async fn run_scenarios(args: &ScenarioArgs, verbose: bool) -> Result<Vec<ScenarioResult>> {
    let start_time = Instant::now();
    let seeds = parse_seeds(&args.seeds)?;
    let runner = ScenarioRunner::new(verbose);

    let mut results = Vec::new();
    for name in expand_scenarios(&args.only) {
        if let Some(scenario) = get_scenario(&name) {
            results.extend(
                runner
                    .run_scenario(scenario.as_ref(), &seeds, args.iterations)
                    .await,
            );
        } else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
        }
    }

    write_report(args, &results, start_time)?;
    Ok(results)
}

fn write_report(
    args: &ScenarioArgs,
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, results)?,
        ReportFormat::Markdown => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Petcare Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            let elapsed = start_time.elapsed();
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {elapsed:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
