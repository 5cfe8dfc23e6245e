use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use time::Date;

use nutrilog::{
    clock::{date_key, parse_date_key, Clock, FixedClock, SystemClock},
    config::AppConfig,
    confirm::{AlwaysConfirm, Confirm},
    entries::{
        auto_fill, clear_all_data, day_totals, delete_food_entry, delete_water_entry, load_day,
        log_food, log_quick_add, log_water, suggest, FoodForm, LoggedFood,
    },
    goals::{load_goals, update_goals, GoalsUpdate},
    presets::{
        active_quick_adds, add_container, add_quick_add, container_presets, remove_container,
        remove_quick_add, seed_defaults, set_defaults_active, ContainerForm,
    },
    state::AppState,
    stats::{
        calorie_ring, current_streak, daily_comparison, day_health_score, favourite_foods,
        favourite_stores, goal_progress, water_week, water_year, weekly_calorie_series,
        weekly_scores, weekly_summary, FAVOURITES_WINDOW_DAYS,
    },
    storage::StorageMode,
};

#[derive(Parser)]
#[command(
    name = "nutrilog",
    about = "Food and water tracker",
    long_about = "Logs food and water, manages quick-add presets and goals, and reports daily and weekly statistics."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Storage backend override (api, local, fallback)
    #[arg(long, global = true)]
    mode: Option<StorageMode>,

    /// Local store file override
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Day to work on (YYYY-MM-DD), defaults to today
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<Date>,
}

fn parse_date(raw: &str) -> Result<Date, String> {
    parse_date_key(raw).ok_or_else(|| format!("expected YYYY-MM-DD, got '{raw}'"))
}

#[derive(Subcommand)]
enum Command {
    /// Food entries
    Food {
        #[command(subcommand)]
        action: FoodCommand,
    },
    /// Water entries
    Water {
        #[command(subcommand)]
        action: WaterCommand,
    },
    /// Quick-add presets
    Quick {
        #[command(subcommand)]
        action: QuickCommand,
    },
    /// Water container presets
    Containers {
        #[command(subcommand)]
        action: ContainerCommand,
    },
    /// Daily goals
    Goals {
        #[command(subcommand)]
        action: GoalsCommand,
    },
    /// Totals and entries for the day
    Day,
    /// Seven-day scores and summaries
    Week,
    /// Current logging streak
    Streak,
    /// Favourite foods and stores, and monthly water intake for the year
    Favourites {
        /// How many foods and stores to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Autocomplete food or store names
    Suggest {
        kind: SuggestKind,
        query: String,
    },
    /// Write all data to a JSON file
    Export { file: PathBuf },
    /// Replace data with the contents of a JSON export
    Import { file: PathBuf },
    /// Delete all data
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct FoodArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    calories: String,
    /// 1 = unhealthy, 2 = neutral, 3 = healthy
    #[arg(long)]
    rating: String,
    /// breakfast, lunch, dinner or snack
    #[arg(long)]
    meal: String,
    #[arg(long, default_value = "")]
    protein: String,
    #[arg(long, default_value = "")]
    carbs: String,
    #[arg(long, default_value = "")]
    fat: String,
    /// Store where the food was purchased
    #[arg(long)]
    store: Option<String>,
    #[arg(long, default_value = "")]
    notes: String,
}

impl From<FoodArgs> for FoodForm {
    fn from(a: FoodArgs) -> Self {
        FoodForm {
            food_name: a.name,
            calories: a.calories,
            purchased: a.store.is_some(),
            store: a.store.unwrap_or_default(),
            health_rating: Some(a.rating),
            meal_type: Some(a.meal),
            notes: a.notes,
            protein: a.protein,
            carbs: a.carbs,
            fat: a.fat,
        }
    }
}

#[derive(Subcommand)]
enum FoodCommand {
    Add(FoodArgs),
    List,
    Rm {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Show the last entry logged under this name
    Fill { name: String },
}

#[derive(Subcommand)]
enum WaterCommand {
    /// Log millilitres, or the volume of a container preset
    Add {
        ml: Option<String>,
        #[arg(long, conflicts_with = "ml")]
        container: Option<String>,
    },
    List,
    Rm {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum QuickCommand {
    List,
    Log { id: String },
    Add(FoodArgs),
    Rm { id: String },
    /// Show or hide all default presets
    Defaults { state: Toggle },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
enum ContainerCommand {
    List,
    Add {
        label: String,
        ml: String,
        #[arg(long)]
        icon: Option<String>,
    },
    Rm { id: String },
}

#[derive(Subcommand)]
enum GoalsCommand {
    Show,
    Set {
        #[arg(long)]
        calories: Option<i64>,
        #[arg(long)]
        protein: Option<i64>,
        #[arg(long)]
        carbs: Option<i64>,
        #[arg(long)]
        fat: Option<i64>,
        #[arg(long)]
        water: Option<i64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SuggestKind {
    Food,
    Store,
}

/// Asks on the terminal.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(StdinConfirm)
    }
}

fn print_logged(logged: Option<LoggedFood>) -> anyhow::Result<()> {
    let Some(logged) = logged else {
        bail!("could not save the entry");
    };
    println!(
        "logged {} ({} kcal) id={}",
        logged.entry.food_name, logged.entry.calories, logged.entry.id
    );
    println!("streak: {} day(s)", logged.streak);
    if logged.celebrate {
        println!("Calorie goal reached for today!");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "nutrilog=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(mode) = cli.mode {
        config.storage_mode = mode;
    }
    if let Some(store) = cli.store {
        config.local_store_path = store;
    }
    tracing::debug!(mode = %config.storage_mode, "starting");

    let clock: Arc<dyn Clock> = match cli.date {
        Some(date) => Arc::new(FixedClock::at_date(date)),
        None => Arc::new(SystemClock),
    };
    let st = AppState::from_config(config, clock)?;
    seed_defaults(&st).await;
    let date = st.clock.today();

    match cli.command {
        Command::Food { action } => match action {
            FoodCommand::Add(args) => print_logged(log_food(&st, args.into(), date).await?)?,
            FoodCommand::List => {
                for e in st.storage.food_entries(date).await {
                    println!(
                        "{}  {:<9} {:<24} {:>5} kcal  P{} C{} F{}  {}",
                        e.id,
                        e.meal_type,
                        e.food_name,
                        e.calories,
                        e.protein,
                        e.carbs,
                        e.fat,
                        e.health_rating.label()
                    );
                }
            }
            FoodCommand::Rm { id, yes } => {
                if !delete_food_entry(&st, &id, confirmer(yes).as_ref()).await {
                    bail!("entry was not deleted");
                }
            }
            FoodCommand::Fill { name } => match auto_fill(&st, &name).await {
                Some(e) => println!(
                    "{}: {} kcal, P{} C{} F{}, {}, {}",
                    e.food_name,
                    e.calories,
                    e.protein,
                    e.carbs,
                    e.fat,
                    e.health_rating.label(),
                    e.meal_type
                ),
                None => println!("no recent entry named '{name}'"),
            },
        },

        Command::Water { action } => match action {
            WaterCommand::Add { ml, container } => {
                let amount = match (ml, container) {
                    (Some(ml), _) => ml,
                    (None, Some(id)) => container_presets(&st)
                        .await
                        .into_iter()
                        .find(|c| c.id == id)
                        .map(|c| c.amount.to_string())
                        .with_context(|| format!("no active container '{id}'"))?,
                    (None, None) => bail!("give an amount in ml or --container"),
                };
                let Some(entry) = log_water(&st, &amount, date).await? else {
                    bail!("could not save the water entry");
                };
                println!("logged {} ml id={}", entry.amount, entry.id);
            }
            WaterCommand::List => {
                for w in st.storage.water_entries(date).await {
                    println!("{}  {:>5} ml  {}", w.id, w.amount, w.timestamp);
                }
            }
            WaterCommand::Rm { id, yes } => {
                if !delete_water_entry(&st, &id, confirmer(yes).as_ref()).await {
                    bail!("water entry was not deleted");
                }
            }
        },

        Command::Quick { action } => match action {
            QuickCommand::List => {
                for q in active_quick_adds(&st).await {
                    let kind = if q.is_default { "default" } else { "custom" };
                    println!(
                        "{}  {:<20} {:>5} kcal  {:<9} {}",
                        q.id, q.food_name, q.calories, q.meal_type, kind
                    );
                }
            }
            QuickCommand::Log { id } => print_logged(log_quick_add(&st, &id, date).await?)?,
            QuickCommand::Add(args) => match add_quick_add(&st, args.into()).await? {
                Some(item) => println!("added quick-add {} id={}", item.food_name, item.id),
                None => bail!("could not save the quick-add item"),
            },
            QuickCommand::Rm { id } => {
                if !remove_quick_add(&st, &id).await {
                    bail!("quick-add item was not removed");
                }
            }
            QuickCommand::Defaults { state } => {
                set_defaults_active(&st, matches!(state, Toggle::On)).await;
            }
        },

        Command::Containers { action } => match action {
            ContainerCommand::List => {
                for c in container_presets(&st).await {
                    println!("{}  {:<16} {:>5} ml  {}", c.id, c.label, c.amount, c.icon);
                }
            }
            ContainerCommand::Add { label, ml, icon } => {
                let form = ContainerForm {
                    label,
                    amount: ml,
                    icon,
                };
                match add_container(&st, form).await? {
                    Some(c) => println!("added container {} id={}", c.label, c.id),
                    None => bail!("could not save the container"),
                }
            }
            ContainerCommand::Rm { id } => {
                if !remove_container(&st, &id).await {
                    bail!("container was not removed");
                }
            }
        },

        Command::Goals { action } => {
            let goals = match action {
                GoalsCommand::Show => load_goals(&st).await,
                GoalsCommand::Set {
                    calories,
                    protein,
                    carbs,
                    fat,
                    water,
                } => {
                    let update = GoalsUpdate {
                        calorie_goal: calories,
                        protein_goal: protein,
                        carbs_goal: carbs,
                        fat_goal: fat,
                        water_goal: water,
                    };
                    update_goals(&st, update)
                        .await?
                        .context("could not save goals")?
                }
            };
            println!("{}", serde_json::to_string_pretty(&goals)?);
        }

        Command::Day => {
            let goals = load_goals(&st).await;
            let day = load_day(&st, date).await;
            let totals = day_totals(&day.entries, &day.water);
            let ring = calorie_ring(totals.calories, goals.calorie_goal);
            let cmp = daily_comparison(&st, date).await;

            println!("{}", date_key(date));
            println!(
                "calories {} / {} ({:.0}%), {} remaining, {:+}% vs yesterday",
                ring.consumed, goals.calorie_goal, ring.percent, ring.remaining, cmp.calorie_change
            );
            for (name, value, goal) in [
                ("protein", totals.nutrition.protein, goals.protein_goal),
                ("carbs", totals.nutrition.carbs, goals.carbs_goal),
                ("fat", totals.nutrition.fat, goals.fat_goal),
            ] {
                println!("{name:<8} {value}g / {goal}g ({:.0}%)", goal_progress(value, goal));
            }
            println!(
                "water    {} / {} ml ({:.0}%), {:+}% vs yesterday",
                totals.water,
                goals.water_goal,
                goal_progress(totals.water, goals.water_goal),
                cmp.water_change
            );
            println!(
                "entries {}, health score {}/10",
                totals.entries,
                day_health_score(&day.entries)
            );
            println!("streak {}", current_streak(&st).await);
        }

        Command::Week => {
            let days = st.storage.weekly_data(7).await;
            let scores = weekly_scores(&st).await;
            let summary = weekly_summary(&days);
            let water = water_week(&st, date).await;

            for point in weekly_calorie_series(&days) {
                println!("{} {} {:>5} kcal", point.label, date_key(point.date), point.value);
            }
            println!(
                "avg {} kcal over {} logged day(s), {}% healthy",
                summary.avg_calories, summary.logged_days, summary.healthy_percent
            );
            if let Some(best) = &summary.best_healthy {
                println!("best healthy entry: {} ({} kcal)", best.food_name, best.calories);
            }
            println!(
                "scores: calories {:.1}, health {:.1}, protein {:.1}, meals {:.1}, water {:.1}",
                scores.calorie_score,
                scores.health_score,
                scores.protein_score,
                scores.meal_score,
                scores.water_score
            );
            println!(
                "water: {} ml total, {} ml/day, {}/7 at goal, streak {}, {:+}% vs last week",
                water.total, water.daily_average, water.days_at_goal, water.streak, water.change_percent
            );
            for d in &water.days {
                println!("  {} {:>5} ml  {}", date_key(d.date), d.amount, d.status.label());
            }
        }

        Command::Streak => println!("{}", current_streak(&st).await),

        Command::Favourites { top } => {
            println!("foods (last {FAVOURITES_WINDOW_DAYS} days):");
            for f in favourite_foods(&st, top).await {
                println!(
                    "  {} {:<24} x{:<3} {}-{} kcal",
                    f.rank, f.name, f.frequency, f.min_calories, f.max_calories
                );
            }
            println!("stores:");
            for s in favourite_stores(&st, top).await {
                println!("  {:<24} {:>3} visit(s) {:>3}%", s.name, s.visits, s.popularity);
            }
            let year = water_year(&st).await;
            println!("water by month:");
            for m in &year.months {
                println!("  {} {:<9} {:>7} ml", m.year, m.label, m.intake);
            }
            println!("  total {} ml", year.total);
        }

        Command::Suggest { kind, query } => {
            let names = match kind {
                SuggestKind::Food => st.storage.food_database().await,
                SuggestKind::Store => st.storage.store_database().await,
            };
            for name in suggest(&names, &query) {
                println!("{name}");
            }
        }

        Command::Export { file } => {
            let data = st.storage.export_data().await.context("export failed")?;
            std::fs::write(&file, serde_json::to_vec_pretty(&data)?)
                .with_context(|| format!("writing {}", file.display()))?;
            tracing::info!(file = %file.display(), "exported");
        }

        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let data: serde_json::Value =
                serde_json::from_str(&raw).context("import file is not valid JSON")?;
            if !st.storage.import_data(&data).await {
                bail!("import failed");
            }
            tracing::info!(file = %file.display(), "imported");
        }

        Command::Clear { yes } => {
            if !clear_all_data(&st, confirmer(yes).as_ref()).await {
                bail!("data was not cleared");
            }
        }
    }

    Ok(())
}
