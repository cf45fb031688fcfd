//! Headless idle battler.
//!
//! Usage:
//!   idlebattle [OPTIONS]
//!
//! Examples:
//!   idlebattle                       # Fight for 30 seconds at 1 tick/s
//!   idlebattle --fast --seconds 5    # 10 ms ticks
//!   idlebattle --seed 42             # Reproducible combat rolls

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use idlebattle::core::constants::FAST_TICK_INTERVAL_MS;
use idlebattle::core::{GameConfig, GameSnapshot, LogKind, Result, UserId};
use idlebattle::service::{Action, GameService, StaticTokens};
use idlebattle::session::BattleState;
use idlebattle::storage::FileStore;
use idlebattle::utils::{init_logging, version_line, DEFAULT_FILTER};
use tracing::info;

const LOCAL_TOKEN: &str = "local";
const LOCAL_USER: &str = "local-player";

#[derive(Debug, Default)]
struct CliArgs {
    seconds: u64,
    seed: Option<u64>,
    data_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    fast: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args);
    init_logging(DEFAULT_FILTER);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CliArgs) -> Result<()> {
    println!("{}", version_line());

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => FileStore::default_dir()?,
    };
    let config_path = cli
        .config
        .unwrap_or_else(|| data_dir.join("config.json"));

    let mut config = GameConfig::load(&config_path)?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.fast {
        config.session.tick_interval_ms = FAST_TICK_INTERVAL_MS;
    }
    let tick = config.session.tick_interval();

    let store = Arc::new(FileStore::new(&data_dir)?);
    let auth = Arc::new(StaticTokens::new());
    auth.insert(LOCAL_TOKEN, UserId::new(LOCAL_USER));
    let service = GameService::new(store, auth, config)?;
    info!(dir = %data_dir.display(), "using data directory");

    let snapshot = service.open_session(LOCAL_TOKEN).await?;
    let mut cursor = 0;
    print_new_entries(&service, &mut cursor).await?;
    println!(
        "Level {} | {} gold | {}/{} HP",
        snapshot.progression.level,
        snapshot.progression.gold,
        snapshot.progression.stats.health,
        snapshot.progression.stats.max_health
    );

    service.apply_action(LOCAL_TOKEN, Action::StartBattle).await?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.seconds);
    let poll = tick.max(Duration::from_millis(50));
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(poll).await;
        print_new_entries(&service, &mut cursor).await?;

        let state = service.get_state(LOCAL_TOKEN).await?;
        if state.state == BattleState::Idle {
            service.apply_action(LOCAL_TOKEN, Action::StartBattle).await?;
        }
    }

    service.apply_action(LOCAL_TOKEN, Action::StopBattle).await?;
    print_new_entries(&service, &mut cursor).await?;
    print_summary(&service.get_state(LOCAL_TOKEN).await?);

    service.close_session(LOCAL_TOKEN).await?;

    println!();
    println!("Leaderboard:");
    for (rank, entry) in service.leaderboard(10).await?.iter().enumerate() {
        println!(
            "  {:>2}. {:<20} Lv.{:<4} {:>6} exp {:>8} gold",
            rank + 1,
            entry.user_id,
            entry.level,
            entry.exp,
            entry.gold
        );
    }
    Ok(())
}

async fn print_new_entries(service: &GameService, cursor: &mut u64) -> Result<()> {
    for entry in service.log_since(LOCAL_TOKEN, *cursor).await? {
        let tag = match entry.kind {
            LogKind::Critical => "!!",
            LogKind::LevelUp => "**",
            LogKind::Loot => "$$",
            LogKind::Skill => "~~",
            _ => "  ",
        };
        println!(
            "[{}] {} {}",
            entry.timestamp.format("%H:%M:%S"),
            tag,
            entry.message
        );
        *cursor = entry.seq;
    }
    Ok(())
}

fn print_summary(snapshot: &GameSnapshot) {
    let p = &snapshot.progression;
    println!();
    println!("═══════════════════════════════════════");
    println!("  Level:     {}", p.level);
    println!("  Exp:       {}/{}", p.exp, p.exp_to_next_level);
    println!("  Gold:      {}", p.gold);
    println!(
        "  Health:    {}/{} ({:.0}%)",
        p.stats.health,
        p.stats.max_health,
        p.stats.health_fraction() * 100.0
    );
    println!("  Attack:    {}", p.stats.attack);
    println!("  Defense:   {}", p.stats.defense);
    if !p.inventory.is_empty() {
        println!("  Inventory:");
        for item in p.inventory.items() {
            println!("    {} x{}", item.name, item.quantity);
        }
    }
    println!("  Battles:   {}", p.history.len());
    println!("═══════════════════════════════════════");
}

fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs {
        seconds: 30,
        ..CliArgs::default()
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--seconds" => {
                if i + 1 < args.len() {
                    cli.seconds = args[i + 1].parse().unwrap_or(30);
                    i += 1;
                }
            }
            "-s" | "--seed" => {
                if i + 1 < args.len() {
                    cli.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "-d" | "--data-dir" => {
                if i + 1 < args.len() {
                    cli.data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    cli.config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "-f" | "--fast" => {
                cli.fast = true;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    cli
}

fn print_help() {
    println!("Idle battler");
    println!();
    println!("USAGE:");
    println!("    idlebattle [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -n, --seconds <N>     How long to fight (default: 30)");
    println!("    -s, --seed <N>        Random seed for reproducible combat");
    println!("    -d, --data-dir <DIR>  Save directory (default: ~/.idlebattle)");
    println!("    -c, --config <FILE>   JSON config (default: <data-dir>/config.json)");
    println!("    -f, --fast            10 ms ticks");
    println!("    -h, --help            Show this help");
}
