use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use flappy_coach::benchmark::{resolve_bots, run_benchmark, BenchmarkConfig};
use flappy_coach::bots::{bot_ids, create_bot, describe_bots};
use flappy_coach::config::{load_game_config, HostSettings};
use flappy_coach::runner::{run_session, RunOptions};
use flappy_coach::store::JsonFileStore;
use flappy_coach::util::{parse_seed, parse_seed_csv, seed_range, seed_to_hex};
use flappy_coach_core::{GameConfig, HighScoreStore, MemoryStore};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "flappy-coach")]
#[command(about = "Headless flappy-bird rounds with a coach that steps in between losses")]
struct Cli {
    /// JSON game config; omitted fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available bots
    ListBots,
    /// Print the default game config as JSON
    DefaultConfig {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print or reset the stored high score
    HighScore {
        #[arg(long, default_value_t = false)]
        reset: bool,
    },
    /// Play rounds with an autopilot bot and report what happened
    Simulate {
        #[arg(long)]
        bot: String,
        #[arg(long, default_value = "0x00000001")]
        seed: String,
        #[arg(long, default_value_t = 10)]
        rounds: u32,
        /// Keep the high score in memory only
        #[arg(long, default_value_t = false)]
        no_persist: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run many seeds across one or more bots in parallel
    Benchmark {
        #[arg(long)]
        bots: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 10)]
        rounds: u32,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Cli { config, command } = Cli::parse();
    let settings = HostSettings::from_env();

    match command {
        Commands::ListBots => {
            for (id, description) in describe_bots() {
                println!("{id:16} {description}");
            }
        }
        Commands::DefaultConfig { output } => {
            emit_json(&GameConfig::default(), output.as_deref())?;
        }
        Commands::HighScore { reset } => {
            let mut store = JsonFileStore::new(&settings.store_path);
            if reset {
                store
                    .clear()
                    .with_context(|| format!("failed resetting {}", store.path().display()))?;
                println!("high_score=0");
            } else {
                let score = store
                    .load_high_score()
                    .with_context(|| format!("failed reading {}", store.path().display()))?;
                println!("high_score={score}");
            }
            println!("store={}", store.path().display());
        }
        Commands::Simulate {
            bot,
            seed,
            rounds,
            no_persist,
            output,
        } => {
            let game = load_game_config(config.as_deref())?;
            let mut autopilot = create_bot(&bot, &game).ok_or_else(|| {
                let available = bot_ids().join(", ");
                anyhow!("unknown bot '{bot}'. available: {available}")
            })?;
            let seed = parse_seed(&seed)?;
            let store: Box<dyn HighScoreStore> = if no_persist {
                Box::new(MemoryStore::default())
            } else {
                Box::new(JsonFileStore::new(&settings.store_path))
            };

            tracing::info!(
                "simulating: bot={} seed={} rounds={} tick_hz={} max_ticks={}",
                bot,
                seed_to_hex(seed),
                rounds,
                settings.tick_hz,
                settings.max_ticks
            );
            let options = RunOptions {
                seed,
                rounds,
                max_ticks: settings.max_ticks,
                tick_hz: settings.tick_hz,
            };
            let report = run_session(autopilot.as_mut(), game, store, &options)?;

            println!("bot={}", report.bot_id);
            println!("seed={}", report.seed_hex);
            println!("ticks={}", report.ticks);
            println!("rounds={}", report.rounds.len());
            println!("best_round={}", report.best_round_score());
            println!("high_score={}", report.stats.high_score);
            println!("interventions={}", report.interventions);
            if let Some(path) = output {
                emit_json(&report, Some(&path))?;
            }
        }
        Commands::Benchmark {
            bots,
            seeds,
            seed_start,
            seed_count,
            rounds,
            jobs,
            output,
        } => {
            let game = load_game_config(config.as_deref())?;
            let seeds = match (seeds, seed_start) {
                (Some(csv), _) => parse_seed_csv(&csv)?,
                (None, Some(start)) => seed_range(parse_seed(&start)?, seed_count),
                (None, None) => seed_range(1, seed_count),
            };
            let bench = BenchmarkConfig {
                bots: resolve_bots(bots.as_deref())?,
                seeds,
                rounds,
                max_ticks: settings.max_ticks,
                tick_hz: settings.tick_hz,
                jobs,
            };
            let report = run_benchmark(&game, &bench)?;

            for (rank, entry) in report.bot_rankings.iter().enumerate() {
                println!(
                    "{:>2}. {:16} avg_score={:.2} max_score={} avg_round_s={:.1} avg_interventions={:.2}",
                    rank + 1,
                    entry.bot_id,
                    entry.avg_score,
                    entry.max_score,
                    entry.avg_round_seconds,
                    entry.avg_interventions
                );
            }
            if let Some(path) = output {
                emit_json(&report, Some(&path))?;
            }
        }
    }

    Ok(())
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let encoded = serde_json::to_vec_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed creating directory {}", parent.display()))?;
            }
            fs::write(path, encoded)
                .with_context(|| format!("failed writing {}", path.display()))?;
            println!("wrote={}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(&encoded)),
    }
    Ok(())
}
