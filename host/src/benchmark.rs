use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use flappy_coach_core::{GameConfig, MemoryStore};
use rayon::prelude::*;
use serde::Serialize;

use crate::bots::{bot_ids, create_bot};
use crate::runner::{run_session, RunOptions};
use crate::util::seed_to_hex;

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub rounds: u32,
    pub max_ticks: u64,
    pub tick_hz: u32,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub bot_id: String,
    pub seed: u32,
    pub seed_hex: String,
    pub ticks: u64,
    pub rounds: usize,
    pub truncated: bool,
    pub best_score: u32,
    pub avg_score: f64,
    pub interventions: u32,
    pub time_played: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BotAggregate {
    pub bot_id: String,
    pub runs: usize,
    pub avg_score: f64,
    pub max_score: u32,
    pub avg_round_seconds: f64,
    pub avg_interventions: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkReport {
    pub rounds_per_run: u32,
    pub max_ticks: u64,
    pub tick_hz: u32,
    pub jobs: Option<usize>,
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub bot_rankings: Vec<BotAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_bots(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(bot_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let bots: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if bots.is_empty() {
                return Err(anyhow!("--bots resolved to empty list"));
            }
            Ok(bots)
        }
    }
}

/// Runs every bot against every seed, each on a fresh in-memory store so
/// runs never see each other's high scores.
pub fn run_benchmark(game: &GameConfig, config: &BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.bots.is_empty() {
        return Err(anyhow!("benchmark requires at least one bot"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    for bot in &config.bots {
        if create_bot(bot, game).is_none() {
            return Err(anyhow!("unknown bot '{bot}'"));
        }
    }

    let run_jobs: Vec<(String, u32)> = config
        .bots
        .iter()
        .flat_map(|bot| config.seeds.iter().map(move |seed| (bot.clone(), *seed)))
        .collect();

    let run_one = |(bot_id, seed): &(String, u32)| -> Result<RunRecord> {
        let mut bot = create_bot(bot_id, game).ok_or_else(|| anyhow!("unknown bot '{bot_id}'"))?;
        let options = RunOptions {
            seed: *seed,
            rounds: config.rounds,
            max_ticks: config.max_ticks,
            tick_hz: config.tick_hz,
        };
        let report = run_session(
            bot.as_mut(),
            game.clone(),
            Box::new(MemoryStore::default()),
            &options,
        )
        .with_context(|| format!("benchmark run failed for bot={bot_id} seed={seed:#x}"))?;

        let total: u32 = report.rounds.iter().map(|round| round.score).sum();
        Ok(RunRecord {
            bot_id: bot_id.clone(),
            seed: *seed,
            seed_hex: seed_to_hex(*seed),
            ticks: report.ticks,
            rounds: report.rounds.len(),
            truncated: report.truncated,
            best_score: report.best_round_score(),
            avg_score: mean(total as f64, report.rounds.len()),
            interventions: report.interventions,
            time_played: report.stats.total_time_played,
        })
    };

    let results: Vec<Result<RunRecord>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };
    let runs = results.into_iter().collect::<Result<Vec<_>>>()?;

    let mut grouped: BTreeMap<&str, Vec<&RunRecord>> = BTreeMap::new();
    for run in &runs {
        grouped.entry(run.bot_id.as_str()).or_default().push(run);
    }

    let mut bot_rankings: Vec<BotAggregate> = grouped
        .into_iter()
        .map(|(bot_id, runs)| {
            let rounds: usize = runs.iter().map(|run| run.rounds).sum();
            let score_total: f64 = runs.iter().map(|run| run.avg_score * run.rounds as f64).sum();
            let time_total: f64 = runs.iter().map(|run| run.time_played).sum();
            let interventions: u32 = runs.iter().map(|run| run.interventions).sum();
            BotAggregate {
                bot_id: bot_id.to_string(),
                runs: runs.len(),
                avg_score: mean(score_total, rounds),
                max_score: runs.iter().map(|run| run.best_score).max().unwrap_or(0),
                avg_round_seconds: mean(time_total, rounds),
                avg_interventions: mean(interventions as f64, runs.len()),
            }
        })
        .collect();
    bot_rankings.sort_by(|a, b| {
        b.avg_score
            .total_cmp(&a.avg_score)
            .then(b.max_score.cmp(&a.max_score))
    });

    Ok(BenchmarkReport {
        rounds_per_run: config.rounds,
        max_ticks: config.max_ticks,
        tick_hz: config.tick_hz,
        jobs: config.jobs,
        bots: config.bots.clone(),
        seeds: config.seeds.clone(),
        bot_rankings,
        runs,
    })
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
