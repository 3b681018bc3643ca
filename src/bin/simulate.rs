use chrono::{SecondsFormat, Utc};
use clap::Parser;
use maze_chase_sim::config::SimConfig;
use maze_chase_sim::constants::{TICK_MS, TICK_RATE};
use maze_chase_sim::driver::FixedStepDriver;
use maze_chase_sim::engine::{SimHooks, Simulation};
use maze_chase_sim::grid::Grid;
use maze_chase_sim::types::{AgentKind, Dir, Intent, SessionSummary, SimEvent, Snapshot, Tile};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    scenario: Option<String>,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    minutes: u32,
    seed: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    minutes: u32,
    score: u32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "durationTicks")]
    duration_ticks: u64,
    #[serde(rename = "caughtBy", skip_serializing_if = "Option::is_none")]
    caught_by: Option<AgentKind>,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
    #[serde(rename = "agentsSpawned")]
    agents_spawned: u32,
    collected: u32,
    blinks: u32,
    stuns: u32,
    #[serde(rename = "agentsStunned")]
    agents_stunned: usize,
    splits: u32,
    merges: u32,
    teleports: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "generatedAt")]
    generated_at: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "caughtByCounts")]
    caught_by_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Records hook callbacks so the runner can cross-check them against the
/// event stream.
#[derive(Default)]
struct Tally {
    last_score: u32,
    score_regressed: bool,
    game_overs: u32,
    summary: Option<SessionSummary>,
}

impl SimHooks for Tally {
    fn on_score(&mut self, score: u32) {
        if score < self.last_score {
            self.score_regressed = true;
        }
        self.last_score = score;
    }

    fn on_game_over(&mut self, summary: &SessionSummary) {
        self.game_overs += 1;
        self.summary = Some(summary.clone());
    }
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));

    let config = match cli.config.as_deref() {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(error) => {
                emit_log(
                    "error",
                    "config_load_failed",
                    &run_id,
                    None,
                    None,
                    None,
                    json!({
                        "path": path.to_string_lossy(),
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "minutes": scenario.minutes,
                "cols": config.cols,
                "rows": config.rows,
            }),
        );

        let scenario_run = match run_scenario(&scenario, &config) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "scenario_failed",
                    &run_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "score": scenario_run.result.score,
                "durationMs": scenario_run.result.duration_ms,
                "caughtBy": scenario_run.result.caught_by,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => {
                emit_log(
                    "error",
                    "result_serialize_failed",
                    &run_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "averageDurationMs": summary.average_duration_ms,
            "caughtByCounts": summary.caught_by_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, config: &SimConfig) -> Result<ScenarioRunResult, String> {
    let mut sim = Simulation::new(config.clone(), scenario.seed).map_err(|e| e.to_string())?;
    let mut driver = FixedStepDriver::default();
    let mut tally = Tally::default();
    let mut result = ScenarioResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        minutes: scenario.minutes,
        ..ScenarioResultLine::default()
    };
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let tick_limit = u64::from(scenario.minutes) * 60 * u64::from(TICK_RATE);

    while !sim.is_game_over() && sim.frame() < tick_limit {
        driver.run_frame(TICK_MS, || {
            if let Some(intent) = autopilot(&sim) {
                sim.apply_intent(intent);
            }
            sim.step_with(&mut tally);
        });

        let snapshot = sim.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, sim.grid()) {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.frame,
                message,
            );
        }
        for event in &snapshot.events {
            match event {
                SimEvent::CollectibleTaken { .. } => result.collected += 1,
                SimEvent::PlayerBlinked { .. } => result.blinks += 1,
                SimEvent::AgentsStunned { count } => {
                    result.stuns += 1;
                    result.agents_stunned += count;
                }
                SimEvent::AgentSplit { .. } => result.splits += 1,
                SimEvent::AgentMerged { .. } => result.merges += 1,
                SimEvent::AgentTeleported { .. } => result.teleports += 1,
                _ => {}
            }
        }
    }

    if tally.score_regressed {
        push_anomaly(
            &mut result.anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            sim.frame(),
            "score decreased between hook calls".to_string(),
        );
    }
    if tally.game_overs > 1 {
        push_anomaly(
            &mut result.anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            sim.frame(),
            format!("game over fired {} times", tally.game_overs),
        );
    }

    let summary = tally.summary.unwrap_or_else(|| sim.summary());
    result.score = summary.score;
    result.duration_ms = summary.duration_ms;
    result.duration_ticks = summary.duration_ticks;
    result.caught_by = summary.caught_by;
    result.levels_cleared = summary.levels_cleared;
    result.agents_spawned = summary.agents_spawned;

    Ok(ScenarioRunResult {
        result,
        anomaly_records,
        finished_tick: sim.frame(),
    })
}

/// Scripted player: heads for the nearest collectible and spends abilities
/// when an agent gets close.
fn autopilot(sim: &Simulation) -> Option<Intent> {
    let grid = sim.grid();
    let player = sim.player();
    let tile = grid.tile_size();
    let nearest_agent = sim
        .agents()
        .iter()
        .filter(|agent| !agent.core.is_stunned())
        .map(|agent| agent.core.distance_to((player.x, player.y)) / tile)
        .fold(f32::INFINITY, f32::min);

    if nearest_agent < 2.0 && player.blink_cooldown == 0 {
        return Some(Intent::Blink);
    }
    if nearest_agent < 3.0 && player.stun_cooldown == 0 {
        return Some(Intent::Stun);
    }
    if nearest_agent < 3.0 && player.invis_cooldown == 0 {
        return Some(Intent::Invisibility);
    }

    let from = player.tile(grid);
    let dir = first_step_to_collectible(grid, from)?;
    if dir == player.dir && player.next_dir.is_none() {
        return None;
    }
    Some(Intent::Move(dir))
}

fn first_step_to_collectible(grid: &Grid, from: (i32, i32)) -> Option<Dir> {
    let mut queue = VecDeque::new();
    let mut visited = HashSet::new();
    visited.insert(from);
    for dir in Dir::AXES {
        let (dx, dy) = dir.delta();
        let next = (from.0 + dx, from.1 + dy);
        if grid.is_open(next.0, next.1) && visited.insert(next) {
            queue.push_back((next, dir));
        }
    }
    while let Some(((col, row), first)) = queue.pop_front() {
        if grid.get(col, row) == Some(Tile::Collectible) {
            return Some(first);
        }
        for dir in Dir::AXES {
            let (dx, dy) = dir.delta();
            let next = (col + dx, row + dy);
            if grid.is_open(next.0, next.1) && visited.insert(next) {
                queue.push_back((next, first));
            }
        }
    }
    None
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, grid: &Grid) -> Vec<String> {
    let mut anomalies = Vec::new();
    let margin = grid.tile_size();
    let in_range = |x: f32, y: f32| {
        x.is_finite()
            && y.is_finite()
            && x >= -margin
            && x <= grid.width_px() + margin
            && y >= 0.0
            && y <= grid.height_px()
    };

    if !in_range(snapshot.player.x, snapshot.player.y) {
        anomalies.push(format!(
            "player out of bounds: ({:.1}, {:.1})",
            snapshot.player.x, snapshot.player.y
        ));
    }
    for agent in &snapshot.agents {
        if !in_range(agent.x, agent.y) {
            anomalies.push(format!(
                "agent {} out of bounds: ({:.1}, {:.1})",
                agent.id.0, agent.x, agent.y
            ));
        }
    }

    let clones = snapshot.agents.iter().filter(|agent| agent.is_clone).count();
    let geminis = snapshot
        .agents
        .iter()
        .filter(|agent| agent.kind == AgentKind::Gemini && !agent.is_clone)
        .count();
    if clones > geminis {
        anomalies.push(format!("{clones} clones for {geminis} primaries"));
    }

    if snapshot.tiles.len() != snapshot.rows as usize {
        anomalies.push("snapshot row count mismatch".to_string());
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(
        cli.seed
            .unwrap_or_else(|| u64::from(rand::rng().random::<u32>())),
    );

    if let Some(minutes) = cli.minutes {
        return vec![Scenario {
            name: cli
                .scenario
                .clone()
                .unwrap_or_else(|| format!("custom-{}m", minutes.clamp(1, 30))),
            minutes: minutes.clamp(1, 30),
            seed,
        }];
    }

    let presets = vec![
        Scenario {
            name: "quick-check".to_string(),
            minutes: 2,
            seed,
        },
        Scenario {
            name: "endurance".to_string(),
            minutes: 5,
            seed: normalize_seed(u64::from(seed) + 1),
        },
    ];
    match cli.scenario.as_deref() {
        Some(name) => presets
            .into_iter()
            .filter(|scenario| scenario.name == name)
            .collect(),
        None => presets,
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let (average_score, average_duration_ms) = if scenario_count == 0 {
        (0, 0)
    } else {
        let total_score: u64 = scenarios.iter().map(|s| u64::from(s.score)).sum();
        let total_duration: u64 = scenarios.iter().map(|s| s.duration_ms).sum();
        (
            (total_score / scenario_count as u64) as u32,
            total_duration / scenario_count as u64,
        )
    };
    let mut caught_by_counts: BTreeMap<String, usize> = BTreeMap::new();
    for scenario in &scenarios {
        *caught_by_counts
            .entry(caught_by_key(scenario.caught_by))
            .or_insert(0) += 1;
    }
    RunSummary {
        run_id,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        average_duration_ms,
        caught_by_counts,
        scenarios,
    }
}

fn caught_by_key(kind: Option<AgentKind>) -> String {
    match kind {
        Some(AgentKind::Hunter) => "hunter",
        Some(AgentKind::Ambusher) => "ambusher",
        Some(AgentKind::Speedster) => "speedster",
        Some(AgentKind::Glitch) => "glitch",
        Some(AgentKind::Phantom) => "phantom",
        Some(AgentKind::Gemini) => "gemini",
        None => "survived",
    }
    .to_string()
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
