use std::collections::HashSet;

use crate::agent::{Agent, AgentCommand, TickContext};
use crate::config::{ConfigError, SimConfig};
use crate::constants::{spawn_budget_for_score, MAX_TIME_SCALE, TICK_MS};
use crate::effects::{Effect, EffectKind, Effects};
use crate::grid::Grid;
use crate::maze::generate_maze;
use crate::player::Player;
use crate::rng::Rng;
use crate::types::{AgentId, AgentKind, Intent, SessionSummary, SimEvent, Snapshot};

mod spawn_system;
mod utils;

use self::utils::{pair_mut, ticks_to_ms, tile_distance};

/// Observers for score changes and the end of a session. Both default to
/// no-ops so callers only override what they persist.
pub trait SimHooks {
    fn on_score(&mut self, _score: u32) {}
    fn on_game_over(&mut self, _summary: &SessionSummary) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl SimHooks for NoHooks {}

#[derive(Clone, Debug)]
pub struct Simulation {
    pub config: SimConfig,
    seed: u32,
    rng: Rng,
    grid: Grid,
    player: Player,
    agents: Vec<Agent>,
    effects: Effects,
    events: Vec<SimEvent>,

    frame: u64,
    score: u32,
    game_over: bool,
    game_over_frame: Option<u64>,
    caught_by: Option<AgentKind>,
    score_spawns: u32,
    agents_spawned: u32,
    spawn_index: usize,
    next_agent_id: u32,
    levels_cleared: u32,
    level_latch: u32,
}

impl Simulation {
    /// Generates a maze from `seed` and places the player and the opening
    /// wave of agents.
    pub fn new(config: SimConfig, seed: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Rng::new(seed);
        let maze = generate_maze(&config, &mut rng);
        let player = Player::spawn_at(&maze.grid, maze.player_spawn.0, maze.player_spawn.1);
        let mut sim = Self::assemble(config, seed, rng, maze.grid, player);
        sim.spawn_initial_agents();
        Ok(sim)
    }

    /// Builds a session on a hand-drawn layout with no agents. Rows use `#`
    /// for walls, `.` for collectibles and a space for empty floor.
    pub fn from_layout(
        config: SimConfig,
        seed: u32,
        rows: &[&str],
        player_at: (i32, i32),
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::from_rows(rows, config.tile_size);
        if grid.cols() == 0 || !grid.is_open(player_at.0, player_at.1) {
            return Err(ConfigError::InvalidValue {
                field: "layout",
                reason: "player must start on an open cell",
            });
        }
        let player = Player::spawn_at(&grid, player_at.0, player_at.1);
        Ok(Self::assemble(config, seed, Rng::new(seed), grid, player))
    }

    fn assemble(
        config: SimConfig,
        seed: u32,
        rng: Rng,
        grid: Grid,
        player: Player,
    ) -> Self {
        Self {
            config,
            seed,
            rng,
            grid,
            player,
            agents: Vec::new(),
            effects: Effects::default(),
            events: Vec::new(),
            frame: 0,
            score: 0,
            game_over: false,
            game_over_frame: None,
            caught_by: None,
            score_spawns: 0,
            agents_spawned: 0,
            spawn_index: 0,
            next_agent_id: 1,
            levels_cleared: 0,
            level_latch: 0,
        }
    }

    /// Discards every piece of session state and starts over on a fresh maze.
    pub fn reset(&mut self, seed: u32) -> Result<(), ConfigError> {
        *self = Self::new(self.config.clone(), seed)?;
        Ok(())
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    pub fn level_latched(&self) -> bool {
        self.level_latch > 0
    }

    /// Places an agent on a specific cell, bypassing the spawn distance rule.
    pub fn place_agent(&mut self, kind: AgentKind, col: i32, row: i32) -> AgentId {
        let id = self.allocate_agent_id();
        let agent = Agent::spawn(
            id,
            kind,
            self.grid.center_of(col),
            self.grid.center_of(row),
            &self.grid,
            &self.player,
            &self.config,
        );
        self.agents.push(agent);
        self.agents_spawned += 1;
        self.events.push(SimEvent::AgentSpawned { id, kind });
        id
    }

    /// Applies one player intent. Returns whether it took effect.
    pub fn apply_intent(&mut self, intent: Intent) -> bool {
        if self.game_over {
            return false;
        }
        match intent {
            Intent::Move(dir) => {
                self.player.steer(&self.grid, dir);
                true
            }
            Intent::Blink => {
                let Some(outcome) = self.player.try_blink(&self.grid, &self.config, self.score)
                else {
                    return false;
                };
                self.effects.trail(outcome.from, outcome.to, 8, 20);
                self.effects
                    .burst(outcome.to.0, outcome.to.1, 10, 3.0, 20);
                self.events.push(SimEvent::PlayerBlinked {
                    x: outcome.to.0,
                    y: outcome.to.1,
                });
                true
            }
            Intent::Stun => {
                if !self.player.try_stun(&self.config, self.score) {
                    return false;
                }
                self.apply_area_stun();
                true
            }
            Intent::Invisibility => self.player.try_invisibility(&self.config, self.score),
        }
    }

    fn apply_area_stun(&mut self) {
        let origin = (self.player.x, self.player.y);
        let radius = self.config.stun_radius * self.grid.tile_size();
        let mut count = 0;
        for agent in &mut self.agents {
            if agent.core.distance_to(origin) > radius {
                continue;
            }
            agent.core.stun(self.config.stun_duration);
            self.effects.burst(agent.core.x, agent.core.y, 12, 3.0, 25);
            count += 1;
        }
        for life in [20, 30, 40] {
            self.effects
                .push(Effect::at(EffectKind::Shockwave, origin.0, origin.1, life));
        }
        self.effects.burst(origin.0, origin.1, 16, 6.0, 30);
        self.events.push(SimEvent::AgentsStunned { count });
    }

    pub fn step(&mut self) {
        self.step_with(&mut NoHooks);
    }

    pub fn step_with(&mut self, hooks: &mut dyn SimHooks) {
        self.step_scaled(1.0, hooks);
    }

    /// Advances one tick. `time_scale` stretches agent movement and ability
    /// timers and is clamped to `[0, MAX_TIME_SCALE]`.
    pub fn step_scaled(&mut self, time_scale: f32, hooks: &mut dyn SimHooks) {
        self.frame += 1;
        self.effects.tick();
        self.level_latch = self.level_latch.saturating_sub(1);
        if self.game_over {
            return;
        }

        self.player.update(&self.grid, &self.config);
        self.collect(hooks);
        self.check_level_clear(hooks);
        self.player.tick_cooldowns();

        let time_scale = if time_scale.is_finite() {
            time_scale.clamp(0.0, MAX_TIME_SCALE)
        } else {
            1.0
        };
        self.update_agents(time_scale, hooks);
    }

    fn collect(&mut self, hooks: &mut dyn SimHooks) {
        let (col, row) = self.player.tile(&self.grid);
        if !self.grid.take_collectible(col, row) {
            return;
        }
        self.score += self.config.dot_points;
        self.events.push(SimEvent::CollectibleTaken {
            col,
            row,
            score: self.score,
        });
        hooks.on_score(self.score);

        let step = self.config.spawn_score_step;
        if step > 0
            && self.score % step == 0
            && self.score_spawns < spawn_budget_for_score(self.score, step)
        {
            self.score_spawns += 1;
            self.spawn_next_agent();
        }
    }

    fn check_level_clear(&mut self, hooks: &mut dyn SimHooks) {
        if self.level_latch > 0 || self.grid.collectible_count() > 0 {
            return;
        }
        self.level_latch = self.config.level_latch_ticks.max(1);
        self.grid.refill_collectibles();
        self.score += self.config.level_clear_bonus;
        self.levels_cleared += 1;
        self.events.push(SimEvent::LevelCleared {
            bonus: self.config.level_clear_bonus,
            score: self.score,
        });
        hooks.on_score(self.score);

        let center = (self.grid.width_px() / 2.0, self.grid.height_px() / 2.0);
        self.effects.burst(center.0, center.1, 50, 8.0, 60);
        self.effects
            .push(Effect::at(EffectKind::Shockwave, center.0, center.1, 60));
    }

    fn update_agents(&mut self, time_scale: f32, hooks: &mut dyn SimHooks) {
        let order: Vec<AgentId> = self.agents.iter().map(Agent::id).collect();
        let mut commands = Vec::new();
        let mut retired: HashSet<AgentId> = HashSet::new();

        for id in order {
            if retired.contains(&id) {
                continue;
            }
            let Some(index) = self.index_of(id) else {
                continue;
            };
            if self.is_orphaned_clone(index) {
                retired.insert(id);
                commands.push(AgentCommand::Despawn(id));
                continue;
            }

            let twin_index = self.agents[index]
                .core
                .twin
                .and_then(|twin| self.index_of(twin))
                .filter(|twin| !retired.contains(&self.agents[*twin].id()));
            let issued = commands.len();
            let (agent, twin) = pair_mut(&mut self.agents, index, twin_index);
            let mut ctx = TickContext {
                grid: &self.grid,
                player: &self.player,
                config: &self.config,
                rng: &mut self.rng,
                frame: self.frame,
                time_scale,
                twin,
                effects: &mut self.effects,
                events: &mut self.events,
                commands: &mut commands,
            };
            let caught = agent.update(&mut ctx);
            let kind = agent.kind();

            for command in &commands[issued..] {
                if let AgentCommand::Despawn(gone) = command {
                    retired.insert(*gone);
                }
            }
            if caught {
                self.finish(id, kind, hooks);
                break;
            }
        }

        self.apply_agent_commands(commands);
    }

    /// A clone whose primary is gone or no longer points back at it.
    fn is_orphaned_clone(&self, index: usize) -> bool {
        let agent = &self.agents[index];
        if !agent.core.is_clone {
            return false;
        }
        let Some(primary) = agent.core.twin.and_then(|twin| self.agent(twin)) else {
            return true;
        };
        primary.core.twin != Some(agent.id())
    }

    fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.iter().position(|agent| agent.id() == id)
    }

    fn finish(&mut self, caught_by: AgentId, kind: AgentKind, hooks: &mut dyn SimHooks) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.game_over_frame = Some(self.frame);
        self.caught_by = Some(kind);
        self.events.push(SimEvent::GameOver {
            score: self.score,
            caught_by,
        });
        let summary = self.summary();
        hooks.on_game_over(&summary);
    }

    pub fn summary(&self) -> SessionSummary {
        let duration_ticks = self.game_over_frame.unwrap_or(self.frame);
        SessionSummary {
            seed: self.seed,
            score: self.score,
            duration_ticks,
            duration_ms: ticks_to_ms(duration_ticks, TICK_MS),
            agents_spawned: self.agents_spawned,
            levels_cleared: self.levels_cleared,
            caught_by: self.caught_by,
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            frame: self.frame,
            score: self.score,
            game_over: self.game_over,
            cols: self.grid.cols(),
            rows: self.grid.rows(),
            tile_size: self.grid.tile_size(),
            tiles: self.grid.to_rows(),
            player: self.player.view(),
            agents: self.agents.iter().map(Agent::view).collect(),
            effect_count: self.effects.len(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };

        if include_events {
            self.events.clear();
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimConfig;
    use crate::constants::MAX_TIME_SCALE;
    use crate::engine::{NoHooks, SimHooks, Simulation};
    use crate::types::{AgentId, AgentKind, Dir, Intent, SessionSummary, SimEvent};

    #[derive(Default)]
    struct Recorder {
        scores: Vec<u32>,
        summaries: Vec<SessionSummary>,
    }

    impl SimHooks for Recorder {
        fn on_score(&mut self, score: u32) {
            self.scores.push(score);
        }

        fn on_game_over(&mut self, summary: &SessionSummary) {
            self.summaries.push(summary.clone());
        }
    }

    const CORRIDOR: [&str; 3] = [
        "###############", //
        "#.............#", //
        "###############",
    ];

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = Simulation::new(SimConfig::default(), 42).expect("sim a");
        let mut b = Simulation::new(SimConfig::default(), 42).expect("sim b");
        let moves = [Dir::Left, Dir::Up, Dir::Right, Dir::Down];
        for tick in 0..600 {
            if tick % 45 == 0 {
                let dir = moves[(tick / 45) % moves.len()];
                a.apply_intent(Intent::Move(dir));
                b.apply_intent(Intent::Move(dir));
            }
            a.step();
            b.step();
        }
        let left = serde_json::to_string(&a.build_snapshot(true)).expect("serialize a");
        let right = serde_json::to_string(&b.build_snapshot(true)).expect("serialize b");
        assert_eq!(left, right);
    }

    #[test]
    fn new_session_starts_with_initial_agents() {
        let sim = Simulation::new(SimConfig::default(), 7).expect("sim");
        let kinds: Vec<AgentKind> = sim.agents().iter().map(|agent| agent.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                AgentKind::Ambusher,
                AgentKind::Glitch,
                AgentKind::Phantom,
                AgentKind::Speedster
            ]
        );
        assert_eq!(sim.summary().agents_spawned, 4);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut sim =
            Simulation::from_layout(SimConfig::default(), 3, &CORRIDOR, (1, 1)).expect("sim");
        sim.step();
        let first = sim.build_snapshot(true);
        assert!(first
            .events
            .iter()
            .any(|event| matches!(event, SimEvent::CollectibleTaken { col: 1, row: 1, .. })));
        let second = sim.build_snapshot(true);
        assert!(second.events.is_empty());
    }

    #[test]
    fn score_step_spawns_one_agent_per_threshold() {
        let config = SimConfig {
            spawn_score_step: 10,
            ..SimConfig::default()
        };
        let long = [
            "#############################", //
            "#...........................#", //
            "#############################",
        ];
        let mut sim = Simulation::from_layout(config, 5, &long, (1, 1)).expect("sim");
        sim.apply_intent(Intent::Move(Dir::Right));
        let mut recorder = Recorder::default();
        for _ in 0..200 {
            sim.step_with(&mut recorder);
            if sim.score() >= 30 {
                break;
            }
        }
        assert_eq!(sim.score(), 30);
        assert_eq!(sim.agents().len(), 3);
        assert_eq!(sim.summary().agents_spawned, 3);
        assert_eq!(sim.agents()[0].kind(), AgentKind::Ambusher);
        assert_eq!(recorder.scores.first(), Some(&10));
    }

    #[test]
    fn catch_ends_the_session_once() {
        let mut sim =
            Simulation::from_layout(SimConfig::default(), 9, &CORRIDOR, (1, 1)).expect("sim");
        let hunter = sim.place_agent(AgentKind::Hunter, 5, 1);
        let mut recorder = Recorder::default();
        for _ in 0..300 {
            sim.step_with(&mut recorder);
        }
        assert!(sim.is_game_over());
        assert_eq!(recorder.summaries.len(), 1);
        assert_eq!(recorder.summaries[0].caught_by, Some(AgentKind::Hunter));

        let game_overs: Vec<SimEvent> = sim
            .build_snapshot(true)
            .events
            .into_iter()
            .filter(|event| matches!(event, SimEvent::GameOver { .. }))
            .collect();
        assert_eq!(game_overs.len(), 1);
        assert!(matches!(
            game_overs[0],
            SimEvent::GameOver { caught_by, .. } if caught_by == hunter
        ));

        let frozen = sim.summary();
        sim.step();
        assert_eq!(sim.summary().duration_ticks, frozen.duration_ticks);
        assert!(!sim.apply_intent(Intent::Move(Dir::Right)));
    }

    #[test]
    fn orphaned_clone_is_removed() {
        let mut sim =
            Simulation::from_layout(SimConfig::default(), 11, &CORRIDOR, (1, 1)).expect("sim");
        let primary = sim.place_agent(AgentKind::Gemini, 12, 1);
        let clone = sim.place_agent(AgentKind::Gemini, 13, 1);
        sim.agents[1].core.is_clone = true;
        sim.agents[1].core.twin = Some(primary);
        sim.step();
        assert!(sim.agent(clone).is_none());
        assert!(sim.agent(primary).is_some());
    }

    #[test]
    fn reset_starts_a_fresh_session() {
        let mut sim = Simulation::new(SimConfig::default(), 21).expect("sim");
        for _ in 0..30 {
            sim.step();
        }
        sim.reset(22).expect("reset");
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.seed(), 22);
        assert_eq!(sim.agents().len(), 4);
    }

    fn x_after_step(sim: &mut Simulation, id: AgentId, time_scale: f32) -> f32 {
        sim.step_scaled(time_scale, &mut NoHooks);
        sim.agent(id).expect("agent").core.x
    }

    #[test]
    fn out_of_range_time_scales_are_clamped() {
        let config = SimConfig {
            ghost_speed: 4.0,
            surge_speed: 4.0,
            ..SimConfig::default()
        };
        let mut sim = Simulation::from_layout(config, 8, &CORRIDOR, (1, 1)).expect("sim");
        let hunter = sim.place_agent(AgentKind::Hunter, 12, 1);
        let start = sim.agent(hunter).expect("hunter").core.x;

        let x = x_after_step(&mut sim, hunter, 5.0);
        assert_eq!(x, start - 8.0);
        let x = x_after_step(&mut sim, hunter, f32::INFINITY);
        assert_eq!(x, start - 12.0);
        let x = x_after_step(&mut sim, hunter, f32::NAN);
        assert_eq!(x, start - 16.0);
        let x = x_after_step(&mut sim, hunter, -3.0);
        assert_eq!(x, start - 16.0);
    }

    #[test]
    fn double_speed_steps_stay_within_half_a_tile() {
        let config = SimConfig {
            ghost_speed: 16.0,
            surge_speed: 16.0,
            ..SimConfig::default()
        };
        let half = config.tile_size / 2.0;
        let mut sim = Simulation::from_layout(config, 9, &CORRIDOR, (1, 1)).expect("sim");
        let hunter = sim.place_agent(AgentKind::Hunter, 13, 1);
        let mut before = sim.agent(hunter).expect("hunter").core.x;
        let mut moved = false;
        for _ in 0..30 {
            let x = x_after_step(&mut sim, hunter, MAX_TIME_SCALE);
            assert!((x - before).abs() <= half + 1e-3, "moved {}", before - x);
            moved |= x != before;
            before = x;
            if sim.is_game_over() {
                break;
            }
        }
        assert!(moved);
        assert!(sim.is_game_over());
    }

    #[test]
    fn split_out_of_sight_hands_the_chase_to_the_clone() {
        let rows = [
            "#########", //
            "#...#...#", //
            "#...#...#", //
            "#########",
        ];
        let mut sim = Simulation::from_layout(SimConfig::default(), 10, &rows, (6, 1)).expect("sim");
        let primary = sim.place_agent(AgentKind::Gemini, 2, 1);
        let sighting = (sim.player().x, sim.player().y);
        let duration = sim.config.memory_duration;
        sim.agents[0].core.memory.refresh(sighting, duration);

        sim.step();

        let clone = sim
            .agents()
            .iter()
            .find(|agent| agent.core.is_clone)
            .expect("gemini split");
        assert_eq!(clone.core.twin, Some(primary));
        assert!(clone.core.memory.chasing);
        assert_eq!(clone.core.memory.last_seen, Some(sighting));
        let primary_memory = sim.agent(primary).expect("primary").core.memory;
        assert_eq!(clone.core.memory.last_seen, primary_memory.last_seen);
    }
}
