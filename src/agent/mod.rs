//! Pursuer agents. [`Agent::update`] runs the cycle every variant shares;
//! the variant hooks live behind [`AgentBehavior`].

use crate::config::SimConfig;
use crate::constants::{
    agent_color, GLITCH_INITIAL_TIMER, PATH_RECALC_INTERVAL, STUCK_CHECK_TICKS,
    STUCK_OVERRIDE_TICKS, SURGE_CYCLE, SURGE_START, TUNNEL_OVERSHOOT,
};
use crate::effects::Effects;
use crate::grid::Grid;
use crate::pathfinding::{
    astar_first_step, greedy_direction, line_of_sight, wander_direction, SearchLimits,
};
use crate::player::Player;
use crate::rng::Rng;
use crate::types::{AgentId, AgentKind, AgentView, Dir, SimEvent};

mod ambusher;
mod gemini;
mod glitch;
mod hunter;
mod phantom;
mod speedster;

pub use self::ambusher::Ambusher;
pub use self::gemini::Gemini;
pub use self::glitch::Glitch;
pub use self::hunter::Hunter;
pub use self::phantom::Phantom;
pub use self::speedster::Speedster;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryState {
    Seeing,
    Recent,
    Fading,
    Lost,
}

/// Last sighting of the player and how long it stays trusted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Memory {
    pub last_seen: Option<(f32, f32)>,
    pub timer: f32,
    pub chasing: bool,
}

impl Memory {
    pub fn refresh(&mut self, at: (f32, f32), duration: f32) {
        self.last_seen = Some(at);
        self.timer = duration;
        self.chasing = true;
    }

    pub fn forget(&mut self) {
        *self = Self::default();
    }

    pub fn decay(&mut self, amount: f32) {
        self.timer = (self.timer - amount).max(0.0);
    }

    /// Thirds of `duration`: 180 ticks split at 120 and 60 by default.
    pub fn state(&self, duration: f32) -> MemoryState {
        if self.timer > duration * 2.0 / 3.0 {
            MemoryState::Seeing
        } else if self.timer > duration / 3.0 {
            MemoryState::Recent
        } else if self.timer > 0.0 {
            MemoryState::Fading
        } else {
            MemoryState::Lost
        }
    }
}

#[derive(Clone, Debug, Default)]
struct StuckGuard {
    check_ticks: f32,
    anchor: (f32, f32),
    override_ticks: f32,
}

impl StuckGuard {
    fn rearm(&mut self, at: (f32, f32)) {
        self.check_ticks = 0.0;
        self.anchor = at;
    }
}

#[derive(Clone, Debug, Default)]
struct PathCache {
    step: Option<Dir>,
    target: Option<(f32, f32)>,
    origin: (i32, i32),
    recalc: u32,
}

/// Structural changes an agent asks the simulation to make once the agent
/// loop has finished.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AgentCommand {
    SpawnClone {
        primary: AgentId,
        x: f32,
        y: f32,
        dir: Dir,
        memory: Memory,
    },
    Despawn(AgentId),
}

/// Everything an agent may read or touch during its update. `twin` is the
/// linked Gemini body, lent out of the agent list for this call only.
pub struct TickContext<'a> {
    pub grid: &'a Grid,
    pub player: &'a Player,
    pub config: &'a SimConfig,
    pub rng: &'a mut Rng,
    pub frame: u64,
    pub time_scale: f32,
    pub twin: Option<&'a mut Agent>,
    pub effects: &'a mut Effects,
    pub events: &'a mut Vec<SimEvent>,
    pub commands: &'a mut Vec<AgentCommand>,
}

impl TickContext<'_> {
    pub fn player_pos(&self) -> (f32, f32) {
        (self.player.x, self.player.y)
    }

    pub fn tiles_between(&self, a: (f32, f32), b: (f32, f32)) -> f32 {
        (a.0 - b.0).hypot(a.1 - b.1) / self.grid.tile_size()
    }

    fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_nodes: self.config.astar_max_nodes,
            max_distance: self.config.astar_max_distance,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AgentCore {
    pub id: AgentId,
    pub kind: AgentKind,
    pub x: f32,
    pub y: f32,
    pub dir: Dir,
    pub stun_timer: f32,
    pub ability_timer: f32,
    pub memory: Memory,
    pub wander_timer: f32,
    pub twin: Option<AgentId>,
    pub is_clone: bool,
    vision_timer: u32,
    stuck: StuckGuard,
    path: PathCache,
}

impl AgentCore {
    pub fn new(id: AgentId, kind: AgentKind, x: f32, y: f32) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            dir: Dir::None,
            stun_timer: 0.0,
            ability_timer: 0.0,
            memory: Memory::default(),
            wander_timer: 0.0,
            twin: None,
            is_clone: false,
            vision_timer: 0,
            stuck: StuckGuard {
                anchor: (x, y),
                ..StuckGuard::default()
            },
            path: PathCache::default(),
        }
    }

    pub fn pos(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn tile(&self, grid: &Grid) -> (i32, i32) {
        (grid.tile_of(self.x), grid.tile_of(self.y))
    }

    pub fn distance_to(&self, other: (f32, f32)) -> f32 {
        (self.x - other.0).hypot(self.y - other.1)
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    /// Re-stunning never shortens a stun already running.
    pub fn stun(&mut self, duration: f32) {
        self.stun_timer = self.stun_timer.max(duration);
    }

    pub fn tick_ability_timer(&mut self, time_scale: f32) {
        self.ability_timer = (self.ability_timer - time_scale).max(0.0);
    }

    pub fn teleport(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.path = PathCache::default();
        self.stuck.rearm((x, y));
    }

    /// Global pursuer speed, raised during the surge window.
    pub fn surge_or_base(ctx: &TickContext<'_>) -> f32 {
        if ctx.frame % SURGE_CYCLE > SURGE_START {
            ctx.config.surge_speed
        } else {
            ctx.config.ghost_speed
        }
    }

    pub fn base_speed(&self, ctx: &TickContext<'_>) -> f32 {
        let multiplier = match self.memory.state(ctx.config.memory_duration) {
            MemoryState::Fading => 0.7,
            MemoryState::Lost => 0.5,
            MemoryState::Seeing | MemoryState::Recent => 1.0,
        };
        Self::surge_or_base(ctx) * multiplier
    }

    /// Decays memory and runs the periodic sight check. Returns true when the
    /// player was seen this tick.
    pub fn observe(&mut self, ctx: &TickContext<'_>) -> bool {
        self.wander_timer += ctx.time_scale;
        if ctx.player.is_invisible() {
            self.memory.forget();
            return false;
        }
        self.memory.decay(ctx.time_scale);

        let mut saw = false;
        self.vision_timer += 1;
        if self.vision_timer >= ctx.config.vision_check_interval {
            self.vision_timer = 0;
            let player = ctx.player_pos();
            let range_px = ctx.config.vision_range * ctx.grid.tile_size();
            if self.distance_to(player) <= range_px
                && line_of_sight(ctx.grid, self.pos(), player, ctx.config.vision_range)
            {
                self.memory.refresh(player, ctx.config.memory_duration);
                saw = true;
            }
        }
        self.memory.chasing = self.memory.timer > 0.0;
        saw
    }

    /// First step toward `target`: cached A* when it finds a route, greedy
    /// otherwise.
    pub fn pursue(&mut self, ctx: &TickContext<'_>, target: (f32, f32)) -> Dir {
        let tile = ctx.grid.tile_size();
        let origin = self.tile(ctx.grid);
        let target_moved = match self.path.target {
            None => true,
            Some((tx, ty)) => (tx - target.0).abs() > tile * 2.0 || (ty - target.1).abs() > tile * 2.0,
        };
        if self.path.step.is_none()
            || target_moved
            || self.path.recalc == 0
            || self.path.origin != origin
        {
            self.path = PathCache {
                step: astar_first_step(ctx.grid, self.pos(), target, ctx.search_limits()),
                target: Some(target),
                origin,
                recalc: PATH_RECALC_INTERVAL,
            };
        } else {
            self.path.recalc -= 1;
        }

        self.path
            .step
            .unwrap_or_else(|| greedy_direction(ctx.grid, self.pos(), self.dir, target, false))
    }

    fn wander(&mut self, ctx: &mut TickContext<'_>) {
        let (col, row) = self.tile(ctx.grid);
        let (dx, dy) = self.dir.delta();
        let blocked = ctx.grid.is_wall(col + dx, row + dy, false);
        if self.wander_timer >= ctx.config.wander_change_ticks || self.dir.is_none() || blocked {
            let next = wander_direction(ctx.grid, self.pos(), self.dir, ctx.rng);
            if !next.is_none() {
                self.dir = next;
            }
            self.wander_timer = 0.0;
        }
    }

    /// True while a stuck override is forcing wander picks.
    fn anti_stuck(&mut self, ctx: &TickContext<'_>) -> bool {
        if self.stuck.override_ticks > 0.0 {
            self.stuck.override_ticks = (self.stuck.override_ticks - ctx.time_scale).max(0.0);
            return true;
        }
        self.stuck.check_ticks += ctx.time_scale;
        if self.stuck.check_ticks <= STUCK_CHECK_TICKS {
            return false;
        }
        let moved = self.distance_to(self.stuck.anchor);
        self.stuck.rearm(self.pos());
        if moved < ctx.grid.tile_size() * 0.5 && self.memory.chasing {
            self.stuck.override_ticks = STUCK_OVERRIDE_TICKS;
            self.dir = Dir::None;
            return true;
        }
        false
    }

    fn wrap_tunnel(&mut self, grid: &Grid) {
        let width = grid.width_px();
        if self.x < -TUNNEL_OVERSHOOT {
            self.x = width + TUNNEL_OVERSHOOT;
        } else if self.x > width + TUNNEL_OVERSHOOT {
            self.x = -TUNNEL_OVERSHOOT;
        }
    }

    fn advance(&mut self, grid: &Grid, step: f32, was_at_center: bool, passes_walls: bool) {
        if self.dir.is_none() {
            return;
        }
        let (dx, dy) = self.dir.delta();
        let half = grid.tile_size() / 2.0;
        let next_x = self.x + dx as f32 * step;
        let next_y = self.y + dy as f32 * step;
        let lead_col = grid.tile_of(next_x + dx as f32 * half);
        let lead_row = grid.tile_of(next_y + dy as f32 * half);

        if grid.is_wall(lead_col, lead_row, passes_walls) {
            self.x = grid.snap(self.x);
            self.y = grid.snap(self.y);
            self.dir = Dir::None;
            return;
        }
        self.x = next_x;
        self.y = next_y;
        if dx != 0 && !was_at_center {
            self.y = grid.snap(self.y);
        }
        if dy != 0 && !was_at_center {
            self.x = grid.snap(self.x);
        }
    }
}

/// Per-variant hooks into the shared update cycle. Every hook has the plain
/// pursuer behavior as its default.
pub trait AgentBehavior {
    fn tick_ability(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.tick_ability_timer(ctx.time_scale);
    }

    fn update_memory(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.observe(ctx);
    }

    fn speed(&self, core: &AgentCore, ctx: &TickContext<'_>) -> f32 {
        core.base_speed(ctx)
    }

    fn forces_redecision(&self, _core: &AgentCore) -> bool {
        false
    }

    /// `target` is where the player is believed to be, `None` when unknown.
    /// Returning `None` hands the decision to the wander logic.
    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        target.map(|target| core.pursue(ctx, target))
    }

    fn passes_walls(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub enum Behavior {
    Hunter(Hunter),
    Ambusher(Ambusher),
    Speedster(Speedster),
    Glitch(Glitch),
    Phantom(Phantom),
    Gemini(Gemini),
}

impl Behavior {
    pub fn for_kind(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Hunter => Behavior::Hunter(Hunter),
            AgentKind::Ambusher => Behavior::Ambusher(Ambusher),
            AgentKind::Speedster => Behavior::Speedster(Speedster::default()),
            AgentKind::Glitch => Behavior::Glitch(Glitch::default()),
            AgentKind::Phantom => Behavior::Phantom(Phantom::default()),
            AgentKind::Gemini => Behavior::Gemini(Gemini::default()),
        }
    }

    pub fn is_phasing(&self) -> bool {
        matches!(self, Behavior::Phantom(phantom) if phantom.phasing)
    }

    pub fn gemini(&self) -> Option<&Gemini> {
        match self {
            Behavior::Gemini(gemini) => Some(gemini),
            _ => None,
        }
    }

    fn as_dyn(&self) -> &dyn AgentBehavior {
        match self {
            Behavior::Hunter(inner) => inner,
            Behavior::Ambusher(inner) => inner,
            Behavior::Speedster(inner) => inner,
            Behavior::Glitch(inner) => inner,
            Behavior::Phantom(inner) => inner,
            Behavior::Gemini(inner) => inner,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn AgentBehavior {
        match self {
            Behavior::Hunter(inner) => inner,
            Behavior::Ambusher(inner) => inner,
            Behavior::Speedster(inner) => inner,
            Behavior::Glitch(inner) => inner,
            Behavior::Phantom(inner) => inner,
            Behavior::Gemini(inner) => inner,
        }
    }
}

impl AgentBehavior for Behavior {
    fn tick_ability(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        self.as_dyn_mut().tick_ability(core, ctx);
    }

    fn update_memory(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        self.as_dyn_mut().update_memory(core, ctx);
    }

    fn speed(&self, core: &AgentCore, ctx: &TickContext<'_>) -> f32 {
        self.as_dyn().speed(core, ctx)
    }

    fn forces_redecision(&self, core: &AgentCore) -> bool {
        self.as_dyn().forces_redecision(core)
    }

    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        self.as_dyn_mut().chase_step(core, ctx, target)
    }

    fn passes_walls(&self) -> bool {
        self.as_dyn().passes_walls()
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub core: AgentCore,
    pub behavior: Behavior,
}

impl Agent {
    /// New agent at `(x, y)` heading greedily toward the player.
    pub fn spawn(
        id: AgentId,
        kind: AgentKind,
        x: f32,
        y: f32,
        grid: &Grid,
        player: &Player,
        config: &SimConfig,
    ) -> Self {
        let mut core = AgentCore::new(id, kind, x, y);
        core.ability_timer = match kind {
            AgentKind::Glitch => GLITCH_INITIAL_TIMER,
            AgentKind::Phantom => config.phase_cooldown,
            _ => 0.0,
        };
        core.dir = greedy_direction(grid, (x, y), Dir::None, (player.x, player.y), false);
        Self {
            core,
            behavior: Behavior::for_kind(kind),
        }
    }

    /// Second Gemini body linked back to `primary`. It starts from the
    /// primary's memory so both bodies keep chasing the same sighting.
    pub fn gemini_clone(
        id: AgentId,
        primary: AgentId,
        (x, y): (f32, f32),
        dir: Dir,
        memory: Memory,
        config: &SimConfig,
    ) -> Self {
        let mut core = AgentCore::new(id, AgentKind::Gemini, x, y);
        core.dir = dir;
        core.memory = memory;
        core.is_clone = true;
        core.twin = Some(primary);
        core.ability_timer = config.split_duration;
        Self {
            core,
            behavior: Behavior::Gemini(Gemini::split()),
        }
    }

    pub fn id(&self) -> AgentId {
        self.core.id
    }

    pub fn kind(&self) -> AgentKind {
        self.core.kind
    }

    /// One tick of the shared cycle. Returns true when this agent catches a
    /// visible player.
    pub fn update(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let core = &mut self.core;
        if core.stun_timer > 0.0 {
            core.stun_timer = (core.stun_timer - ctx.time_scale).max(0.0);
            core.stuck.rearm((core.x, core.y));
            return false;
        }

        self.behavior.tick_ability(core, ctx);
        core.wrap_tunnel(ctx.grid);

        let tile = ctx.grid.tile_size();
        let step = (self.behavior.speed(core, ctx) * ctx.time_scale).min(tile * 0.5);
        let was_at_center = ctx.grid.is_at_center(core.x, core.y, (step + 1.0).min(tile * 0.3));

        self.behavior.update_memory(core, ctx);
        let forced_wander = core.anti_stuck(ctx);

        if was_at_center || core.dir.is_none() || self.behavior.forces_redecision(core) {
            if ctx.grid.is_at_center(core.x, core.y, 0.5) {
                core.x = ctx.grid.snap(core.x);
                core.y = ctx.grid.snap(core.y);
            }
            if forced_wander {
                if core.dir.is_none() {
                    core.wander(ctx);
                }
            } else {
                let target = if ctx.player.is_invisible() || !core.memory.chasing {
                    None
                } else {
                    Some(core.memory.last_seen.unwrap_or(ctx.player_pos()))
                };
                match self.behavior.chase_step(core, ctx, target) {
                    Some(dir) if !dir.is_none() => core.dir = dir,
                    Some(_) => {}
                    None => core.wander(ctx),
                }
            }
        }

        core.advance(ctx.grid, step, was_at_center, self.behavior.passes_walls());

        !ctx.player.is_invisible()
            && core.distance_to(ctx.player_pos()) < ctx.config.catch_distance * tile
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.core.id,
            kind: self.core.kind,
            color: agent_color(self.core.kind),
            x: self.core.x,
            y: self.core.y,
            dir: self.core.dir,
            stunned: self.core.is_stunned(),
            phasing: self.behavior.is_phasing(),
            chasing: self.core.memory.chasing,
            gemini_phase: self.behavior.gemini().map(|gemini| gemini.phase),
            is_clone: self.core.is_clone,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use super::{Memory, MemoryState};
    use crate::constants::{STUCK_CHECK_TICKS, STUCK_OVERRIDE_TICKS};
    use crate::types::{AgentKind, Dir};

    const OPEN_ROW: [&str; 3] = [
        "###################", //
        "#.................#", //
        "###################",
    ];

    #[test]
    fn memory_states_split_duration_in_thirds() {
        let mut memory = Memory::default();
        memory.refresh((0.0, 0.0), 180.0);
        assert_eq!(memory.state(180.0), MemoryState::Seeing);
        memory.decay(70.0);
        assert_eq!(memory.state(180.0), MemoryState::Recent);
        memory.decay(60.0);
        assert_eq!(memory.state(180.0), MemoryState::Fading);
        memory.decay(1_000.0);
        assert_eq!(memory.state(180.0), MemoryState::Lost);
        assert_eq!(memory.timer, 0.0);
    }

    #[test]
    fn per_tick_displacement_never_exceeds_half_a_tile() {
        let mut fixture = Fixture::new(&OPEN_ROW, (17, 1));
        fixture.config.ghost_speed = 16.0;
        fixture.config.surge_speed = 16.0;
        let mut agent = fixture.agent(AgentKind::Hunter, 1, (1, 1));
        let half = fixture.grid.tile_size() / 2.0;
        for _ in 0..40 {
            let before = agent.core.pos();
            if fixture.tick(&mut agent) {
                break;
            }
            assert!((agent.core.x - before.0).abs() <= half + 1e-3);
            assert!((agent.core.y - before.1).abs() <= half + 1e-3);
        }
    }

    #[test]
    fn stun_freezes_and_keeps_the_longer_duration() {
        let mut fixture = Fixture::new(&OPEN_ROW, (17, 1));
        let mut agent = fixture.agent(AgentKind::Hunter, 1, (1, 1));
        agent.core.stun(30.0);
        agent.core.stun(10.0);
        assert_eq!(agent.core.stun_timer, 30.0);
        agent.core.stun(45.0);
        assert_eq!(agent.core.stun_timer, 45.0);

        let start = agent.core.pos();
        for _ in 0..45 {
            assert!(!fixture.tick(&mut agent));
        }
        assert_eq!(agent.core.pos(), start);
        assert!(!agent.core.is_stunned());
        fixture.tick(&mut agent);
        assert_ne!(agent.core.pos(), start);
    }

    #[test]
    fn invisible_player_wipes_memory_and_cannot_be_caught() {
        let mut fixture = Fixture::new(&OPEN_ROW, (3, 1));
        let mut agent = fixture.agent(AgentKind::Ambusher, 1, (3, 1));
        agent.core.memory.refresh((fixture.player.x, fixture.player.y), 180.0);
        fixture.player.invisible_ticks = 100;
        assert!(!fixture.tick(&mut agent));
        assert!(!agent.core.memory.chasing);
        assert_eq!(agent.core.memory.last_seen, None);
    }

    #[test]
    fn sighting_in_open_corridor_starts_a_chase() {
        let mut fixture = Fixture::new(&OPEN_ROW, (12, 1));
        let mut agent = fixture.agent(AgentKind::Ambusher, 1, (4, 1));
        for _ in 0..3 {
            fixture.tick(&mut agent);
        }
        assert!(agent.core.memory.chasing);
        assert_eq!(agent.core.dir, Dir::Right);
    }

    #[test]
    fn agents_wrap_through_the_tunnel() {
        let mut fixture = Fixture::new(&["#####", "     ", "#####"], (2, 1));
        fixture.player.invisible_ticks = 1_000;
        let mut agent = fixture.agent(AgentKind::Ambusher, 1, (0, 1));
        agent.core.x = -11.0;
        agent.core.dir = Dir::Left;
        fixture.tick(&mut agent);
        assert!(agent.core.x > fixture.grid.width_px());
    }

    #[test]
    fn pinned_chaser_falls_back_to_wander_for_a_while() {
        let mut fixture = Fixture::new(&["#####", "#.#.#", "#####"], (3, 1));
        let mut agent = fixture.agent(AgentKind::Hunter, 1, (1, 1));
        let start = agent.core.pos();

        for _ in 0..STUCK_CHECK_TICKS as usize {
            fixture.tick(&mut agent);
        }
        assert!(agent.core.memory.chasing);
        assert_eq!(agent.core.stuck.override_ticks, 0.0);

        fixture.tick(&mut agent);
        assert_eq!(agent.core.pos(), start);
        assert_eq!(agent.core.stuck.override_ticks, STUCK_OVERRIDE_TICKS);
        assert_eq!(agent.core.dir, Dir::None);

        for _ in 0..STUCK_OVERRIDE_TICKS as usize {
            fixture.tick(&mut agent);
        }
        assert_eq!(agent.core.stuck.override_ticks, 0.0);
        assert_eq!(agent.core.stuck.anchor, start);
    }
}
