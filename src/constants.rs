use crate::types::AgentKind;

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: f64 = 1000.0 / TICK_RATE as f64;
pub const MAX_TIME_SCALE: f32 = 2.0;

pub const TILE_SIZE: f32 = 32.0;
pub const COLS: i32 = 21;
pub const ROWS: i32 = 17;

pub const PLAYER_SPEED: f32 = 2.5;
pub const TURN_TOLERANCE_TILES: f32 = 0.4;

pub const BLINK_COOLDOWN: u32 = 5 * 60;
pub const BLINK_DISTANCE_TILES: i32 = 4;
pub const BLINK_SEARCH_RADIUS: i32 = 4;
pub const STUN_COOLDOWN: u32 = 9 * 60;
pub const STUN_RADIUS_TILES: f32 = 7.0;
pub const STUN_DURATION: f32 = 3.0 * 60.0;
pub const INVIS_COOLDOWN: u32 = 13 * 60;
pub const INVIS_DURATION: u32 = 3 * 60;

pub const UNLOCK_SCORE_BLINK: u32 = 0;
pub const UNLOCK_SCORE_STUN: u32 = 0;
pub const UNLOCK_SCORE_INVIS: u32 = 0;

pub const GHOST_BASE_SPEED: f32 = 2.5;
pub const GHOST_SURGE_SPEED: f32 = 5.0;
pub const SURGE_CYCLE: u64 = 7_200;
pub const SURGE_START: u64 = 6_900;
pub const GHOST_VISION_RANGE: f32 = 10.0;
pub const GHOST_MEMORY_DURATION: f32 = 180.0;
pub const GHOST_WANDER_CHANGE_DIR: f32 = 3.0 * 60.0;
pub const VISION_CHECK_INTERVAL: u32 = 3;
pub const CATCH_DISTANCE_TILES: f32 = 0.6;
pub const TUNNEL_OVERSHOOT: f32 = 10.0;

pub const STUCK_CHECK_TICKS: f32 = 60.0;
pub const STUCK_OVERRIDE_TICKS: f32 = 45.0;
pub const PATH_RECALC_INTERVAL: u32 = 15;

pub const ASTAR_MAX_NODES: usize = 400;
pub const ASTAR_MAX_DISTANCE: i32 = 20;

pub const AMBUSH_LEAD_TILES: f32 = 4.0;

pub const SPEEDSTER_CLOSE_TILES: f32 = 3.0;
pub const SPEEDSTER_MEDIUM_TILES: f32 = 10.0;
pub const SPEEDSTER_SLOW_MULTIPLIER: f32 = 0.75;
pub const SPEEDSTER_BURST_INTERVAL: f32 = 4.0 * 60.0;
pub const SPEEDSTER_BURST_DURATION: f32 = 45.0;

pub const GLITCH_INITIAL_TIMER: f32 = 180.0;
pub const GLITCH_TELEPORT_MIN_DISTANCE: f32 = 6.0;
pub const GLITCH_POST_TELEPORT_SLOW: f32 = 40.0;

pub const PHANTOM_PHASE_DURATION: f32 = 3.0 * 60.0;
pub const PHANTOM_COOLDOWN: f32 = 5.0 * 60.0;
pub const PHANTOM_SCAN_INTERVAL: f32 = 90.0;
pub const PHANTOM_SCAN_RANGE: f32 = 6.0;

pub const GEMINI_SPLIT_DURATION: f32 = 10.0 * 60.0;
pub const GEMINI_MERGED_DURATION: f32 = 30.0 * 60.0;
pub const GEMINI_MERGE_DISTANCE: f32 = 3.0;
pub const GEMINI_FLANK_TILES: f32 = 3.0;

pub const DOT_POINTS: u32 = 10;
pub const LEVEL_CLEAR_BONUS: u32 = 500;
pub const LEVEL_LATCH_TICKS: u32 = 6;
pub const SPAWN_SCORE_STEP: u32 = 35;
pub const INITIAL_AGENTS: usize = 4;
pub const SPAWN_MIN_DISTANCE_TILES: f32 = 10.0;
pub const MAZE_LOOP_CHANCE: f32 = 0.15;

pub const MAX_TICKS_PER_FRAME: u32 = 5;

pub const SPAWN_ORDER: [AgentKind; 6] = [
    AgentKind::Ambusher,
    AgentKind::Glitch,
    AgentKind::Phantom,
    AgentKind::Speedster,
    AgentKind::Hunter,
    AgentKind::Gemini,
];

pub fn agent_color(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Hunter => "#ff007c",
        AgentKind::Speedster => "#00ffff",
        AgentKind::Ambusher => "#ffffff",
        AgentKind::Glitch => "#ffaa00",
        AgentKind::Gemini => "#2123cf",
        AgentKind::Phantom => "#8a2be2",
    }
}

pub fn spawn_kind_at(index: usize) -> AgentKind {
    SPAWN_ORDER[index % SPAWN_ORDER.len()]
}

/// Number of score-gated spawns earned at `score`.
pub fn spawn_budget_for_score(score: u32, step: u32) -> u32 {
    if step == 0 {
        return 0;
    }
    score / step
}
