use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Dir {
    /// Axis directions in the order every search enumerates them.
    pub const AXES: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
            Dir::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
            Dir::None => Dir::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Dir::None
    }

    /// Facing angle in radians, 0 = right, clockwise with y pointing down.
    pub fn rotation(self) -> Option<f32> {
        match self {
            Dir::Right => Some(0.0),
            Dir::Left => Some(std::f32::consts::PI),
            Dir::Down => Some(std::f32::consts::FRAC_PI_2),
            Dir::Up => Some(-std::f32::consts::FRAC_PI_2),
            Dir::None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Empty,
    Wall,
    Collectible,
}

impl Tile {
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Wall => '#',
            Tile::Collectible => '.',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Hunter,
    Ambusher,
    Speedster,
    Glitch,
    Phantom,
    Gemini,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeminiPhase {
    Merged,
    Split,
    Merging,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AgentId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "dir", rename_all = "snake_case")]
pub enum Intent {
    Move(Dir),
    Blink,
    Stun,
    Invisibility,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Dir,
    pub rotation: f32,
    pub invisible: bool,
    #[serde(rename = "blinkCooldown")]
    pub blink_cooldown: u32,
    #[serde(rename = "stunCooldown")]
    pub stun_cooldown: u32,
    #[serde(rename = "invisCooldown")]
    pub invis_cooldown: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub color: &'static str,
    pub x: f32,
    pub y: f32,
    pub dir: Dir,
    pub stunned: bool,
    pub phasing: bool,
    pub chasing: bool,
    #[serde(rename = "geminiPhase", skip_serializing_if = "Option::is_none")]
    pub gemini_phase: Option<GeminiPhase>,
    #[serde(rename = "isClone")]
    pub is_clone: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    CollectibleTaken {
        col: i32,
        row: i32,
        score: u32,
    },
    AgentSpawned {
        id: AgentId,
        kind: AgentKind,
    },
    AgentSplit {
        primary: AgentId,
        clone: AgentId,
    },
    AgentMerged {
        primary: AgentId,
        clone: AgentId,
    },
    AgentTeleported {
        id: AgentId,
    },
    PhaseChanged {
        id: AgentId,
        phasing: bool,
    },
    AgentsStunned {
        count: usize,
    },
    PlayerBlinked {
        x: f32,
        y: f32,
    },
    LevelCleared {
        bonus: u32,
        score: u32,
    },
    GameOver {
        score: u32,
        #[serde(rename = "caughtBy")]
        caught_by: AgentId,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    pub score: u32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    pub cols: i32,
    pub rows: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    pub tiles: Vec<String>,
    pub player: PlayerView,
    pub agents: Vec<AgentView>,
    #[serde(rename = "effectCount")]
    pub effect_count: usize,
    pub events: Vec<SimEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub seed: u32,
    pub score: u32,
    #[serde(rename = "durationTicks")]
    pub duration_ticks: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "agentsSpawned")]
    pub agents_spawned: u32,
    #[serde(rename = "levelsCleared")]
    pub levels_cleared: u32,
    #[serde(rename = "caughtBy", skip_serializing_if = "Option::is_none")]
    pub caught_by: Option<AgentKind>,
}
