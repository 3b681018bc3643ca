use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Errors raised when validating a simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid must be odd-sized and at least 5x5, got {cols}x{rows}")]
    InvalidDimensions { cols: i32, rows: i32 },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MazeAlgorithm {
    Kruskal,
    Backtracker,
}

/// Designer-tunable parameters. Timers are in ticks at 60 ticks per second,
/// distances in tiles unless the name says otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub cols: i32,
    pub rows: i32,
    pub tile_size: f32,
    pub maze_algorithm: MazeAlgorithm,
    pub loop_chance: f32,

    pub player_speed: f32,
    pub turn_tolerance: f32,
    pub blink_cooldown: u32,
    pub blink_distance: i32,
    pub blink_search_radius: i32,
    pub stun_cooldown: u32,
    pub stun_radius: f32,
    pub stun_duration: f32,
    pub invis_cooldown: u32,
    pub invis_duration: u32,
    pub unlock_score_blink: u32,
    pub unlock_score_stun: u32,
    pub unlock_score_invis: u32,

    pub ghost_speed: f32,
    pub surge_speed: f32,
    pub vision_range: f32,
    pub memory_duration: f32,
    pub wander_change_ticks: f32,
    pub vision_check_interval: u32,
    pub catch_distance: f32,
    pub astar_max_nodes: usize,
    pub astar_max_distance: i32,

    pub ambush_lead: f32,
    pub speedster_close: f32,
    pub speedster_medium: f32,
    pub speedster_slow_multiplier: f32,
    pub burst_interval: f32,
    pub burst_duration: f32,
    pub teleport_min_distance: f32,
    pub post_teleport_slow: f32,
    pub phase_duration: f32,
    pub phase_cooldown: f32,
    pub scan_interval: f32,
    pub scan_range: f32,
    pub split_duration: f32,
    pub merged_duration: f32,
    pub merge_distance: f32,
    pub flank_distance: f32,

    pub dot_points: u32,
    pub level_clear_bonus: u32,
    pub level_latch_ticks: u32,
    pub spawn_score_step: u32,
    pub initial_agents: usize,
    pub spawn_min_distance: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cols: COLS,
            rows: ROWS,
            tile_size: TILE_SIZE,
            maze_algorithm: MazeAlgorithm::Kruskal,
            loop_chance: MAZE_LOOP_CHANCE,
            player_speed: PLAYER_SPEED,
            turn_tolerance: TURN_TOLERANCE_TILES,
            blink_cooldown: BLINK_COOLDOWN,
            blink_distance: BLINK_DISTANCE_TILES,
            blink_search_radius: BLINK_SEARCH_RADIUS,
            stun_cooldown: STUN_COOLDOWN,
            stun_radius: STUN_RADIUS_TILES,
            stun_duration: STUN_DURATION,
            invis_cooldown: INVIS_COOLDOWN,
            invis_duration: INVIS_DURATION,
            unlock_score_blink: UNLOCK_SCORE_BLINK,
            unlock_score_stun: UNLOCK_SCORE_STUN,
            unlock_score_invis: UNLOCK_SCORE_INVIS,
            ghost_speed: GHOST_BASE_SPEED,
            surge_speed: GHOST_SURGE_SPEED,
            vision_range: GHOST_VISION_RANGE,
            memory_duration: GHOST_MEMORY_DURATION,
            wander_change_ticks: GHOST_WANDER_CHANGE_DIR,
            vision_check_interval: VISION_CHECK_INTERVAL,
            catch_distance: CATCH_DISTANCE_TILES,
            astar_max_nodes: ASTAR_MAX_NODES,
            astar_max_distance: ASTAR_MAX_DISTANCE,
            ambush_lead: AMBUSH_LEAD_TILES,
            speedster_close: SPEEDSTER_CLOSE_TILES,
            speedster_medium: SPEEDSTER_MEDIUM_TILES,
            speedster_slow_multiplier: SPEEDSTER_SLOW_MULTIPLIER,
            burst_interval: SPEEDSTER_BURST_INTERVAL,
            burst_duration: SPEEDSTER_BURST_DURATION,
            teleport_min_distance: GLITCH_TELEPORT_MIN_DISTANCE,
            post_teleport_slow: GLITCH_POST_TELEPORT_SLOW,
            phase_duration: PHANTOM_PHASE_DURATION,
            phase_cooldown: PHANTOM_COOLDOWN,
            scan_interval: PHANTOM_SCAN_INTERVAL,
            scan_range: PHANTOM_SCAN_RANGE,
            split_duration: GEMINI_SPLIT_DURATION,
            merged_duration: GEMINI_MERGED_DURATION,
            merge_distance: GEMINI_MERGE_DISTANCE,
            flank_distance: GEMINI_FLANK_TILES,
            dot_points: DOT_POINTS,
            level_clear_bonus: LEVEL_CLEAR_BONUS,
            level_latch_ticks: LEVEL_LATCH_TICKS,
            spawn_score_step: SPAWN_SCORE_STEP,
            initial_agents: INITIAL_AGENTS,
            spawn_min_distance: SPAWN_MIN_DISTANCE_TILES,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols < 5 || self.rows < 5 || self.cols % 2 == 0 || self.rows % 2 == 0 {
            return Err(ConfigError::InvalidDimensions {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if !(self.tile_size >= 4.0) {
            return Err(ConfigError::InvalidValue {
                field: "tileSize",
                reason: "must be at least 4 pixels",
            });
        }
        if !(0.0..=1.0).contains(&self.loop_chance) {
            return Err(ConfigError::InvalidValue {
                field: "loopChance",
                reason: "must be a probability in [0, 1]",
            });
        }
        for (field, value) in [
            ("playerSpeed", self.player_speed),
            ("ghostSpeed", self.ghost_speed),
            ("surgeSpeed", self.surge_speed),
        ] {
            if !(value > 0.0) || value > self.tile_size * 0.5 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be positive and at most half a tile per tick",
                });
            }
        }
        if !(self.catch_distance > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "catchDistance",
                reason: "must be positive",
            });
        }
        if self.vision_check_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "visionCheckInterval",
                reason: "must be at least one tick",
            });
        }
        if self.astar_max_nodes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "astarMaxNodes",
                reason: "must allow at least one node",
            });
        }
        if self.blink_search_radius < 0 || self.blink_distance < 0 {
            return Err(ConfigError::InvalidValue {
                field: "blinkDistance",
                reason: "distances must not be negative",
            });
        }
        if self.stun_radius < 0.0 || self.stun_duration < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "stunRadius",
                reason: "stun radius and duration must not be negative",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MazeAlgorithm, SimConfig};

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn even_dimensions_are_rejected() {
        let config = SimConfig {
            cols: 20,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions { cols: 20, rows: 17 })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = SimConfig::from_json_str(
            r#"{"cols": 25, "rows": 19, "mazeAlgorithm": "backtracker", "stunRadius": 5.0}"#,
        )
        .expect("config parses");
        assert_eq!(config.cols, 25);
        assert_eq!(config.rows, 19);
        assert_eq!(config.maze_algorithm, MazeAlgorithm::Backtracker);
        assert_eq!(config.stun_radius, 5.0);
        assert_eq!(config.ghost_speed, SimConfig::default().ghost_speed);
    }

    #[test]
    fn speed_above_half_tile_is_rejected() {
        let config = SimConfig {
            ghost_speed: 40.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "ghostSpeed",
                ..
            })
        ));
    }
}
