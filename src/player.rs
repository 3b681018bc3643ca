use crate::config::SimConfig;
use crate::grid::Grid;
use crate::types::{Dir, PlayerView};

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub dir: Dir,
    pub next_dir: Dir,
    pub rotation: f32,
    pub blink_cooldown: u32,
    pub stun_cooldown: u32,
    pub invis_cooldown: u32,
    pub invisible_ticks: u32,
}

/// Start and landing points of a successful blink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlinkOutcome {
    pub from: (f32, f32),
    pub to: (f32, f32),
}

impl Player {
    pub fn spawn_at(grid: &Grid, col: i32, row: i32) -> Self {
        Self {
            x: grid.center_of(col),
            y: grid.center_of(row),
            dir: Dir::None,
            next_dir: Dir::None,
            rotation: 0.0,
            blink_cooldown: 0,
            stun_cooldown: 0,
            invis_cooldown: 0,
            invisible_ticks: 0,
        }
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible_ticks > 0
    }

    pub fn tile(&self, grid: &Grid) -> (i32, i32) {
        (grid.tile_of(self.x), grid.tile_of(self.y))
    }

    /// Applies a movement intent. Facing changes at once; a reversal or a
    /// turn into an open cell is taken immediately, anything else waits in
    /// the buffer until the next junction.
    pub fn steer(&mut self, grid: &Grid, dir: Dir) {
        let Some(rotation) = dir.rotation() else {
            return;
        };
        self.rotation = rotation;

        if !self.dir.is_none() && dir == self.dir.opposite() {
            self.dir = dir;
            self.next_dir = Dir::None;
            return;
        }

        let (col, row) = self.tile(grid);
        let (dx, dy) = dir.delta();
        if !grid.is_wall(col + dx, row + dy, false) {
            self.dir = dir;
            self.next_dir = Dir::None;
        } else {
            self.next_dir = dir;
        }
    }

    pub fn update(&mut self, grid: &Grid, config: &SimConfig) {
        let width = grid.width_px();
        let half = grid.tile_size() / 2.0;
        if self.x < 0.0 {
            self.x = width - half;
            return;
        }
        if self.x > width {
            self.x = half;
            return;
        }

        let center_x = grid.snap(self.x);
        let center_y = grid.snap(self.y);

        if !self.next_dir.is_none() {
            let to_center = (self.x - center_x).hypot(self.y - center_y);
            if to_center <= grid.tile_size() * config.turn_tolerance {
                let (dx, dy) = self.next_dir.delta();
                let (col, row) = self.tile(grid);
                if !grid.is_wall(col + dx, row + dy, false) {
                    self.x = center_x;
                    self.y = center_y;
                    self.dir = self.next_dir;
                    self.next_dir = Dir::None;
                }
            }
        }

        let (dx, dy) = self.dir.delta();
        let next_x = self.x + dx as f32 * config.player_speed;
        let next_y = self.y + dy as f32 * config.player_speed;
        let lead_col = grid.tile_of(next_x + dx as f32 * half);
        let lead_row = grid.tile_of(next_y + dy as f32 * half);

        if grid.is_wall(lead_col, lead_row, false) {
            self.x = center_x;
            self.y = center_y;
            return;
        }
        self.x = next_x;
        self.y = next_y;
        if dx != 0 {
            self.y = center_y;
        }
        if dy != 0 {
            self.x = center_x;
        }
    }

    /// Teleports along the facing angle. A failed search leaves the player
    /// in place with the cooldown untouched.
    pub fn try_blink(&mut self, grid: &Grid, config: &SimConfig, score: u32) -> Option<BlinkOutcome> {
        if self.blink_cooldown > 0 || score < config.unlock_score_blink {
            return None;
        }
        let distance = (config.blink_distance as f32) * grid.tile_size();
        let dx = self.rotation.cos().round();
        let dy = self.rotation.sin().round();
        let land_x = wrap_axis(self.x + dx * distance, grid.width_px());
        let land_y = wrap_axis(self.y + dy * distance, grid.height_px());

        let to = grid.find_nearest_open(land_x, land_y, config.blink_search_radius)?;
        let from = (self.x, self.y);
        self.x = to.0;
        self.y = to.1;
        self.blink_cooldown = config.blink_cooldown;
        Some(BlinkOutcome { from, to })
    }

    /// Starts the stun cooldown; the caller applies the stun to agents.
    pub fn try_stun(&mut self, config: &SimConfig, score: u32) -> bool {
        if self.stun_cooldown > 0 || score < config.unlock_score_stun {
            return false;
        }
        self.stun_cooldown = config.stun_cooldown;
        true
    }

    pub fn try_invisibility(&mut self, config: &SimConfig, score: u32) -> bool {
        if self.invis_cooldown > 0 || score < config.unlock_score_invis {
            return false;
        }
        self.invisible_ticks = config.invis_duration;
        self.invis_cooldown = config.invis_cooldown;
        true
    }

    pub fn tick_cooldowns(&mut self) {
        self.blink_cooldown = self.blink_cooldown.saturating_sub(1);
        self.stun_cooldown = self.stun_cooldown.saturating_sub(1);
        self.invis_cooldown = self.invis_cooldown.saturating_sub(1);
        self.invisible_ticks = self.invisible_ticks.saturating_sub(1);
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.x,
            y: self.y,
            dir: self.dir,
            rotation: self.rotation,
            invisible: self.is_invisible(),
            blink_cooldown: self.blink_cooldown,
            stun_cooldown: self.stun_cooldown,
            invis_cooldown: self.invis_cooldown,
        }
    }
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if value < 0.0 {
        extent + value
    } else if value > extent {
        value - extent
    } else {
        value
    }
}
