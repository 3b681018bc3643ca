use super::*;
use crate::effects::{Effect, EffectKind};

/// Teleporter. Jumps across the maze while searching and tries to land in
/// the player's path while chasing.
#[derive(Clone, Debug, Default)]
pub struct Glitch {
    pub slow_ticks: f32,
}

impl Glitch {
    fn random_landing(core: &AgentCore, ctx: &mut TickContext<'_>) -> Option<(i32, i32)> {
        let player = ctx.player_pos();
        for _ in 0..10 {
            let col = ctx.rng.int(0, ctx.grid.cols() - 1);
            let row = ctx.rng.int(0, ctx.grid.rows() - 1);
            if !ctx.grid.is_open(col, row) || (col, row) == core.tile(ctx.grid) {
                continue;
            }
            let cell = (ctx.grid.center_of(col), ctx.grid.center_of(row));
            if ctx.tiles_between(cell, player) > ctx.config.teleport_min_distance {
                return Some((col, row));
            }
        }
        None
    }

    /// Open cell three or four tiles along the player's facing.
    fn ahead_landing(core: &AgentCore, ctx: &TickContext<'_>) -> Option<(i32, i32)> {
        let dx = ctx.player.rotation.cos().round() as i32;
        let dy = ctx.player.rotation.sin().round() as i32;
        let (pc, pr) = ctx.player.tile(ctx.grid);
        [4, 3]
            .into_iter()
            .map(|lead| (pc + dx * lead, pr + dy * lead))
            .find(|&(col, row)| ctx.grid.is_open(col, row) && (col, row) != core.tile(ctx.grid))
    }

    fn teleport(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>, col: i32, row: i32) {
        ctx.effects
            .push(Effect::at(EffectKind::Glitch, core.x, core.y, 10));
        core.teleport(ctx.grid.center_of(col), ctx.grid.center_of(row));
        ctx.effects
            .push(Effect::at(EffectKind::Glitch, core.x, core.y, 10));
        core.ability_timer = 600.0 + ctx.rng.next_f32() * 300.0;
        self.slow_ticks = ctx.config.post_teleport_slow;
        core.dir = greedy_direction(ctx.grid, core.pos(), Dir::None, ctx.player_pos(), false);
        ctx.events.push(SimEvent::AgentTeleported { id: core.id });
    }
}

impl AgentBehavior for Glitch {
    fn tick_ability(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.tick_ability_timer(ctx.time_scale);
        self.slow_ticks = (self.slow_ticks - ctx.time_scale).max(0.0);
        if core.ability_timer > 0.0 {
            return;
        }
        let landing = if core.memory.chasing && !ctx.player.is_invisible() {
            Self::ahead_landing(core, ctx).or_else(|| Self::random_landing(core, ctx))
        } else {
            Self::random_landing(core, ctx)
        };
        if let Some((col, row)) = landing {
            self.teleport(core, ctx, col, row);
        }
    }

    fn speed(&self, core: &AgentCore, ctx: &TickContext<'_>) -> f32 {
        let base = core.base_speed(ctx);
        if self.slow_ticks > 0.0 {
            base * 0.5
        } else {
            base
        }
    }

    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        let (tx, ty) = target?;
        let tile = ctx.grid.tile_size();
        let jitter_x = (ctx.rng.next_f32() - 0.5) * 2.0 * tile;
        let jitter_y = (ctx.rng.next_f32() - 0.5) * 2.0 * tile;
        Some(core.pursue(ctx, (tx + jitter_x, ty + jitter_y)))
    }
}
