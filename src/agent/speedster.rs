use super::*;
use crate::effects::{Effect, EffectKind};

/// Proximity scaler: slow when far, fast at mid range, matching the player
/// up close. Idles into periodic bursts while it has no target.
#[derive(Clone, Debug, Default)]
pub struct Speedster {
    pub burst_ticks: f32,
    burst_clock: f32,
}

impl AgentBehavior for Speedster {
    fn tick_ability(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.tick_ability_timer(ctx.time_scale);
        if self.burst_ticks > 0.0 {
            self.burst_ticks = (self.burst_ticks - ctx.time_scale).max(0.0);
            if ctx.frame % 5 == 0 && !core.dir.is_none() {
                ctx.effects
                    .push(Effect::at(EffectKind::Afterimage, core.x, core.y, 20));
            }
            return;
        }
        if core.memory.chasing {
            self.burst_clock = 0.0;
            return;
        }
        self.burst_clock += ctx.time_scale;
        if self.burst_clock >= ctx.config.burst_interval {
            self.burst_clock = 0.0;
            self.burst_ticks = ctx.config.burst_duration;
        }
    }

    fn speed(&self, core: &AgentCore, ctx: &TickContext<'_>) -> f32 {
        if self.burst_ticks > 0.0 {
            return ctx.config.surge_speed;
        }
        let tiles = ctx.tiles_between(core.pos(), ctx.player_pos());
        if tiles < ctx.config.speedster_close {
            ctx.config.player_speed
        } else if tiles < ctx.config.speedster_medium {
            ctx.config.surge_speed
        } else {
            ctx.config.ghost_speed * ctx.config.speedster_slow_multiplier
        }
    }

    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        let (mut tx, ty) = target?;
        if ctx.tiles_between(core.pos(), ctx.player_pos()) > ctx.config.speedster_medium {
            let phase = ctx.frame as f32 * 0.01 + core.id.0 as f32;
            tx += phase.sin() * ctx.grid.tile_size() * 2.0;
        }
        Some(core.pursue(ctx, (tx, ty)))
    }
}
