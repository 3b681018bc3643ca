use super::*;
use crate::effects::{Effect, EffectKind};

/// Phase retry delay when a phase ends inside a wall.
const PHASE_EXIT_RETRY: f32 = 5.0;

/// Wall-phaser. Once its cooldown is over, a known target starts a phase in
/// which it moves through walls straight at that target.
#[derive(Clone, Debug, Default)]
pub struct Phantom {
    pub phasing: bool,
    scan_clock: f32,
    locked_on: bool,
    toggled: bool,
}

impl Phantom {
    fn begin_phase(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        self.phasing = true;
        self.toggled = true;
        self.locked_on = false;
        core.ability_timer = ctx.config.phase_duration;
        ctx.effects
            .push(Effect::at(EffectKind::Shockwave, core.x, core.y, 20));
        ctx.events.push(SimEvent::PhaseChanged {
            id: core.id,
            phasing: true,
        });
    }

    fn try_end_phase(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        let (col, row) = core.tile(ctx.grid);
        if ctx.grid.is_wall(col, row, false) {
            core.ability_timer = PHASE_EXIT_RETRY;
            return;
        }
        self.phasing = false;
        self.toggled = true;
        self.locked_on = false;
        core.ability_timer = ctx.config.phase_cooldown;
        core.x = ctx.grid.snap(core.x);
        core.y = ctx.grid.snap(core.y);
        ctx.events.push(SimEvent::PhaseChanged {
            id: core.id,
            phasing: false,
        });
    }

    /// Through-wall proximity sense. A hit refreshes memory like a sighting.
    fn scan(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) -> bool {
        self.scan_clock += ctx.time_scale;
        if self.scan_clock < ctx.config.scan_interval {
            return false;
        }
        self.scan_clock = 0.0;
        if ctx.player.is_invisible() {
            return false;
        }
        let (ac, ar) = core.tile(ctx.grid);
        let (pc, pr) = ctx.player.tile(ctx.grid);
        let tiles = ((ac - pc) as f32).hypot((ar - pr) as f32);
        if tiles > ctx.config.scan_range {
            return false;
        }
        core.memory
            .refresh(ctx.player_pos(), ctx.config.memory_duration);
        true
    }
}

impl AgentBehavior for Phantom {
    fn tick_ability(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.tick_ability_timer(ctx.time_scale);
        self.toggled = false;

        if self.phasing {
            if core.memory.chasing {
                self.locked_on = true;
            }
            let lost_track = self.locked_on && !core.memory.chasing;
            if core.ability_timer <= 0.0 || lost_track {
                self.try_end_phase(core, ctx);
            }
            return;
        }

        let detected = self.scan(core, ctx);
        if core.ability_timer <= 0.0 && (detected || core.memory.chasing) {
            self.begin_phase(core, ctx);
        }
    }

    fn speed(&self, core: &AgentCore, ctx: &TickContext<'_>) -> f32 {
        if self.phasing {
            ctx.config.ghost_speed * 0.6
        } else {
            core.base_speed(ctx)
        }
    }

    /// Phasing ignores cell centers, so every phasing tick re-aims.
    fn forces_redecision(&self, _core: &AgentCore) -> bool {
        self.phasing || self.toggled
    }

    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        let target = target?;
        if self.phasing {
            return Some(greedy_direction(ctx.grid, core.pos(), core.dir, target, true));
        }
        Some(core.pursue(ctx, target))
    }

    fn passes_walls(&self) -> bool {
        self.phasing
    }
}
