use super::*;
use crate::effects::{Effect, EffectKind};
use crate::types::GeminiPhase;

/// Where a clone may appear, relative to the primary's cell, in order.
const CLONE_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
];

/// Splitter/merger. The primary owns the lineage state; a clone mirrors the
/// primary's phase and shares its sightings.
#[derive(Clone, Debug)]
pub struct Gemini {
    pub phase: GeminiPhase,
}

impl Default for Gemini {
    fn default() -> Self {
        Self {
            phase: GeminiPhase::Merged,
        }
    }
}

impl Gemini {
    pub fn split() -> Self {
        Self {
            phase: GeminiPhase::Split,
        }
    }

    fn clone_position(core: &AgentCore, grid: &Grid) -> (f32, f32) {
        let (col, row) = core.tile(grid);
        CLONE_OFFSETS
            .iter()
            .map(|(dx, dy)| (col + dx, row + dy))
            .find(|&(c, r)| grid.is_open(c, r))
            .map(|(c, r)| (grid.center_of(c), grid.center_of(r)))
            .unwrap_or(core.pos())
    }

    fn start_split(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        self.phase = GeminiPhase::Split;
        core.ability_timer = ctx.config.split_duration;
        let (x, y) = Self::clone_position(core, ctx.grid);
        ctx.commands.push(AgentCommand::SpawnClone {
            primary: core.id,
            x,
            y,
            dir: core.dir.opposite(),
            memory: core.memory,
        });
        ctx.effects
            .push(Effect::at(EffectKind::Shockwave, core.x, core.y, 30));
    }

    fn merge(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>, clone: AgentId) {
        self.phase = GeminiPhase::Merged;
        core.ability_timer = ctx.config.merged_duration;
        core.twin = None;
        core.memory.forget();
        ctx.commands.push(AgentCommand::Despawn(clone));
        ctx.events.push(SimEvent::AgentMerged {
            primary: core.id,
            clone,
        });
        ctx.effects
            .push(Effect::at(EffectKind::Shockwave, core.x, core.y, 30));
    }
}

impl AgentBehavior for Gemini {
    fn tick_ability(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.tick_ability_timer(ctx.time_scale);

        if core.is_clone {
            if let Some(primary) = ctx.twin.as_deref().and_then(|twin| twin.behavior.gemini()) {
                self.phase = primary.phase;
            }
            return;
        }

        match self.phase {
            GeminiPhase::Merged => {
                let sharp = core.memory.state(ctx.config.memory_duration) == MemoryState::Seeing;
                if core.ability_timer <= 0.0 && core.memory.chasing && sharp {
                    self.start_split(core, ctx);
                }
            }
            GeminiPhase::Split | GeminiPhase::Merging => {
                let Some((clone_id, clone_pos)) =
                    ctx.twin.as_deref().map(|twin| (twin.core.id, twin.core.pos()))
                else {
                    self.phase = GeminiPhase::Merged;
                    core.twin = None;
                    core.ability_timer = ctx.config.merged_duration;
                    return;
                };
                let should_merge = core.ability_timer <= 0.0 || !core.memory.chasing;
                if !should_merge {
                    self.phase = GeminiPhase::Split;
                    return;
                }
                self.phase = GeminiPhase::Merging;
                if ctx.tiles_between(core.pos(), clone_pos) <= ctx.config.merge_distance {
                    self.merge(core, ctx, clone_id);
                }
            }
        }
    }

    fn update_memory(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        if !core.observe(ctx) {
            return;
        }
        let seen = ctx.player_pos();
        let duration = ctx.config.memory_duration;
        if let Some(twin) = ctx.twin.as_deref_mut() {
            twin.core.memory.refresh(seen, duration);
        }
    }

    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        if self.phase == GeminiPhase::Merging {
            if let Some(twin_pos) = ctx.twin.as_deref().map(|twin| twin.core.pos()) {
                return Some(core.pursue(ctx, twin_pos));
            }
        }
        let target = target?;
        if self.phase == GeminiPhase::Split && core.is_clone {
            let (px, py) = ctx.player_pos();
            let angle = (py - core.y).atan2(px - core.x) + std::f32::consts::FRAC_PI_2;
            let reach = ctx.config.flank_distance * ctx.grid.tile_size();
            return Some(core.pursue(ctx, (px + angle.cos() * reach, py + angle.sin() * reach)));
        }
        Some(core.pursue(ctx, target))
    }
}
