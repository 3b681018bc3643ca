use super::*;

/// Predictor. Aims a few tiles ahead of the player's heading.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ambusher;

impl Ambusher {
    pub fn predicted_target(ctx: &TickContext<'_>) -> (f32, f32) {
        let (dx, dy) = ctx.player.dir.delta();
        let lead = ctx.config.ambush_lead * ctx.grid.tile_size();
        (
            ctx.player.x + dx as f32 * lead,
            ctx.player.y + dy as f32 * lead,
        )
    }
}

impl AgentBehavior for Ambusher {
    fn chase_step(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut TickContext<'_>,
        target: Option<(f32, f32)>,
    ) -> Option<Dir> {
        target.map(|_| core.pursue(ctx, Self::predicted_target(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::Ambusher;
    use crate::agent::testing::Fixture;
    use crate::agent::TickContext;
    use crate::types::{AgentKind, Dir};

    #[test]
    fn prediction_leads_the_player_heading() {
        let mut fixture = Fixture::new(
            &[
                "###########", //
                "#.........#", //
                "###########",
            ],
            (2, 1),
        );
        fixture.player.dir = Dir::Right;
        let ctx = TickContext {
            grid: &fixture.grid,
            player: &fixture.player,
            config: &fixture.config,
            rng: &mut fixture.rng,
            frame: 0,
            time_scale: 1.0,
            twin: None,
            effects: &mut fixture.effects,
            events: &mut fixture.events,
            commands: &mut fixture.commands,
        };
        let (x, y) = Ambusher::predicted_target(&ctx);
        assert_eq!(x, fixture.player.x + 4.0 * 32.0);
        assert_eq!(y, fixture.player.y);
    }

    #[test]
    fn cuts_ahead_instead_of_following() {
        let mut fixture = Fixture::new(
            &[
                "###########", //
                "#.........#", //
                "#.#######.#", //
                "#.........#", //
                "###########",
            ],
            (3, 1),
        );
        fixture.player.dir = Dir::Right;
        let mut ambusher = fixture.agent(AgentKind::Ambusher, 1, (9, 3));
        ambusher.core.memory.refresh((fixture.player.x, fixture.player.y), 180.0);
        ambusher.core.dir = Dir::None;
        fixture.tick(&mut ambusher);
        assert_eq!(ambusher.core.dir, Dir::Up);
    }
}
