use super::*;

/// Direct chaser. Always knows where the player is and never slows down
/// from losing track.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hunter;

impl AgentBehavior for Hunter {
    fn update_memory(&mut self, core: &mut AgentCore, ctx: &mut TickContext<'_>) {
        core.wander_timer += ctx.time_scale;
        if ctx.player.is_invisible() {
            core.memory.forget();
            return;
        }
        core.memory
            .refresh(ctx.player_pos(), ctx.config.memory_duration);
    }

    fn speed(&self, _core: &AgentCore, ctx: &TickContext<'_>) -> f32 {
        AgentCore::surge_or_base(ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::agent::testing::Fixture;
    use crate::types::AgentKind;

    #[test]
    fn tracks_the_player_through_walls() {
        let mut fixture = Fixture::new(
            &[
                "#######", //
                "#.....#", //
                "#.###.#", //
                "#.....#", //
                "#######",
            ],
            (5, 3),
        );
        let mut hunter = fixture.agent(AgentKind::Hunter, 1, (1, 1));
        fixture.tick(&mut hunter);
        assert!(hunter.core.memory.chasing);
        assert_eq!(
            hunter.core.memory.last_seen,
            Some((fixture.player.x, fixture.player.y))
        );
    }

    #[test]
    fn closes_distance_every_tick_until_the_catch() {
        let mut fixture = Fixture::new(
            &[
                "#########", //
                "#.......#", //
                "#########",
            ],
            (7, 1),
        );
        let mut hunter = fixture.agent(AgentKind::Hunter, 1, (2, 1));
        let player = (fixture.player.x, fixture.player.y);
        let mut last = hunter.core.distance_to(player);
        let mut caught = false;
        for _ in 0..200 {
            if fixture.tick(&mut hunter) {
                caught = true;
                break;
            }
            let now = hunter.core.distance_to(player);
            assert!(now < last);
            last = now;
        }
        assert!(caught);
    }
}
