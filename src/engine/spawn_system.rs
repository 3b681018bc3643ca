use super::*;

use crate::constants::spawn_kind_at;

impl Simulation {
    pub(super) fn spawn_initial_agents(&mut self) {
        for _ in 0..self.config.initial_agents {
            self.spawn_next_agent();
        }
    }

    /// Spawns the next kind in the rotation. The rotation advances even when
    /// no free cell exists.
    pub(super) fn spawn_next_agent(&mut self) -> Option<AgentId> {
        let kind = spawn_kind_at(self.spawn_index);
        self.spawn_index += 1;
        let (col, row) = self.pick_agent_spawn_cell()?;
        Some(self.place_agent(kind, col, row))
    }

    pub(super) fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        id
    }

    pub(super) fn is_cell_occupied_by_agent(&self, col: i32, row: i32) -> bool {
        self.agents
            .iter()
            .any(|agent| agent.core.tile(&self.grid) == (col, row))
    }

    /// Prefers open cells far from the player and falls back to any free
    /// open cell.
    pub(super) fn pick_agent_spawn_cell(&mut self) -> Option<(i32, i32)> {
        let free: Vec<(i32, i32)> = self
            .grid
            .open_cells()
            .into_iter()
            .filter(|&(col, row)| !self.is_cell_occupied_by_agent(col, row))
            .collect();
        let tile = self.grid.tile_size();
        let player = (self.player.x / tile, self.player.y / tile);
        let far: Vec<(i32, i32)> = free
            .iter()
            .copied()
            .filter(|&(col, row)| {
                let center = (col as f32 + 0.5, row as f32 + 0.5);
                tile_distance(center, player) > self.config.spawn_min_distance
            })
            .collect();

        let pool = if far.is_empty() { free } else { far };
        if pool.is_empty() {
            return None;
        }
        Some(pool[self.rng.pick_index(pool.len())])
    }

    pub(super) fn apply_agent_commands(&mut self, commands: Vec<AgentCommand>) {
        for command in commands {
            match command {
                AgentCommand::SpawnClone {
                    primary,
                    x,
                    y,
                    dir,
                    memory,
                } => {
                    let Some(index) = self.index_of(primary) else {
                        continue;
                    };
                    let clone = self.allocate_agent_id();
                    self.agents[index].core.twin = Some(clone);
                    self.agents.push(Agent::gemini_clone(
                        clone,
                        primary,
                        (x, y),
                        dir,
                        memory,
                        &self.config,
                    ));
                    self.events.push(SimEvent::AgentSplit { primary, clone });
                }
                AgentCommand::Despawn(id) => {
                    self.agents.retain(|agent| agent.id() != id);
                    for agent in &mut self.agents {
                        if agent.core.twin == Some(id) {
                            agent.core.twin = None;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::agent::{AgentCommand, Memory};
    use crate::config::SimConfig;
    use crate::engine::Simulation;
    use crate::types::{AgentId, AgentKind, Dir, SimEvent};

    const ROOM: [&str; 5] = [
        "#####", //
        "#...#", //
        "#...#", //
        "#...#", //
        "#####",
    ];

    #[test]
    fn spawn_skips_occupied_cells_and_stops_when_full() {
        let mut sim = Simulation::from_layout(SimConfig::default(), 4, &ROOM, (2, 2)).expect("sim");
        let mut placed = Vec::new();
        for _ in 0..9 {
            placed.push(sim.spawn_next_agent());
        }
        assert!(placed.iter().all(Option::is_some));
        let mut tiles: Vec<(i32, i32)> = sim
            .agents()
            .iter()
            .map(|agent| agent.core.tile(sim.grid()))
            .collect();
        tiles.sort();
        tiles.dedup();
        assert_eq!(tiles.len(), 9);

        assert_eq!(sim.spawn_next_agent(), None);
        assert_eq!(sim.spawn_index, 10);
    }

    #[test]
    fn spawn_prefers_cells_far_from_player() {
        let rows = [
            "##################", //
            "#................#", //
            "##################",
        ];
        let mut sim = Simulation::from_layout(SimConfig::default(), 8, &rows, (1, 1)).expect("sim");
        for _ in 0..4 {
            let cell = sim.pick_agent_spawn_cell().expect("cell");
            assert!(cell.0 >= 12, "spawned too close at {cell:?}");
        }
    }

    #[test]
    fn rotation_follows_the_fixed_order() {
        let mut sim = Simulation::from_layout(SimConfig::default(), 2, &ROOM, (2, 2)).expect("sim");
        for _ in 0..7 {
            sim.spawn_next_agent();
        }
        let kinds: Vec<AgentKind> = sim.agents().iter().map(|agent| agent.kind()).collect();
        assert_eq!(kinds[0], AgentKind::Ambusher);
        assert_eq!(kinds[5], AgentKind::Gemini);
        assert_eq!(kinds[6], AgentKind::Ambusher);
    }

    #[test]
    fn clone_commands_link_both_bodies() {
        let mut sim = Simulation::from_layout(SimConfig::default(), 6, &ROOM, (1, 1)).expect("sim");
        let primary = sim.place_agent(AgentKind::Gemini, 3, 3);
        sim.apply_agent_commands(vec![AgentCommand::SpawnClone {
            primary,
            x: 80.0,
            y: 48.0,
            dir: Dir::Left,
            memory: Memory::default(),
        }]);
        let clone = AgentId(primary.0 + 1);
        assert_eq!(sim.agent(primary).and_then(|agent| agent.core.twin), Some(clone));
        let body = sim.agent(clone).expect("clone exists");
        assert!(body.core.is_clone);
        assert_eq!(body.core.twin, Some(primary));
        assert_eq!(sim.summary().agents_spawned, 1);
        assert!(sim
            .build_snapshot(true)
            .events
            .iter()
            .any(|event| matches!(event, SimEvent::AgentSplit { .. })));

        sim.apply_agent_commands(vec![AgentCommand::Despawn(clone)]);
        assert!(sim.agent(clone).is_none());
        assert_eq!(sim.agent(primary).and_then(|agent| agent.core.twin), None);
    }
}
