use std::collections::{HashSet, VecDeque};

use crate::config::{MazeAlgorithm, SimConfig};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::Tile;

#[derive(Clone, Debug)]
pub struct GeneratedMaze {
    pub grid: Grid,
    pub tunnel_row: i32,
    pub player_spawn: (i32, i32),
}

pub fn generate_maze(config: &SimConfig, rng: &mut Rng) -> GeneratedMaze {
    let mut grid = Grid::filled(config.cols, config.rows, config.tile_size, Tile::Wall);
    match config.maze_algorithm {
        MazeAlgorithm::Kruskal => carve_kruskal(&mut grid, config.loop_chance, rng),
        MazeAlgorithm::Backtracker => {
            carve_backtracker(&mut grid, rng);
            carve_extra_openings(&mut grid, config.loop_chance, rng);
        }
    }

    let tunnel_row = tunnel_row_for(config.rows);
    for col in 1..config.cols - 1 {
        grid.set(col, tunnel_row, Tile::Collectible);
    }
    seal_border(&mut grid);
    grid.set(0, tunnel_row, Tile::Empty);
    grid.set(config.cols - 1, tunnel_row, Tile::Empty);

    let player_spawn = pick_player_spawn(&grid, rng);
    GeneratedMaze {
        grid,
        tunnel_row,
        player_spawn,
    }
}

pub fn tunnel_row_for(rows: i32) -> i32 {
    let center = rows / 2;
    if center % 2 == 0 {
        center
    } else {
        center - 1
    }
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Returns false when both already share a root.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    from: usize,
    to: usize,
    wall: (i32, i32),
}

fn lattice_index(grid: &Grid, col: i32, row: i32) -> usize {
    let lattice_cols = (grid.cols() - 1) / 2;
    ((row - 1) / 2 * lattice_cols + (col - 1) / 2) as usize
}

fn open_lattice(grid: &mut Grid) -> usize {
    let mut count = 0;
    for row in (1..grid.rows() - 1).step_by(2) {
        for col in (1..grid.cols() - 1).step_by(2) {
            grid.set(col, row, Tile::Collectible);
            count += 1;
        }
    }
    count
}

fn carve_kruskal(grid: &mut Grid, loop_chance: f32, rng: &mut Rng) {
    let cell_count = open_lattice(grid);
    let mut edges = Vec::new();
    for row in (1..grid.rows() - 1).step_by(2) {
        for col in (1..grid.cols() - 1).step_by(2) {
            let from = lattice_index(grid, col, row);
            if row > 1 {
                edges.push(Edge {
                    from,
                    to: lattice_index(grid, col, row - 2),
                    wall: (col, row - 1),
                });
            }
            if col > 1 {
                edges.push(Edge {
                    from,
                    to: lattice_index(grid, col - 2, row),
                    wall: (col - 1, row),
                });
            }
        }
    }
    rng.shuffle(&mut edges);

    let mut sets = DisjointSet::new(cell_count);
    for edge in edges {
        if sets.union(edge.from, edge.to) || rng.bool(loop_chance) {
            grid.set(edge.wall.0, edge.wall.1, Tile::Collectible);
        }
    }
}

fn carve_backtracker(grid: &mut Grid, rng: &mut Rng) {
    open_lattice(grid);
    let mut visited = HashSet::new();
    let mut stack = vec![(1, 1)];
    visited.insert((1, 1));

    while let Some(&(col, row)) = stack.last() {
        let mut neighbors = Vec::with_capacity(4);
        for (dx, dy) in [(0, -2), (0, 2), (-2, 0), (2, 0)] {
            let (nc, nr) = (col + dx, row + dy);
            if nc < 1 || nr < 1 || nc > grid.cols() - 2 || nr > grid.rows() - 2 {
                continue;
            }
            if !visited.contains(&(nc, nr)) {
                neighbors.push((nc, nr));
            }
        }
        if neighbors.is_empty() {
            stack.pop();
            continue;
        }
        let (nc, nr) = neighbors[rng.pick_index(neighbors.len())];
        grid.set((col + nc) / 2, (row + nr) / 2, Tile::Collectible);
        visited.insert((nc, nr));
        stack.push((nc, nr));
    }
}

fn carve_extra_openings(grid: &mut Grid, loop_chance: f32, rng: &mut Rng) {
    for row in 1..grid.rows() - 1 {
        for col in 1..grid.cols() - 1 {
            let separates_row = row % 2 == 1 && col % 2 == 0;
            let separates_col = row % 2 == 0 && col % 2 == 1;
            if !(separates_row || separates_col) {
                continue;
            }
            if grid.get(col, row) == Some(Tile::Wall) && rng.bool(loop_chance) {
                grid.set(col, row, Tile::Collectible);
            }
        }
    }
}

fn seal_border(grid: &mut Grid) {
    let (cols, rows) = (grid.cols(), grid.rows());
    for col in 0..cols {
        grid.set(col, 0, Tile::Wall);
        grid.set(col, rows - 1, Tile::Wall);
    }
    for row in 0..rows {
        grid.set(0, row, Tile::Wall);
        grid.set(cols - 1, row, Tile::Wall);
    }
}

fn pick_player_spawn(grid: &Grid, rng: &mut Rng) -> (i32, i32) {
    let center = grid.rows() / 2;
    let mut candidates = Vec::new();
    for row in 1..grid.rows() - 1 {
        if (row - center).abs() < 2 {
            continue;
        }
        for col in 1..grid.cols() - 1 {
            if grid.get(col, row) == Some(Tile::Collectible) {
                candidates.push((col, row));
            }
        }
    }
    if candidates.is_empty() {
        return (1, 1);
    }
    candidates[rng.pick_index(candidates.len())]
}

/// Flood fill over open cells, wrapping through the tunnel columns.
pub fn reachable_cells(grid: &Grid, start: (i32, i32)) -> HashSet<(i32, i32)> {
    let mut out = HashSet::new();
    if !grid.is_open(start.0, start.1) {
        return out;
    }
    let mut queue = VecDeque::new();
    out.insert(start);
    queue.push_back(start);
    while let Some((col, row)) = queue.pop_front() {
        for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
            let nc = (col + dx).rem_euclid(grid.cols());
            let nr = row + dy;
            if !grid.is_open(nc, nr) {
                continue;
            }
            if out.insert((nc, nr)) {
                queue.push_back((nc, nr));
            }
        }
    }
    out
}
