use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::Dir;

#[derive(Clone, Copy, Debug)]
pub struct SearchLimits {
    pub max_nodes: usize,
    pub max_distance: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    seq: u32,
    g: u32,
    col: i32,
    row: i32,
    first: Dir,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn manhattan(ac: i32, ar: i32, bc: i32, br: i32) -> i32 {
    (ac - bc).abs() + (ar - br).abs()
}

/// First move of a shortest four-directional path from `from` to `to`
/// (pixel coordinates). `None` means either "already there" or "gave up";
/// callers fall back to [`greedy_direction`].
pub fn astar_first_step(
    grid: &Grid,
    from: (f32, f32),
    to: (f32, f32),
    limits: SearchLimits,
) -> Option<Dir> {
    let (start_col, start_row) = (grid.tile_of(from.0), grid.tile_of(from.1));
    let (target_col, target_row) = (grid.tile_of(to.0), grid.tile_of(to.1));
    if start_col == target_col && start_row == target_row {
        return None;
    }
    let distance = manhattan(start_col, start_row, target_col, target_row);
    if distance > limits.max_distance {
        return None;
    }
    let budget = limits.max_nodes.min(distance as usize * 20);

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<(i32, i32), u32> = HashMap::new();
    let mut closed: HashSet<(i32, i32)> = HashSet::new();
    let mut seq = 0u32;
    open.push(OpenNode {
        f: distance as u32,
        seq,
        g: 0,
        col: start_col,
        row: start_row,
        first: Dir::None,
    });
    best_g.insert((start_col, start_row), 0);

    let mut explored = 0usize;
    while let Some(current) = open.pop() {
        if !closed.insert((current.col, current.row)) {
            continue;
        }
        explored += 1;
        if explored > budget {
            return None;
        }
        if current.col == target_col && current.row == target_row {
            return Some(current.first);
        }

        for dir in Dir::AXES {
            let (dx, dy) = dir.delta();
            let (nc, nr) = (current.col + dx, current.row + dy);
            if !grid.in_bounds(nc, nr) || grid.is_wall(nc, nr, false) {
                continue;
            }
            if closed.contains(&(nc, nr)) {
                continue;
            }
            let g = current.g + 1;
            if best_g.get(&(nc, nr)).is_some_and(|known| *known <= g) {
                continue;
            }
            best_g.insert((nc, nr), g);
            seq += 1;
            open.push(OpenNode {
                f: g + manhattan(nc, nr, target_col, target_row) as u32,
                seq,
                g,
                col: nc,
                row: nr,
                first: if current.first.is_none() {
                    dir
                } else {
                    current.first
                },
            });
        }
    }
    None
}

fn blocked(grid: &Grid, col: i32, row: i32, ignore_walls: bool) -> bool {
    if ignore_walls {
        return !grid.in_bounds(col, row);
    }
    grid.is_wall(col, row, false)
}

/// Axis direction whose neighbouring cell center is closest to `target`,
/// never reversing unless the cell is a dead end.
pub fn greedy_direction(
    grid: &Grid,
    pos: (f32, f32),
    current: Dir,
    target: (f32, f32),
    ignore_walls: bool,
) -> Dir {
    let (col, row) = (grid.tile_of(pos.0), grid.tile_of(pos.1));
    let candidates: Vec<Dir> = Dir::AXES
        .into_iter()
        .filter(|dir| current.is_none() || *dir != current.opposite())
        .filter(|dir| {
            let (dx, dy) = dir.delta();
            !blocked(grid, col + dx, row + dy, ignore_walls)
        })
        .collect();

    if candidates.is_empty() {
        let back = current.opposite();
        let (bx, by) = back.delta();
        if !back.is_none() && !blocked(grid, col + bx, row + by, ignore_walls) {
            return back;
        }
        return Dir::AXES
            .into_iter()
            .find(|dir| {
                let (dx, dy) = dir.delta();
                !blocked(grid, col + dx, row + dy, ignore_walls)
            })
            .unwrap_or(Dir::None);
    }

    candidates
        .into_iter()
        .min_by(|a, b| {
            let da = squared_distance_after(grid, col, row, *a, target);
            let db = squared_distance_after(grid, col, row, *b, target);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        })
        .unwrap_or(Dir::None)
}

fn squared_distance_after(grid: &Grid, col: i32, row: i32, dir: Dir, target: (f32, f32)) -> f32 {
    let (dx, dy) = dir.delta();
    let x = grid.center_of(col + dx);
    let y = grid.center_of(row + dy);
    (x - target.0).powi(2) + (y - target.1).powi(2)
}

/// Random open heading that prefers to keep going straight.
pub fn wander_direction(grid: &Grid, pos: (f32, f32), current: Dir, rng: &mut Rng) -> Dir {
    let (col, row) = (grid.tile_of(pos.0), grid.tile_of(pos.1));
    let candidates: Vec<Dir> = Dir::AXES
        .into_iter()
        .filter(|dir| current.is_none() || *dir != current.opposite())
        .filter(|dir| {
            let (dx, dy) = dir.delta();
            !grid.is_wall(col + dx, row + dy, false)
        })
        .collect();

    if candidates.is_empty() {
        return current.opposite();
    }
    if candidates.contains(&current) && rng.bool(0.7) {
        return current;
    }
    candidates[rng.pick_index(candidates.len())]
}

/// Tile-space visibility test: range check, then a walk of two samples per
/// tile between the two cells.
pub fn line_of_sight(grid: &Grid, from: (f32, f32), to: (f32, f32), range_tiles: f32) -> bool {
    let (fc, fr) = (grid.tile_of(from.0), grid.tile_of(from.1));
    let (tc, tr) = (grid.tile_of(to.0), grid.tile_of(to.1));
    let (dx, dy) = ((tc - fc) as f32, (tr - fr) as f32);
    if dx.hypot(dy) > range_tiles {
        return false;
    }
    let steps = (tc - fc).abs().max((tr - fr).abs()) * 2;
    for i in 1..steps {
        let t = i as f32 / steps as f32;
        let col = (fc as f32 + dx * t).round() as i32;
        let row = (fr as f32 + dy * t).round() as i32;
        if grid.is_wall(col, row, false) {
            return false;
        }
    }
    true
}
