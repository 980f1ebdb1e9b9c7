//! Deterministic 8-way A* over grid passability, and the consumable step sequence
//! behaviors walk one cell per turn.
//! This module exists so pursuit, exploration and construction share one routing rule.
//! It does not decide where an actor wants to go.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::grid::Grid;
use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// Ordered cells from (excluding) an origin to a destination.
/// An empty path straight out of [`compute_path`] means the destination was unreachable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    steps: VecDeque<Pos>,
}

impl Path {
    pub fn from_steps(steps: impl IntoIterator<Item = Pos>) -> Self {
        Self { steps: steps.into_iter().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn destination(&self) -> Option<Pos> {
        self.steps.back().copied()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Pops the next cell and returns the unit move from `from` toward it.
    /// Cells equal to `from` are skipped, so a non-empty result is never `(0, 0)`.
    pub fn walk_next_step(&mut self, from: Pos) -> Result<(i32, i32), CoreError> {
        while let Some(next) = self.steps.pop_front() {
            if next != from {
                return Ok(step_toward(from, next));
            }
        }
        Err(CoreError::InvalidPath)
    }
}

/// Normalises the vector `from -> to` and rounds each axis to the nearest of
/// `-1, 0, 1`, with halves rounding away from zero.
pub fn step_toward(from: Pos, to: Pos) -> (i32, i32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    // |d / len| >= 1/2  <=>  3 * d^2 >= other^2
    let sx = if 3 * dx * dx >= dy * dy { dx.signum() } else { 0 };
    let sy = if 3 * dy * dy >= dx * dx { dy.signum() } else { 0 };
    (sx, sy)
}

/// Shortest path using the grid's current passability. A cell is traversable iff
/// its tile is not blocked; entities are ignored.
pub fn compute_path(grid: &Grid, from: Pos, to: Pos) -> Path {
    let steps = astar(|pos| !grid.is_blocked(pos), from, to, false).unwrap_or_default();
    debug!(?from, ?to, len = steps.len(), "computed path");
    Path::from_steps(steps)
}

/// Passability snapshot owned by one behavior. Stamped with the grid revision it was
/// built from so the owner can tell when the map has changed underneath it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathMap {
    width: usize,
    height: usize,
    passable: Vec<bool>,
    revision: u64,
}

impl PathMap {
    pub fn build(grid: &Grid) -> Self {
        let passable = grid.positions().map(|pos| !grid.is_blocked(pos)).collect();
        Self { width: grid.width(), height: grid.height(), passable, revision: grid.revision() }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_current(&self, grid: &Grid) -> bool {
        self.revision == grid.revision()
            && self.width == grid.width()
            && self.height == grid.height()
    }

    /// Returns the cached map, rebuilding it first when the grid has moved on.
    pub fn refresh<'a>(slot: &'a mut Option<PathMap>, grid: &Grid) -> &'a PathMap {
        if slot.as_ref().is_some_and(|map| !map.is_current(grid)) {
            debug!(revision = grid.revision(), "path map stale, rebuilding");
            *slot = None;
        }
        slot.get_or_insert_with(|| PathMap::build(grid))
    }

    pub fn is_passable(&self, pos: Pos) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return false;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        x < self.width && y < self.height && self.passable[y * self.width + x]
    }

    pub fn compute_path(&self, from: Pos, to: Pos) -> Path {
        Path::from_steps(astar(|pos| self.is_passable(pos), from, to, false).unwrap_or_default())
    }

    /// Path that stops on a cell adjacent to `to`. The goal itself may be blocked,
    /// which is the usual case for a wall waiting to be dug out.
    pub fn approach_path(&self, from: Pos, to: Pos) -> Path {
        let mut steps = astar(|pos| self.is_passable(pos), from, to, true).unwrap_or_default();
        steps.pop();
        Path::from_steps(steps)
    }
}

fn astar(
    walkable: impl Fn(Pos) -> bool,
    start: Pos,
    goal: Pos,
    allow_blocked_goal: bool,
) -> Option<Vec<Pos>> {
    if !allow_blocked_goal && !walkable(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![]);
    }
    let mut open_set = BTreeSet::new();
    let mut g_score = BTreeMap::new();
    let mut came_from = BTreeMap::new();
    let h = start.chebyshev(goal);
    open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });
    g_score.insert(start, 0u32);
    while let Some(curr) = open_set.pop_first() {
        let p = Pos { y: curr.y, x: curr.x };
        if p == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        let Some(&cur_g) = g_score.get(&p) else {
            continue;
        };
        for n in neighbors(p) {
            if !(walkable(n) || (allow_blocked_goal && n == goal)) {
                continue;
            }
            let tg = cur_g + 1;
            if tg < *g_score.get(&n).unwrap_or(&u32::MAX) {
                came_from.insert(n, p);
                g_score.insert(n, tg);
                let h = n.chebyshev(goal);
                open_set.insert(OpenNode { f: tg + h, h, y: n.y, x: n.x });
            }
        }
    }
    None
}

fn reconstruct_path(came: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut p = goal;
    let mut result = vec![p];
    while p != start {
        match came.get(&p) {
            Some(&prev) => p = prev,
            None => break,
        }
        result.push(p);
    }
    result.reverse();
    result.remove(0);
    result
}

/// Orthogonal neighbours first, then diagonals.
pub fn neighbors(p: Pos) -> [Pos; 8] {
    [
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y, x: p.x - 1 },
        Pos { y: p.y - 1, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x - 1 },
        Pos { y: p.y - 1, x: p.x - 1 },
    ]
}
