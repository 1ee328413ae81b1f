use crate::engine::GameEngine;
use crate::ghost::Ghost;
use crate::maze::Maze;
use crate::rng::Rng;
use crate::types::{Direction, GridPos, PhaseKind};

fn manhattan(a: GridPos, b: GridPos) -> i32 {
    (a.col - b.col).abs() + (a.row - b.row).abs()
}

fn key_for(dir: Direction) -> Option<&'static str> {
    match dir {
        Direction::Up => Some("ArrowUp"),
        Direction::Down => Some("ArrowDown"),
        Direction::Left => Some("ArrowLeft"),
        Direction::Right => Some("ArrowRight"),
        Direction::None => None,
    }
}

fn is_dangerous(ghost: &Ghost) -> bool {
    !ghost.is_frightened() && !ghost.is_eaten() && ghost.respawn_delay() <= 0.0
}

/// Pellet-seeking bot that plays through the same key interface a person
/// would. Used by the simulator and soak tests.
#[derive(Clone, Debug)]
pub struct Autopilot {
    rng: Rng,
    held: Option<Direction>,
    decided_at: Option<GridPos>,
}

impl Autopilot {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            held: None,
            decided_at: None,
        }
    }

    /// Re-decides once per tile (or when the player has stalled) and swaps
    /// the held key when the decision changes.
    pub fn steer(&mut self, engine: &mut GameEngine) -> Direction {
        if engine.phase() != PhaseKind::Playing {
            self.decided_at = None;
            return self.held.unwrap_or(Direction::None);
        }

        let tile = engine.player().grid();
        let stalled = engine.player().direction().is_none();
        if self.decided_at == Some(tile) && !stalled {
            return self.held.unwrap_or(Direction::None);
        }
        self.decided_at = Some(tile);

        let dir = self.choose_direction(engine.maze(), tile, engine.ghosts());
        if self.held != Some(dir) {
            self.release(engine);
            if let Some(key) = key_for(dir) {
                engine.key_down(key);
                self.held = Some(dir);
            }
        }
        dir
    }

    pub fn release(&mut self, engine: &mut GameEngine) {
        if let Some(key) = self.held.take().and_then(key_for) {
            engine.key_up(key);
        }
    }

    pub fn choose_direction(&mut self, maze: &Maze, at: GridPos, ghosts: &[Ghost]) -> Direction {
        let mut best = Direction::None;
        let mut best_score = f32::NEG_INFINITY;
        let nearest_pellet = maze.pellet_positions().min_by_key(|pos| manhattan(at, *pos));

        for dir in Direction::CARDINALS {
            let next = self.neighbor(maze, at, dir);
            if !maze.is_passable(next.col, next.row) || maze.is_ghost_house(next.col, next.row) {
                continue;
            }
            let ghost_dist = distance_to_nearest_ghost(ghosts, next).unwrap_or(99);
            if ghost_dist <= 1 {
                continue;
            }

            let mut score = 0.0;
            if maze
                .tile(next.col, next.row)
                .is_some_and(|tile| tile.kind.is_pellet() && !tile.collected)
            {
                score += 14.0;
            }
            if let Some(pellet) = nearest_pellet {
                let before = manhattan(at, pellet);
                let after = manhattan(next, pellet);
                score += (before - after) as f32;
            }
            score += ghost_dist.min(10) as f32 * 0.65;
            if ghost_dist <= 2 {
                score -= 7.0;
            }
            score += self.rng.next_f32() * 0.25;

            if score > best_score {
                best_score = score;
                best = dir;
            }
        }

        if best.is_none() {
            self.escape_direction(maze, at, ghosts)
        } else {
            best
        }
    }

    fn escape_direction(&mut self, maze: &Maze, at: GridPos, ghosts: &[Ghost]) -> Direction {
        let mut best = Direction::None;
        let mut best_dist = i32::MIN;
        for dir in Direction::CARDINALS {
            let next = self.neighbor(maze, at, dir);
            if !maze.is_passable(next.col, next.row) {
                continue;
            }
            let dist = distance_to_nearest_ghost(ghosts, next).unwrap_or(99);
            if dist > best_dist {
                best_dist = dist;
                best = dir;
            }
        }
        if best.is_none() {
            Direction::CARDINALS[self.rng.below(4) as usize]
        } else {
            best
        }
    }

    fn neighbor(&self, maze: &Maze, at: GridPos, dir: Direction) -> GridPos {
        let next = at.step(dir);
        GridPos::new(maze.wrap_col(next.col, next.row), next.row)
    }
}

fn distance_to_nearest_ghost(ghosts: &[Ghost], at: GridPos) -> Option<i32> {
    ghosts
        .iter()
        .filter(|ghost| is_dangerous(ghost))
        .map(|ghost| manhattan(at, ghost.grid()))
        .min()
}
