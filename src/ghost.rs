use crate::constants::{
    ghost_house_exit_delay, ghost_scatter_corner, ghost_spawn, tile_center, tile_of,
    AMBUSH_LOOKAHEAD_TILES, CENTER_THRESHOLD_PX, FLANK_LOOKAHEAD_TILES, FLICKER_HZ,
    FRIGHTENED_DURATION_SECS, FRIGHTENED_FLICKER_WINDOW_SECS, GHOST_COLLISION_RADIUS,
    GHOST_EATEN_SPEED, GHOST_FRIGHTENED_SPEED, GHOST_HOUSE_EXIT, GHOST_MODE_DURATIONS,
    GHOST_RESPAWN_DELAY_SECS, GHOST_SPEED, MAX_STUCK_REVERSALS, SHY_DISTANCE_TILES, TILE_SIZE,
};
use crate::maze::Maze;
use crate::player::Player;
use crate::render::{palette, Color};
use crate::rng::Rng;
use crate::types::{Direction, GhostMode, GhostName, GhostView, GridPos};

/// How a ghost should be drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostLook {
    Hidden,
    Eyes,
    Body { color: Color, eyes: bool },
}

#[derive(Clone, Debug)]
pub struct Ghost {
    name: GhostName,
    color: Color,
    grid: GridPos,
    pixel_x: f32,
    pixel_y: f32,
    direction: Direction,
    mode: GhostMode,
    mode_index: usize,
    mode_timer: f32,
    frightened_timer: f32,
    flicker_timer: f32,
    eaten: bool,
    respawn_delay: f32,
    in_house: bool,
    exit_delay: f32,
    last_decision: Option<GridPos>,
    stuck_counter: u32,
    spawn: GridPos,
    scatter_target: GridPos,
}

pub fn ghost_color(name: GhostName) -> Color {
    match name {
        GhostName::Blinky => palette::BLINKY,
        GhostName::Pinky => palette::PINKY,
        GhostName::Inky => palette::INKY,
        GhostName::Clyde => palette::CLYDE,
    }
}

impl Ghost {
    pub fn new(name: GhostName) -> Self {
        let spawn = GridPos::from(ghost_spawn(name));
        Self {
            name,
            color: ghost_color(name),
            grid: spawn,
            pixel_x: tile_center(spawn.col),
            pixel_y: tile_center(spawn.row),
            direction: Direction::Up,
            mode: GhostMode::Scatter,
            mode_index: 0,
            mode_timer: 0.0,
            frightened_timer: 0.0,
            flicker_timer: 0.0,
            eaten: false,
            respawn_delay: 0.0,
            in_house: true,
            exit_delay: ghost_house_exit_delay(name),
            last_decision: None,
            stuck_counter: 0,
            spawn,
            scatter_target: GridPos::from(ghost_scatter_corner(name)),
        }
    }

    pub fn update(&mut self, dt: f32, maze: &Maze, player: &Player, rng: &mut Rng) {
        if self.respawn_delay > 0.0 {
            self.tick_respawn_delay(dt);
            return;
        }

        if self.exit_delay > 0.0 {
            self.exit_delay = (self.exit_delay - dt).max(0.0);
            if self.mode == GhostMode::Frightened {
                self.tick_frightened(dt);
            }
            return;
        }

        if self.in_house && !maze.is_ghost_house(self.grid.col, self.grid.row) {
            self.in_house = false;
        }

        if self.eaten {
            return;
        }

        self.advance_mode_timers(dt);

        let target = if self.in_house {
            GridPos::from(GHOST_HOUSE_EXIT)
        } else {
            self.target_tile(player, maze, rng)
        };
        self.move_towards(target, maze, dt);
    }

    /// Counts the post-eaten delay down. Returns true while the ghost is still
    /// waiting to come back.
    pub fn tick_respawn_delay(&mut self, dt: f32) -> bool {
        if self.respawn_delay <= 0.0 {
            return false;
        }
        self.respawn_delay -= dt;
        if self.respawn_delay <= 0.0 {
            self.respawn_delay = 0.0;
            self.eaten = false;
            self.mode = GhostMode::Scatter;
            self.flicker_timer = 0.0;
            return false;
        }
        true
    }

    fn tick_frightened(&mut self, dt: f32) {
        self.frightened_timer -= dt;
        self.flicker_timer += dt;
        if self.frightened_timer <= 0.0 {
            self.frightened_timer = 0.0;
            self.flicker_timer = 0.0;
            self.mode = self.cycle_mode();
        }
    }

    fn advance_mode_timers(&mut self, dt: f32) {
        if self.mode == GhostMode::Frightened {
            self.tick_frightened(dt);
            return;
        }

        self.flicker_timer = 0.0;
        self.mode_timer += dt;
        if self.mode_timer >= GHOST_MODE_DURATIONS[self.mode_index] {
            self.mode_timer = 0.0;
            self.mode_index = (self.mode_index + 1) % GHOST_MODE_DURATIONS.len();
            self.mode = self.cycle_mode();
        }
    }

    fn cycle_mode(&self) -> GhostMode {
        if self.mode_index % 2 == 0 {
            GhostMode::Scatter
        } else {
            GhostMode::Chase
        }
    }

    fn target_tile(&self, player: &Player, maze: &Maze, rng: &mut Rng) -> GridPos {
        match self.mode {
            GhostMode::Frightened => rng.tile_within(maze.width(), maze.height()),
            GhostMode::Scatter => self.scatter_target,
            GhostMode::Chase | GhostMode::Dead => self.chase_target(player),
        }
    }

    fn chase_target(&self, player: &Player) -> GridPos {
        let player_tile = player.grid();
        let facing = player.direction();
        match self.name {
            GhostName::Blinky => player_tile,
            GhostName::Pinky => player_tile.step_by(facing, AMBUSH_LOOKAHEAD_TILES),
            GhostName::Inky => {
                let ahead = player_tile.step_by(facing, FLANK_LOOKAHEAD_TILES);
                GridPos::new(
                    ahead.col * 2 - self.grid.col,
                    ahead.row * 2 - self.grid.row,
                )
            }
            GhostName::Clyde => {
                if self.grid.distance_to(player_tile) > SHY_DISTANCE_TILES {
                    player_tile
                } else {
                    self.scatter_target
                }
            }
        }
    }

    fn move_towards(&mut self, target: GridPos, maze: &Maze, dt: f32) {
        let current = GridPos::new(tile_of(self.pixel_x), tile_of(self.pixel_y));
        let center_x = tile_center(current.col);
        let center_y = tile_center(current.row);
        let at_center = (self.pixel_x - center_x).abs() < CENTER_THRESHOLD_PX
            && (self.pixel_y - center_y).abs() < CENTER_THRESHOLD_PX;

        if at_center && self.last_decision != Some(current) {
            self.last_decision = Some(current);
            if let Some(dir) = self.choose_direction(current, target, maze) {
                self.direction = dir;
            }
            self.pixel_x = center_x;
            self.pixel_y = center_y;
        }

        let distance = self.speed() * TILE_SIZE * dt;
        let (dx, dy) = self.direction.delta();
        self.pixel_x += dx as f32 * distance;
        self.pixel_y += dy as f32 * distance;

        self.grid = GridPos::new(tile_of(self.pixel_x), tile_of(self.pixel_y));
        let (grid, pixel_x) = maze.wrap_position(self.grid, self.pixel_x);
        self.grid = grid;
        self.pixel_x = pixel_x;
    }

    fn neighbor(&self, from: GridPos, dir: Direction, maze: &Maze) -> GridPos {
        let next = from.step(dir);
        GridPos::new(maze.wrap_col(next.col, next.row), next.row)
    }

    fn can_enter(&self, tile: GridPos, maze: &Maze) -> bool {
        maze.is_passable(tile.col, tile.row)
            && !(maze.is_ghost_house(tile.col, tile.row) && !self.in_house)
    }

    fn choose_direction(
        &mut self,
        current: GridPos,
        target: GridPos,
        maze: &Maze,
    ) -> Option<Direction> {
        let reverse = self.direction.opposite();
        let valid: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| self.can_enter(self.neighbor(current, *dir, maze), maze))
            .collect();

        // Reverse is skipped only after another valid direction was seen.
        let mut best: Option<Direction> = None;
        let mut best_distance = f32::INFINITY;
        for (seen, dir) in valid.iter().copied().enumerate() {
            if dir == reverse && seen > 0 {
                continue;
            }
            let distance = self.neighbor(current, dir, maze).distance_to(target);
            if distance < best_distance {
                best_distance = distance;
                best = Some(dir);
            }
        }

        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| {
                let next = self.neighbor(current, *dir, maze);
                maze.is_passable(next.col, next.row)
            })
            .collect();

        let mut chosen = match best {
            Some(dir) => dir,
            None => *open.first()?,
        };

        if !reverse.is_none() && chosen == reverse {
            self.stuck_counter += 1;
            if self.stuck_counter > MAX_STUCK_REVERSALS && valid.len() > 1 {
                if let Some(perpendicular) = self
                    .direction
                    .perpendicular()
                    .into_iter()
                    .find(|dir| valid.contains(dir))
                {
                    chosen = perpendicular;
                    self.stuck_counter = 0;
                }
            }
        } else {
            self.stuck_counter = 0;
        }

        Some(chosen)
    }

    pub fn speed(&self) -> f32 {
        if self.eaten {
            GHOST_EATEN_SPEED
        } else if self.mode == GhostMode::Frightened {
            GHOST_FRIGHTENED_SPEED
        } else {
            GHOST_SPEED
        }
    }

    /// Re-triggering restarts the clock instead of stacking. Eaten ghosts
    /// ignore the call.
    pub fn set_frightened(&mut self, frightened: bool) {
        if self.eaten {
            return;
        }
        if frightened {
            self.mode = GhostMode::Frightened;
            self.frightened_timer = FRIGHTENED_DURATION_SECS;
            self.flicker_timer = 0.0;
        } else if self.mode == GhostMode::Frightened {
            self.frightened_timer = 0.0;
            self.flicker_timer = 0.0;
            self.mode = self.cycle_mode();
        }
    }

    pub fn set_eaten(&mut self) {
        self.eaten = true;
        self.mode = GhostMode::Dead;
        self.frightened_timer = 0.0;
        self.flicker_timer = 0.0;
        self.grid = self.spawn;
        self.pixel_x = tile_center(self.spawn.col);
        self.pixel_y = tile_center(self.spawn.row);
        self.direction = Direction::Up;
        self.respawn_delay = GHOST_RESPAWN_DELAY_SECS;
        self.in_house = true;
        self.last_decision = None;
        self.stuck_counter = 0;
    }

    pub fn collides_with(&self, player: &Player) -> bool {
        self.respawn_delay <= 0.0 && self.grid.distance_to(player.grid()) < GHOST_COLLISION_RADIUS
    }

    pub fn respawn(&mut self) {
        *self = Self::new(self.name);
    }

    /// Drops the ghost onto a tile center outside the house.
    pub fn place_at(&mut self, pos: GridPos) {
        self.grid = pos;
        self.pixel_x = tile_center(pos.col);
        self.pixel_y = tile_center(pos.row);
        self.in_house = false;
        self.exit_delay = 0.0;
        self.last_decision = None;
    }

    pub fn look(&self) -> GhostLook {
        if self.respawn_delay > 0.0 {
            return GhostLook::Hidden;
        }
        if self.eaten {
            return GhostLook::Eyes;
        }
        if self.mode != GhostMode::Frightened {
            return GhostLook::Body {
                color: self.color,
                eyes: true,
            };
        }

        let phase = (self.flicker_timer * FLICKER_HZ).floor() as i64;
        let flickering = self.frightened_timer < FRIGHTENED_FLICKER_WINDOW_SECS;
        if flickering && phase % 2 != 0 {
            return GhostLook::Hidden;
        }
        let color = if flickering && phase % 4 < 2 {
            palette::WHITE
        } else {
            palette::FRIGHTENED
        };
        GhostLook::Body { color, eyes: false }
    }

    pub fn name(&self) -> GhostName {
        self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn grid(&self) -> GridPos {
        self.grid
    }

    pub fn pixel(&self) -> (f32, f32) {
        (self.pixel_x, self.pixel_y)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn is_frightened(&self) -> bool {
        self.mode == GhostMode::Frightened
    }

    pub fn is_eaten(&self) -> bool {
        self.eaten
    }

    pub fn in_house(&self) -> bool {
        self.in_house
    }

    pub fn frightened_timer(&self) -> f32 {
        self.frightened_timer
    }

    pub fn respawn_delay(&self) -> f32 {
        self.respawn_delay
    }

    pub fn scatter_target(&self) -> GridPos {
        self.scatter_target
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            name: self.name,
            mode: self.mode,
            col: self.grid.col,
            row: self.grid.row,
            x: self.pixel_x,
            y: self.pixel_y,
            dir: self.direction,
            in_house: self.in_house,
            visible: self.respawn_delay <= 0.0,
        }
    }
}
