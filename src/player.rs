use crate::constants::{
    tile_center, tile_of, CENTER_THRESHOLD_PX, PLAYER_ANIMATION_STEP_SECS, PLAYER_MELT_RATE,
    PLAYER_SPEED, TILE_SIZE,
};
use crate::maze::Maze;
use crate::types::{Direction, GridPos, PlayerView};

#[derive(Clone, Debug)]
pub struct Player {
    grid: GridPos,
    pixel_x: f32,
    pixel_y: f32,
    direction: Direction,
    buffered: Direction,
    mouth_frame: u8,
    animation_timer: f32,
    melting: bool,
    melt_progress: f32,
    spawn: GridPos,
}

impl Player {
    pub fn new(spawn: GridPos) -> Self {
        Self {
            grid: spawn,
            pixel_x: tile_center(spawn.col),
            pixel_y: tile_center(spawn.row),
            direction: Direction::None,
            buffered: Direction::None,
            mouth_frame: 0,
            animation_timer: 0.0,
            melting: false,
            melt_progress: 0.0,
            spawn,
        }
    }

    pub fn update(&mut self, dt: f32, input: Direction, maze: &Maze) {
        self.animation_timer += dt;
        if self.animation_timer > PLAYER_ANIMATION_STEP_SECS {
            self.mouth_frame = (self.mouth_frame + 1) % 2;
            self.animation_timer = 0.0;
        }

        if !input.is_none() {
            self.buffered = input;
        }

        let current = GridPos::new(tile_of(self.pixel_x), tile_of(self.pixel_y));
        let center_x = tile_center(current.col);
        let center_y = tile_center(current.row);
        let at_center = (self.pixel_x - center_x).abs() < CENTER_THRESHOLD_PX
            && (self.pixel_y - center_y).abs() < CENTER_THRESHOLD_PX;

        if at_center && self.buffered == self.direction {
            self.buffered = Direction::None;
        } else if at_center && !self.buffered.is_none() {
            let next = current.step(self.buffered);
            if maze.is_passable(next.col, next.row) {
                self.direction = self.buffered;
                self.buffered = Direction::None;
                self.pixel_x = center_x;
                self.pixel_y = center_y;
            }
        }

        if !self.direction.is_none() {
            let distance = PLAYER_SPEED * TILE_SIZE * dt;
            let (dx, dy) = self.direction.delta();
            let next_x = self.pixel_x + dx as f32 * distance;
            let next_y = self.pixel_y + dy as f32 * distance;
            let next_tile = GridPos::new(tile_of(next_x), tile_of(next_y));

            if next_tile != current && !maze.is_passable(next_tile.col, next_tile.row) {
                self.pixel_x = center_x;
                self.pixel_y = center_y;
                self.direction = Direction::None;
            } else {
                self.pixel_x = next_x;
                self.pixel_y = next_y;
            }
        }

        let grid = GridPos::new(tile_of(self.pixel_x), tile_of(self.pixel_y));
        (self.grid, self.pixel_x) = maze.wrap_position(grid, self.pixel_x);
    }

    pub fn respawn(&mut self) {
        *self = Self::new(self.spawn);
    }

    /// Moves the player onto a tile center without touching direction state.
    pub fn place_at(&mut self, pos: GridPos) {
        self.grid = pos;
        self.pixel_x = tile_center(pos.col);
        self.pixel_y = tile_center(pos.row);
    }

    pub fn start_melting(&mut self) {
        self.melting = true;
        self.melt_progress = 0.0;
    }

    pub fn update_melting(&mut self, dt: f32) {
        if self.melting {
            self.melt_progress = (self.melt_progress + dt * PLAYER_MELT_RATE).min(1.0);
        }
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

    pub fn buffered_direction(&self) -> Direction {
        self.buffered
    }

    pub fn mouth_open(&self) -> bool {
        self.mouth_frame == 1
    }

    pub fn is_melting(&self) -> bool {
        self.melting
    }

    pub fn melt_progress(&self) -> f32 {
        self.melt_progress
    }

    pub fn spawn(&self) -> GridPos {
        self.spawn
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            col: self.grid.col,
            row: self.grid.row,
            x: self.pixel_x,
            y: self.pixel_y,
            dir: self.direction,
            buffered_dir: self.buffered,
        }
    }
}
