use crate::types::GhostName;

pub const TILE_SIZE: f32 = 48.0;
pub const HALF_TILE: f32 = TILE_SIZE / 2.0;
pub const MAZE_WIDTH: i32 = 18;
pub const MAZE_HEIGHT: i32 = 20;
pub const SURFACE_WIDTH: f32 = MAZE_WIDTH as f32 * TILE_SIZE;
pub const SURFACE_HEIGHT: f32 = MAZE_HEIGHT as f32 * TILE_SIZE;

pub const CENTER_THRESHOLD_PX: f32 = 6.0;

pub const PLAYER_SPEED: f32 = 6.0;
pub const PLAYER_SPAWN: (i32, i32) = (9, 17);
pub const PLAYER_ANIMATION_STEP_SECS: f32 = 0.1;
pub const PLAYER_MELT_RATE: f32 = 0.7;

pub const GHOST_SPEED: f32 = 3.0;
pub const GHOST_FRIGHTENED_SPEED: f32 = 1.5;
pub const GHOST_EATEN_SPEED: f32 = 6.0;
pub const GHOST_HOUSE_EXIT: (i32, i32) = (9, 7);
pub const GHOST_MODE_DURATIONS: [f32; 7] = [7.0, 20.0, 7.0, 20.0, 5.0, 20.0, 5.0];
pub const FRIGHTENED_DURATION_SECS: f32 = 8.0;
pub const FRIGHTENED_FLICKER_WINDOW_SECS: f32 = 2.0;
pub const GHOST_RESPAWN_DELAY_SECS: f32 = 3.0;
pub const GHOST_COLLISION_RADIUS: f32 = 0.5;
pub const AMBUSH_LOOKAHEAD_TILES: i32 = 3;
pub const FLANK_LOOKAHEAD_TILES: i32 = 2;
pub const SHY_DISTANCE_TILES: f32 = 6.0;
pub const MAX_STUCK_REVERSALS: u32 = 2;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const GHOST_POINTS: u32 = 200;

pub const PELLET_FLASH_HZ: f32 = 6.0;
pub const FLICKER_HZ: f32 = 10.0;

pub const STARTING_LIVES: u32 = 3;
pub const DEATH_ANIMATION_SECS: f32 = 1.5;
pub const RESPAWN_GRACE_SECS: f32 = 0.8;
pub const EATING_GHOST_FREEZE_SECS: f32 = 1.0;
pub const FLOATING_TEXT_SECS: f32 = 1.5;
pub const INTERMISSION_MIN_SECS: f32 = 2.0;
pub const CUE_TIMEOUT_SECS: f32 = 5.0;
pub const MAX_FRAME_DT_SECS: f32 = 0.1;

pub fn ghost_spawn(name: GhostName) -> (i32, i32) {
    match name {
        GhostName::Blinky => (8, 8),
        GhostName::Pinky => (9, 9),
        GhostName::Inky => (8, 9),
        GhostName::Clyde => (9, 8),
    }
}

pub fn ghost_scatter_corner(name: GhostName) -> (i32, i32) {
    match name {
        GhostName::Blinky => (MAZE_WIDTH - 1, 0),
        GhostName::Pinky => (0, 0),
        GhostName::Inky => (MAZE_WIDTH - 1, MAZE_HEIGHT - 1),
        GhostName::Clyde => (0, MAZE_HEIGHT - 1),
    }
}

pub fn ghost_house_exit_delay(name: GhostName) -> f32 {
    match name {
        GhostName::Blinky => 0.0,
        GhostName::Pinky => 1.0,
        GhostName::Inky => 2.0,
        GhostName::Clyde => 3.0,
    }
}

pub fn tile_center(index: i32) -> f32 {
    index as f32 * TILE_SIZE + HALF_TILE
}

pub fn tile_of(pixel: f32) -> i32 {
    (pixel / TILE_SIZE).floor() as i32
}
