use crate::constants::{
    tile_center, MAZE_HEIGHT, PELLET_FLASH_HZ, PELLET_POINTS, POWER_PELLET_POINTS,
};
use crate::types::{GridPos, PelletPickup, Tile, TileKind};

// `#` wall, `.` pellet, `o` power pellet, `H` ghost house, space path.
// Row 8 is the wrap-around tunnel.
const REFERENCE_LAYOUT: [&str; MAZE_HEIGHT as usize] = [
    "##################",
    "#.......##.......#",
    "#.##.##.##.##.##.#",
    "#o##.##.##.##.##o#",
    "#................#",
    "#.##.#.####.#.##.#",
    "#....#..##..#....#",
    "####.## ## ##.####",
    "    .   HH   .    ",
    "####.## HH ##.####",
    "####.## ## ##.####",
    "#................#",
    "#.##.########.##.#",
    "#o.#..........#.o#",
    "##.#.#.####.#.#.##",
    "#....#..##..#....#",
    "#.#####.##.#####.#",
    "#........ .......#",
    "##################",
    "##################",
];

#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    pellets_remaining: u32,
    flashing: bool,
    flash_timer: f32,
}

impl Default for Maze {
    fn default() -> Self {
        Self::new()
    }
}

impl Maze {
    pub fn new() -> Self {
        Self::from_rows(&REFERENCE_LAYOUT)
    }

    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0) as i32;
        let mut tiles = Vec::with_capacity((width * height).max(0) as usize);
        for row in rows {
            let mut chars = row.chars();
            for _ in 0..width {
                let kind = match chars.next() {
                    Some('.') => TileKind::Pellet,
                    Some('o') => TileKind::PowerPellet,
                    Some('H') => TileKind::GhostHouse,
                    Some(' ') => TileKind::Path,
                    _ => TileKind::Wall,
                };
                tiles.push(Tile {
                    kind,
                    collected: false,
                });
            }
        }

        let mut maze = Self {
            width,
            height,
            tiles,
            pellets_remaining: 0,
            flashing: false,
            flash_timer: 0.0,
        };
        maze.pellets_remaining = maze.count_uncollected();
        maze
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && col < self.width && row >= 0 && row < self.height
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if !self.in_bounds(col, row) {
            return None;
        }
        Some((row * self.width + col) as usize)
    }

    pub fn tile(&self, col: i32, row: i32) -> Option<Tile> {
        self.index(col, row).map(|idx| self.tiles[idx])
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        match self.tile(col, row) {
            Some(tile) => tile.kind == TileKind::Wall,
            None => true,
        }
    }

    pub fn is_ghost_house(&self, col: i32, row: i32) -> bool {
        self.tile(col, row)
            .map(|tile| tile.kind == TileKind::GhostHouse)
            .unwrap_or(false)
    }

    pub fn wrap_col(&self, col: i32, row: i32) -> i32 {
        if row < 0 || row >= self.height || self.width == 0 {
            return col;
        }
        col.rem_euclid(self.width)
    }

    pub fn is_passable(&self, col: i32, row: i32) -> bool {
        !self.is_wall(self.wrap_col(col, row), row)
    }

    pub fn wrap_position(&self, grid: GridPos, pixel_x: f32) -> (GridPos, f32) {
        if grid.col < 0 {
            let col = self.width - 1;
            (GridPos::new(col, grid.row), tile_center(col))
        } else if grid.col >= self.width {
            (GridPos::new(0, grid.row), tile_center(0))
        } else {
            (grid, pixel_x)
        }
    }

    pub fn collect_pellet(&mut self, col: i32, row: i32) -> Option<PelletPickup> {
        let idx = self.index(col, row)?;
        let tile = &mut self.tiles[idx];
        if tile.collected || !tile.kind.is_pellet() {
            return None;
        }
        tile.collected = true;
        self.pellets_remaining = self.pellets_remaining.saturating_sub(1);

        let is_power_pellet = tile.kind == TileKind::PowerPellet;
        Some(PelletPickup {
            points: if is_power_pellet {
                POWER_PELLET_POINTS
            } else {
                PELLET_POINTS
            },
            is_power_pellet,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.pellets_remaining == 0
    }

    pub fn pellets_remaining(&self) -> u32 {
        self.pellets_remaining
    }

    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            if tile.kind.is_pellet() {
                tile.collected = false;
            }
        }
        self.pellets_remaining = self.count_uncollected();
        self.flashing = false;
        self.flash_timer = 0.0;
    }

    pub fn start_flashing(&mut self) {
        self.flashing = true;
        self.flash_timer = 0.0;
    }

    pub fn update_flash(&mut self, dt: f32) {
        if self.flashing {
            self.flash_timer += dt;
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    pub fn pellets_visible(&self) -> bool {
        !self.flashing || (self.flash_timer * PELLET_FLASH_HZ).floor() as i64 % 2 == 0
    }

    pub fn pellet_positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.tiles.iter().enumerate().filter_map(move |(idx, tile)| {
            if tile.kind.is_pellet() && !tile.collected {
                let idx = idx as i32;
                Some(GridPos::new(idx % self.width, idx / self.width))
            } else {
                None
            }
        })
    }

    fn count_uncollected(&self) -> u32 {
        self.tiles
            .iter()
            .filter(|tile| tile.kind.is_pellet() && !tile.collected)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAZE_WIDTH, PLAYER_SPAWN};

    fn all_pellet_tiles(maze: &Maze) -> Vec<GridPos> {
        let mut out = Vec::new();
        for row in 0..maze.height() {
            for col in 0..maze.width() {
                if maze.tile(col, row).map(|t| t.kind.is_pellet()).unwrap_or(false) {
                    out.push(GridPos::new(col, row));
                }
            }
        }
        out
    }

    #[test]
    fn reference_layout_has_expected_shape() {
        let maze = Maze::new();
        assert_eq!(maze.width(), MAZE_WIDTH);
        assert_eq!(maze.height(), MAZE_HEIGHT);
        assert_eq!(maze.pellets_remaining() as usize, all_pellet_tiles(&maze).len());
        assert_eq!(
            maze.tile(1, 3).map(|t| t.kind),
            Some(TileKind::PowerPellet)
        );
        assert!(maze.is_ghost_house(8, 8));
    }

    #[test]
    fn out_of_bounds_is_wall_and_has_no_tile() {
        let maze = Maze::new();
        for (col, row) in [(-1, 0), (0, -1), (18, 5), (5, 20), (-40, -40), (100, 3)] {
            assert!(maze.is_wall(col, row), "({col},{row}) should be a wall");
            assert!(maze.tile(col, row).is_none());
        }
    }

    #[test]
    fn player_spawn_is_plain_path() {
        let maze = Maze::new();
        let tile = maze
            .tile(PLAYER_SPAWN.0, PLAYER_SPAWN.1)
            .expect("spawn in bounds");
        assert_eq!(tile.kind, TileKind::Path);
    }

    #[test]
    fn collecting_twice_only_scores_once() {
        let mut maze = Maze::new();
        let before = maze.pellets_remaining();
        let first = maze.collect_pellet(1, 1);
        assert_eq!(
            first,
            Some(PelletPickup {
                points: 10,
                is_power_pellet: false
            })
        );
        assert_eq!(maze.collect_pellet(1, 1), None);
        assert_eq!(maze.pellets_remaining(), before - 1);
        assert!(maze.tile(1, 1).map(|t| t.collected).unwrap_or(false));
    }

    #[test]
    fn power_pellet_is_worth_fifty() {
        let mut maze = Maze::new();
        let pickup = maze.collect_pellet(16, 13).expect("power pellet present");
        assert_eq!(pickup.points, 50);
        assert!(pickup.is_power_pellet);
    }

    #[test]
    fn non_pellet_tiles_yield_nothing() {
        let mut maze = Maze::new();
        assert_eq!(maze.collect_pellet(0, 0), None);
        assert_eq!(maze.collect_pellet(8, 8), None);
        assert_eq!(maze.collect_pellet(9, 17), None);
        assert_eq!(maze.collect_pellet(-1, 8), None);
    }

    #[test]
    fn completes_exactly_when_last_pellet_is_taken() {
        let mut maze = Maze::new();
        let pellets = all_pellet_tiles(&maze);
        let (last, rest) = pellets.split_last().expect("layout has pellets");
        for pos in rest {
            assert!(maze.collect_pellet(pos.col, pos.row).is_some());
            assert!(!maze.is_complete());
        }
        assert!(maze.collect_pellet(last.col, last.row).is_some());
        assert!(maze.is_complete());
    }

    #[test]
    fn reset_repopulates_pellets_and_stops_flashing() {
        let mut maze = Maze::new();
        let full = maze.pellets_remaining();
        maze.collect_pellet(1, 1);
        maze.collect_pellet(1, 3);
        maze.start_flashing();
        maze.update_flash(0.3);
        maze.reset();
        assert_eq!(maze.pellets_remaining(), full);
        assert!(!maze.tile(1, 1).map(|t| t.collected).unwrap_or(true));
        assert!(!maze.is_flashing());
        assert!(maze.is_wall(0, 0));
    }

    #[test]
    fn flash_timer_only_advances_while_flashing() {
        let mut maze = Maze::new();
        maze.update_flash(1.0);
        assert!(maze.pellets_visible());

        maze.start_flashing();
        assert!(maze.pellets_visible());
        maze.update_flash(0.2);
        assert!(!maze.pellets_visible());
        maze.update_flash(0.15);
        assert!(maze.pellets_visible());
    }

    #[test]
    fn tunnel_row_wraps_columns() {
        let maze = Maze::new();
        assert_eq!(maze.wrap_col(-1, 8), 17);
        assert_eq!(maze.wrap_col(18, 8), 0);
        assert!(maze.is_passable(-1, 8));
        assert!(maze.is_passable(18, 8));
        assert!(!maze.is_passable(-1, 1));
        assert!(!maze.is_passable(4, -1));
    }

    #[test]
    fn wrap_position_moves_to_opposite_edge() {
        let maze = Maze::new();
        let (grid, x) = maze.wrap_position(GridPos::new(-1, 8), -4.0);
        assert_eq!(grid, GridPos::new(17, 8));
        assert_eq!(x, tile_center(17));
        let (grid, x) = maze.wrap_position(GridPos::new(18, 8), 870.0);
        assert_eq!(grid, GridPos::new(0, 8));
        assert_eq!(x, tile_center(0));
        let (grid, x) = maze.wrap_position(GridPos::new(5, 8), 260.0);
        assert_eq!((grid, x), (GridPos::new(5, 8), 260.0));
    }

    #[test]
    fn pellet_positions_shrinks_after_pickup() {
        let mut maze = Maze::new();
        let before = maze.pellet_positions().count();
        maze.collect_pellet(2, 1);
        assert_eq!(maze.pellet_positions().count(), before - 1);
        assert!(!maze.pellet_positions().any(|p| p == GridPos::new(2, 1)));
    }
}
