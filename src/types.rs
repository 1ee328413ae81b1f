use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Enumeration order used for ghost tie-breaking.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn is_none(self) -> bool {
        self == Direction::None
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Self::Up | Self::Down => [Self::Left, Self::Right],
            _ => [Self::Up, Self::Down],
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn step(self, dir: Direction) -> Self {
        self.step_by(dir, 1)
    }

    pub fn step_by(self, dir: Direction, tiles: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.col + dx * tiles, self.row + dy * tiles)
    }

    pub fn distance_to(self, other: GridPos) -> f32 {
        let dx = (self.col - other.col) as f32;
        let dy = (self.row - other.row) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((col, row): (i32, i32)) -> Self {
        Self::new(col, row)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Path,
    Pellet,
    PowerPellet,
    GhostHouse,
}

impl TileKind {
    pub fn is_pellet(self) -> bool {
        matches!(self, TileKind::Pellet | TileKind::PowerPellet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub kind: TileKind,
    pub collected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PelletPickup {
    pub points: u32,
    pub is_power_pellet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostName {
    pub const ALL: [GhostName; 4] = [
        GhostName::Blinky,
        GhostName::Pinky,
        GhostName::Inky,
        GhostName::Clyde,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Scatter,
    Chase,
    Frightened,
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Starting,
    Playing,
    Dying,
    RespawnGrace,
    EatingGhost,
    Intermission,
    Paused,
    GameOver,
}

/// Values pushed to the host UI after every update tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HudStats {
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    #[serde(rename = "timeSeconds")]
    pub time_seconds: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "powerUpsUsed")]
    pub power_ups_used: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub col: i32,
    pub row: i32,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "bufferedDir")]
    pub buffered_dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub name: GhostName,
    pub mode: GhostMode,
    pub col: i32,
    pub row: i32,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "inHouse")]
    pub in_house: bool,
    pub visible: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct EngineSnapshot {
    pub phase: PhaseKind,
    pub paused: bool,
    pub hud: HudStats,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: u32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn perpendicular_excludes_own_axis() {
        for dir in Direction::CARDINALS {
            let perp = dir.perpendicular();
            assert!(!perp.contains(&dir));
            assert!(!perp.contains(&dir.opposite()));
        }
    }

    #[test]
    fn step_by_moves_along_facing() {
        let origin = GridPos::new(5, 5);
        assert_eq!(origin.step_by(Direction::Left, 3), GridPos::new(2, 5));
        assert_eq!(origin.step_by(Direction::Down, 2), GridPos::new(5, 7));
        assert_eq!(origin.step_by(Direction::None, 4), origin);
    }

    #[test]
    fn hud_serializes_with_camel_case_keys() {
        let hud = HudStats {
            score: 10,
            level: 1,
            lives: 3,
            time_seconds: 4,
            ghosts_eaten: 0,
            power_ups_used: 1,
        };
        let json = serde_json::to_value(hud).expect("hud should serialize");
        assert_eq!(json["timeSeconds"], 4);
        assert_eq!(json["powerUpsUsed"], 1);
    }
}
