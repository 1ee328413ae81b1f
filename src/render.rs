use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::constants::{tile_center, SURFACE_HEIGHT, SURFACE_WIDTH, TILE_SIZE};
use crate::ghost::{Ghost, GhostLook};
use crate::maze::Maze;
use crate::player::Player;
use crate::types::{Direction, TileKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

pub mod palette {
    use super::Color;

    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const WALL: Color = Color::rgb(0x21, 0x21, 0xDE);
    pub const PELLET: Color = Color::rgb(0xFF, 0xB8, 0x97);
    pub const POWER_PELLET: Color = Color::rgb(0xFF, 0xB8, 0x97);
    pub const HOUSE_FLOOR: Color = Color::rgb(0x1A, 0x0A, 0x1A);
    pub const PLAYER: Color = Color::rgb(0xFF, 0xFF, 0x00);
    pub const FRIGHTENED: Color = Color::rgb(0x21, 0x21, 0xFF);
    pub const PUPIL: Color = Color::rgb(0x21, 0x21, 0xDE);
    pub const SCORE_TEXT: Color = Color::rgb(0x00, 0xFF, 0xFF);
    pub const BLINKY: Color = Color::rgb(0xFF, 0x00, 0x00);
    pub const PINKY: Color = Color::rgb(0xFF, 0xB8, 0xFF);
    pub const INKY: Color = Color::rgb(0x00, 0xFF, 0xFF);
    pub const CLYDE: Color = Color::rgb(0xFF, 0xB8, 0x51);
}

/// Host drawing surface in logical units (one tile is `TILE_SIZE` wide).
pub trait RenderTarget {
    fn size(&self) -> (f32, f32);
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color);
    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color);
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color);
    fn set_alpha(&mut self, alpha: f32);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCall {
    Clear {
        color: Color,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        color: Color,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        color: Color,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Color,
    },
    Alpha {
        alpha: f32,
    },
}

/// Records draw calls instead of rasterizing. Only the calls issued since the
/// most recent `clear` are kept, so the log always describes one frame.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    calls: Rc<RefCell<Vec<DrawCall>>>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::with_size(SURFACE_WIDTH, SURFACE_HEIGHT)
    }

    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn count_circles(&self, color: Color) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, DrawCall::Circle { color: c, .. } if *c == color))
            .count()
    }

    pub fn count_polygons(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, DrawCall::Polygon { .. }))
            .count()
    }

    pub fn count_rects(&self, color: Color) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, DrawCall::Rect { color: c, .. } if *c == color))
            .count()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: DrawCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RenderTarget for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        let mut calls = self.calls.borrow_mut();
        calls.clear();
        calls.push(DrawCall::Clear { color });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.push(DrawCall::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        self.push(DrawCall::Circle {
            x,
            y,
            radius,
            color,
        });
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        self.push(DrawCall::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        self.push(DrawCall::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        self.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.push(DrawCall::Alpha { alpha });
    }
}

/// Score popup left behind when a ghost is eaten.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub remaining: f32,
    pub duration: f32,
}

impl FloatingText {
    pub fn new(text: impl Into<String>, x: f32, y: f32, duration: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            remaining: duration,
            duration,
        }
    }

    /// Returns false once the text has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining > 0.0
    }

    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
    }
}

/// Everything one frame needs.
pub struct Scene<'a> {
    pub maze: &'a Maze,
    pub player: &'a Player,
    pub ghosts: &'a [Ghost],
    pub floating_texts: &'a [FloatingText],
    pub entity_alpha: f32,
    pub show_entities: bool,
}

const WALL_LINE_WIDTH: f32 = 2.0;
const PELLET_RADIUS: f32 = 4.0;
const POWER_PELLET_RADIUS: f32 = 10.0;
const SPRITE_CELLS: usize = 11;
const SPRITE_SCALE: f32 = TILE_SIZE * 0.8 / SPRITE_CELLS as f32;
const GHOST_RADIUS: f32 = TILE_SIZE * 0.4;
const GHOST_SKIRT_POINTS: usize = 4;
const GHOST_DOME_SEGMENTS: usize = 8;

const PLAYER_OPEN: [&str; SPRITE_CELLS] = [
    "...#####...",
    "..#######..",
    ".#########.",
    "#######....",
    "#####......",
    "###........",
    "#####......",
    "#######....",
    ".#########.",
    "..#######..",
    "...#####...",
];

const PLAYER_CLOSED: [&str; SPRITE_CELLS] = [
    "...#####...",
    "..#######..",
    ".#########.",
    "###########",
    "###########",
    "###########",
    "###########",
    "###########",
    ".#########.",
    "..#######..",
    "...#####...",
];

pub fn draw_frame(target: &mut dyn RenderTarget, scene: &Scene<'_>) {
    target.clear(palette::BLACK);
    draw_maze(target, scene.maze);
    if scene.show_entities {
        target.set_alpha(scene.entity_alpha);
        draw_player(target, scene.player);
        for ghost in scene.ghosts {
            draw_ghost(target, ghost);
        }
        target.set_alpha(1.0);
    }
    draw_floating_texts(target, scene.floating_texts);
}

fn draw_maze(target: &mut dyn RenderTarget, maze: &Maze) {
    let pellets_visible = maze.pellets_visible();
    for row in 0..maze.height() {
        for col in 0..maze.width() {
            let Some(tile) = maze.tile(col, row) else {
                continue;
            };
            let left = col as f32 * TILE_SIZE;
            let top = row as f32 * TILE_SIZE;
            let cx = tile_center(col);
            let cy = tile_center(row);

            match tile.kind {
                TileKind::Wall => {
                    let right = left + TILE_SIZE;
                    let bottom = top + TILE_SIZE;
                    if !maze.is_wall(col, row - 1) {
                        target.stroke_line((left, top), (right, top), WALL_LINE_WIDTH, palette::WALL);
                    }
                    if !maze.is_wall(col, row + 1) {
                        target.stroke_line(
                            (left, bottom),
                            (right, bottom),
                            WALL_LINE_WIDTH,
                            palette::WALL,
                        );
                    }
                    if !maze.is_wall(col - 1, row) {
                        target.stroke_line((left, top), (left, bottom), WALL_LINE_WIDTH, palette::WALL);
                    }
                    if !maze.is_wall(col + 1, row) {
                        target.stroke_line(
                            (right, top),
                            (right, bottom),
                            WALL_LINE_WIDTH,
                            palette::WALL,
                        );
                    }
                }
                TileKind::GhostHouse => {
                    target.fill_rect(left, top, TILE_SIZE, TILE_SIZE, palette::HOUSE_FLOOR);
                }
                TileKind::Pellet if !tile.collected && pellets_visible => {
                    target.fill_circle(cx, cy, PELLET_RADIUS, palette::PELLET);
                }
                TileKind::PowerPellet if !tile.collected && pellets_visible => {
                    target.fill_circle(cx, cy, POWER_PELLET_RADIUS, palette::POWER_PELLET);
                }
                _ => {}
            }
        }
    }
}

fn rotate(dx: f32, dy: f32, facing: Direction) -> (f32, f32) {
    match facing {
        Direction::Left => (-dx, dy),
        Direction::Up => (dy, -dx),
        Direction::Down => (-dy, dx),
        Direction::Right | Direction::None => (dx, dy),
    }
}

fn draw_player(target: &mut dyn RenderTarget, player: &Player) {
    let sprite = if player.mouth_open() {
        &PLAYER_OPEN
    } else {
        &PLAYER_CLOSED
    };
    let melted_rows = if player.is_melting() {
        (player.melt_progress() * SPRITE_CELLS as f32).floor() as usize
    } else {
        0
    };
    let (px, py) = player.pixel();
    let half = SPRITE_CELLS as f32 / 2.0;

    for (row, line) in sprite.iter().enumerate().skip(melted_rows) {
        for (col, cell) in line.chars().enumerate() {
            if cell != '#' {
                continue;
            }
            let dx = (col as f32 + 0.5 - half) * SPRITE_SCALE;
            let dy = (row as f32 + 0.5 - half) * SPRITE_SCALE;
            let (rx, ry) = rotate(dx, dy, player.direction());
            target.fill_rect(
                px + rx - SPRITE_SCALE / 2.0,
                py + ry - SPRITE_SCALE / 2.0,
                SPRITE_SCALE,
                SPRITE_SCALE,
                palette::PLAYER,
            );
        }
    }
}

fn ghost_body(x: f32, y: f32) -> Vec<(f32, f32)> {
    let mut points = Vec::with_capacity(GHOST_DOME_SEGMENTS + GHOST_SKIRT_POINTS * 2 + 2);
    for step in 0..=GHOST_DOME_SEGMENTS {
        let angle = std::f32::consts::PI * (1.0 + step as f32 / GHOST_DOME_SEGMENTS as f32);
        points.push((x + GHOST_RADIUS * angle.cos(), y + GHOST_RADIUS * angle.sin()));
    }
    let bottom = y + GHOST_RADIUS;
    let tooth = GHOST_RADIUS * 2.0 / (GHOST_SKIRT_POINTS * 2) as f32;
    for step in 0..=GHOST_SKIRT_POINTS * 2 {
        let sx = x + GHOST_RADIUS - step as f32 * tooth;
        let sy = if step % 2 == 0 { bottom } else { bottom - tooth };
        points.push((sx, sy));
    }
    points
}

fn draw_eyes(target: &mut dyn RenderTarget, x: f32, y: f32, facing: Direction) {
    let (dx, dy) = facing.delta();
    for side in [-1.0, 1.0] {
        let ex = x + side * GHOST_RADIUS * 0.4;
        let ey = y - GHOST_RADIUS * 0.2;
        target.fill_circle(ex, ey, GHOST_RADIUS * 0.28, palette::WHITE);
        target.fill_circle(
            ex + dx as f32 * 2.0,
            ey + dy as f32 * 2.0,
            GHOST_RADIUS * 0.14,
            palette::PUPIL,
        );
    }
}

fn draw_ghost(target: &mut dyn RenderTarget, ghost: &Ghost) {
    let (x, y) = ghost.pixel();
    match ghost.look() {
        GhostLook::Hidden => {}
        GhostLook::Eyes => draw_eyes(target, x, y, ghost.direction()),
        GhostLook::Body { color, eyes } => {
            target.fill_polygon(&ghost_body(x, y), color);
            if eyes {
                draw_eyes(target, x, y, ghost.direction());
            } else {
                let face = GHOST_RADIUS * 0.15;
                for side in [-1.0, 1.0] {
                    target.fill_rect(
                        x + side * GHOST_RADIUS * 0.35 - face / 2.0,
                        y - GHOST_RADIUS * 0.2,
                        face,
                        face,
                        palette::WHITE,
                    );
                }
            }
        }
    }
}

fn draw_floating_texts(target: &mut dyn RenderTarget, texts: &[FloatingText]) {
    for text in texts {
        let progress = text.progress();
        target.set_alpha(1.0 - progress);
        target.fill_text(
            &text.text,
            text.x,
            text.y - progress * TILE_SIZE * 0.5,
            palette::SCORE_TEXT,
        );
    }
    if !texts.is_empty() {
        target.set_alpha(1.0);
    }
}
