use crate::render::FloatingText;
use crate::types::GridPos;

/// Seconds since the previous frame, clamped to `[0, max_secs]`. The first
/// frame after a (re)sync has no previous timestamp and advances nothing.
pub(super) fn frame_delta_secs(last_ms: Option<f64>, now_ms: f64, max_secs: f32) -> f32 {
    match last_ms {
        Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, max_secs),
        None => 0.0,
    }
}

/// True when player and ghost traded tiles during the same tick.
pub(super) fn swapped_tiles(
    player_before: GridPos,
    player_now: GridPos,
    ghost_before: GridPos,
    ghost_now: GridPos,
) -> bool {
    player_before != player_now && player_before == ghost_now && player_now == ghost_before
}

pub(super) fn tick_floating_texts(texts: &mut Vec<FloatingText>, dt: f32) {
    texts.retain_mut(|text| text.tick(dt));
}

/// Player opacity during the post-respawn grace window: fades from full
/// towards half as the window runs out.
pub(super) fn grace_alpha(remaining: f32, total: f32) -> f32 {
    if total <= 0.0 {
        return 1.0;
    }
    0.5 + (remaining / total).clamp(0.0, 1.0) * 0.5
}

pub(super) fn whole_seconds(secs: f64) -> u32 {
    secs.max(0.0).floor() as u32
}
