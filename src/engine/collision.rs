use tracing::debug;

use crate::audio::AudioCue;
use crate::constants::{tile_center, GHOST_POINTS};
use crate::render::FloatingText;
use crate::types::GridPos;

use super::utils::swapped_tiles;
use super::GameEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CollisionOutcome {
    Clear,
    AteGhost,
    PlayerCaught,
}

impl GameEngine {
    pub(super) fn resolve_pellet(&mut self) {
        let tile = self.player.grid();
        let Some(pickup) = self.maze.collect_pellet(tile.col, tile.row) else {
            return;
        };
        self.score += pickup.points;

        if pickup.is_power_pellet {
            self.power_ups_used += 1;
            for ghost in &mut self.ghosts {
                ghost.set_frightened(true);
            }
            self.audio.play(AudioCue::PowerPellet);
            debug!(col = tile.col, row = tile.row, "power pellet eaten");
        } else {
            self.audio.play(AudioCue::Chomp);
        }
    }

    /// Positions are those recorded before anything moved this tick.
    pub(super) fn resolve_ghost_collisions(
        &mut self,
        player_before: GridPos,
        ghosts_before: &[GridPos],
    ) -> CollisionOutcome {
        let player_now = self.player.grid();
        let mut outcome = CollisionOutcome::Clear;

        for (index, ghost) in self.ghosts.iter_mut().enumerate() {
            let swapped = ghosts_before
                .get(index)
                .map(|before| swapped_tiles(player_before, player_now, *before, ghost.grid()))
                .unwrap_or(false);
            let overlap = ghost.collides_with(&self.player);
            if !overlap && !(swapped && ghost.respawn_delay() <= 0.0) {
                continue;
            }

            if ghost.is_frightened() {
                let tile = ghost.grid();
                self.score += GHOST_POINTS;
                self.ghosts_eaten += 1;
                self.floating_texts.push(FloatingText::new(
                    format!("+{GHOST_POINTS}"),
                    tile_center(tile.col),
                    tile_center(tile.row),
                    self.config.floating_text_secs,
                ));
                ghost.set_eaten();
                self.audio.play(AudioCue::EatGhost);
                debug!(ghost = ?ghost.name(), "ghost eaten");
                outcome = CollisionOutcome::AteGhost;
            } else if !ghost.is_eaten() {
                debug!(ghost = ?ghost.name(), "player caught");
                return CollisionOutcome::PlayerCaught;
            }
        }

        outcome
    }
}
