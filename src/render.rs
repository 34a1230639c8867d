//! Renderer collaborator
//!
//! Drawing happens outside the core. A renderer gets read-only access to the
//! session once per step and must never change it.

use crate::game::Screen;
use crate::sim::{GameSession, HoldKind};

/// Draws one frame from session state
pub trait Renderer {
    fn draw(&mut self, screen: Screen, session: &GameSession);
}

/// Numbers a HUD overlay shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudView {
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    /// Fade ratio of the active hold, if any
    pub hold: Option<(HoldKind, f32)>,
    pub enemies: usize,
    pub hazards: usize,
}

impl HudView {
    pub fn from_session(session: &GameSession) -> Self {
        Self {
            score: session.progression.score,
            lives: session.progression.lives,
            level: session.level,
            hold: session
                .hold
                .kind()
                .map(|kind| (kind, session.hold.progress())),
            enemies: session.enemies.len(),
            hazards: session.hazards.len(),
        }
    }
}

/// Draws nothing
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _screen: Screen, _session: &GameSession) {}
}

/// Text "renderer" for headless runs: logs screen changes and a periodic HUD
/// line while playing
#[derive(Debug)]
pub struct LogRenderer {
    every: u64,
    frames: u64,
    last_screen: Option<Screen>,
}

impl LogRenderer {
    /// Log a HUD line every `every` frames of gameplay
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
            last_screen: None,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new(300)
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, screen: Screen, session: &GameSession) {
        self.frames += 1;
        if self.last_screen != Some(screen) {
            log::info!("[screen] {:?}", screen);
            self.last_screen = Some(screen);
        }
        if screen == Screen::Playing && self.frames % self.every == 0 {
            let hud = HudView::from_session(session);
            log::info!(
                "[hud] level {} score {} lives {} enemies {} hazards {}{}",
                hud.level,
                hud.score,
                hud.lives,
                hud.enemies,
                hud.hazards,
                match hud.hold {
                    Some((kind, progress)) => format!(" hold {:?} {:.0}%", kind, progress * 100.0),
                    None => String::new(),
                }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_hud_reads_session() {
        let mut session = GameSession::new(&GameConfig::default());
        session.progression.score = 1_234;
        let hud = HudView::from_session(&session);
        assert_eq!(hud.score, 1_234);
        assert_eq!(hud.level, 1);
        assert!(hud.hold.is_none());
    }

    #[test]
    fn test_log_renderer_counts_frames() {
        let session = GameSession::new(&GameConfig::default());
        let mut renderer = LogRenderer::new(2);
        renderer.draw(Screen::Splash, &session);
        renderer.draw(Screen::Playing, &session);
        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.last_screen, Some(Screen::Playing));
    }
}
