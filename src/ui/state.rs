use std::collections::HashMap;

use concentration::{Effect, GameConfig, GameSession, SessionError, TimerToken};
use gtk4 as gtk;
use gtk4::glib;
use libadwaita as adw;

pub struct AppState {
    pub window: Option<adw::ApplicationWindow>,
    pub header: Option<adw::HeaderBar>,
    pub title_label: Option<gtk::Label>,
    pub timer_label: Option<gtk::Label>,
    pub restart_button: Option<gtk::Button>,
    pub start_overlay: Option<gtk::Label>,
    pub board_container: Option<gtk::Box>,
    pub card_buttons: Vec<gtk::Button>,
    pub card_pictures: Vec<gtk::Picture>,
    /// Asset currently loaded into each picture.
    pub card_faces: Vec<String>,
    pub card_size: u32,

    // Game state
    pub session: GameSession,
    pub timer_handles: HashMap<TimerToken, glib::SourceId>,
    pub overlay_handle: Option<glib::SourceId>,
}

impl AppState {
    /// Builds the state with a first session. The returned effects arm that
    /// session's timers and must be applied once the widgets exist.
    pub fn new(config: GameConfig) -> Result<(Self, Vec<Effect>), SessionError> {
        let (session, effects) = GameSession::new(config, 1, &mut rand::rng())?;
        let st = AppState {
            window: None,
            header: None,
            title_label: None,
            timer_label: None,
            restart_button: None,
            start_overlay: None,
            board_container: None,
            card_buttons: Vec::new(),
            card_pictures: Vec::new(),
            card_faces: Vec::new(),
            card_size: 0,
            session,
            timer_handles: HashMap::new(),
            overlay_handle: None,
        };
        Ok((st, effects))
    }

    pub fn grid_cols(&self) -> u32 {
        self.session.config().grid_cols
    }

    pub fn grid_rows(&self) -> u32 {
        self.session.config().grid_rows
    }

    pub fn stop_overlay(&mut self) {
        if let Some(handle) = self.overlay_handle.take() {
            handle.remove();
        }
        if let Some(overlay) = &self.start_overlay {
            overlay.set_visible(false);
        }
    }
}
