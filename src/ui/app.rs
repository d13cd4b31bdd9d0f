use std::cell::RefCell;
use std::rc::Rc;

use adw::prelude::*;
use concentration::config::{GameConfig, config_path};
use concentration::text::{RESTART_LABEL, START_OVERLAY, TITLE};
use concentration::FlipOutcome;
use gio::SimpleAction;
use gtk4 as gtk;
use gtk4::glib;
use libadwaita as adw;

use super::board::{CONTENT_MARGIN, rebuild_board};
use super::hud::{apply_effects, refresh, schedule_fit};
use super::state::AppState;

const APP_ID: &str = "io.github.concentration";

const STYLE: &str = "
.concentration-title { font-size: 28px; font-weight: 800; }
.timer-display { font-size: 18px; font-weight: 600; font-feature-settings: \"tnum\"; }
.concentration-board { padding: 0 4px; }
.card { padding: 0; border-radius: 10px; transition: transform 200ms ease-out; }
.card.flipped { transform: scale(1.03); }
.card.matched { opacity: 0.8; }
.start-overlay {
  font-size: 72px;
  font-weight: 900;
  animation: start-pop 1s ease-out forwards;
}
@keyframes start-pop {
  from { opacity: 0; transform: scale(0.6); }
  50% { opacity: 1; transform: scale(1.1); }
  to { opacity: 0; transform: scale(1.0); }
}
";

pub fn run() -> glib::ExitCode {
    glib::set_prgname(Some(APP_ID));
    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(move |app| {
        load_css();

        let config = config_path()
            .map(|path| GameConfig::load_or_default(&path))
            .unwrap_or_default();
        let (st, initial_effects) = match AppState::new(config) {
            Ok(created) => created,
            Err(err) => {
                log::error!("cannot start a game: {err}");
                app.quit();
                return;
            }
        };
        let state = Rc::new(RefCell::new(st));

        let restart_action = SimpleAction::new("restart", None);
        restart_action.connect_activate({
            let state = state.clone();
            move |_, _| restart_game(&state)
        });
        app.add_action(&restart_action);
        app.set_accels_for_action("app.restart", &["<Control>r"]);

        let quit_action = SimpleAction::new("quit", None);
        quit_action.connect_activate({
            let app = app.clone();
            move |_, _| app.quit()
        });
        app.add_action(&quit_action);
        app.set_accels_for_action("app.quit", &["<Control>q"]);

        let header = adw::HeaderBar::new();
        header.add_css_class("flat");

        let title_label = gtk::Label::builder()
            .label(TITLE)
            .halign(gtk::Align::Center)
            .css_classes(vec!["concentration-title"])
            .build();

        let timer_label = gtk::Label::builder()
            .label("")
            .halign(gtk::Align::Center)
            .css_classes(vec!["timer-display"])
            .build();

        let board_container = gtk::Box::new(gtk::Orientation::Vertical, 0);
        board_container.set_halign(gtk::Align::Center);

        let restart_button = gtk::Button::builder()
            .label(RESTART_LABEL)
            .halign(gtk::Align::Center)
            .css_classes(vec!["pill", "suggested-action"])
            .visible(false)
            .build();
        restart_button.connect_clicked({
            let state = state.clone();
            move |_| restart_game(&state)
        });

        let content = gtk::Box::new(gtk::Orientation::Vertical, 8);
        content.set_margin_top(CONTENT_MARGIN);
        content.set_margin_bottom(CONTENT_MARGIN);
        content.set_margin_start(CONTENT_MARGIN);
        content.set_margin_end(CONTENT_MARGIN);
        content.append(&title_label);
        content.append(&timer_label);
        content.append(&board_container);
        content.append(&restart_button);

        let start_overlay = gtk::Label::builder()
            .label(START_OVERLAY)
            .halign(gtk::Align::Center)
            .valign(gtk::Align::Center)
            .css_classes(vec!["start-overlay"])
            .can_target(false)
            .visible(false)
            .build();

        let overlay = gtk::Overlay::new();
        overlay.set_child(Some(&content));
        overlay.add_overlay(&start_overlay);

        let toolbar = adw::ToolbarView::new();
        toolbar.add_top_bar(&header);
        toolbar.set_content(Some(&overlay));

        let win = adw::ApplicationWindow::builder()
            .application(app)
            .title(TITLE)
            .default_width(560)
            .default_height(760)
            .content(&toolbar)
            .build();
        win.set_size_request(280, 420);

        for property in ["default-width", "default-height", "maximized", "fullscreened"] {
            win.connect_notify_local(Some(property), {
                let state = state.clone();
                move |_, _| schedule_fit(&state)
            });
        }

        {
            let mut st = state.borrow_mut();
            st.window = Some(win.clone());
            st.header = Some(header);
            st.title_label = Some(title_label);
            st.timer_label = Some(timer_label);
            st.restart_button = Some(restart_button);
            st.start_overlay = Some(start_overlay);
            st.board_container = Some(board_container);
        }

        rebuild_board(&state);
        apply_effects(&state, initial_effects);
        refresh(&state);
        win.present();
        schedule_fit(&state);
    });

    app.run()
}

fn load_css() {
    let Some(display) = gtk::gdk::Display::default() else {
        return;
    };
    let provider = gtk::CssProvider::new();
    provider.load_from_data(STYLE);
    gtk::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

pub fn handle_card_click(state: &Rc<RefCell<AppState>>, index: usize) {
    let (outcome, effects) = state.borrow_mut().session.flip(index);
    if let FlipOutcome::Rejected(reason) = outcome {
        log::debug!("flip {index} ignored: {reason:?}");
        return;
    }
    apply_effects(state, effects);
    refresh(state);
}

fn restart_game(state: &Rc<RefCell<AppState>>) {
    let restarted = {
        let mut st = state.borrow_mut();
        st.stop_overlay();
        st.session.restart(&mut rand::rng())
    };
    match restarted {
        Ok(effects) => {
            apply_effects(state, effects);
            rebuild_board(state);
            refresh(state);
            schedule_fit(state);
        }
        Err(err) => log::error!("cannot restart: {err}"),
    }
}
