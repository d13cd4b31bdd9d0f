use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use concentration::text::status_line;
use concentration::{Effect, Phase, Schedule, TimerTarget, TimerToken};
use gtk4::glib;
use gtk4::prelude::*;

use super::board::{fit_board_to_window, sync_board};
use super::state::AppState;

pub(super) fn update_status(st: &AppState) {
    if let Some(label) = &st.timer_label {
        label.set_text(&status_line(&st.session));
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(st.session.phase() == Phase::Ended);
    }
}

pub(super) fn refresh(state: &Rc<RefCell<AppState>>) {
    {
        let mut st = state.borrow_mut();
        sync_board(&mut st);
        update_status(&st);
    }
    fit_board_to_window(state);
}

/// Refits once the pending layout pass has run, so widget heights are current.
pub(super) fn schedule_fit(state: &Rc<RefCell<AppState>>) {
    let state = state.clone();
    glib::idle_add_local_once(move || fit_board_to_window(&state));
}

/// Carries out what the session asked for. Must be called without holding a
/// borrow of `state`.
pub(super) fn apply_effects(state: &Rc<RefCell<AppState>>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Schedule {
                token, schedule, ..
            } => schedule_timer(state, token, schedule),
            Effect::Cancel(token) => {
                if let Some(handle) = state.borrow_mut().timer_handles.remove(&token) {
                    handle.remove();
                }
            }
            Effect::ShowStartOverlay => show_start_overlay(state),
            Effect::GameOver { .. } => {
                {
                    let mut st = state.borrow_mut();
                    st.stop_overlay();
                    update_status(&st);
                }
                // The restart button has no allocation until the next layout pass.
                schedule_fit(state);
            }
        }
    }
}

fn schedule_timer(state: &Rc<RefCell<AppState>>, token: TimerToken, schedule: Schedule) {
    let state_clone = state.clone();
    let handle = match schedule {
        Schedule::Once(delay) => glib::timeout_add_local_once(delay, move || {
            fire_timer(&state_clone, token);
        }),
        Schedule::Every(period) => glib::timeout_add_local(period, move || {
            if fire_timer(&state_clone, token) {
                glib::ControlFlow::Continue
            } else {
                glib::ControlFlow::Break
            }
        }),
    };
    state.borrow_mut().timer_handles.insert(token, handle);
}

/// Runs one timer callback and reports whether its source should keep going.
fn fire_timer(state: &Rc<RefCell<AppState>>, token: TimerToken) -> bool {
    // The source is dispatching; keep its handle away from Cancel effects
    // until the callback returns.
    let handle = state.borrow_mut().timer_handles.remove(&token);
    let effects = state.borrow_mut().session.fire(token);
    apply_effects(state, effects);
    refresh(state);

    let mut st = state.borrow_mut();
    let keep = st.session.is_live(token);
    if keep && let Some(handle) = handle {
        st.timer_handles.insert(token, handle);
    }
    keep
}

fn show_start_overlay(state: &Rc<RefCell<AppState>>) {
    let mut st = state.borrow_mut();
    st.stop_overlay();
    if let Some(overlay) = &st.start_overlay {
        overlay.set_visible(true);
    }
    let duration = Duration::from_millis(st.session.config().start_overlay_ms);
    let session_id = st.session.session_id();
    let state_clone = state.clone();
    let handle = glib::timeout_add_local_once(duration, move || {
        let effects = {
            let mut st = state_clone.borrow_mut();
            st.overlay_handle = None;
            if let Some(overlay) = &st.start_overlay {
                overlay.set_visible(false);
            }
            if st.session.session_id() != session_id {
                return;
            }
            st.session.finish_start_overlay()
        };
        apply_effects(&state_clone, effects);
        refresh(&state_clone);
    });
    st.overlay_handle = Some(handle);
}
