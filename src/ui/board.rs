use std::cell::RefCell;
use std::rc::Rc;

use concentration::text::{BACK_ALT, FRONT_ALT};
use concentration::{LayoutMetrics, fit_card_size};
use gtk4 as gtk;
use gtk4::prelude::*;

use super::app::handle_card_click;
use super::state::AppState;

pub const CONTENT_MARGIN: i32 = 12;
pub const TILE_GAP: i32 = 8;
const BOARD_MAX_WIDTH: f64 = 720.0;

pub fn build_board_grid(state: &Rc<RefCell<AppState>>) -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.add_css_class("concentration-board");
    grid.set_row_spacing(TILE_GAP as u32);
    grid.set_column_spacing(TILE_GAP as u32);
    grid.set_halign(gtk::Align::Center);
    grid.set_valign(gtk::Align::Start);

    let (grid_cols, card_count, back_path) = {
        let st = state.borrow();
        (
            st.grid_cols().max(1) as i32,
            st.session.cards().len(),
            st.session.config().back_image_path(),
        )
    };

    let mut buttons = Vec::with_capacity(card_count);
    let mut pictures = Vec::with_capacity(card_count);

    for index in 0..card_count {
        let picture = gtk::Picture::for_filename(&back_path);
        picture.set_can_shrink(true);
        picture.set_alternative_text(Some(BACK_ALT));
        picture.add_css_class("card-face");

        let button = gtk::Button::builder()
            .css_classes(vec!["card", "flat"])
            .child(&picture)
            .build();

        let state_clone = state.clone();
        button.connect_clicked(move |_| {
            handle_card_click(&state_clone, index);
        });

        let i = index as i32;
        grid.attach(&button, i % grid_cols, i / grid_cols, 1, 1);
        buttons.push(button);
        pictures.push(picture);
    }

    let mut st = state.borrow_mut();
    st.card_faces = vec![back_path; card_count];
    st.card_buttons = buttons;
    st.card_pictures = pictures;
    st.card_size = 0;

    grid
}

/// Swaps the board for a fresh grid matching the current session.
pub fn rebuild_board(state: &Rc<RefCell<AppState>>) {
    let board_container = state.borrow().board_container.clone();
    let Some(board_container) = board_container else {
        return;
    };

    while let Some(child) = board_container.first_child() {
        board_container.remove(&child);
    }
    let grid = build_board_grid(state);
    board_container.append(&grid);
    sync_board(&mut state.borrow_mut());
    fit_board_to_window(state);
}

/// Points every card at the face the session says should be showing.
pub fn sync_board(st: &mut AppState) {
    let AppState {
        session,
        card_buttons,
        card_pictures,
        card_faces,
        ..
    } = st;

    for (index, (button, picture)) in card_buttons.iter().zip(card_pictures.iter()).enumerate() {
        let Some(card) = session.cards().get(index) else {
            continue;
        };
        let Some(face) = session.visible_face(index) else {
            continue;
        };

        if card_faces.get(index) != Some(&face) {
            picture.set_filename(Some(&face));
            picture.set_alternative_text(Some(if card.is_face_up() { FRONT_ALT } else { BACK_ALT }));
            if let Some(slot) = card_faces.get_mut(index) {
                *slot = face;
            }
        }

        if card.is_face_up() {
            button.add_css_class("flipped");
        } else {
            button.remove_css_class("flipped");
        }
        if card.is_matched() {
            button.add_css_class("matched");
        } else {
            button.remove_css_class("matched");
        }
    }
}

fn outer_height(widget: Option<&impl IsA<gtk::Widget>>) -> f64 {
    let Some(widget) = widget else {
        return 0.0;
    };
    if !widget.is_visible() {
        return 0.0;
    }
    (widget.height() + widget.margin_top() + widget.margin_bottom()) as f64
}

/// Resizes the cards so the whole grid fits the window.
pub fn fit_board_to_window(state: &Rc<RefCell<AppState>>) {
    let mut st = state.borrow_mut();
    let Some(window) = st.window.clone() else {
        return;
    };

    let header_height = outer_height(st.header.as_ref());
    let metrics = LayoutMetrics {
        window_width: window.width() as f64,
        window_height: window.height() as f64 - header_height,
        gap: TILE_GAP as f64,
        padding_horizontal: (CONTENT_MARGIN * 2) as f64,
        margin_vertical: (CONTENT_MARGIN * 2) as f64,
        max_width: Some(BOARD_MAX_WIDTH),
        title_height: outer_height(st.title_label.as_ref()),
        timer_height: outer_height(st.timer_label.as_ref()),
        restart_height: outer_height(st.restart_button.as_ref()),
    };
    let size = fit_card_size(&metrics, st.grid_cols(), st.grid_rows());
    if size == st.card_size {
        return;
    }
    st.card_size = size;
    for button in &st.card_buttons {
        button.set_size_request(size as i32, size as i32);
    }
    log::debug!(
        "card size {size}px for a {}x{} window",
        metrics.window_width,
        metrics.window_height
    );
}
