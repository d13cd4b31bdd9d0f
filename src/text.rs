use crate::session::{GameSession, Phase};
use crate::timers::EndReason;

pub const TITLE: &str = "같은 그림 찾기";
pub const START_OVERLAY: &str = "START";
pub const RESTART_LABEL: &str = "다시 시작";
pub const BACK_ALT: &str = "back";
pub const FRONT_ALT: &str = "front";

pub fn preview_line(seconds: u32) -> String {
    format!("미리보기 {seconds}초")
}

pub fn countdown_line(seconds: u32) -> String {
    format!("남은 시간: {seconds}초")
}

pub fn game_over_line(matched_pairs: usize, reason: EndReason) -> String {
    match reason {
        EndReason::TimeUp => format!("시간 종료! {matched_pairs}세트 성공!"),
        EndReason::AllMatched => format!("모두 찾았어요! {matched_pairs}세트 성공!"),
    }
}

/// Text for the timer display.
pub fn status_line(session: &GameSession) -> String {
    match session.phase() {
        Phase::Preview => preview_line(session.preview_left()),
        Phase::Starting | Phase::Playing => countdown_line(session.time_left()),
        Phase::Ended => game_over_line(
            session.matched_pairs(),
            session.end_reason().unwrap_or(EndReason::TimeUp),
        ),
    }
}
