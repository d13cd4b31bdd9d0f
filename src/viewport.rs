//! Card sizing for the board.
//!
//! Finds the largest square card that lets the whole grid fit in the window
//! next to the title, the timer display and (when shown) the restart button.

pub const MIN_CARD_SIZE: u32 = 40;
const FALLBACK_CARD_SIZE: f64 = 60.0;
const HEIGHT_SLACK: f64 = 4.0;

/// Layout measurements in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutMetrics {
    pub window_width: f64,
    pub window_height: f64,
    /// Spacing between cards, both directions.
    pub gap: f64,
    /// Board padding, left plus right.
    pub padding_horizontal: f64,
    /// Board margin, top plus bottom.
    pub margin_vertical: f64,
    pub max_width: Option<f64>,
    pub title_height: f64,
    pub timer_height: f64,
    /// Zero while the restart button is hidden.
    pub restart_height: f64,
}

impl LayoutMetrics {
    pub fn available_width(&self) -> f64 {
        let width = match self.max_width {
            Some(max) if max.is_finite() => self.window_width.min(max),
            _ => self.window_width,
        };
        width - self.padding_horizontal
    }

    pub fn available_height(&self) -> f64 {
        self.window_height
            - self.title_height
            - self.timer_height
            - self.restart_height
            - self.margin_vertical
            - HEIGHT_SLACK
    }
}

pub fn fit_card_size(metrics: &LayoutMetrics, cols: u32, rows: u32) -> u32 {
    let by_width = side_for(metrics.available_width(), metrics.gap, cols);
    let by_height = side_for(metrics.available_height(), metrics.gap, rows);

    // `f64::min` skips a NaN operand; an unmeasured side must poison the result.
    let smaller = if by_width.is_nan() || by_height.is_nan() {
        f64::NAN
    } else {
        by_width.min(by_height)
    };
    let size = if smaller.is_finite() && smaller > 0.0 {
        smaller
    } else {
        FALLBACK_CARD_SIZE
    };
    let size = (size - 1.0).max(MIN_CARD_SIZE as f64);
    size as u32
}

fn side_for(available: f64, gap: f64, count: u32) -> f64 {
    let count = count.max(1) as f64;
    ((available - gap * (count - 1.0)) / count).floor()
}
