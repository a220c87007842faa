use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{LandingPage, MessageList, TitleBar};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, frame_index: usize) {
    use Constraint::{Length, Min};

    let input_height = tui.input_box.calculate_height(frame.area().width);
    let layout = Layout::vertical([Length(1), Min(0), Length(input_height)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    // A finished turn's outcome colours the status until the next one starts.
    let outcome = if app.turn.in_flight() {
        None
    } else {
        app.last_outcome.as_ref()
    };
    TitleBar::new(
        &app.endpoint,
        &app.status_message,
        tui.message_list.unseen_below,
    )
    .outcome(outcome)
    .render(frame, title_area);

    if tui.show_landing() {
        LandingPage::new(&app.endpoint, app.disabled.as_deref()).render(frame, main_area);
    } else {
        MessageList::new(
            &mut tui.message_list,
            &app.messages.truncated_notice,
            frame_index,
        )
        .render(frame, main_area);
    }

    tui.input_box.render(frame, input_area);
}
