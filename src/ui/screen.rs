use ratatui::Frame;

use crate::{app::App, app::Screen as ScreenKind, ui::history::render_history};

/// A UI Screen boundary: responsible for rendering one view of the app
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Training screen - renders the phase controller via the App widget
pub struct TrainingScreen;

impl Screen for TrainingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// History screen - table of recorded sessions
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(kind: ScreenKind) -> Box<dyn Screen> {
    match kind {
        ScreenKind::Training => Box::new(TrainingScreen),
        ScreenKind::History => Box::new(HistoryScreen),
    }
}
