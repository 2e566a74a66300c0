use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::gridchart::app::App;
use crate::gridcommon::{GridDataset, Result};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Windows 上会同时收到按下和释放事件
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Series visibility
        KeyCode::Char('1') => app.toggle(GridDataset::Wind),
        KeyCode::Char('2') => app.toggle(GridDataset::Hydro),
        KeyCode::Char('3') => app.toggle(GridDataset::Nuclear),
        KeyCode::Char('4') => app.toggle(GridDataset::Co2),
        KeyCode::Char('a') => app.show_all(),

        KeyCode::Char('m') => app.toggle_markers(),
        KeyCode::Char('?') => app.toggle_help(),
        _ => {}
    }
}
