use std::io;
use std::time::Duration;

use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use crate::gridchart::app::App;
use crate::gridchart::events::{handle_key_event, poll_event};
use crate::gridchart::ui;
use crate::gridcommon::Result;

/// Event poll interval of the draw loop
const TICK: Duration = Duration::from_millis(250);

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Show the chart until the user quits
pub fn run_tui(mut app: App) -> Result<()> {
    // 控制台日志写在 stderr，进入备用屏幕后不再输出日志
    info!(target: "grid_chart", "starting chart view");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }

    // 任何返回路径（包括 ? 提前返回）都恢复终端
    let _restore = scopeguard::guard((), |_| restore_terminal());

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        restore_terminal();
        original_hook(panic);
    }));

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    while app.running {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Resize 事件只需要下一轮重绘
        if let Some(Event::Key(key)) = poll_event(TICK)? {
            handle_key_event(&mut app, key);
        }
    }

    terminal.show_cursor()?;
    Ok(())
}
