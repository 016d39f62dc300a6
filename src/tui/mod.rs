pub mod app;
pub mod ui;

use std::io;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::storage::JsonStore;
use app::{App, InputMode};
use ui::ui;

pub fn run_tui(store: JsonStore) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Left | KeyCode::Char('h') => app.shift(false),
                KeyCode::Right | KeyCode::Char('l') => app.shift(true),
                KeyCode::Char(' ') => app.toggle_selected(),
                KeyCode::Char('t') => app.go_today(),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                KeyCode::Char('p') => app.toggle_active_selected(),
                KeyCode::Char('a') => app.start_add(),
                KeyCode::Char('v') | KeyCode::Tab => app.toggle_view(),
                _ => {}
            },
            InputMode::Adding => match key.code {
                KeyCode::Enter => app.handle_input(),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => {
                    app.input_buffer.push(c);
                }
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            },
        }
    }
}
