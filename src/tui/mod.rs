pub mod app;
pub mod ui;

use std::{error::Error, io, time::Duration};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use app::{App, InputMode, InputField, ViewMode};
use ui::ui;

/// Runs the interactive board, acting as `user`.
pub fn run_tui(user: &str) -> Result<(), Box<dyn Error>> {
    // Load before touching the terminal so errors print normally.
    let mut app = App::new(user)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Redraw now and then so the board follows the date.
        if !event::poll(Duration::from_secs(60))? {
            app.reload();
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char('v') | KeyCode::Tab => app.toggle_view(),
                KeyCode::Char(' ') if app.view_mode == ViewMode::Week => app.toggle_selected(),
                KeyCode::Char(' ') | KeyCode::Enter => app.complete_selected(),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                KeyCode::Char('a') => app.start_add(),
                KeyCode::Char('n') => app.start_edit(InputField::Name),
                KeyCode::Char('e') => app.start_edit(InputField::Every),
                KeyCode::Left | KeyCode::Char('h') => app.shift_week(-1),
                KeyCode::Right | KeyCode::Char('l') => app.shift_week(1),
                KeyCode::Char('t') => app.shift_week(0),
                _ => {}
            },
            InputMode::Editing | InputMode::Adding => match key.code {
                KeyCode::Enter => app.handle_input(),
                KeyCode::Esc => {
                    app.input_mode = InputMode::Normal;
                    app.input_buffer.clear();
                }
                KeyCode::Char(c) => {
                    app.input_buffer.push(c);
                }
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            }
        }
    }
}
