use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dbpeek_adapters::mysql::MysqlBackend;
use dbpeek_core::browser::Browser;
use dbpeek_core::config::BrowserConfig;
use dbpeek_core::session::{Command, Direction as Move, Panel, Session};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
use thiserror::Error;
use tokio::runtime::Runtime;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SIDEBAR_WIDTH: u16 = 31;
const DB_HEIGHT: u16 = 3;
const FIELD_ROW_HEIGHT: u16 = 3;
const LIMIT_WIDTH: u16 = 11;
const OFFSET_WIDTH: u16 = 10;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub fn run(config: &BrowserConfig) -> Result<(), TuiError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &runtime, config);
    let restore_result = restore_terminal(&mut terminal);

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }

    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    runtime: &Runtime,
    config: &BrowserConfig,
) -> Result<(), TuiError> {
    let mut session = Session::new(config);
    let browser = Browser::new(MysqlBackend);
    log::info!("session started with {:?}", session.descriptor());

    loop {
        terminal.draw(|frame| render(frame, &session))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = map_key_event(key) {
                        if let Some(task) = session.handle(command) {
                            // One keypress, one blocking round trip.
                            runtime.block_on(browser.perform(task, &mut session));
                        }
                    }
                }
            }
        }

        if session.should_quit() {
            break;
        }
    }

    log::info!("session ended");
    Ok(())
}

fn render(frame: &mut Frame<'_>, session: &Session) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
        .split(frame.area());
    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(DB_HEIGHT), Constraint::Min(3)])
        .split(columns[0]);
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(FIELD_ROW_HEIGHT)])
        .split(columns[1]);
    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(LIMIT_WIDTH),
            Constraint::Length(OFFSET_WIDTH),
        ])
        .split(main[1]);

    render_field(frame, session, Panel::Db, sidebar[0]);
    render_tables(frame, session, sidebar[1]);
    render_output(frame, session, main[0]);
    render_field(frame, session, Panel::Where, fields[0]);
    render_field(frame, session, Panel::Limit, fields[1]);
    render_field(frame, session, Panel::Page, fields[2]);
}

fn panel_block(session: &Session, panel: Panel) -> Block<'static> {
    let border_style = if session.focus() == panel {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(panel.title())
}

fn render_field(frame: &mut Frame<'_>, session: &Session, panel: Panel, area: Rect) {
    let Some(field) = session.field(panel) else {
        return;
    };
    let block = panel_block(session, panel);
    let inner = block.inner(area);

    // Keep the cursor inside the box by sliding the text left.
    let cursor_column = to_u16(field.cursor_column());
    let scroll_x = cursor_column.saturating_sub(inner.width.saturating_sub(1));
    let paragraph = Paragraph::new(field.text())
        .block(block)
        .scroll((0, scroll_x));
    frame.render_widget(paragraph, area);

    if session.focus() == panel && session.cursor_visible() && inner.width > 0 {
        frame.set_cursor_position((inner.x + cursor_column - scroll_x, inner.y));
    }
}

fn render_tables(frame: &mut Frame<'_>, session: &Session, area: Rect) {
    let items = session
        .tables()
        .names()
        .iter()
        .map(|name| ListItem::new(name.as_str()))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(panel_block(session, Panel::Tables))
        .highlight_style(Style::default().bg(Color::Green).fg(Color::Black));
    let mut state = ListState::default().with_selected(session.tables().selected_index());
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_output(frame: &mut Frame<'_>, session: &Session, area: Rect) {
    let block = panel_block(session, Panel::Output);
    let inner = block.inner(area);
    let (row, column) = session.output().scroll();
    let paragraph = Paragraph::new(session.output().text())
        .block(block)
        .scroll((to_u16(row), to_u16(column)));
    frame.render_widget(paragraph, area);

    if session.focus() == Panel::Output && session.cursor_visible() {
        frame.set_cursor_position((inner.x, inner.y));
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn map_key_event(key: KeyEvent) -> Option<Command> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Command::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => Some(Command::RefreshTables),
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => Some(Command::NextPage),
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => Some(Command::PreviousPage),
        (_, KeyCode::Tab) => Some(Command::CycleFocus),
        (_, KeyCode::Enter) => Some(Command::Submit),
        (_, KeyCode::Backspace) => Some(Command::DeleteBackward),
        (_, KeyCode::Up) => Some(Command::Navigate(Move::Up)),
        (_, KeyCode::Down) => Some(Command::Navigate(Move::Down)),
        (_, KeyCode::Left) => Some(Command::Navigate(Move::Left)),
        (_, KeyCode::Right) => Some(Command::Navigate(Move::Right)),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(ch)) => {
            Some(Command::Insert(ch))
        }
        _ => None,
    }
}
