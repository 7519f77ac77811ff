// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

use crate::models::CurrencyCode;
use crate::state::RatesStatus;
use crate::view::ConverterView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Base,
    Target,
    Amount,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Base => Focus::Target,
            Focus::Target => Focus::Amount,
            Focus::Amount => Focus::Base,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Base => Focus::Amount,
            Focus::Target => Focus::Base,
            Focus::Amount => Focus::Target,
        }
    }
}

/// A filterable list of currencies with a cursor.
#[derive(Debug, Default)]
pub struct Picker {
    query: String,
    selected: Option<usize>,
}

impl Picker {
    pub fn next(&mut self, len: usize) {
        if len == 0 {
            self.selected = None;
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.selected = Some(i);
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            self.selected = None;
            return;
        }
        let i = match self.selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn push(&mut self, c: char) {
        self.query.push(c);
        self.selected = Some(0);
    }

    fn pop(&mut self) {
        self.query.pop();
        self.selected = Some(0);
    }

    fn clear(&mut self) {
        self.query.clear();
        self.selected = None;
    }
}

/// Screen state on top of the converter view: which field has focus, what
/// is being typed, and the last message for the status line.
pub struct App {
    view: ConverterView,
    focus: Focus,
    base: Picker,
    target: Picker,
    amount: String,
    message: Option<String>,
}

impl App {
    pub fn new(view: ConverterView) -> App {
        let amount = view.state().amount().to_string();
        App {
            view,
            focus: Focus::Base,
            base: Picker::default(),
            target: Picker::default(),
            amount,
            message: None,
        }
    }

    pub fn view(&self) -> &ConverterView {
        &self.view
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    fn options(&self, focus: Focus) -> Vec<CurrencyCode> {
        match focus {
            Focus::Base => self.view.catalog().filter(&self.base.query),
            Focus::Target => self.view.catalog().filter(&self.target.query),
            Focus::Amount => Vec::new(),
        }
    }

    /// Returns false once the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return false,
                KeyCode::Char('t') => match self.view.toggle_theme() {
                    Ok(_) => self.message = None,
                    Err(e) => self.message = Some(format!("{e:#}")),
                },
                KeyCode::Char('r') => self.view.retry(),
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            _ => match self.focus {
                Focus::Base | Focus::Target => self.handle_picker_key(key.code),
                Focus::Amount => self.handle_amount_key(key.code),
            },
        }
        true
    }

    fn picker_mut(&mut self, focus: Focus) -> &mut Picker {
        match focus {
            Focus::Base => &mut self.base,
            _ => &mut self.target,
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        let focus = self.focus;
        let options = self.options(focus);
        let picker = self.picker_mut(focus);

        match code {
            KeyCode::Down => picker.next(options.len()),
            KeyCode::Up => picker.previous(options.len()),
            KeyCode::Backspace => picker.pop(),
            KeyCode::Char(c) => picker.push(c),
            KeyCode::Enter => {
                let index = picker.selected.unwrap_or(0);
                let Some(choice) = options.get(index) else {
                    self.message = Some("Nothing found.".to_string());
                    return;
                };
                let outcome = match focus {
                    Focus::Base => self.view.select_base(choice.as_str()),
                    _ => self.view.select_target(choice.as_str()),
                };
                match outcome {
                    Ok(()) => {
                        self.message = None;
                        self.picker_mut(focus).clear();
                        self.focus = focus.next();
                    }
                    Err(e) => self.message = Some(e.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_amount_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                self.amount.push(c);
                self.view.set_amount(&self.amount);
            }
            KeyCode::Backspace => {
                self.amount.pop();
                self.view.set_amount(&self.amount);
            }
            KeyCode::Enter => {
                self.view.poll_fetches();
                match self.view.submit() {
                    Ok(_) => self.message = None,
                    Err(e) => self.message = Some(e.to_string()),
                }
            }
            _ => {}
        }
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        app.view.poll_fetches();
        terminal.draw(|f| draw_ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

struct Palette {
    text: Style,
    accent: Color,
    muted: Color,
}

impl Palette {
    fn new(dark: bool) -> Self {
        if dark {
            Palette {
                text: Style::default().fg(Color::White).bg(Color::Black),
                accent: Color::LightMagenta,
                muted: Color::DarkGray,
            }
        } else {
            Palette {
                text: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Magenta,
                muted: Color::Gray,
            }
        }
    }
}

fn draw_ui(f: &mut Frame, app: &App) {
    let palette = Palette::new(app.view.dark_mode());
    f.render_widget(Block::default().style(palette.text), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(f.size());

    let title = Paragraph::new("Currency Exchanger")
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let pickers = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_picker(f, app, Focus::Base, pickers[0], &palette);
    draw_picker(f, app, Focus::Target, pickers[1], &palette);

    let amount = Paragraph::new(app.amount.as_str()).block(
        Block::default()
            .title("Amount of money")
            .borders(Borders::ALL)
            .border_style(border_style(app.focus == Focus::Amount, &palette)),
    );
    f.render_widget(amount, chunks[2]);

    let result = match app.view.result() {
        Some(conversion) => conversion.to_string(),
        None => "0".to_string(),
    };
    let result = Paragraph::new(result)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().title("Result").borders(Borders::ALL));
    f.render_widget(result, chunks[3]);

    f.render_widget(status_line(app, &palette), chunks[4]);

    let help = Paragraph::new("Tab switch field · type to filter · ↑/↓ move · Enter select/exchange · Ctrl-T theme · Ctrl-R retry · Esc quit")
        .style(Style::default().fg(palette.muted));
    f.render_widget(help, chunks[5]);
}

fn border_style(focused: bool, palette: &Palette) -> Style {
    if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default()
    }
}

fn draw_picker(f: &mut Frame, app: &App, focus: Focus, area: Rect, palette: &Palette) {
    let (title, picker, chosen) = match focus {
        Focus::Base => ("Original Currency", &app.base, app.view.state().base()),
        _ => ("Target Currency", &app.target, app.view.state().target()),
    };
    let focused = app.focus == focus;

    let block = Block::default()
        .title(format!("{} [{}]", title, picker.query))
        .borders(Borders::ALL)
        .border_style(border_style(focused, palette));

    let options = app.options(focus);
    if options.is_empty() {
        let empty = Paragraph::new("Nothing found.").block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = options
        .iter()
        .map(|code| {
            let mark = if Some(code) == chosen { "✓ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(palette.accent)),
                Span::raw(code.as_str().to_string()),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::White)
            .bg(palette.accent)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if focused {
        state.select(picker.selected);
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn status_line<'a>(app: &'a App, palette: &Palette) -> Paragraph<'a> {
    let error = Style::default().fg(Color::Red);
    if let Some(message) = &app.message {
        return Paragraph::new(message.as_str()).style(error);
    }
    if let Some(e) = app.view.error() {
        return Paragraph::new(e.to_string()).style(error);
    }

    let text = match app.view.state().status() {
        RatesStatus::Idle => "Select the currency that you want to exchange".to_string(),
        RatesStatus::Pending { ticket } => format!("Fetching rates for {}...", ticket.base),
        RatesStatus::Stale { table, .. } => format!("Refreshing rates for {}...", table.base()),
        RatesStatus::Ready { table } => match table.updated() {
            Some(updated) => format!(
                "Rates for {} as of {}",
                table.base(),
                updated.format("%Y-%m-%d %H:%M UTC")
            ),
            None => format!("Rates for {} loaded", table.base()),
        },
        RatesStatus::Failed { base, reason } => format!("Rates for {base} unavailable: {reason}"),
    };
    Paragraph::new(text).style(Style::default().fg(palette.muted))
}

pub fn start_tui(view: ConverterView) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(view);
    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}
