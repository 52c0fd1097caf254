use std::io;
use std::path::PathBuf;
use std::time::Instant;

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{execute, terminal::SetTitle};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};
use tickcounter_config::{Config, format_compact};
use tickcounter_core::{Display, Mode, TimeSource};
use tickcounter_fonts::{GLYPH_HEIGHT, build_clock_art, build_countdown_art};
use tracing::{info, warn};

use crate::engine::{Engine, EngineEvent};

const ACCENT: Color = Color::Rgb(100, 200, 255);

/// Header shown when no title is configured.
const DEFAULT_TITLE: &str = "TickCounter";

/// Which line of the settings prompt has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Title,
}

/// The in-terminal settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    field: Field,
    date: String,
    title: String,
}

impl Prompt {
    fn input(&mut self) -> &mut String {
        match self.field {
            Field::Date => &mut self.date,
            Field::Title => &mut self.title,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            Field::Date => Field::Title,
            Field::Title => Field::Date,
        };
    }
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App<C> {
    /// Is the application running?
    running: bool,
    engine: Engine<C>,
    config: Config,
    /// Where settings are saved; `None` disables saving.
    config_path: Option<PathBuf>,
    prompt: Option<Prompt>,
}

impl<C: TimeSource> App<C> {
    pub fn new(engine: Engine<C>, config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            running: false,
            engine,
            config,
            config_path,
            prompt: None,
        }
    }

    /// Size the surfaces to the terminal, then apply the configured target.
    pub fn start(&mut self, cols: u16, rows: u16, now: Instant) {
        self.engine.resize(cols, rows);
        if let Some(target) = self.config.target.clone() {
            let mode = self.engine.apply_target_str(&target, now);
            info!(?mode, "initial target applied");
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        self.set_window_title()?;
        let size = terminal.size()?;
        self.start(size.width, size.height, Instant::now());
        while self.running {
            let now = Instant::now();
            for event in self.engine.run_due(now) {
                self.on_engine_event(event);
            }
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }
        Ok(())
    }

    fn set_window_title(&self) -> Result<()> {
        execute!(io::stdout(), SetTitle(self.config.window_title()))?;
        Ok(())
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Expired => info!("countdown reached its target"),
            EngineEvent::ExplosionFinished => info!("explosion done"),
        }
    }

    /// Renders the user interface.
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.engine.resize(area.width, area.height);
        frame.render_widget(self.engine.layers(), area);

        let chunks = Layout::vertical([
            Constraint::Length(1),                   // Title
            Constraint::Fill(1),                     // Top padding
            Constraint::Length(GLYPH_HEIGHT as u16), // Big digits
            Constraint::Length(1),                   // Spacing
            Constraint::Length(1),                   // Caption
            Constraint::Fill(1),                     // Bottom padding
            Constraint::Length(1),                   // Help text
        ])
        .split(area);

        match self.engine.display() {
            Display::Expired => Self::render_expired(frame, chunks[2], chunks[4]),
            display => {
                let title = self.config.title.as_deref().unwrap_or(DEFAULT_TITLE);
                let header = Paragraph::new(title)
                    .style(Style::new().fg(ACCENT).bold())
                    .alignment(Alignment::Center);
                frame.render_widget(header, chunks[0]);
                let (art, caption) = match display {
                    Display::Countdown(b) => (build_countdown_art(&b), "until the target"),
                    Display::Clock(c) => (build_clock_art(&c), "local time"),
                    Display::Expired => (Vec::new(), ""),
                };
                let lines: Vec<Line> = art
                    .into_iter()
                    .map(|s| Line::from(s).style(Style::new().fg(Color::White)))
                    .collect();
                frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[2]);
                frame.render_widget(
                    Paragraph::new(caption.dark_gray()).alignment(Alignment::Center),
                    chunks[4],
                );
            }
        }

        let help = Line::from(vec![
            "q".bold().fg(ACCENT),
            " quit  ".dark_gray(),
            "s".bold().fg(ACCENT),
            " settings".dark_gray(),
        ])
        .centered();
        frame.render_widget(help, chunks[6]);

        if let Some(prompt) = &self.prompt {
            render_prompt(frame, area, prompt);
        }
    }

    fn render_expired(frame: &mut Frame, message: Rect, hint: Rect) {
        let lines = vec![
            Line::from("THE TIME IS").fg(Color::White),
            Line::from(""),
            Line::from("NOW").fg(ACCENT).bold(),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), message);
        let hint_line = Line::from(vec![
            "n".bold().fg(ACCENT),
            " create a new countdown".dark_gray(),
        ])
        .centered();
        frame.render_widget(hint_line, hint);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    /// Waits no longer than the next scheduled task.
    fn handle_crossterm_events(&mut self) -> Result<()> {
        let timeout = self.engine.time_until_next(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Resize(cols, rows) => {
                    self.engine.resize(cols, rows);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.quit();
            return;
        }
        if self.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.quit(),
            KeyCode::Char('s') => self.open_prompt(),
            KeyCode::Char('n') if self.engine.mode() == Mode::Expired => self.open_prompt(),
            _ => {}
        }
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => prompt.toggle_field(),
            KeyCode::Backspace => {
                prompt.input().pop();
            }
            KeyCode::Char(c) => prompt.input().push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.apply_prompt(prompt, Instant::now());
                }
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self) {
        self.prompt = Some(Prompt {
            field: Field::Date,
            date: self.engine.target().map(|t| format_compact(&t)).unwrap_or_default(),
            title: self.config.title.clone().unwrap_or_default(),
        });
    }

    /// Apply the form: new target (blank clears it), new title, then persist.
    fn apply_prompt(&mut self, prompt: Prompt, now: Instant) {
        let mode = self.engine.apply_target_str(&prompt.date, now);
        self.config.target = match mode {
            Mode::Clock => None,
            Mode::Countdown | Mode::Expired => self.engine.target().map(|t| format_compact(&t)),
        };
        let title = prompt.title.trim();
        self.config.title = (!title.is_empty()).then(|| title.to_string());
        if let Err(e) = self.set_window_title() {
            warn!(error = %e, "cannot set window title");
        }
        self.save_config();
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save(path) {
            warn!(error = %e, "settings not saved");
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let [row] = Layout::vertical([Constraint::Length(6)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Max(56)])
        .flex(Flex::Center)
        .areas(row);

    let field_line = |label: &str, value: &str, focused: bool| {
        let cursor = if focused { "_" } else { "" };
        let style = if focused {
            Style::new().fg(ACCENT)
        } else {
            Style::new().fg(Color::Gray)
        };
        Line::from(vec![
            Span::styled(label.to_string(), Style::new().bold()),
            Span::raw(format!("{value}{cursor}")),
        ])
        .style(style)
    };
    let lines = vec![
        field_line("Date:  ", &prompt.date, prompt.field == Field::Date),
        field_line("Title: ", &prompt.title, prompt.field == Field::Title),
        Line::from(""),
        Line::from("YYYYMMDDHHMMSS or ISO, empty for clock. Enter/Tab/Esc").dark_gray(),
    ];
    let block = Block::bordered().title(" Settings ").border_style(Style::new().fg(ACCENT));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSettings;
    use chrono::{Local, TimeDelta};
    use ratatui::{Terminal, backend::TestBackend};
    use tickcounter_core::ManualClock;

    fn app(config: Config, config_path: Option<PathBuf>) -> App<ManualClock> {
        let settings = EngineSettings {
            seed: 5,
            ..EngineSettings::default()
        };
        let engine = Engine::new(ManualClock::new(Local::now()), settings, Instant::now());
        App::new(engine, config, config_path)
    }

    fn press(app: &mut App<ManualClock>, code: KeyCode) {
        app.on_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<ManualClock>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen(app: &mut App<ManualClock>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app(Config::default(), None);
        app.running = true;
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);

        app.running = true;
        app.on_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn test_prompt_sets_countdown_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut app = app(Config::default(), Some(path.clone()));

        press(&mut app, KeyCode::Char('s'));
        assert!(app.prompt.is_some());
        type_text(&mut app, "20991231235959");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Party");
        press(&mut app, KeyCode::Enter);

        assert!(app.prompt.is_none());
        assert_eq!(app.engine.mode(), Mode::Countdown);
        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.target.as_deref(), Some("20991231235959"));
        assert_eq!(saved.title.as_deref(), Some("Party"));
    }

    #[test]
    fn test_empty_date_returns_to_clock() {
        let config = Config {
            target: Some("20991231235959".into()),
            ..Config::default()
        };
        let mut app = app(config, None);
        app.start(80, 24, Instant::now());
        assert_eq!(app.engine.mode(), Mode::Countdown);

        press(&mut app, KeyCode::Char('s'));
        for _ in 0..14 {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.engine.mode(), Mode::Clock);
        assert_eq!(app.config.target, None);
    }

    #[test]
    fn test_escape_cancels_prompt() {
        let mut app = app(Config::default(), None);
        press(&mut app, KeyCode::Char('s'));
        type_text(&mut app, "2099");
        press(&mut app, KeyCode::Esc);
        assert!(app.prompt.is_none());
        assert_eq!(app.engine.mode(), Mode::Clock);
    }

    #[test]
    fn test_new_key_only_when_expired() {
        let mut app = app(Config::default(), None);
        press(&mut app, KeyCode::Char('n'));
        assert!(app.prompt.is_none());

        let now = Instant::now();
        app.engine.start_countdown(Local::now() - TimeDelta::seconds(5), now);
        app.engine.run_due(now);
        assert_eq!(app.engine.mode(), Mode::Expired);
        press(&mut app, KeyCode::Char('n'));
        assert!(app.prompt.is_some());
    }

    #[test]
    fn test_expired_screen_hides_counter() {
        let config = Config {
            title: Some("Launch".into()),
            ..Config::default()
        };
        let mut app = app(config, None);
        let now = Instant::now();
        app.engine.run_due(now);
        let text = screen(&mut app);
        assert!(text.contains("Launch"));
        assert!(text.contains("local time"));

        app.engine.start_countdown(Local::now() - TimeDelta::seconds(1), now);
        app.engine.run_due(now);
        let text = screen(&mut app);
        assert!(text.contains("THE TIME IS"));
        assert!(text.contains("NOW"));
        assert!(!text.contains("Launch"));
    }

    #[test]
    fn test_default_header_without_title() {
        let mut app = app(Config::default(), None);
        app.engine.run_due(Instant::now());
        let text = screen(&mut app);
        assert!(text.lines().next().unwrap().contains(DEFAULT_TITLE));
    }

    #[test]
    fn test_past_target_at_startup_explodes() {
        let config = Config {
            target: Some("20000101000000".into()),
            ..Config::default()
        };
        let mut app = app(config, None);
        let now = Instant::now();
        app.start(80, 24, now);
        assert_eq!(app.engine.run_due(now), vec![EngineEvent::Expired]);
        assert_eq!(app.engine.mode(), Mode::Expired);
        assert!(app.engine.explosion().is_some());
    }
}
