//! App: terminal init, main loop, screens, drop ticks and the clear animation lifecycle.

use crate::GameConfig;
use crate::game::{Arena, GameEvent};
use crate::geometry::DisplayMode;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, LineClear, View};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    NewGame,
    Quit,
}

/// Overlays remember whether the game was paused before they opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Help { was_paused: bool },
    Confirm { prompt: Prompt, was_paused: bool },
    GameOver,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    arena: Arena,
    screen: Screen,
    display: DisplayMode,
    line_clear: Option<LineClear>,
    should_quit: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let arena = Arena::new(config.seed, Instant::now());
        Self {
            display: config.display,
            config,
            theme,
            arena,
            screen: Screen::Playing,
            line_clear: None,
            should_quit: false,
        }
    }

    /// Drops any running animation and starts over on the same generator.
    fn start_new_game(&mut self, now: Instant) {
        self.line_clear = None;
        self.arena.new_game(now);
        self.arena.drain_events();
        self.screen = Screen::Playing;
    }

    /// Pauses and opens `screen`, which restores the pause state when it closes.
    fn open_overlay(&mut self, screen: Screen, now: Instant) {
        self.screen = screen;
        self.arena.set_paused(true, now);
    }

    fn close_overlay(&mut self, was_paused: bool, now: Instant) {
        self.screen = Screen::Playing;
        self.arena.set_paused(was_paused, now);
    }

    fn apply_action(&mut self, action: Action, now: Instant) {
        match self.screen {
            Screen::Playing => self.apply_playing_action(action, now),
            Screen::Help { was_paused } => {
                if action != Action::None {
                    self.close_overlay(was_paused, now);
                }
            }
            Screen::Confirm { prompt, was_paused } => match (action, prompt) {
                (Action::None, _) => {}
                (Action::Confirm, Prompt::NewGame) => self.start_new_game(now),
                (Action::Confirm, Prompt::Quit) => self.should_quit = true,
                _ => self.close_overlay(was_paused, now),
            },
            Screen::GameOver => match action {
                Action::Restart | Action::NewGame => self.start_new_game(now),
                Action::Quit => self.should_quit = true,
                Action::ToggleDisplay => self.toggle_display(),
                _ => {}
            },
        }
    }

    fn apply_playing_action(&mut self, action: Action, now: Instant) {
        let was_paused = self.arena.is_paused();
        match action {
            Action::MoveLeft => {
                self.arena.try_move(-1, 0);
            }
            Action::MoveRight => {
                self.arena.try_move(1, 0);
            }
            Action::SoftDrop => {
                self.arena.try_move(0, -1);
            }
            Action::Pause => {
                self.arena.toggle_pause(now);
            }
            Action::ToggleDisplay => self.toggle_display(),
            Action::Help => self.open_overlay(Screen::Help { was_paused }, now),
            Action::NewGame => self.open_overlay(
                Screen::Confirm {
                    prompt: Prompt::NewGame,
                    was_paused,
                },
                now,
            ),
            Action::Quit => self.open_overlay(
                Screen::Confirm {
                    prompt: Prompt::Quit,
                    was_paused,
                },
                now,
            ),
            Action::Restart | Action::Confirm | Action::None => {}
        }
    }

    /// Not while a clear animation is running: its cell positions belong to the old shape.
    fn toggle_display(&mut self) {
        if self.line_clear.is_some() {
            log::debug!("display change refused during clear animation");
            return;
        }
        self.display = self.display.toggled();
        log::info!("display mode: {}", self.display.label());
    }

    /// Runs a drop tick if one is due and reacts to what the arena reports.
    fn advance(&mut self, now: Instant) {
        let snapshot = (self.arena.until_next_tick(now) == Some(Duration::ZERO))
            .then(|| self.arena.clone());
        if snapshot.is_some() {
            self.arena.poll_tick(now);
        }
        self.handle_events(snapshot, now);
    }

    fn handle_events(&mut self, mut snapshot: Option<Arena>, now: Instant) {
        for event in self.arena.drain_events() {
            match event {
                GameEvent::RingsCleared(result) => match snapshot.take() {
                    Some(before) if self.config.animate => {
                        self.line_clear = Some(LineClear::new(result, before));
                    }
                    _ => self.arena.finish_clear_animation(now),
                },
                GameEvent::LevelUp { level, interval } => {
                    log::debug!("level {level}: interval {interval:?}");
                }
                GameEvent::GameOver { points } => {
                    log::debug!("showing game over, {points} points");
                    self.screen = Screen::GameOver;
                }
                GameEvent::DataChanged => {}
            }
        }
    }

    fn finish_line_clear(&mut self, now: Instant) {
        self.line_clear = None;
        self.arena.finish_clear_animation(now);
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("cannot enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("cannot enter alternate screen")?;

        // Lets held keys arrive as Repeat events where the terminal supports it.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        log::info!(
            "exit: {} points, level {}, {} rings",
            self.arena.score().points(),
            self.arena.score().level(),
            self.arena.score().rings()
        );
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            let now = Instant::now();
            let view = View {
                arena: &self.arena,
                theme: &self.theme,
                screen: self.screen,
                display: self.display,
            };
            let line_clear = self.line_clear.as_mut();
            terminal.draw(|f| ui::draw(f, &view, line_clear, now))?;

            if self.line_clear.as_ref().is_some_and(LineClear::is_done) {
                self.finish_line_clear(Instant::now());
            }

            let mut timeout = self.config.frame_interval.saturating_sub(now.elapsed());
            if let Some(until_tick) = self.arena.until_next_tick(Instant::now()) {
                timeout = timeout.min(until_tick);
            }

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    let action = key_to_action(key);
                    let accepted = match key.kind {
                        KeyEventKind::Press => true,
                        KeyEventKind::Repeat => action.repeats(),
                        _ => false,
                    };
                    if accepted {
                        self.apply_action(action, Instant::now());
                    }
                    if self.should_quit {
                        return Ok(());
                    }
                }
            }

            self.advance(Instant::now());
        }
        Ok(())
    }
}
