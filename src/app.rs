//! App: terminal init, main loop, frame pacing and key handling.

use crate::GameConfig;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use sweetswap::{Click, GameState, Phase};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    pub const ALL: [Self; 3] = [Self::Resume, Self::Restart, Self::Exit];

    pub fn label(self) -> &'static str {
        match self {
            Self::Resume => " Resume ",
            Self::Restart => " Restart ",
            Self::Exit => " Finish, take coins ",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// Status line for a click that did not start a cascade.
fn click_message(click: Click) -> Option<String> {
    match click {
        Click::NoMatch => Some("No match, swapped back".to_string()),
        Click::Rejected(e) => Some(e.to_string()),
        _ => None,
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    quit_selected: QuitOption,
    last_frame: Instant,
    status: Option<String>,
    /// TachyonFX fade for the exploding cells of one wave.
    explode_effect: Option<Effect>,
    /// Last time we processed the explode effect (for delta).
    explode_effect_process_time: Option<Instant>,
    /// Combo index of the wave the effect belongs to.
    explode_wave: Option<u32>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = GameState::new(config.session.clone());
        Self {
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            quit_selected: QuitOption::Resume,
            last_frame: Instant::now(),
            status: None,
            explode_effect: None,
            explode_effect_process_time: None,
            explode_wave: None,
        }
    }

    fn reset_game(&mut self) {
        self.state.restart();
        self.screen = Screen::Playing;
        self.paused = false;
        self.quit_selected = QuitOption::Resume;
        self.status = None;
        self.reset_explode_effect();
    }

    fn reset_explode_effect(&mut self) {
        self.explode_effect = None;
        self.explode_effect_process_time = None;
        self.explode_wave = None;
    }

    fn open_quit_menu(&mut self) {
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
    }

    /// Run the session in the terminal. Returns the coins earned: the score at
    /// the moment the player finishes, whether or not moves are left.
    pub fn run(&mut self) -> Result<u32> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result.map(|()| self.state.coins_earned())
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let dt = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            if self.screen == Screen::Playing && !self.paused {
                self.tick(dt);
            }

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                    self.status.as_deref(),
                    &mut self.explode_effect,
                    &mut self.explode_effect_process_time,
                    now,
                    self.config.no_animation,
                    self.config.session.timing.explode,
                );
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        self.state.tick(dt);
        let wave = self
            .state
            .frame()
            .filter(|f| f.phase == Phase::Exploding)
            .map(|f| f.combo);
        if wave != self.explode_wave {
            self.reset_explode_effect();
            self.explode_wave = wave;
        }
        if self.state.is_over() {
            self.screen = Screen::GameOver;
        }
    }

    /// Apply one key action. Returns true when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        match self.screen {
            Screen::Playing if self.paused => match action {
                Action::Pause => self.paused = false,
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Up => self.state.move_cursor(-1, 0),
                Action::Down => self.state.move_cursor(1, 0),
                Action::Left => self.state.move_cursor(0, -1),
                Action::Right => self.state.move_cursor(0, 1),
                Action::Select => {
                    let click = self.state.select();
                    if click != Click::Ignored {
                        self.status = click_message(click);
                    }
                }
                Action::Pause => self.paused = true,
                Action::Quit => self.open_quit_menu(),
                Action::Restart | Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.reset_game(),
                    QuitOption::Exit => return true,
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                Action::Restart | Action::None => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return true,
                Action::Restart | Action::Select => self.reset_game(),
                _ => {}
            },
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetswap::{MoveError, Pos, SessionConfig, Timing};

    fn app() -> App {
        let config = GameConfig {
            session: SessionConfig {
                seed: Some(3),
                moves: 1,
                timing: Timing::instant(),
                ..SessionConfig::default()
            },
            frame_rate: 30.0,
            no_animation: true,
        };
        App::new(config, Theme::default())
    }

    #[test]
    fn test_quit_option_cycles() {
        for opt in QuitOption::ALL {
            assert_eq!(opt.next().prev(), opt);
        }
        assert_eq!(QuitOption::Exit.next(), QuitOption::Resume);
    }

    #[test]
    fn test_click_messages() {
        assert!(click_message(Click::NoMatch).is_some());
        let rejected = Click::Rejected(MoveError::SameCell(Pos::new(1, 1)));
        assert_eq!(
            click_message(rejected).as_deref(),
            Some("cannot swap (1, 1) with itself")
        );
        assert_eq!(click_message(Click::Selected(Pos::new(0, 0))), None);
    }

    #[test]
    fn test_quit_menu_flow() {
        let mut app = app();
        assert!(!app.handle_action(Action::Quit));
        assert_eq!(app.screen, Screen::QuitMenu);
        app.handle_action(Action::Down);
        assert_eq!(app.quit_selected, QuitOption::Restart);
        app.handle_action(Action::Down);
        assert!(app.handle_action(Action::Select));
    }

    #[test]
    fn test_finishing_early_takes_the_score() {
        let mut app = app();
        app.state.score = 42;
        app.handle_action(Action::Quit);
        app.handle_action(Action::Up);
        assert_eq!(app.quit_selected, QuitOption::Exit);
        assert!(app.handle_action(Action::Select));
        assert!(!app.state.is_over());
        assert_eq!(app.state.coins_earned(), 42);
    }

    #[test]
    fn test_pause_blocks_moves() {
        let mut app = app();
        let cursor = app.state.cursor;
        app.handle_action(Action::Pause);
        app.handle_action(Action::Left);
        assert_eq!(app.state.cursor, cursor);
        app.handle_action(Action::Pause);
        app.handle_action(Action::Left);
        assert_ne!(app.state.cursor, cursor);
    }

    #[test]
    fn test_restart_from_quit_menu_resets_session() {
        let mut app = app();
        let board = app.state.board.clone();
        app.state.moves_left = 0;
        app.handle_action(Action::Quit);
        app.handle_action(Action::Down);
        app.handle_action(Action::Select);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.state.moves_left, 1);
        assert_eq!(app.state.board, board);
    }
}
