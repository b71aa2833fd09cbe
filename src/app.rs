//! App: terminal init, main loop, frame timing and key handling.

use crate::config::{
    Difficulty, GameConfig, MAX_GRID_HEIGHT, MAX_GRID_WIDTH, MIN_GRID_HEIGHT, MIN_GRID_WIDTH,
};
use crate::game::GameState;
use crate::highscores::BestScoreStore;
use crate::input::{Action, InputQueue, key_to_action};
use crate::piece::RandomPolicy;
use crate::theme::Theme;
use crate::ui::{self, ClearFlash, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Redraw cadence between logic frames (~60 FPS).
const RENDER_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

impl QuitOption {
    pub const ALL: [Self; 3] = [Self::Resume, Self::MainMenu, Self::Exit];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resume => " Resume ",
            Self::MainMenu => " Main Menu ",
            Self::Exit => " Exit ",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Resume => Self::MainMenu,
            Self::MainMenu => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::MainMenu => Self::Resume,
            Self::Exit => Self::MainMenu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Difficulty,
    Width,
    Height,
    Start,
}

impl MenuTab {
    fn next(self) -> Self {
        match self {
            Self::Difficulty => Self::Width,
            Self::Width => Self::Height,
            Self::Height => Self::Start,
            Self::Start => Self::Difficulty,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Difficulty => Self::Start,
            Self::Width => Self::Difficulty,
            Self::Height => Self::Width,
            Self::Start => Self::Height,
        }
    }
}

/// Main menu selections; applied to the config when a game starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub difficulty: Difficulty,
    pub width: u16,
    pub height: u16,
}

impl MenuState {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            current_tab: MenuTab::Difficulty,
            difficulty: config.difficulty,
            width: config.width,
            height: config.height,
        }
    }

    /// Left/right on the current tab: cycle difficulty, step grid size within bounds.
    pub fn adjust(&mut self, step: i32) {
        match self.current_tab {
            MenuTab::Difficulty => {
                let all = Difficulty::ALL;
                let i = all.iter().position(|d| *d == self.difficulty).unwrap_or(0) as i32;
                let n = all.len() as i32;
                self.difficulty = all[(i + step).rem_euclid(n) as usize];
            }
            MenuTab::Width => {
                self.width = step_within(self.width, step, MIN_GRID_WIDTH, MAX_GRID_WIDTH);
            }
            MenuTab::Height => {
                self.height = step_within(self.height, step, MIN_GRID_HEIGHT, MAX_GRID_HEIGHT);
            }
            MenuTab::Start => {}
        }
    }

    pub fn apply_to(&self, config: &mut GameConfig) {
        config.difficulty = self.difficulty;
        config.width = self.width;
        config.height = self.height;
    }
}

fn step_within(value: u16, step: i32, min: u16, max: u16) -> u16 {
    (i32::from(value) + step).clamp(i32::from(min), i32::from(max)) as u16
}

/// Front-end switches that don't change the rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppOptions {
    /// Skip main menu and start game immediately.
    pub no_menu: bool,
    /// Disable the row-clear flash.
    pub no_animation: bool,
}

pub struct App {
    config: GameConfig,
    options: AppOptions,
    theme: Theme,
    store: Box<dyn BestScoreStore>,
    state: GameState,
    screen: Screen,
    menu: MenuState,
    quit_selected: QuitOption,
    input: InputQueue,
    last_frame: Instant,
    flash: ClearFlash,
    new_record: bool,
    save_error: Option<String>,
}

fn new_game(config: &GameConfig, store: &dyn BestScoreStore) -> Result<GameState> {
    let policy = Box::new(RandomPolicy::new(config.pieces, config.seed));
    Ok(GameState::new(config, policy, store.read())?)
}

impl App {
    pub fn new(
        config: GameConfig,
        options: AppOptions,
        theme: Theme,
        store: Box<dyn BestScoreStore>,
    ) -> Result<Self> {
        let state = new_game(&config, store.as_ref())?;
        let screen = if options.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Ok(Self {
            menu: MenuState::from_config(&config),
            config,
            options,
            theme,
            store,
            state,
            screen,
            quit_selected: QuitOption::Resume,
            input: InputQueue::new(),
            last_frame: Instant::now(),
            flash: ClearFlash::default(),
            new_record: false,
            save_error: None,
        })
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    fn reset_game(&mut self) -> Result<()> {
        self.state = new_game(&self.config, self.store.as_ref())?;
        self.screen = Screen::Playing;
        self.quit_selected = QuitOption::Resume;
        self.input.clear_pending();
        self.flash = ClearFlash::default();
        self.last_frame = Instant::now();
        self.new_record = false;
        self.save_error = None;
        Ok(())
    }

    /// Record the best score; a failed write is shown, not fatal.
    fn save_best(&mut self) {
        match self.state.record_best(self.store.as_mut()) {
            Ok(record) => self.new_record |= record,
            Err(e) => self.save_error = Some(format!("{e:#}")),
        }
    }

    fn finish_game(&mut self) {
        self.save_best();
        self.input.clear_pending();
        self.screen = Screen::GameOver;
    }

    /// Handle one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let action = key_to_action(key);
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return Ok(true),
                Action::MoveLeft => self.menu.adjust(-1),
                Action::MoveRight => self.menu.adjust(1),
                Action::SoftDrop => self.menu.current_tab = self.menu.current_tab.next(),
                Action::RotateCw | Action::RotateCcw => {
                    self.menu.current_tab = self.menu.current_tab.prev();
                }
                Action::HardDrop => {
                    if self.menu.current_tab == MenuTab::Start {
                        self.menu.apply_to(&mut self.config);
                        self.reset_game()?;
                    } else {
                        self.menu.current_tab = MenuTab::Start;
                    }
                }
                _ => {}
            },
            Screen::Playing => {
                if self.state.is_paused() {
                    match action {
                        Action::Pause => self.state.toggle_pause(),
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        _ => {}
                    }
                    return Ok(false);
                }
                match action {
                    Action::Quit => {
                        self.screen = Screen::QuitMenu;
                        self.quit_selected = QuitOption::Resume;
                    }
                    Action::Pause => {
                        self.state.toggle_pause();
                        self.input.clear_pending();
                    }
                    Action::Stop => {
                        self.state.stop();
                        self.finish_game();
                    }
                    a if a.is_gameplay() => self.input.push(a),
                    _ => {}
                }
            }
            Screen::QuitMenu => match action {
                Action::SoftDrop | Action::MoveRight => {
                    self.quit_selected = self.quit_selected.next();
                }
                Action::RotateCw | Action::RotateCcw | Action::MoveLeft => {
                    self.quit_selected = self.quit_selected.prev();
                }
                Action::HardDrop => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::MainMenu => {
                        self.save_best();
                        self.menu = MenuState::from_config(&self.config);
                        self.screen = Screen::Menu;
                    }
                    QuitOption::Exit => {
                        self.save_best();
                        return Ok(true);
                    }
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::GameOver => {
                if action == Action::Quit {
                    return Ok(true);
                }
                match key.code {
                    KeyCode::Char('r' | 'R') => self.reset_game()?,
                    KeyCode::Char('m' | 'M') => {
                        self.menu = MenuState::from_config(&self.config);
                        self.screen = Screen::Menu;
                    }
                    _ => {}
                }
            }
        }
        Ok(false)
    }

    /// Run one logic frame if the tick interval has elapsed.
    fn tick(&mut self) {
        if self.screen != Screen::Playing || self.state.is_paused() {
            return;
        }
        if self.last_frame.elapsed() < self.config.difficulty.tick_interval() {
            return;
        }
        self.last_frame = Instant::now();
        let input = self.input.poll();
        self.input.clear_pending();
        let report = self.state.frame(input);
        if !report.cleared_rows.is_empty() && !self.options.no_animation {
            self.flash.start(report.cleared_rows);
        }
        if report.game_over {
            self.finish_game();
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events let us ignore key-up; terminals without support just send presses.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let animate = !self.options.no_animation;
        loop {
            let now = Instant::now();
            self.flash.finish_if_done();
            let view = View {
                screen: self.screen,
                state: &self.state,
                theme: &self.theme,
                menu: &self.menu,
                quit_selected: self.quit_selected,
                new_record: self.new_record,
                save_error: self.save_error.as_deref(),
            };
            let flash = &mut self.flash;
            terminal.draw(|f| ui::draw(f, &view, flash, now, animate))?;

            let until_frame = self
                .config
                .difficulty
                .tick_interval()
                .saturating_sub(self.last_frame.elapsed());
            let timeout = RENDER_INTERVAL.min(until_frame);

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        if self.handle_key(key)? {
                            return Ok(());
                        }
                    }
                }
            }

            self.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::MemoryStore;
    use crossterm::event::KeyModifiers;

    fn app(no_menu: bool) -> App {
        let config = GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        };
        let options = AppOptions {
            no_menu,
            no_animation: true,
        };
        App::new(config, options, Theme::default(), Box::new(MemoryStore::new(50))).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    #[test]
    fn test_menu_adjusts_and_clamps() {
        let mut menu = MenuState::from_config(&GameConfig::default());
        menu.adjust(-1);
        assert_eq!(menu.difficulty, Difficulty::Hard);
        menu.current_tab = menu.current_tab.next();
        assert_eq!(menu.current_tab, MenuTab::Width);
        for _ in 0..30 {
            menu.adjust(1);
        }
        assert_eq!(menu.width, MAX_GRID_WIDTH);
        menu.current_tab = MenuTab::Height;
        for _ in 0..30 {
            menu.adjust(-1);
        }
        assert_eq!(menu.height, MIN_GRID_HEIGHT);
    }

    #[test]
    fn test_menu_start_applies_selection() {
        let mut a = app(false);
        assert_eq!(a.screen(), Screen::Menu);
        press(&mut a, KeyCode::Right); // difficulty -> medium
        press(&mut a, KeyCode::Down); // width tab
        press(&mut a, KeyCode::Left);
        press(&mut a, KeyCode::Enter); // jump to start
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen(), Screen::Playing);
        assert_eq!(a.state().config().difficulty, Difficulty::Medium);
        assert_eq!(a.state().grid().width(), 13);
    }

    #[test]
    fn test_quit_menu_resume_and_exit() {
        let mut a = app(true);
        assert!(!press(&mut a, KeyCode::Char('q')));
        assert_eq!(a.screen(), Screen::QuitMenu);
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen(), Screen::Playing);
        press(&mut a, KeyCode::Char('q'));
        press(&mut a, KeyCode::Down);
        press(&mut a, KeyCode::Down);
        assert!(press(&mut a, KeyCode::Enter));
    }

    #[test]
    fn test_stop_then_restart() {
        let mut a = app(true);
        press(&mut a, KeyCode::Char('s'));
        assert_eq!(a.screen(), Screen::GameOver);
        assert!(a.state().is_stopped());
        assert_eq!(a.state().best_score(), 50);
        press(&mut a, KeyCode::Char('r'));
        assert_eq!(a.screen(), Screen::Playing);
        assert!(!a.state().is_over());
        press(&mut a, KeyCode::Char('s'));
        press(&mut a, KeyCode::Char('m'));
        assert_eq!(a.screen(), Screen::Menu);
    }

    #[test]
    fn test_pause_routes_only_resume() {
        let mut a = app(true);
        press(&mut a, KeyCode::Char('p'));
        assert!(a.state().is_paused());
        press(&mut a, KeyCode::Left);
        assert!(a.input.is_empty());
        press(&mut a, KeyCode::Char('p'));
        assert!(!a.state().is_paused());
        press(&mut a, KeyCode::Left);
        assert!(!a.input.is_empty());
    }
}
