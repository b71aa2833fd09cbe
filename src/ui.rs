//! Layout and drawing: menu, board, sidebar, pause, quit menu, game over.

use crate::app::{MenuState, MenuTab, QuitOption, Screen};
use crate::config::Difficulty;
use crate::game::GameState;
use crate::grid::Grid;
use crate::piece::Piece;
use crate::theme::Theme;
use crate::tile::Tile;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per grid cell; wide enough for "2048".
const CELL_WIDTH: u16 = 4;
const SIDEBAR_WIDTH: u16 = 22;
/// Sidebar content height (next + stats + controls blocks).
const SIDEBAR_HEIGHT: u16 = 20;

/// Duration of the row-clear flash (TachyonFX) in ms.
const CLEAR_FLASH_MS: u32 = 250;

/// Everything the renderer reads for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub state: &'a GameState,
    pub theme: &'a Theme,
    pub menu: &'a MenuState,
    pub quit_selected: QuitOption,
    pub new_record: bool,
    pub save_error: Option<&'a str>,
}

/// Row-clear flash: rows to highlight and the effect driving them.
#[derive(Default)]
pub struct ClearFlash {
    rows: Vec<usize>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl ClearFlash {
    /// Flash the given grid rows (bottom = 0), replacing any flash in progress.
    pub fn start(&mut self, rows: Vec<usize>) {
        *self = Self {
            rows,
            ..Self::default()
        };
    }

    pub fn is_active(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn finish_if_done(&mut self) {
        if self.effect.as_ref().is_some_and(|e| e.done()) {
            *self = Self::default();
        }
    }
}

/// Playfield size in terminal cells (border + board).
fn playfield_size(grid: &Grid) -> (u16, u16) {
    (
        grid.width() as u16 * CELL_WIDTH + 2,
        grid.height() as u16 + 2,
    )
}

/// Smallest terminal (cols, rows) that shows the whole board and sidebar.
pub fn required_terminal_size(grid: &Grid) -> (u16, u16) {
    let (pw, ph) = playfield_size(grid);
    (pw + SIDEBAR_WIDTH, ph.max(SIDEBAR_HEIGHT))
}

/// Playfield and sidebar rects, centred in `area`.
fn game_layout(area: Rect, grid: &Grid) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(grid);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(pw + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(SIDEBAR_HEIGHT)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let playfield = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (playfield, inner[1])
}

/// Board area inside the playfield border.
fn board_rect(playfield: Rect) -> Rect {
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: playfield.width.saturating_sub(2),
        height: playfield.height.saturating_sub(2),
    }
}

/// Screen origin of grid cell (row, col); row 0 is the bottom line of the board.
fn cell_origin(board: Rect, grid: &Grid, row: usize, col: usize) -> Option<(u16, u16)> {
    if row >= grid.height() || col >= grid.width() {
        return None;
    }
    let x = board.x + col as u16 * CELL_WIDTH;
    let y = board.y + (grid.height() - 1 - row) as u16;
    (x < board.right() && y < board.bottom()).then_some((x, y))
}

fn put_cell(buf: &mut Buffer, board: Rect, (x, y): (u16, u16), text: &str, style: Style) {
    let w = CELL_WIDTH.min(board.right().saturating_sub(x)) as usize;
    buf.set_stringn(x, y, format!("{:^w$}", text, w = CELL_WIDTH as usize), w, style);
}

fn draw_tile(buf: &mut Buffer, board: Rect, origin: (u16, u16), tile: Tile, theme: &Theme) {
    let (bg, fg) = theme.tile_colors(tile);
    let style = Style::default().fg(fg).bg(bg).bold();
    put_cell(buf, board, origin, &tile.number().to_string(), style);
}

/// Draw current screen, with overlays. The row-clear flash runs while playing
/// unless `animate` is false.
pub fn draw(frame: &mut Frame, view: &View<'_>, flash: &mut ClearFlash, now: Instant, animate: bool) {
    let area = frame.area();
    if view.screen == Screen::Menu {
        draw_menu(frame, view, area);
        return;
    }
    let (need_w, need_h) = required_terminal_size(view.state.grid());
    if area.width < need_w || area.height < need_h {
        draw_too_small(frame, view.theme, area, (need_w, need_h));
        return;
    }
    draw_game(frame, view, area);
    match view.screen {
        Screen::Playing => {
            if animate && flash.is_active() {
                apply_clear_flash(frame, view, area, flash, now);
            }
            if view.state.is_paused() {
                draw_pause_overlay(frame, view.theme, area);
            }
        }
        Screen::QuitMenu => draw_quit_menu(frame, view.theme, view.quit_selected),
        Screen::GameOver => draw_game_over(frame, view, area),
        Screen::Menu => {}
    }
}

/// Create or advance the flash over the rows that were just cleared.
fn apply_clear_flash(
    frame: &mut Frame,
    view: &View<'_>,
    area: Rect,
    flash: &mut ClearFlash,
    now: Instant,
) {
    let grid = view.state.grid();
    let board = board_rect(game_layout(area, grid).0);
    let delta = flash
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.last_process = Some(now);

    if flash.effect.is_none() {
        let lines: HashSet<u16> = flash
            .rows
            .iter()
            .filter_map(|&r| cell_origin(board, grid, r, 0).map(|(_, y)| y))
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| lines.contains(&pos.y)));
        let effect = fx::fade_to(
            view.theme.accent,
            view.theme.board_bg,
            (CLEAR_FLASH_MS, Interpolation::Linear),
        )
        .with_filter(filter)
        .with_area(board);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect, (need_w, need_h): (u16, u16)) {
    let lines = vec![
        Line::from(Span::styled(
            " Terminal too small ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("need {}×{}, have {}×{}", need_w, need_h, area.width, area.height),
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled("Q quits", Style::default().fg(theme.muted))),
    ];
    let y = area.y + area.height.saturating_sub(4) / 2;
    let rect = Rect {
        y,
        height: 4.min(area.height),
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(rect, frame.buffer_mut());
}

fn draw_menu(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let menu = view.menu;
    let popup_w = 44u16;
    let popup_h = 19u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(" Tetris ", Style::default().fg(theme.accent).bold()),
        Span::styled(
            " 2048 ",
            Style::default()
                .fg(theme.tiles[10].1)
                .bg(theme.tiles[10].0)
                .bold(),
        ),
    ]);

    let highlight_style = Style::default().fg(Color::Black).bg(theme.accent).bold();
    let selected_style = Style::default().fg(theme.accent).bold();
    let normal_style = Style::default().fg(theme.text);
    let tab_style = |tab: MenuTab, selected: bool| {
        if menu.current_tab == tab && selected {
            highlight_style
        } else if selected {
            selected_style
        } else {
            normal_style
        }
    };

    let mut difficulties = Vec::new();
    for (i, d) in Difficulty::ALL.into_iter().enumerate() {
        if i > 0 {
            difficulties.push(Span::from("  "));
        }
        difficulties.push(Span::styled(
            format!(" {} ", d.label()),
            tab_style(MenuTab::Difficulty, menu.difficulty == d),
        ));
    }

    let stepper = |label: &str, value: u16, tab: MenuTab| {
        Line::from(vec![
            Span::styled(format!("{:<7}", label), Style::default().fg(theme.border)),
            Span::styled(format!(" ‹ {:>2} › ", value), tab_style(tab, true)),
        ])
    };

    let start_style = if menu.current_tab == MenuTab::Start {
        highlight_style
    } else {
        normal_style
    };
    let key_style = Style::default().fg(theme.accent);

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            " ─ DIFFICULTY ─ ",
            Style::default().fg(theme.border),
        )),
        Line::from(difficulties),
        Line::from(""),
        Line::from(Span::styled(" ─ GRID ─ ", Style::default().fg(theme.border))),
        stepper("Width", menu.width, MenuTab::Width),
        stepper("Height", menu.height, MenuTab::Height),
        Line::from(""),
        Line::from(Span::styled(" [ START ] ", start_style)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", key_style),
            Span::from("SELECT   "),
            Span::styled(" ↔ ", key_style),
            Span::from("CHANGE   "),
            Span::styled(" ENTER ", key_style),
            Span::from("PLAY"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Best: {} ", view.state.best_score()),
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            " [Q] Quit ",
            Style::default().fg(Color::Rgb(255, 80, 80)),
        )),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .render(popup, frame.buffer_mut());
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.text),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let state = view.state;
    let theme = view.theme;
    let title = if state.is_stopped() {
        " Stopped "
    } else {
        " Game Over "
    };
    let fg_style = Style::default().fg(theme.text);
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score()), fg_style)),
        Line::from(Span::styled(format!(" Best: {} ", state.best_score()), fg_style)),
        Line::from(Span::styled(
            format!(" Rows: {} ", state.rows_cleared()),
            fg_style,
        )),
    ];
    if view.new_record {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).bold(),
        )));
    }
    if let Some(err) = view.save_error {
        lines.push(Line::from(Span::styled(
            format!(" Best score not saved: {} ", err),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R Restart   M Menu   Q Quit ",
        fg_style,
    )));

    let height = lines.len() as u16 + 2;
    let popup = centered_popup(area, 36, height);
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(Span::styled(" Tetris 2048 ", theme.accent)),
        )
        .render(popup, frame.buffer_mut());
}

/// Playfield on the left, sidebar on the right, centred.
fn draw_game(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let (playfield, sidebar) = game_layout(area, view.state.grid());
    draw_playfield(frame, view.state, view.theme, playfield);
    draw_sidebar(frame, view.state, view.theme, sidebar);
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(" Tetris 2048 ", theme.accent));
    let board = board_rect(area);
    block.render(area, frame.buffer_mut());

    let grid = state.grid();
    let buf = frame.buffer_mut();
    let empty_style = Style::default().fg(theme.border).bg(theme.board_bg);

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let Some(origin) = cell_origin(board, grid, row, col) else {
                continue;
            };
            match grid.tile(row, col) {
                Some(tile) => draw_tile(buf, board, origin, tile, theme),
                None => put_cell(buf, board, origin, "·", empty_style),
            }
        }
    }

    if state.is_over() {
        return;
    }
    let piece = state.current();
    if state.ghost().is_some() {
        let ghost_style = Style::default().fg(theme.muted).bg(theme.board_bg);
        for (pos, _) in piece.ghost_cells(grid) {
            if let Some(origin) = piece_cell_origin(board, grid, pos.y, pos.x) {
                put_cell(buf, board, origin, "░░░░", ghost_style);
            }
        }
    }
    for (pos, tile) in piece.cells() {
        if let Some(origin) = piece_cell_origin(board, grid, pos.y, pos.x) {
            draw_tile(buf, board, origin, tile, theme);
        }
    }
}

/// Cells above the board (still entering) are not drawn.
fn piece_cell_origin(board: Rect, grid: &Grid, row: i32, col: i32) -> Option<(u16, u16)> {
    if !grid.is_inside(row, col) {
        return None;
    }
    cell_origin(board, grid, row as usize, col as usize)
}

fn bordered(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.accent);
    let fg_style = Style::default().fg(theme.text);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Next (border + title + two rows)
            Constraint::Length(7), // Stats
            Constraint::Length(8), // Controls
        ])
        .split(area);

    // --- Next ---
    let next_block = bordered(theme);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    draw_next_preview(frame.buffer_mut(), state.next(), theme, next_layout[1]);

    // --- Stats ---
    let stats_block = bordered(theme);
    let stats_inner = stats_block.inner(chunks[1]);
    stats_block.render(chunks[1], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let stats_lines = vec![
        stat("Score: ", state.score().to_string()),
        stat("Best:  ", state.best_score().to_string()),
        stat("Rows:  ", state.rows_cleared().to_string()),
        stat("Level: ", state.config().difficulty.label().to_string()),
        stat(
            "Grid:  ",
            format!("{}×{}", state.grid().width(), state.grid().height()),
        ),
    ];
    Paragraph::new(stats_lines).render(stats_inner, frame.buffer_mut());

    // --- Controls ---
    let help_block = bordered(theme);
    let help_inner = help_block.inner(chunks[2]);
    help_block.render(chunks[2], frame.buffer_mut());
    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("{:<7}", k), title_style),
            Span::styled(what, Style::default().fg(theme.muted)),
        ])
    };
    let help = vec![
        key("← →", "move"),
        key("↓", "soft drop"),
        key("space", "hard drop"),
        key("a d", "rotate"),
        key("p s", "pause, stop"),
        key("q", "quit"),
    ];
    Paragraph::new(help).render(help_inner, frame.buffer_mut());
}

/// Next piece, trimmed to its occupied box and centred.
fn draw_next_preview(buf: &mut Buffer, piece: &Piece, theme: &Theme, area: Rect) {
    let (tiles, _) = piece.bounding_tiles();
    let rows = tiles.len() as u16;
    let cols = tiles.first().map_or(0, |r| r.len()) as u16;
    let off_x = area.width.saturating_sub(cols * CELL_WIDTH) / 2;
    let off_y = area.height.saturating_sub(rows) / 2;
    for (r, row) in tiles.iter().enumerate() {
        for (c, slot) in row.iter().enumerate() {
            let Some(tile) = slot else { continue };
            let x = area.x + off_x + c as u16 * CELL_WIDTH;
            let y = area.y + off_y + r as u16;
            if x < area.right() && y < area.bottom() {
                draw_tile(buf, area, (x, y), *tile, theme);
            }
        }
    }
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered_popup(frame.area(), 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(" Quit? ");

    Clear.render(quit_rect, frame.buffer_mut());
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    for (i, opt) in QuitOption::ALL.into_iter().enumerate() {
        let label = opt.label();
        let style = if opt == selected {
            Style::default().fg(theme.board_bg).bg(theme.accent).bold()
        } else {
            Style::default().fg(theme.accent)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.chars().count() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
