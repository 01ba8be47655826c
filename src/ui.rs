//! Layout and drawing: board, sidebar, callout, pause, quit menu, game over.

use crate::app::{QuitOption, Screen};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};
use sweetswap::gravity::Fall;
use sweetswap::playback::Frame as PlayFrame;
use sweetswap::{Board, Candy, Cell, GameState, Phase, Pos, SpecialKind};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is drawn as " ● " (3 columns, 1 row).
const CELL_WIDTH: u16 = 3;
const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 26;
/// Sidebar sections plus the gaps between them.
const SIDEBAR_HEIGHT: u16 = 27;

/// Board panel size in terminal cells (border + grid) for given board dimensions.
fn board_pixel_size(rows: usize, cols: usize) -> (u16, u16) {
    (
        cols as u16 * CELL_WIDTH + 2,
        rows as u16 * CELL_HEIGHT + 2,
    )
}

pub fn candy_glyph(candy: Candy) -> &'static str {
    match candy {
        Candy::Drop => "●",
        Candy::Lollipop => "◆",
        Candy::Chocolate => "■",
        Candy::Cookie => "▲",
        Candy::Cupcake => "♥",
    }
}

pub fn special_glyph(kind: SpecialKind) -> &'static str {
    match kind {
        SpecialKind::RowClear => "═",
        SpecialKind::ColumnClear => "║",
        SpecialKind::Bomb3x3 => "◉",
        SpecialKind::Bomb5x5 => "✹",
        SpecialKind::Rainbow => "★",
    }
}

pub fn cell_glyph(cell: Cell) -> &'static str {
    match (cell.special(), cell.candy()) {
        (Some(kind), _) => special_glyph(kind),
        (None, Some(candy)) => candy_glyph(candy),
        (None, None) => " ",
    }
}

/// Board inner rect (grid only, no border); matches draw_game layout.
fn board_rect(area: Rect, board: &Board) -> Rect {
    let (outer, _) = game_areas(area, board);
    let inner = Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: outer.width.saturating_sub(2),
        height: outer.height.saturating_sub(2),
    };
    Rect {
        width: (board.cols() as u16 * CELL_WIDTH).min(inner.width),
        height: (board.rows() as u16 * CELL_HEIGHT).min(inner.height),
        ..inner
    }
}

/// Board panel and sidebar, centred in `area`.
fn game_areas(area: Rect, board: &Board) -> (Rect, Rect) {
    let (pw, ph) = board_pixel_size(board.rows(), board.cols());
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_HEIGHT);

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let active_area = vert_chunks[1];

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(active_area);
    let board_area = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (board_area, inner[1])
}

/// Build set of buffer (x, y) positions that belong to exploding cells.
fn exploding_buffer_positions(board_rect: Rect, cells: &BTreeSet<Pos>) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for pos in cells {
        let x0 = board_rect.x + pos.col as u16 * CELL_WIDTH;
        let y0 = board_rect.y + pos.row as u16 * CELL_HEIGHT;
        for bx in x0..(x0 + CELL_WIDTH).min(board_rect.x + board_rect.width) {
            for by in y0..(y0 + CELL_HEIGHT).min(board_rect.y + board_rect.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or update the explode fade effect and process it (TachyonFX: fade
/// exploding cells to the board background over the explode phase).
fn apply_explode_effect(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    explode_effect: &mut Option<Effect>,
    explode_process_time: &mut Option<Instant>,
    now: Instant,
    fade: Duration,
) {
    let Some(play) = state.frame() else {
        return;
    };
    let board_rect = board_rect(area, state.display_board());
    let delta = explode_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *explode_process_time = Some(now);

    if explode_effect.is_none() {
        let exploding = exploding_buffer_positions(board_rect, &play.marked);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            exploding.contains(&(pos.x, pos.y))
        }));
        let fade_ms = fade.as_millis().clamp(1, u32::MAX as u128) as u32;
        let effect = fx::fade_to(theme.bg, theme.bg, (fade_ms, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(board_rect);
        *explode_effect = Some(effect);
    }

    if let Some(effect) = explode_effect {
        frame.render_effect(effect, board_rect, tfx_delta);
    }
}

/// Draw current screen, with optional pause overlay or quit menu.
/// While cells explode and animation is on, applies the TachyonFX fade and
/// updates `explode_effect` / `explode_process_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    quit_selected: Option<QuitOption>,
    status: Option<&str>,
    explode_effect: &mut Option<Effect>,
    explode_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
    fade: Duration,
) {
    let area = frame.area();
    match screen {
        Screen::Playing => {
            draw_game(frame, state, theme, area, status);
            if paused {
                draw_pause_overlay(frame, theme, area);
            } else if state.phase() == Phase::Exploding && !no_animation {
                apply_explode_effect(
                    frame,
                    state,
                    theme,
                    area,
                    explode_effect,
                    explode_process_time,
                    now,
                    fade,
                );
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, state, theme, area, status);
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, theme, opt, state.coins_earned());
            }
        }
        Screen::GameOver => draw_game_over(frame, state, theme, area),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup_w = 34u16;
    let popup_h = 14u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Out of moves! ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score), fg)),
        Line::from(Span::styled(
            format!(" Coins earned: {} ", state.coins_earned()),
            Style::default().fg(theme.title).bold(),
        )),
        Line::from(Span::styled(
            format!(" Best combo: {} ", state.best_combo),
            fg,
        )),
        Line::from(Span::styled(
            format!(" Specials made: {} ", state.specials_created),
            fg,
        )),
        Line::from(Span::styled(format!(" Moves: {} ", state.moves_made), fg)),
        Line::from(""),
        Line::from(Span::styled(" R: Play again    Q: Quit ", fg)),
        Line::from(""),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Sweetswap ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw game: board + sidebar; use full area and center them.
fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    status: Option<&str>,
) {
    let (board_area, sidebar_area) = game_areas(area, state.display_board());
    draw_board(frame, state, theme, board_area, status);
    draw_sidebar(frame, state, theme, sidebar_area);
}

/// Where each cell is drawn from while the swap animates: the pair trades
/// places halfway through the phase.
fn swap_source(play: Option<&PlayFrame>, progress: f64, pos: Pos) -> Pos {
    let Some(play) = play.filter(|f| f.phase == Phase::Swapping && progress >= 0.5) else {
        return pos;
    };
    let mut pair = play.marked.iter().copied();
    match (pair.next(), pair.next()) {
        (Some(a), Some(b)) if pos == a => b,
        (Some(a), Some(b)) if pos == b => a,
        _ => pos,
    }
}

/// Row a falling cell is shown on, `None` while still above the board.
fn fall_row(fall: &Fall, progress: f64) -> Option<usize> {
    let left = (fall.distance() as f64 * (1.0 - progress)).round();
    let row = fall.to as f64 - left;
    (row >= 0.0).then_some(row as usize)
}

fn draw_board(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    status: Option<&str>,
) {
    let play = state.frame();
    let footer = play
        .and_then(|f| f.callout)
        .map(|c| c.text())
        .or_else(|| status.map(str::to_string));
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Sweetswap ", theme.title));
    if let Some(text) = footer {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {text} "),
                Style::default().fg(theme.title).bold(),
            ))
            .centered(),
        );
    }
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board = state.display_board();
    let board_rect = Rect {
        width: (board.cols() as u16 * CELL_WIDTH).min(inner.width),
        height: (board.rows() as u16 * CELL_HEIGHT).min(inner.height),
        ..inner
    };
    let progress = state.frame_progress();
    let phase = state.phase();

    // Falling cells are drawn separately at their interpolated row.
    let falling: HashSet<Pos> = play
        .filter(|f| f.phase == Phase::Falling)
        .map(|f| f.falls.iter().map(|fall| Pos::new(fall.to, fall.col)).collect())
        .unwrap_or_default();

    let buf = frame.buffer_mut();
    let mut put = |pos: Pos, cell: Cell, bg: Color, brackets: Option<Color>| {
        let x = board_rect.x + pos.col as u16 * CELL_WIDTH;
        let y = board_rect.y + pos.row as u16 * CELL_HEIGHT;
        if x + CELL_WIDTH > board_rect.x + board_rect.width
            || y + CELL_HEIGHT > board_rect.y + board_rect.height
        {
            return;
        }
        let fg = cell.candy().map_or(theme.inactive_fg, |c| theme.candy_color(c));
        let glyph_style = Style::default().fg(fg).bg(bg);
        let (left, right) = if brackets.is_some() { ("[", "]") } else { (" ", " ") };
        let bracket_style = Style::default().fg(brackets.unwrap_or(fg)).bg(bg);
        buf[(x, y)].set_symbol(left).set_style(bracket_style);
        buf[(x + 1, y)]
            .set_symbol(cell_glyph(cell))
            .set_style(glyph_style);
        buf[(x + 2, y)].set_symbol(right).set_style(bracket_style);
    };

    for pos in board.positions() {
        let marked = play.is_some_and(|f| f.marked.contains(&pos));
        let bg = match phase {
            Phase::Swapping if marked => theme.div_line,
            Phase::Highlighting | Phase::Exploding if marked => theme.matched_bg,
            _ => theme.bg,
        };
        let brackets = if state.selected == Some(pos) {
            Some(theme.title)
        } else if state.cursor == pos && !state.is_busy() {
            Some(theme.main_fg)
        } else {
            None
        };
        let cell = if falling.contains(&pos) {
            Cell::Empty
        } else {
            let src = swap_source(play, progress, pos);
            board.at(src.row, src.col)
        };
        put(pos, cell, bg, brackets);
    }

    if let Some(play) = play.filter(|f| f.phase == Phase::Falling) {
        for fall in &play.falls {
            if let Some(row) = fall_row(fall, progress) {
                let cell = board.at(fall.to, fall.col);
                put(Pos::new(row, fall.col), cell, theme.bg, None);
            }
        }
    }
}

fn sidebar_block_style(theme: &Theme) -> Style {
    Style::default().fg(theme.div_line).bg(theme.bg)
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = sidebar_block_style(theme);

    // Free-floating sections with their own borders; vertical layout with small gaps
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Stats (border + score, best combo, specials, moves)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Moves left (border + label + bar)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Candies (border + title + strip)
            Constraint::Length(1), // gap
            Constraint::Length(10), // Legend (border + title + five specials + hint)
        ])
        .split(area);

    // --- Stats (own border) ---
    let stats_outer = chunks[0];
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(stats_outer);
    stats_block.render(stats_outer, frame.buffer_mut());
    let mut score_spans = vec![
        Span::styled("Score: ", title_style),
        Span::styled(state.score.to_string(), fg_style),
    ];
    if state.pending_score > 0 {
        score_spans.push(Span::styled(
            format!(" +{}", state.pending_score),
            Style::default().fg(theme.candy_color(Candy::Cookie)).bold(),
        ));
    }
    let combo_label = if state.combo > 1 {
        format!("x{}", state.combo)
    } else {
        "-".to_string()
    };
    let stats_lines = vec![
        Line::from(score_spans),
        Line::from(vec![
            Span::styled("Combo: ", title_style),
            Span::styled(combo_label, fg_style),
            Span::styled("  Best: ", title_style),
            Span::styled(state.best_combo.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Specials: ", title_style),
            Span::styled(state.specials_created.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Moves made: ", title_style),
            Span::styled(state.moves_made.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Moves left (own border): count above, bar below ---
    let moves_outer = chunks[2];
    let moves_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let moves_inner = moves_block.inner(moves_outer);
    moves_block.render(moves_outer, frame.buffer_mut());
    let moves_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(moves_inner);
    let total = state.config().moves.max(1);
    let ratio = (f64::from(state.moves_left) / f64::from(total)).min(1.0);
    Paragraph::new(Line::from(vec![
        Span::styled("Moves: ", title_style),
        Span::styled(format!("{} / {}", state.moves_left, total), fg_style),
    ]))
    .render(moves_layout[0], frame.buffer_mut());
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color))
        .render(moves_layout[1], frame.buffer_mut());

    // --- Candies (own border) ---
    let candies_outer = chunks[4];
    let candies_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let candies_inner = candies_block.inner(candies_outer);
    candies_block.render(candies_outer, frame.buffer_mut());
    let candies_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(candies_inner);
    Paragraph::new(Line::from(Span::styled("Candies", title_style)))
        .render(candies_layout[0], frame.buffer_mut());
    draw_candy_strip(frame, theme, candies_layout[1]);

    // --- Legend (own border) ---
    let legend_outer = chunks[6];
    let legend_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let legend_inner = legend_block.inner(legend_outer);
    legend_block.render(legend_outer, frame.buffer_mut());
    let mut legend = vec![Line::from(Span::styled("Specials", title_style))];
    legend.extend(SpecialKind::ALL.iter().map(|&kind| {
        Line::from(vec![
            Span::styled(format!(" {} ", special_glyph(kind)), title_style),
            Span::styled(kind.name(), fg_style),
        ])
    }));
    legend.push(Line::from(""));
    legend.push(Line::from(Span::styled(
        "Space: select  P: pause",
        Style::default().fg(theme.inactive_fg),
    )));
    Paragraph::new(ratatui::text::Text::from(legend)).render(legend_inner, frame.buffer_mut());
}

/// Draw the five candies, each in its colour.
fn draw_candy_strip(frame: &mut Frame, theme: &Theme, area: Rect) {
    let block_w = (area.width / Candy::ALL.len() as u16).max(1);
    for (i, candy) in Candy::ALL.into_iter().enumerate() {
        let r = Rect {
            x: area.x + i as u16 * block_w,
            y: area.y,
            width: block_w.min(area.width.saturating_sub(i as u16 * block_w)),
            height: area.height.min(1),
        };
        let p = Paragraph::new(candy_glyph(candy))
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.candy_color(candy)).bold());
        p.render(r, frame.buffer_mut());
    }
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption, coins: u32) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw.min(area.width),
        height: qh.min(area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ")
        .title_bottom(Line::from(format!(" {coins} coins ")).centered());

    // Clear background
    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    for (i, opt) in QuitOption::ALL.iter().enumerate() {
        let label = opt.label();
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
