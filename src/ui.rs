//! Layout and drawing: radial playfield, sidebar (next piece, points/level/rings), overlays.

use crate::app::{Prompt, Screen};
use crate::game::{
    Arena, ClearKind, ClearResult, LAYER_COUNT, MAX_HEIGHT, PieceColor, SECTOR_COUNT, Status,
    StopReason,
};
use crate::geometry::{DisplayMode, Projection};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

const SIDEBAR_WIDTH: u16 = 24;
/// Rows the sidebar needs: next (8) + gap + stats (8) + gap + keys (9).
const SIDEBAR_HEIGHT: u16 = 27;

/// Fade of a partial clear.
const CLEAR_FADE_MS: u32 = 400;
/// White flash of a grand clear (all four scanned rings).
const GRAND_FLASH_MS: u32 = 900;

/// Colours of every visible segment: settled segments plus the falling piece.
type SegmentColors = [[Option<Color>; LAYER_COUNT]; SECTOR_COUNT];

/// What the UI needs from the app for one frame.
pub struct View<'a> {
    pub arena: &'a Arena,
    pub theme: &'a Theme,
    pub screen: Screen,
    pub display: DisplayMode,
}

/// A ring clear being animated. The field is drawn from `snapshot`, the arena as it
/// was before the clear, until the effect is done.
pub struct LineClear {
    result: ClearResult,
    snapshot: Box<Arena>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl LineClear {
    pub fn new(result: ClearResult, snapshot: Arena) -> Self {
        Self {
            result,
            snapshot: Box::new(snapshot),
            effect: None,
            last_process: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.effect.as_ref().is_some_and(|e| e.done())
    }
}

pub fn rgb(c: PieceColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn segment_colors(arena: &Arena) -> SegmentColors {
    let mut colors = [[None; LAYER_COUNT]; SECTOR_COUNT];
    for (sector, column) in colors.iter_mut().enumerate() {
        for (layer, cell) in column.iter_mut().enumerate().skip(1) {
            *cell = arena.segment_color(sector, layer).map(rgb);
        }
    }
    let falling = arena.falling();
    for (sector, layer) in falling.piece.cells() {
        if layer > 0 && (layer as usize) < LAYER_COUNT {
            colors[sector][layer as usize] = Some(rgb(falling.color));
        }
    }
    colors
}

/// Colour of one field pixel.
fn pixel_color(proj: &Projection, colors: &SegmentColors, theme: &Theme, px: u16, py: u16) -> Color {
    match proj.locate_pixel(px, py) {
        None => theme.bg,
        Some((_, 0)) => theme.hub,
        Some((sector, layer)) => colors[sector][layer].unwrap_or_else(|| {
            // checkerboard so empty segments stay visible
            if (sector + layer) % 2 == 0 { theme.grid } else { theme.bg }
        }),
    }
}

/// Field rect and sidebar rect, centred in `area`.
fn game_layout(area: Rect, proj: &Projection) -> (Rect, Rect) {
    let (cols, rows) = proj.cell_size();
    let (pw, ph) = (cols + 2, rows + 2);
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_HEIGHT);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let field = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (field, inner[1])
}

fn projection_for(area: Rect, display: DisplayMode) -> Projection {
    Projection::fit(
        display,
        area.width.saturating_sub(SIDEBAR_WIDTH + 2),
        area.height.saturating_sub(2),
    )
}

/// Draw the current screen. While `line_clear` is set the field shows the pre-clear
/// snapshot under a tachyonfx effect.
pub fn draw(frame: &mut Frame, view: &View, line_clear: Option<&mut LineClear>, now: Instant) {
    let area = frame.area();
    let proj = projection_for(area, view.display);
    let (field_area, sidebar_area) = game_layout(area, &proj);

    // no peeking while paused, whatever overlay is open
    let hidden = view.arena.is_paused();
    let field_arena = line_clear
        .as_deref()
        .map_or(view.arena, |clear| clear.snapshot.as_ref());
    let board = draw_playfield(frame, view, field_arena, &proj, field_area, hidden);
    draw_sidebar(frame, view, sidebar_area, hidden);

    if let Some(clear) = line_clear {
        apply_line_clear_effect(frame, view.theme, &proj, board, clear, now);
    }

    match view.screen {
        Screen::Playing if hidden => draw_pause_overlay(frame, view.theme, field_area),
        Screen::Playing => {}
        Screen::Help { .. } => draw_help(frame, view.theme, area),
        Screen::Confirm { prompt, .. } => draw_confirm(frame, view.theme, area, prompt),
        Screen::GameOver => draw_game_over(frame, view, area),
    }
}

/// Returns the board rect (inside the border).
fn draw_playfield(
    frame: &mut Frame,
    view: &View,
    arena: &Arena,
    proj: &Projection,
    area: Rect,
    hidden: bool,
) -> Rect {
    let theme = view.theme;
    let title = format!(" Ringtris  | {} ", view.display.label());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let (cols, rows) = proj.cell_size();
    let board = Rect {
        width: cols.min(inner.width),
        height: rows.min(inner.height),
        ..inner
    };

    let buf = frame.buffer_mut();
    if hidden {
        for y in board.top()..board.bottom() {
            for x in board.left()..board.right() {
                buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
            }
        }
        return board;
    }

    let colors = segment_colors(arena);
    for row in 0..board.height {
        for col in 0..board.width {
            let top = pixel_color(proj, &colors, theme, col, row * 2);
            let bottom = pixel_color(proj, &colors, theme, col, row * 2 + 1);
            buf[(board.x + col, board.y + row)]
                .set_symbol("▀")
                .set_style(Style::default().fg(top).bg(bottom));
        }
    }
    board
}

/// Buffer cells with at least one pixel on a cleared layer.
fn clearing_buffer_positions(
    proj: &Projection,
    board: Rect,
    result: &ClearResult,
) -> HashSet<(u16, u16)> {
    let cleared: HashSet<usize> = result.cleared_layers().collect();
    let on_cleared = |px: u16, py: u16| {
        proj.locate_pixel(px, py)
            .is_some_and(|(_, layer)| cleared.contains(&layer))
    };
    let mut set = HashSet::new();
    for row in 0..board.height {
        for col in 0..board.width {
            if on_cleared(col, row * 2) || on_cleared(col, row * 2 + 1) {
                set.insert((board.x + col, board.y + row));
            }
        }
    }
    set
}

/// Create or advance the clear effect: partial clears fade to the background,
/// grand clears flash white for longer.
fn apply_line_clear_effect(
    frame: &mut Frame,
    theme: &Theme,
    proj: &Projection,
    board: Rect,
    clear: &mut LineClear,
    now: Instant,
) {
    let delta = clear
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    clear.last_process = Some(now);

    if clear.effect.is_none() {
        let clearing_set = clearing_buffer_positions(proj, board, &clear.result);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing_set.contains(&(pos.x, pos.y))
        }));
        let (color, ms) = match clear.result.kind {
            ClearKind::Grand => (Color::White, GRAND_FLASH_MS),
            _ => (theme.bg, CLEAR_FADE_MS),
        };
        let effect = fx::fade_to(color, color, (ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        clear.effect = Some(effect);
    }

    if let Some(effect) = clear.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn bordered(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect, hidden: bool) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Next (border + title + 4 rows)
            Constraint::Length(1),
            Constraint::Length(8), // Points, level, rings, interval, state
            Constraint::Length(1),
            Constraint::Length(9), // Keys
        ])
        .split(area);

    let next_block = bordered(theme);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(MAX_HEIGHT as u16)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    if !hidden {
        draw_next_preview(frame, view, next_layout[1]);
    }

    let score = view.arena.score();
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let stats = vec![
        stat("Points: ", score.points().to_string()),
        stat("Level:  ", score.level().to_string()),
        stat("Rings:  ", score.rings().to_string()),
        stat("Speed:  ", format!("{} ms", view.arena.interval().as_millis())),
        stat("State:  ", status_label(view.arena.status()).to_string()),
        Line::from(Span::styled(format!("seed {}", view.arena.seed()), hint_style)),
    ];
    let stats_block = bordered(theme);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    let key = |keys: &'static str, what: &'static str| {
        Line::from(vec![Span::styled(keys, title_style), Span::styled(what, hint_style)])
    };
    let keys = vec![
        key("←/h →/l ", "turn"),
        key("↓/j     ", "drop"),
        key("p       ", "pause"),
        key("v       ", "view"),
        key("n       ", "new game"),
        key("?       ", "help"),
        key("q       ", "quit"),
    ];
    let keys_block = bordered(theme);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    Paragraph::new(Text::from(keys)).render(keys_inner, frame.buffer_mut());
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Running => "running",
        Status::Paused => "paused",
        Status::Stopped(StopReason::GameOver) => "game over",
        Status::Stopped(StopReason::Aborted) => "stopped",
    }
}

/// Next piece mask: one column pair per sector offset, one row per layer offset.
fn draw_next_preview(frame: &mut Frame, view: &View, area: Rect) {
    let next = view.arena.next();
    let style = Style::default().fg(rgb(next.color));
    let buf = frame.buffer_mut();
    for (i, k) in next.piece.segments() {
        let x = area.x + 1 + i as u16 * 2;
        let y = area.y + k as u16;
        if x + 1 < area.right() && y < area.bottom() {
            buf.set_string(x, y, "██", style);
        }
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn render_popup(frame: &mut Frame, theme: &Theme, popup: Rect, lines: Vec<Line<'static>>) {
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(bordered(theme))
        .render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
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
    render_popup(frame, theme, centered_popup(area, 28, 6), lines);
}

fn draw_help(frame: &mut Frame, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let text = [
        "Pieces appear at the rim and fall",
        "toward the hub, one layer per tick.",
        "",
        "Turn them around the ring with",
        "Left/Right; sectors wrap around.",
        "Down moves one layer inward.",
        "",
        "A layer filled in all 8 sectors is",
        "a full ring. It disappears and",
        "everything outside falls inward.",
        "",
        "Points per clear: 40/100/300/1200",
        "for 1-4 rings, times (level + 1).",
        "Every 10 rings raise the level.",
    ];
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(" How to play ", Style::default().fg(theme.title).bold())),
        Line::from(""),
    ];
    lines.extend(text.iter().map(|t| Line::from(Span::styled(*t, fg))));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Any key: back ",
        Style::default().fg(theme.inactive_fg),
    )));
    let height = lines.len() as u16 + 2;
    render_popup(frame, theme, centered_popup(area, 42, height), lines);
}

fn draw_confirm(frame: &mut Frame, theme: &Theme, area: Rect, prompt: Prompt) {
    let question = match prompt {
        Prompt::NewGame => " Abandon this game and start a new one? ",
        Prompt::Quit => " Quit Ringtris? ",
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(question, Style::default().fg(theme.title).bold())),
        Line::from(""),
        Line::from(Span::styled(
            " Y/Enter: Yes    any other key: No ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    render_popup(frame, theme, centered_popup(area, 46, 6), lines);
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let score = view.arena.score();
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Points: {} ", score.points()), fg)),
        Line::from(Span::styled(format!(" Level: {} ", score.level()), fg)),
        Line::from(Span::styled(format!(" Rings: {} ", score.rings()), fg)),
        Line::from(""),
        Line::from(Span::styled(" R: Restart    Q: Quit ", fg)),
    ];
    render_popup(frame, theme, centered_popup(area, 30, 10), lines);
}
