use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint, Rect, Alignment},
    widgets::{Block, Borders, BorderType, List, ListItem, ListState, Paragraph, Clear},
    style::{Style, Modifier},
    text::{Line, Span},
};
use crate::app::{App, LobbyMode, StatusLevel, LOBBY_MENU};
use crate::notify::FeedKind;
use crate::placement::FLEET;
use crate::screen::Phase;
use crate::surface::CellPaint;
use crate::theme::ColorScheme;
use crate::types::Coord;

// ===============================
// Top-level draw
// ===============================
pub fn draw(f: &mut Frame, app: &App) {
    let show_debug = app.debug_visible() && !app.debug_log().is_empty();

    let mut constraints: Vec<Constraint> = Vec::with_capacity(4);
    constraints.push(Constraint::Length(1));                        // header
    constraints.push(Constraint::Min(0));                           // body
    if show_debug { constraints.push(Constraint::Length(8)); }      // debug panel
    constraints.push(Constraint::Length(1));                        // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let mut idx = 0usize;
    header(f, chunks[idx], app); idx += 1;
    body(f, chunks[idx], app); idx += 1;
    if show_debug {
        debug_panel(f, chunks[idx], app); idx += 1;
    }
    footer(f, chunks[idx], app);

    // Overlays render last
    if app.phase() == Phase::Ended {
        draw_winner_modal(f, app);
    }
}

// ===============================
// Header / footer
// ===============================
fn header(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let mut spans = vec![
        Span::styled(
            "BROADSIDE",
            Style::default().fg(colors.focus_border).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(app.phase().title(), Style::default().fg(colors.text)),
    ];
    if let Some(room) = &app.snapshot().room {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("room {}", room.room_id),
            Style::default().fg(colors.text_dim),
        ));
    }
    match app.feed_kind() {
        Some(FeedKind::Ws) => {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled("live", Style::default().fg(colors.toast_success)));
        }
        Some(FeedKind::Poll) => {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled("polling", Style::default().fg(colors.text_dim)));
        }
        None => {}
    }
    if let Some(busy) = app.gate_busy() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{busy}..."),
            Style::default().fg(colors.loading).add_modifier(Modifier::BOLD),
        ));
    }

    let w = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM).border_type(BorderType::Plain));
    f.render_widget(w, area);
}

fn footer(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let hints: &[(&str, &str)] = match app.phase() {
        Phase::Lobby => match app.lobby().mode {
            LobbyMode::Menu => &[("↑/↓", "choose"), ("Enter", "select"), ("y", "copy chain"), ("q", "quit")],
            _ => &[("Enter", "confirm"), ("Esc", "cancel")],
        },
        Phase::Waiting => &[("y", "copy chain"), ("Esc", "leave"), ("q", "quit")],
        Phase::Placement => &[
            ("↑↓←→", "move"),
            ("r", "rotate"),
            ("Space", "place"),
            ("u", "undo"),
            ("x", "random"),
            ("c", "clear"),
            ("s", "submit"),
            ("g", "start (host)"),
            ("Esc", "leave"),
        ],
        Phase::InGame => &[("↑↓←→", "aim"), ("Space", "fire"), ("Esc", "leave"), ("q", "quit")],
        Phase::Ended => &[("Enter", "back to lobby"), ("q", "quit")],
        Phase::InitError => &[("q", "quit")],
    };

    let mut spans = Vec::new();
    for (i, (key, what)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        spans.push(Span::styled(*key, Style::default().fg(colors.focus_border)));
        spans.push(Span::raw(format!(" {what}")));
    }
    if app.debug_visible() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("[DEBUG]", Style::default().fg(colors.debug_indicator)));
    }
    if let Some(status) = app.status() {
        let color = match status.level {
            StatusLevel::Info => colors.toast_success,
            StatusLevel::Error => colors.toast_error,
        };
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("[{}] {}", status.when, status.text),
            Style::default().fg(color),
        ));
    }

    let w = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::TOP).border_type(BorderType::Plain));
    f.render_widget(w, area);
}

// ===============================
// Body
// ===============================
fn body(f: &mut Frame, area: Rect, app: &App) {
    const MIN_WIDTH: u16 = 64;
    const MIN_HEIGHT: u16 = 18;

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let colors = app.colors();
        let warning_text = format!(
            "Terminal too small!\n\nMinimum size: {}×{}\nCurrent size: {}×{}\n\nPlease resize your terminal.",
            MIN_WIDTH, MIN_HEIGHT, area.width, area.height
        );
        let warning = Paragraph::new(warning_text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.toast_error).add_modifier(Modifier::BOLD))
            .block(Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(colors.toast_error)));
        f.render_widget(warning, centered_rect(area, 50, 7));
        return;
    }

    match app.phase() {
        Phase::Lobby => lobby_screen(f, area, app),
        Phase::Waiting => waiting_screen(f, area, app),
        Phase::Placement => placement_screen(f, area, app),
        Phase::InGame | Phase::Ended => battle_screen(f, area, app),
        Phase::InitError => init_error_screen(f, area, app),
    }
}

fn lobby_screen(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(18),
            Constraint::Percentage(64),
            Constraint::Percentage(18),
        ])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(LOBBY_MENU.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(cols[1]);

    let identity = vec![
        Line::from(vec![
            Span::styled("Player ", Style::default().fg(colors.text_dim)),
            Span::styled(app.player_name(), Style::default().fg(colors.text).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("Chain  ", Style::default().fg(colors.text_dim)),
            Span::styled(app.chain_id().to_string(), Style::default().fg(colors.text)),
        ]),
    ];
    let id_block = Paragraph::new(identity).block(
        Block::default()
            .title(" Identity ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.unfocused_border)),
    );
    f.render_widget(id_block, rows[0]);

    let menu_focused = app.lobby().mode == LobbyMode::Menu;
    let items: Vec<ListItem> = LOBBY_MENU
        .iter()
        .map(|label| ListItem::new(format!("  {label}")))
        .collect();
    let mut state = ListState::default();
    state.select(Some(app.lobby().selected));
    let menu = List::new(items)
        .highlight_style(
            Style::default()
                .bg(colors.selection_bg)
                .fg(colors.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ")
        .block(Block::default()
            .title(" Harbor ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(if menu_focused { colors.focus_border } else { colors.unfocused_border })));
    f.render_stateful_widget(menu, rows[1], &mut state);

    if app.lobby().mode != LobbyMode::Menu {
        let title = match app.lobby().mode {
            LobbyMode::EnterHostChain => " Host chain id ",
            _ => " Nickname ",
        };
        let input = app.lobby().input.as_str();
        let w = Paragraph::new(input)
            .style(Style::default().fg(colors.focus_border))
            .block(Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(colors.focus_border)));
        f.render_widget(w, rows[2]);

        if rows[2].width > 2 {
            let x = rows[2].x + 1 + (input.len().min((rows[2].width.saturating_sub(2)) as usize) as u16);
            let y = rows[2].y + 1;
            f.set_cursor_position((x, y));
        }
    }
}

fn waiting_screen(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let host_name = app
        .snapshot()
        .room
        .as_ref()
        .and_then(|r| r.players.first())
        .map(|p| p.name.clone())
        .unwrap_or_else(|| app.player_name());

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Waiting for an opponent...",
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Room hosted by {host_name}"),
            Style::default().fg(colors.text_dim),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Share this chain id: ", Style::default().fg(colors.text_dim)),
            Span::styled(
                app.chain_id().to_string(),
                Style::default().fg(colors.focus_border).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "The game starts as soon as someone joins.",
            Style::default().fg(colors.text_dim),
        )),
    ];

    let w = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.focus_border)));
    f.render_widget(w, centered_rect(area, 60, 12));
}

fn placement_screen(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let editor = app.editor();
    let size = editor.size();
    let submitted = app.snapshot().has_submitted_board;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(grid_width(size)), Constraint::Min(24)])
        .split(area);

    let ghost = editor.ghost_cells();
    let ghost_color = if editor.ghost_legal() { colors.ghost_ok } else { colors.ghost_bad };
    draw_grid(f, cols[0], " Your fleet ".to_string(), size, !submitted, colors, |at| {
        if !submitted && ghost.contains(&at) {
            return Span::styled("██", Style::default().fg(ghost_color).add_modifier(Modifier::BOLD));
        }
        if editor.is_occupied(at) {
            Span::styled("██", Style::default().fg(colors.ship))
        } else {
            Span::styled("· ", Style::default().fg(colors.water))
        }
    });

    // Right panel: fleet inventory and progress.
    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!("Ships placed: {}/{}", editor.placed_count(), FLEET.len()),
        Style::default().fg(colors.text),
    )));
    lines.push(Line::from(""));
    for (i, len) in FLEET.iter().enumerate() {
        let placed = i < editor.placed_count();
        let bar = "█".repeat(*len as usize);
        let style = if placed {
            Style::default().fg(colors.text_dim)
        } else if i == editor.placed_count() {
            Style::default().fg(colors.focus_border).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.ship)
        };
        lines.push(Line::from(Span::styled(
            format!("{bar:<4} ({len})"),
            style,
        )));
    }
    lines.push(Line::from(""));
    if submitted {
        lines.push(Line::from(Span::styled(
            "Fleet submitted.",
            Style::default().fg(colors.toast_success).add_modifier(Modifier::BOLD),
        )));
        let both_in = app.can_start_game();
        if app.is_host() {
            if both_in {
                lines.push(Line::from(Span::styled(
                    "Press g to start the game.",
                    Style::default().fg(colors.focus_border).add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from(Span::styled(
                    "Waiting for the opponent's fleet...",
                    Style::default().fg(colors.text_dim),
                )));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "Waiting for the host to start...",
                Style::default().fg(colors.text_dim),
            )));
        }
    } else if editor.is_complete() {
        lines.push(Line::from(Span::styled(
            "Press s to submit your fleet.",
            Style::default().fg(colors.focus_border).add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Ships cannot overlap or touch.",
            Style::default().fg(colors.text_dim),
        )));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" Fleet ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.unfocused_border)),
    );
    f.render_widget(panel, cols[1]);
}

fn battle_screen(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let surface = app.surface();
    let size = surface.size();

    if size == 0 {
        let w = Paragraph::new("Loading boards...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.text_dim));
        f.render_widget(w, centered_rect(area, 30, 3));
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    // Turn strip
    let turn_line = if app.winner().is_some() {
        Span::styled("Game over", Style::default().fg(colors.text_dim))
    } else if app.pending_attack().is_some() {
        Span::styled("Firing...", Style::default().fg(colors.loading).add_modifier(Modifier::BOLD))
    } else if app.snapshot().is_my_turn {
        Span::styled("Your turn - pick a target", Style::default().fg(colors.toast_success).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Opponent's turn", Style::default().fg(colors.text_dim))
    };
    f.render_widget(Paragraph::new(Line::from(turn_line)).alignment(Alignment::Center), rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(grid_width(size)), Constraint::Length(grid_width(size)), Constraint::Min(0)])
        .split(rows[1]);

    draw_grid(f, cols[0], " Your fleet ".to_string(), size, false, colors, |at| {
        paint_span(surface.own_cell(at).unwrap_or(CellPaint::OwnWater), colors)
    });

    let enemy_title = app
        .snapshot()
        .room
        .as_ref()
        .and_then(|r| r.opponent(app.chain_id()))
        .map(|p| format!(" {} ", p.name))
        .unwrap_or_else(|| " Enemy waters ".to_string());
    let cursor = app.cursor();
    let aiming = app.phase() == Phase::InGame && app.winner().is_none();
    draw_grid(f, cols[1], enemy_title, size, aiming, colors, |at| {
        let paint = surface.enemy_cell(at).unwrap_or(CellPaint::Fog);
        let span = paint_span(paint, colors);
        if aiming && at == cursor {
            Span::styled(
                span.content,
                Style::default().bg(colors.selection_bg).fg(colors.selection_fg),
            )
        } else {
            span
        }
    });
}

fn init_error_screen(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let text = format!(
        "Could not reach the game on this chain.\n\n{}\n\nCheck --node-url / --chain-id / --app-id and try again.",
        app.init_error().unwrap_or("unknown error")
    );
    let w = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(colors.toast_error))
        .block(Block::default()
            .title(" Startup failed ")
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(colors.toast_error)));
    f.render_widget(w, centered_rect(area, 70, 9));
}

fn debug_panel(f: &mut Frame, area: Rect, app: &App) {
    let colors = app.colors();
    let log = app.debug_log();
    let lines_to_show = (area.height.saturating_sub(2)) as usize;
    let start = log.len().saturating_sub(lines_to_show);
    let lines: Vec<Line> = log[start..]
        .iter()
        .map(|msg| Line::from(Span::raw(msg.as_str())))
        .collect();

    let w = Paragraph::new(lines)
        .style(Style::default().fg(colors.text_dim))
        .block(Block::default()
            .title(" Debug ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.text_dim)));
    f.render_widget(w, area);
}

// ===============================
// Overlays
// ===============================
fn draw_winner_modal(f: &mut Frame, app: &App) {
    let colors = app.colors();
    let won = app.won_by_me();
    let accent = if won { colors.toast_success } else { colors.toast_error };

    let winner_name = app
        .winner()
        .and_then(|chain| {
            app.snapshot()
                .room
                .as_ref()
                .and_then(|r| r.player(chain))
                .map(|p| p.name.clone())
        })
        .or_else(|| app.winner().map(str::to_string));

    let headline = if won { "VICTORY" } else { "DEFEAT" };
    let detail = match winner_name {
        Some(name) if !won => format!("{name} sank your fleet."),
        _ if won => "The enemy fleet is at the bottom of the sea.".to_string(),
        _ => "Game over.".to_string(),
    };

    let overlay = centered_rect(f.area(), 48, 7);
    f.render_widget(Clear, overlay);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            headline,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(detail, Style::default().fg(colors.text))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter returns to the lobby",
            Style::default().fg(colors.text_dim),
        )),
    ];
    let w = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(colors.background))
        .block(Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent)));
    f.render_widget(w, overlay);
}

// ===============================
// Grid helpers
// ===============================

/// Outer width of a bordered board: row labels, two columns per cell.
fn grid_width(size: u32) -> u16 {
    (size as u16) * 2 + 3 + 2
}

fn paint_span(paint: CellPaint, colors: &ColorScheme) -> Span<'static> {
    let (glyph, color) = match paint {
        CellPaint::OwnWater => ("· ", colors.water),
        CellPaint::OwnShip => ("██", colors.ship),
        CellPaint::OwnHit => ("╳╳", colors.ship_hit),
        CellPaint::OwnMiss => ("◦ ", colors.miss),
        CellPaint::Fog => ("· ", colors.text_dim),
        CellPaint::Miss => ("◦ ", colors.miss),
        CellPaint::Hit => ("╳╳", colors.ship_hit),
        CellPaint::Sunk => ("▓▓", colors.sunk),
        CellPaint::Loading => ("??", colors.loading),
    };
    Span::styled(glyph, Style::default().fg(color))
}

fn draw_grid<F>(
    f: &mut Frame,
    area: Rect,
    title: String,
    size: u32,
    focused: bool,
    colors: &ColorScheme,
    cell: F,
) where
    F: Fn(Coord) -> Span<'static>,
{
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { colors.focus_border } else { colors.unfocused_border }));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::with_capacity(size as usize + 1);
    let mut head = vec![Span::raw("   ")];
    for c in 0..size {
        head.push(Span::styled(format!("{c:<2}"), Style::default().fg(colors.text_dim)));
    }
    lines.push(Line::from(head));
    for r in 0..size {
        let mut spans = vec![Span::styled(format!("{r:>2} "), Style::default().fg(colors.text_dim))];
        for c in 0..size {
            spans.push(cell(Coord::new(r, c)));
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
