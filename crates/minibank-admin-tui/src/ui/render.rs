use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use minibank_admin_core::routing::View;
use minibank_admin_core::shell::{AdminShell, NavItem, BOTTOM_NAV, MAIN_NAV};

use crate::app::{App, AppState, LoginFocus};

use super::pages;
use super::styles;

/// Width of the login form input fields, in characters.
const FIELD_WIDTH: usize = 24;

/// Width of the shell sidebar.
const SIDEBAR_WIDTH: u16 = 22;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Main area
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    match &app.view {
        View::Login => render_login(frame, app, chunks[0]),
        View::Protected { .. } => {
            if let Some(shell) = app.shell() {
                render_shell(frame, app, &shell, chunks[0]);
            }
        }
        View::NotFound(path) => render_not_found(frame, app, path, chunks[0]),
    }
    render_status_bar(frame, app, chunks[1]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::EnteringPath => render_path_overlay(frame, app),
        AppState::ConfirmingLogout => render_confirm_overlay(
            frame,
            "Sign out of the admin console?",
            " to sign out, ",
        ),
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", " to quit, ")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

// ============================================================================
// Login View
// ============================================================================

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(46, height, area);

    let mut lines = vec![
        Line::from(Span::styled("             M I N I   B A N K", styles::title_style())),
        Line::from(Span::styled("               Admin Console", styles::muted_style())),
        Line::from(""),
    ];

    let email_focused = app.login_focus == LoginFocus::Email;
    lines.push(form_field(
        "   Email:    [",
        &field_tail(&app.login_email),
        email_focused,
    ));

    let password_focused = app.login_focus == LoginFocus::Password;
    let masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    lines.push(form_field("   Password: [", &masked, password_focused));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = match (app.login_pending, button_focused) {
        (true, _) => " Signing in… ",
        (false, true) => " ▶ Sign in ◀ ",
        (false, false) => "   Sign in   ",
    };
    lines.push(Line::from(vec![
        Span::raw("                ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {}", app.api.base_url()),
        styles::muted_style(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(" Sign in ", styles::title_style()));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn form_field<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// The last `FIELD_WIDTH` characters, so the cursor end stays visible.
fn field_tail(value: &str) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
}

// ============================================================================
// Admin Shell
// ============================================================================

fn render_shell(frame: &mut Frame, app: &App, shell: &AdminShell<'_>, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_header(frame, shell, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(rows[1]);

    render_sidebar(frame, shell, columns[0]);
    pages::render(frame, app, shell, columns[1]);
}

fn render_header(frame: &mut Frame, shell: &AdminShell<'_>, area: Rect) {
    let title = format!(
        "  Mini Bank Admin  ·  {}",
        shell.page().map(|p| p.title()).unwrap_or("Unknown page")
    );
    let right = format!(
        "{}  {}  ",
        shell.identity().display_name(),
        Local::now().format("%H:%M")
    );
    let padding = (area.width as usize)
        .saturating_sub(title.chars().count() + right.chars().count());

    let line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_sidebar(frame: &mut Frame, shell: &AdminShell<'_>, area: Rect) {
    let nav_line = |item: &NavItem| {
        let active = shell.is_active(item);
        let marker = if active { "▶" } else { " " };
        Line::from(vec![
            Span::styled(format!("{} [{}] ", marker, item.hotkey), styles::help_key_style()),
            Span::styled(item.label, styles::nav_style(active)),
        ])
    };

    let mut lines: Vec<Line> = MAIN_NAV.iter().map(nav_line).collect();

    // Push the bottom group to the bottom edge of the sidebar.
    let inner_height = area.height.saturating_sub(2) as usize;
    let used = MAIN_NAV.len() + BOTTOM_NAV.len() + 1;
    lines.extend(std::iter::repeat(Line::from("")).take(inner_height.saturating_sub(used)));

    lines.extend(BOTTOM_NAV.iter().map(nav_line));
    lines.push(Line::from(vec![
        Span::styled("   [L] ", styles::help_key_style()),
        Span::styled("Logout", styles::list_item_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ============================================================================
// Not Found
// ============================================================================

fn render_not_found(frame: &mut Frame, app: &App, path: &str, area: Rect) {
    let area = centered_rect_fixed(46, 7, area);
    let mut hints = Vec::new();
    if app.navigator.history().can_go_back() {
        hints.push(Span::styled(" [Esc]", styles::help_key_style()));
        hints.push(Span::styled(" back  ", styles::muted_style()));
    }
    hints.push(Span::styled(" [g]", styles::help_key_style()));
    hints.push(Span::styled(" go to path", styles::muted_style()));

    let lines = vec![
        Line::from(Span::styled(" Page not found", styles::highlight_style())),
        Line::from(""),
        Line::from(Span::styled(format!(" {}", path), styles::list_item_style())),
        Line::from(""),
        Line::from(hints),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ============================================================================
// Status Bar
// ============================================================================

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(at) = app.signed_in_at {
        format!(" Signed in at {} ", at.format("%H:%M"))
    } else {
        format!(" {} ", app.navigator.current())
    };

    let shortcuts = if app.is_login_view() {
        "[Tab] next field | [Enter] sign in | [Esc] quit"
    } else {
        "[g]o to | [?] help | [q]uit"
    };
    let right_text = format!(" {} ", shortcuts);

    let left_style = if app.status_message.is_some() {
        styles::warning_style()
    } else {
        styles::muted_style()
    };

    let padding = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

// ============================================================================
// Overlays
// ============================================================================

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(48, 19, frame.area());
    frame.render_widget(Clear, area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled(
            format!("  Mini Bank Admin  v{}", env!("CARGO_PKG_VERSION")),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("1-7", "Main menu pages"),
        key("8", "Settings"),
        key("g", "Go to a path"),
        key("Esc", "Back"),
        Line::from(""),
        Line::from(Span::styled(" Users", styles::highlight_style())),
        key("↑/↓", "Move selection"),
        key("PgUp/PgDn", "Move by page"),
        key("r", "Reload from server"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        key("L", "Log out"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_path_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(vec![
            Span::styled(" Go to: ", styles::muted_style()),
            Span::styled(format!("{}▌", app.path_input), styles::selected_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " e.g. /admin/users   [Enter] go  [Esc] cancel",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, confirm_desc: &str) {
    let area = centered_rect_fixed(46, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(confirm_desc.to_string(), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
