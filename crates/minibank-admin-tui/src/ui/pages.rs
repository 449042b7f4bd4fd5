//! Content area for each admin page.
//!
//! Pages only see the `PageContext` the shell hands them plus the data the
//! app has loaded; none of them touch the session directly.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use minibank_admin_core::models::{status_counts, UserStatus};
use minibank_admin_core::routing::AdminPage;
use minibank_admin_core::shell::{AdminShell, PageContext};

use crate::app::App;

use super::styles;

pub fn render(frame: &mut Frame, app: &App, shell: &AdminShell<'_>, area: Rect) {
    let token = app.auth.token();
    let ctx = shell.page_context(token.as_deref());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(
            format!(" {} ", shell.page().map(|p| p.title()).unwrap_or("Not found")),
            styles::title_style(),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match shell.page() {
        Some(AdminPage::Dashboard) => render_dashboard(frame, app, &ctx, inner),
        Some(AdminPage::Users) => render_users(frame, app, inner),
        Some(AdminPage::Settings) => render_settings(frame, app, &ctx, inner),
        Some(page) => render_placeholder(frame, page, inner),
        None => render_unknown(frame, shell, inner),
    }
}

// ============================================================================
// Dashboard
// ============================================================================

fn render_dashboard(frame: &mut Frame, app: &App, ctx: &PageContext<'_>, area: Rect) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" Welcome, ", styles::muted_style()),
            Span::styled(ctx.identity.display_name().to_string(), styles::highlight_style()),
        ]),
        Line::from(""),
    ];

    if let Some(line) = loading_or_error(app) {
        lines.push(line);
    } else {
        let counts = status_counts(&app.users);
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<12}", "Total users"), styles::muted_style()),
            Span::styled(app.users.len().to_string(), styles::list_item_style()),
        ]));
        for status in [
            UserStatus::Active,
            UserStatus::Locked,
            UserStatus::Frozen,
            UserStatus::Unknown,
        ] {
            let count = counts.get(&status).copied().unwrap_or(0);
            if status == UserStatus::Unknown && count == 0 {
                continue;
            }
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<12}", status.label()), styles::muted_style()),
                Span::styled(count.to_string(), status_style(status)),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Users
// ============================================================================

fn render_users(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(line) = loading_or_error(app) {
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let customers = app.customers();
    if customers.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" No customers found", styles::muted_style())),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let header = Line::from(Span::styled(
        format!(" {:<28}{:<32}{:<10}{}", "Name", "Email", "Status", "Account"),
        styles::highlight_style(),
    ));
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let items: Vec<ListItem> = customers
        .iter()
        .map(|user| {
            let status = user.status();
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" {:<28}{:<32}", truncate(user.display_name(), 27), truncate(
                        user.email.as_deref().unwrap_or("-"),
                        31,
                    )),
                    styles::list_item_style(),
                ),
                Span::styled(format!("{:<10}", status.label()), status_style(status)),
                Span::styled(
                    user.account_number.clone().unwrap_or_else(|| "-".to_string()),
                    styles::muted_style(),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.user_selection.min(customers.len() - 1)));
    let list = List::new(items).highlight_style(styles::selected_style());
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

// ============================================================================
// Settings
// ============================================================================

fn render_settings(frame: &mut Frame, app: &App, ctx: &PageContext<'_>, area: Rect) {
    let session = match ctx.token {
        Some(_) => Span::styled("Active", styles::success_style()),
        None => Span::styled("None", styles::error_style()),
    };
    let row = |label: &str, value: Span<'static>| {
        Line::from(vec![
            Span::styled(format!(" {:<16}", label), styles::muted_style()),
            value,
        ])
    };

    let lines = vec![
        row(
            "Signed in as",
            Span::styled(ctx.identity.display_name().to_string(), styles::list_item_style()),
        ),
        row("Session", session),
        row(
            "Token storage",
            Span::styled(format!("{:?}", app.config.token_backend), styles::list_item_style()),
        ),
        row(
            "API server",
            Span::styled(app.api.base_url().to_string(), styles::list_item_style()),
        ),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Other pages
// ============================================================================

fn render_placeholder(frame: &mut Frame, page: AdminPage, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            format!(" {} is not available in the console yet.", page.title()),
            styles::muted_style(),
        )),
        Line::from(Span::styled(format!(" {}", page.path()), styles::muted_style())),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_unknown(frame: &mut Frame, shell: &AdminShell<'_>, area: Rect) {
    let line = Line::from(Span::styled(
        format!(" No admin page at {}", shell.route()),
        styles::muted_style(),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

// ============================================================================
// Helpers
// ============================================================================

fn loading_or_error(app: &App) -> Option<Line<'static>> {
    if app.users_loading {
        Some(Line::from(Span::styled(" Loading users…", styles::muted_style())))
    } else {
        app.users_error.as_ref().map(|e| {
            Line::from(vec![
                Span::styled(format!(" {}", e), styles::error_style()),
                Span::styled("  [r] retry", styles::muted_style()),
            ])
        })
    }
}

fn status_style(status: UserStatus) -> ratatui::style::Style {
    match status {
        UserStatus::Active => styles::success_style(),
        UserStatus::Locked => styles::error_style(),
        UserStatus::Frozen => styles::warning_style(),
        UserStatus::Unknown => styles::muted_style(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
