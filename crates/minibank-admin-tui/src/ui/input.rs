//! Keyboard input handling for the TUI.
//!
//! Overlays take input first, then the current view: login form, not-found
//! page, or the admin shell.

use crossterm::event::{KeyCode, KeyEvent};

use minibank_admin_core::routing::{AdminPage, View};
use minibank_admin_core::shell::nav_item_for_hotkey;

use crate::app::{
    can_add_email_char, can_add_password_char, can_add_path_char, App, AppState, LoginFocus,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return false;
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return true;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::ConfirmingLogout => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Normal;
                    app.logout();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::EnteringPath => {
            handle_path_input(app, key);
            return false;
        }
        AppState::Normal | AppState::Quitting => {}
    }

    if app.is_login_view() {
        return handle_login_input(app, key);
    }
    if matches!(app.view, View::NotFound(_)) {
        handle_not_found_input(app, key);
    } else {
        handle_shell_input(app, key);
    }
    false
}

fn handle_path_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.path_input.clear();
        }
        KeyCode::Enter => app.submit_path(),
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_path_char(app.path_input.chars().count(), c) {
                app.path_input.push(c);
            }
        }
        _ => {}
    }
}

fn open_path_prompt(app: &mut App) {
    app.path_input = "/admin/".to_string();
    app.state = AppState::EnteringPath;
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            // Enter on the password submits, as most sign-in forms do.
            LoginFocus::Password | LoginFocus::Button => app.attempt_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    false
}

fn handle_not_found_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.back(),
        KeyCode::Char('g') => open_path_prompt(app),
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        _ => {}
    }
}

fn handle_shell_input(app: &mut App, key: KeyEvent) {
    app.status_message = None;

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('L') => app.state = AppState::ConfirmingLogout,
        KeyCode::Char('g') => open_path_prompt(app),
        KeyCode::Esc | KeyCode::Backspace => app.back(),
        KeyCode::Char(c) if nav_item_for_hotkey(c).is_some() => {
            if let Some(item) = nav_item_for_hotkey(c) {
                app.navigate_to_page(item.page);
            }
        }
        _ => {
            if app.shell().and_then(|s| s.page()) == Some(AdminPage::Users) {
                handle_users_input(app, key);
            } else if key.code == KeyCode::Char('r') {
                app.users.clear();
                app.fetch_users();
            }
        }
    }
}

fn handle_users_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_user(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_user(1),
        KeyCode::PageUp => app.select_prev_user(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next_user(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.user_selection = 0,
        KeyCode::Char('r') => {
            app.users.clear();
            app.fetch_users();
        }
        _ => {}
    }
}
