//! Mini Bank admin console - a terminal front end for back-office staff.
//!
//! Signs administrators in against the Mini Bank API, keeps the session
//! across restarts, and gates every admin page behind the route guard.
//!
//! Besides the interactive console, three one-shot commands are available:
//! `--login [email]`, `--logout` and `--status`. Any other argument is taken
//! as the path to open, e.g. `minibank-admin /admin/users`.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use minibank_admin_core::{ApiClient, AuthHandle, Config, Route};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix; the appender adds the date.
const LOG_FILE_PREFIX: &str = "minibank-admin.log";

/// Environment variable prefilling the sign-in email.
const EMAIL_ENV: &str = "MINIBANK_EMAIL";

/// Initialize the tracing subscriber.
///
/// Logs go to a daily file under the data directory so they never draw over
/// the terminal UI. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {:#}. Using default settings.", e);
            Config::default()
        }
    };

    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let _log_guard = init_tracing(&data_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Mini Bank admin console starting");

    let (auth, api) = app::open_session(&config, &data_dir)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let initial = match args.first().map(String::as_str) {
        Some("--login") => return login_interactive(&mut config, &auth, args.get(1)).await,
        Some("--logout") => {
            let outcome = auth.logout();
            println!("Signed out.");
            if let Some(warning) = outcome.into_warning() {
                println!("Warning: {}", warning.user_message());
            }
            return Ok(());
        }
        Some("--status") => {
            print_status(&config, &auth, &api);
            return Ok(());
        }
        Some(flag) if flag.starts_with("--") => {
            anyhow::bail!("Unknown option {}. Use --login, --logout or --status.", flag)
        }
        Some(path) => Route::parse(path),
        None => Route::Root,
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Config::config_path().ok(), auth, api, initial);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }

    info!("Mini Bank admin console shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so background results get picked up
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Session changes first, so a logout redirects before any late result
        // is considered.
        app.check_session_changes();
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

/// Sign in from the command line, prompting for what was not supplied.
async fn login_interactive(
    config: &mut Config,
    auth: &AuthHandle,
    email_arg: Option<&String>,
) -> Result<()> {
    let email = match email_arg
        .cloned()
        .or_else(|| std::env::var(EMAIL_ENV).ok().filter(|e| !e.is_empty()))
    {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    let password = rpassword::prompt_password("Password: ")?;

    println!("Signing in as {}...", email);
    match auth.login(&email, &password).await {
        Ok(outcome) => {
            config.last_email = Some(email.clone());
            if let Err(e) = config.save() {
                tracing::warn!(error = %e, "Failed to save config");
            }

            println!("Signed in as {}.", email);
            if let Some(warning) = outcome.into_warning() {
                println!("Warning: {}", warning.user_message());
            }
            Ok(())
        }
        Err(e) => {
            let message = e.user_message();
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last_email) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

fn print_status(config: &Config, auth: &AuthHandle, api: &ApiClient) {
    if auth.is_authenticated() {
        match &config.last_email {
            Some(email) => println!("Signed in as {}.", email),
            None => println!("Signed in."),
        }
    } else {
        println!("Not signed in.");
    }
    println!("Token storage: {:?}", config.token_backend);
    println!("API server:    {}", api.base_url());
}
