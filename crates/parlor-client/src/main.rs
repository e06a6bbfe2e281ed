mod commands;
mod render;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use parlor_app::login::LoginStep;
use parlor_app::{App, Config, Error, StorageLocation};
use parlor_db::{Database, MemoryStore, SharedStore};
use parlor_types::api::{OutgoingMessage, PhoneSubmission, Route, Viewport};

use commands::{Command, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they don't interleave with the chat on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=info,parlor_app=info,parlor_db=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let kv: SharedStore = match &config.storage {
        StorageLocation::Memory => {
            info!("Using in-memory storage, nothing will persist");
            Arc::new(MemoryStore::new())
        }
        StorageLocation::Sqlite(path) => Arc::new(Database::open(path)?),
    };

    let mut app = App::new(kv, config);

    // Renderer: everything the app publishes ends up on stdout
    let mut events = app.dispatcher().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render::event_line(&event) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(n)) => warn!("Renderer lagged, skipped {} events", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    app.navigate(Route::Landing);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&app);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(usage) => {
                println!("{}", usage);
                continue;
            }
        };

        if let Err(e) = run(&mut app, command).await {
            error!("{:#}", e);
        }
    }

    if let Some(dashboard) = app.dashboard_mut() {
        dashboard.close_chat();
    }
    info!("Bye");
    Ok(())
}

fn prompt(app: &App) {
    let label = match (app.route(), app.dashboard()) {
        (Route::Dashboard, Some(dashboard)) => match dashboard.active_chat() {
            Some(window) => window.partner().to_string(),
            None => "dashboard".to_string(),
        },
        _ => match app.login().step() {
            LoginStep::Phone => "phone".to_string(),
            LoginStep::Otp => "otp".to_string(),
        },
    };
    print!("{}> ", label);
    let _ = std::io::stdout().flush();
}

/// Validation failures already reached the user as notices; only storage
/// failures are worth propagating.
fn settle<T>(result: parlor_app::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Storage(e)) => Err(e),
        Err(_) => Ok(None),
    }
}

async fn run(app: &mut App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Phone {
            country_code,
            number,
        } => {
            if app.route() != Route::Landing {
                println!("already signed in");
                return Ok(());
            }
            let submission = PhoneSubmission::new(country_code, number);
            println!("sending code...");
            settle(app.submit_phone(&submission).await)?;
        }
        Command::Otp(code) => {
            if app.login().step() != LoginStep::Otp {
                println!("request a code first: phone <country-code> <number>");
                return Ok(());
            }
            println!("verifying...");
            if let Some(Route::Dashboard) = settle(app.submit_otp(&code).await)? {
                if let Some(dashboard) = app.dashboard() {
                    print_users(dashboard)?;
                }
            }
        }
        Command::Logout => {
            settle(app.logout())?;
        }
        other => {
            let Some(dashboard) = app.dashboard_mut() else {
                println!("sign in first");
                return Ok(());
            };
            run_dashboard(dashboard, other).await?;
        }
    }
    Ok(())
}

async fn run_dashboard(
    dashboard: &mut parlor_app::Dashboard,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Users => print_users(dashboard)?,
        Command::Search(term) => {
            let mut updates = dashboard.search_updates();
            let _ = updates.borrow_and_update();
            dashboard.set_search(term);
            // wait for the debounce to settle; an unchanged term never fires
            let _ = tokio::time::timeout(Duration::from_secs(2), updates.changed()).await;
            print_users(dashboard)?;
        }
        Command::Create(name) => {
            settle(dashboard.create_user(&name))?;
        }
        Command::Delete(name) => {
            settle(dashboard.delete_user(&name))?;
        }
        Command::Open(name) => {
            if let Some(window) = settle(dashboard.open_chat(&name).await)? {
                let snapshot = window.snapshot();
                for message in &snapshot.visible {
                    println!("{}", render::message_line(&snapshot.partner, message));
                }
            }
        }
        Command::Close => dashboard.close_chat(),
        Command::Send(text) => {
            settle(dashboard.send(OutgoingMessage::text(text)))?;
        }
        Command::Image(path) => {
            let outgoing = read_image(&path).await?;
            settle(dashboard.send(outgoing))?;
        }
        Command::More => {
            let Some(added) = settle(dashboard.scroll(Viewport::at_top()).await)? else {
                return Ok(());
            };
            if added == 0 {
                println!("no older messages");
                return Ok(());
            }
            if let Some(window) = dashboard.active_chat() {
                let snapshot = window.snapshot();
                for message in snapshot.visible.iter().take(added) {
                    println!("{}", render::message_line(&snapshot.partner, message));
                }
            }
        }
        Command::Phone { .. } | Command::Otp(_) => println!("already signed in"),
        Command::Logout | Command::Help | Command::Quit => {}
    }
    Ok(())
}

fn print_users(dashboard: &parlor_app::Dashboard) -> anyhow::Result<()> {
    let with_history = settle(dashboard.partners_with_history())?.unwrap_or_default();
    println!("{}", render::user_list(&dashboard.visible_users(), &with_history));
    Ok(())
}

async fn read_image(path: &Path) -> anyhow::Result<OutgoingMessage> {
    let mime = commands::image_mime(path)
        .with_context(|| format!("{} is not an image file", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(OutgoingMessage::image(mime, &bytes))
}
