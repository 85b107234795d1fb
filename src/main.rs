//! Role assistant terminal host
//!
//! Mounts one assistant widget and drives it from stdin. Lines are sent as
//! queries (or `/reschedule` commands); `:open <n>` activates the n-th
//! action of the latest assistant reply and `:quit` closes the widget.

use role_assistant::runtime::{OpenError, UrlOpener};
use role_assistant::{
    AssistantConfig, AssistantWidget, ConvContext, ConvPhase, ConversationSnapshot, HttpBackend,
    LoggingBackend, Message, SessionManager, SqliteSessionStore, StaticToken, WidgetUpdate,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints URLs instead of launching a browser
struct TerminalOpener;

impl UrlOpener for TerminalOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        println!("-> open {url}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "role_assistant=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AssistantConfig::from_env();

    if let Some(parent) = config.session_db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(path = %config.session_db_path.display(), "Opening session store");
    let store = Arc::new(SqliteSessionStore::open(&config.session_db_path)?);
    let session = SessionManager::open(store, &config.role);

    let token = Arc::new(StaticToken::new(config.api_token.clone()));
    let backend = LoggingBackend::new(HttpBackend::new(&config.api_url, token)?);
    tracing::info!(api_url = %config.api_url, role = %config.role, page = %config.page, "Backend configured");

    let widget = AssistantWidget::start(
        ConvContext::new(&config.role, &config.page),
        session,
        backend,
        TerminalOpener,
        config.app_url.clone(),
    );
    // Subscribe before mounting so the greeting is printed
    let printer = tokio::spawn(print_updates(widget.subscribe()));
    widget.remount().await?;

    let mut sent = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let quit = loop {
        let Some(line) = lines.next_line().await? else {
            break false;
        };
        let line = line.trim();
        if line == ":quit" {
            break true;
        }
        if let Some(arg) = line.strip_prefix(":open") {
            open_action(&widget, arg.trim()).await?;
            continue;
        }
        if !line.is_empty() {
            sent += 1;
        }
        widget.send(line).await?;
    };

    // Piped input ends before the replies arrive
    if !quit {
        widget.wait_until(|s| answered(s, sent)).await?;
    }

    widget.close().await;
    printer.await?;
    Ok(())
}

/// Every sent line is on screen, the greeting has landed, and nothing is in flight
fn answered(snapshot: &ConversationSnapshot, sent: usize) -> bool {
    let users = snapshot.messages.iter().filter(|m| !m.is_assistant()).count();
    snapshot.phase == ConvPhase::Idle
        && users >= sent
        && snapshot.assistant_messages().next().is_some()
}

async fn open_action(
    widget: &AssistantWidget,
    arg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = widget.snapshot();
    let actions = snapshot.latest_actions();
    let picked = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| actions.get(i));

    match picked {
        Some(action) => widget.activate(action.clone()).await?,
        None => println!("No action {arg:?}; the last reply offered {}", actions.len()),
    }
    Ok(())
}

async fn print_updates(mut updates: broadcast::Receiver<WidgetUpdate>) {
    loop {
        match updates.recv().await {
            Ok(WidgetUpdate::MessageAppended(message)) if message.is_assistant() => {
                print_assistant(&message);
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Terminal fell behind the conversation");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_assistant(message: &Message) {
    println!("assistant> {}", message.text);
    for (i, action) in message.actions.iter().enumerate() {
        println!("  [{}] {} ({})", i + 1, action.title, action.url);
    }
}
