//! A terminal client for megagiga: log in, keep the session around, refresh it

/// The "functional core" to the main module's "imperative shell"
mod app;

/// Configuration and argument parsing
mod config;

use app::App;
use clap::Parser;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use megagiga_core::{session::RemoteSessionRepository, Client, LoginStateHolder, TokenStore};
use ratatui::DefaultTerminal;
use std::{io, path::Path, process::ExitCode, sync::Arc};
use tokio::{
    fs,
    sync::mpsc::{unbounded_channel, UnboundedSender},
    task::JoinHandle,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> io::Result<ExitCode> {
    let config = config::Config::parse();

    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir).await?;
    let _log_guard = init_tracing(&data_dir);

    let http = config.http_client().map_err(io::Error::other)?;
    let repository = RemoteSessionRepository::new(Client::new(config.server.clone()), http);
    let holder = Arc::new(LoginStateHolder::new(Arc::new(repository)));
    let store = Arc::new(TokenStore::in_dir(&data_dir));

    tracing::info!(server = %config.server, data_dir = ?data_dir, "starting");

    let mut terminal = ratatui::init();
    terminal.clear()?;
    let res = run(terminal, holder, store).await;
    ratatui::restore();
    res
}

/// Send logs to a file in the data directory, since the terminal is busy
/// drawing the UI. Keep the guard alive until exit or buffered lines are lost.
fn init_tracing(data_dir: &Path) -> WorkerGuard {
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(data_dir, "megagiga.log"));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    guard
}

/// Manage the lifecycle of the app
async fn run(
    mut terminal: DefaultTerminal,
    holder: Arc<LoginStateHolder>,
    store: Arc<TokenStore>,
) -> io::Result<ExitCode> {
    let mut app = App::new(Arc::clone(&holder));

    // Side-effectful behaviors (disk and network) run as async tasks. Once
    // they're done, we read their results off of a channel. We keep track of
    // outstanding effects so we can exit cleanly.
    let (effect_tx, mut effect_rx) = unbounded_channel();
    let mut outstanding_effects = Vec::with_capacity(1);

    outstanding_effects.push(spawn_effect_task(
        effect_tx.clone(),
        Arc::clone(&store),
        app.init(),
    ));
    terminal.draw(|frame| app.render(frame))?;

    let mut event_stream = EventStream::new();

    // The holder publishes its state; we redraw when the form changes and
    // navigate when the authenticated signal flips.
    let mut state_rx = holder.subscribe_state();
    let mut authenticated_rx = holder.subscribe_authenticated();

    loop {
        let next_action_opt = tokio::select! {
            event_opt = event_stream.next() => {
                match event_opt {
                    Some(Ok(Event::Key(key_event))) => {
                        Some(app::Action::Key(key_event))
                    }
                    Some(Err(err)) => {
                        Some(app::Action::Problem(err.to_string()))
                    }
                    _ => None,
                }
            },

            Ok(()) = state_rx.changed() => {
                Some(app::Action::LoginStateChanged)
            },

            Ok(()) = authenticated_rx.changed() => {
                Some(app::Action::AuthenticatedChanged(*authenticated_rx.borrow_and_update()))
            },

            effect_opt = effect_rx.recv() => {
                effect_opt.flatten()
            }
        };

        if let Some(action) = next_action_opt {
            for effect in app.handle(action) {
                outstanding_effects.push(spawn_effect_task(
                    effect_tx.clone(),
                    Arc::clone(&store),
                    effect,
                ));
            }
        }

        terminal.draw(|frame| app.render(frame))?;

        // This list should never be too long (since we do this on every pass
        // through the event loop) so a full scan is fine.
        outstanding_effects.retain(|handle| !handle.is_finished());

        // Wait for outstanding effects (e.g. saving the session) before
        // exiting. `App` cancels in-flight logins when it decides to exit, so
        // this doesn't wait on the network.
        if let Some(code) = app.should_exit() {
            for effect in outstanding_effects.drain(..) {
                if let Err(err) = effect.await {
                    tracing::error!(?err, "effect task failed during shutdown");
                }
            }

            return Ok(code);
        }
    }
}

/// Spawn a task to run an effect and send the next action to the app.
fn spawn_effect_task(
    effect_tx: UnboundedSender<Option<app::Action>>,
    store: Arc<TokenStore>,
    effect: app::Effect,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let next_action = effect.run(&store).await;

        // A closed channel means the loop has exited, and nobody is left to
        // handle the action.
        let _ = effect_tx.send(next_action);
    })
}
