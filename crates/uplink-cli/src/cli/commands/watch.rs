//! Watch command handler: authenticate, then hold the live-status stream.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use uplink_core::auth::{AuthClient, Credentials};
use uplink_core::config::Config;
use uplink_core::interrupt;
use uplink_core::session::{Session, SessionEvent};
use uplink_core::status::{AUTH_FAILED_MESSAGE, Status, StatusView};

use crate::renderer::StatusRenderer;

pub struct WatchOptions<'a> {
    pub config: &'a Config,
    pub base_url_flag: Option<&'a str>,
    pub username: Option<String>,
    pub key: Option<String>,
}

pub async fn run(options: WatchOptions<'_>) -> Result<()> {
    let base_url = options.config.resolve_base_url(options.base_url_flag)?;

    let username = options
        .username
        .or_else(|| options.config.auth.username.clone())
        .context("no username: pass --username or set [auth] username in config")?;
    let key = match options.key {
        Some(key) => key,
        None => prompt_for_key()?,
    };
    let credentials = Credentials::new(username, key);

    let mut renderer = StatusRenderer::new();
    let mut view = StatusView::new();

    view.set(Status::Authenticating);
    renderer.status(&view);

    let auth = AuthClient::new(base_url.clone());
    if !auth.authenticate(&credentials).await {
        view.set(Status::Error {
            message: AUTH_FAILED_MESSAGE.to_string(),
        });
        renderer.status(&view);
        bail!("authentication failed");
    }

    view.set(Status::Connecting);
    renderer.status(&view);

    let mut session = Session::new(base_url);
    let mut events = session.connect();

    loop {
        tokio::select! {
            () = interrupt::wait_for_interrupt() => {
                session.disconnect();
                view.set(Status::Disconnected);
                renderer.status(&view);
                return Ok(());
            }
            event = events.recv() => {
                let Some(event) = event else {
                    // The connection task went away without a terminal event.
                    view.set(Status::Disconnected);
                    renderer.status(&view);
                    return Ok(());
                };

                if let SessionEvent::StreamError { error } = &event {
                    renderer.diagnostic(&format!("Stream error: {error}"));
                }

                view.apply(&event);
                if matches!(event, SessionEvent::Ping { .. }) {
                    renderer.ping(&view);
                } else {
                    renderer.status(&view);
                }

                if view.status().is_terminal() {
                    session.disconnect();
                    return match view.status() {
                        Status::Error { .. } => Err(anyhow!("connection error")),
                        _ => Ok(()),
                    };
                }
            }
        }
    }
}

/// Reads the key from stdin, prompting on stderr so stdout stays clean.
fn prompt_for_key() -> Result<String> {
    let mut err = std::io::stderr();
    write!(err, "Key: ")?;
    err.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("read key from stdin")?;
    let key = line.trim_end_matches(['\r', '\n']).to_string();
    if key.is_empty() {
        bail!("empty key");
    }
    Ok(key)
}
