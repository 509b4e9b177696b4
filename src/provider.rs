use std::sync::mpsc::{Receiver, SendError, Sender};
use std::thread::{self, JoinHandle};

use crate::config::ClientConfig;
use crate::scorigami_fetch::{FetchError, fetch_year_with_retry};
use crate::state::{Delta, ProviderCommand, RequestToken};

/// Runs fetches off the UI thread. Exits once every command sender is dropped.
pub fn spawn_provider(
    config: ClientConfig,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        // A command that arrived while a fetch was retrying.
        let mut pending: Option<ProviderCommand> = None;
        loop {
            let cmd = match pending.take() {
                Some(cmd) => cmd,
                None => match cmd_rx.recv() {
                    Ok(cmd) => cmd,
                    Err(_) => return,
                },
            };
            let cmd = coalesce(cmd, &cmd_rx, &tx);
            match cmd {
                ProviderCommand::FetchYear { token } => {
                    if handle_fetch(&config, token, &cmd_rx, &mut pending, &tx).is_err() {
                        return;
                    }
                }
            }
        }
    })
}

/// Keeps only the newest queued fetch; older ones are already superseded.
fn coalesce(
    mut cmd: ProviderCommand,
    cmd_rx: &Receiver<ProviderCommand>,
    tx: &Sender<Delta>,
) -> ProviderCommand {
    while let Ok(next) = cmd_rx.try_recv() {
        let ProviderCommand::FetchYear { token } = &cmd;
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Skipped queued fetch for {}",
            token.year
        )));
        cmd = next;
    }
    cmd
}

fn handle_fetch(
    config: &ClientConfig,
    token: RequestToken,
    cmd_rx: &Receiver<ProviderCommand>,
    pending: &mut Option<ProviderCommand>,
    tx: &Sender<Delta>,
) -> Result<(), SendError<Delta>> {
    let _ = tx.send(Delta::Log(format!(
        "[INFO] GET {}",
        config.year_url(token.year)
    )));
    let result = fetch_year_with_retry(
        config,
        token.year,
        |attempt, err| {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] {} attempt {attempt} failed, retrying: {err}",
                token.year
            )));
        },
        || {
            if pending.is_none() {
                *pending = cmd_rx.try_recv().ok();
            }
            pending.is_some()
        },
    );
    match result {
        Ok(dataset) => tx.send(Delta::DatasetLoaded { token, dataset }),
        Err(FetchError::Superseded) => tx.send(Delta::Log(format!(
            "[INFO] Abandoned retries for {} (request {})",
            token.year, token.generation
        ))),
        Err(err) => tx.send(Delta::DatasetFailed {
            token,
            message: err.to_string(),
        }),
    }
}
