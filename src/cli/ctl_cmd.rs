//! Ctl command handler - sends one request to the running engine

use chrono::Utc;

use crate::application::ports::RecorderService;

use super::args::CtlAction;
use super::ipc::{EngineSocketClient, SocketPath};
use super::presenter::Presenter;

/// Handle ctl subcommand
pub async fn handle_ctl_command(
    action: CtlAction,
    socket_path: &SocketPath,
    presenter: &Presenter,
) -> Result<(), String> {
    if !socket_path.exists() {
        return Err("No engine running. Start with: call-recorder engine".to_string());
    }

    let client = EngineSocketClient::connect(socket_path)
        .await
        .map_err(|e| format!("Failed to connect to engine: {}", e))?;

    let result = run_action(&client, action, presenter).await;
    let _ = client.disconnect().await;
    result
}

async fn run_action(
    client: &EngineSocketClient,
    action: CtlAction,
    presenter: &Presenter,
) -> Result<(), String> {
    match action {
        CtlAction::Start { phone_number } => {
            let started = client
                .start(&phone_number, Utc::now().timestamp_millis())
                .await
                .map_err(|e| e.to_string())?;
            if !started {
                return Err("Engine could not start recording".to_string());
            }
            match client.get_active().await.map_err(|e| e.to_string())? {
                Some(session) => presenter.session(&session),
                None => presenter.success("Recording started"),
            }
        }
        CtlAction::Stop => match client.stop().await.map_err(|e| e.to_string())? {
            Some(session) => {
                presenter.success("Recording saved");
                presenter.session(&session);
            }
            None => presenter.warn("Not recording, nothing to stop"),
        },
        CtlAction::Status => {
            let recording = client.is_recording().await.map_err(|e| e.to_string())?;
            presenter.engine_status(if recording { "recording" } else { "idle" });
        }
        CtlAction::Active => match client.get_active().await.map_err(|e| e.to_string())? {
            Some(session) => presenter.session(&session),
            None => presenter.info("Not recording"),
        },
    }
    Ok(())
}
