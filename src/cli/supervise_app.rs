//! Supervisor runner
//!
//! Connects to the engine daemon and drives it from call events read on
//! stdin, one command per line.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::application::ports::{CallEvent, CountryLocator, PolicySource};
use crate::application::{
    ConnectionSupervisor, PolicyGate, ProgressBroadcaster, ProgressListener, SupervisorConfig,
    SupervisorDeps,
};
use crate::domain::config::AppConfig;
use crate::infrastructure::calls::CallStatus;
use crate::infrastructure::{
    create_notifier, JsonRecordingIndex, LocaleCountryLocator, MemoryCallList, TomlPolicySource,
};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::call_feed::FeedCommand;
use super::ipc::{SocketConnector, SocketPath};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Run the supervisor until stdin closes or SIGINT/SIGTERM
pub async fn run_supervisor(config: AppConfig) -> ExitCode {
    let presenter = Arc::new(Presenter::new());

    let mut shutdown = match ShutdownSignal::install() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let gate = PolicyGate::from_build(
        TomlPolicySource::embedded(),
        LocaleCountryLocator::new(config.country.clone()),
    );
    if !gate.is_enabled() {
        presenter.warn("Call recording is not enabled in this build");
    }

    let calls = Arc::new(MemoryCallList::new());
    let progress = Arc::new(ProgressBroadcaster::new(config.progress_interval_or_default()));
    let listener: Arc<dyn ProgressListener> = presenter.clone();
    progress.register(Arc::clone(&listener));

    let socket_path = SocketPath::resolve(config.socket_path.as_deref());
    let supervisor = ConnectionSupervisor::new(
        SupervisorConfig {
            enabled: gate.is_enabled(),
            retry: config.retry_policy(),
            connect_timeout: config.connect_timeout_or_default(),
        },
        SupervisorDeps {
            connector: Arc::new(SocketConnector::new(socket_path.clone())),
            notifier: create_notifier(config.notify_or_default()),
            index: Arc::new(JsonRecordingIndex::in_dir(config.recordings_dir_or_default())),
            calls: calls.clone(),
            progress: Arc::clone(&progress),
        },
    );

    presenter.info(&format!(
        "Engine socket: {} | commands: active|hold|resume|disconnect <number>, record [number], stop, status",
        socket_path.path().display()
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() || line.trim_start().starts_with('#') {
                        continue;
                    }
                    match line.parse::<FeedCommand>() {
                        Ok(command) => {
                            apply(&supervisor, &calls, &gate, &presenter, command).await;
                        }
                        Err(e) => presenter.warn(&e.to_string()),
                    }
                }
                Ok(None) => {
                    debug!("Call feed closed");
                    break;
                }
                Err(e) => {
                    presenter.error(&format!("Failed to read call feed: {}", e));
                    supervisor.uninitialize().await;
                    return ExitCode::from(EXIT_ERROR);
                }
            }
        }
    }

    if supervisor.is_recording().await {
        supervisor.finish_recording().await;
    }
    supervisor.uninitialize().await;
    progress.unregister(&listener);
    presenter.stop_spinner();
    ExitCode::from(EXIT_SUCCESS)
}

async fn apply<S, L>(
    supervisor: &ConnectionSupervisor,
    calls: &MemoryCallList,
    gate: &PolicyGate<S, L>,
    presenter: &Presenter,
    command: FeedCommand,
) where
    S: PolicySource,
    L: CountryLocator,
{
    match command {
        FeedCommand::Active(number) => {
            calls.activate(&number);
            supervisor.on_call_event(CallEvent::CallListChanged).await;
        }
        FeedCommand::Hold(number) => {
            if calls.hold(&number) {
                supervisor.on_call_event(CallEvent::CallListChanged).await;
            } else {
                presenter.warn(&format!("Unknown call {}", number));
            }
        }
        FeedCommand::Resume(number) => {
            if calls.resume(&number) {
                supervisor.on_call_event(CallEvent::CallListChanged).await;
            } else {
                presenter.warn(&format!("Unknown call {}", number));
            }
        }
        FeedCommand::Disconnect(number) => {
            calls.remove(&number);
            supervisor
                .on_call_event(CallEvent::CallDisconnected {
                    number: Some(number),
                })
                .await;
        }
        FeedCommand::Record(number) => {
            let Some(number) = number.or_else(|| latest_active_call(calls)) else {
                presenter.warn("No active call to record");
                return;
            };
            if !gate.can_record_in_current_country() {
                warn!("Recording not permitted in the current country");
                presenter.warn("Call recording is not permitted here");
                return;
            }
            let creation_time = Utc::now().timestamp_millis();
            if !supervisor.start_recording(&number, creation_time).await {
                presenter.error("Recording could not be started");
            }
        }
        FeedCommand::Stop => supervisor.finish_recording().await,
        FeedCommand::Status => {
            presenter.info(&format!(
                "Connection: {}",
                supervisor.connection_state().await
            ));
            match supervisor.get_active_recording().await {
                Some(session) => presenter.session(&session),
                None => presenter.info("Not recording"),
            }
        }
    }
}

fn latest_active_call(calls: &MemoryCallList) -> Option<String> {
    calls
        .snapshot()
        .into_iter()
        .rev()
        .find(|c| c.status == CallStatus::Active)
        .map(|c| c.number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_active_call_skips_held_calls() {
        let calls = MemoryCallList::new();
        assert!(latest_active_call(&calls).is_none());

        calls.activate("111");
        calls.activate("222");
        calls.hold("222");
        assert_eq!(latest_active_call(&calls).as_deref(), Some("111"));

        calls.resume("222");
        assert_eq!(latest_active_call(&calls).as_deref(), Some("222"));
    }
}
