use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;

use super::machine::{MonitorAction, SessionCheck, SessionMonitor};

// ============================================================================
// Constants
// ============================================================================

/// Provider poll cadence in seconds.
const SESSION_POLL_INTERVAL_SECS: u64 = 30;

/// Warning countdown cadence in seconds.
const COUNTDOWN_TICK_SECS: u64 = 1;

/// Buffer size for the monitor event channel.
/// Countdown ticks arrive at 1/s; 32 gives the owner ample slack.
const EVENT_CHANNEL_SIZE: usize = 32;

/// Buffer size for the command channel (extend requests).
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Monitor-to-owner notifications. The owner applies them to its
/// `IdentityStore` in its own loop turn, keeping store writes
/// single-threaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Surface (or update) the expiry warning with seconds remaining.
    Warning { seconds_left: i64 },
    /// Hide the warning; the session recovered or was extended.
    WarningCleared,
    /// The session is gone. The owner must call `handle_expiration`.
    Expired,
}

enum MonitorCommand {
    Extend,
}

/// Cancellable handle to a running monitor.
///
/// Dropping the handle aborts the polling task and both timers, so a
/// monitor cannot outlive the context that owns it.
pub struct MonitorHandle {
    commands: mpsc::Sender<MonitorCommand>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Request a session extension (the user pressed "extend").
    /// Returns false if the monitor has already stopped.
    pub fn extend(&self) -> bool {
        self.commands.try_send(MonitorCommand::Extend).is_ok()
    }

    /// Stop polling and cancel all timers.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start watching the session. Spawned when an actor becomes present;
/// the owner stops the handle when the actor is cleared or its context
/// is torn down.
pub fn spawn(
    provider: Arc<dyn AuthProvider>,
    events: mpsc::Sender<MonitorEvent>,
) -> MonitorHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let task = tokio::spawn(run(provider, events, cmd_rx));
    MonitorHandle {
        commands: cmd_tx,
        task,
    }
}

/// Convenience pairing of `spawn` with a fresh event channel.
pub fn channel() -> (mpsc::Sender<MonitorEvent>, mpsc::Receiver<MonitorEvent>) {
    mpsc::channel(EVENT_CHANNEL_SIZE)
}

async fn run(
    provider: Arc<dyn AuthProvider>,
    events: mpsc::Sender<MonitorEvent>,
    mut commands: mpsc::Receiver<MonitorCommand>,
) {
    let mut machine = SessionMonitor::new();
    machine.set_actor_present(true);

    let mut poll = tokio::time::interval(Duration::from_secs(SESSION_POLL_INTERVAL_SECS));
    let mut countdown = tokio::time::interval(Duration::from_secs(COUNTDOWN_TICK_SECS));
    countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let action = tokio::select! {
            _ = poll.tick() => {
                let was_warning = machine.is_warning();
                let action = machine.on_check(classify(provider.as_ref()).await);
                if machine.is_warning() && !was_warning {
                    // Countdown cadence restarts when the warning opens
                    countdown.reset();
                }
                action
            }
            _ = countdown.tick(), if machine.is_warning() => {
                machine.on_countdown_tick()
            }
            cmd = commands.recv() => match cmd {
                Some(MonitorCommand::Extend) => match provider.refresh_session().await {
                    Ok(session) => {
                        info!(expires_at = %session.expires_at, "Session extended");
                        machine.on_extended()
                    }
                    Err(e) => {
                        warn!(error = %e, "Session extension failed, failing closed");
                        machine.on_check(SessionCheck::Missing)
                    }
                },
                // Owner dropped the handle side; nothing left to report to.
                None => return,
            },
        };

        match action {
            MonitorAction::None => {}
            MonitorAction::Warn { seconds_left } => {
                if events
                    .send(MonitorEvent::Warning { seconds_left })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            MonitorAction::ClearWarning => {
                if events.send(MonitorEvent::WarningCleared).await.is_err() {
                    return;
                }
            }
            MonitorAction::Expire => {
                debug!("Monitor expiring session");
                let _ = events.send(MonitorEvent::Expired).await;
                return;
            }
        }
    }
}

/// Classify the current session for the state machine. Every failure
/// path collapses to `Missing` (fail closed, not open).
async fn classify(provider: &dyn AuthProvider) -> SessionCheck {
    let session = match provider.get_session().await {
        Ok(Some(session)) => session,
        Ok(None) => return SessionCheck::Missing,
        Err(e) => {
            warn!(error = %e, "Session check error, failing closed");
            return SessionCheck::Missing;
        }
    };

    if session.is_expired() {
        return SessionCheck::Expired;
    }

    // The profile row behind the actor must still exist.
    match provider.fetch_profile(&session.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(user_id = %session.user_id, "Profile row missing, failing closed");
            return SessionCheck::Missing;
        }
        Err(e) => {
            warn!(error = %e, "Profile check error, failing closed");
            return SessionCheck::Missing;
        }
    }

    if session.needs_refresh() {
        SessionCheck::ExpiringSoon {
            seconds_left: session.seconds_until_expiry(),
        }
    } else {
        SessionCheck::Active
    }
}

// ============================================================================
// Tests
// ============================================================================
