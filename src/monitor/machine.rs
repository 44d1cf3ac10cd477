use tracing::debug;

/// Monitor lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No actor present; nothing to watch.
    Idle,
    /// Actor present, session healthy at last poll.
    Polling,
    /// Session expires within the lead window; countdown running.
    Warning { seconds_left: i64 },
    /// Terminal. Expiry has been signalled exactly once.
    Expired,
}

/// Result of one provider poll, as classified by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// No session, provider error, or the backing profile row is gone.
    Missing,
    /// Session expiry is already in the past.
    Expired,
    /// Session expires within the warning lead window.
    ExpiringSoon { seconds_left: i64 },
    /// Session healthy.
    Active,
}

/// What the owning loop must do after feeding the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    None,
    /// Surface (or update) the expiry warning and its countdown.
    Warn { seconds_left: i64 },
    /// Hide a previously surfaced warning.
    ClearWarning,
    /// Invoke `handle_expiration`. Emitted at most once.
    Expire,
}

/// Pure session-watch state machine.
///
/// The driver owns the timers and the provider; this type only encodes
/// the transitions, so every lifecycle path is testable synchronously.
#[derive(Debug)]
pub struct SessionMonitor {
    state: MonitorState,
}

impl Default for SessionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMonitor {
    pub fn new() -> Self {
        Self {
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.state, MonitorState::Warning { .. })
    }

    pub fn is_expired(&self) -> bool {
        self.state == MonitorState::Expired
    }

    /// Actor presence gates the whole machine: present arms polling,
    /// absent disarms it (and any warning) without signalling expiry.
    pub fn set_actor_present(&mut self, present: bool) {
        match (present, self.state) {
            (true, MonitorState::Idle) => self.state = MonitorState::Polling,
            (false, MonitorState::Expired) => {}
            (false, _) => self.state = MonitorState::Idle,
            _ => {}
        }
    }

    /// Feed one poll result. Fail closed: `Missing` and `Expired` both
    /// terminate the session.
    pub fn on_check(&mut self, check: SessionCheck) -> MonitorAction {
        match self.state {
            MonitorState::Idle | MonitorState::Expired => MonitorAction::None,
            MonitorState::Polling | MonitorState::Warning { .. } => match check {
                SessionCheck::Missing | SessionCheck::Expired => {
                    debug!(?check, "Session check failed, expiring");
                    self.state = MonitorState::Expired;
                    MonitorAction::Expire
                }
                SessionCheck::ExpiringSoon { seconds_left } => {
                    self.state = MonitorState::Warning { seconds_left };
                    MonitorAction::Warn { seconds_left }
                }
                SessionCheck::Active => {
                    let was_warning = self.is_warning();
                    self.state = MonitorState::Polling;
                    if was_warning {
                        MonitorAction::ClearWarning
                    } else {
                        MonitorAction::None
                    }
                }
            },
        }
    }

    /// One-second countdown tick while warning. Reaching zero expires.
    pub fn on_countdown_tick(&mut self) -> MonitorAction {
        match self.state {
            MonitorState::Warning { seconds_left } => {
                let remaining = seconds_left - 1;
                if remaining <= 0 {
                    self.state = MonitorState::Expired;
                    MonitorAction::Expire
                } else {
                    self.state = MonitorState::Warning {
                        seconds_left: remaining,
                    };
                    MonitorAction::Warn {
                        seconds_left: remaining,
                    }
                }
            }
            _ => MonitorAction::None,
        }
    }

    /// A successful user-initiated extension cancels the countdown and
    /// resumes plain polling.
    pub fn on_extended(&mut self) -> MonitorAction {
        match self.state {
            MonitorState::Warning { .. } => {
                self.state = MonitorState::Polling;
                MonitorAction::ClearWarning
            }
            MonitorState::Polling => MonitorAction::None,
            _ => MonitorAction::None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
