//! Update-check state machine.
//!
//! ```text
//! Idle ──begin──▶ Checking
//! Checking ── Availability(false, _)    ──▶ Done (suppress)
//! Checking ── Availability(true, true)  ──▶ Downloading (keep waiting)
//! Checking ── Availability(true, false) ──▶ Available ──▶ Done (notify)
//! Checking/Downloading ── Downloaded    ──▶ Downloaded ──▶ Done (notify)
//! Checking/Downloading ── Failed        ──▶ Failed ──▶ Done (suppress)
//! ```
//!
//! The first terminal event commits the outcome; later events are ignored.

/// Asynchronous reports emitted by the system update service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Availability {
        available: bool,
        downloading: bool,
        available_version: String,
        update_size: i32,
        last_update_date: String,
        error_reason: String,
    },
    Downloaded,
    Failed {
        consecutive_failures: i32,
        last_reason: String,
    },
}

impl UpdateEvent {
    /// Availability report with empty descriptive fields.
    pub fn availability(available: bool, downloading: bool) -> Self {
        UpdateEvent::Availability {
            available,
            downloading,
            available_version: String::new(),
            update_size: 0,
            last_update_date: String::new(),
            error_reason: String::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateEvent::Availability { .. } => "UpdateAvailableStatus",
            UpdateEvent::Downloaded => "UpdateDownloaded",
            UpdateEvent::Failed { .. } => "UpdateFailed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Idle,
    Checking,
    Available,
    Downloading,
    Downloaded,
    Failed,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    ShouldNotify,
    Suppress,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// One check cycle. Lives only as long as the worker.
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    state: CheckState,
    available: bool,
    downloading: bool,
    outcome: Outcome,
}

impl Default for UpdateCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateCheck {
    pub fn new() -> Self {
        Self {
            state: CheckState::Idle,
            available: false,
            downloading: false,
            outcome: Outcome::Pending,
        }
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn downloading(&self) -> bool {
        self.downloading
    }

    pub fn begin(&mut self) {
        if self.state == CheckState::Idle {
            self.state = CheckState::Checking;
        }
    }

    /// Feeds one service report into the machine and returns the outcome so far.
    pub fn apply(&mut self, event: &UpdateEvent) -> Outcome {
        if self.state == CheckState::Done {
            tracing::debug!(event = event.name(), "Ignoring event after outcome committed");
            return self.outcome;
        }

        let (next, outcome) = match event {
            UpdateEvent::Availability {
                available,
                downloading,
                ..
            } => {
                self.available = *available;
                self.downloading = *downloading;
                match (*available, *downloading) {
                    (false, _) => (CheckState::Done, Outcome::Suppress),
                    (true, true) => (CheckState::Downloading, Outcome::Pending),
                    (true, false) => (CheckState::Available, Outcome::ShouldNotify),
                }
            }
            UpdateEvent::Downloaded => {
                self.downloading = false;
                (CheckState::Downloaded, Outcome::ShouldNotify)
            }
            UpdateEvent::Failed { .. } => {
                self.downloading = false;
                (CheckState::Failed, Outcome::Suppress)
            }
        };

        tracing::debug!(
            event = event.name(),
            from = ?self.state,
            to = ?next,
            available = self.available,
            downloading = self.downloading,
            "Update check transition"
        );

        self.state = if outcome.is_terminal() {
            CheckState::Done
        } else {
            next
        };
        self.outcome = outcome;
        outcome
    }
}
