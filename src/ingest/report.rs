use crate::credentials::Credential;
use crate::fetcher::FetchError;
use chrono::{DateTime, Utc};
use std::fmt;

/// States a single cycle passes through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Committing,
    Sleeping,
    Suspended {
        credential: Credential,
        resume_at: DateTime<Utc>,
    },
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Committing => write!(f, "committing"),
            Self::Sleeping => write!(f, "sleeping"),
            Self::Suspended {
                credential,
                resume_at,
            } => write!(f, "suspended({} until {})", credential, resume_at.to_rfc3339()),
        }
    }
}

/// What one cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// A non-empty batch was committed
    Stored {
        credential: Credential,
        fetched: usize,
        inserted: usize,
    },

    /// The fetch succeeded with no items
    Empty { credential: Credential },

    /// Network, status or decode failure; nothing stored
    Skipped {
        credential: Credential,
        error: FetchError,
    },

    /// The credential hit its quota and was parked
    Suspended {
        credential: Credential,
        resume_at: DateTime<Utc>,
    },

    /// The fetch succeeded but the batch could not be written
    StoreFailed {
        credential: Credential,
        fetched: usize,
        error: String,
    },

    /// No credential was usable this tick
    AllSuspended { next_resume: DateTime<Utc> },
}

impl CycleReport {
    /// The state the cycle ended in
    pub fn final_state(&self) -> CycleState {
        match self {
            Self::Suspended {
                credential,
                resume_at,
            } => CycleState::Suspended {
                credential: credential.clone(),
                resume_at: *resume_at,
            },
            _ => CycleState::Sleeping,
        }
    }

    /// The credential used, if any
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Stored { credential, .. }
            | Self::Empty { credential }
            | Self::Skipped { credential, .. }
            | Self::Suspended { credential, .. }
            | Self::StoreFailed { credential, .. } => Some(credential),
            Self::AllSuspended { .. } => None,
        }
    }

    /// Rows inserted by this cycle
    pub fn inserted(&self) -> usize {
        match self {
            Self::Stored { inserted, .. } => *inserted,
            _ => 0,
        }
    }

    /// Emits the report at a level matching its severity
    pub fn log(&self) {
        match self {
            Self::Stored {
                credential,
                fetched,
                inserted,
            } => tracing::info!(
                credential = %credential,
                fetched,
                inserted,
                "Stored {} of {} fetched videos",
                inserted,
                fetched
            ),
            Self::Empty { credential } => {
                tracing::info!(credential = %credential, "Fetch returned no videos")
            }
            Self::Skipped { credential, error } => tracing::warn!(
                credential = %credential,
                "Skipping cycle: {}",
                error
            ),
            Self::Suspended {
                credential,
                resume_at,
            } => tracing::warn!(
                credential = %credential,
                "Quota exceeded; credential suspended until {}",
                resume_at.to_rfc3339()
            ),
            Self::StoreFailed {
                credential,
                fetched,
                error,
            } => tracing::error!(
                credential = %credential,
                fetched,
                "Failed to store batch: {}",
                error
            ),
            Self::AllSuspended { next_resume } => tracing::warn!(
                "All credentials suspended; earliest resumes at {}",
                next_resume.to_rfc3339()
            ),
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored {
                credential,
                fetched,
                inserted,
            } => write!(
                f,
                "[{}] stored {} of {} fetched videos",
                credential, inserted, fetched
            ),
            Self::Empty { credential } => write!(f, "[{}] no videos returned", credential),
            Self::Skipped { credential, error } => {
                write!(f, "[{}] skipped: {}", credential, error)
            }
            Self::Suspended {
                credential,
                resume_at,
            } => write!(
                f,
                "[{}] quota exceeded, suspended until {}",
                credential,
                resume_at.to_rfc3339()
            ),
            Self::StoreFailed {
                credential, error, ..
            } => write!(f, "[{}] store failed: {}", credential, error),
            Self::AllSuspended { next_resume } => write!(
                f,
                "all credentials suspended until {}",
                next_resume.to_rfc3339()
            ),
        }
    }
}
