use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

const MASK_PREFIX: usize = 4;

/// An API key for the external search API
///
/// `Display` masks the key so it can be logged; use [`Credential::expose`]
/// when building a request.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the first four characters followed by an ellipsis
    ///
    /// Keys too short to keep most of their characters hidden are masked
    /// completely.
    pub fn masked(&self) -> String {
        if self.0.chars().count() <= 2 * MASK_PREFIX {
            return "…".to_string();
        }
        let prefix: String = self.0.chars().take(MASK_PREFIX).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Usage state of a single credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// The credential may be used
    Active,

    /// The credential hit its quota and is parked until `resume_at`
    Suspended { resume_at: Instant },
}

impl CredentialState {
    /// Returns true if a request may be made with this credential at `now`
    ///
    /// A suspension whose `resume_at` has been reached counts as available.
    pub fn is_available(&self, now: Instant) -> bool {
        match self {
            Self::Active => true,
            Self::Suspended { resume_at } => *resume_at <= now,
        }
    }

    /// Returns the instant the credential becomes usable again, if suspended
    pub fn resume_at(&self) -> Option<Instant> {
        match self {
            Self::Active => None,
            Self::Suspended { resume_at } => Some(*resume_at),
        }
    }
}
