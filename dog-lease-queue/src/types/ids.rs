use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace for deterministic job identities (UUID v5)
const JOB_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_2d0e_93a4_4b57_8e21_0f5d_b7c3_a914);

/// Separator between identity parts; a control character so that
/// `["a:b", "c"]` and `["a", "b:c"]` never collide.
const PART_SEPARATOR: char = '\u{1f}';

/// Identity of a job, shared by its queue entry, lease and completion marker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Derive a stable identity from the job's logical content.
    ///
    /// The same parts (same ticket, same content) always produce the same id,
    /// which is what lets producers detect a resubmission.
    pub fn derive<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut material = String::new();
        for (index, part) in parts.into_iter().enumerate() {
            if index > 0 {
                material.push(PART_SEPARATOR);
            }
            material.push_str(part.as_ref());
        }
        Self(Uuid::new_v5(&JOB_ID_NAMESPACE, material.as_bytes()).to_string())
    }

    /// Create a job ID from a string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
