pub mod json;

use std::fmt;

use crate::{Job, QueueResult, backend::StoreValue};

/// Why a popped entry was dropped instead of returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// The store held something other than text
    NotText,
    /// Text that does not parse
    Malformed(String),
    /// Parsed, but not an object; carries the kind that was found
    NotAnObject(&'static str),
    /// An object without a usable `jobId`
    MissingJobId,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotText => write!(f, "entry is not text"),
            Self::Malformed(err) => write!(f, "entry does not parse: {err}"),
            Self::NotAnObject(kind) => write!(f, "entry is a {kind}, not an object"),
            Self::MissingJobId => write!(f, "entry has no jobId"),
        }
    }
}

/// Result of decoding one queue entry
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEntry {
    Job(Job),
    Discard(DiscardReason),
}

/// Converts jobs to and from their stored form.
///
/// Encoding always produces text; decoding never fails, it classifies.
pub trait EntryCodec: Send + Sync {
    /// Serialize a job into its canonical stored string
    fn encode(&self, job: &Job) -> QueueResult<String>;

    /// Classify a popped entry as a job or a discard
    fn decode(&self, entry: StoreValue) -> ParsedEntry;

    /// Get codec identifier
    fn codec_id(&self) -> &'static str;
}
