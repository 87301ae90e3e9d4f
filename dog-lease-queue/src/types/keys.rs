use crate::JobId;

/// Key layout for one queue namespace.
///
/// ```text
/// <namespace>:queue          pending entries, FIFO list
/// <namespace>:lock:<jobId>   lease sentinel with TTL
/// <namespace>:done:<jobId>   completion sentinel with TTL
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn queue(&self) -> String {
        format!("{}:queue", self.namespace)
    }

    pub fn lock(&self, job_id: &JobId) -> String {
        format!("{}:lock:{}", self.namespace, job_id)
    }

    pub fn done(&self, job_id: &JobId) -> String {
        format!("{}:done:{}", self.namespace, job_id)
    }
}
