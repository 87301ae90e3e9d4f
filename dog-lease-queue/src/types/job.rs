use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{JobId, QueueError, QueueResult};

/// Attribute name reserved for the job identity
pub const JOB_ID_FIELD: &str = "jobId";

/// A unit of work: its identity plus producer-supplied attributes.
///
/// The queue, lease and ledger never look inside `attributes`; they are
/// handed to the processor exactly as the producer wrote them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "jobId")]
    pub job_id: JobId,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Job {
    /// Create a job with no attributes
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            attributes: Map::new(),
        }
    }

    /// Create a job whose attributes are the fields of `payload`.
    ///
    /// `payload` must serialize to a JSON object. A `jobId` field in the
    /// payload is dropped in favour of `job_id`.
    pub fn with_payload<T: Serialize>(job_id: impl Into<JobId>, payload: &T) -> QueueResult<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(mut attributes) => {
                attributes.remove(JOB_ID_FIELD);
                Ok(Self {
                    job_id: job_id.into(),
                    attributes,
                })
            }
            other => Err(QueueError::SerializationError(format!(
                "job payload must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Add an attribute. `jobId` is reserved and ignored here.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != JOB_ID_FIELD {
            self.attributes.insert(key, value.into());
        }
        self
    }

    pub fn id(&self) -> &JobId {
        &self.job_id
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Deserialize the attributes into a typed payload
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> QueueResult<T> {
        Ok(serde_json::from_value(Value::Object(self.attributes.clone()))?)
    }
}

/// Short name of a JSON value's kind, for log messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TicketPayload {
        #[serde(rename = "ticketId")]
        ticket_id: u64,
        question: String,
    }

    #[test]
    fn test_serializes_job_id_beside_attributes() {
        let job = Job::new("abc").with_attribute("ticketId", 1);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value, json!({"jobId": "abc", "ticketId": 1}));
    }

    #[test]
    fn test_reserved_attribute_is_ignored() {
        let job = Job::new("abc").with_attribute(JOB_ID_FIELD, "other");
        assert_eq!(job.job_id.as_str(), "abc");
        assert!(job.attributes.is_empty());
    }

    #[test]
    fn test_typed_payload_round_trips_through_attributes() {
        let payload = TicketPayload {
            ticket_id: 7,
            question: "where is my order?".to_string(),
        };
        let job = Job::with_payload("t-7", &payload).unwrap();
        assert_eq!(job.attribute("ticketId"), Some(&json!(7)));
        assert_eq!(job.payload::<TicketPayload>().unwrap(), payload);
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let result = Job::with_payload("x", &vec![1, 2, 3]);
        assert!(matches!(result, Err(QueueError::SerializationError(_))));
    }
}
