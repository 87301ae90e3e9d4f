use serde_json::Value;

use crate::{
    Job, JobId, QueueResult,
    backend::StoreValue,
    codec::{DiscardReason, EntryCodec, ParsedEntry},
    types::job::{json_kind, JOB_ID_FIELD},
};

/// JSON codec: entries are compact JSON objects, `jobId` first
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    fn decode_value(value: Value) -> ParsedEntry {
        let mut attributes = match value {
            Value::Object(map) => map,
            other => return ParsedEntry::Discard(DiscardReason::NotAnObject(json_kind(&other))),
        };

        match attributes.remove(JOB_ID_FIELD) {
            Some(Value::String(id)) if !id.is_empty() => ParsedEntry::Job(Job {
                job_id: JobId(id),
                attributes,
            }),
            _ => ParsedEntry::Discard(DiscardReason::MissingJobId),
        }
    }
}

impl EntryCodec for JsonCodec {
    fn encode(&self, job: &Job) -> QueueResult<String> {
        Ok(serde_json::to_string(job)?)
    }

    fn decode(&self, entry: StoreValue) -> ParsedEntry {
        match entry {
            StoreValue::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => Self::decode_value(value),
                Err(err) => ParsedEntry::Discard(DiscardReason::Malformed(err.to_string())),
            },
            StoreValue::Bytes(_) | StoreValue::Structured(_) => ParsedEntry::Discard(DiscardReason::NotText),
        }
    }

    fn codec_id(&self) -> &'static str {
        "json"
    }
}
