use serde::Serialize;
use serde_json::{Map, Value};

/// One form submission: the caller's text fields plus one entry per declared
/// attachment field, holding either a data URI or `null`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SubmissionRecord(Map<String, Value>);

impl SubmissionRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Set an attachment field. Attachment keys win over text fields of the same name.
    pub fn insert_attachment(&mut self, name: impl Into<String>, data_uri: Option<String>) {
        let value = data_uri.map(Value::String).unwrap_or(Value::Null);
        self.0.insert(name.into(), value);
    }
}
