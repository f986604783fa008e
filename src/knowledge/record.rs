// Q&A records and their index metadata
use serde::{Deserialize, Serialize};

/// Placeholder rendered when a metadata field is missing
pub const MISSING_FIELD: &str = "N/A";

/// A past support exchange, the unit stored in the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QARecord {
    /// Stable identifier; assigned at ingestion when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    /// Loosely structured date, usually an email `Date:` header
    #[serde(default)]
    pub date: Option<String>,
    /// Explicit sender (email address or display name)
    #[serde(default)]
    pub from: Option<String>,
    /// Older exports name the sender `sender`; used only when `from` is blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

impl QARecord {
    /// Render the record as the text that gets embedded.
    ///
    /// Segments appear in a fixed order (subject, question, response) and
    /// only when present, joined by a blank line. Returns an empty string
    /// when every field is missing; such records must not be indexed.
    pub fn encode(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(subject) = present(&self.subject) {
            parts.push(format!("Subject: {}", subject));
        }
        if let Some(question) = present(&self.question) {
            parts.push(format!("Customer question: {}", question));
        }
        if let Some(response) = present(&self.response) {
            parts.push(format!("Support response: {}", response));
        }
        parts.join("\n\n")
    }

    /// Metadata stored alongside the vector
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            subject: present(&self.subject).map(str::to_string),
            date: present(&self.date).map(str::to_string),
            from: present(&self.from)
                .or(present(&self.sender))
                .map(str::to_string),
            customer_email: present(&self.customer_email).map(str::to_string),
        }
    }
}

/// Metadata carried by every indexed document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

impl RecordMetadata {
    /// Sender to display: `from`, then `customer_email`, then `N/A`
    pub fn sender(&self) -> &str {
        self.from
            .as_deref()
            .or(self.customer_email.as_deref())
            .unwrap_or(MISSING_FIELD)
    }

    pub fn subject_or_missing(&self) -> &str {
        self.subject.as_deref().unwrap_or(MISSING_FIELD)
    }

    pub fn date_or_missing(&self) -> &str {
        self.date.as_deref().unwrap_or(MISSING_FIELD)
    }
}
