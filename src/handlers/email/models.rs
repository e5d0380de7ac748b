use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Response body of the mail-capture endpoint.
#[derive(Deserialize, Debug, Default)]
pub struct MessagesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<RawMessageRecord>,
}

/// Capture time as reported by the API. Integers are epoch milliseconds,
/// fractional numbers epoch seconds, strings RFC 3339. Any other shape is
/// kept as is and only displayed.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Seconds(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Timestamp {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Millis(millis) => DateTime::<Utc>::from_timestamp_millis(*millis),
            Timestamp::Seconds(seconds) => {
                let millis = (seconds * 1000.0).round();
                if millis.is_finite() && millis.abs() < i64::MAX as f64 {
                    DateTime::<Utc>::from_timestamp_millis(millis as i64)
                } else {
                    None
                }
            }
            Timestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|date| date.with_timezone(&Utc)),
            Timestamp::Other(_) => None,
        }
    }

    pub fn display(&self) -> String {
        match (self.to_utc(), self) {
            (Some(date), _) => date.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            (None, Timestamp::Text(text)) => text.clone(),
            (None, Timestamp::Millis(millis)) => millis.to_string(),
            (None, Timestamp::Seconds(seconds)) => seconds.to_string(),
            (None, Timestamp::Other(value)) => value.to_string(),
        }
    }
}

/// One captured message. The raw MIME payload, when present, is the
/// authoritative source and the structured fields are ignored.
#[derive(Deserialize, Debug, Clone)]
#[serde(from = "WireMessageRecord")]
pub struct RawMessageRecord {
    pub id: String,
    pub source: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub content: MessageContent,
}

#[derive(Debug, Clone)]
pub enum MessageContent {
    RawPayload(String),
    Structured(StructuredFields),
}

#[derive(Debug, Clone, Default)]
pub struct StructuredFields {
    pub subject: Option<String>,
    pub destination: Destination,
    pub body: StructuredBody,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Destination {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub to_addresses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cc_addresses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bcc_addresses: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StructuredBody {
    #[serde(default)]
    pub text_part: Option<String>,
    #[serde(default)]
    pub html_part: Option<String>,
}

impl RawMessageRecord {
    pub fn raw_payload(&self) -> Option<&str> {
        match &self.content {
            MessageContent::RawPayload(raw) => Some(raw),
            MessageContent::Structured(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireMessageRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    timestamp: Option<Timestamp>,
    #[serde(default)]
    raw_data: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    destination: Option<Destination>,
    #[serde(default)]
    body: Option<StructuredBody>,
}

impl From<WireMessageRecord> for RawMessageRecord {
    fn from(wire: WireMessageRecord) -> Self {
        let content = match wire.raw_data.filter(|raw| !raw.is_empty()) {
            Some(raw) => MessageContent::RawPayload(raw),
            None => MessageContent::Structured(StructuredFields {
                subject: wire.subject,
                destination: wire.destination.unwrap_or_default(),
                body: wire.body.unwrap_or_default(),
            }),
        };

        RawMessageRecord {
            id: wire.id.unwrap_or_default(),
            source: wire.source,
            timestamp: wire.timestamp,
            content,
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDescriptor {
    pub filename: String,
    pub content_type: String,
    /// Index of the MIME part in the parser's flat part list, stable for one
    /// parse. Matches hierarchical part numbering only for single-level
    /// multiparts; nested ones are numbered depth-first across all parts.
    pub part_id: String,
    pub content: Vec<u8>,
    pub disposition: Disposition,
}

/// What the pages show for one message. Rebuilt on every request.
#[derive(Debug, Clone)]
pub struct EmailView {
    /// Position in the fetched inbox, used in URLs.
    pub index: usize,
    pub timestamp: Option<Timestamp>,
    pub subject: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub html_body: Option<String>,
    pub attachments: Vec<AttachmentDescriptor>,
    pub is_downloadable: bool,
}

impl EmailView {
    pub fn attachment_by_filename(&self, filename: &str) -> Option<&AttachmentDescriptor> {
        self.attachments
            .iter()
            .find(|attachment| attachment.filename == filename)
    }

    pub fn attachment_by_part_id(&self, part_id: &str) -> Option<&AttachmentDescriptor> {
        self.attachments
            .iter()
            .find(|attachment| attachment.part_id == part_id)
    }

    /// Attachments meant to be downloaded rather than shown in the body.
    pub fn file_attachments(&self) -> impl Iterator<Item = &AttachmentDescriptor> {
        self.attachments
            .iter()
            .filter(|attachment| attachment.disposition == Disposition::Attachment)
    }
}
