use mail_parser::{Addr, Address, Message, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::error::AppError;

use super::models::{
    AttachmentDescriptor, Disposition, EmailView, MessageContent, RawMessageRecord,
    StructuredFields,
};

/// Builds the page view of the record at `index`.
pub fn normalize(index: usize, record: &RawMessageRecord) -> Result<EmailView, AppError> {
    match &record.content {
        MessageContent::RawPayload(raw) => from_raw_payload(index, record, raw),
        MessageContent::Structured(fields) => Ok(from_structured_fields(index, record, fields)),
    }
}

pub fn normalize_all(records: &[RawMessageRecord]) -> Result<Vec<EmailView>, AppError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize(index, record))
        .collect()
}

pub fn parse_raw(raw: &str) -> Option<Message<'_>> {
    MessageParser::default().parse(raw.as_bytes())
}

/// Raw MIME branch. The body is the HTML part only; a text-only message
/// yields no body here.
fn from_raw_payload(
    index: usize,
    record: &RawMessageRecord,
    raw: &str,
) -> Result<EmailView, AppError> {
    let message = parse_raw(raw).ok_or(AppError::Parse(index))?;

    Ok(EmailView {
        index,
        timestamp: record.timestamp.clone(),
        subject: message.subject().unwrap_or_default().to_string(),
        to: display_addresses(message.to()),
        cc: display_addresses(message.cc()),
        bcc: display_addresses(message.bcc()),
        html_body: html_part(&message),
        attachments: attachments_of(&message),
        is_downloadable: true,
    })
}

/// Structured branch. HTML falls back to the text part.
fn from_structured_fields(
    index: usize,
    record: &RawMessageRecord,
    fields: &StructuredFields,
) -> EmailView {
    EmailView {
        index,
        timestamp: record.timestamp.clone(),
        subject: fields.subject.clone().unwrap_or_default(),
        to: fields.destination.to_addresses.clone(),
        cc: fields.destination.cc_addresses.clone(),
        bcc: fields.destination.bcc_addresses.clone(),
        html_body: fields
            .body
            .html_part
            .clone()
            .or_else(|| fields.body.text_part.clone()),
        attachments: Vec::new(),
        is_downloadable: false,
    }
}

/// Bare addresses of To, Cc and Bcc, in that order.
pub fn envelope_recipients(message: &Message<'_>) -> Vec<String> {
    [message.to(), message.cc(), message.bcc()]
        .into_iter()
        .flat_map(mailboxes)
        .filter_map(|addr| addr.address.as_deref())
        .map(str::to_string)
        .collect()
}

pub fn sender_address(message: &Message<'_>) -> Option<String> {
    mailboxes(message.from())
        .into_iter()
        .find_map(|addr| addr.address.as_deref())
        .map(str::to_string)
}

fn mailboxes<'a, 'x>(address: Option<&'a Address<'x>>) -> Vec<&'a Addr<'x>> {
    match address {
        Some(Address::List(list)) => list.iter().collect(),
        Some(Address::Group(groups)) => groups
            .iter()
            .flat_map(|group| group.addresses.iter())
            .collect(),
        None => Vec::new(),
    }
}

fn display_addresses(address: Option<&Address<'_>>) -> Vec<String> {
    mailboxes(address)
        .into_iter()
        .filter_map(|addr| match (addr.name.as_deref(), addr.address.as_deref()) {
            (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
            (None, Some(email)) => Some(email.to_string()),
            (Some(name), None) => Some(name.to_string()),
            (None, None) => None,
        })
        .collect()
}

fn html_part(message: &Message<'_>) -> Option<String> {
    message
        .html_body
        .iter()
        .filter_map(|&part_id| message.parts.get(part_id))
        .find_map(|part| match &part.body {
            PartType::Html(html) => Some(html.to_string()),
            _ => None,
        })
}

fn attachments_of(message: &Message<'_>) -> Vec<AttachmentDescriptor> {
    message
        .attachments
        .iter()
        .filter_map(|&part_id| message.parts.get(part_id).map(|part| (part_id, part)))
        .map(|(part_id, part)| describe_attachment(part_id, part))
        .collect()
}

fn describe_attachment(part_id: usize, part: &MessagePart<'_>) -> AttachmentDescriptor {
    let filename = part
        .attachment_name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("attachment_{}", part_id));

    let content_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| {
            mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string()
        });

    let disposition = match part.content_disposition() {
        Some(cd) if cd.ctype().eq_ignore_ascii_case("inline") => Disposition::Inline,
        _ => Disposition::Attachment,
    };

    AttachmentDescriptor {
        filename,
        content_type,
        part_id: part_id.to_string(),
        content: part.contents().to_vec(),
        disposition,
    }
}
