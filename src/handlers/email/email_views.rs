//! HTML for the list and detail pages.

use std::fmt::Write;

use data_encoding::BASE64;

use crate::config::ExtraColumn;

use super::models::{AttachmentDescriptor, EmailView};

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;width:100%}\
th,td{border-bottom:1px solid #ddd;padding:.5em;text-align:left}\
img.logo{max-height:32px}\
iframe{width:100%;height:70vh;border:1px solid #ddd}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
<style>{}</style></head><body>{}</body></html>",
        escape_html(title),
        STYLE,
        content
    )
}

fn data_uri(attachment: &AttachmentDescriptor) -> String {
    format!(
        "data:{};base64,{}",
        attachment.content_type,
        BASE64.encode(&attachment.content)
    )
}

/// `emails` are rendered in the order given.
pub fn render_index(emails: &[EmailView], extra_columns: &[ExtraColumn]) -> String {
    let mut content = String::from("<h1>Emails</h1><table><thead><tr><th>Timestamp</th>");
    for column in extra_columns {
        let _ = write!(content, "<th>{}</th>", escape_html(&column.name));
    }
    content.push_str("<th>Subject</th><th>To</th><th></th></tr></thead><tbody>");

    for email in emails {
        let timestamp = email
            .timestamp
            .as_ref()
            .map(|t| t.display())
            .unwrap_or_default();
        let _ = write!(content, "<tr><td>{}</td>", escape_html(&timestamp));

        for column in extra_columns {
            match email.attachment_by_filename(&column.attachment_filename) {
                Some(logo) => {
                    let _ = write!(
                        content,
                        "<td><img class=\"logo\" src=\"{}\" alt=\"{}\"></td>",
                        data_uri(logo),
                        escape_html(&logo.filename)
                    );
                }
                None => content.push_str("<td></td>"),
            }
        }

        let _ = write!(
            content,
            "<td><a href=\"/emails/{id}\">{}</a></td><td>{}</td><td>",
            escape_html(&email.subject),
            escape_html(&email.to.join(", ")),
            id = email.index
        );
        if email.is_downloadable {
            let _ = write!(
                content,
                "<a href=\"/emails/{}/download\">Download</a>",
                email.index
            );
        }
        content.push_str("</td></tr>");
    }

    content.push_str("</tbody></table>");
    page("Emails", &content)
}

pub fn render_detail(email: &EmailView) -> String {
    let mut content = format!(
        "<p><a href=\"/\">Back</a></p><h1>{}</h1><dl>",
        escape_html(&email.subject)
    );

    for (label, addresses) in [("To", &email.to), ("Cc", &email.cc), ("Bcc", &email.bcc)] {
        if !addresses.is_empty() {
            let _ = write!(
                content,
                "<dt>{}</dt><dd>{}</dd>",
                label,
                escape_html(&addresses.join(", "))
            );
        }
    }
    content.push_str("</dl>");

    let mut files = email.file_attachments().peekable();
    if files.peek().is_some() {
        content.push_str("<h2>Attachments</h2><ul>");
        for attachment in files {
            let _ = write!(
                content,
                "<li><a href=\"/emails/{}/attachments/{}\">{}</a> ({}, {} bytes)</li>",
                email.index,
                escape_html(&attachment.part_id),
                escape_html(&attachment.filename),
                escape_html(&attachment.content_type),
                attachment.content.len()
            );
        }
        content.push_str("</ul>");
    }

    if email.is_downloadable {
        let _ = write!(
            content,
            "<p><a href=\"/emails/{}/download\">Download .eml</a></p>",
            email.index
        );
    }

    match &email.html_body {
        Some(html) => {
            let _ = write!(content, "<iframe srcdoc=\"{}\"></iframe>", escape_html(html));
        }
        None => content.push_str("<p><em>No HTML body</em></p>"),
    }

    page(&email.subject, &content)
}
