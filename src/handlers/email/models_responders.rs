use std::sync::OnceLock;

use actix_web::{
    body::BoxBody,
    http::header::{ContentDisposition, ContentType, DispositionParam, DispositionType},
    HttpRequest, HttpResponse, Responder,
};
use regex::Regex;

use crate::config::ExtraColumn;

use super::{
    email_views::{render_detail, render_index},
    models::{AttachmentDescriptor, Disposition, EmailView},
};

pub struct EmailListPage {
    pub emails: Vec<EmailView>,
    pub extra_columns: Vec<ExtraColumn>,
}

pub struct EmailDetailPage {
    pub email: EmailView,
}

/// Raw HTML body, served as is.
pub struct EmailBody {
    pub html: String,
}

pub struct AttachmentDownload {
    pub attachment: AttachmentDescriptor,
}

pub struct RawEmailDownload {
    pub subject: String,
    pub raw: String,
}

impl RawEmailDownload {
    /// Subject with path and quoting characters replaced, plus `.eml`.
    pub fn file_name(&self) -> String {
        static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
        let unsafe_chars = UNSAFE_CHARS
            .get_or_init(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).expect("valid pattern"));
        let base = unsafe_chars.replace_all(self.subject.trim(), "_");
        if base.is_empty() {
            "email.eml".to_string()
        } else {
            format!("{}.eml", base)
        }
    }
}

impl Responder for EmailListPage {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(render_index(&self.emails, &self.extra_columns))
    }
}

impl Responder for EmailDetailPage {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(render_detail(&self.email))
    }
}

impl Responder for EmailBody {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(self.html)
    }
}

impl Responder for AttachmentDownload {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let disposition = match self.attachment.disposition {
            Disposition::Inline => DispositionType::Inline,
            Disposition::Attachment => DispositionType::Attachment,
        };
        let content_disposition = ContentDisposition {
            disposition,
            parameters: vec![DispositionParam::Filename(self.attachment.filename.clone())],
        };
        let content_type = self
            .attachment
            .content_type
            .parse::<mime::Mime>()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);

        HttpResponse::Ok()
            .insert_header(content_disposition)
            .content_type(content_type)
            .body(self.attachment.content)
    }
}

impl Responder for RawEmailDownload {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let content_disposition = ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(self.file_name())],
        };

        HttpResponse::Ok()
            .insert_header(content_disposition)
            .content_type("message/rfc822")
            .body(self.raw)
    }
}
