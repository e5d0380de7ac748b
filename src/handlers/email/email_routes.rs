use actix_web::{web, HttpResponse};
use tracing::info;

use crate::{error::AppError, AppState};

use super::{
    email_normalizer::{normalize, normalize_all, parse_raw},
    models::RawMessageRecord,
    models_responders::{
        AttachmentDownload, EmailBody, EmailDetailPage, EmailListPage, RawEmailDownload,
    },
};

/// Fetches the inbox and offers it to the forwarder before any rendering.
async fn load_inbox(state: &AppState) -> Result<Vec<RawMessageRecord>, AppError> {
    let records = state.source.fetch_messages().await?;

    let forwarded = state.forwarder.forward_batch(&records).await;
    if forwarded > 0 {
        info!(forwarded, "Forwarded new messages to SMTP");
    }

    Ok(records)
}

fn record_at(records: &[RawMessageRecord], id: usize) -> Result<&RawMessageRecord, AppError> {
    records.get(id).ok_or(AppError::MessageNotFound(id))
}

async fn list_emails(state: web::Data<AppState>) -> Result<EmailListPage, AppError> {
    let records = load_inbox(&state).await?;

    let mut emails = normalize_all(&records)?;
    emails.reverse();

    Ok(EmailListPage {
        emails,
        extra_columns: state.extra_columns.clone(),
    })
}

async fn latest_email(state: web::Data<AppState>) -> Result<EmailBody, AppError> {
    let records = load_inbox(&state).await?;

    let index = records
        .len()
        .checked_sub(1)
        .ok_or(AppError::MessageNotFound(0))?;
    let email = normalize(index, &records[index])?;

    Ok(EmailBody {
        html: email.html_body.unwrap_or_default(),
    })
}

async fn email_detail(
    state: web::Data<AppState>,
    path: web::Path<usize>,
) -> Result<EmailDetailPage, AppError> {
    let id = path.into_inner();
    let records = load_inbox(&state).await?;

    let email = normalize(id, record_at(&records, id)?)?;
    Ok(EmailDetailPage { email })
}

async fn email_attachment(
    state: web::Data<AppState>,
    path: web::Path<(usize, String)>,
) -> Result<AttachmentDownload, AppError> {
    let (id, attachment_id) = path.into_inner();
    let records = load_inbox(&state).await?;

    let email = normalize(id, record_at(&records, id)?)?;
    let attachment = email
        .attachment_by_part_id(&attachment_id)
        .cloned()
        .ok_or(AppError::AttachmentNotFound {
            message: id,
            part: attachment_id,
        })?;

    Ok(AttachmentDownload { attachment })
}

async fn download_email(
    state: web::Data<AppState>,
    path: web::Path<usize>,
) -> Result<RawEmailDownload, AppError> {
    let id = path.into_inner();
    let records = load_inbox(&state).await?;

    let raw = record_at(&records, id)?
        .raw_payload()
        .ok_or(AppError::NoRawPayload(id))?;
    let subject = parse_raw(raw)
        .ok_or(AppError::Parse(id))?
        .subject()
        .unwrap_or_default()
        .to_string();

    Ok(RawEmailDownload {
        subject,
        raw: raw.to_string(),
    })
}

async fn reset_forwarder(state: web::Data<AppState>) -> HttpResponse {
    let cleared = state.forwarder.reset();
    HttpResponse::Ok().body(format!("Cleared {} processed message(s)", cleared))
}

pub fn email_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(list_emails)))
        .service(web::resource("/emails/latest").route(web::get().to(latest_email)))
        .service(web::resource("/emails/{id}").route(web::get().to(email_detail)))
        .service(
            web::resource("/emails/{id}/attachments/{attachment_id}")
                .route(web::get().to(email_attachment)),
        )
        .service(web::resource("/emails/{id}/download").route(web::get().to(download_email)))
        .service(web::resource("/forwarder/reset").route(web::post().to(reset_forwarder)));
}
