use std::time::Duration;

use async_trait::async_trait;
use lettre::{address::Envelope, Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::error::{AppError, RelayError};

/// Envelope of one relayed message; the wire body is sent untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEnvelope {
    pub from: Option<String>,
    pub to: Vec<String>,
}

#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send_raw(&self, envelope: &RelayEnvelope, raw: &[u8]) -> Result<(), RelayError>;
}

/// Plain SMTP relay without authentication or TLS, as served by local
/// catchers such as Mailpit.
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

#[async_trait]
impl RelayTransport for SmtpRelay {
    async fn send_raw(&self, envelope: &RelayEnvelope, raw: &[u8]) -> Result<(), RelayError> {
        let from = match &envelope.from {
            Some(address) => Some(parse_address(address)?),
            None => None,
        };
        let to = envelope
            .to
            .iter()
            .map(|address| parse_address(address))
            .collect::<Result<Vec<_>, _>>()?;

        let smtp_envelope =
            Envelope::new(from, to).map_err(|err| RelayError::Envelope(err.to_string()))?;

        match self.transport.send_raw(&smtp_envelope, raw).await {
            Ok(_) => Ok(()),
            Err(err) => Err(RelayError::Smtp(err.to_string())),
        }
    }
}

fn parse_address(address: &str) -> Result<Address, RelayError> {
    address
        .parse::<Address>()
        .map_err(|err| RelayError::InvalidAddress(format!("{}: {}", address, err)))
}

pub fn create_smtp_relay(host: &str, port: u16) -> SmtpRelay {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        .port(port)
        .build();

    SmtpRelay { transport }
}

pub fn create_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, AppError> {
    let builder = match timeout {
        Some(value) => reqwest::Client::builder().timeout(value),
        None => reqwest::Client::builder(),
    };

    Ok(builder.build()?)
}
