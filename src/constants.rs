pub const DEFAULT_LOCALSTACK_HOST: &str = "http://localhost:4566";
pub const DEFAULT_SES_API_PATH: &str = "/_aws/ses";

pub const DEFAULT_SMTP_FORWARD_HOST: &str = "mailpit";
pub const DEFAULT_SMTP_FORWARD_PORT: u16 = 1025;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

pub const ENV_LOCALSTACK_HOST: &str = "LOCALSTACK_HOST";
pub const ENV_SES_API_PATH: &str = "SES_API_PATH";
pub const ENV_SMTP_FORWARD_ENABLED: &str = "SMTP_FORWARD_ENABLED";
pub const ENV_SMTP_FORWARD_HOST: &str = "SMTP_FORWARD_HOST";
pub const ENV_SMTP_FORWARD_PORT: &str = "SMTP_FORWARD_PORT";
pub const ENV_EXTRA_COLUMNS: &str = "EXTRA_COLUMNS";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";

/// Body of every opaque 500 response.
pub const GENERIC_ERROR_BODY: &str = "Something broke!";
