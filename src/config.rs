use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Process-wide settings, loaded once at startup and handed to the
/// constructors that need them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Upper bound on pooled Postgres connections.
    pub db_max_connections: u32,
    /// Key mixed into every stored password hash.
    pub password_secret: String,
    /// When set, error bodies for storage failures carry the raw driver
    /// message in a `details` field.
    pub expose_error_details: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            password_secret: required("PASSWORD_SECRET")?,
            expose_error_details: parse_flag(&optional("EXPOSE_ERROR_DETAILS", "false"))
                .context("EXPOSE_ERROR_DETAILS must be a boolean")?,
        })
    }

    /// Database URL with the password replaced by `****`, for logging.
    pub fn masked_database_url(&self) -> String {
        mask_password(&self.database_url)
    }
}

/// Accepts the usual spellings of a boolean environment flag.
fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

fn mask_password(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return url.to_owned();
    };
    let Some(scheme_end) = url.find("://") else {
        return url.to_owned();
    };
    match url[scheme_end + 3..at_pos].find(':') {
        Some(colon) => {
            let colon_pos = scheme_end + 3 + colon;
            format!("{}:****{}", &url[..colon_pos], &url[at_pos..])
        }
        None => url.to_owned(),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
