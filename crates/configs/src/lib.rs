//! # configs
//!
//! Layered settings for the dorm-site binary.
//!
//! Precedence, lowest first:
//! 1. built-in defaults
//! 2. `config/dorm-site.toml` (optional)
//! 3. environment variables, `DORM__SECTION__KEY` (e.g. `DORM__ADMIN__PASSWORD`)
//!
//! `.env` is loaded into the environment before any of this runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config/dorm-site.toml";
const ENV_PREFIX: &str = "DORM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("backend `{backend}` requires the `{feature}` cargo feature")]
    FeatureDisabled {
        backend: &'static str,
        feature: &'static str,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub admin: AdminSettings,
    pub content: ContentSettings,
    pub media: MediaSettings,
    pub cloudinary: CloudinarySettings,
    pub supabase: SupabaseSettings,
    pub mail: MailSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Empty means any origin. The environment gives a comma-separated string.
    #[serde(deserialize_with = "origin_list")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5174,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub username: String,
    /// Plain text or an Argon2 PHC string.
    pub password: Option<SecretString>,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            username: "admin".into(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    #[default]
    Json,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub backend: ContentBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<SecretString>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            backend: ContentBackend::Json,
            data_dir: PathBuf::from("./data"),
            database_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    #[default]
    Local,
    Cloudinary,
    Supabase,
}

impl MediaBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaBackend::Local => "local",
            MediaBackend::Cloudinary => "cloudinary",
            MediaBackend::Supabase => "supabase",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub backend: MediaBackend,
    pub uploads_dir: PathBuf,
    pub public_prefix: String,
    /// Top-level folder for remote providers.
    pub folder: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            backend: MediaBackend::Local,
            uploads_dir: PathBuf::from("./uploads"),
            public_prefix: "/uploads".into(),
            folder: "dorm-site".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CloudinarySettings {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub service_key: Option<SecretString>,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    #[default]
    Resend,
    Smtp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub transport: MailTransport,
    /// Resend API key.
    pub api_key: Option<SecretString>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub smtp: SmtpSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    /// 465 means implicit TLS, anything else STARTTLS.
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<SecretString>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 587,
            user: None,
            password: None,
        }
    }
}

impl MailSettings {
    /// Resend needs a key and a destination; SMTP needs a login, and mails
    /// that login when no destination is set.
    pub fn is_configured(&self) -> bool {
        match self.transport {
            MailTransport::Resend => present_secret(&self.api_key) && present(&self.to),
            MailTransport::Smtp => present(&self.smtp.user) && present_secret(&self.smtp.password),
        }
    }

    pub fn sender(&self) -> String {
        if let Some(from) = self.from.as_deref().filter(|f| !f.trim().is_empty()) {
            return from.trim().to_string();
        }
        match self.transport {
            MailTransport::Resend => "Site Contact <onboarding@resend.dev>".into(),
            MailTransport::Smtp => {
                let user = self.smtp.user.as_deref().unwrap_or_default();
                format!("Site Contact <{}>", user.trim())
            }
        }
    }

    pub fn destination(&self) -> Option<String> {
        let to = match self.transport {
            MailTransport::Resend => self.to.as_deref(),
            MailTransport::Smtp => self
                .to
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .or(self.smtp.user.as_deref()),
        };
        to.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
    }
}

fn origin_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Origins {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Origins::deserialize(deserializer)? {
        Origins::List(list) => list,
        Origins::Joined(joined) => joined.split(',').map(|o| o.trim().to_string()).collect(),
    })
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn present_secret(value: &Option<SecretString>) -> bool {
    value
        .as_ref()
        .is_some_and(|v| !v.expose_secret().trim().is_empty())
}

/// Loads `.env` into the process environment if present. Existing
/// variables win.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

impl Settings {
    /// Loads `.env`, then the default config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::load_from(Some(Path::new(DEFAULT_CONFIG_FILE)), None)
    }

    /// `env` replaces the process environment when given (tests).
    pub fn load_from(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .source(env),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    fn normalize(&mut self) {
        self.admin.username = self.admin.username.trim().to_string();
        if let Some(password) = &self.admin.password {
            let trimmed = password.expose_secret().trim().to_string();
            self.admin.password = Some(SecretString::from(trimmed));
        }
        self.server.cors_origins.retain(|origin| !origin.trim().is_empty());
    }

    /// Checks that the selected backends have their settings and were compiled in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !present_secret(&self.admin.password) {
            return Err(ConfigError::Missing("admin.password"));
        }

        if self.content.backend == ContentBackend::Postgres {
            require_feature(cfg!(feature = "db-postgres"), "postgres", "db-postgres")?;
            if !present_secret(&self.content.database_url) {
                return Err(ConfigError::Missing("content.database_url"));
            }
        }

        match self.media.backend {
            MediaBackend::Local => {}
            MediaBackend::Cloudinary => {
                require_feature(cfg!(feature = "media-cloudinary"), "cloudinary", "media-cloudinary")?;
                let c = &self.cloudinary;
                if !present(&c.cloud_name) {
                    return Err(ConfigError::Missing("cloudinary.cloud_name"));
                }
                if !present(&c.api_key) {
                    return Err(ConfigError::Missing("cloudinary.api_key"));
                }
                if !present_secret(&c.api_secret) {
                    return Err(ConfigError::Missing("cloudinary.api_secret"));
                }
            }
            MediaBackend::Supabase => {
                require_feature(cfg!(feature = "media-supabase"), "supabase", "media-supabase")?;
                let s = &self.supabase;
                if !present(&s.url) {
                    return Err(ConfigError::Missing("supabase.url"));
                }
                if !present_secret(&s.service_key) {
                    return Err(ConfigError::Missing("supabase.service_key"));
                }
                if !present(&s.bucket) {
                    return Err(ConfigError::Missing("supabase.bucket"));
                }
            }
        }

        // An unconfigured mailer is a runtime condition, a configured one
        // without its transport is a build mistake.
        if self.mail.is_configured() {
            match self.mail.transport {
                MailTransport::Resend => require_feature(cfg!(feature = "mail-resend"), "resend", "mail-resend")?,
                MailTransport::Smtp => require_feature(cfg!(feature = "mail-smtp"), "smtp", "mail-smtp")?,
            }
        }

        Ok(())
    }
}

fn require_feature(
    compiled: bool,
    backend: &'static str,
    feature: &'static str,
) -> Result<(), ConfigError> {
    if compiled {
        Ok(())
    } else {
        Err(ConfigError::FeatureDisabled { backend, feature })
    }
}
