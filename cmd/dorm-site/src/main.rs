//! # dorm-site
//!
//! Assembles the site from configuration: one content store, one media
//! store and an optional mailer, chosen once at startup.
//!
//! `dorm-site hash-password <password>` prints an Argon2 hash for
//! `admin.password` and exits.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use api_adapters::{build_router, ApiState, RouterOptions, StaticUploads};
use auth_adapters::{hash_password, RandomTokenSource, StaticCredentials};
use configs::{ContentBackend, MailSettings, MailTransport, MediaBackend, Settings};
use domains::{Announcement, Clock, ContentRepo, Event, Mailer, MediaStore};
use secrecy::{ExposeSecret, SecretString};
use services::{
    AdminAuth, AnnouncementService, ContactService, EventService, LoginRateLimiter, SessionStore,
    SystemClock,
};
use storage_adapters::{JsonFileRepo, LocalMediaStore};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct ContentStores {
    events: Arc<dyn ContentRepo<Event>>,
    announcements: Arc<dyn ContentRepo<Announcement>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(password) = args.get(2) else {
            bail!("usage: dorm-site hash-password <password>");
        };
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    configs::load_dotenv();
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "dorm-site starting");

    let settings = Settings::load().context("invalid configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let content = build_content(&settings).await?;
    content.events.ensure_initialized().await?;
    content.announcements.ensure_initialized().await?;

    let (media, uploads) = build_media(&settings).await?;
    let mailer = build_mailer(&settings)?;

    let admin_password = settings
        .admin
        .password
        .clone()
        .context("admin.password is required")?;
    let credentials = StaticCredentials::new(settings.admin.username.clone(), admin_password);
    if !credentials.is_hashed() {
        warn!("admin.password is plain text; consider `dorm-site hash-password`");
    }

    let auth = AdminAuth::new(
        Arc::new(credentials),
        SessionStore::with_defaults(clock.clone(), Arc::new(RandomTokenSource)),
        LoginRateLimiter::with_defaults(clock.clone()),
    );

    let state = ApiState {
        auth: Arc::new(auth),
        events: Arc::new(EventService::new(content.events, media.clone(), clock.clone())),
        announcements: Arc::new(AnnouncementService::new(content.announcements, media, clock)),
        contact: Arc::new(ContactService::new(mailer)),
    };

    let options = RouterOptions {
        cors_origins: settings.server.cors_origins.clone(),
        uploads,
    };
    let app = build_router(state, &options);

    let address = settings.server.bind_addr();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let format = std::env::var("DORM_LOG_FORMAT").unwrap_or_default();

    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_content(settings: &Settings) -> anyhow::Result<ContentStores> {
    match settings.content.backend {
        ContentBackend::Json => {
            let dir = &settings.content.data_dir;
            info!(dir = %dir.display(), "content backend: json files");
            Ok(ContentStores {
                events: Arc::new(JsonFileRepo::<Event>::in_dir(dir)),
                announcements: Arc::new(JsonFileRepo::<Announcement>::in_dir(dir)),
            })
        }
        #[cfg(feature = "db-postgres")]
        ContentBackend::Postgres => {
            let url = settings
                .content
                .database_url
                .as_ref()
                .context("content.database_url is required")?;
            let repo = Arc::new(storage_adapters::PgContentRepo::connect(url.expose_secret()).await?);
            info!("content backend: postgres");
            Ok(ContentStores {
                events: repo.clone(),
                announcements: repo,
            })
        }
        #[cfg(not(feature = "db-postgres"))]
        ContentBackend::Postgres => bail!("postgres content backend is not compiled in"),
    }
}

async fn build_media(settings: &Settings) -> anyhow::Result<(Arc<dyn MediaStore>, Option<StaticUploads>)> {
    let media = &settings.media;
    match media.backend {
        MediaBackend::Local => {
            let prefix = media.public_prefix.trim_matches('/');
            if prefix.is_empty() {
                bail!("media.public_prefix must name a path such as /uploads");
            }
            let url_prefix = format!("/{prefix}");
            let store = LocalMediaStore::new(media.uploads_dir.clone(), &url_prefix);
            store.ensure_root().await?;
            let uploads = StaticUploads {
                dir: media.uploads_dir.clone(),
                url_prefix,
            };
            info!(dir = %media.uploads_dir.display(), "media backend: local");
            Ok((Arc::new(store), Some(uploads)))
        }
        #[cfg(feature = "media-cloudinary")]
        MediaBackend::Cloudinary => {
            let c = &settings.cloudinary;
            let config = storage_adapters::CloudinaryConfig {
                cloud_name: c.cloud_name.clone().unwrap_or_default(),
                api_key: c.api_key.clone().unwrap_or_default(),
                api_secret: c
                    .api_secret
                    .clone()
                    .unwrap_or_else(|| SecretString::from(String::new())),
                folder: media.folder.clone(),
            };
            info!(cloud = %config.cloud_name, "media backend: cloudinary");
            Ok((Arc::new(storage_adapters::CloudinaryMediaStore::new(config)), None))
        }
        #[cfg(feature = "media-supabase")]
        MediaBackend::Supabase => {
            let s = &settings.supabase;
            let config = storage_adapters::SupabaseConfig {
                url: s.url.clone().unwrap_or_default(),
                service_key: s
                    .service_key
                    .clone()
                    .unwrap_or_else(|| SecretString::from(String::new())),
                bucket: s.bucket.clone().unwrap_or_default(),
            };
            info!(bucket = %config.bucket, "media backend: supabase");
            Ok((Arc::new(storage_adapters::SupabaseMediaStore::new(config)), None))
        }
        #[allow(unreachable_patterns)]
        other => bail!("media backend `{}` is not compiled in", other.as_str()),
    }
}

fn build_mailer(settings: &Settings) -> anyhow::Result<Option<Arc<dyn Mailer>>> {
    let mail = &settings.mail;
    if !mail.is_configured() {
        warn!("mail is not configured; contact form submissions will fail");
        return Ok(None);
    }
    let mailer = match mail.transport {
        MailTransport::Resend => resend_mailer(mail)?,
        MailTransport::Smtp => smtp_mailer(mail)?,
    };
    Ok(Some(mailer))
}

#[cfg(feature = "mail-resend")]
fn resend_mailer(mail: &MailSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    let config = mail_adapters::ResendConfig {
        api_key: mail
            .api_key
            .clone()
            .unwrap_or_else(|| SecretString::from(String::new())),
        from: mail.sender(),
        to: mail.destination().unwrap_or_default(),
    };
    info!(to = %config.to, "mail provider: resend");
    Ok(Arc::new(mail_adapters::ResendMailer::new(config)))
}

#[cfg(not(feature = "mail-resend"))]
fn resend_mailer(_mail: &MailSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    bail!("mail is configured but the resend transport is not compiled in")
}

#[cfg(feature = "mail-smtp")]
fn smtp_mailer(mail: &MailSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    let config = mail_adapters::SmtpConfig {
        host: mail.smtp.host.trim().to_string(),
        port: mail.smtp.port,
        username: mail.smtp.user.clone().unwrap_or_default().trim().to_string(),
        password: mail
            .smtp
            .password
            .clone()
            .unwrap_or_else(|| SecretString::from(String::new())),
        from: mail.sender(),
        to: mail.destination().unwrap_or_default(),
    };
    info!(to = %config.to, host = %config.host, port = config.port, "mail provider: smtp");
    Ok(Arc::new(mail_adapters::SmtpMailer::new(config)?))
}

#[cfg(not(feature = "mail-smtp"))]
fn smtp_mailer(_mail: &MailSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    bail!("mail is configured but the smtp transport is not compiled in")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("received ctrl-c, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
