use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use portfolio_contact::{
    background_task::start_rate_limit_sweep,
    graceful_shutdown::shutdown_signal,
    limiter::rate_limiter::FixedWindowLimiter,
    mail::SmtpMailer,
    routes::configure_routes,
    settings::{AppConfig, EmailConfig},
    use_cases::contact::MailSetup,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

fn resolve_mail(config: &AppConfig) -> MailSetup<SmtpMailer> {
    let email_config = match EmailConfig::from_env() {
        Ok(cfg) => cfg,
        Err(missing) => {
            tracing::error!(
                missing = ?missing.0,
                "Mail delivery is not configured; contact submissions will fail"
            );
            return MailSetup::Unconfigured(missing);
        }
    };

    match SmtpMailer::from_config(&email_config, config.smtp_timeout()) {
        Ok(mailer) => {
            tracing::info!("Loaded mail configuration: {:?}", email_config);
            MailSetup::Ready { config: email_config, mailer }
        }
        Err(e) => {
            tracing::error!("Failed to build SMTP transport: {}", e);
            std::process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => {
            init_tracing(cfg.is_production());
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        }
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let limiter = FixedWindowLimiter::default();
    let mail = resolve_mail(&config);
    let app_state = web::Data::new(AppState::new(&config, limiter.clone(), mail));

    let server_addr = format!("{}:{}", config.host, config.port);
    let cors_origins = config.cors_origins();
    let max_payload = config.max_payload_bytes;

    tracing::info!(
        "🚀 Starting Portfolio Contact API v{} on {}",
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(max_payload))
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes::<SmtpMailer>)
    })
    .workers(config.worker_count)
    .disable_signals()
    .bind(server_addr)?
    .run();

    let server_handle = server.handle();
    let sweeper = tokio::spawn(start_rate_limit_sweep(limiter, config.sweep_interval()));

    let result = tokio::select! {
        res = server => res,
        signal = shutdown_signal() => {
            tracing::warn!("🛑 {} received, shutting down gracefully...", signal);
            server_handle.stop(true).await;
            Ok(())
        }
    };

    sweeper.abort();
    result
}
