#![allow(dead_code)]

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use parking_lot::Mutex;
use portfolio_contact::{
    entities::contact_me::ComposedEmail,
    limiter::rate_limiter::FixedWindowLimiter,
    mail::{MailError, Mailer, TransportFailure},
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment, EmailConfig, MissingSettings},
    use_cases::contact::MailSetup,
    AppState,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::{collections::HashMap, net::TcpListener, sync::Arc, time::Duration};

/// In-memory mailer that records what would have been sent.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<(String, ComposedEmail)>>>,
    pub failure: Option<TransportFailure>,
}

impl RecordingMailer {
    pub fn failing(failure: TransportFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, email: &ComposedEmail) -> Result<(), MailError> {
        if let Some(failure) = &self.failure {
            return Err(MailError::Transport(failure.clone()));
        }
        self.sent.lock().push((to.to_string(), email.clone()));
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mailer: RecordingMailer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Some(RecordingMailer::default())).await
    }

    /// `None` starts the app with mail delivery unconfigured.
    pub async fn spawn_with(mailer: Option<RecordingMailer>) -> Self {
        let config = test_config();
        let recorder = mailer.clone().unwrap_or_default();

        let mail = match mailer {
            Some(mailer) => MailSetup::Ready {
                config: EmailConfig::resolve(&full_mail_env()).expect("test mail env resolves"),
                mailer,
            },
            None => MailSetup::Unconfigured(MissingSettings(vec!["CONTACT_TO_EMAIL".into()])),
        };

        let state = web::Data::new(AppState::new(&config, FixedWindowLimiter::default(), mail));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let max_payload = config.max_payload_bytes;
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .app_data(web::PayloadConfig::new(max_payload))
                .wrap(NormalizePath::trim())
                .configure(configure_routes::<RecordingMailer>)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/api/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            address,
            client,
            mailer: recorder,
        }
    }

    pub async fn post_contact(&self, body: &Value, client_ip: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/api/contact", self.address))
            .header("X-Forwarded-For", client_ip)
            .json(body)
            .send()
            .await
            .expect("Failed to post contact form")
    }

    pub async fn post_raw(&self, body: &'static str, client_ip: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/api/contact", self.address))
            .header("X-Forwarded-For", client_ip)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to post contact form")
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Portfolio Contact Test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        worker_count: 1,
        cors_allowed_origins: vec!["*".to_string()],
        trust_forwarded_for: true,
        smtp_timeout_secs: 2,
        max_payload_bytes: 16 * 1024,
        rate_limit_sweep_secs: 60,
    }
}

pub fn full_mail_env() -> HashMap<String, String> {
    [
        ("SMTP_HOST", "smtp.example.net"),
        ("SMTP_PORT", "587"),
        ("SMTP_USER", "relay@example.net"),
        ("SMTP_PASS", "hunter2"),
        ("CONTACT_TO_EMAIL", "owner@example.org"),
        ("BRAND_NAME", "Jane"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn valid_submission() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "subject": "Hello there",
        "message": "This is a long enough message.",
        "company": ""
    })
}
