use actix_web::{web, HttpResponse, Responder};
use humantime::format_duration;
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use serde::Serialize;

use crate::{constants::START_TIME, mail::Mailer, AppState};

#[derive(Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub service: String,
    pub uptime: String,
    pub timestamp: String,
    pub start_at: String,
    pub version: String,
    pub mail: String,
    pub tracked_clients: usize,
    pub memory_usage: String,
}

fn process_memory() -> String {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return "Unknown".to_string();
    };

    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );

    sys.process(pid).map_or("Unknown".to_string(), |p| {
        format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
    })
}

/// `GET /api/health`
pub async fn health_check<M: Mailer>(state: web::Data<AppState<M>>) -> impl Responder {
    let now_utc = chrono::Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    let handler = &state.contact_handler;
    let mail = if handler.is_configured() { "configured" } else { "not configured" };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy".to_string(),
        service: state.name.clone(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mail: mail.to_string(),
        tracked_clients: handler.limiter.tracked_clients(),
        memory_usage: process_memory(),
    })
}
