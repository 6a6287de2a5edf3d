use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::{
    entities::contact_me::ContactAck,
    mail::Mailer,
    utils::get_client_ip::get_client_ip,
    AppState,
};

/// `POST /api/contact`
///
/// The body is taken as raw bytes so the rate limiter sees the request
/// before any JSON parsing happens.
pub async fn submit_contact<M: Mailer>(
    req: HttpRequest,
    state: web::Data<AppState<M>>,
    body: web::Bytes,
) -> HttpResponse {
    let client_ip = get_client_ip(&req, state.trust_forwarded_for);

    match state.contact_handler.submit(&client_ip, &body).await {
        Ok(()) => HttpResponse::Ok().json(ContactAck { ok: true }),
        Err(e) => e.error_response(),
    }
}
