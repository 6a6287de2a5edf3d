use actix_web::web;

use crate::{handlers::contact_me, mail::Mailer};

pub fn config_routes<M: Mailer>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/contact")
            .route(web::post().to(contact_me::submit_contact::<M>))
    );
}
