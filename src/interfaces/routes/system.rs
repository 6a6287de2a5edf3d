use actix_web::web;

use crate::{handlers::system, mail::Mailer};

pub fn config_routes<M: Mailer>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/health")
            .route(web::get().to(system::health_check::<M>))
    );
}
