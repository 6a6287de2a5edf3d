use actix_web::web;

use crate::{handlers::home::home, mail::Mailer};

mod contact;
mod system;

pub fn configure_routes<M: Mailer>(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api")
            .configure(contact::config_routes::<M>)
            .configure(system::config_routes::<M>)
    );
}
