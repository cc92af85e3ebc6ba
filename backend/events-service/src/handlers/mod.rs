use crate::models::EventType;
use actix_web::web;

pub mod events;
pub mod health;

pub use events::ingest;
pub use health::health;

pub const HEALTH_PATH: &str = "/api/events/health";

/// Register the health probe and one ingest route per [`EventType`]
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(HEALTH_PATH).route(web::get().to(health)));

    for event_type in EventType::ALL {
        cfg.service(web::resource(event_type.route()).route(web::post().to(
            move |state: web::Data<crate::AppState>, body: web::Bytes| {
                ingest(event_type, state, body)
            },
        )));
    }
}
