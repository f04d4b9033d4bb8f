use actix_web::middleware::{NormalizePath, from_fn};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod command;
mod config;
mod docs;
mod gate;
mod messenger;
mod model;
mod routes;
mod scheduler;
mod state;
mod store;

use config::Config;
use messenger::TwilioClient;
use state::ResponseTracker;
use store::AttendanceStore;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance bot is running!"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = Data::new(
        AttendanceStore::new(&config.attendance_file).expect("failed to open attendance file"),
    );
    let tracker = Data::new(ResponseTracker::new());

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    // Reminder jobs share the tracker with the webhook handlers and run
    // for the life of the process.
    let twilio = std::sync::Arc::new(TwilioClient::new(
        &config.twilio_account_sid,
        &config.twilio_auth_token,
        &config.twilio_whatsapp_from,
    ));
    scheduler::spawn_all(
        scheduler::jobs_from(&config),
        config.employees.clone(),
        tracker.clone().into_inner(),
        twilio,
    );

    HttpServer::new(move || {
        App::new()
            // innermost wrap: runs against the boxed routing service
            .wrap(from_fn(gate::sunday_gate))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(tracker.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
