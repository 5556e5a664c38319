use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use joker_backend::config::EngineConfig;
use joker_backend::game::RoomRegistry;
use joker_backend::telemetry;
use joker_backend::ws::session;

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = EngineConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let registry = RoomRegistry::new(config);
    let data = web::Data::from(registry);

    tracing::info!(%bind_addr, "starting joker backend");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(data.clone())
            .route("/healthz", web::get().to(healthz))
            .route("/ws", web::get().to(session::upgrade))
    })
    .bind(bind_addr)?
    .run()
    .await
}
