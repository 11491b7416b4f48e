// src/main.rs
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use log::info;
use photo_advice::AppState;
use photo_advice::config::AppConfig;
use photo_advice::handlers;
use std::path::Path;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.as_str()));

    info!("Starting photo advice service...");

    let app_state = AppState::from_config(&config)
        .await
        .context("failed to initialise advice services")?;

    let static_dir = Path::new(&config.static_dir)
        .is_dir()
        .then(|| config.static_dir.clone());
    if let Some(dir) = &static_dir {
        info!("Serving static content from {}", dir);
    }

    info!("Starting HTTP server on {}", config.listen_addr);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure);
        match &static_dir {
            Some(dir) => app.service(Files::new("/static", dir)),
            None => app,
        }
    })
    .bind(&config.listen_addr)
    .with_context(|| format!("failed to bind {}", config.listen_addr))?
    .run()
    .await?;

    Ok(())
}
