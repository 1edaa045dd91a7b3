//! Application entry point building the Actix-Web server.
use std::env;

use dotenvy::dotenv;

use file_station::{bootstrap, run};

#[actix_web::main]
async fn main() {
    // Load environment variables from `.env` in local development.
    dotenv().ok();
    // Initialize logger with default level INFO if not provided.
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let working_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            log::error!("Error reading working directory: {}", err);
            std::process::exit(1);
        }
    };

    let server_config = match bootstrap::prepare(&working_dir) {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {:?}", err);
            std::process::exit(1);
        }
    };

    log::info!(
        "Listening on http://{}:{}",
        server_config.address,
        server_config.port
    );
    log::info!("Serving: {}", server_config.root_directory);
    log::info!("Site name: {}", server_config.site_name);
    if let Some(image) = &server_config.background_image {
        log::info!("Background image: {}", image);
    }

    match run(server_config).await {
        Ok(_) => log::info!("Server stopped"),
        Err(err) => {
            log::error!("Error starting server: {}", err);
            std::process::exit(1);
        }
    }
}
