use actix_web::{App, HttpServer, web};

use crate::middleware::AccessLog;
use crate::models::config::ServerConfig;

pub mod bootstrap;
pub mod domain;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

/// URL prefix reserved for bundled assets.
pub const ASSET_PREFIX: &str = "/Resources/";
/// Directory, relative to the working directory, holding bundled assets.
pub const ASSET_DIR_NAME: &str = "Resources";

/// Serve `server_config.root_directory` until the server is stopped.
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    let bind_address = (server_config.address.clone(), server_config.port);
    let server_config = web::Data::new(server_config);

    HttpServer::new(move || {
        App::new()
            .app_data(server_config.clone())
            .wrap(AccessLog::default())
            .default_service(web::to(routes::main::dispatch))
    })
    .bind(bind_address)?
    .run()
    .await
}
