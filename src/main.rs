//! # Hash Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa el logger y corre el servidor hasta
//! que termina el drenado.

use hash_server::config::Config;
use hash_server::error::ServerError;
use hash_server::server::Server;

fn main() {
    let config = Config::new();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Err(e) = run(config) {
        log::error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    config.log_summary();

    let server = Server::bind(config)?;
    server.run()
}
