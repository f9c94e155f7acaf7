#[macro_use]
extern crate lazy_static;

use actix_files::{Files, NamedFile};
use actix_web::{
    http::{Method, StatusCode},
    middleware::{self, from_fn},
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use clap::Parser;
use log::info;

mod api;
mod config;
mod dialog;
mod errors;
mod guard;
mod redirect;
mod routes;
mod session;
mod structs;
mod table;
mod templates;
mod utils;

use api::RemoteApi;
use config::Config;
use errors::AppError;

#[derive(Debug, Clone)]
pub struct AppState {
    api: RemoteApi,
    secure_cookies: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();
    let api = RemoteApi::new(&config.backend_url, config.request_timeout()).map_err(|e| {
        log::error!("FATAL: cannot build remote API client: {}", e);
        AppError::ApiError(e)
    })?;
    let state = AppState {
        api,
        secure_cookies: config.secure_cookies,
    };

    info!("Using remote API at {}", config.backend_url);
    info!(
        "Starting HTTP server on http://{}:{}/",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(from_fn(redirect::role_redirect))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .app_data(Data::new(state.clone()))
            .service(Files::new("/static", "static"))
            .configure(routes::configure)
            .default_service(web::to(default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
