pub mod flash;
mod route;
pub mod session;
mod template;

use crate::core;
use actix_session::config;
use actix_web::{
    cookie::{self, time},
    error, http, web,
};
use std::{io, net, path, sync};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to listen on the {socket}")]
    BindServer {
        socket: net::SocketAddr,
        source: io::Error,
    },
    #[error("Failed to load handlebars template")]
    Template(#[from] handlebars::TemplateError),
    #[error("The flash view `{0}` is not among the loaded templates")]
    MissingView(String),
    #[error("Actix web server failed: {0}")]
    Actix(#[from] std::io::Error),
}

pub fn start_server(config: core::Config) -> Result<(), Error> {
    actix_web::rt::System::new().block_on(run_server(config))
}

pub(crate) fn internal_server_error() -> error::InternalError<&'static str> {
    error::InternalError::new(
        "Something Went Wrong",
        http::StatusCode::INTERNAL_SERVER_ERROR,
    )
}

pub(crate) fn redirect<P: AsRef<str>>(path: P) -> actix_web::HttpResponse {
    actix_web::HttpResponse::Found()
        .insert_header((http::header::LOCATION, path.as_ref()))
        .finish()
}

/// Loads every `.hbs` file under `path` and makes sure the flash view is one of them.
pub fn load_templates(
    path: &path::Path,
    flash_config: &flash::FlashConfig,
) -> Result<handlebars::Handlebars<'static>, Error> {
    let mut templates = handlebars::Handlebars::new();
    templates.register_templates_directory(path, handlebars::DirectorySourceOptions::default())?;

    if !templates.has_template(flash_config.view_name()) {
        return Err(Error::MissingView(flash_config.view_name().to_string()));
    }

    Ok(templates)
}

async fn run_server(config: core::Config) -> Result<(), Error> {
    tracing::info!("Starting webserver on {}", config.listen_on);

    let flash_config = sync::Arc::new(flash::FlashConfigBuilder::from(&config.flash).build());
    let templates = web::Data::new(load_templates(&config.templates_path, &flash_config)?);
    let secret_key = cookie::Key::generate();
    let session_store = session::MemorySessionStore::default();
    let session_ttl = time::Duration::minutes(config.session_ttl_minutes.into());

    tracing::debug!(?flash_config, "Flash middleware configured");

    let server = actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(templates.clone())
            .app_data(session::SessionInstalled)
            .wrap(flash::FlashMiddleware::<session::CookieSession>::new(
                flash_config.clone(),
                templates.clone(),
            ))
            .wrap(
                actix_session::SessionMiddleware::builder(
                    session_store.clone(),
                    secret_key.clone(),
                )
                .cookie_http_only(true)
                .cookie_same_site(cookie::SameSite::Strict)
                .session_lifecycle(config::SessionLifecycle::BrowserSession(
                    config::BrowserSession::default()
                        .state_ttl(session_ttl)
                        .state_ttl_extension_policy(config::TtlExtensionPolicy::OnEveryRequest),
                ))
                .build(),
            )
            .route("/", web::get().to(route::index_get))
            .route("/notify", web::post().to(route::notify_post))
            .route("/inline", web::get().to(route::inline_get))
    });

    let server = if let Some(worker_count) = config.worker_count {
        server.workers(worker_count.get())
    } else {
        server
    };

    let server = server
        .bind(config.listen_on)
        .map_err(|err| Error::BindServer {
            socket: config.listen_on,
            source: err,
        })?;

    server.run().await?;

    Ok(())
}
