mod config;
mod handle;
mod middleware;
mod render;

use crate::web::{self, session};
use actix_web::{ResponseError, http};

pub use config::{BoxError, FlashConfig, FlashConfigBuilder};
pub use handle::{DeferredRender, Flash, FlashOutcome, Locals};
pub use middleware::FlashMiddleware;
pub use render::{RenderError, Renderer, ViewEngine};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Flash middleware is misconfigured: {0}")]
    Configuration(String),
    #[error(transparent)]
    Queue(#[from] session::QueueError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ResponseError for Error {
    fn status_code(&self) -> http::StatusCode {
        http::StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        web::internal_server_error().error_response()
    }
}
