use crate::{
    core,
    web::{self, flash::BoxError},
};
use actix_session::SessionExt as _;
use actix_web::{dev, error, http};
use std::future;

#[derive(thiserror::Error, Debug)]
pub enum QueueError {
    #[error("Failed to load flash notifications from session: {0}")]
    Load(#[source] BoxError),
    #[error("Failed to save flash notifications into session: {0}")]
    Store(#[source] BoxError),
}

impl actix_web::ResponseError for QueueError {
    fn status_code(&self) -> http::StatusCode {
        http::StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        web::internal_server_error().error_response()
    }
}

/// Session storage for the notification queue.
pub trait NotificationQueue {
    /// `Ok(None)` when the session has never held a queue under `key`.
    fn load_queue(&self, key: &str) -> Result<Option<Vec<core::Notification>>, QueueError>;
    fn store_queue(&self, key: &str, queue: &[core::Notification]) -> Result<(), QueueError>;
}

/// A queue-capable session that can be pulled out of a request.
pub trait FlashSession: NotificationQueue + actix_web::FromRequest + 'static {}

impl<T> FlashSession for T where T: NotificationQueue + actix_web::FromRequest + 'static {}

/// App data marking that `actix_session::SessionMiddleware` wraps the app.
///
/// Register it next to the session middleware:
/// `App::new().app_data(SessionInstalled).wrap(SessionMiddleware::new(..))`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionInstalled;

/// [`actix_session::Session`] as a flash queue.
///
/// A bare `Session` extracts even without the session middleware and then
/// drops everything stored in it, so extraction fails unless
/// [`SessionInstalled`] is registered.
#[derive(Clone)]
pub struct CookieSession(actix_session::Session);

impl actix_web::FromRequest for CookieSession {
    type Error = actix_web::Error;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        future::ready(match req.app_data::<SessionInstalled>() {
            Some(_) => Ok(Self(req.get_session())),
            None => Err(error::ErrorInternalServerError(
                "SessionMiddleware is not installed",
            )),
        })
    }
}

impl NotificationQueue for CookieSession {
    fn load_queue(&self, key: &str) -> Result<Option<Vec<core::Notification>>, QueueError> {
        self.0
            .get::<Vec<core::Notification>>(key)
            .map_err(|err| QueueError::Load(err.into()))
    }

    fn store_queue(&self, key: &str, queue: &[core::Notification]) -> Result<(), QueueError> {
        self.0
            .insert(key, queue)
            .map_err(|err| QueueError::Store(err.into()))
    }
}
