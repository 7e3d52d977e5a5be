use super::{Error, render};
use crate::{core, web::session};
use actix_web::{HttpMessage, dev};
use std::{cell, collections, fmt, future, rc};

/// Request-scoped values handed to the view layer.
#[derive(Clone, Default)]
pub struct Locals(rc::Rc<cell::RefCell<collections::HashMap<String, String>>>);

impl Locals {
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub(crate) fn insert(&self, key: &str, value: String) {
        self.0.borrow_mut().insert(key.to_string(), value);
    }
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl actix_web::FromRequest for Locals {
    type Error = actix_web::Error;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        future::ready(Ok(req.extensions().get::<Locals>().cloned().unwrap_or_default()))
    }
}

struct State {
    session: rc::Rc<dyn session::NotificationQueue>,
    renderer: render::Renderer,
    current_url: String,
    redirect: cell::RefCell<Option<String>>,
    locals: Locals,
}

/// What the middleware does once a notification was queued.
pub enum FlashOutcome {
    /// The response will be replaced by a redirect to this location.
    Redirect(String),
    /// No redirect; render now or leave the queue for the next request.
    Deferred(DeferredRender),
}

/// Renders the queue within the current request.
///
/// Dropping it leaves the notifications queued, so they show up on the next
/// request instead.
#[must_use = "queued notifications are only rendered on the next request unless this is awaited"]
pub struct DeferredRender(Flash);

impl DeferredRender {
    pub async fn render(self) -> Result<Option<String>, Error> {
        self.0.render_queue().await
    }
}

/// The flash utility of a request. Only available behind
/// [`super::FlashMiddleware`].
#[derive(Clone)]
pub struct Flash(rc::Rc<State>);

impl Flash {
    pub(crate) fn new(
        session: rc::Rc<dyn session::NotificationQueue>,
        renderer: render::Renderer,
        current_url: String,
    ) -> Self {
        Self(rc::Rc::new(State {
            session,
            renderer,
            current_url,
            redirect: cell::RefCell::new(None),
            locals: Locals::default(),
        }))
    }

    /// Queues a notification and decides on the redirect.
    ///
    /// Returns `Ok(None)` for [`core::FlashArgs::Empty`], leaving both the
    /// queue and the response alone.
    pub fn flash<A: Into<core::FlashArgs>>(
        &self,
        args: A,
    ) -> Result<Option<FlashOutcome>, session::QueueError> {
        let Some((notification, redirect)) = args.into().resolve() else {
            return Ok(None);
        };

        let config = self.0.renderer.config();
        let key = config.session_key();
        let mut queue = self.0.session.load_queue(key)?.unwrap_or_default();
        queue.push(notification);
        self.0.session.store_queue(key, &queue)?;

        tracing::debug!(
            utility = config.utility_name(),
            queued = queue.len(),
            "Queued flash notification"
        );

        Ok(Some(match redirect.target(&self.0.current_url) {
            Some(location) => {
                self.0.redirect.replace(Some(location.clone()));
                FlashOutcome::Redirect(location)
            }
            None => FlashOutcome::Deferred(DeferredRender(self.clone())),
        }))
    }

    pub fn info<M: fmt::Display>(
        &self,
        message: M,
    ) -> Result<Option<FlashOutcome>, session::QueueError> {
        self.flash(core::FlashArgs::typed("info", message))
    }

    pub fn warning<M: fmt::Display>(
        &self,
        message: M,
    ) -> Result<Option<FlashOutcome>, session::QueueError> {
        self.flash(core::FlashArgs::typed("warning", message))
    }

    pub fn error<M: fmt::Display>(
        &self,
        message: M,
    ) -> Result<Option<FlashOutcome>, session::QueueError> {
        self.flash(core::FlashArgs::typed("error", message))
    }

    /// Markup of the last successful render pass of this request.
    pub fn html(&self) -> Option<String> {
        self.0
            .locals
            .get(self.0.renderer.config().locals_key())
    }

    pub fn locals(&self) -> Locals {
        self.0.locals.clone()
    }

    pub(crate) fn take_redirect(&self) -> Option<String> {
        self.0.redirect.take()
    }

    /// The queue is only trimmed once the whole pass succeeded.
    pub(crate) async fn render_queue(&self) -> Result<Option<String>, Error> {
        let config = self.0.renderer.config();
        let key = config.session_key();
        let queue = self.0.session.load_queue(key)?.unwrap_or_default();

        let Some(html) = self.0.renderer.render(&queue).await? else {
            return Ok(None);
        };

        let mut remaining = self.0.session.load_queue(key)?.unwrap_or_default();
        remaining.drain(..queue.len().min(remaining.len()));
        self.0.session.store_queue(key, &remaining)?;

        self.0.locals.insert(config.locals_key(), html.clone());

        Ok(Some(html))
    }
}

impl actix_web::FromRequest for Flash {
    type Error = Error;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        future::ready(req.extensions().get::<Flash>().cloned().ok_or_else(|| {
            Error::Configuration("FlashMiddleware is not installed".to_string())
        }))
    }
}
