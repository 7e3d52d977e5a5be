use super::config::{BoxError, FlashConfig};
use crate::core;
use actix_web::web;
use futures_util::future;
use std::{rc, sync};

/// Something able to turn a single notification into markup.
pub trait ViewEngine {
    fn render<'a>(
        &'a self,
        view: &'a str,
        item: &'a core::Notification,
    ) -> future::LocalBoxFuture<'a, Result<String, BoxError>>;
}

impl ViewEngine for handlebars::Handlebars<'static> {
    fn render<'a>(
        &'a self,
        view: &'a str,
        item: &'a core::Notification,
    ) -> future::LocalBoxFuture<'a, Result<String, BoxError>> {
        let result = handlebars::Handlebars::render(self, view, item).map_err(BoxError::from);

        Box::pin(future::ready(result))
    }
}

impl<E: ViewEngine + ?Sized + 'static> ViewEngine for web::Data<E> {
    fn render<'a>(
        &'a self,
        view: &'a str,
        item: &'a core::Notification,
    ) -> future::LocalBoxFuture<'a, Result<String, BoxError>> {
        ViewEngine::render(self.get_ref(), view, item)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Notification was rejected before rendering: {0}")]
    BeforeRender(#[source] BoxError),
    #[error("Failed to render the `{view}` view: {source}")]
    Template { view: String, source: BoxError },
    #[error("Failed to combine rendered notifications: {0}")]
    AfterRender(#[source] BoxError),
}

/// Performs a render pass over a queue snapshot.
#[derive(Clone)]
pub struct Renderer {
    config: sync::Arc<FlashConfig>,
    engine: rc::Rc<dyn ViewEngine>,
}

impl Renderer {
    pub fn new(config: sync::Arc<FlashConfig>, engine: rc::Rc<dyn ViewEngine>) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Renders every queued notification concurrently and joins the fragments
    /// in queue order. Returns `None` for an empty queue without touching any
    /// hook. The first failure aborts the whole pass.
    pub async fn render(&self, queue: &[core::Notification]) -> Result<Option<String>, RenderError> {
        if queue.is_empty() {
            return Ok(None);
        }

        let view = self.config.view_name();
        let fragments = future::try_join_all(queue.iter().cloned().map(|item| async move {
            let item = self
                .config
                .before_render(item)
                .await
                .map_err(RenderError::BeforeRender)?;

            self.engine
                .render(view, &item)
                .await
                .map_err(|source| RenderError::Template {
                    view: view.to_string(),
                    source,
                })
        }))
        .await?;

        tracing::debug!(
            view,
            fragments = fragments.len(),
            "Rendered flash notifications"
        );

        self.config
            .after_render(fragments)
            .await
            .map(Some)
            .map_err(RenderError::AfterRender)
    }
}
