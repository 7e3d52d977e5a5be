use crate::core;
use futures_util::{FutureExt, future};
use std::{fmt, sync};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type BeforeRender = dyn Fn(core::Notification) -> future::LocalBoxFuture<'static, Result<core::Notification, BoxError>>
    + Send
    + Sync;
type AfterRender =
    dyn Fn(Vec<String>) -> future::LocalBoxFuture<'static, Result<String, BoxError>> + Send + Sync;

const DEFAULT_NAME: &str = "flash";

/// Names and hooks used by [`super::FlashMiddleware`].
///
/// Built once through [`FlashConfig::builder`] and shared read-only between
/// workers afterwards.
#[derive(Clone)]
pub struct FlashConfig {
    session_key: String,
    utility_name: String,
    locals_key: String,
    view_name: String,
    before_render: sync::Arc<BeforeRender>,
    after_render: sync::Arc<AfterRender>,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            session_key: DEFAULT_NAME.to_string(),
            utility_name: DEFAULT_NAME.to_string(),
            locals_key: DEFAULT_NAME.to_string(),
            view_name: DEFAULT_NAME.to_string(),
            before_render: sync::Arc::new(|item: core::Notification| {
                future::ready(Ok::<_, BoxError>(item)).boxed_local()
            }),
            after_render: sync::Arc::new(|fragments: Vec<String>| {
                future::ready(Ok::<_, BoxError>(fragments.join("\n"))).boxed_local()
            }),
        }
    }
}

impl fmt::Debug for FlashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashConfig")
            .field("session_key", &self.session_key)
            .field("utility_name", &self.utility_name)
            .field("locals_key", &self.locals_key)
            .field("view_name", &self.view_name)
            .finish_non_exhaustive()
    }
}

impl FlashConfig {
    pub fn builder() -> FlashConfigBuilder {
        FlashConfigBuilder(Self::default())
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn utility_name(&self) -> &str {
        &self.utility_name
    }

    pub fn locals_key(&self) -> &str {
        &self.locals_key
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub(crate) fn before_render(
        &self,
        item: core::Notification,
    ) -> future::LocalBoxFuture<'static, Result<core::Notification, BoxError>> {
        (self.before_render)(item)
    }

    pub(crate) fn after_render(
        &self,
        fragments: Vec<String>,
    ) -> future::LocalBoxFuture<'static, Result<String, BoxError>> {
        (self.after_render)(fragments)
    }
}

impl From<&core::FlashSettings> for FlashConfigBuilder {
    fn from(settings: &core::FlashSettings) -> Self {
        let builder = FlashConfig::builder();
        let builder = match &settings.session_key {
            Some(key) => builder.session_key(key),
            None => builder,
        };
        let builder = match &settings.utility_name {
            Some(name) => builder.utility_name(name),
            None => builder,
        };
        let builder = match &settings.locals_key {
            Some(key) => builder.locals_key(key),
            None => builder,
        };
        match &settings.view_name {
            Some(name) => builder.view_name(name),
            None => builder,
        }
    }
}

/// Blank names are ignored and keep their default.
pub struct FlashConfigBuilder(FlashConfig);

impl FlashConfigBuilder {
    pub fn session_key<K: AsRef<str>>(self, key: K) -> Self {
        Self(FlashConfig {
            session_key: non_blank(key, self.0.session_key),
            ..self.0
        })
    }

    pub fn utility_name<N: AsRef<str>>(self, name: N) -> Self {
        Self(FlashConfig {
            utility_name: non_blank(name, self.0.utility_name),
            ..self.0
        })
    }

    pub fn locals_key<K: AsRef<str>>(self, key: K) -> Self {
        Self(FlashConfig {
            locals_key: non_blank(key, self.0.locals_key),
            ..self.0
        })
    }

    pub fn view_name<N: AsRef<str>>(self, name: N) -> Self {
        Self(FlashConfig {
            view_name: non_blank(name, self.0.view_name),
            ..self.0
        })
    }

    /// Runs on every notification before it reaches the view engine.
    pub fn before_render<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(core::Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<core::Notification, BoxError>> + 'static,
    {
        Self(FlashConfig {
            before_render: sync::Arc::new(move |item| hook(item).boxed_local()),
            ..self.0
        })
    }

    /// Combines the rendered fragments, in queue order, into the final markup.
    pub fn after_render<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, BoxError>> + 'static,
    {
        Self(FlashConfig {
            after_render: sync::Arc::new(move |fragments| hook(fragments).boxed_local()),
            ..self.0
        })
    }

    pub fn build(self) -> FlashConfig {
        self.0
    }
}

fn non_blank<V: AsRef<str>>(value: V, fallback: String) -> String {
    let value = value.as_ref().trim();

    if value.is_empty() {
        fallback
    } else {
        value.to_string()
    }
}
