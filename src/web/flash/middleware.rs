use super::{Error, Flash, FlashConfig, Renderer, ViewEngine};
use crate::web::{self, session};
use actix_web::{HttpMessage, body, dev};
use std::{future, marker, pin, rc, sync};

/// Installs the flash utility on every request and renders whatever is
/// queued in the session before the wrapped service runs.
///
/// `S` is the session capability holding the queue. It must be extractable
/// by the time this middleware runs, so wrap the session middleware around it.
pub struct FlashMiddleware<S: session::FlashSession> {
    config: sync::Arc<FlashConfig>,
    engine: rc::Rc<dyn ViewEngine>,
    session: marker::PhantomData<S>,
}

impl<S: session::FlashSession> FlashMiddleware<S> {
    pub fn new<E: ViewEngine + 'static>(config: sync::Arc<FlashConfig>, engine: E) -> Self {
        Self {
            config,
            engine: rc::Rc::new(engine),
            session: marker::PhantomData,
        }
    }
}

impl<T, B, S> dev::Transform<T, dev::ServiceRequest> for FlashMiddleware<S>
where
    T: dev::Service<
            dev::ServiceRequest,
            Response = dev::ServiceResponse<B>,
            Error = actix_web::Error,
        > + 'static,
    T::Future: 'static,
    B: 'static,
    S: session::FlashSession,
{
    type Response = dev::ServiceResponse<body::EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = InnerFlashMiddleware<T, S>;
    type Future = future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: T) -> Self::Future {
        future::ready(Ok(InnerFlashMiddleware {
            service: rc::Rc::new(service),
            renderer: Renderer::new(self.config.clone(), self.engine.clone()),
            session: marker::PhantomData,
        }))
    }
}

pub struct InnerFlashMiddleware<T, S> {
    service: rc::Rc<T>,
    renderer: Renderer,
    session: marker::PhantomData<S>,
}

impl<T, B, S> dev::Service<dev::ServiceRequest> for InnerFlashMiddleware<T, S>
where
    T: dev::Service<
            dev::ServiceRequest,
            Response = dev::ServiceResponse<B>,
            Error = actix_web::Error,
        > + 'static,
    T::Future: 'static,
    B: 'static,
    S: session::FlashSession,
{
    type Response = dev::ServiceResponse<body::EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = pin::Pin<Box<dyn future::Future<Output = Result<Self::Response, Self::Error>>>>;

    dev::forward_ready!(service);

    fn call(&self, mut req: dev::ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let renderer = self.renderer.clone();

        Box::pin(async move {
            let session = {
                let (http_request, payload) = req.parts_mut();
                S::from_request(http_request, payload).await.map_err(|err| {
                    let err: actix_web::Error = err.into();
                    tracing::error!("Flash middleware requires a session: {err}");

                    Error::Configuration(format!("session is required: {err}"))
                })?
            };

            let key = renderer.config().session_key();
            match session.load_queue(key) {
                Ok(Some(_)) => {}
                Ok(None) => session.store_queue(key, &[]).map_err(Error::from)?,
                Err(session::QueueError::Load(err)) => {
                    tracing::warn!("Resetting unreadable flash queue under `{key}`: {err}");
                    session.store_queue(key, &[]).map_err(Error::from)?;
                }
                Err(err) => return Err(Error::from(err).into()),
            }

            let flash = Flash::new(rc::Rc::new(session), renderer, req.uri().to_string());
            req.extensions_mut().insert(flash.clone());
            req.extensions_mut().insert(flash.locals());

            if let Err(err) = flash.render_queue().await {
                tracing::error!("Failed to render flash notifications: {err}");

                return Err(err.into());
            }

            let res = svc.call(req).await?;

            match flash.take_redirect() {
                Some(location) => {
                    if let Some(err) = res.response().error() {
                        tracing::warn!(
                            "Discarding failed response in favour of flash redirect: {err}"
                        );
                    }

                    let (http_request, _) = res.into_parts();
                    let response = web::redirect(location).map_into_right_body();

                    Ok(dev::ServiceResponse::new(http_request, response))
                }
                None => Ok(res.map_into_left_body()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core,
        web::{
            flash::{FlashOutcome, Locals},
            session::testing::{MemoryQueues, MemorySession},
        },
    };
    use actix_web::{App, HttpResponse, dev::Service as _, http, test, web as aweb};

    fn templates() -> handlebars::Handlebars<'static> {
        let mut templates = handlebars::Handlebars::new();
        templates.set_strict_mode(true);
        templates
            .register_template_string("flash", r#"<p class="{{type}}">{{message}}</p>"#)
            .expect("valid template");
        templates
    }

    fn middleware() -> FlashMiddleware<MemorySession> {
        FlashMiddleware::new(sync::Arc::new(FlashConfig::default()), templates())
    }

    async fn show_locals(locals: Locals) -> HttpResponse {
        HttpResponse::Ok().body(locals.get("flash").unwrap_or_else(|| "<none>".to_string()))
    }

    async fn save(flash: Flash) -> Result<HttpResponse, actix_web::Error> {
        flash.flash("hello")?;

        Ok(HttpResponse::Ok().body("handler body"))
    }

    async fn go_home(flash: Flash, locals: Locals) -> Result<HttpResponse, actix_web::Error> {
        let outcome = flash.flash(core::Notification::new("x").with_redirect("/home"))?;
        assert!(matches!(outcome, Some(FlashOutcome::Redirect(ref to)) if to == "/home"));
        assert!(!locals.contains_key("flash"));

        Ok(HttpResponse::Ok().finish())
    }

    async fn render_inline(flash: Flash, locals: Locals) -> Result<HttpResponse, actix_web::Error> {
        flash.flash(("info", "first", false))?;
        let notification = core::Notification::new("x")
            .with_kind("error")
            .with_redirect(false);
        let Some(FlashOutcome::Deferred(render)) = flash.flash(notification)? else {
            return Ok(HttpResponse::InternalServerError().finish());
        };

        let html = render.render().await?;
        assert_eq!(html, locals.get("flash"));
        assert_eq!(html, flash.html());

        Ok(HttpResponse::Ok().body(html.unwrap_or_default()))
    }

    async fn flash_nothing(flash: Flash) -> Result<HttpResponse, actix_web::Error> {
        assert!(flash.flash(())?.is_none());

        Ok(HttpResponse::Ok().finish())
    }

    async fn render_untyped(flash: Flash) -> Result<HttpResponse, actix_web::Error> {
        let notification = core::Notification::new("untyped").with_redirect(false);
        let Some(FlashOutcome::Deferred(render)) = flash.flash(notification)? else {
            return Ok(HttpResponse::InternalServerError().finish());
        };

        let status = match render.render().await {
            Err(Error::Render(_)) => http::StatusCode::UNPROCESSABLE_ENTITY,
            _ => http::StatusCode::OK,
        };

        Ok(HttpResponse::build(status).finish())
    }

    async fn flash_levels(flash: Flash) -> Result<HttpResponse, actix_web::Error> {
        flash.info("saved")?;
        flash.warning("careful")?;
        let outcome = flash.error("failed")?;
        assert!(matches!(outcome, Some(FlashOutcome::Redirect(ref to)) if to == "/levels"));

        Ok(HttpResponse::Ok().finish())
    }

    async fn flash_then_fail(flash: Flash) -> Result<HttpResponse, actix_web::Error> {
        flash.flash("hello")?;

        Err(actix_web::error::ErrorBadRequest("invalid form"))
    }

    async fn read_body<B: body::MessageBody>(res: dev::ServiceResponse<B>) -> String {
        String::from_utf8(test::read_body(res).await.to_vec()).expect("utf-8 body")
    }

    #[actix_web::test]
    async fn queued_notifications_render_on_the_next_request() {
        let queues = MemoryQueues::with_queue(
            "flash",
            vec![
                core::Notification::new("saved").with_kind("info"),
                core::Notification::new("careful").with_kind("warning"),
            ],
        );
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(show_locals)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(
            read_body(res).await,
            "<p class=\"info\">saved</p>\n<p class=\"warning\">careful</p>"
        );
        assert_eq!(queues.queue("flash"), Some(vec![]));
    }

    #[actix_web::test]
    async fn empty_queue_leaves_locals_untouched() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(show_locals)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(read_body(res).await, "<none>");
        assert_eq!(queues.queue("flash"), Some(vec![]), "queue is created up front");
    }

    #[actix_web::test]
    async fn default_redirect_reloads_the_current_url() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/save", aweb::post().to(save)),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/save?tab=2").to_request(),
        )
        .await;

        assert_eq!(res.status(), http::StatusCode::FOUND);
        assert_eq!(
            res.headers().get(http::header::LOCATION).map(|v| v.as_bytes()),
            Some(&b"/save?tab=2"[..])
        );
        assert_eq!(
            queues.queue("flash"),
            Some(vec![core::Notification::new("hello")])
        );
    }

    #[actix_web::test]
    async fn record_redirect_goes_elsewhere_without_rendering() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(go_home)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::FOUND);
        assert_eq!(
            res.headers().get(http::header::LOCATION).map(|v| v.as_bytes()),
            Some(&b"/home"[..])
        );
        assert_eq!(queues.queue("flash").map(|queue| queue.len()), Some(1));
    }

    #[actix_web::test]
    async fn suppressed_redirect_renders_within_the_request() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(render_inline)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(
            read_body(res).await,
            "<p class=\"info\">first</p>\n<p class=\"error\">x</p>"
        );
        assert_eq!(queues.queue("flash"), Some(vec![]));
    }

    #[actix_web::test]
    async fn level_shortcuts_queue_typed_notifications() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/levels", aweb::post().to(flash_levels)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::post().uri("/levels").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::FOUND);
        assert_eq!(
            res.headers().get(http::header::LOCATION).map(|v| v.as_bytes()),
            Some(&b"/levels"[..])
        );
        assert_eq!(
            queues.queue("flash"),
            Some(vec![
                core::Notification::new("saved").with_kind("info"),
                core::Notification::new("careful").with_kind("warning"),
                core::Notification::new("failed").with_kind("error"),
            ])
        );
    }

    #[actix_web::test]
    async fn redirect_replaces_a_failed_response() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/save", aweb::post().to(flash_then_fail)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::post().uri("/save").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::FOUND);
        assert!(res.response().error().is_none());
        assert_eq!(queues.queue("flash").map(|queue| queue.len()), Some(1));
    }

    #[actix_web::test]
    async fn empty_call_changes_nothing() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(flash_nothing)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(queues.queue("flash"), Some(vec![]));
    }

    #[actix_web::test]
    async fn render_failure_keeps_the_queue() {
        let queued = vec![
            core::Notification::new("fine").with_kind("info"),
            core::Notification::new("untyped"),
        ];
        let queues = MemoryQueues::with_queue("flash", queued.clone());
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(show_locals)),
        )
        .await;

        let err = app
            .call(test::TestRequest::get().uri("/").to_request())
            .await
            .err()
            .expect("render pass must fail");

        assert_eq!(
            err.as_response_error().status_code(),
            http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(queues.queue("flash"), Some(queued));
    }

    #[actix_web::test]
    async fn deferred_render_failure_goes_to_the_caller() {
        let queues = MemoryQueues::default();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(middleware())
                .route("/", aweb::get().to(render_untyped)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(queues.queue("flash").map(|queue| queue.len()), Some(1));
    }

    #[actix_web::test]
    async fn missing_session_is_a_configuration_error() {
        let app = test::init_service(
            App::new()
                .wrap(middleware())
                .route("/", aweb::get().to(show_locals)),
        )
        .await;

        let err = app
            .call(test::TestRequest::get().uri("/").to_request())
            .await
            .err()
            .expect("no session registered");

        assert!(err.to_string().contains("session is required"));
    }

    #[actix_web::test]
    async fn flash_extractor_requires_the_middleware() {
        let app = test::init_service(App::new().route(
            "/",
            aweb::get().to(|flash: Flash| async move {
                let _ = flash.flash("unreachable");
                HttpResponse::Ok().finish()
            }),
        ))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn custom_names_are_respected() {
        let queues = MemoryQueues::with_queue(
            "notices",
            vec![core::Notification::new("hi").with_kind("info")],
        );
        let mut templates = templates();
        templates
            .register_template_string("notice", "[{{message}}]")
            .expect("valid template");
        let config = FlashConfig::builder()
            .session_key("notices")
            .locals_key("notice_html")
            .view_name("notice")
            .build();
        let app = test::init_service(
            App::new()
                .app_data(queues.clone())
                .wrap(FlashMiddleware::<MemorySession>::new(
                    sync::Arc::new(config),
                    templates,
                ))
                .route(
                    "/",
                    aweb::get().to(|locals: Locals| async move {
                        HttpResponse::Ok().body(locals.get("notice_html").unwrap_or_default())
                    }),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(read_body(res).await, "[hi]");
        assert_eq!(queues.queue("notices"), Some(vec![]));
        assert_eq!(queues.queue("flash"), None);
    }
}
