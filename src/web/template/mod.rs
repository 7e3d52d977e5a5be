use crate::web::{self, flash};
use actix_web::{error, http::header};

#[derive(serde::Serialize)]
pub struct Content<C: serde::Serialize> {
    app_version: &'static str,
    content: C,
    /// Already rendered markup, emitted with `{{{flash}}}`.
    flash: Option<String>,
}

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

impl<C: serde::Serialize> Content<C> {
    pub fn new(flash: &flash::Flash, content: C) -> Self {
        Self {
            content,
            app_version: APP_VERSION,
            flash: flash.html(),
        }
    }
}

pub fn render_template<N: AsRef<str>, C: serde::Serialize>(
    templates: &handlebars::Handlebars,
    name: N,
    data: &Content<C>,
) -> Result<String, error::Error> {
    match templates.render(name.as_ref(), data) {
        Ok(content) => Ok(content),
        Err(err) => {
            tracing::error!("Failed to render Handlebar template: {err}");

            Err(web::internal_server_error().into())
        }
    }
}

pub fn render_response<N: AsRef<str>, C: serde::Serialize>(
    templates: &handlebars::Handlebars,
    name: N,
    data: &Content<C>,
) -> Result<actix_web::HttpResponse, error::Error> {
    render_template(templates, name, data).map(|content| {
        actix_web::HttpResponse::Ok()
            .content_type(header::ContentType::html())
            .body(content)
    })
}
