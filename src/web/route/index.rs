use crate::web::{flash, template};
use actix_web::web;

#[derive(serde::Serialize)]
struct IndexContent {
    title: &'static str,
}

pub async fn get(
    templates: web::Data<handlebars::Handlebars<'static>>,
    flash: flash::Flash,
) -> impl actix_web::Responder {
    let content = template::Content::new(
        &flash,
        IndexContent {
            title: "Notifications",
        },
    );

    template::render_response(&templates, "index", &content)
}
