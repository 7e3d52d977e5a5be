use crate::{
    core,
    web::{flash, template},
};
use actix_web::web;

#[derive(serde::Deserialize)]
pub struct Parameters {
    message: String,
}

#[derive(serde::Serialize)]
struct InlineContent {
    title: &'static str,
}

/// Shows the notification on this very response instead of redirecting.
pub async fn get(
    query: web::Query<Parameters>,
    templates: web::Data<handlebars::Handlebars<'static>>,
    flash: flash::Flash,
) -> actix_web::Result<actix_web::HttpResponse> {
    let args = core::FlashArgs::typed("info", query.into_inner().message).with_redirect(false);

    if let Some(flash::FlashOutcome::Deferred(render)) = flash.flash(args)? {
        render.render().await?;
    }

    let content = template::Content::new(
        &flash,
        InlineContent {
            title: "Inline notification",
        },
    );

    template::render_response(&templates, "index", &content)
}
