use crate::{
    core,
    web::{self, flash},
};
use actix_web::web as aweb;

#[derive(serde::Deserialize)]
pub struct NotifyForm {
    #[serde(default)]
    kind: Option<String>,
    message: String,
}

/// Queues the submitted notification and sends the browser back to the index,
/// where the next request renders it.
pub async fn post(
    form: aweb::Form<NotifyForm>,
    flash: flash::Flash,
) -> actix_web::Result<actix_web::HttpResponse> {
    let form = form.into_inner();
    let args = match form.kind.filter(|kind| !kind.is_empty()) {
        Some(kind) => core::FlashArgs::typed(kind, form.message),
        None => core::FlashArgs::message(form.message),
    };

    flash.flash(args.with_redirect("/"))?;

    // The middleware swaps this for the redirect above.
    Ok(web::redirect("/"))
}
