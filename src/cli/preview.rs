use flash_queue::{core, web};
use std::{rc, sync};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load templates: {0}")]
    Templates(#[source] web::Error),
    #[error("Failed to render the notification: {0}")]
    Render(#[source] web::flash::RenderError),
}

/// Renders a single notification through the configured flash view and hooks.
pub fn preview(config: core::Config, kind: Option<String>, message: String) -> Result<(), Error> {
    let flash_config = sync::Arc::new(web::flash::FlashConfigBuilder::from(&config.flash).build());
    let templates =
        web::load_templates(&config.templates_path, &flash_config).map_err(Error::Templates)?;
    let renderer = web::flash::Renderer::new(flash_config, rc::Rc::new(templates));

    let notification = match kind {
        Some(kind) => core::Notification::new(message).with_kind(kind),
        None => core::Notification::new(message),
    };

    let html = actix_web::rt::System::new()
        .block_on(async move {
            let queue = [notification];
            renderer.render(&queue).await
        })
        .map_err(Error::Render)?;

    println!("{}", html.unwrap_or_default());

    Ok(())
}
