mod index;
mod inline;
mod notify;

pub use index::get as index_get;
pub use inline::get as inline_get;
pub use notify::post as notify_post;
