mod queue;
mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use queue::{CookieSession, FlashSession, NotificationQueue, QueueError, SessionInstalled};
pub use store::MemorySessionStore;
