use super::{NotificationQueue, QueueError};
use crate::core;
use actix_web::{dev, error};
use std::{collections, future, sync};

/// Queues shared by every [`MemorySession`] of a test app.
#[derive(Clone, Default)]
pub struct MemoryQueues(sync::Arc<sync::Mutex<collections::HashMap<String, Vec<core::Notification>>>>);

impl MemoryQueues {
    pub fn with_queue(key: &str, queue: Vec<core::Notification>) -> Self {
        let queues = Self::default();
        queues.lock().insert(key.to_string(), queue);
        queues
    }

    pub fn queue(&self, key: &str) -> Option<Vec<core::Notification>> {
        self.lock().get(key).cloned()
    }

    fn lock(
        &self,
    ) -> sync::MutexGuard<'_, collections::HashMap<String, Vec<core::Notification>>> {
        self.0.lock().expect("memory queues lock poisoned")
    }
}

/// Session stand-in that fails extraction unless [`MemoryQueues`] is registered
/// as app data.
#[derive(Clone)]
pub struct MemorySession(MemoryQueues);

impl NotificationQueue for MemorySession {
    fn load_queue(&self, key: &str) -> Result<Option<Vec<core::Notification>>, QueueError> {
        Ok(self.0.queue(key))
    }

    fn store_queue(&self, key: &str, queue: &[core::Notification]) -> Result<(), QueueError> {
        self.0.lock().insert(key.to_string(), queue.to_vec());
        Ok(())
    }
}

impl actix_web::FromRequest for MemorySession {
    type Error = actix_web::Error;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        future::ready(
            req.app_data::<MemoryQueues>()
                .cloned()
                .map(MemorySession)
                .ok_or_else(|| error::ErrorInternalServerError("session is not configured")),
        )
    }
}
