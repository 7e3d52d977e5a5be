use actix::{Actor, AsyncContext};
use actix_session::storage;
use rand::distr::{self, SampleString};
use std::{collections, time};

type SessionState = collections::HashMap<String, String>;

const SWEEP_INTERVAL: time::Duration = time::Duration::from_secs(60);

#[derive(Debug)]
struct Entry {
    state: SessionState,
    expires_at: time::Instant,
}

impl Entry {
    fn new(state: SessionState, ttl: time::Duration) -> Self {
        Self {
            state,
            expires_at: time::Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: time::Instant) -> bool {
        now >= self.expires_at
    }
}

struct Fetch(String);

impl actix::Message for Fetch {
    type Result = Option<SessionState>;
}

struct Create {
    state: SessionState,
    ttl: time::Duration,
}

impl actix::Message for Create {
    type Result = String;
}

struct Replace {
    key: String,
    state: SessionState,
    ttl: time::Duration,
}

impl actix::Message for Replace {
    type Result = String;
}

struct Extend {
    key: String,
    ttl: time::Duration,
}

impl actix::Message for Extend {
    type Result = ();
}

struct Evict(String);

impl actix::Message for Evict {
    type Result = ();
}

/// Owns every session state of the process. Expired entries are dropped when
/// read and swept periodically.
#[derive(Default)]
pub struct SessionActor(collections::HashMap<String, Entry>);

impl SessionActor {
    fn sweep(&mut self) {
        let now = time::Instant::now();
        let before = self.0.len();

        self.0.retain(|_, entry| !entry.is_expired(now));

        let swept = before - self.0.len();
        if swept > 0 {
            tracing::debug!(swept, "Dropped expired sessions");
        }
    }
}

impl actix::Actor for SessionActor {
    type Context = actix::Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.run_interval(SWEEP_INTERVAL, |actor, _| actor.sweep());
    }
}

impl actix::Handler<Fetch> for SessionActor {
    type Result = <Fetch as actix::Message>::Result;

    fn handle(&mut self, msg: Fetch, _: &mut Self::Context) -> Self::Result {
        match self.0.get(&msg.0) {
            Some(entry) if !entry.is_expired(time::Instant::now()) => Some(entry.state.clone()),
            Some(_) => {
                self.0.remove(&msg.0);

                None
            }
            None => None,
        }
    }
}

impl actix::Handler<Create> for SessionActor {
    type Result = <Create as actix::Message>::Result;

    fn handle(&mut self, msg: Create, _: &mut Self::Context) -> Self::Result {
        let mut rng = rand::rng();
        let key = loop {
            let candidate = distr::Alphanumeric.sample_string(&mut rng, 32);
            if !self.0.contains_key(&candidate) {
                break candidate;
            }
        };

        self.0.insert(key.clone(), Entry::new(msg.state, msg.ttl));

        key
    }
}

impl actix::Handler<Replace> for SessionActor {
    type Result = <Replace as actix::Message>::Result;

    fn handle(&mut self, msg: Replace, _: &mut Self::Context) -> Self::Result {
        self.0
            .insert(msg.key.clone(), Entry::new(msg.state, msg.ttl));

        msg.key
    }
}

impl actix::Handler<Extend> for SessionActor {
    type Result = <Extend as actix::Message>::Result;

    fn handle(&mut self, msg: Extend, _: &mut Self::Context) -> Self::Result {
        if let Some(entry) = self.0.get_mut(&msg.key) {
            entry.expires_at = time::Instant::now() + msg.ttl;
        }
    }
}

impl actix::Handler<Evict> for SessionActor {
    type Result = <Evict as actix::Message>::Result;

    fn handle(&mut self, msg: Evict, _: &mut Self::Context) -> Self::Result {
        self.0.remove(&msg.0);
    }
}

/// In-process session store backing the session cookie, which keeps the
/// flash queue on the server side.
#[derive(Clone)]
pub struct MemorySessionStore {
    addr: actix::Addr<SessionActor>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self {
            addr: SessionActor::default().start(),
        }
    }
}

impl storage::SessionStore for MemorySessionStore {
    async fn load(
        &self,
        session_key: &storage::SessionKey,
    ) -> Result<Option<SessionState>, storage::LoadError> {
        self.addr
            .send(Fetch(session_key.as_ref().to_owned()))
            .await
            .map_err(|err| storage::LoadError::Other(err.into()))
    }

    async fn save(
        &self,
        session_state: SessionState,
        ttl: &actix_web::cookie::time::Duration,
    ) -> Result<storage::SessionKey, storage::SaveError> {
        self.addr
            .send(Create {
                state: session_state,
                ttl: ttl.unsigned_abs(),
            })
            .await
            .map_err(|err| storage::SaveError::Other(err.into()))?
            .try_into()
            .map_err(|err: <storage::SessionKey as TryFrom<String>>::Error| {
                storage::SaveError::Other(err.into())
            })
    }

    async fn update(
        &self,
        session_key: storage::SessionKey,
        session_state: SessionState,
        ttl: &actix_web::cookie::time::Duration,
    ) -> Result<storage::SessionKey, storage::UpdateError> {
        self.addr
            .send(Replace {
                key: session_key.into(),
                state: session_state,
                ttl: ttl.unsigned_abs(),
            })
            .await
            .map_err(|err| storage::UpdateError::Other(err.into()))?
            .try_into()
            .map_err(|err: <storage::SessionKey as TryFrom<String>>::Error| {
                storage::UpdateError::Other(err.into())
            })
    }

    async fn update_ttl(
        &self,
        session_key: &storage::SessionKey,
        ttl: &actix_web::cookie::time::Duration,
    ) -> Result<(), anyhow::Error> {
        Ok(self
            .addr
            .send(Extend {
                key: session_key.as_ref().into(),
                ttl: ttl.unsigned_abs(),
            })
            .await?)
    }

    async fn delete(&self, session_key: &storage::SessionKey) -> Result<(), anyhow::Error> {
        Ok(self.addr.send(Evict(session_key.as_ref().into())).await?)
    }
}
