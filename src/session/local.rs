//! In-process realm implementing [`Session`].
//!
//! # Responsibilities
//! - Deliver published events to local subscribers (exact topic match)
//! - Route calls to registered callees and hand back their single reply
//! - Track publisher/caller roles and session closure
//!
//! # Design Decisions
//! - Topics are broadcast channels created on first subscribe; publishing to
//!   a topic with no subscribers is a silent no-op
//! - Each invocation carries a oneshot responder consumed by `respond`, so a
//!   callee can answer at most once; dropping it surfaces as `Abandoned`
//! - Lock-free maps (DashMap) keep publish and call off any shared lock

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::bridge::command::{CallCommand, PublishCommand};
use crate::config::SessionConfig;
use crate::session::{CallOutcome, Session, SessionError};

/// Pending invocations a single callee may queue.
const INVOCATION_QUEUE: usize = 64;

/// Events buffered per topic before slow subscribers start lagging.
const TOPIC_CAPACITY: usize = 256;

/// An event delivered to topic subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub publication: u64,
    pub topic: String,
    pub args: Vec<Value>,
    pub args_kw: Option<Map<String, Value>>,
    pub options: Option<Map<String, Value>>,
}

/// A call delivered to a registered callee.
#[derive(Debug)]
pub struct Invocation {
    pub procedure: String,
    pub args: Option<Vec<Value>>,
    pub args_kw: Option<Map<String, Value>>,
    pub options: Option<Map<String, Value>>,
    responder: oneshot::Sender<CallOutcome>,
}

impl Invocation {
    /// Answer the caller. Consumes the invocation.
    pub fn respond(self, outcome: CallOutcome) {
        if self.responder.send(outcome).is_err() {
            tracing::debug!(procedure = %self.procedure, "Caller went away before the reply");
        }
    }
}

struct Realm {
    name: String,
    publisher: AtomicBool,
    caller: AtomicBool,
    publications: AtomicU64,
    topics: DashMap<String, broadcast::Sender<Event>>,
    procedures: DashMap<String, mpsc::Sender<Invocation>>,
    closed: watch::Sender<bool>,
}

/// Cheaply cloneable handle to an in-process realm.
#[derive(Clone)]
pub struct LocalSession {
    realm: Arc<Realm>,
}

impl LocalSession {
    /// Open a session holding the roles named in the configuration.
    pub fn new(config: &SessionConfig) -> Self {
        let (closed, _) = watch::channel(false);
        tracing::info!(
            realm = %config.realm,
            publisher = config.publisher,
            caller = config.caller,
            "Local session opened"
        );
        Self {
            realm: Arc::new(Realm {
                name: config.realm.clone(),
                publisher: AtomicBool::new(config.publisher),
                caller: AtomicBool::new(config.caller),
                publications: AtomicU64::new(1),
                topics: DashMap::new(),
                procedures: DashMap::new(),
                closed,
            }),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm.name
    }

    pub fn set_publisher_available(&self, available: bool) {
        self.realm.publisher.store(available, Ordering::SeqCst);
    }

    pub fn set_caller_available(&self, available: bool) {
        self.realm.caller.store(available, Ordering::SeqCst);
    }

    /// Subscribe to events published on `topic` (exact match).
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Event> {
        self.realm
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Register a callee for `procedure`.
    ///
    /// Fails if a live callee already holds the registration; a registration
    /// whose receiver was dropped is replaced.
    pub fn register(&self, procedure: &str) -> Result<mpsc::Receiver<Invocation>, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let (tx, rx) = mpsc::channel(INVOCATION_QUEUE);
        match self.realm.procedures.entry(procedure.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if !entry.get().is_closed() {
                    return Err(SessionError::AlreadyRegistered(procedure.to_string()));
                }
                entry.insert(tx);
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(tx);
            }
        }

        tracing::debug!(procedure = %procedure, "Procedure registered");
        Ok(rx)
    }

    /// Register `handler` for `procedure` and serve it on a background task.
    pub fn serve<F>(&self, procedure: &str, handler: F) -> Result<(), SessionError>
    where
        F: Fn(&Invocation) -> CallOutcome + Send + Sync + 'static,
    {
        let mut invocations = self.register(procedure)?;
        tokio::spawn(async move {
            while let Some(invocation) = invocations.recv().await {
                let outcome = handler(&invocation);
                invocation.respond(outcome);
            }
        });
        Ok(())
    }

    /// Close the session: drop both roles, every subscription and every
    /// registration, and wake anyone waiting in [`LocalSession::closed`].
    pub fn close(&self) {
        self.set_publisher_available(false);
        self.set_caller_available(false);
        self.realm.topics.clear();
        self.realm.procedures.clear();
        self.realm.closed.send_replace(true);
        tracing::info!(realm = %self.realm.name, "Local session closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.realm.closed.borrow()
    }

    /// Resolves once the session has been closed.
    pub async fn closed(&self) {
        let mut rx = self.realm.closed.subscribe();
        // The sender lives as long as the realm, which `self` keeps alive.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Session for LocalSession {
    fn is_publisher_available(&self) -> bool {
        self.realm.publisher.load(Ordering::SeqCst)
    }

    fn is_caller_available(&self) -> bool {
        self.realm.caller.load(Ordering::SeqCst)
    }

    fn publish(&self, command: PublishCommand) -> Result<(), SessionError> {
        if !self.is_publisher_available() {
            return Err(SessionError::Closed);
        }

        let (topic, args, args_kw, options) = command.into_parts();
        let publication = self.realm.publications.fetch_add(1, Ordering::Relaxed);

        let Some(subscribers) = self.realm.topics.get(&topic) else {
            tracing::trace!(topic = %topic, publication, "No subscribers");
            return Ok(());
        };

        let event = Event {
            publication,
            topic: topic.clone(),
            args,
            args_kw,
            options,
        };
        match subscribers.send(event) {
            Ok(receivers) => {
                tracing::trace!(topic = %topic, publication, receivers, "Event delivered")
            }
            Err(_) => tracing::trace!(topic = %topic, publication, "All subscribers gone"),
        }
        Ok(())
    }

    fn call(&self, command: CallCommand) -> BoxFuture<'static, Result<CallOutcome, SessionError>> {
        let available = self.is_caller_available();
        let callee = self
            .realm
            .procedures
            .get(command.procedure())
            .map(|entry| entry.value().clone());

        async move {
            if !available {
                return Err(SessionError::Closed);
            }
            let Some(callee) = callee else {
                return Ok(CallOutcome::no_such_procedure());
            };

            let (procedure, args, args_kw, options) = command.into_parts();
            let (responder, reply) = oneshot::channel();
            let invocation = Invocation {
                procedure,
                args,
                args_kw,
                options,
                responder,
            };

            if callee.send(invocation).await.is_err() {
                // Callee dropped its receiver: the registration is gone.
                return Ok(CallOutcome::no_such_procedure());
            }

            reply.await.map_err(|_| SessionError::Abandoned)
        }
        .boxed()
    }
}

impl std::fmt::Debug for LocalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSession")
            .field("realm", &self.realm.name)
            .field("publisher", &self.is_publisher_available())
            .field("caller", &self.is_caller_available())
            .field("topics", &self.realm.topics.len())
            .field("procedures", &self.realm.procedures.len())
            .finish()
    }
}
