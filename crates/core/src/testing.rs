//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use crate::errors::{Error, Result};
use crate::models::{ApplicationSubmission, OpportunityListing};
use crate::remote::{CollectionSource, RemoteCollectionApi};
use crate::session::{LocalSession, SessionUser};

pub fn application(id: &str, opportunity_id: &str) -> ApplicationSubmission {
    ApplicationSubmission::new(
        id,
        opportunity_id,
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
    )
}

pub fn signed_in_session() -> Arc<LocalSession> {
    Arc::new(LocalSession::signed_in(SessionUser::new("user-1"), "token-1"))
}

/// Lets spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advances the paused clock and lets woken tasks run.
pub async fn advance_ms(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

/// One scripted response of a [`ScriptedSource`].
pub struct Scripted<E> {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Vec<E>>,
}

impl<E> Scripted<E> {
    pub fn ready(result: Result<Vec<E>>) -> Self {
        Self { gate: None, result }
    }

    /// A response that resolves only once the returned sender fires.
    pub fn gated(result: Result<Vec<E>>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                gate: Some(rx),
                result,
            },
            tx,
        )
    }
}

/// Collection source replaying scripted responses in call order.
pub struct ScriptedSource<E> {
    responses: Mutex<VecDeque<Scripted<E>>>,
    calls: AtomicUsize,
}

impl<E> ScriptedSource<E> {
    pub fn new(responses: Vec<Scripted<E>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn push(&self, response: Scripted<E>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> CollectionSource<E> for ScriptedSource<E> {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_all(&self, _token: &str) -> Result<Vec<E>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Scripted { gate, result }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Ok(Vec::new()),
        }
    }
}

/// In-memory remote API with switchable bookmark write failures.
#[derive(Default)]
pub struct MockRemoteApi {
    pub applications: Mutex<Vec<ApplicationSubmission>>,
    pub opportunities: Mutex<Vec<OpportunityListing>>,
    pub bookmarks: Mutex<Vec<OpportunityListing>>,
    fail_writes: AtomicBool,
    write_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub writes: Mutex<Vec<String>>,
}

impl MockRemoteApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Holds the next bookmark write until the returned sender fires.
    pub fn gate_next_write(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.write_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    async fn write(&self, op: String) -> Result<()> {
        self.writes.lock().unwrap().push(op.clone());
        let gate = self.write_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::remote(format!("{} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCollectionApi for MockRemoteApi {
    async fn fetch_my_applications(&self, _token: &str) -> Result<Vec<ApplicationSubmission>> {
        Ok(self.applications.lock().unwrap().clone())
    }

    async fn fetch_my_opportunities(&self, _token: &str) -> Result<Vec<OpportunityListing>> {
        Ok(self.opportunities.lock().unwrap().clone())
    }

    async fn fetch_bookmarks(&self, _token: &str) -> Result<Vec<OpportunityListing>> {
        Ok(self.bookmarks.lock().unwrap().clone())
    }

    async fn add_bookmark(&self, opportunity_id: &str, _token: &str) -> Result<()> {
        self.write(format!("add:{}", opportunity_id)).await
    }

    async fn remove_bookmark(&self, opportunity_id: &str, _token: &str) -> Result<()> {
        self.write(format!("remove:{}", opportunity_id)).await
    }
}
