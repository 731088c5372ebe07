//! Explicit state machine for one kind of background request.
//!
//! A request moves `Idle -> Loading -> Success | Failure`. Each start hands
//! out a fresh id and cancellation token. Starting again cancels the request in
//! flight, and completions carrying an old id are dropped, so a slow response
//! can never overwrite a newer one.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Loading { id: RequestId },
    Success(T),
    Failure(String),
}

#[derive(Debug)]
pub struct Request<T> {
    state: RequestState<T>,
    next_id: u64,
    token: Option<CancellationToken>,
}

impl<T> Default for Request<T> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            next_id: 0,
            token: None,
        }
    }
}

impl<T> Request<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new request, cancelling the one in flight.
    pub fn start(&mut self) -> (RequestId, CancellationToken) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.next_id += 1;
        let id = RequestId(self.next_id);
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        self.state = RequestState::Loading { id };
        trace!("Request {:?} started", id);
        (id, token)
    }

    /// Record the outcome of request `id`. Returns false when the result was
    /// dropped because the request is stale or cancelled.
    pub fn complete<E: Display>(&mut self, id: RequestId, result: Result<T, E>) -> bool {
        let current = matches!(self.state, RequestState::Loading { id: cur } if cur == id);
        let cancelled = self.token.as_ref().is_none_or(|t| t.is_cancelled());
        if !current || cancelled {
            debug!("Dropping result of stale request {:?}", id);
            return false;
        }
        self.token = None;
        self.state = match result {
            Ok(value) => RequestState::Success(value),
            Err(e) => RequestState::Failure(e.to_string()),
        };
        true
    }

    /// Abort the request in flight, going back to idle.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if self.is_loading() {
            self.state = RequestState::Idle;
        }
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.state = RequestState::Idle;
    }

    /// Move a finished value out, leaving the request idle.
    pub fn take(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, RequestState::Idle) {
            RequestState::Success(value) => Some(value),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match &self.state {
            RequestState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RequestState::Failure(msg) => Some(msg),
            _ => None,
        }
    }
}
