use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::service::{initial_request, refresh_request, KeywordBackend};
use crate::api::types::ConversationalKeywordsResponse;
use crate::session::{SessionRecord, SessionStore};
use crate::transform::{transform_results, ViewModelItem};

/// Identifies one outgoing request. Only the newest token may apply its response.
/// Generations live in the session store, so requests from other processes
/// sharing the same file supersede this one too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

#[derive(Debug)]
pub enum Outcome {
    /// The response was stored.
    Applied(SessionRecord),
    /// A newer request started before this one finished; nothing was stored.
    Stale,
    /// The backend call failed; the stored record is untouched.
    Failed(String),
}

/// Submit/refresh/reset over a keyword backend and a session store.
pub struct Dashboard<B, S> {
    backend: B,
    store: S,
}

impl<B: KeywordBackend, S: SessionStore> Dashboard<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self { backend, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn begin_request(&self) -> Result<RequestToken> {
        let generation = self
            .store
            .begin_request()
            .context("Failed to start request generation")?;
        Ok(RequestToken(generation))
    }

    pub fn is_current(&self, token: RequestToken) -> Result<bool> {
        Ok(token.0 == self.store.generation().context("Failed to read request generation")?)
    }

    pub fn load(&self) -> Result<Option<SessionRecord>> {
        self.store.load().context("Failed to load session record")
    }

    /// Transformed rows for the stored record, if there is one.
    pub fn items(&self) -> Result<Option<Vec<ViewModelItem>>> {
        Ok(self.load()?.map(|record| transform_results(&record.results)))
    }

    /// First submission of a domain and its topics.
    pub fn submit(&self, domain: &str, topics: &[String]) -> Result<Outcome> {
        let token = self.begin_request()?;
        let request = initial_request(domain, topics);
        let response = self.backend.analyze(&request);
        self.finish(token, domain, topics, response)
    }

    /// Re-run the stored domain and topics, sending prior results back.
    pub fn refresh(&self) -> Result<Outcome> {
        let record = self
            .load()?
            .context("No saved session to refresh, run `submit` first")?;

        let token = self.begin_request()?;
        let request = refresh_request(&record.domain, &record.topics, &record.results);
        let response = self.backend.analyze(&request);
        self.finish(token, &record.domain, &record.topics, response)
    }

    /// Store the response for `token` unless a newer request has started,
    /// here or in another process.
    pub fn finish(
        &self,
        token: RequestToken,
        domain: &str,
        topics: &[String],
        response: Result<ConversationalKeywordsResponse, crate::error::ApiError>,
    ) -> Result<Outcome> {
        if !self.is_current(token)? {
            self.log_stale(token);
            return Ok(Outcome::Stale);
        }

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(action = "error", component = "dashboard", error = %err, code = ?err.code(), "Keyword request failed");
                return Ok(Outcome::Failed(err.message().to_string()));
            }
        };

        let start_time = Instant::now();
        let record = SessionRecord::new(domain, topics.to_vec(), response.results);
        let saved = self
            .store
            .save_if_current(&record, token.0)
            .context("Failed to save session record")?;
        if !saved {
            self.log_stale(token);
            return Ok(Outcome::Stale);
        }

        info!(
            action = "complete",
            component = "dashboard",
            domain,
            result_count = record.results.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Stored keyword results"
        );
        Ok(Outcome::Applied(record))
    }

    fn log_stale(&self, token: RequestToken) {
        warn!(
            action = "discard",
            component = "dashboard",
            token = token.0,
            latest = ?self.store.generation().ok(),
            "Discarding response from a superseded request"
        );
    }

    /// Clear the record; any request still in flight becomes stale.
    pub fn reset(&self) -> Result<()> {
        self.store.clear().context("Failed to clear session record")
    }
}
