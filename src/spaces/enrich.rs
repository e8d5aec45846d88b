//! Space enrichment
//!
//! Lists spaces from the public room directory, then fetches each space's
//! state from the admin API to collect its `m.space.child` relations.
//!
//! Detail fetches run on a [`JoinSet`] gated by a [`Semaphore`] holding
//! `concurrency_limit` permits. The semaphore doubles as the cancellation
//! signal: the first task to fail closes it, so tasks still waiting for a
//! permit stop with [`CancelReason::SiblingFailed`] and the orchestrator
//! aborts whatever is still in flight. The result is all-or-nothing.

use super::error::{CancelReason, EnrichError};
use super::model::Space;
use super::parse::{parse_detail, parse_listing, public_rooms_body};
use crate::synapse::{Request, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::Instrument;

/// Public room directory endpoint
pub const PUBLIC_ROOMS_PATH: &str = "/_matrix/client/v3/publicRooms";

/// Admin rooms endpoint, suffixed with `/<room id>/state`
pub const ADMIN_ROOMS_PATH: &str = "/_synapse/admin/v1/rooms";

pub const DEFAULT_LISTING_LIMIT: u32 = 200;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;
pub const DEFAULT_ENRICH_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Path of the admin state endpoint for one room
pub fn state_path(room_id: &str) -> String {
    format!("{}/{}/state", ADMIN_ROOMS_PATH, urlencoding::encode(room_id))
}

/// Request listing up to `limit` spaces from the public room directory
pub fn listing_request(limit: u32) -> Request {
    Request::post(PUBLIC_ROOMS_PATH, public_rooms_body(limit).to_string().into_bytes())
}

/// Lists spaces and enriches each one with its child rooms
pub struct Enricher {
    transport: Arc<dyn Transport>,
    concurrency_limit: usize,
    timeout: Duration,
    span: tracing::Span,
}

impl Enricher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            timeout: DEFAULT_ENRICH_TIMEOUT,
            span: tracing::Span::none(),
        }
    }

    /// Maximum number of state fetches in flight; clamped to at least one
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    /// Deadline for the whole run, listing included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Span that all log events of a run are recorded under
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Fetch the listing described by `listing` and enrich every space in it.
    ///
    /// On error no spaces are returned, even if some were already enriched.
    pub async fn enrich(&self, listing: &Request) -> Result<Vec<Space>, EnrichError> {
        let deadline = Instant::now() + self.timeout;

        let run = async {
            match timeout_at(deadline, self.run(listing, deadline)).await {
                Ok(result) => result,
                Err(_) => Err(EnrichError::Cancelled {
                    space_id: None,
                    reason: CancelReason::DeadlineExceeded,
                }),
            }
        };

        run.instrument(self.span.clone()).await
    }

    async fn run(&self, listing: &Request, deadline: Instant) -> Result<Vec<Space>, EnrichError> {
        let output = self
            .transport
            .call(listing, deadline, false)
            .await
            .map_err(|source| EnrichError::Transport {
                space_id: None,
                source,
            })?;

        let spaces = parse_listing(&output).map_err(|source| EnrichError::Decode {
            space_id: None,
            source,
        })?;

        if spaces.is_empty() {
            tracing::debug!(event = "no_spaces_found", "Listing returned no spaces");
            return Ok(spaces);
        }

        tracing::debug!(
            event = "fetching_space_details",
            count = spaces.len(),
            max_concurrent_requests = self.concurrency_limit,
            max_concurrent_requests_timeout = ?self.timeout,
            "Fetching details for spaces"
        );

        let spaces = self.fan_out(spaces, deadline).await?;

        tracing::debug!(
            event = "fetched_space_details",
            count = spaces.len(),
            "Fetched details for spaces"
        );

        Ok(spaces)
    }

    async fn fan_out(&self, spaces: Vec<Space>, deadline: Instant) -> Result<Vec<Space>, EnrichError> {
        let ids: Vec<String> = spaces.iter().map(|space| space.id.clone()).collect();
        let shared = Arc::new(Mutex::new(spaces));
        let permits = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut tasks = JoinSet::new();

        for (index, space_id) in ids.into_iter().enumerate() {
            let task = EnrichTask {
                index,
                space_id,
                transport: Arc::clone(&self.transport),
                permits: Arc::clone(&permits),
                shared: Arc::clone(&shared),
                deadline,
            };
            tasks.spawn(task.run().in_current_span());
        }

        let mut first_error: Option<EnrichError> = None;
        let mut sibling_cancelled: Option<EnrichError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) if join_err.is_panic() => {
                    std::panic::resume_unwind(join_err.into_panic())
                }
                // Aborted after an earlier failure
                Err(_) => continue,
            };

            if let Err(err) = outcome {
                // The failing sibling closed the semaphore; wait for its own error
                if err.is_sibling_cancellation() {
                    sibling_cancelled.get_or_insert(err);
                    continue;
                }
                if first_error.is_none() {
                    tracing::debug!(
                        event = "cancelling_space_details",
                        space = err.space_id().unwrap_or_default(),
                        "Cancelling remaining space fetches"
                    );
                    permits.close();
                    tasks.abort_all();
                    first_error = Some(err);
                }
            }
        }

        if let Some(err) = first_error.or(sibling_cancelled) {
            return Err(err);
        }

        let mut spaces = shared.lock().await;
        Ok(std::mem::take(&mut *spaces))
    }
}

/// One space's state fetch; owns its index and id
struct EnrichTask {
    index: usize,
    space_id: String,
    transport: Arc<dyn Transport>,
    permits: Arc<Semaphore>,
    shared: Arc<Mutex<Vec<Space>>>,
    deadline: Instant,
}

impl EnrichTask {
    async fn run(self) -> Result<(), EnrichError> {
        let _permit = self.admit().await?;
        let result = self.fetch_and_merge().await;
        if result.is_err() {
            // Stop admitting siblings while this task still holds its permit
            self.permits.close();
        }
        result
    }

    /// Wait for a free slot, giving up on cancellation or deadline
    async fn admit(&self) -> Result<OwnedSemaphorePermit, EnrichError> {
        tokio::select! {
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| self.cancelled(CancelReason::SiblingFailed))
            }
            _ = sleep_until(self.deadline) => {
                Err(self.cancelled(CancelReason::DeadlineExceeded))
            }
        }
    }

    async fn fetch_and_merge(&self) -> Result<(), EnrichError> {
        tracing::debug!(
            event = "fetching_space_details",
            space = %self.space_id,
            "Fetching details for space"
        );

        let request = Request::get(state_path(&self.space_id));
        let output = self
            .transport
            .call(&request, self.deadline, false)
            .await
            .map_err(|source| EnrichError::Transport {
                space_id: Some(self.space_id.clone()),
                source,
            })?;

        let children = parse_detail(&output).map_err(|source| EnrichError::Decode {
            space_id: Some(self.space_id.clone()),
            source,
        })?;

        let mut spaces = self.shared.lock().await;
        if let Some(space) = spaces.get_mut(self.index) {
            space.merge_children(children);
        }

        Ok(())
    }

    fn cancelled(&self, reason: CancelReason) -> EnrichError {
        EnrichError::Cancelled {
            space_id: Some(self.space_id.clone()),
            reason,
        }
    }
}
