//! County resolution session
//!
//! A `QuoteSession` drives one group's quote workflow from the caller's side:
//!
//! 1. `run_quotes` triggers a full run. If the request fails in a way the run
//!    may still finish server-side, it falls back to polling the latest batch.
//! 2. `resolve_pending` walks the `NeedsCounty` entries. Single-candidate
//!    entries are previewed straight away; the rest go through a
//!    `CountyChooser`. Previews are merged into the working view.
//! 3. Once nothing is pending, one more full run with the collected county
//!    choices persists the resolution as a new canonical batch.
//!
//! Every run bumps a generation counter; `cancel` bumps it too. Results are
//! applied only while their generation is still current.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use uuid::Uuid;

use crate::api_client::QuoteApi;
use crate::chooser::{CountyChoice, CountyChooser};
use crate::error::{ClientError, ClientResult};
use shared::{
    logging, service_debug, service_info, service_warn, CountyId, GroupId, MemberQuoteEntry, MemberSnapshot,
    PreviewRequest, QuoteBatch, RunQuotesRequest, ServiceId,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1200);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    /// Wall-clock bound on one polling loop
    pub poll_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    NeedsCountyChoice { pending: usize },
    Ready,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Batch(QuoteBatch),
    /// Polling ran out of time; the run may still complete server-side
    TakingLonger,
}

impl RunOutcome {
    pub fn batch(&self) -> Option<&QuoteBatch> {
        match self {
            RunOutcome::Batch(batch) => Some(batch),
            RunOutcome::TakingLonger => None,
        }
    }
}

/// Inputs that decide whether a previous run can be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunSignature {
    effective_date: Option<NaiveDate>,
    tobacco: Option<bool>,
}

impl RunSignature {
    /// `None` for requests carrying county decisions, which are never reused
    fn of(request: &RunQuotesRequest) -> Option<Self> {
        if request.county_id.is_some() || !request.county_choices.is_empty() {
            return None;
        }
        Some(Self {
            effective_date: request.effective_date,
            tobacco: request.tobacco,
        })
    }
}

/// What a polled batch is compared against to tell it came from this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollBaseline {
    /// Latest batch id seen before the run, `None` when the group had none
    Previous(Option<Uuid>),
    /// The latest batch could not be fetched before the run
    StartedAt(DateTime<Utc>),
}

impl PollBaseline {
    fn is_new(&self, batch: &QuoteBatch) -> bool {
        match self {
            PollBaseline::Previous(previous) => Some(batch.id) != *previous,
            PollBaseline::StartedAt(started) => batch.created_at >= *started,
        }
    }
}

/// Clears the in-flight flag when the run ends
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ClientResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ClientError::RunInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct QuoteSession<A: QuoteApi> {
    api: A,
    group_id: GroupId,
    config: SessionConfig,
    state: RwLock<SessionState>,
    view: RwLock<Option<QuoteBatch>>,
    last_signature: Mutex<Option<RunSignature>>,
    generation: AtomicU64,
    run_in_flight: AtomicBool,
}

impl<A: QuoteApi> QuoteSession<A> {
    pub fn new(api: A, group_id: GroupId) -> Self {
        Self {
            api,
            group_id,
            config: SessionConfig::default(),
            state: RwLock::new(SessionState::Idle),
            view: RwLock::new(None),
            last_signature: Mutex::new(None),
            generation: AtomicU64::new(0),
            run_in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Working view: the last applied batch with any previews merged in
    pub async fn view(&self) -> Option<QuoteBatch> {
        self.view.read().await.clone()
    }

    /// Abandon the current run or poll. Late results are discarded.
    pub async fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        if *state == SessionState::Running {
            *state = SessionState::Idle;
        }
        service_info!(ServiceId::current(), "🛑 Cancelled pending work for group {}", self.group_id);
    }

    /// Trigger a full run for the group.
    ///
    /// An unchanged request reuses the latest batch instead of recomputing.
    pub async fn run_quotes(&self, request: RunQuotesRequest) -> ClientResult<RunOutcome> {
        let signature = RunSignature::of(&request);
        if let Some(batch) = self.reusable_batch(signature).await {
            let generation = self.generation.load(Ordering::SeqCst);
            return self.apply(batch, generation).await.map(RunOutcome::Batch);
        }

        let _guard = RunGuard::acquire(&self.run_in_flight)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(SessionState::Running).await;

        let result = self.execute_run(&request, generation).await;
        match &result {
            Ok(RunOutcome::Batch(_)) => *self.last_signature.lock().await = signature,
            Ok(RunOutcome::TakingLonger) | Err(ClientError::Cancelled) => {}
            Err(error) => self.fail(error).await,
        }
        result
    }

    /// Poll the latest batch until one other than `previous_batch` appears,
    /// the poll times out, or the session is cancelled
    pub async fn poll_until_ready(&self, previous_batch: Option<Uuid>) -> ClientResult<RunOutcome> {
        let generation = self.generation.load(Ordering::SeqCst);
        self.set_state(SessionState::Running).await;
        self.poll_for(PollBaseline::Previous(previous_batch), generation).await
    }

    /// Resolve every `NeedsCounty` entry of the working view, then persist
    /// the result with a final full run.
    ///
    /// Members the chooser leaves unresolved stay pending; the merged view is
    /// returned and no run is triggered.
    pub async fn resolve_pending<C>(&self, chooser: &C) -> ClientResult<RunOutcome>
    where
        C: CountyChooser + ?Sized,
    {
        if self.run_in_flight.load(Ordering::SeqCst) {
            return Err(ClientError::RunInFlight);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let request = match self.merge_previews(chooser, generation).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                let view = self.view().await.ok_or(ClientError::NoBatch)?;
                return Ok(RunOutcome::Batch(view));
            }
            Err(error) => {
                if !matches!(error, ClientError::Cancelled) {
                    self.fail(&error).await;
                }
                return Err(error);
            }
        };

        logging::log_progress(
            ServiceId::current(),
            "Persisting county choices",
            &format!("group {} ({} choices)", self.group_id, request.county_choices.len()),
        );
        self.run_quotes(request).await
    }

    async fn reusable_batch(&self, signature: Option<RunSignature>) -> Option<QuoteBatch> {
        let signature = signature?;
        if *self.last_signature.lock().await != Some(signature) {
            return None;
        }
        match self.api.latest_batch(&self.group_id).await {
            Ok(Some(batch)) => {
                service_debug!(ServiceId::current(), "♻️ Run inputs unchanged, reusing batch {}", batch.id);
                Some(batch)
            }
            Ok(None) => None,
            Err(error) => {
                service_warn!(ServiceId::current(), "⚠️ Could not fetch latest batch, recomputing: {}", error);
                None
            }
        }
    }

    async fn execute_run(&self, request: &RunQuotesRequest, generation: u64) -> ClientResult<RunOutcome> {
        let started_at = Utc::now();
        let baseline = match self.api.latest_batch(&self.group_id).await {
            Ok(batch) => PollBaseline::Previous(batch.map(|batch| batch.id)),
            Err(error) => {
                service_debug!(
                    ServiceId::current(),
                    "Latest batch unavailable before run ({}), polling will wait for a newer batch",
                    error
                );
                PollBaseline::StartedAt(started_at)
            }
        };

        service_info!(ServiceId::current(), "🧮 Running quotes for group {}", self.group_id);
        match self.api.run_quotes(&self.group_id, request).await {
            Ok(batch) => self.apply(batch, generation).await.map(RunOutcome::Batch),
            Err(error) if error.is_transient() => {
                service_warn!(
                    ServiceId::current(),
                    "⏳ Run request for group {} failed ({}), polling for the batch",
                    self.group_id,
                    error
                );
                self.poll_for(baseline, generation).await
            }
            Err(error) => Err(error),
        }
    }

    async fn poll_for(&self, baseline: PollBaseline, generation: u64) -> ClientResult<RunOutcome> {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            self.ensure_current(generation)?;
            attempt += 1;

            match self.api.latest_batch(&self.group_id).await {
                Ok(Some(batch)) if baseline.is_new(&batch) => {
                    return self.apply(batch, generation).await.map(RunOutcome::Batch);
                }
                Ok(_) => service_debug!(ServiceId::current(), "🔄 Poll {}: no new batch yet", attempt),
                Err(error) => {
                    service_warn!(ServiceId::current(), "⚠️ Poll {} failed: {}", attempt, error)
                }
            }

            if started.elapsed() >= self.config.poll_timeout {
                service_warn!(
                    ServiceId::current(),
                    "⏰ Quotes for group {} are taking longer than expected",
                    self.group_id
                );
                return Ok(RunOutcome::TakingLonger);
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Preview every pending entry that gets a county. Returns the final run
    /// request once nothing is left pending.
    async fn merge_previews<C>(&self, chooser: &C, generation: u64) -> ClientResult<Option<RunQuotesRequest>>
    where
        C: CountyChooser + ?Sized,
    {
        let mut working = self.view().await.ok_or(ClientError::NoBatch)?;
        let context = working.run_context.clone();
        let mut choices = context.county_choices.clone();

        let pending: Vec<(MemberSnapshot, Vec<CountyId>)> = working
            .pending_county_entries()
            .map(|entry| (entry.member.clone(), entry.pending_counties().unwrap_or_default().to_vec()))
            .collect();

        for (member, candidates) in pending {
            let county_id = match candidates.as_slice() {
                [only] => Some(only.clone()),
                _ => {
                    let options = self.labelled_choices(&candidates).await?;
                    chooser.choose(&member, &options).await?
                }
            };
            let Some(county_id) = county_id else {
                service_info!(ServiceId::current(), "⏸️ No county chosen for member {}", member.id);
                continue;
            };

            self.ensure_current(generation)?;
            let preview = PreviewRequest {
                member_id: Some(member.id.clone()),
                county_id: Some(county_id.clone()),
                effective_date: Some(context.effective_date),
                tobacco: context.tobacco,
            };
            let entry = self.api.preview(&self.group_id, &preview).await?;
            service_debug!(
                ServiceId::current(),
                "🔍 Previewed member {} in county {}: {}",
                member.id,
                county_id,
                entry.status_label()
            );
            merge_entry(&mut working, entry)?;
            choices.insert(member.id, county_id);
        }

        let remaining = working.pending_county_entries().count();
        {
            let mut view = self.view.write().await;
            self.ensure_current(generation)?;
            *view = Some(working);
        }

        if remaining > 0 {
            self.set_state(SessionState::NeedsCountyChoice { pending: remaining }).await;
            return Ok(None);
        }

        Ok(Some(RunQuotesRequest {
            effective_date: Some(context.effective_date),
            tobacco: context.tobacco,
            county_id: context.county_override,
            county_choices: choices,
        }))
    }

    async fn labelled_choices(&self, candidates: &[CountyId]) -> ClientResult<Vec<CountyChoice>> {
        let names = self.api.county_names(candidates).await?;
        Ok(candidates
            .iter()
            .map(|id| CountyChoice {
                id: id.clone(),
                name: names.get(id).cloned().unwrap_or_else(|| id.to_string()),
            })
            .collect())
    }

    async fn apply(&self, batch: QuoteBatch, generation: u64) -> ClientResult<QuoteBatch> {
        let mut view = self.view.write().await;
        self.ensure_current(generation)?;

        let pending = batch.pending_county_entries().count();
        *view = Some(batch.clone());
        drop(view);

        let state = if pending > 0 {
            SessionState::NeedsCountyChoice { pending }
        } else {
            SessionState::Ready
        };
        self.set_state(state).await;
        Ok(batch)
    }

    fn ensure_current(&self, generation: u64) -> ClientResult<()> {
        if self.generation.load(Ordering::SeqCst) == generation {
            Ok(())
        } else {
            Err(ClientError::Cancelled)
        }
    }

    async fn set_state(&self, state: SessionState) {
        *self.state.write().await = state;
    }

    async fn fail(&self, error: &ClientError) {
        logging::log_error(ServiceId::current(), "Quote session", error);
        self.set_state(SessionState::Error {
            message: error.to_string(),
        })
        .await;
    }
}

/// Replace the member's entry in `batch` with `entry`
pub fn merge_entry(batch: &mut QuoteBatch, entry: MemberQuoteEntry) -> ClientResult<()> {
    let slot = batch
        .entries
        .iter_mut()
        .find(|existing| existing.member.id == entry.member.id)
        .ok_or_else(|| ClientError::UnknownMember {
            member_id: entry.member.id.clone(),
        })?;
    *slot = entry;
    Ok(())
}
