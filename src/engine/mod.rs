//! Lead engine: the single owner of inbox state.
//!
//! DESIGN
//! ======
//! `LeadEngine` is a cheap `Clone` handle over `Arc<Inner>`. All mutable
//! state sits in one `std::sync::Mutex` that is taken for short synchronous
//! sections and never held across an `.await`. Background work (debounced
//! fetch, list and detail polling) runs as spawned tokio tasks holding a
//! `Weak` reference, so dropping the last handle stops everything.
//!
//! Filter changes are mirrored into the navigator immediately and trigger a
//! debounced list fetch. Every list fetch takes a sequence number; a response
//! only lands if no newer fetch was issued meanwhile. Status changes are
//! applied to the cache before their request is sent and stay recorded as
//! pending until it settles, so a list response that arrives in between does
//! not undo them.
//!
//! ERROR HANDLING
//! ==============
//! A failed list fetch sets a page-level message that `retry` clears. A
//! failed mutation is logged and returned to the caller; what happens to
//! the optimistic change is decided by `OptimisticPolicy`. A failed detail
//! fetch keeps the partial data on screen.

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod debounce;
pub mod optimistic;
pub mod poller;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::join_all;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::nav::Navigator;
use crate::net::api::LeadApi;
use crate::net::types::{ApiError, RemoteLead};
use crate::state::detail::DetailView;
use crate::state::filters::{
    CompanySize, Confidence, FilterCriteria, FilterField, LastUpdated, SavedFilter, builtin_saved_filters,
};
use crate::state::leads::{Lead, LeadStatus, LeadView};
use crate::state::query::{PARAM_VIEW, RemoteQuery, parse_query, rewrite_query, strip_param, view_param};
use crate::state::selection::Selection;

use self::debounce::Debouncer;
use self::optimistic::{BulkAction, BulkFailure, BulkOutcome, MenuAction, OptimisticPolicy, UnknownName};
use self::poller::PollHandle;

// =============================================================================
// STATE
// =============================================================================

/// Optimistic status change whose request has not settled yet.
#[derive(Clone, Debug)]
struct PendingStatus {
    token: u64,
    status: LeadStatus,
    previous: Option<LeadStatus>,
}

#[derive(Default)]
struct EngineState {
    criteria: FilterCriteria,
    cache: Vec<Lead>,
    selection: Selection,
    detail: Option<DetailView>,
    loading: bool,
    error: Option<String>,
    pending: HashMap<String, PendingStatus>,
    saved_filters: Vec<SavedFilter>,
}

impl EngineState {
    fn lead_mut(&mut self, id: &str) -> Option<&mut Lead> {
        self.cache.iter_mut().find(|lead| lead.id == id)
    }

    fn detail_for_mut(&mut self, id: &str) -> Option<&mut DetailView> {
        self.detail.as_mut().filter(|detail| detail.id() == id)
    }

    /// Set `id`'s status in the cache and in an open detail view.
    fn set_status(&mut self, id: &str, status: &LeadStatus) {
        if let Some(lead) = self.lead_mut(id) {
            lead.status = status.clone();
        }
        if let Some(detail) = self.detail_for_mut(id) {
            detail.set_status(status.clone());
        }
    }

    /// Replace the cache, keeping in-flight optimistic statuses visible.
    fn replace_cache(&mut self, mut leads: Vec<Lead>) {
        for lead in &mut leads {
            if let Some(pending) = self.pending.get(&lead.id) {
                lead.status = pending.status.clone();
            }
        }
        self.cache = leads;
    }
}

struct Inner {
    api: Arc<dyn LeadApi>,
    navigator: Arc<dyn Navigator>,
    config: SyncConfig,
    state: Mutex<EngineState>,
    list_seq: AtomicU64,
    detail_seq: AtomicU64,
    mutation_seq: AtomicU64,
    debouncer: Debouncer,
    list_poll: Mutex<Option<PollHandle>>,
    detail_poll: Mutex<Option<PollHandle>>,
    changes: watch::Sender<u64>,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Handle to one inbox session. Clones share the same state.
#[derive(Clone)]
pub struct LeadEngine {
    inner: Arc<Inner>,
}

impl LeadEngine {
    /// Build an engine whose initial criteria come from the navigator's URL.
    ///
    /// Nothing is fetched until `refresh`, a filter change, or polling.
    #[must_use]
    pub fn new(api: Arc<dyn LeadApi>, navigator: Arc<dyn Navigator>, config: SyncConfig) -> Self {
        let criteria = parse_query(&navigator.query());
        let state = EngineState { criteria, saved_filters: builtin_saved_filters(), ..EngineState::default() };
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                api,
                navigator,
                debouncer: Debouncer::new(config.debounce),
                config,
                state: Mutex::new(state),
                list_seq: AtomicU64::new(0),
                detail_seq: AtomicU64::new(0),
                mutation_seq: AtomicU64::new(0),
                list_poll: Mutex::new(None),
                detail_poll: Mutex::new(None),
                changes,
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|revision| *revision += 1);
    }

    // =========================================================================
    // READ
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        self.lock().criteria.clone()
    }

    /// Filtered, sorted view as of the current wall clock.
    #[must_use]
    pub fn view(&self) -> LeadView {
        self.view_at(OffsetDateTime::now_utc())
    }

    /// Filtered, sorted view with `now` as the reference for date windows.
    #[must_use]
    pub fn view_at(&self, now: OffsetDateTime) -> LeadView {
        let state = self.lock();
        LeadView::build(&state.cache, &state.criteria, now)
    }

    /// Unfiltered cache in server order.
    #[must_use]
    pub fn leads(&self) -> Vec<Lead> {
        self.lock().cache.clone()
    }

    #[must_use]
    pub fn lead(&self, id: &str) -> Option<Lead> {
        self.lock().cache.iter().find(|lead| lead.id == id).cloned()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.lock().selection.clone()
    }

    #[must_use]
    pub fn detail(&self) -> Option<DetailView> {
        self.lock().detail.clone()
    }

    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.lock().criteria.active_filter_count()
    }

    #[must_use]
    pub fn saved_filters(&self) -> Vec<SavedFilter> {
        self.lock().saved_filters.clone()
    }

    /// Revision counter bumped on every observable state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    // =========================================================================
    // FILTERS
    // =========================================================================

    /// Apply `edit` to the criteria. A change is mirrored into the URL and
    /// re-arms the debounced fetch; an edit that changes nothing does neither.
    pub fn update_filters(&self, edit: impl FnOnce(&mut FilterCriteria)) {
        let criteria = {
            let mut state = self.lock();
            let before = state.criteria.clone();
            edit(&mut state.criteria);
            if state.criteria == before {
                return;
            }
            state.criteria.clone()
        };
        self.sync_url(&criteria);
        self.notify();
        self.schedule_fetch();
    }

    /// Replace all criteria; set members are normalized first.
    pub fn set_criteria(&self, mut criteria: FilterCriteria) {
        criteria.normalize();
        self.update_filters(|c| *c = criteria);
    }

    pub fn set_keyword(&self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        self.update_filters(|c| c.keyword = keyword);
    }

    pub fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        self.update_filters(|c| c.location = location);
    }

    pub fn toggle_industry(&self, industry: &str) {
        self.update_filters(|c| c.toggle_industry(industry));
    }

    pub fn toggle_status_filter(&self, status: LeadStatus) {
        self.update_filters(|c| c.toggle_status(status));
    }

    pub fn set_min_score(&self, value: i64) {
        self.update_filters(|c| c.score_range = c.score_range.with_min(value));
    }

    pub fn set_max_score(&self, value: i64) {
        self.update_filters(|c| c.score_range = c.score_range.with_max(value));
    }

    pub fn set_confidence(&self, confidence: Confidence) {
        self.update_filters(|c| c.confidence = confidence);
    }

    pub fn set_company_size(&self, size: CompanySize) {
        self.update_filters(|c| c.company_size = size);
    }

    pub fn set_last_updated(&self, window: LastUpdated) {
        self.update_filters(|c| c.last_updated = window);
    }

    pub fn remove_filter(&self, field: FilterField) {
        self.update_filters(|c| c.clear_field(field));
    }

    pub fn reset_filters(&self) {
        self.set_criteria(FilterCriteria::default());
    }

    pub fn apply_saved_filter(&self, saved: &SavedFilter) {
        info!(saved_filter = %saved.name, "applying saved filter");
        self.set_criteria(saved.criteria.clone());
    }

    fn sync_url(&self, criteria: &FilterCriteria) {
        let navigator = &self.inner.navigator;
        let query = rewrite_query(&navigator.query(), criteria);
        navigator.replace_query(&query);
    }

    fn schedule_fetch(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            if let Some(engine) = Self::from_weak(&weak) {
                debug!("debounced list fetch");
                let _ = engine.refresh().await;
            }
        });
    }

    // =========================================================================
    // LIST FETCH
    // =========================================================================

    /// Fetch the list for the current criteria and reconcile the cache.
    ///
    /// A response overtaken by a newer fetch is discarded and reported as `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the API error when the (still current) fetch fails; the generic
    /// message is also stored for `error()`.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let seq = self.inner.list_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let mut state = self.lock();
            state.loading = true;
            RemoteQuery::from_criteria(&state.criteria)
        };
        self.notify();

        let result = self.inner.api.list_leads(&query).await;

        // Checked under the state lock so a newer response applied in the
        // meantime is never overwritten.
        let applied = {
            let mut state = self.lock();
            if self.inner.list_seq.load(Ordering::SeqCst) == seq {
                state.loading = false;
                Some(match result {
                    Ok(remote) => {
                        let count = remote.len();
                        state.replace_cache(remote.into_iter().map(Lead::from_remote).collect());
                        state.error = None;
                        Ok(count)
                    }
                    Err(e) => {
                        state.error = Some(ApiError::user_message(&self.inner.config.api_base_url));
                        Err(e)
                    }
                })
            } else {
                None
            }
        };

        match applied {
            None => {
                debug!(seq, "discarding stale list response");
                Ok(())
            }
            Some(Ok(count)) => {
                info!(seq, count, "lead list applied");
                self.notify();
                self.honor_view_directive().await;
                Ok(())
            }
            Some(Err(e)) => {
                error!(
                    error = %e,
                    code = e.error_code(),
                    retryable = e.retryable(),
                    seq,
                    "lead list fetch failed"
                );
                self.notify();
                Err(e)
            }
        }
    }

    /// Re-read the URL, clear the error, and fetch immediately.
    ///
    /// # Errors
    ///
    /// Returns the API error if the fetch fails again.
    pub async fn retry(&self) -> Result<(), ApiError> {
        let criteria = parse_query(&self.inner.navigator.query());
        {
            let mut state = self.lock();
            state.criteria = criteria;
            state.error = None;
        }
        self.inner.debouncer.cancel();
        self.notify();
        self.refresh().await
    }

    /// Open the lead named by `view=<id>` once it is in the cache, then
    /// strip the directive from the URL.
    async fn honor_view_directive(&self) {
        let navigator = &self.inner.navigator;
        let current = navigator.query();
        let Some(id) = view_param(&current) else {
            return;
        };
        if self.lead(&id).is_none() {
            debug!(lead_id = %id, "view directive target not loaded yet");
            return;
        }
        self.begin_detail(&id);
        navigator.replace_query(&strip_param(&current, PARAM_VIEW));
        let _ = self.fetch_detail(&id).await;
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Apply a status locally and record it as pending. Returns the token
    /// identifying this change.
    fn apply_optimistic(&self, id: &str, status: &LeadStatus) -> u64 {
        let token = self.inner.mutation_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.lock();
        let previous = state
            .cache
            .iter()
            .find(|lead| lead.id == id)
            .map(|lead| lead.status.clone());
        // A change stacked on a pending one rolls back to the settled status.
        let previous = state.pending.get(id).map_or(previous, |p| p.previous.clone());
        state.set_status(id, status);
        state.pending.insert(id.to_owned(), PendingStatus { token, status: status.clone(), previous });
        token
    }

    /// Clear the pending entry for `token` and apply the rollback policy.
    fn settle(&self, id: &str, token: u64, result: &Result<(), ApiError>) {
        let policy = self.inner.config.policy;
        if let Err(e) = result {
            warn!(error = %e, code = e.error_code(), lead_id = %id, %policy, "status update failed");
        }
        let mut state = self.lock();
        // A newer local change for this lead owns the pending entry now.
        let Some(pending) = state.pending.get(id).filter(|p| p.token == token).cloned() else {
            return;
        };
        state.pending.remove(id);
        if result.is_err() && policy == OptimisticPolicy::RollbackOnFailure {
            if let Some(previous) = pending.previous {
                state.set_status(id, &previous);
            }
        }
    }

    /// Set one lead's status optimistically and send it to the backend.
    ///
    /// # Errors
    ///
    /// Returns the API error if the backend did not acknowledge the update.
    pub async fn update_status(&self, id: &str, status: LeadStatus) -> Result<(), ApiError> {
        let token = self.apply_optimistic(id, &status);
        self.notify();

        let result = self.inner.api.update_status(id, &status.wire_value()).await;
        self.settle(id, token, &result);
        self.notify();

        if result.is_err() && self.inner.config.policy == OptimisticPolicy::RefetchOnFailure {
            let _ = self.refresh().await;
        }
        result
    }

    /// Set the same status on every id, send the updates concurrently, then
    /// clear the selection and refetch the list.
    ///
    /// Each id is sent once; failures are reported, not retried.
    pub async fn bulk_update_status(&self, ids: &[String], status: LeadStatus) -> BulkOutcome {
        let tokens: Vec<u64> = ids.iter().map(|id| self.apply_optimistic(id, &status)).collect();
        self.notify();

        let wire = status.wire_value();
        let results = join_all(ids.iter().map(|id| self.inner.api.update_status(id, &wire))).await;

        let mut outcome = BulkOutcome::default();
        for ((id, token), result) in ids.iter().zip(tokens).zip(results) {
            self.settle(id, token, &result);
            match result {
                Ok(()) => outcome.succeeded.push(id.clone()),
                Err(error) => outcome.failed.push(BulkFailure { id: id.clone(), error }),
            }
        }
        info!(
            status = %status,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk status update settled"
        );

        self.lock().selection.clear();
        self.notify();
        let _ = self.refresh().await;
        outcome
    }

    /// Run a bulk toolbar action (`"contacted"`, `"qualified"`, `"closed"`)
    /// over the current selection. An empty selection does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown action name.
    pub async fn apply_bulk_action(&self, action: &str) -> Result<BulkOutcome, UnknownName> {
        let action: BulkAction = action.parse()?;
        let ids = self.lock().selection.ids();
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }
        Ok(self.bulk_update_status(&ids, action.status()).await)
    }

    /// Run a per-row menu action.
    ///
    /// # Errors
    ///
    /// Returns the API error of a failed status update.
    pub async fn menu_action(&self, id: &str, action: MenuAction) -> Result<(), ApiError> {
        match action.target_status() {
            Some(status) => self.update_status(id, status).await,
            None => {
                self.open_detail(id).await;
                Ok(())
            }
        }
    }

    /// Post feedback tags. On success an open detail view for `id` is marked
    /// as submitted; the cached feedback is not touched.
    ///
    /// # Errors
    ///
    /// Returns the API error if the submission was not acknowledged.
    pub async fn submit_feedback(&self, id: &str, tags: &[String]) -> Result<(), ApiError> {
        match self.inner.api.submit_feedback(id, tags).await {
            Ok(()) => {
                if let Some(detail) = self.lock().detail_for_mut(id) {
                    detail.feedback_submitted = true;
                }
                info!(lead_id = %id, tags = tags.len(), "feedback submitted");
                self.notify();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), lead_id = %id, "feedback submission failed");
                Err(e)
            }
        }
    }

    // =========================================================================
    // DETAIL
    // =========================================================================

    /// Open the detail view for `id`, load its extended fields, and start
    /// the detail refresh.
    pub async fn open_detail(&self, id: &str) {
        self.begin_detail(id);
        let _ = self.fetch_detail(id).await;
    }

    fn begin_detail(&self, id: &str) {
        {
            let mut state = self.lock();
            let lead = state
                .cache
                .iter()
                .find(|lead| lead.id == id)
                .cloned()
                .unwrap_or_else(|| Lead::from_remote(RemoteLead { id: id.to_owned(), ..RemoteLead::default() }));
            state.detail = Some(DetailView::open(lead));
        }
        self.start_detail_poll(id);
        self.notify();
    }

    /// Load extended fields for `id` into the open detail view.
    ///
    /// A response for a lead that is no longer open is dropped.
    ///
    /// # Errors
    ///
    /// Returns the API error; the partial data stays on screen.
    pub async fn fetch_detail(&self, id: &str) -> Result<(), ApiError> {
        let seq = self.inner.detail_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(detail) = self.lock().detail_for_mut(id) {
            detail.begin_load();
        }
        self.notify();

        let result = self.inner.api.get_lead(id).await;

        {
            let mut state = self.lock();
            let pending = state.pending.get(id).map(|p| p.status.clone());
            let current = self.inner.detail_seq.load(Ordering::SeqCst) == seq;
            let Some(detail) = state.detail_for_mut(id) else {
                debug!(lead_id = %id, "discarding detail for closed view");
                return Ok(());
            };
            if !current {
                debug!(lead_id = %id, seq, "discarding stale detail response");
                return Ok(());
            }
            match &result {
                Ok(remote) => {
                    detail.apply(remote.clone());
                    if let Some(status) = pending {
                        detail.set_status(status);
                    }
                }
                Err(e) => {
                    detail.fail();
                    warn!(
                        error = %e,
                        code = e.error_code(),
                        retryable = e.retryable(),
                        lead_id = %id,
                        "lead detail fetch failed"
                    );
                }
            }
        }
        self.notify();
        result.map(|_| ())
    }

    /// Close the detail view and stop its refresh.
    pub fn close_detail(&self) {
        self.inner.detail_seq.fetch_add(1, Ordering::SeqCst);
        self.lock().detail = None;
        self.stop_detail_poll();
        self.notify();
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    pub fn toggle_selection(&self, id: &str) {
        self.lock().selection.toggle(id);
        self.notify();
    }

    /// Clear the selection if every visible lead is selected; otherwise
    /// select exactly the visible leads.
    pub fn toggle_select_all(&self) {
        let visible = self.view().ids();
        self.lock().selection.toggle_all(visible);
        self.notify();
    }

    pub fn clear_selection(&self) {
        self.lock().selection.clear();
        self.notify();
    }

    // =========================================================================
    // POLLING
    // =========================================================================

    /// Start the periodic list refresh, if enabled. Restarting replaces the
    /// previous loop.
    pub fn start_polling(&self) {
        let Some(period) = self.inner.config.list_poll else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let handle = PollHandle::spawn(period, move || {
            let weak = weak.clone();
            async move {
                let Some(engine) = Self::from_weak(&weak) else {
                    return false;
                };
                let _ = engine.refresh().await;
                true
            }
        });
        info!(period_secs = period.as_secs(), "list polling started");
        *lock_slot(&self.inner.list_poll) = Some(handle);
    }

    pub fn stop_polling(&self) {
        lock_slot(&self.inner.list_poll).take();
    }

    fn start_detail_poll(&self, id: &str) {
        let Some(period) = self.inner.config.detail_poll else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let id = id.to_owned();
        let handle = PollHandle::spawn(period, move || {
            let weak = weak.clone();
            let id = id.clone();
            async move {
                let Some(engine) = Self::from_weak(&weak) else {
                    return false;
                };
                let _ = engine.fetch_detail(&id).await;
                true
            }
        });
        *lock_slot(&self.inner.detail_poll) = Some(handle);
    }

    fn stop_detail_poll(&self) {
        lock_slot(&self.inner.detail_poll).take();
    }

    /// Stop polling and drop any pending debounced fetch.
    pub fn shutdown(&self) {
        self.inner.debouncer.cancel();
        self.stop_polling();
        self.stop_detail_poll();
        info!("lead engine stopped");
    }
}

fn lock_slot(slot: &Mutex<Option<PollHandle>>) -> MutexGuard<'_, Option<PollHandle>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
