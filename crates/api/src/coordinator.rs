// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pipeline coordinator runtime.
//!
//! `PipelineCoordinator` drives the pure state machine in the core crate:
//! it feeds it commands, executes the effects it returns (fetch tasks,
//! poll timers, cancellation) and publishes the resulting view.
//!
//! ## Concurrency
//!
//! - Coordinator state sits behind one async mutex that is only held while
//!   a transition is applied and its effects are started, never across
//!   upstream I/O.
//! - Each selection generation owns a `CancellationToken`. Switching period
//!   or shutting down cancels the token, which stops that generation's poll
//!   timer and fetch tasks. A result that races cancellation is still
//!   discarded by the core because its ticket no longer matches.
//! - Observers read the latest `PipelineView` from a `watch` channel without
//!   touching the state lock. Applied snapshots are shared behind `Arc`.

use crate::config::CoordinatorConfig;
use crate::error::{ApiError, translate_core_error};
use residuals::{
    Command, CoordinatorState, CoreError, Effect, FetchTicket, Outcome, PipelineView,
    TransitionResult, apply,
};
use residuals_domain::{AuditRunResult, PeriodKey, StageId};
use residuals_upstream::{ResidualsBackend, fetch_snapshot};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Settled marker published once the coordinator stops, so no waiter hangs.
const SETTLED_ON_SHUTDOWN: u64 = u64::MAX;

/// Mutable runtime state guarded by the coordinator lock.
struct Runtime {
    core: CoordinatorState,
    generation_token: CancellationToken,
    poll_token: Option<CancellationToken>,
    shut_down: bool,
}

struct Inner {
    backend: Arc<dyn ResidualsBackend>,
    config: CoordinatorConfig,
    runtime: Mutex<Runtime>,
    views: watch::Sender<PipelineView>,
    /// Highest fetch sequence whose result has been processed.
    settled: watch::Sender<u64>,
}

/// Coordinates snapshot fetching, polling and stage evaluation for the
/// active period.
///
/// Cheap to clone; clones share one coordinator.
#[derive(Clone)]
pub struct PipelineCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PipelineCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCoordinator")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl PipelineCoordinator {
    /// Creates an idle coordinator with no period selected.
    ///
    /// # Arguments
    ///
    /// * `backend` - The upstream subsystems
    /// * `config` - Runtime settings
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        backend: Arc<dyn ResidualsBackend>,
        config: CoordinatorConfig,
    ) -> Result<Self, ApiError> {
        config.validate()?;

        let core: CoordinatorState = CoordinatorState::new(config.failure_escalation_threshold);
        let (views, _) = watch::channel(core.view());
        let (settled, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                config,
                runtime: Mutex::new(Runtime {
                    core,
                    generation_token: CancellationToken::new(),
                    poll_token: None,
                    shut_down: false,
                }),
                views,
                settled,
            }),
        })
    }

    /// Returns the runtime settings.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Returns the latest published view.
    #[must_use]
    pub fn view(&self) -> PipelineView {
        self.inner.views.borrow().clone()
    }

    /// Subscribes to view changes.
    ///
    /// The receiver always holds the latest view; intermediate views may be
    /// skipped by slow observers.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineView> {
        self.inner.views.subscribe()
    }

    /// Switches the active period.
    ///
    /// Cancels all work for the previous period and starts a fetch and the
    /// poll timer for the new one. Returns without waiting for the fetch.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ShutDown` after `shutdown`.
    pub async fn select_period(&self, period: PeriodKey) -> Result<PipelineView, ApiError> {
        dispatch(&self.inner, Command::SelectPeriod { period }).await?;
        Ok(self.view())
    }

    /// Fetches fresh data now and waits for it.
    ///
    /// Joins a fetch that is already in flight instead of starting another.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NoActivePeriod` if no period is selected, or
    /// `ApiError::SnapshotUnavailable` if the fetch failed. In the latter
    /// case the previous snapshot is still shown, marked stale.
    pub async fn refresh(&self) -> Result<PipelineView, ApiError> {
        let outcome: Outcome = dispatch(&self.inner, Command::Refresh).await?;
        self.await_outcome(outcome).await
    }

    /// Asks the audit subsystem to audit a period, then refreshes.
    ///
    /// The refresh happens whether or not the run succeeded, since even a
    /// failed run may have changed per-source audit state.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AuditRunFailed` if the run failed outright or any
    /// source failed its audit.
    pub async fn run_audit(&self, period: PeriodKey) -> Result<AuditRunResult, ApiError> {
        if self.inner.runtime.lock().await.shut_down {
            return Err(ApiError::ShutDown);
        }

        info!(period = %period, "Running audit");
        let result = self.inner.backend.run_audit(period).await;

        match dispatch(&self.inner, Command::MutationCompleted { period }).await {
            Ok(outcome) => {
                if let Err(err) = self.await_outcome(outcome).await {
                    warn!(period = %period, error = %err, "Refresh after audit failed");
                }
            }
            Err(ApiError::NoActivePeriod) => {}
            Err(err) => return Err(err),
        }

        match result {
            Ok(run) => {
                if let Some(err) = CoreError::from_audit_run(&run) {
                    warn!(
                        period = %period,
                        failing = run.failures().len(),
                        "Audit run reported failures"
                    );
                    return Err(translate_core_error(err));
                }
                info!(period = %period, sources = run.results.len(), "Audit passed");
                Ok(run)
            }
            Err(err) => {
                warn!(period = %period, error = %err, "Audit run failed");
                Err(translate_core_error(CoreError::AuditRunFailed {
                    period,
                    reason: Some(err.to_string()),
                    failures: Vec::new(),
                }))
            }
        }
    }

    /// Expands or collapses a stage's detail panel.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::StageLocked` for a locked stage, leaving the view
    /// unchanged.
    pub async fn toggle_stage_view(&self, stage: StageId) -> Result<PipelineView, ApiError> {
        dispatch(&self.inner, Command::ToggleStageView { stage }).await?;
        Ok(self.view())
    }

    /// Stops polling and cancels in-flight work.
    ///
    /// Later calls that would fetch fail with `ApiError::ShutDown`.
    pub async fn shutdown(&self) {
        if let Err(err) = dispatch(&self.inner, Command::Shutdown).await {
            debug!(error = %err, "Coordinator already shut down");
            return;
        }

        self.inner.runtime.lock().await.shut_down = true;
        self.inner.settled.send_replace(SETTLED_ON_SHUTDOWN);
    }

    async fn await_outcome(&self, outcome: Outcome) -> Result<PipelineView, ApiError> {
        match outcome {
            Outcome::Awaiting { sequence } => self.await_sequence(sequence).await,
            _ => Ok(self.view()),
        }
    }

    /// Waits until fetch `sequence` (or a later one) has been processed.
    async fn await_sequence(&self, sequence: u64) -> Result<PipelineView, ApiError> {
        let mut settled = self.inner.settled.subscribe();
        settled
            .wait_for(|settled| *settled >= sequence)
            .await
            .map_err(|_| ApiError::ShutDown)?;

        let runtime = self.inner.runtime.lock().await;
        if runtime.shut_down {
            return Err(ApiError::ShutDown);
        }

        let core: &CoordinatorState = &runtime.core;
        let fresh: bool = core
            .current
            .as_ref()
            .is_some_and(|applied| applied.sequence >= sequence);

        if fresh {
            return Ok(core.view());
        }

        let period: PeriodKey = core.active_period.ok_or(ApiError::NoActivePeriod)?;
        Err(translate_core_error(CoreError::SnapshotUnavailable {
            period,
            reason: core
                .last_error
                .clone()
                .unwrap_or_else(|| String::from("fetch did not complete")),
        }))
    }
}

/// Applies a command, starts its effects and publishes the new view.
async fn dispatch(inner: &Arc<Inner>, command: Command) -> Result<Outcome, ApiError> {
    let mut runtime = inner.runtime.lock().await;
    if runtime.shut_down {
        return Err(ApiError::ShutDown);
    }

    let result: TransitionResult = apply(&runtime.core, command).map_err(translate_core_error)?;
    runtime.core = result.new_state;

    for effect in result.effects {
        execute(inner, &mut runtime, effect);
    }

    let view: PipelineView = runtime.core.view();
    inner.views.send_if_modified(|current| {
        if *current == view {
            false
        } else {
            *current = view;
            true
        }
    });

    Ok(result.outcome)
}

fn execute(inner: &Arc<Inner>, runtime: &mut Runtime, effect: Effect) {
    match effect {
        Effect::Fetch(ticket) => {
            spawn_fetch(inner, ticket, runtime.generation_token.child_token());
        }
        Effect::CancelGeneration { generation } => {
            debug!(generation, "Cancelling generation");
            runtime.generation_token.cancel();
            runtime.generation_token = CancellationToken::new();
            runtime.poll_token = None;
        }
        Effect::StartPolling { period, generation } => {
            if let Some(previous) = runtime.poll_token.take() {
                previous.cancel();
            }
            let token: CancellationToken = runtime.generation_token.child_token();
            spawn_poller(inner, period, generation, token.clone());
            runtime.poll_token = Some(token);
        }
        Effect::StopPolling => {
            if let Some(token) = runtime.poll_token.take() {
                token.cancel();
            }
        }
    }
}

fn spawn_fetch(inner: &Arc<Inner>, ticket: FetchTicket, token: CancellationToken) {
    let inner: Arc<Inner> = Arc::clone(inner);

    tokio::spawn(async move {
        let result = tokio::select! {
            () = token.cancelled() => {
                debug!(
                    period = %ticket.period,
                    sequence = ticket.sequence,
                    "Fetch cancelled"
                );
                return;
            }
            result = fetch_snapshot(inner.backend.as_ref(), ticket.period) => result,
        };

        let command: Command = match result {
            Ok(snapshot) => Command::FetchSucceeded {
                ticket,
                snapshot,
                fetched_at: OffsetDateTime::now_utc(),
            },
            Err(err) => Command::FetchFailed {
                ticket,
                reason: err.to_string(),
            },
        };

        if let Err(err) = dispatch(&inner, command).await {
            debug!(error = %err, "Fetch result not applied");
        }

        inner
            .settled
            .send_modify(|settled| *settled = (*settled).max(ticket.sequence));
    });
}

fn spawn_poller(inner: &Arc<Inner>, period: PeriodKey, generation: u64, token: CancellationToken) {
    let inner: Arc<Inner> = Arc::clone(inner);
    let every = inner.config.poll_interval;

    tokio::spawn(async move {
        debug!(period = %period, generation, "Polling started");

        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(err) = dispatch(&inner, Command::PollTick).await {
                        debug!(error = %err, "Poll tick rejected");
                        break;
                    }
                }
            }
        }

        debug!(period = %period, generation, "Polling stopped");
    });
}
