//! Turn scheduler: the sole mutator of per-group turn state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::RetryPolicy;
use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::error::SchedulerError;
use crate::core::roster::{Roster, RosterEvent};
use crate::core::state::{AcquireOutcome, Member, Role, TurnState};
use crate::infra::store::{Mutation, TurnStore};
use crate::util::clock::now_ms;
use crate::util::ids::{GroupId, MemberId};

/// Abstraction for spawning background work on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Transactional turn-taking over one shared resource per group.
///
/// Every operation is a single read-modify-write against the group's record:
/// the mutation closure re-reads the freshest committed state inside the
/// transaction, so client-cached views are never trusted. Operations on the
/// same group serialize through the store; operations on different groups are
/// independent. `TransactionConflict` results are retried with bounded
/// exponential backoff before surfacing.
///
/// Queue ordering is strictly FIFO by enqueue time. There is no priority,
/// per-member quota, or anti-starvation beyond that ordering; this mirrors
/// the product's deliberate simplicity and is a known limitation.
pub struct TurnScheduler<S, R> {
    store: Arc<S>,
    roster: Arc<R>,
    retry: RetryPolicy,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl<S, R> TurnScheduler<S, R>
where
    S: TurnStore,
    R: Roster,
{
    /// Create a scheduler over a store and roster.
    pub fn new(store: Arc<S>, roster: Arc<R>, retry: RetryPolicy) -> Self {
        Self {
            store,
            roster,
            retry,
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// The backing store, for opening subscriptions.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The membership source of truth.
    pub fn roster(&self) -> &Arc<R> {
        &self.roster
    }

    /// Run one transactional mutation with conflict retry.
    async fn transact(
        &self,
        group: &GroupId,
        apply: Mutation<'_>,
    ) -> Result<TurnState, SchedulerError> {
        let mut attempt = 0;
        loop {
            match self.store.read_modify_write(group, &mut *apply).await {
                Err(e) if e.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    tracing::debug!(
                        group = %group,
                        attempt,
                        ?delay,
                        "transaction conflict, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Take the resource if free, otherwise join the FIFO queue.
    ///
    /// Idempotent: a caller already holding or already queued gets their
    /// existing role and position back without any state change. Queued
    /// positions are 1-based.
    ///
    /// # Errors
    ///
    /// `NotAMember` when the caller is not on the group's roster;
    /// `TransactionConflict` when retries are exhausted; `StoreUnavailable`
    /// on connectivity failure.
    pub async fn acquire(
        &self,
        group: &GroupId,
        member_id: &MemberId,
        hold: Duration,
        now_ms: u128,
    ) -> Result<AcquireOutcome, SchedulerError> {
        let member = self
            .roster
            .member(group, member_id)
            .await?
            .ok_or_else(|| SchedulerError::NotAMember(member_id.clone()))?;

        let mut outcome: Option<AcquireOutcome> = None;
        let mut transition: Option<&'static str> = None;
        self.transact(group, &mut |state| {
            transition = None;
            if let Some(existing) = state.role_of(member_id) {
                outcome = Some(existing);
                return Ok(());
            }
            if state.holder.is_none() {
                state.seat_holder(member.clone(), hold, now_ms);
                outcome = Some(AcquireOutcome {
                    role: Role::Holder,
                    position: None,
                });
                transition = Some("acquire");
            } else {
                let position = state.enqueue(member.clone(), now_ms);
                outcome = Some(AcquireOutcome {
                    role: Role::Queued,
                    position: Some(position),
                });
                transition = Some("enqueue");
            }
            Ok(())
        })
        .await?;

        // The closure always records an outcome on the success path.
        let outcome = outcome.ok_or_else(|| {
            SchedulerError::StoreUnavailable("transaction returned no outcome".into())
        })?;
        match transition {
            Some(action) => {
                tracing::info!(group = %group, member = %member_id, ?outcome, "acquire committed");
                self.record_audit(group, Some(member_id.clone()), action);
            }
            None => {
                tracing::debug!(group = %group, member = %member_id, ?outcome, "acquire was idempotent repeat");
            }
        }
        Ok(outcome)
    }

    /// Voluntarily give the resource up and promote the queue head, if any,
    /// in the same atomic step. Counts one completed holding period for the
    /// caller.
    ///
    /// # Errors
    ///
    /// `NotHolder` when the caller does not hold the resource (state is left
    /// untouched); store errors as for [`Self::acquire`].
    pub async fn release(
        &self,
        group: &GroupId,
        member_id: &MemberId,
        hold: Duration,
        now_ms: u128,
    ) -> Result<(), SchedulerError> {
        let mut promoted: Option<Member> = None;
        self.transact(group, &mut |state| {
            promoted = None;
            if !state.is_holder(member_id) {
                return Err(SchedulerError::NotHolder(member_id.clone()));
            }
            state.record_usage(member_id);
            promoted = state.clear_and_promote(hold, now_ms);
            Ok(())
        })
        .await?;

        tracing::info!(group = %group, member = %member_id, "released");
        self.record_audit(group, Some(member_id.clone()), "release");
        if let Some(next) = promoted {
            tracing::info!(group = %group, member = %next.id, "promoted from queue head");
            self.record_audit(group, Some(next.id), "promote");
        }
        Ok(())
    }

    /// Clear an expired holder and promote the queue head, if any.
    ///
    /// Idempotent and safe to invoke redundantly from any number of racing
    /// expiry watchers: when the holder is absent or not yet expired this is
    /// a no-op returning `None`, never an error. Exactly one racing caller
    /// performs the transition, and the expired holder's usage counter is
    /// incremented exactly once per holding period.
    ///
    /// Returns the promoted member, if a transition promoted one.
    pub async fn expire_and_promote(
        &self,
        group: &GroupId,
        hold: Duration,
        now_ms: u128,
    ) -> Result<Option<Member>, SchedulerError> {
        let mut promoted: Option<Member> = None;
        let mut expired: Option<MemberId> = None;
        self.transact(group, &mut |state| {
            promoted = None;
            expired = None;
            match &state.holder {
                Some(h) if h.expires_at_ms <= now_ms => {
                    let id = h.member.id.clone();
                    state.record_usage(&id);
                    expired = Some(id);
                    promoted = state.clear_and_promote(hold, now_ms);
                    Ok(())
                }
                // Already handled by another caller, or released first.
                _ => Ok(()),
            }
        })
        .await?;

        if let Some(member) = expired {
            tracing::info!(group = %group, member = %member, "holding period expired");
            self.record_audit(group, Some(member), "expire");
        }
        if let Some(next) = &promoted {
            tracing::info!(group = %group, member = %next.id, "promoted from queue head");
            self.record_audit(group, Some(next.id.clone()), "promote");
        }
        Ok(promoted)
    }

    /// Scrub a departed member from the turn state.
    ///
    /// Invoked by the roster cascade when a member is kicked or leaves. A
    /// queued entry is erased with relative order of the rest preserved; a
    /// departing holder is cleared and the queue head promoted exactly as in
    /// [`Self::release`], except that no usage is counted for an involuntary
    /// removal. No-op when the member appears nowhere.
    ///
    /// # Errors
    ///
    /// Store errors as for [`Self::acquire`].
    pub async fn remove_member(
        &self,
        group: &GroupId,
        member_id: &MemberId,
        hold: Duration,
        now_ms: u128,
    ) -> Result<(), SchedulerError> {
        let mut promoted: Option<Member> = None;
        let mut removed = false;
        self.transact(group, &mut |state| {
            promoted = None;
            removed = state.remove_from_queue(member_id);
            if state.is_holder(member_id) {
                promoted = state.clear_and_promote(hold, now_ms);
                removed = true;
            }
            Ok(())
        })
        .await?;

        if removed {
            tracing::info!(group = %group, member = %member_id, "removed from turn state");
            self.record_audit(group, Some(member_id.clone()), "remove");
        }
        if let Some(next) = promoted {
            tracing::info!(group = %group, member = %next.id, "promoted from queue head");
            self.record_audit(group, Some(next.id), "promote");
        }
        Ok(())
    }

    /// Record an audit event (sync operation with parking_lot mutex).
    fn record_audit(&self, group: &GroupId, member: Option<MemberId>, action: &str) {
        if let Some(audit_sink) = &self.audit {
            let mut sink = audit_sink.lock();
            sink.record(build_audit_event(group.clone(), member, action));
        }
    }
}

/// Bridge roster removal events into [`TurnScheduler::remove_member`].
///
/// The scheduler never decides membership; this loop consumes the roster's
/// event stream and cascades each removal into the turn state. It exits when
/// the roster side of the channel closes.
pub fn drive_removals<S, R, Sp>(
    scheduler: Arc<TurnScheduler<S, R>>,
    hold: Duration,
    spawner: &Sp,
) where
    S: TurnStore,
    R: Roster,
    Sp: Spawn,
{
    let mut events = scheduler.roster().events();
    spawner.spawn(async move {
        loop {
            match events.recv().await {
                Ok(RosterEvent::Removed { group, member }) => {
                    if let Err(e) = scheduler
                        .remove_member(&group, &member, hold, now_ms())
                        .await
                    {
                        tracing::error!(group = %group, member = %member, error = %e, "removal cascade failed");
                    }
                }
                Ok(RosterEvent::Joined { .. }) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "removal cascade lagged behind roster events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
