//! Signal → sized order pipeline.
//!
//! Validation runs before any state is touched. The load / daily-reset /
//! resize / persist sequence is one critical section, so concurrent
//! webhooks cannot lose an increment. The broker call happens after the
//! lock is released and after the new streak is on disk.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::{OrderRequest, Signal, SizingState, WebhookPayload};
use crate::error::Result;
use crate::exchange::{BrokerResponse, OrderDispatcher};
use crate::persistence::StateStore;
use crate::sizing::{compute_quantity, Clock, ResetPolicy};

/// Everything that happened for one accepted signal
#[derive(Debug, Clone)]
pub struct SignalOutcome {
    pub order: OrderRequest,
    /// State as persisted before dispatch
    pub state: SizingState,
    /// Whether the daily reset fired on this signal
    pub reset: bool,
    pub response: BrokerResponse,
}

pub struct SignalProcessor {
    store: Arc<dyn StateStore>,
    dispatcher: Arc<dyn OrderDispatcher>,
    clock: Arc<dyn Clock>,
    policy: ResetPolicy,
    default_symbol: String,
    sizing_lock: Mutex<()>,
}

impl SignalProcessor {
    pub fn new(
        store: Arc<dyn StateStore>,
        dispatcher: Arc<dyn OrderDispatcher>,
        clock: Arc<dyn Clock>,
        policy: ResetPolicy,
        default_symbol: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            policy,
            default_symbol: default_symbol.into(),
            sizing_lock: Mutex::new(()),
        }
    }

    /// Validate a raw webhook body, then size and dispatch it
    pub async fn handle_payload(&self, payload: &WebhookPayload) -> Result<SignalOutcome> {
        let signal = Signal::from_payload(payload, &self.default_symbol)?;
        self.process(&signal).await
    }

    pub async fn process(&self, signal: &Signal) -> Result<SignalOutcome> {
        let (order, state, reset) = self.size(signal).await?;

        let response = self.dispatcher.dispatch(&order).await.map_err(|e| {
            warn!(
                symbol = %order.symbol,
                side = %order.side,
                qty = order.qty,
                error = %e,
                "order dispatch failed after streak was persisted"
            );
            e
        })?;

        Ok(SignalOutcome {
            order,
            state,
            reset,
            response,
        })
    }

    async fn size(&self, signal: &Signal) -> Result<(OrderRequest, SizingState, bool)> {
        let _guard = self.sizing_lock.lock().await;

        let now = self.clock.now();
        let mut state = self.store.load(now.date()).await;

        let reset = self.policy.maybe_reset(&mut state, now);
        if reset {
            self.store.save(&state).await?;
        }

        let qty = compute_quantity(&mut state, signal.direction, signal.multiplier);
        self.store.save(&state).await?;

        info!(
            symbol = %signal.symbol,
            direction = %signal.direction,
            multiplier = signal.multiplier,
            streak = state.streak_count,
            qty,
            reset,
            "signal sized"
        );

        Ok((
            OrderRequest::market(signal.symbol.clone(), qty, signal.direction),
            state,
            reset,
        ))
    }

    /// Stored state, without running the reset policy
    pub async fn current_state(&self) -> Result<Option<SizingState>> {
        self.store.peek().await
    }

    /// Hard reset: replace the record with a fresh default
    pub async fn reset_state(&self) -> Result<SizingState> {
        let _guard = self.sizing_lock.lock().await;
        let state = SizingState::new(self.clock.now().date());
        self.store.save(&state).await?;
        info!(state = %state, "sizing state manually reset");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::error::PyramidError;
    use crate::exchange::MockOrderDispatcher;
    use crate::persistence::MemoryStateStore;
    use crate::sizing::FixedClock;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::json;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn echo_dispatcher() -> MockOrderDispatcher {
        let mut mock = MockOrderDispatcher::new();
        mock.expect_dispatch()
            .returning(|order| Ok(BrokerResponse::new(200, json!({ "qty": order.qty }))));
        mock
    }

    fn processor(
        store: Arc<MemoryStateStore>,
        dispatcher: MockOrderDispatcher,
        clock: Arc<FixedClock>,
    ) -> SignalProcessor {
        SignalProcessor::new(store, Arc::new(dispatcher), clock, ResetPolicy::default(), "SPY")
    }

    fn payload(body: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(body).unwrap()
    }

    fn state(direction: Direction, count: u32, reset_day: u32) -> SizingState {
        SizingState {
            last_direction: Some(direction),
            streak_count: count,
            last_reset_date: NaiveDate::from_ymd_opt(2024, 3, reset_day),
        }
    }

    #[tokio::test]
    async fn continuation_sizes_up_and_persists_before_dispatch() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Buy, 3, 1)));
        let observed = Arc::clone(&store);

        let mut mock = MockOrderDispatcher::new();
        mock.expect_dispatch()
            .withf(|order| {
                order.side == Direction::Buy && order.qty == 8 && order.symbol == "SPY"
            })
            .times(1)
            .returning(move |_| {
                // Streak must already be on disk when the broker is called
                let persisted = observed.snapshot().unwrap();
                assert_eq!(persisted.streak_count, 4);
                Ok(BrokerResponse::new(200, json!({"id": "order-1"})))
            });

        let clock = Arc::new(FixedClock::new(at(1, 10, 0, 0)));
        let p = processor(Arc::clone(&store), mock, clock);

        let outcome = p
            .handle_payload(&payload(json!({"transaction_type": "buy", "multiplier": 2})))
            .await
            .unwrap();

        assert_eq!(outcome.order.qty, 8);
        assert!(!outcome.reset);
        assert_eq!(outcome.response.body["id"], "order-1");
        assert_eq!(store.snapshot().unwrap(), state(Direction::Buy, 4, 1));
    }

    #[tokio::test]
    async fn reversal_collapses_to_one_unit() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Buy, 4, 1)));
        let clock = Arc::new(FixedClock::new(at(1, 12, 0, 0)));
        let p = processor(Arc::clone(&store), echo_dispatcher(), clock);

        let outcome = p
            .process(&Signal::new(Direction::Sell, "SPY", 2))
            .await
            .unwrap();

        assert_eq!(outcome.order.qty, 2);
        assert_eq!(outcome.order.side, Direction::Sell);
        assert_eq!(store.snapshot().unwrap(), state(Direction::Sell, 1, 1));
    }

    #[tokio::test]
    async fn rejected_signal_leaves_state_untouched() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Buy, 2, 1)));
        let mut mock = MockOrderDispatcher::new();
        mock.expect_dispatch().never();
        let clock = Arc::new(FixedClock::new(at(2, 9, 0, 0)));
        let p = processor(Arc::clone(&store), mock, clock);

        let err = p
            .handle_payload(&payload(json!({"transaction_type": "hold"})))
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.snapshot().unwrap(), state(Direction::Buy, 2, 1));
    }

    #[tokio::test]
    async fn first_signal_after_boundary_on_new_day_resets() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Buy, 5, 1)));
        let clock = Arc::new(FixedClock::new(at(2, 6, 0, 0)));
        let p = processor(Arc::clone(&store), echo_dispatcher(), Arc::clone(&clock));

        let outcome = p
            .process(&Signal::new(Direction::Buy, "SPY", 1))
            .await
            .unwrap();
        assert!(outcome.reset);
        assert_eq!(outcome.order.qty, 1);
        // reset persisted, then the sized state
        assert_eq!(store.save_count(), 2);

        clock.set(at(2, 7, 0, 0));
        let outcome = p
            .process(&Signal::new(Direction::Buy, "SPY", 1))
            .await
            .unwrap();
        assert!(!outcome.reset);
        assert_eq!(outcome.order.qty, 2);
    }

    #[tokio::test]
    async fn overnight_signal_before_boundary_keeps_streak() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Sell, 3, 1)));
        let clock = Arc::new(FixedClock::new(at(2, 5, 59, 59)));
        let p = processor(Arc::clone(&store), echo_dispatcher(), clock);

        let outcome = p
            .process(&Signal::new(Direction::Sell, "SPY", 1))
            .await
            .unwrap();
        assert!(!outcome.reset);
        assert_eq!(outcome.order.qty, 4);
    }

    #[tokio::test]
    async fn missing_state_starts_from_default() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(FixedClock::new(at(1, 10, 0, 0)));
        let p = processor(Arc::clone(&store), echo_dispatcher(), clock);

        let outcome = p
            .process(&Signal::new(Direction::Buy, "QQQ", 3))
            .await
            .unwrap();
        assert_eq!(outcome.order.qty, 3);
        assert_eq!(outcome.order.symbol, "QQQ");
        // default written back, then sized state
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.snapshot().unwrap(), state(Direction::Buy, 1, 1));
    }

    #[tokio::test]
    async fn save_failure_aborts_before_dispatch() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Buy, 1, 1)));
        store.set_fail_saves(true);
        let mut mock = MockOrderDispatcher::new();
        mock.expect_dispatch().never();
        let clock = Arc::new(FixedClock::new(at(1, 10, 0, 0)));
        let p = processor(Arc::clone(&store), mock, clock);

        let err = p
            .process(&Signal::new(Direction::Buy, "SPY", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PyramidError::Persistence(_)));
    }

    #[tokio::test]
    async fn dispatch_error_surfaces_but_streak_is_kept() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Buy, 1, 1)));
        let mut mock = MockOrderDispatcher::new();
        mock.expect_dispatch()
            .returning(|_| Err(PyramidError::Internal("connection refused".to_string())));
        let clock = Arc::new(FixedClock::new(at(1, 10, 0, 0)));
        let p = processor(Arc::clone(&store), mock, clock);

        assert!(p.process(&Signal::new(Direction::Buy, "SPY", 1)).await.is_err());
        assert_eq!(store.snapshot().unwrap().streak_count, 2);
    }

    #[tokio::test]
    async fn concurrent_signals_do_not_lose_increments() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(FixedClock::new(at(1, 10, 0, 0)));
        let p = Arc::new(processor(Arc::clone(&store), echo_dispatcher(), clock));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let p = Arc::clone(&p);
            handles.push(tokio::spawn(async move {
                p.process(&Signal::new(Direction::Buy, "SPY", 1))
                    .await
                    .unwrap()
                    .order
                    .qty
            }));
        }

        let mut quantities = Vec::new();
        for h in handles {
            quantities.push(h.await.unwrap());
        }
        quantities.sort_unstable();

        assert_eq!(quantities, (1..=16).collect::<Vec<u64>>());
        assert_eq!(store.snapshot().unwrap().streak_count, 16);
    }

    #[tokio::test]
    async fn manual_reset_writes_default() {
        let store = Arc::new(MemoryStateStore::with_state(state(Direction::Sell, 7, 1)));
        let clock = Arc::new(FixedClock::new(at(3, 12, 0, 0)));
        let mut mock = MockOrderDispatcher::new();
        mock.expect_dispatch().never();
        let p = processor(Arc::clone(&store), mock, clock);

        let st = p.reset_state().await.unwrap();
        assert_eq!(st, SizingState::new(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()));
        assert_eq!(p.current_state().await.unwrap(), Some(st));
    }
}
