//! Dispatcher - Plan Execution with Bounded Retry
//!
//! Delivers planned gifts one at a time, in plan order. Retryable failures
//! are retried with a fixed delay up to the attempt ceiling; a rejection
//! or an exhausted item halts the sequence and every later entry is
//! reported as not attempted. The ledger is never touched here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::EngineConfig;
use crate::domain::gift::AccountId;
use crate::domain::plan::{AcquisitionPlan, AcquisitionResult, DeliveryRecord, DeliveryStatus};
use crate::ports::acquisition::{AcquisitionApi, DeliveryError};

/// Executes acquisition plans against the acquisition API.
pub struct Dispatcher<A: AcquisitionApi> {
    api: Arc<A>,
    /// Attempt ceiling per planned gift.
    max_attempts: u32,
    /// Fixed pause between attempts.
    retry_delay: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl<A: AcquisitionApi> Dispatcher<A> {
    /// Create a dispatcher from the engine retry policy.
    pub fn new(api: Arc<A>, config: &EngineConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            api,
            max_attempts: config.max_delivery_attempts.max(1),
            retry_delay: config.retry_delay(),
            metrics,
        }
    }

    /// Deliver every planned gift until the plan completes or an item fails.
    ///
    /// Never fails as a whole: a halting failure is reported through
    /// `AcquisitionResult::failure` alongside the successes so far.
    #[instrument(skip(self, plan), fields(planned = plan.len()))]
    pub async fn dispatch(
        &self,
        account_id: AccountId,
        plan: &AcquisitionPlan,
    ) -> AcquisitionResult {
        let mut result = AcquisitionResult {
            records: Vec::with_capacity(plan.len()),
            failure: None,
        };

        for item in &plan.items {
            if result.failure.is_some() {
                result.records.push(DeliveryRecord {
                    gift_id: item.gift_id.clone(),
                    price: item.price,
                    status: DeliveryStatus::NotAttempted,
                    attempts: 0,
                });
                continue;
            }

            let (outcome, attempts) = self.deliver_with_retry(account_id, &item.gift_id).await;

            let status = match outcome {
                Ok(()) => {
                    info!(
                        gift_id = %item.gift_id,
                        price = item.price,
                        attempts,
                        "Gift delivered"
                    );
                    self.metrics.gifts_delivered.inc();
                    DeliveryStatus::Delivered
                }
                Err(e) => {
                    let reason = if e.is_retryable() { "exhausted" } else { "rejected" };
                    error!(
                        gift_id = %item.gift_id,
                        attempts,
                        error = %e,
                        "Gift delivery failed, halting remaining plan"
                    );
                    self.metrics.delivery_failures.with_label_values(&[reason]).inc();
                    result.failure = Some(format!(
                        "gift {} failed after {attempts} attempt(s): {e}",
                        item.gift_id
                    ));
                    DeliveryStatus::Failed
                }
            };

            result.records.push(DeliveryRecord {
                gift_id: item.gift_id.clone(),
                price: item.price,
                status,
                attempts,
            });
        }

        result
    }

    /// Attempt one delivery, retrying retryable errors. Returns the final
    /// outcome and the number of attempts made.
    async fn deliver_with_retry(
        &self,
        account_id: AccountId,
        gift_id: &str,
    ) -> (Result<(), DeliveryError>, u32) {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.api.deliver(gift_id, account_id).await {
                Ok(()) => return (Ok(()), attempt),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay_ms =
                        u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX);
                    warn!(
                        gift_id = %gift_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        delay_ms,
                        "Delivery attempt failed, retrying"
                    );
                    self.metrics.delivery_retries.inc();
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::plan::PlannedItem;

    /// Scripted API: pops one outcome per call, succeeds once the script runs dry.
    struct ScriptedApi {
        script: Mutex<VecDeque<Result<(), DeliveryError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(script: Vec<Result<(), DeliveryError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AcquisitionApi for ScriptedApi {
        async fn deliver(
            &self,
            gift_id: &str,
            _account_id: AccountId,
        ) -> Result<(), DeliveryError> {
            self.calls.lock().unwrap().push(gift_id.to_string());
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn config(attempts: u32) -> EngineConfig {
        EngineConfig {
            max_delivery_attempts: attempts,
            retry_delay_ms: 0,
            ..EngineConfig::default()
        }
    }

    fn plan(ids: &[(&str, u64)]) -> AcquisitionPlan {
        AcquisitionPlan {
            items: ids
                .iter()
                .map(|(id, price)| PlannedItem {
                    gift_id: (*id).to_string(),
                    price: *price,
                })
                .collect(),
            total_cost: ids.iter().map(|(_, p)| p).sum(),
            cycles_used: 1,
        }
    }

    fn metrics() -> Arc<MetricsRegistry> {
        Arc::new(MetricsRegistry::new().unwrap())
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let api = Arc::new(ScriptedApi::new(vec![
            Err(DeliveryError::Retryable("timeout".into())),
            Err(DeliveryError::Retryable("429".into())),
        ]));
        let dispatcher = Dispatcher::new(Arc::clone(&api), &config(5), metrics());

        let result = dispatcher.dispatch(7, &plan(&[("a", 10)])).await;
        assert_eq!(result.records[0].status, DeliveryStatus::Delivered);
        assert_eq!(result.records[0].attempts, 3);
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_exhausted_retries_halt_plan() {
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(()),
            Err(DeliveryError::Retryable("down".into())),
            Err(DeliveryError::Retryable("down".into())),
            Err(DeliveryError::Retryable("down".into())),
        ]));
        let dispatcher = Dispatcher::new(Arc::clone(&api), &config(3), metrics());

        let result = dispatcher
            .dispatch(7, &plan(&[("a", 10), ("b", 20), ("c", 30)]))
            .await;

        let statuses: Vec<_> = result.records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                DeliveryStatus::Delivered,
                DeliveryStatus::Failed,
                DeliveryStatus::NotAttempted
            ]
        );
        assert_eq!(result.records[1].attempts, 3);
        assert_eq!(api.calls.lock().unwrap().len(), 4);
        assert_eq!(result.delivered_total(), 10);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let api = Arc::new(ScriptedApi::new(vec![Err(DeliveryError::Rejected(
            "sold out".into(),
        ))]));
        let dispatcher = Dispatcher::new(Arc::clone(&api), &config(60), metrics());

        let result = dispatcher.dispatch(7, &plan(&[("a", 10), ("b", 20)])).await;
        assert_eq!(result.records[0].status, DeliveryStatus::Failed);
        assert_eq!(result.records[0].attempts, 1);
        assert_eq!(result.records[1].status, DeliveryStatus::NotAttempted);
        assert_eq!(api.calls.lock().unwrap().as_slice(), ["a"]);
        assert!(result.failure.unwrap().contains("sold out"));
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let api = Arc::new(ScriptedApi::new(vec![]));
        let dispatcher = Dispatcher::new(api, &config(60), metrics());
        let result = dispatcher.dispatch(7, &AcquisitionPlan::default()).await;
        assert!(result.records.is_empty());
    }
}
