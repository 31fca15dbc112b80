//! Account notifications over `sendMessage`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::gift::AccountId;
use crate::ports::notifier::{Notifier, NotifyError};

use super::client::BotApiClient;
use super::types::SendMessageRequest;

pub struct TelegramNotifier {
    client: Arc<BotApiClient>,
}

impl TelegramNotifier {
    pub fn new(client: Arc<BotApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip(self, message))]
    async fn notify(&self, account_id: AccountId, message: &str) -> Result<(), NotifyError> {
        let request = SendMessageRequest {
            chat_id: account_id,
            text: message,
        };
        self.client
            .call::<_, serde_json::Value>("sendMessage", &request)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}
