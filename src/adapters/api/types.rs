//! Bot API Request/Response Types
//!
//! Serialization types for the Telegram Bot API methods the engine calls.
//! Every response is wrapped in the standard `{ ok, result, ... }` envelope.

use serde::{Deserialize, Serialize};

use crate::domain::gift::CatalogItem;

/// Standard Bot API response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Method result, present when `ok`.
    pub result: Option<T>,
    /// Human-readable error, present when not `ok`.
    pub description: Option<String>,
    /// HTTP-like error code, present when not `ok`.
    pub error_code: Option<i64>,
    /// Extra error details (flood control).
    pub parameters: Option<ResponseParameters>,
}

/// Error details attached to some failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating the request.
    pub retry_after: Option<u64>,
}

/// `getAvailableGifts` result.
#[derive(Debug, Clone, Deserialize)]
pub struct Gifts {
    pub gifts: Vec<Gift>,
}

/// One gift as listed by the Bot API.
#[derive(Debug, Clone, Deserialize)]
pub struct Gift {
    /// Unique gift identifier.
    pub id: String,
    /// Stars the bot pays to send the gift.
    pub star_count: u64,
    /// Stars needed to upgrade the gift to a unique one.
    pub upgrade_star_count: Option<u64>,
    /// Total number of gifts that can be sent (limited gifts only).
    pub total_count: Option<u64>,
    /// Number of gifts still available (limited gifts only).
    pub remaining_count: Option<u64>,
}

impl From<Gift> for CatalogItem {
    fn from(gift: Gift) -> Self {
        Self {
            id: gift.id,
            price: gift.star_count,
            total_supply: gift.total_count,
            remaining_supply: gift.remaining_count,
        }
    }
}

/// `sendGift` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct SendGiftRequest<'a> {
    pub user_id: i64,
    pub gift_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

/// `sendMessage` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

/// Parameterless request body.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_list_deserialization() {
        let json = r#"{
            "ok": true,
            "result": {
                "gifts": [
                    {"id": "5170145012310081615", "sticker": {}, "star_count": 15},
                    {"id": "5168043875654172773", "sticker": {}, "star_count": 50,
                      "upgrade_star_count": 25, "total_count": 500000, "remaining_count": 1234}
                ]
            }
        }"#;

        let resp: ApiResponse<Gifts> = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        let items: Vec<CatalogItem> = resp
            .result
            .unwrap()
            .gifts
            .into_iter()
            .map(Into::into)
            .collect();
        assert!(!items[0].is_limited());
        assert!(items[1].is_limited());
        assert_eq!(items[1].price, 50);
        assert_eq!(items[1].remaining_supply, Some(1234));
    }

    #[test]
    fn test_error_envelope_deserialization() {
        let json = r#"{"ok": false, "error_code": 429,
            "description": "Too Many Requests: retry after 3",
            "parameters": {"retry_after": 3}}"#;
        let resp: ApiResponse<bool> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(429));
        assert_eq!(resp.parameters.unwrap().retry_after, Some(3));
    }

    #[test]
    fn test_send_gift_omits_empty_text() {
        let req = SendGiftRequest {
            user_id: 42,
            gift_id: "g1",
            text: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"user_id":42,"gift_id":"g1"}"#);
    }
}
