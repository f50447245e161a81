use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{EmotionTag, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// The single contract invocation sent to the wallet: exactly five string fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCall {
    pub name: String,
    pub description: String,
    pub uri: String,
    pub emotion_tag: String,
    pub creature_emoji: String,
}

impl MintCall {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        uri: impl Into<String>,
        emotion_tag: EmotionTag,
        creature_emoji: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            uri: uri.into(),
            emotion_tag: emotion_tag.as_str().to_string(),
            creature_emoji: creature_emoji.into(),
        }
    }

    /// Arguments in contract order.
    pub fn arguments(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.description.as_str(),
            self.uri.as_str(),
            self.emotion_tag.as_str(),
            self.creature_emoji.as_str(),
        ]
    }
}

/// Whatever the wallet reported back. Wallet SDKs disagree on field names, so the
/// transaction id and the diagnostics are read from their common spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawWalletResponse")]
pub struct WalletResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Value>,
}

/// Every spelling seen in the wild, kept apart so a reply carrying two of them
/// still parses. Earlier fields win.
#[derive(Deserialize)]
struct RawWalletResponse {
    #[serde(default, rename = "transactionId")]
    transaction_id_camel: Option<Value>,
    #[serde(default, rename = "transaction_id")]
    transaction_id_snake: Option<Value>,
    #[serde(default)]
    digest: Option<Value>,
    #[serde(default, rename = "txHash")]
    tx_hash: Option<Value>,
    #[serde(default)]
    diagnostics: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    }
}

impl From<RawWalletResponse> for WalletResponse {
    fn from(raw: RawWalletResponse) -> Self {
        let transaction_id = [
            raw.transaction_id_camel,
            raw.transaction_id_snake,
            raw.digest,
            raw.tx_hash,
        ]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            Value::String(id) if !id.trim().is_empty() => Some(id),
            _ => None,
        });
        let diagnostics = [raw.diagnostics, raw.error, raw.message]
            .into_iter()
            .flatten()
            .find(is_present);
        Self {
            transaction_id,
            diagnostics,
        }
    }
}

impl WalletResponse {
    pub fn with_transaction(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(diagnostics: impl Into<String>) -> Self {
        Self {
            transaction_id: None,
            diagnostics: Some(Value::String(diagnostics.into())),
        }
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(TransactionId::new)
    }

    pub fn diagnostic_text(&self) -> Option<String> {
        match self.diagnostics.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(Value::Object(map.clone()).to_string())),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_transaction_id_from_common_spellings() {
        for raw in [
            r#"{"transactionId":"0xabc"}"#,
            r#"{"digest":"0xabc"}"#,
            r#"{"txHash":"0xabc"}"#,
        ] {
            let response: WalletResponse = serde_json::from_str(raw).expect("parse");
            assert_eq!(response.transaction_id(), Some(TransactionId::new("0xabc")));
        }
    }

    #[test]
    fn several_spellings_in_one_reply_still_parse() {
        let both: WalletResponse =
            serde_json::from_str(r#"{"digest":"0xdef","transactionId":"0xabc"}"#).expect("parse");
        assert_eq!(both.transaction_id(), Some(TransactionId::new("0xabc")));

        let blank_first: WalletResponse =
            serde_json::from_str(r#"{"transactionId":"","digest":"0xdef"}"#).expect("parse");
        assert_eq!(blank_first.transaction_id(), Some(TransactionId::new("0xdef")));

        let rejected: WalletResponse =
            serde_json::from_str(r#"{"error":{"code":4001},"message":"User rejected"}"#)
                .expect("parse");
        assert_eq!(rejected.transaction_id(), None);
        assert_eq!(
            rejected.diagnostic_text().as_deref(),
            Some(r#"{"code":4001}"#)
        );

        let null_error: WalletResponse =
            serde_json::from_str(r#"{"error":null,"message":"User rejected"}"#).expect("parse");
        assert_eq!(null_error.diagnostic_text().as_deref(), Some("User rejected"));
    }

    #[test]
    fn serializes_with_canonical_field_names() {
        let json = serde_json::to_value(WalletResponse::with_transaction("0xabc")).expect("json");
        assert_eq!(json, serde_json::json!({ "transactionId": "0xabc" }));
    }

    #[test]
    fn blank_transaction_id_counts_as_missing() {
        let response: WalletResponse =
            serde_json::from_str(r#"{"transactionId":"  "}"#).expect("parse");
        assert_eq!(response.transaction_id(), None);
    }

    #[test]
    fn extracts_diagnostics_from_strings_and_objects() {
        let text: WalletResponse =
            serde_json::from_str(r#"{"error":"user rejected"}"#).expect("parse");
        assert_eq!(text.diagnostic_text().as_deref(), Some("user rejected"));

        let nested: WalletResponse =
            serde_json::from_str(r#"{"error":{"code":4001,"message":"denied"}}"#).expect("parse");
        assert_eq!(nested.diagnostic_text().as_deref(), Some("denied"));

        let empty: WalletResponse = serde_json::from_str("{}").expect("parse");
        assert_eq!(empty.diagnostic_text(), None);
    }

    #[test]
    fn mint_call_keeps_contract_argument_order() {
        let call = MintCall::new("n", "d", "u", EmotionTag::Rage, "🐯");
        assert_eq!(call.arguments(), ["n", "d", "u", "RAGE", "🐯"]);
    }
}
