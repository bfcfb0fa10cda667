use crate::core::backend::{error_message, path_segment, BackendClient};
use crate::core::{Conversion, Currency, Transfer, WalletBalance, WalletResponse};
use crate::utils::validation::{validate_non_empty_string, validate_positive_amount};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Wallet operations against the backend.
///
/// Every call is an independent round-trip. Failures are never returned as
/// `Err`; they come back as `WalletResponse { success: false, .. }`.
#[derive(Debug, Clone)]
pub struct WalletClient {
    backend: BackendClient,
}

impl WalletClient {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Wallet client acting with the caller's credentials.
    pub fn authorized(&self, headers: &HeaderMap) -> Self {
        Self::new(self.backend.authorized(headers))
    }

    pub async fn get_balance(&self, user_id: &str) -> WalletResponse<WalletBalance> {
        let user_id = match path_segment("userId", user_id) {
            Ok(segment) => segment,
            Err(e) => return WalletResponse::failure(e.to_string()),
        };

        let path = format!("wallet/{}/balance", user_id);
        self.call(Method::GET, &path, None, "Balance fetched").await
    }

    pub async fn add_funds(
        &self,
        user_id: &str,
        amount: f64,
        currency: Currency,
    ) -> WalletResponse<WalletBalance> {
        if let Err(e) = validate_non_empty_string("userId", user_id)
            .and_then(|_| validate_positive_amount("amount", amount))
        {
            return WalletResponse::failure(e.to_string());
        }

        let body = json!({ "userId": user_id, "amount": amount, "currency": currency });
        self.call(Method::POST, "wallet/add", Some(body), "Funds added").await
    }

    pub async fn transfer_funds(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        amount: f64,
        currency: Currency,
    ) -> WalletResponse<Transfer> {
        if let Err(e) = validate_non_empty_string("fromUserId", from_user_id)
            .and_then(|_| validate_non_empty_string("toUserId", to_user_id))
            .and_then(|_| validate_positive_amount("amount", amount))
        {
            return WalletResponse::failure(e.to_string());
        }
        if from_user_id == to_user_id {
            return WalletResponse::failure("Cannot transfer funds to the same wallet");
        }

        let body = json!({
            "fromUserId": from_user_id,
            "toUserId": to_user_id,
            "amount": amount,
            "currency": currency,
        });
        self.call(Method::POST, "wallet/transfer", Some(body), "Transfer completed")
            .await
    }

    pub async fn convert_currency(
        &self,
        user_id: &str,
        from: Currency,
        to: Currency,
        amount: f64,
    ) -> WalletResponse<Conversion> {
        if let Err(e) = validate_non_empty_string("userId", user_id)
            .and_then(|_| validate_positive_amount("amount", amount))
        {
            return WalletResponse::failure(e.to_string());
        }
        if from == to {
            return WalletResponse::failure(format!("Nothing to convert: both sides are {}", from));
        }

        let body = json!({ "userId": user_id, "from": from, "to": to, "amount": amount });
        self.call(Method::POST, "wallet/convert", Some(body), "Currency converted")
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        default_message: &str,
    ) -> WalletResponse<T> {
        let (status, body) = self.backend.forward(method, path, None, body).await;

        if !status.is_success() {
            let message = error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            tracing::warn!("Wallet call {} failed: {}", path, message);
            return WalletResponse::failure(message);
        }

        // 後端可能回傳 {success, message, data} 或直接回傳資料
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return WalletResponse::failure(
                error_message(&body).unwrap_or_else(|| "Wallet request was rejected".to_string()),
            );
        }
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default_message)
            .to_string();
        let data = match body.get("data") {
            Some(data) => data.clone(),
            None => body,
        };

        match serde_json::from_value(data) {
            Ok(data) => WalletResponse::ok(message, data),
            Err(e) => {
                tracing::warn!("Unexpected wallet response for {}: {}", path, e);
                WalletResponse::failure(format!("Unexpected wallet response: {}", e))
            }
        }
    }
}
