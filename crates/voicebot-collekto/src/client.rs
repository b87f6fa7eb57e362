use crate::config::CollektoConfig;
use crate::crypto::encrypt_password;
use crate::error::CollektoError;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};
use voicebot_types::CustomerRecord;

pub const AUTH_PATH: &str = "/api/v2/profile/authenticate";
pub const LOAN_PATH: &str = "/crm/api/v1/loans/id";
pub const DISPOSITION_PATH: &str = "/api/v1/call-disposition/caseHistory";

/// Key under which the case history is attached to a fetched record.
pub const DISPOSITION_KEY: &str = "disposition";

/// Upper bound on error bodies copied into logs.
const MAX_LOGGED_BODY_BYTES: usize = 512;

/// Live client for the Collekto REST API.
#[derive(Debug, Clone)]
pub struct CollektoClient {
    http: reqwest::Client,
    config: CollektoConfig,
}

impl CollektoClient {
    pub fn new(config: CollektoConfig) -> Result<Self, CollektoError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("voicebot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Logs in and returns the bearer token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, CollektoError> {
        let encrypted = encrypt_password(password, &self.config.encryption_key)?;

        let response = self
            .http
            .post(self.url(AUTH_PATH))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "username": username, "password": encrypted }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %truncate(&body), "Collekto authentication rejected");
            return Err(CollektoError::Authentication(format!(
                "login returned status {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            CollektoError::Authentication(format!("malformed authentication response: {}", e))
        })?;

        body.pointer("/data/authenticationResult/bdInfoGHKey_1000")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                CollektoError::Authentication(
                    "malformed authentication response: token missing".to_string(),
                )
            })
    }

    /// Fetches loan details. The id is passed in the `id` header.
    pub async fn get_loan_by_id(&self, token: &str, id: &str) -> Result<Value, CollektoError> {
        self.get_json(LOAN_PATH, token, "id", id, "loan").await
    }

    /// Fetches the call-disposition (case) history for a loan number.
    pub async fn get_disposition_by_id(
        &self,
        token: &str,
        loan_id: &str,
    ) -> Result<Value, CollektoError> {
        self.get_json(DISPOSITION_PATH, token, "loanid", loan_id, "disposition")
            .await
    }

    async fn get_json(
        &self,
        path: &str,
        token: &str,
        id_header: &'static str,
        id: &str,
        what: &str,
    ) -> Result<Value, CollektoError> {
        let response = self
            .http
            .get(self.url(path))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .header(id_header, id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, id, body = %truncate(&body), "Collekto {} request failed", what);
            return Err(CollektoError::Api(format!(
                "failed to fetch {} {}: status {}",
                what, id, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CollektoError::Api(format!("invalid {} response for {}: {}", what, id, e)))
    }

    /// Runs the full lookup: login, loan by `system_id`, case history by
    /// `loan_id`.
    ///
    /// The loan's `data` object is flattened into the record; the case
    /// history is attached under [`DISPOSITION_KEY`].
    pub async fn fetch_customer(
        &self,
        loan_id: &str,
        system_id: &str,
    ) -> Result<CustomerRecord, CollektoError> {
        info!(loan_id, system_id, "fetching customer from Collekto");
        let token = self
            .authenticate(&self.config.username, &self.config.password)
            .await?;
        debug!("Collekto authentication succeeded");

        let loan = self.get_loan_by_id(&token, system_id).await?;
        let disposition = self.get_disposition_by_id(&token, loan_id).await?;

        let mut record = CustomerRecord::new();
        match (loan.get("data"), &loan) {
            (Some(Value::Object(data)), _) => record.extend_object(data),
            (_, Value::Object(body)) => record.extend_object(body),
            _ => record.insert("loan", loan.clone()),
        }
        record.insert(DISPOSITION_KEY, disposition);

        info!(loan_id, fields = record.len(), "Collekto customer data fetched");
        Ok(record)
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BODY_BYTES {
        return body;
    }
    let mut end = MAX_LOGGED_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client = CollektoClient::new(CollektoConfig::new("http://collekto/", "u", "p")).unwrap();
        assert_eq!(client.url(AUTH_PATH), "http://collekto/api/v2/profile/authenticate");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_LOGGED_BODY_BYTES);
        let cut = truncate(&long);
        assert!(cut.len() <= MAX_LOGGED_BODY_BYTES);
        assert!(cut.chars().all(|c| c == 'é'));
        assert_eq!(truncate("short"), "short");
    }
}
