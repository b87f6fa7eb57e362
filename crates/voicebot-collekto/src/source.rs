use crate::client::CollektoClient;
use crate::config::CollektoConfig;
use crate::error::CollektoError;
use crate::mock::CollektoMock;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use voicebot_types::CustomerRecord;

/// Which implementation answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Collekto,
    Mock,
}

/// Source of customer business data for a call.
#[async_trait]
pub trait CustomerDataSource: Send + Sync {
    async fn fetch_customer(
        &self,
        loan_id: &str,
        system_id: &str,
    ) -> Result<CustomerRecord, CollektoError>;

    fn kind(&self) -> SourceKind;
}

#[async_trait]
impl CustomerDataSource for CollektoClient {
    async fn fetch_customer(
        &self,
        loan_id: &str,
        system_id: &str,
    ) -> Result<CustomerRecord, CollektoError> {
        CollektoClient::fetch_customer(self, loan_id, system_id).await
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Collekto
    }
}

#[async_trait]
impl CustomerDataSource for CollektoMock {
    async fn fetch_customer(
        &self,
        loan_id: &str,
        system_id: &str,
    ) -> Result<CustomerRecord, CollektoError> {
        Ok(self.lookup(loan_id, system_id))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }
}

/// Builds the data source selected by `config.mock`.
///
/// In mock mode the live client is never constructed.
pub fn from_config(config: &CollektoConfig) -> Result<Arc<dyn CustomerDataSource>, CollektoError> {
    if config.mock {
        let mock = match &config.mock_data_path {
            Some(path) => CollektoMock::from_csv_path(path)?,
            None => CollektoMock::builtin()?,
        };
        tracing::info!(
            rows = mock.len(),
            "Collekto mock mode enabled; the Collekto backend will not be contacted"
        );
        Ok(Arc::new(mock))
    } else {
        tracing::info!(base_url = %config.base_url, "using live Collekto backend");
        Ok(Arc::new(CollektoClient::new(config.clone())?))
    }
}
