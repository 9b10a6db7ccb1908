use thiserror::Error;

use crate::models::StatementDocument;

pub mod http_client;
pub mod local_store;

pub use http_client::HttpStatementClient;
pub use local_store::LocalStatementStore;

/// Failures of a financial data provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no financial statements found for {symbol}")]
    NotFound { symbol: String },
    #[error("financial data provider unavailable: {0}")]
    Unavailable(String),
    #[error("malformed statement document for {symbol}: {message}")]
    Malformed { symbol: String, message: String },
}

/// Source of raw financial statements for a stock code
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FinancialDataProvider: Send + Sync {
    async fn fetch_statements(&self, symbol: &str) -> Result<StatementDocument, ProviderError>;
}

/// Stock codes usable as a file name or URL path segment: ASCII
/// alphanumerics plus `.-_`, never starting with a dot
pub(crate) fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.starts_with('.')
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Parse a provider body, tagging failures with the symbol
pub(crate) fn parse_document(
    symbol: &str,
    body: &str,
) -> Result<StatementDocument, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Malformed {
        symbol: symbol.to_string(),
        message: e.to_string(),
    })
}
