use std::path::{Path, PathBuf};
use tracing::debug;

use super::{is_valid_symbol, parse_document, FinancialDataProvider, ProviderError};
use crate::models::StatementDocument;

/// Statement documents stored as `{root}/{symbol}.json`
#[derive(Debug, Clone)]
pub struct LocalStatementStore {
    root: PathBuf,
}

impl LocalStatementStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, symbol: &str) -> Option<PathBuf> {
        is_valid_symbol(symbol).then(|| self.root.join(format!("{}.json", symbol)))
    }
}

#[async_trait::async_trait]
impl FinancialDataProvider for LocalStatementStore {
    async fn fetch_statements(&self, symbol: &str) -> Result<StatementDocument, ProviderError> {
        let not_found = || ProviderError::NotFound {
            symbol: symbol.to_string(),
        };

        let path = self.document_path(symbol).ok_or_else(not_found)?;
        debug!("Reading statements for {} from {}", symbol, path.display());

        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => {
                return Err(ProviderError::Unavailable(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        parse_document(symbol, &body)
    }
}
