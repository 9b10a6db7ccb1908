use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{FinancialDataProvider, ProviderError};
use crate::database::FinancialCache;
use crate::directory::CompanyDirectory;
use crate::models::Company;
use crate::normalizer::{MetricTable, TableBuilder, TableOutcome};

/// A company together with its metric table
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub company: Company,
    pub table: MetricTable,
}

#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// The query matched no company in the listing
    CompanyNotFound { query: String },
    /// The provider had nothing usable for the company
    NoData { company: Company },
    Report(CompanyReport),
}

/// Resolves a query, fetches statements and builds the metric table
pub struct ReportService {
    directory: CompanyDirectory,
    provider: Arc<dyn FinancialDataProvider>,
    builder: TableBuilder,
}

impl ReportService {
    pub fn new(
        directory: CompanyDirectory,
        provider: Arc<dyn FinancialDataProvider>,
        builder: TableBuilder,
    ) -> Self {
        Self {
            directory,
            provider,
            builder,
        }
    }

    /// Company for a query; without a listing the query is taken as a code
    pub fn resolve_company(&self, query: &str) -> Option<Company> {
        if self.directory.is_empty() {
            let query = query.trim();
            return (!query.is_empty()).then(|| Company::from_code(query));
        }
        self.directory.resolve(query).cloned()
    }

    pub async fn build_report(
        &self,
        query: &str,
        quarters: usize,
        years: usize,
    ) -> Result<ReportOutcome> {
        let Some(company) = self.resolve_company(query) else {
            warn!("No company matches '{}'", query);
            return Ok(ReportOutcome::CompanyNotFound {
                query: query.to_string(),
            });
        };

        info!("📊 Building report for {} ({})", company.name, company.code);

        let document = match self.provider.fetch_statements(&company.code).await {
            Ok(document) => document,
            Err(ProviderError::NotFound { .. }) => {
                warn!("Provider has no statements for {}", company.code);
                return Ok(ReportOutcome::NoData { company });
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to fetch statements for {}", company.code))
            }
        };

        let periods = document.select(quarters, years);
        match self.builder.build(&periods) {
            TableOutcome::NoData => Ok(ReportOutcome::NoData { company }),
            TableOutcome::Table(table) => {
                info!("✅ Built {} periods for {}", table.columns().len(), company.code);
                Ok(ReportOutcome::Report(CompanyReport { company, table }))
            }
        }
    }
}

/// Write every period of a report to the cache
pub async fn persist_report(cache: &FinancialCache, report: &CompanyReport) -> Result<usize> {
    let records = report.table.to_records(&report.company);
    cache
        .upsert_records(&records)
        .await
        .with_context(|| format!("Failed to cache records for {}", report.company.code))
}
