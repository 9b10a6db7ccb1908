//! Company name / stock code resolution against a listing
//!
//! The listing is a CSV with `code,name` headers. Queries are matched by
//! exact code, code without exchange suffix, exact name, name substring,
//! and finally a fuzzy match over names and codes.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Company;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read company listing {path}: {source}")]
    Open { path: String, source: csv::Error },
    #[error("invalid company listing row: {0}")]
    Row(#[from] csv::Error),
}

/// In-memory listing of companies
#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    companies: Vec<Company>,
}

impl CompanyDirectory {
    pub fn new(companies: Vec<Company>) -> Self {
        Self { companies }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DirectoryError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::collect(reader)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| DirectoryError::Open {
                path: path.display().to_string(),
                source,
            })?;

        let directory = Self::collect(reader)?;
        info!("📋 Loaded {} companies from {}", directory.len(), path.display());
        Ok(directory)
    }

    fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DirectoryError> {
        let mut companies = Vec::new();
        for row in reader.deserialize::<Company>() {
            let company = row?;
            if company.code.is_empty() || company.name.is_empty() {
                continue;
            }
            companies.push(company);
        }

        Ok(Self { companies })
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// Best company for a free-text name or stock code
    pub fn resolve(&self, query: &str) -> Option<&Company> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let lowered = query.to_lowercase();

        if let Some(company) = self.companies.iter().find(|c| c.code.eq_ignore_ascii_case(query)) {
            return Some(company);
        }

        // "2330" for "2330.TW"
        if let Some(company) = self.companies.iter().find(|c| {
            c.code
                .split('.')
                .next()
                .map_or(false, |base| base.eq_ignore_ascii_case(query))
        }) {
            return Some(company);
        }

        if let Some(company) = self.companies.iter().find(|c| c.name.to_lowercase() == lowered) {
            return Some(company);
        }

        // Shortest containing name is the most specific
        let substring = self
            .companies
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&lowered))
            .min_by_key(|c| c.name.chars().count());
        if substring.is_some() {
            return substring;
        }

        let best = self.search(query, 1).into_iter().next();
        if let Some((company, score)) = best {
            debug!("Fuzzy matched '{}' to {} (score {})", query, company.code, score);
        }
        best.map(|(company, _)| company)
    }

    /// Fuzzy candidates, best first
    pub fn search(&self, query: &str, limit: usize) -> Vec<(&Company, i64)> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(&Company, i64)> = self
            .companies
            .iter()
            .filter_map(|c| {
                let by_name = matcher.fuzzy_match(&c.name, query);
                let by_code = matcher.fuzzy_match(&c.code, query);
                by_name.max(by_code).map(|score| (c, score))
            })
            .collect();

        // Stable sort keeps listing order for equal scores
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(limit);
        scored
    }
}
