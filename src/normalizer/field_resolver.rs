//! Field lookup across inconsistently labelled provider datasets.
//!
//! Providers disagree on labels ("Total Liab" vs "Total Liabilities Net
//! Minority Interest") and on value encoding (numbers, numeric strings,
//! nulls, "None"). Everything here fails soft: an unusable value resolves
//! to the zero sentinel and is reported as unavailable, never as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{PeriodStatements, RawPeriodDataset, StatementKind};

/// Tri-state result of looking up a single label
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// Label present with a finite numeric value
    Present(f64),
    /// Label present but null, NaN, infinite or not numeric
    Null,
    /// Label (or the whole dataset) missing
    Absent,
}

impl FieldValue {
    pub fn or_zero(self) -> f64 {
        match self {
            FieldValue::Present(v) => v,
            FieldValue::Null | FieldValue::Absent => 0.0,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }
}

/// Look up `field_name` in `dataset` without collapsing missing data
pub fn lookup(dataset: Option<&RawPeriodDataset>, field_name: &str) -> FieldValue {
    let Some(dataset) = dataset else {
        return FieldValue::Absent;
    };

    match dataset.get(field_name) {
        None => FieldValue::Absent,
        Some(value) => numeric_value(value).map_or(FieldValue::Null, FieldValue::Present),
    }
}

/// Value of `field_name` as a float, or `0.0` when it is missing or unusable
pub fn resolve(dataset: Option<&RawPeriodDataset>, field_name: &str) -> f64 {
    lookup(dataset, field_name).or_zero()
}

fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Parses "1,234.5", " 42 " and accounting negatives like "(1,200)"
fn parse_numeric_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let parsed: f64 = cleaned.parse().ok()?;
    Some(if negative { -parsed } else { parsed })
}

/// Accounting concepts the resolver knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    TotalRevenue,
    TotalAssets,
    TotalLiabilities,
    CurrentAssets,
    CurrentLiabilities,
    OperatingCashFlow,
    OperatingIncome,
    NetIncome,
    DepreciationAmortization,
    CapitalExpenditure,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::TotalRevenue,
        CanonicalField::TotalAssets,
        CanonicalField::TotalLiabilities,
        CanonicalField::CurrentAssets,
        CanonicalField::CurrentLiabilities,
        CanonicalField::OperatingCashFlow,
        CanonicalField::OperatingIncome,
        CanonicalField::NetIncome,
        CanonicalField::DepreciationAmortization,
        CanonicalField::CapitalExpenditure,
    ];
}

/// A provider label and the statement it lives in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSource {
    pub statement: StatementKind,
    pub label: String,
}

impl FieldSource {
    pub fn new(statement: StatementKind, label: impl Into<String>) -> Self {
        Self {
            statement,
            label: label.into(),
        }
    }
}

/// Declarative mapping of canonical field -> ordered accepted source labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    entries: BTreeMap<CanonicalField, Vec<FieldSource>>,
}

const DEFAULT_LABELS: &[(CanonicalField, StatementKind, &[&str])] = &[
    (
        CanonicalField::TotalRevenue,
        StatementKind::Income,
        &["Total Revenue", "Operating Revenue", "Revenue"],
    ),
    (
        CanonicalField::TotalAssets,
        StatementKind::BalanceSheet,
        &["Total Assets"],
    ),
    (
        CanonicalField::TotalLiabilities,
        StatementKind::BalanceSheet,
        &["Total Liabilities Net Minority Interest", "Total Liab", "Total Liabilities"],
    ),
    (
        CanonicalField::CurrentAssets,
        StatementKind::BalanceSheet,
        &["Current Assets", "Total Current Assets"],
    ),
    (
        CanonicalField::CurrentLiabilities,
        StatementKind::BalanceSheet,
        &["Current Liabilities", "Total Current Liabilities"],
    ),
    (
        CanonicalField::OperatingCashFlow,
        StatementKind::CashFlow,
        &[
            "Operating Cash Flow",
            "Total Cash From Operating Activities",
            "Cash Flow From Continuing Operating Activities",
        ],
    ),
    (
        CanonicalField::OperatingIncome,
        StatementKind::Income,
        &["Operating Income", "Total Operating Income As Reported"],
    ),
    (
        CanonicalField::NetIncome,
        StatementKind::Income,
        &["Net Income", "Net Income Common Stockholders"],
    ),
    (
        CanonicalField::DepreciationAmortization,
        StatementKind::CashFlow,
        &["Depreciation And Amortization", "Depreciation Amortization Depletion"],
    ),
    (
        CanonicalField::CapitalExpenditure,
        StatementKind::CashFlow,
        &["Capital Expenditure", "Capital Expenditures"],
    ),
];

impl Default for FieldMap {
    fn default() -> Self {
        let mut entries: BTreeMap<CanonicalField, Vec<FieldSource>> = DEFAULT_LABELS
            .iter()
            .map(|(field, statement, labels)| {
                let sources = labels
                    .iter()
                    .map(|label| FieldSource::new(*statement, *label))
                    .collect();
                (*field, sources)
            })
            .collect();

        // Some providers only carry these on another statement
        if let Some(sources) = entries.get_mut(&CanonicalField::DepreciationAmortization) {
            sources.push(FieldSource::new(StatementKind::Income, "Reconciled Depreciation"));
        }
        if let Some(sources) = entries.get_mut(&CanonicalField::NetIncome) {
            sources.push(FieldSource::new(
                StatementKind::CashFlow,
                "Net Income From Continuing Operations",
            ));
        }

        Self { entries }
    }
}

impl FieldMap {
    /// Field map with no labels at all
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Parse a JSON object of `canonical_field -> [{statement, label}]`
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Replace the sources of every field present in `overrides`
    pub fn merge(mut self, overrides: FieldMap) -> Self {
        self.entries.extend(overrides.entries);
        self
    }

    pub fn sources(&self, field: CanonicalField) -> &[FieldSource] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_sources(&mut self, field: CanonicalField, sources: Vec<FieldSource>) {
        self.entries.insert(field, sources);
    }
}

/// Outcome of resolving one canonical field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub value: f64,
    /// False when the value is the zero sentinel for missing data
    pub reported: bool,
}

impl Resolution {
    fn reported(value: f64) -> Self {
        Self {
            value,
            reported: true,
        }
    }

    fn missing() -> Self {
        Self {
            value: 0.0,
            reported: false,
        }
    }
}

/// Resolved canonical fields for one period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFields {
    values: BTreeMap<CanonicalField, f64>,
    missing: BTreeSet<CanonicalField>,
}

impl ResolvedFields {
    pub fn insert(&mut self, field: CanonicalField, resolution: Resolution) {
        self.values.insert(field, resolution.value);
        if resolution.reported {
            self.missing.remove(&field);
        } else {
            self.missing.insert(field);
        }
    }

    /// Resolved value, `0.0` for fields that were never resolved
    pub fn get(&self, field: CanonicalField) -> f64 {
        self.values.get(&field).copied().unwrap_or(0.0)
    }

    pub fn is_reported(&self, field: CanonicalField) -> bool {
        self.values.contains_key(&field) && !self.missing.contains(&field)
    }

    pub fn missing(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.missing.iter().copied()
    }
}

/// Resolves canonical fields through a [`FieldMap`]
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    field_map: FieldMap,
}

impl FieldResolver {
    pub fn new(field_map: FieldMap) -> Self {
        Self { field_map }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    /// Try each source in order; the first non-zero value wins. An explicit
    /// zero is still "reported" when no later source has a non-zero value.
    pub fn resolve_field(
        &self,
        statements: &PeriodStatements,
        field: CanonicalField,
    ) -> Resolution {
        let mut saw_zero = false;

        for source in self.field_map.sources(field) {
            match lookup(Some(statements.dataset(source.statement)), &source.label) {
                FieldValue::Present(v) if v != 0.0 => return Resolution::reported(v),
                FieldValue::Present(_) => saw_zero = true,
                FieldValue::Null | FieldValue::Absent => {}
            }
        }

        if saw_zero {
            Resolution::reported(0.0)
        } else {
            Resolution::missing()
        }
    }

    pub fn resolve_all(&self, statements: &PeriodStatements) -> ResolvedFields {
        let mut resolved = ResolvedFields::default();
        for field in CanonicalField::ALL {
            resolved.insert(field, self.resolve_field(statements, field));
        }
        resolved
    }
}
