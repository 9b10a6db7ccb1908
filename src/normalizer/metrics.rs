use serde::{Deserialize, Serialize};
use std::fmt;

use super::field_resolver::{CanonicalField, ResolvedFields};

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Total liabilities over total assets, as a percentage.
///
/// Returns `0.0` when there are no assets to divide by.
pub fn debt_ratio(total_liabilities: f64, total_assets: f64) -> f64 {
    if total_assets > 0.0 {
        finite_or_zero(total_liabilities / total_assets * 100.0)
    } else {
        0.0
    }
}

pub fn ebitda(operating_income: f64, depreciation_amortization: f64) -> f64 {
    finite_or_zero(operating_income + depreciation_amortization)
}

pub fn funds_from_operations(net_income: f64, depreciation_amortization: f64) -> f64 {
    finite_or_zero(net_income + depreciation_amortization)
}

/// Capital expenditure is negative-signed at the source, so this is a sum
pub fn free_operating_cash_flow(operating_cash_flow: f64, capital_expenditure: f64) -> f64 {
    finite_or_zero(operating_cash_flow + capital_expenditure)
}

/// One table cell. `value` is always finite; `available` is false when an
/// input was missing or a ratio had nothing to divide by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricCell {
    pub value: f64,
    pub available: bool,
}

impl MetricCell {
    pub fn unavailable() -> Self {
        Self {
            value: 0.0,
            available: false,
        }
    }
}

/// Table rows, declared in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Revenue,
    TotalAssets,
    DebtRatio,
    CurrentAssets,
    CurrentLiabilities,
    OperatingCashFlow,
    Ebitda,
    FundsFromOperations,
    FreeOperatingCashFlow,
}

impl MetricName {
    pub const CORE: [MetricName; 6] = [
        MetricName::Revenue,
        MetricName::TotalAssets,
        MetricName::DebtRatio,
        MetricName::CurrentAssets,
        MetricName::CurrentLiabilities,
        MetricName::OperatingCashFlow,
    ];

    pub const ALL: [MetricName; 9] = [
        MetricName::Revenue,
        MetricName::TotalAssets,
        MetricName::DebtRatio,
        MetricName::CurrentAssets,
        MetricName::CurrentLiabilities,
        MetricName::OperatingCashFlow,
        MetricName::Ebitda,
        MetricName::FundsFromOperations,
        MetricName::FreeOperatingCashFlow,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricName::Revenue => "Revenue",
            MetricName::TotalAssets => "Total Assets",
            MetricName::DebtRatio => "Debt Ratio",
            MetricName::CurrentAssets => "Current Assets",
            MetricName::CurrentLiabilities => "Current Liabilities",
            MetricName::OperatingCashFlow => "Operating Cash Flow",
            MetricName::Ebitda => "EBITDA",
            MetricName::FundsFromOperations => "Funds From Operations",
            MetricName::FreeOperatingCashFlow => "Free Operating Cash Flow",
        }
    }

    /// Percentages rather than currency amounts
    pub fn is_ratio(&self) -> bool {
        matches!(self, MetricName::DebtRatio)
    }

    pub fn inputs(&self) -> &'static [CanonicalField] {
        use CanonicalField::*;
        match self {
            MetricName::Revenue => &[TotalRevenue],
            MetricName::TotalAssets => &[TotalAssets],
            MetricName::DebtRatio => &[TotalLiabilities, TotalAssets],
            MetricName::CurrentAssets => &[CurrentAssets],
            MetricName::CurrentLiabilities => &[CurrentLiabilities],
            MetricName::OperatingCashFlow => &[OperatingCashFlow],
            MetricName::Ebitda => &[OperatingIncome, DepreciationAmortization],
            MetricName::FundsFromOperations => &[NetIncome, DepreciationAmortization],
            MetricName::FreeOperatingCashFlow => &[OperatingCashFlow, CapitalExpenditure],
        }
    }

    pub fn compute(&self, fields: &ResolvedFields) -> MetricCell {
        use CanonicalField::*;
        let value = match self {
            MetricName::Revenue => fields.get(TotalRevenue),
            MetricName::TotalAssets => fields.get(TotalAssets),
            MetricName::DebtRatio => {
                debt_ratio(fields.get(TotalLiabilities), fields.get(TotalAssets))
            }
            MetricName::CurrentAssets => fields.get(CurrentAssets),
            MetricName::CurrentLiabilities => fields.get(CurrentLiabilities),
            MetricName::OperatingCashFlow => fields.get(OperatingCashFlow),
            MetricName::Ebitda => {
                ebitda(fields.get(OperatingIncome), fields.get(DepreciationAmortization))
            }
            MetricName::FundsFromOperations => {
                funds_from_operations(fields.get(NetIncome), fields.get(DepreciationAmortization))
            }
            MetricName::FreeOperatingCashFlow => {
                free_operating_cash_flow(
                    fields.get(OperatingCashFlow),
                    fields.get(CapitalExpenditure),
                )
            }
        };

        let mut available = self.inputs().iter().all(|f| fields.is_reported(*f));
        if *self == MetricName::DebtRatio && fields.get(TotalAssets) <= 0.0 {
            available = false;
        }

        MetricCell {
            value: finite_or_zero(value),
            available,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
