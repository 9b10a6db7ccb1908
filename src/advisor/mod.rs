//! Underwriting pre-screen and opinion generation
//!
//! [`assess`] flags a cached record against fixed thresholds without any
//! I/O. [`OpinionClient`] asks an LLM completion endpoint for a free-text
//! underwriting opinion on the same record.

use serde::Serialize;
use std::fmt;

use crate::models::FinancialRecord;

pub mod opinion;

pub use opinion::{build_prompt, extract_text, OpinionClient};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    /// Debt ratio in percent above which a record is flagged
    pub debt_ratio_warning_line: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            debt_ratio_warning_line: 65.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum RiskFlag {
    DebtRatioAboveWarningLine { debt_ratio: f64, warning_line: f64 },
    NegativeOperatingCashFlow { operating_cash_flow: f64 },
    MissingBalanceSheet,
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFlag::DebtRatioAboveWarningLine {
                debt_ratio,
                warning_line,
            } => write!(
                f,
                "debt ratio {:.2}% is above the {:.2}% warning line",
                debt_ratio, warning_line
            ),
            RiskFlag::NegativeOperatingCashFlow { operating_cash_flow } => write!(
                f,
                "operating cash flow is negative ({:.0})",
                operating_cash_flow
            ),
            RiskFlag::MissingBalanceSheet => {
                f.write_str("total assets not reported; debt ratio cannot be assessed")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assessment {
    pub flags: Vec<RiskFlag>,
}

impl Assessment {
    pub fn is_clear(&self) -> bool {
        self.flags.is_empty()
    }
}

pub fn assess(record: &FinancialRecord, thresholds: &RiskThresholds) -> Assessment {
    let mut flags = Vec::new();

    if record.total_assets <= 0.0 {
        flags.push(RiskFlag::MissingBalanceSheet);
    } else if record.debt_ratio > thresholds.debt_ratio_warning_line {
        flags.push(RiskFlag::DebtRatioAboveWarningLine {
            debt_ratio: record.debt_ratio,
            warning_line: thresholds.debt_ratio_warning_line,
        });
    }

    if record.operating_cash_flow < 0.0 {
        flags.push(RiskFlag::NegativeOperatingCashFlow {
            operating_cash_flow: record.operating_cash_flow,
        });
    }

    Assessment { flags }
}
