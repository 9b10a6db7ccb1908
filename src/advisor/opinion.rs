use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::{Assessment, RiskThresholds};
use crate::models::{FinancialRecord, ServiceConfig};
use crate::normalizer::format_amount;

/// Client for a `generateContent`-style LLM completion endpoint
pub struct OpinionClient {
    client: Client,
    base_url: Url,
    credential: Option<String>,
    model: String,
}

impl OpinionClient {
    pub fn new(config: &ServiceConfig, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("fin-metrics/0.1")
            .build()?;

        let base_url = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid LLM endpoint '{}'", config.endpoint))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("LLM endpoint '{}' cannot be a base URL", config.endpoint));
        }

        Ok(Self {
            client,
            base_url,
            credential: config.credential.clone(),
            model: model.into(),
        })
    }

    fn generate_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("models")
                .push(&format!("{}:generateContent", self.model));
        }
        if let Some(key) = &self.credential {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }

    /// Ask the model for an underwriting opinion on one record
    pub async fn generate_opinion(
        &self,
        record: &FinancialRecord,
        assessment: &Assessment,
        thresholds: &RiskThresholds,
    ) -> Result<String> {
        let prompt = build_prompt(record, assessment, thresholds);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        debug!(
            "Requesting opinion for {} ({}) from {}",
            record.company_name, record.period_label, self.model
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .context("Opinion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Opinion request failed with status {}", status);
            return Err(anyhow!("Opinion request failed with status {}: {}", status, error_text));
        }

        let json: Value = response.json().await?;
        let text = extract_text(&json)
            .ok_or_else(|| anyhow!("Opinion response did not contain any text"))?;

        info!("📝 Received opinion for {}", record.company_name);
        Ok(text)
    }
}

/// Underwriting prompt for a directors-and-officers liability review
pub fn build_prompt(
    record: &FinancialRecord,
    assessment: &Assessment,
    thresholds: &RiskThresholds,
) -> String {
    let mut prompt = format!(
        "You are a directors-and-officers (D&O) liability underwriting specialist.\n\
         Assess the risk of the following company from its financial figures:\n\
         - Company: {} ({})\n\
         - Reporting period: {}\n\
         - Debt ratio: {:.2}% (underwriting warning line is {:.0}%)\n\
         - Operating cash flow: {}\n\
         - Total assets: {}\n\
         - Revenue: {}\n",
        record.company_name,
        record.company_code,
        record.period_label,
        record.debt_ratio,
        thresholds.debt_ratio_warning_line,
        format_amount(record.operating_cash_flow),
        format_amount(record.total_assets),
        format_amount(record.revenue),
    );

    if !assessment.is_clear() {
        prompt.push_str("Pre-screen flags:\n");
        for flag in &assessment.flags {
            prompt.push_str(&format!("- {}\n", flag));
        }
    }

    prompt.push_str(
        "Requirements:\n\
         1. Evaluate whether the debt ratio is healthy.\n\
         2. Judge operating stability from the cash flow.\n\
         3. Give a final underwriting recommendation \
         (accept, refer for further review, or decline).\n",
    );
    prompt
}

/// Concatenated text parts of the first candidate
pub fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
