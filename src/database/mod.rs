use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use std::path::Path;
use tracing::{debug, info};

use crate::models::FinancialRecord;

/// One cached company with its most recent period
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub company_code: String,
    pub company_name: String,
    pub periods: i64,
    pub latest_period: String,
    pub updated_at: NaiveDateTime,
}

/// SQLite cache of per-period financial records
#[derive(Clone)]
pub struct FinancialCache {
    pool: SqlitePool,
}

impl FinancialCache {
    /// Open (creating if needed) the cache database at `path`
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening financial cache at {}", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(SqliteConnectOptions::new().filename(path).create_if_missing(true))
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS financial_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_code TEXT NOT NULL,
                company_name TEXT NOT NULL,
                period_label TEXT NOT NULL,
                period_sort_key INTEGER NOT NULL,
                revenue REAL NOT NULL DEFAULT 0,
                total_assets REAL NOT NULL DEFAULT 0,
                total_liabilities REAL NOT NULL DEFAULT 0,
                current_assets REAL NOT NULL DEFAULT 0,
                current_liabilities REAL NOT NULL DEFAULT 0,
                operating_cash_flow REAL NOT NULL DEFAULT 0,
                debt_ratio REAL NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL,
                UNIQUE(company_code, period_label)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_financial_cache_name ON financial_cache(company_name)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Insert or replace records keyed by (company code, period label)
    pub async fn upsert_records(&self, records: &[FinancialRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let updated_at = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO financial_cache (
                    company_code, company_name, period_label, period_sort_key,
                    revenue, total_assets, total_liabilities, current_assets,
                    current_liabilities, operating_cash_flow, debt_ratio, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(company_code, period_label) DO UPDATE SET
                    company_name = excluded.company_name,
                    period_sort_key = excluded.period_sort_key,
                    revenue = excluded.revenue,
                    total_assets = excluded.total_assets,
                    total_liabilities = excluded.total_liabilities,
                    current_assets = excluded.current_assets,
                    current_liabilities = excluded.current_liabilities,
                    operating_cash_flow = excluded.operating_cash_flow,
                    debt_ratio = excluded.debt_ratio,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&record.company_code)
            .bind(&record.company_name)
            .bind(&record.period_label)
            .bind(record.period_sort_key)
            .bind(record.revenue)
            .bind(record.total_assets)
            .bind(record.total_liabilities)
            .bind(record.current_assets)
            .bind(record.current_liabilities)
            .bind(record.operating_cash_flow)
            .bind(record.debt_ratio)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("💾 Cached {} financial records", records.len());
        Ok(records.len())
    }

    /// Most recent period of the first company whose name or code contains
    /// `query` (ASCII case-insensitive). A blank query matches nothing.
    pub async fn latest_for_company(&self, query: &str) -> Result<Option<FinancialRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let pattern = format!("%{}%", escape_like(query));

        let row = sqlx::query(
            r#"
            SELECT * FROM financial_cache
            WHERE company_name LIKE ? ESCAPE '\' OR company_code LIKE ? ESCAPE '\'
            ORDER BY period_sort_key DESC, updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| record_from_row(&r)))
    }

    /// All cached periods of one company, most recent first
    pub async fn records_for_company(&self, company_code: &str) -> Result<Vec<FinancialRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM financial_cache WHERE company_code = ? ORDER BY period_sort_key DESC",
        )
        .bind(company_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Cached companies with their latest period, ordered by code
    pub async fn list_entries(&self) -> Result<Vec<CacheEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT company_code, company_name, period_label, updated_at
            FROM financial_cache
            ORDER BY company_code, period_sort_key DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries: Vec<CacheEntry> = Vec::new();
        for row in rows {
            let company_code: String = row.get("company_code");
            let updated_at: NaiveDateTime = row.get("updated_at");

            match entries.last_mut() {
                Some(entry) if entry.company_code == company_code => {
                    entry.periods += 1;
                    entry.updated_at = entry.updated_at.max(updated_at);
                }
                _ => entries.push(CacheEntry {
                    company_code,
                    company_name: row.get("company_name"),
                    periods: 1,
                    latest_period: row.get("period_label"),
                    updated_at,
                }),
            }
        }

        Ok(entries)
    }
}

fn record_from_row(row: &SqliteRow) -> FinancialRecord {
    FinancialRecord {
        company_code: row.get("company_code"),
        company_name: row.get("company_name"),
        period_label: row.get("period_label"),
        period_sort_key: row.get("period_sort_key"),
        revenue: row.get("revenue"),
        total_assets: row.get("total_assets"),
        total_liabilities: row.get("total_liabilities"),
        current_assets: row.get("current_assets"),
        current_liabilities: row.get("current_liabilities"),
        operating_cash_flow: row.get("operating_cash_flow"),
        debt_ratio: row.get("debt_ratio"),
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
