use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fin_metrics::advisor::{assess, OpinionClient, RiskThresholds};
use fin_metrics::api::{FinancialDataProvider, HttpStatementClient, LocalStatementStore};
use fin_metrics::cli::{CacheCommand, Cli, Command};
use fin_metrics::database::FinancialCache;
use fin_metrics::directory::CompanyDirectory;
use fin_metrics::models::{Config, FinancialRecord};
use fin_metrics::normalizer::{FieldMap, FieldResolver, MetricName, TableBuilder};
use fin_metrics::report;
use fin_metrics::service::{persist_report, ReportOutcome, ReportService};

const DEFAULT_STATEMENTS_DIR: &str = "statements";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fin_metrics=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Analyze {
            query,
            extended,
            json,
            persist,
            opinion,
            quarters,
            years,
        } => {
            let service = build_service(&config, extended)?;
            let outcome = service
                .build_report(
                    &query,
                    quarters.unwrap_or(config.quarters),
                    years.unwrap_or(config.annual_years),
                )
                .await?;

            let company_report = match outcome {
                ReportOutcome::CompanyNotFound { query } => {
                    eprintln!("❌ Company not found: {}", query);
                    return Ok(ExitCode::FAILURE);
                }
                ReportOutcome::NoData { company } => {
                    println!("No financial data for {} ({})", company.name, company.code);
                    return Ok(ExitCode::SUCCESS);
                }
                ReportOutcome::Report(company_report) => company_report,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&company_report)?);
            } else {
                let text = report::render_table(&company_report.company, &company_report.table);
                print!("{}", text);
            }

            if persist || opinion {
                let cache = FinancialCache::new(&config.database_path).await?;
                let written = persist_report(&cache, &company_report).await?;
                info!("Persisted {} periods to {}", written, config.database_path);
            }

            if opinion {
                let company = &company_report.company;
                let latest = company_report
                    .table
                    .to_records(company)
                    .into_iter()
                    .max_by_key(|r| r.period_sort_key)
                    .ok_or_else(|| anyhow!("Report for {} has no periods", company.code))?;
                print_opinion(&config, &latest).await?;
            }
        }
        Command::Cache(CacheCommand::List) => {
            let cache = FinancialCache::new(&config.database_path).await?;
            print!("{}", report::render_cache_entries(&cache.list_entries().await?));
        }
        Command::Cache(CacheCommand::Show { query }) => {
            let cache = FinancialCache::new(&config.database_path).await?;
            match cache.latest_for_company(&query).await? {
                Some(record) => {
                    let assessment = assess(&record, &thresholds(&config));
                    print!("{}", report::render_record(&record, &assessment));
                }
                None => println!("No cached data for '{}'", query),
            }
        }
        Command::Opinion { query } => {
            let cache = FinancialCache::new(&config.database_path).await?;
            match cache.latest_for_company(&query).await? {
                Some(record) => print_opinion(&config, &record).await?,
                None => println!("No cached data for '{}'; run `analyze --persist` first", query),
            }
        }
        Command::Resolve { query } => {
            let directory = load_directory(&config)?;
            match directory.resolve(&query) {
                Some(company) => println!("{}\t{}", company.code, company.name),
                None => {
                    eprintln!("❌ Company not found: {}", query);
                    for (candidate, score) in directory.search(&query, 5) {
                        eprintln!("  {} {} ({})", candidate.code, candidate.name, score);
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn thresholds(config: &Config) -> RiskThresholds {
    RiskThresholds {
        debt_ratio_warning_line: config.debt_ratio_warning_line,
    }
}

fn load_directory(config: &Config) -> Result<CompanyDirectory> {
    match &config.company_listing_path {
        Some(path) => Ok(CompanyDirectory::from_csv_path(path)?),
        None => Ok(CompanyDirectory::default()),
    }
}

fn load_field_map(config: &Config) -> Result<FieldMap> {
    let Some(path) = &config.field_map_path else {
        return Ok(FieldMap::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read field map {}", path))?;
    let overrides = FieldMap::from_json_str(&json)
        .with_context(|| format!("Invalid field map {}", path))?;
    Ok(FieldMap::default().merge(overrides))
}

fn build_provider(config: &Config) -> Result<Arc<dyn FinancialDataProvider>> {
    if let Some(financials) = &config.financials {
        info!("Using financial data endpoint {}", financials.endpoint);
        let client = HttpStatementClient::new(financials, config.financials_rate_limit_per_minute)?;
        return Ok(Arc::new(client));
    }

    let dir = config
        .statements_dir
        .as_deref()
        .unwrap_or(DEFAULT_STATEMENTS_DIR);
    info!("Using local statements in {}", dir);
    Ok(Arc::new(LocalStatementStore::new(dir)))
}

fn build_service(config: &Config, extended: bool) -> Result<ReportService> {
    let resolver = FieldResolver::new(load_field_map(config)?);
    let builder = if extended {
        TableBuilder::new(resolver, MetricName::ALL)
    } else {
        TableBuilder::new(resolver, MetricName::CORE)
    };

    Ok(ReportService::new(load_directory(config)?, build_provider(config)?, builder))
}

async fn print_opinion(config: &Config, record: &FinancialRecord) -> Result<()> {
    let llm = config
        .llm
        .as_ref()
        .ok_or_else(|| anyhow!("LLM_ENDPOINT is not configured"))?;

    let risk = thresholds(config);
    let assessment = assess(record, &risk);
    print!("{}", report::render_record(record, &assessment));

    let client = OpinionClient::new(llm, config.llm_model.clone())?;
    let opinion = client.generate_opinion(record, &assessment, &risk).await?;
    println!("\n📝 Underwriting opinion\n{}", opinion);
    Ok(())
}
