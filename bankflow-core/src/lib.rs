//! bankflow core - fetch, reshape and store the Brazilian bank list
//!
//! This crate implements a three-stage ETL job following hexagonal architecture:
//!
//! - **domain**: bank records, the table descriptor and the error taxonomy
//! - **ports**: trait definitions for the source and the store
//! - **services**: cache, transform, load, pipeline orchestration, run logging
//! - **adapters**: concrete implementations (BrasilAPI over HTTP, DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::brasilapi::BrasilApiClient;
use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::{BankRepository, BankSource};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{BankRecord, PersistedBank, RawBankRecord, TableSchema};
pub use services::{LogEntry, LogEvent, LoggingService, RunReport};

/// Main context for bankflow operations
///
/// Built once at startup. Holds the configuration, the bank store, the run
/// logger and the pipeline wired to them.
pub struct BankflowContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub repository: Arc<DuckDbRepository>,
    pub logger: Option<Arc<LoggingService>>,
    pub pipeline: PipelineService,
}

impl BankflowContext {
    /// Create a context that fetches over HTTP through the fetch cache
    pub fn new(data_dir: &Path, app_version: &str) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let client = BrasilApiClient::with_timeout(config.request_timeout())?;
        let source = Arc::new(CachedSource::new(client, config.cache_ttl()?));
        Self::with_source(data_dir, app_version, config, source)
    }

    /// Create a context around any bank source
    pub fn with_source(
        data_dir: &Path,
        app_version: &str,
        config: Config,
        source: Arc<dyn BankSource>,
    ) -> Result<Self> {
        let db_path = data_dir.join(&config.database_file);
        let repository = Arc::new(DuckDbRepository::new(&db_path, TableSchema::banks())?);

        // Table is created if absent on every initialization
        repository.ensure_schema()?;

        // A broken log database should not stop the pipeline
        let logger = LoggingService::new(data_dir, app_version).ok().map(Arc::new);

        let mut pipeline = PipelineService::new(source, LoadService::new(repository.clone()))
            .with_policy(config.malformed_records);
        if let Some(logger) = &logger {
            pipeline = pipeline.with_logger(Arc::clone(logger));
        }

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            repository,
            logger,
            pipeline,
        })
    }

    /// Run the pipeline once against the configured source URL
    pub fn run(&self) -> Result<RunReport> {
        self.pipeline.run(&self.config.source_url)
    }
}
