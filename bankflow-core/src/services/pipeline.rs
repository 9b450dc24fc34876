//! Pipeline service - extract, transform and load the bank list
//!
//! Stages run strictly in order and each one works on the complete output
//! of the previous stage. The first error aborts the run.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::ports::BankSource;
use crate::services::load::LoadService;
use crate::services::logging::{LogEvent, LoggingService};
use crate::services::transform::{transform_with_policy, MalformedPolicy};

/// A working stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extracting,
    Transforming,
    Loading,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extracting => "extracting",
            Stage::Transforming => "transforming",
            Stage::Loading => "loading",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline state machine
///
/// `Idle -> Extracting -> Transforming -> Loading -> Done`, with `Failed`
/// reachable from every working stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Running(Stage),
    Done,
    Failed(Stage),
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub source_url: String,
    /// Raw records received from the source
    pub fetched: usize,
    /// Records that passed transformation
    pub transformed: usize,
    /// Records dropped for having no code
    pub dropped: usize,
    /// Malformed records skipped (skip policy only)
    pub skipped: usize,
    /// Rows inserted
    pub loaded: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs the three-stage bank ETL
pub struct PipelineService {
    source: Arc<dyn BankSource>,
    loader: LoadService,
    policy: MalformedPolicy,
    logger: Option<Arc<LoggingService>>,
    state: Mutex<PipelineState>,
}

impl PipelineService {
    pub fn new(source: Arc<dyn BankSource>, loader: LoadService) -> Self {
        Self {
            source,
            loader,
            policy: MalformedPolicy::default(),
            logger: None,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Current state of the most recent run
    pub fn state(&self) -> PipelineState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(PipelineState::Idle)
    }

    /// Run the pipeline once against `source_url`
    pub fn run(&self, source_url: &str) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.log(
            LogEvent::new("pipeline_started")
                .with_run_id(run_id.to_string())
                .with_source_name(self.source.name())
                .with_source_url(source_url),
        );

        match self.run_stages(source_url) {
            Ok(counts) => {
                self.set_state(PipelineState::Done);
                self.log(
                    LogEvent::new("pipeline_completed")
                        .with_run_id(run_id.to_string())
                        .with_source_url(source_url),
                );

                Ok(RunReport {
                    run_id,
                    source_url: source_url.to_string(),
                    fetched: counts.fetched,
                    transformed: counts.transformed,
                    dropped: counts.dropped,
                    skipped: counts.skipped,
                    loaded: counts.loaded,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err((stage, err)) => {
                self.set_state(PipelineState::Failed(stage));
                self.log(
                    LogEvent::new("pipeline_failed")
                        .with_run_id(run_id.to_string())
                        .with_source_url(source_url)
                        .with_stage(stage.as_str())
                        .with_error(err.to_string())
                        .with_error_details(format!("{:?}", err)),
                );
                Err(err)
            }
        }
    }

    fn run_stages(
        &self,
        source_url: &str,
    ) -> std::result::Result<StageCounts, (Stage, crate::domain::result::Error)> {
        self.set_state(PipelineState::Running(Stage::Extracting));
        let raw = self
            .source
            .fetch(source_url)
            .map_err(|e| (Stage::Extracting, e))?;

        self.set_state(PipelineState::Running(Stage::Transforming));
        let output =
            transform_with_policy(&raw, self.policy).map_err(|e| (Stage::Transforming, e))?;

        self.set_state(PipelineState::Running(Stage::Loading));
        let loaded = self
            .loader
            .load(&output.banks)
            .map_err(|e| (Stage::Loading, e))?;

        Ok(StageCounts {
            fetched: raw.len(),
            transformed: output.banks.len(),
            dropped: output.dropped,
            skipped: output.skipped,
            loaded,
        })
    }

    fn set_state(&self, state: PipelineState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }

    /// Logging never breaks a run
    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }
}

struct StageCounts {
    fetched: usize,
    transformed: usize,
    dropped: usize,
    skipped: usize,
    loaded: usize,
}
