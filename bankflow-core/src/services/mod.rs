//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! covers one pipeline stage or supporting concern.

pub mod cache;
pub mod load;
pub mod logging;
pub mod pipeline;
pub mod transform;

pub use cache::{input_hash, CachedSource, Clock, ManualClock, MemoCache, SystemClock};
pub use load::LoadService;
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use pipeline::{PipelineService, PipelineState, RunReport, Stage};
pub use transform::{transform, transform_with_policy, MalformedPolicy, TransformOutput};
