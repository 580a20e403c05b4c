mod io_utils;
pub mod export;

// Re-export core engine components
pub use export::plan::{evaluate, Disposition, PlanSummary};
pub use export::{
    default_engine, BatchReport, DataService, ExportEngine, ExportError, ExportOptions,
    ExportOutcome, ExportRequest, ExportStats, HttpDataService, ItemOutcome, ServiceError,
};
