pub mod analysis;
pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;
pub mod upstream;

pub use analysis::{AnalysisRequest, AnalysisResult, Analyzer, AnalyzerSettings, ScoreBand};
pub use error::{AnalysisError, HttpError, HttpErrorResponse};
pub use routes::{router, AppState};
