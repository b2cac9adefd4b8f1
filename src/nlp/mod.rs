// Remote NLP analysis: capabilities, the service client, dispatch and aggregation.
pub mod aggregate;
pub mod capability;
pub mod client;
pub mod dispatch;
pub mod raw;

pub use aggregate::{aggregate, AnalysisResult, MergeDiagnostics};
pub use capability::{AnalysisRequest, Capability};
pub use client::HttpLanguageService;
pub use dispatch::Dispatcher;
