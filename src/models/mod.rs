pub mod analysis;
pub mod document;
pub mod loaders;

pub use analysis::{
    AnalysisResult, ComponentAnalysis, DebtAndSavings, DebtItem, DetailedAnalysis,
    FinancialIndicator, Flag, IncomeSources, Metrics, NumericFields, OutstandingDebt,
    Recommendations, ScoreBand, Severity, Summary,
};
pub use document::{Document, RemoteDocumentId, PDF_MIME};
pub use loaders::{load_document, load_documents};
