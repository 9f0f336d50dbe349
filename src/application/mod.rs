//! Application layer - the conversation orchestration loop.
//!
//! Ties the ports together per request: resolve session, optionally ingest
//! an uploaded document, retrieve context, build the prompt, invoke
//! completion, append to history.

pub mod ingestion;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;

pub use ingestion::{IngestionPipeline, UploadedFile};
pub use orchestrator::{ChatOrchestrator, ChatOutcome};
pub use retrieval::RetrievalClient;
