pub mod backoff;
pub mod dialog;
pub mod orchestrator;
