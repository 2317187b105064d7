pub mod chunker;
pub mod extraction;
pub mod findings;
pub mod orchestrator; // Two-phase staged extraction
pub mod resolution;
pub mod shard;
pub mod variables;
