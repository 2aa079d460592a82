//! Memory tiers for AgentSuite agents.
//!
//! - [`WorkingMemory`]: bounded buffers of recent text and actions
//! - [`LongTermMemory`]: similarity-searchable store fed by promotion
//! - [`SemanticMemory`]: named knowledge stores built from text, files and URLs
//! - [`MemoryTiers`]: the three wired together for an agent

pub mod embedder;
pub mod file_store;
pub mod in_memory;
pub mod long_term;
pub mod semantic;
pub mod source;
pub mod splitter;
pub mod tiers;
pub mod vector;
pub mod working;

pub use embedder::{HashingEmbedder, ProviderEmbedder};
pub use file_store::FileVectorStore;
pub use in_memory::InMemoryVectorStore;
pub use long_term::LongTermMemory;
pub use semantic::SemanticMemory;
pub use source::Source;
pub use splitter::TextSplitter;
pub use tiers::{MemoryTiers, PromotionPolicy, RecallLimits, always_promote, never_promote};
pub use vector::{StoredVector, cosine_similarity};
pub use working::WorkingMemory;
