//! Memory tiers attached to an agent, and the context block built from them.

use crate::long_term::LongTermMemory;
use crate::semantic::SemanticMemory;
use crate::working::WorkingMemory;
use agentsuite_core::error::MemoryError;
use agentsuite_core::memory::MemoryItem;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether an item evicted from working memory is copied into
/// long-term memory.
pub type PromotionPolicy = Arc<dyn Fn(&MemoryItem) -> bool + Send + Sync>;

/// Drop every evicted item.
pub fn never_promote() -> PromotionPolicy {
    Arc::new(|_| false)
}

/// Promote every evicted item.
pub fn always_promote() -> PromotionPolicy {
    Arc::new(|_| true)
}

/// How many items each tier contributes to the prompt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecallLimits {
    pub recent_text: usize,
    pub recent_actions: usize,
    pub long_term: usize,
    pub semantic: usize,
}

impl Default for RecallLimits {
    fn default() -> Self {
        Self {
            recent_text: 5,
            recent_actions: 5,
            long_term: 3,
            semantic: 2,
        }
    }
}

/// Working, long-term and semantic memory wired together.
///
/// Every tier is optional. Items evicted from working memory go through
/// the promotion policy and, when accepted, into long-term memory.
pub struct MemoryTiers {
    working: Option<WorkingMemory>,
    long_term: Option<Arc<LongTermMemory>>,
    semantic: BTreeMap<String, Arc<SemanticMemory>>,
    promotion: PromotionPolicy,
    limits: RecallLimits,
}

impl MemoryTiers {
    pub fn new() -> Self {
        Self {
            working: None,
            long_term: None,
            semantic: BTreeMap::new(),
            promotion: never_promote(),
            limits: RecallLimits::default(),
        }
    }

    pub fn with_working(mut self, working: WorkingMemory) -> Self {
        self.working = Some(working);
        self
    }

    pub fn with_long_term(mut self, long_term: Arc<LongTermMemory>) -> Self {
        self.long_term = Some(long_term);
        self
    }

    /// Attach a semantic store under its own name, replacing one with the
    /// same name.
    pub fn with_semantic(mut self, semantic: Arc<SemanticMemory>) -> Self {
        self.add_semantic(semantic);
        self
    }

    pub fn with_promotion(mut self, policy: PromotionPolicy) -> Self {
        self.promotion = policy;
        self
    }

    pub fn with_limits(mut self, limits: RecallLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn add_semantic(&mut self, semantic: Arc<SemanticMemory>) {
        self.semantic.insert(semantic.name().to_string(), semantic);
    }

    pub fn working(&self) -> Option<&WorkingMemory> {
        self.working.as_ref()
    }

    pub fn long_term(&self) -> Option<&Arc<LongTermMemory>> {
        self.long_term.as_ref()
    }

    pub fn semantic(&self) -> impl Iterator<Item = &Arc<SemanticMemory>> {
        self.semantic.values()
    }

    pub fn semantic_store(&self, name: &str) -> Option<&Arc<SemanticMemory>> {
        self.semantic.get(name)
    }

    pub fn limits(&self) -> RecallLimits {
        self.limits
    }

    /// Record a text event in working memory, if attached.
    pub async fn record_text(&mut self, content: impl Into<String>) -> Result<(), MemoryError> {
        let evicted = match self.working.as_mut() {
            Some(working) => working.add_text(content),
            None => return Ok(()),
        };
        self.handle_eviction(evicted).await
    }

    /// Record an action event in working memory, if attached.
    pub async fn record_action(&mut self, content: impl Into<String>) -> Result<(), MemoryError> {
        let evicted = match self.working.as_mut() {
            Some(working) => working.add_action(content),
            None => return Ok(()),
        };
        self.handle_eviction(evicted).await
    }

    /// Drain working memory through the promotion policy. Returns how many
    /// items were promoted.
    pub async fn evict_all(&mut self) -> Result<usize, MemoryError> {
        let drained = match self.working.as_mut() {
            Some(working) => working.drain(),
            None => return Ok(0),
        };
        let mut promoted = 0;
        for item in drained {
            if self.promote(&item).await? {
                promoted += 1;
            }
        }
        Ok(promoted)
    }

    async fn handle_eviction(&self, evicted: Option<MemoryItem>) -> Result<(), MemoryError> {
        if let Some(item) = evicted {
            self.promote(&item).await?;
        }
        Ok(())
    }

    async fn promote(&self, item: &MemoryItem) -> Result<bool, MemoryError> {
        match &self.long_term {
            Some(long_term) if (self.promotion)(item) => {
                long_term.insert(item).await?;
                debug!(kind = %item.kind, "Promoted evicted item to long-term memory");
                Ok(true)
            }
            _ => {
                debug!(kind = %item.kind, "Dropped evicted working-memory item");
                Ok(false)
            }
        }
    }

    /// Render the memory context for a task. Sections for missing tiers
    /// are left empty; recall failures are logged and skipped.
    pub async fn build_context(&self, task: &str) -> String {
        let mut lines = vec!["## Recent Short-Term Text:".to_string()];
        if let Some(working) = &self.working {
            lines.extend(working.recent_text(self.limits.recent_text).into_iter().map(|i| i.content));
        }

        lines.push("\n## Recent Short-Term Actions:".into());
        if let Some(working) = &self.working {
            lines.extend(
                working
                    .recent_actions(self.limits.recent_actions)
                    .into_iter()
                    .map(|i| i.content),
            );
        }

        lines.push("\n## Long-Term Memory (Relevant Snippets):".into());
        if let Some(long_term) = &self.long_term
            && !task.trim().is_empty()
        {
            match long_term.recall(task, self.limits.long_term).await {
                Ok(items) => lines.extend(items.into_iter().map(|i| format!("[{}] {}", i.kind, i.content))),
                Err(e) => warn!(memory = %long_term.name(), error = %e, "Long-term recall failed"),
            }
        }

        lines.push("\n## Semantic Memory (Relevant Snippets):".into());
        for semantic in self.semantic.values() {
            match semantic.recall(task, self.limits.semantic).await {
                Ok(hits) => lines.extend(hits.into_iter().map(|h| h.text)),
                Err(e) => warn!(memory = %semantic.name(), error = %e, "Semantic recall failed"),
            }
        }

        lines.join("\n")
    }
}

impl Default for MemoryTiers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryTiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTiers")
            .field("working", &self.working.as_ref().map(|w| w.len()))
            .field("long_term", &self.long_term.as_ref().map(|l| l.name().to_string()))
            .field("semantic", &self.semantic.keys().collect::<Vec<_>>())
            .field("limits", &self.limits)
            .finish()
    }
}
