//! Sets of configurations built up during `closure`/`reach`, with the
//! context-ignoring hash lookup that lets `add` merge contexts for configs
//! that otherwise collide.

use hashbrown::HashMap;

use crate::{
    atn_config::{ByFullContext, LexerAtnConfig},
    errors::ReadOnlyMutation,
    prediction_context::{self, MergeCache, SharedContextCache},
};

#[derive(Debug, Clone, Default)]
pub struct AtnConfigSet {
    configs: Vec<LexerAtnConfig>,
    /// Maps a context-ignoring key (state, alt, executor) to the index in
    /// `configs` already holding that key, so a second insertion merges
    /// contexts instead of duplicating the config.
    lookup: HashMap<ConfigKey, usize>,

    pub has_semantic_context: bool,
    pub dips_into_outer_context: bool,
    pub unique_alt: Option<usize>,
    pub conflicting_alts: Vec<usize>,
    pub full_ctx: bool,

    read_only: bool,
}

/// Owned, hashable lookup key that deliberately ignores `context` — the
/// same shape as [`crate::atn_config::ByDfaStateKey`]. Two configs that
/// agree on state/alt/executor but disagree on call stack must collide
/// here so `add` can merge their contexts instead of keeping both; this is
/// what bounds the number of live configs (and in turn DFA states) across
/// recursive rule calls. A collision is then double-checked against
/// [`ByFullContext`] to tell a genuine duplicate (context also equal, a
/// true no-op) from a stack variant that needs merging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ConfigKey {
    state: i32,
    alt: usize,
    executor_hash_bits: u64,
}

fn key_of(c: &LexerAtnConfig) -> ConfigKey {
    use std::hash::{Hash, Hasher};
    let mut he = std::collections::hash_map::DefaultHasher::new();
    c.lexer_action_executor.hash(&mut he);
    ConfigKey { state: c.state, alt: c.alt, executor_hash_bits: he.finish() }
}

impl AtnConfigSet {
    pub fn new(full_ctx: bool) -> Self {
        Self { full_ctx, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LexerAtnConfig> {
        self.configs.iter()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Inserts `config`, merging its context with any existing config that
    /// is otherwise identical (same state/alt/executor) using the standard
    /// GSS merge rules. Returns `true` if a genuinely new config was added
    /// (used by `closure` to detect when an accept state was freshly
    /// reached, for the longest-match `skip_alt` bookkeeping).
    pub fn add(
        &mut self,
        config: LexerAtnConfig,
        merge_cache: &mut MergeCache,
    ) -> Result<bool, ReadOnlyMutation> {
        if self.read_only {
            return Err(ReadOnlyMutation);
        }
        let key = key_of(&config);
        if let Some(&idx) = self.lookup.get(&key) {
            // Same (state, alt, executor); a collision here is two paths
            // to the same ATN state with possibly different call stacks.
            let existing = &self.configs[idx];
            if ByFullContext(existing) == ByFullContext(&config) {
                return Ok(false);
            }
            let merged_ctx = prediction_context::merge(
                &existing.context,
                &config.context,
                !self.full_ctx,
                merge_cache,
            );
            self.configs[idx].context = merged_ctx;
            return Ok(false);
        }
        self.lookup.insert(key, self.configs.len());
        self.configs.push(config);
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), ReadOnlyMutation> {
        if self.read_only {
            return Err(ReadOnlyMutation);
        }
        self.configs.clear();
        self.lookup.clear();
        Ok(())
    }

    /// Rewrites every config's context through `cache`'s interning table, so
    /// a `DfaState` built from this set holds only shared, cached context
    /// instances instead of call-site-local ones. Called once per `match`
    /// before a reach set is frozen into a `DfaState`.
    pub fn optimize_contexts(&mut self, cache: &SharedContextCache) {
        let mut visited = HashMap::new();
        for c in &mut self.configs {
            c.context = prediction_context::get_cached_context(&c.context, cache, &mut visited);
        }
    }
}
