//! The graph-structured stack (GSS): a persistent, structurally-shared DAG
//! of rule-call return addresses, used during `closure` so that the set of
//! live configurations stays finite even across recursive rule calls.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::{Arc, RwLock},
};

use hashbrown::{HashMap, HashSet};

/// Sentinel return-state value marking "the empty stack" as one branch of
/// an [`PredictionContext::Array`]. Always sorts last, since it is the
/// maximum possible state number.
pub const EMPTY_RETURN_STATE: i32 = i32::MAX;

#[derive(Debug)]
struct SingletonData {
    parent: PredictionContext,
    return_state: i32,
    cached_hash: u64,
}

#[derive(Debug)]
struct ArrayData {
    parents: Vec<PredictionContext>,
    return_states: Vec<i32>,
    cached_hash: u64,
}

/// A node in the GSS. `Empty` is the sentinel root (the "no enclosing rule
/// call" stack); it carries no data and is cheap to `Clone`.
#[derive(Debug, Clone)]
pub enum PredictionContext {
    Empty,
    Singleton(Arc<SingletonData>),
    Array(Arc<ArrayData>),
}

fn combine(seed: u64, value: impl Hash) -> u64 {
    let mut h = DefaultHasher::new();
    seed.hash(&mut h);
    value.hash(&mut h);
    h.finish()
}

pub(crate) fn ptr_key(ctx: &PredictionContext) -> usize {
    match ctx {
        PredictionContext::Empty => 0,
        PredictionContext::Singleton(rc) => Arc::as_ptr(rc) as usize,
        PredictionContext::Array(rc) => Arc::as_ptr(rc) as usize,
    }
}

impl PredictionContext {
    pub fn is_empty(&self) -> bool {
        matches!(self, PredictionContext::Empty)
    }

    fn cached_hash(&self) -> u64 {
        match self {
            PredictionContext::Empty => 0x9e37_79b9,
            PredictionContext::Singleton(s) => s.cached_hash,
            PredictionContext::Array(a) => a.cached_hash,
        }
    }

    pub fn singleton(parent: PredictionContext, return_state: i32) -> PredictionContext {
        let cached_hash = combine(combine(0x51, return_state), parent.cached_hash());
        PredictionContext::Singleton(Arc::new(SingletonData { parent, return_state, cached_hash }))
    }

    fn array(mut parents: Vec<PredictionContext>, mut return_states: Vec<i32>) -> PredictionContext {
        debug_assert_eq!(parents.len(), return_states.len());
        if return_states.len() == 1 {
            let parent = parents.pop().unwrap();
            let rs = return_states.pop().unwrap();
            if rs == EMPTY_RETURN_STATE && parent.is_empty() {
                return PredictionContext::Empty;
            }
            return PredictionContext::singleton(parent, rs);
        }
        let mut cached_hash = 0x27d4_eb2f_u64;
        for (p, rs) in parents.iter().zip(return_states.iter()) {
            cached_hash = combine(combine(cached_hash, *rs), p.cached_hash());
        }
        PredictionContext::Array(Arc::new(ArrayData { parents, return_states, cached_hash }))
    }

    /// Exposes this context's return-address/parent pairs uniformly,
    /// whether it's a singleton or an array; `Empty` reports its own single
    /// `EMPTY_RETURN_STATE` frame so callers don't need a separate case.
    pub fn as_array_parts(&self) -> (Vec<PredictionContext>, Vec<i32>) {
        match self {
            PredictionContext::Empty => (vec![PredictionContext::Empty], vec![EMPTY_RETURN_STATE]),
            PredictionContext::Singleton(s) => (vec![s.parent.clone()], vec![s.return_state]),
            PredictionContext::Array(a) => (a.parents.clone(), a.return_states.clone()),
        }
    }
}

impl PartialEq for PredictionContext {
    fn eq(&self, other: &Self) -> bool {
        if ptr_key(self) == ptr_key(other) {
            // Covers Empty==Empty and identical-Arc fast paths.
            if matches!((self, other), (PredictionContext::Empty, PredictionContext::Empty)) {
                return true;
            }
            if std::mem::discriminant(self) == std::mem::discriminant(other) {
                return true;
            }
        }
        match (self, other) {
            (PredictionContext::Empty, PredictionContext::Empty) => true,
            (PredictionContext::Singleton(a), PredictionContext::Singleton(b)) => {
                a.return_state == b.return_state && a.parent == b.parent
            }
            (PredictionContext::Array(a), PredictionContext::Array(b)) => {
                a.return_states == b.return_states && a.parents == b.parents
            }
            _ => false,
        }
    }
}
impl Eq for PredictionContext {}

impl Hash for PredictionContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

/// Per-`match` cache of `merge(a, b)` results, keyed on the physical
/// identity of the operands. Cleared between calls; never consulted
/// across two different lexer modes' closures computed in the same call
/// since the key space (heap addresses) never collides across contexts
/// that weren't actually merged together.
#[derive(Default)]
pub struct MergeCache {
    table: HashMap<(usize, usize), PredictionContext>,
}

impl MergeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}

/// Combines two contexts representing two ways the simulator reached the
/// same ATN state, per the merge contract in the core design.
pub fn merge(
    a: &PredictionContext,
    b: &PredictionContext,
    root_is_wildcard: bool,
    cache: &mut MergeCache,
) -> PredictionContext {
    if a == b {
        return a.clone();
    }
    if let (PredictionContext::Singleton(_), PredictionContext::Singleton(_)) = (a, b) {
        return merge_singletons(a, b, root_is_wildcard, cache);
    }
    if root_is_wildcard {
        if a.is_empty() {
            return a.clone();
        }
        if b.is_empty() {
            return b.clone();
        }
    }
    let key = (ptr_key(a), ptr_key(b));
    if let Some(hit) = cache.table.get(&key) {
        return hit.clone();
    }
    if let Some(root_merge) = merge_root(a, b, root_is_wildcard) {
        cache.table.insert(key, root_merge.clone());
        return root_merge;
    }
    let (pa, ra) = a.as_array_parts();
    let (pb, rb) = b.as_array_parts();
    let merged = merge_arrays(&pa, &ra, &pb, &rb, root_is_wildcard, cache);
    cache.table.insert(key, merged.clone());
    merged
}

fn merge_root(
    a: &PredictionContext,
    b: &PredictionContext,
    root_is_wildcard: bool,
) -> Option<PredictionContext> {
    if root_is_wildcard {
        if a.is_empty() {
            return Some(a.clone());
        }
        if b.is_empty() {
            return Some(b.clone());
        }
        return None;
    }
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Some(a.clone()),
        (true, false) => Some(add_empty_branch(b)),
        (false, true) => Some(add_empty_branch(a)),
        (false, false) => None,
    }
}

/// Preserves `EMPTY` as a distinguished `EMPTY_RETURN_STATE` branch merged
/// into `ctx`, sorted last.
fn add_empty_branch(ctx: &PredictionContext) -> PredictionContext {
    let (mut parents, mut return_states) = ctx.as_array_parts();
    parents.push(PredictionContext::Empty);
    return_states.push(EMPTY_RETURN_STATE);
    PredictionContext::array(parents, return_states)
}

fn merge_singletons(
    a: &PredictionContext,
    b: &PredictionContext,
    root_is_wildcard: bool,
    cache: &mut MergeCache,
) -> PredictionContext {
    let (PredictionContext::Singleton(sa), PredictionContext::Singleton(sb)) = (a, b) else {
        unreachable!()
    };
    let key = (ptr_key(a), ptr_key(b));
    if let Some(hit) = cache.table.get(&key) {
        return hit.clone();
    }
    let merged = if sa.return_state == sb.return_state {
        let parent = merge(&sa.parent, &sb.parent, root_is_wildcard, cache);
        if parent == sa.parent {
            a.clone()
        } else if parent == sb.parent {
            b.clone()
        } else {
            PredictionContext::singleton(parent, sa.return_state)
        }
    } else if sa.return_state < sb.return_state {
        PredictionContext::array(
            vec![sa.parent.clone(), sb.parent.clone()],
            vec![sa.return_state, sb.return_state],
        )
    } else {
        PredictionContext::array(
            vec![sb.parent.clone(), sa.parent.clone()],
            vec![sb.return_state, sa.return_state],
        )
    };
    cache.table.insert(key, merged.clone());
    merged
}

fn merge_arrays(
    pa: &[PredictionContext],
    ra: &[i32],
    pb: &[PredictionContext],
    rb: &[i32],
    root_is_wildcard: bool,
    cache: &mut MergeCache,
) -> PredictionContext {
    let mut parents = Vec::with_capacity(ra.len() + rb.len());
    let mut return_states = Vec::with_capacity(ra.len() + rb.len());
    let (mut i, mut j) = (0usize, 0usize);
    while i < ra.len() && j < rb.len() {
        match ra[i].cmp(&rb[j]) {
            std::cmp::Ordering::Equal => {
                return_states.push(ra[i]);
                parents.push(merge(&pa[i], &pb[j], root_is_wildcard, cache));
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                return_states.push(ra[i]);
                parents.push(pa[i].clone());
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                return_states.push(rb[j]);
                parents.push(pb[j].clone());
                j += 1;
            }
        }
    }
    while i < ra.len() {
        return_states.push(ra[i]);
        parents.push(pa[i].clone());
        i += 1;
    }
    while j < rb.len() {
        return_states.push(rb[j]);
        parents.push(pb[j].clone());
        j += 1;
    }
    PredictionContext::array(parents, return_states)
}

/// Interns structurally-equal contexts into a single physical
/// representative, shared across every lexer instance built from one
/// grammar. Guarded by a coarse `RwLock` per the crate's "portable
/// baseline" concurrency strategy.
#[derive(Default)]
pub struct SharedContextCache {
    table: RwLock<HashSet<PredictionContext>>,
}

impl SharedContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, ctx: &PredictionContext) -> Option<PredictionContext> {
        self.table.read().unwrap().get(ctx).cloned()
    }

    fn intern(&self, ctx: PredictionContext) {
        self.table.write().unwrap().insert(ctx);
    }
}

/// Rebuilds `ctx` using only nodes owned by `cache`, replacing structurally
/// equal subgraphs with their cached representative. `visited` dedupes
/// repeated recursion into the same physical subgraph within one call.
pub fn get_cached_context(
    ctx: &PredictionContext,
    cache: &SharedContextCache,
    visited: &mut HashMap<usize, PredictionContext>,
) -> PredictionContext {
    if ctx.is_empty() {
        return ctx.clone();
    }
    let key = ptr_key(ctx);
    if let Some(hit) = visited.get(&key) {
        return hit.clone();
    }
    if let Some(hit) = cache.get(ctx) {
        visited.insert(key, hit.clone());
        return hit;
    }
    let rebuilt = match ctx {
        PredictionContext::Empty => unreachable!(),
        PredictionContext::Singleton(s) => {
            let parent = get_cached_context(&s.parent, cache, visited);
            if parent == s.parent { ctx.clone() } else { PredictionContext::singleton(parent, s.return_state) }
        }
        PredictionContext::Array(a) => {
            let mut changed = false;
            let mut parents = Vec::with_capacity(a.parents.len());
            for p in &a.parents {
                let np = get_cached_context(p, cache, visited);
                if np != *p {
                    changed = true;
                }
                parents.push(np);
            }
            if changed { PredictionContext::array(parents, a.return_states.clone()) } else { ctx.clone() }
        }
    };
    cache.intern(rebuilt.clone());
    visited.insert(key, rebuilt.clone());
    rebuilt
}
