//! The resolution context: inputs, interners and every query storage.

use std::sync::Arc;
use std::thread::ThreadId;

use crest_ir::{Ast, FileId, NodeId, SharedInterner, Span, StringInterner};
use crest_query::{
    Database, DerivedStorage, Ingredient, IngredientIndex, InputStorage, Query, Runtime,
};
use crest_types::{Signature, SignatureId, SignaturePool, TypeId, TypePool};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::ResolverConfig;
use crate::error::InternalError;
use crate::instantiate::{InstantiationKey, InstantiationRegistry};
use crate::queries::{
    AggregateFields, InitialSignature, Instantiate, LookupQuery, ModulesNamed, ResolveBody,
    ResolveModule, ResolveModuleStmt, ReturnType, ScopeQuery,
};
use crate::scope::Scope;

mod ingredients {
    pub const FILES: u32 = 0;
    pub const FILE_LIST: u32 = 1;
    pub const SCOPES: u32 = 2;
    pub const LOOKUPS: u32 = 3;
    pub const MODULES_NAMED: u32 = 4;
    pub const MODULE_STMTS: u32 = 5;
    pub const MODULES: u32 = 6;
    pub const INITIAL_SIGNATURES: u32 = 7;
    pub const INSTANTIATIONS: u32 = 8;
    pub const BODIES: u32 = 9;
    pub const RETURN_TYPES: u32 = 10;
    pub const FIELDS: u32 = 11;
}

/// A resolution in progress on the current thread.
///
/// Pushed by the recursive queries while they execute, so a request that
/// would re-enter one of them can be reported as a program error before
/// the substrate sees a cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Frame {
    Signature(NodeId),
    Instantiate(InstantiationKey),
    /// `instantiated` marks bodies of instantiated generics, which count
    /// towards the depth limit.
    Body { sig: SignatureId, instantiated: bool },
    ReturnType(SignatureId),
    ModuleStmt(NodeId),
    Fields(TypeId),
}

/// Why a frame could not be entered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reentry {
    /// The same frame is already active on this thread.
    Cycle,
    /// The instantiation chain is already as deep as the limit allows.
    TooDeep,
}

/// Bookkeeping for an instantiated body on the frame stack.
///
/// A chain is a run of instantiated bodies, each needed for a return type
/// of the one below it. Any other frame starts a new chain, so depths are
/// counted from the nearest module statement, concrete body, signature or
/// instantiation.
#[derive(Copy, Clone, Debug)]
struct Chain {
    /// 1 for the body that starts the chain.
    depth: usize,
    /// Deepest depth reached by this body's callees.
    reached: usize,
    /// A callee went past the limit and was reported here.
    stopped: bool,
}

#[derive(Debug)]
struct Active {
    frame: Frame,
    chain: Option<Chain>,
}

/// Innermost instantiated body of the current chain.
fn chain_top(stack: &mut [Active]) -> Option<&mut Chain> {
    for active in stack.iter_mut().rev() {
        match active.frame {
            Frame::Body {
                instantiated: true, ..
            } => return active.chain.as_mut(),
            Frame::ReturnType(_) => {}
            _ => return None,
        }
    }
    None
}

fn chain_depth(stack: &mut [Active]) -> usize {
    chain_top(stack).map_or(0, |c| c.depth)
}

/// Pops its frame when dropped.
pub(crate) struct FrameGuard<'c> {
    ctx: &'c Context,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let thread = std::thread::current().id();
        let mut frames = self.ctx.frames.lock();
        if let Some(stack) = frames.get_mut(&thread) {
            stack.pop();
            if stack.is_empty() {
                frames.remove(&thread);
            }
        }
    }
}

/// Owns the program inputs and all derived resolution state.
///
/// Inputs are replaced with [`Context::set_file`] between requests; every
/// resolution goes through memoized queries, so repeated requests reuse
/// earlier work and edits only invalidate what read the edited file.
/// Inputs must not change while a request is running.
pub struct Context {
    runtime: Runtime,
    interner: SharedInterner,
    types: TypePool,
    signatures: SignaturePool,
    config: ResolverConfig,
    pub(crate) registry: InstantiationRegistry,
    frames: Mutex<FxHashMap<ThreadId, Vec<Active>>>,

    files: InputStorage<FileId, Arc<Ast>>,
    file_list: InputStorage<(), Arc<[FileId]>>,
    pub(crate) scopes: DerivedStorage<ScopeQuery>,
    pub(crate) lookups: DerivedStorage<LookupQuery>,
    pub(crate) modules_named: DerivedStorage<ModulesNamed>,
    pub(crate) module_stmts: DerivedStorage<ResolveModuleStmt>,
    pub(crate) modules: DerivedStorage<ResolveModule>,
    pub(crate) initial_signatures: DerivedStorage<InitialSignature>,
    pub(crate) instantiations: DerivedStorage<Instantiate>,
    pub(crate) bodies: DerivedStorage<ResolveBody>,
    pub(crate) return_types: DerivedStorage<ReturnType>,
    pub(crate) fields: DerivedStorage<AggregateFields>,
}

impl Context {
    pub fn new(interner: SharedInterner) -> Self {
        Self::with_config(interner, ResolverConfig::default())
    }

    pub fn with_config(interner: SharedInterner, config: ResolverConfig) -> Self {
        use ingredients as ix;
        Context {
            runtime: Runtime::new(),
            interner,
            types: TypePool::new(),
            signatures: SignaturePool::new(),
            config,
            registry: InstantiationRegistry::default(),
            frames: Mutex::new(FxHashMap::default()),
            files: InputStorage::new(IngredientIndex::new(ix::FILES), "FileAst"),
            file_list: InputStorage::new(IngredientIndex::new(ix::FILE_LIST), "FileList"),
            scopes: DerivedStorage::new(IngredientIndex::new(ix::SCOPES)),
            lookups: DerivedStorage::new(IngredientIndex::new(ix::LOOKUPS)),
            modules_named: DerivedStorage::new(IngredientIndex::new(ix::MODULES_NAMED)),
            module_stmts: DerivedStorage::new(IngredientIndex::new(ix::MODULE_STMTS)),
            modules: DerivedStorage::new(IngredientIndex::new(ix::MODULES)),
            initial_signatures: DerivedStorage::new(IngredientIndex::new(ix::INITIAL_SIGNATURES)),
            instantiations: DerivedStorage::new(IngredientIndex::new(ix::INSTANTIATIONS)),
            bodies: DerivedStorage::new(IngredientIndex::new(ix::BODIES)),
            return_types: DerivedStorage::new(IngredientIndex::new(ix::RETURN_TYPES)),
            fields: DerivedStorage::new(IngredientIndex::new(ix::FIELDS)),
        }
    }

    // Inputs

    /// Add or replace the tree of one file. Returns whether anything
    /// changed; an identical tree keeps every memo valid.
    pub fn set_file(&self, ast: Ast) -> bool {
        let file = ast.file();
        let changed = self.files.set(self, file, Arc::new(ast));
        self.sync_file_list();
        changed
    }

    pub fn remove_file(&self, file: FileId) -> bool {
        let changed = self.files.remove(self, file);
        self.sync_file_list();
        changed
    }

    fn sync_file_list(&self) {
        let mut files = self.files.keys();
        files.sort();
        self.file_list.set(self, (), files.into());
    }

    /// Files currently loaded, in id order.
    pub fn file_ids(&self) -> Arc<[FileId]> {
        self.file_list
            .get(self, &())
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub(crate) fn ast(&self, file: FileId) -> Result<Arc<Ast>, InternalError> {
        self.files
            .get(self, &file)
            .ok_or(InternalError::UnknownFile { file: file.raw() })
    }

    /// Source span of `node`, or a dummy span for unknown nodes.
    pub fn span_of(&self, node: NodeId) -> Span {
        self.files
            .get(self, &node.file)
            .map_or(Span::DUMMY, |ast| ast.span(node))
    }

    // Shared state

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn types(&self) -> &TypePool {
        &self.types
    }

    pub fn signatures(&self) -> &SignaturePool {
        &self.signatures
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn signature(&self, id: SignatureId) -> Result<Arc<Signature>, InternalError> {
        self.signatures
            .get(id)
            .ok_or(InternalError::UnknownSignature { raw: id.raw() })
    }

    pub(crate) fn scope(&self, node: NodeId) -> Result<Arc<Scope>, InternalError> {
        ScopeQuery::get(self, node)
    }

    // Resolution frames

    /// Whether entering `frame` would re-enter an active resolution.
    pub(crate) fn reentry(&self, frame: &Frame) -> Option<Reentry> {
        let mut frames = self.frames.lock();
        let stack = frames.get_mut(&std::thread::current().id())?;
        if stack.iter().any(|a| a.frame == *frame) {
            return Some(Reentry::Cycle);
        }
        if matches!(frame, Frame::Body { instantiated: true, .. })
            && chain_depth(stack) >= self.config.max_instantiation_depth
        {
            return Some(Reentry::TooDeep);
        }
        None
    }

    pub(crate) fn push_frame(&self, frame: Frame) -> FrameGuard<'_> {
        let mut frames = self.frames.lock();
        let stack = frames.entry(std::thread::current().id()).or_default();
        let chain = matches!(frame, Frame::Body { instantiated: true, .. }).then(|| {
            let depth = chain_depth(stack) + 1;
            Chain {
                depth,
                reached: depth,
                stopped: false,
            }
        });
        stack.push(Active { frame, chain });
        FrameGuard { ctx: self }
    }

    /// Depth of the current chain; 0 outside instantiated bodies.
    pub(crate) fn chain_depth(&self) -> usize {
        let mut frames = self.frames.lock();
        frames
            .get_mut(&std::thread::current().id())
            .map_or(0, |stack| chain_depth(stack))
    }

    /// Record that a callee of the current body needed the chain to reach
    /// `depth`.
    pub(crate) fn reach(&self, depth: usize) {
        let mut frames = self.frames.lock();
        if let Some(chain) = frames
            .get_mut(&std::thread::current().id())
            .and_then(|stack| chain_top(stack))
        {
            chain.reached = chain.reached.max(depth);
        }
    }

    /// Record that the current body reported a chain that went too deep.
    pub(crate) fn stop_chain(&self) {
        let mut frames = self.frames.lock();
        if let Some(chain) = frames
            .get_mut(&std::thread::current().id())
            .and_then(|stack| chain_top(stack))
        {
            chain.stopped = true;
        }
    }

    /// Height of the instantiated body on top of the stack: how many
    /// nested instantiated bodies it needs, itself included. A body that
    /// stopped a chain is taller than any limit allows.
    pub(crate) fn chain_height(&self) -> usize {
        let frames = self.frames.lock();
        let top = frames
            .get(&std::thread::current().id())
            .and_then(|stack| stack.last())
            .and_then(|a| a.chain);
        match top {
            None => 0,
            Some(chain) if chain.stopped => self.config.max_instantiation_depth + 1,
            Some(chain) => chain.reached - chain.depth + 1,
        }
    }
}

impl Database for Context {
    type Error = InternalError;

    fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    fn ingredient(&self, index: IngredientIndex) -> Option<&dyn Ingredient<Self>> {
        use ingredients as ix;
        match index.raw() {
            ix::FILES => Some(&self.files),
            ix::FILE_LIST => Some(&self.file_list),
            ix::SCOPES => Some(&self.scopes),
            ix::LOOKUPS => Some(&self.lookups),
            ix::MODULES_NAMED => Some(&self.modules_named),
            ix::MODULE_STMTS => Some(&self.module_stmts),
            ix::MODULES => Some(&self.modules),
            ix::INITIAL_SIGNATURES => Some(&self.initial_signatures),
            ix::INSTANTIATIONS => Some(&self.instantiations),
            ix::BODIES => Some(&self.bodies),
            ix::RETURN_TYPES => Some(&self.return_types),
            ix::FIELDS => Some(&self.fields),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("runtime", &self.runtime)
            .field("types", &self.types)
            .field("signatures", &self.signatures)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
