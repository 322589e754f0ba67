//! Query definitions. Each delegates to the module that owns the logic.

use std::sync::Arc;

use crest_ir::{Name, NodeId};
use crest_query::{DerivedStorage, Query};
use crest_types::{QualifiedType, SignatureId, TypeId};

use crate::aggregate::{self, FieldsInfo};
use crate::driver;
use crate::error::InternalError;
use crate::instantiate::{self, InstantiateOutcome, InstantiationKey};
use crate::lookup::{self, LookupMode, LookupResult};
use crate::result::ResolutionResult;
use crate::returns;
use crate::scope::{build_scope, Scope};
use crate::signature::{self, SignatureInfo};
use crate::Context;

pub(crate) struct ScopeQuery;

impl Query for ScopeQuery {
    type Db = Context;
    type Key = NodeId;
    type Value = Arc<Scope>;
    const NAME: &'static str = "scope";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.scopes
    }

    fn execute(db: &Context, node: &NodeId) -> Result<Arc<Scope>, InternalError> {
        let ast = db.ast(node.file)?;
        build_scope(&ast, *node).map(Arc::new)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct LookupKey {
    pub scope: NodeId,
    pub name: Name,
    pub mode: LookupMode,
}

pub(crate) struct LookupQuery;

impl Query for LookupQuery {
    type Db = Context;
    type Key = LookupKey;
    type Value = Arc<LookupResult>;
    const NAME: &'static str = "lookup";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.lookups
    }

    fn execute(db: &Context, key: &LookupKey) -> Result<Arc<LookupResult>, InternalError> {
        lookup::lookup(db, key.scope, key.name, key.mode).map(Arc::new)
    }
}

pub(crate) struct ModulesNamed;

impl Query for ModulesNamed {
    type Db = Context;
    type Key = Name;
    type Value = Arc<[NodeId]>;
    const NAME: &'static str = "modules_named";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.modules_named
    }

    fn execute(db: &Context, name: &Name) -> Result<Arc<[NodeId]>, InternalError> {
        lookup::modules_named(db, *name)
    }
}

pub(crate) struct ResolveModuleStmt;

impl Query for ResolveModuleStmt {
    type Db = Context;
    type Key = NodeId;
    type Value = Arc<ResolutionResult>;
    const NAME: &'static str = "resolve_module_stmt";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.module_stmts
    }

    fn execute(db: &Context, stmt: &NodeId) -> Result<Arc<ResolutionResult>, InternalError> {
        driver::resolve_module_stmt(db, *stmt).map(Arc::new)
    }
}

pub(crate) struct ResolveModule;

impl Query for ResolveModule {
    type Db = Context;
    type Key = NodeId;
    type Value = Arc<ResolutionResult>;
    const NAME: &'static str = "resolve_module";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.modules
    }

    fn execute(db: &Context, module: &NodeId) -> Result<Arc<ResolutionResult>, InternalError> {
        driver::resolve_module(db, *module).map(Arc::new)
    }
}

pub(crate) struct InitialSignature;

impl Query for InitialSignature {
    type Db = Context;
    type Key = NodeId;
    type Value = Arc<SignatureInfo>;
    const NAME: &'static str = "initial_signature";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.initial_signatures
    }

    fn execute(db: &Context, decl: &NodeId) -> Result<Arc<SignatureInfo>, InternalError> {
        signature::initial_signature(db, *decl).map(Arc::new)
    }
}

pub(crate) struct Instantiate;

impl Query for Instantiate {
    type Db = Context;
    type Key = InstantiationKey;
    type Value = Arc<InstantiateOutcome>;
    const NAME: &'static str = "instantiate";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.instantiations
    }

    fn execute(
        db: &Context,
        key: &InstantiationKey,
    ) -> Result<Arc<InstantiateOutcome>, InternalError> {
        instantiate::instantiate(db, key).map(Arc::new)
    }
}

pub(crate) struct ResolveBody;

impl Query for ResolveBody {
    type Db = Context;
    type Key = SignatureId;
    type Value = Arc<ResolutionResult>;
    const NAME: &'static str = "resolve_body";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.bodies
    }

    fn execute(db: &Context, sig: &SignatureId) -> Result<Arc<ResolutionResult>, InternalError> {
        driver::resolve_body(db, *sig).map(Arc::new)
    }
}

pub(crate) struct ReturnType;

impl Query for ReturnType {
    type Db = Context;
    type Key = SignatureId;
    type Value = QualifiedType;
    const NAME: &'static str = "return_type";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.return_types
    }

    fn execute(db: &Context, sig: &SignatureId) -> Result<QualifiedType, InternalError> {
        returns::return_type(db, *sig)
    }
}

pub(crate) struct AggregateFields;

impl Query for AggregateFields {
    type Db = Context;
    type Key = TypeId;
    type Value = Arc<FieldsInfo>;
    const NAME: &'static str = "aggregate_fields";

    fn storage(db: &Context) -> &DerivedStorage<Self> {
        &db.fields
    }

    fn execute(db: &Context, ty: &TypeId) -> Result<Arc<FieldsInfo>, InternalError> {
        aggregate::fields(db, *ty).map(Arc::new)
    }
}
