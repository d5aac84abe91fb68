//! Targets: the nodes of the build graph. Each carries the deltas that
//! shape its own local environment, the identifiers of the targets it
//! depends on, and a `TargetKind` describing what it actually builds.
//!
//! `TargetKind` is a plain enum rather than a trait object: the set of
//! kinds is closed and known up front, every kind needs the same few hooks,
//! and matching on a concrete variant is both cheaper and easier to follow
//! than a vtable here.

mod cc;
mod generic;
mod library;
mod preprocess;
mod program;

pub use generic::Generic;
pub use library::Library;
pub use preprocess::Preprocess;
pub use program::Program;

use crate::delta::Delta;
use crate::env::Env;
use crate::error::CoreError;
use crate::ident::Ident;
use crate::product::ProductRecord;
use crate::project::Package;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub enum TargetKind {
    Program(Program),
    Library(Library),
    Preprocess(Preprocess),
    Generic(Generic),
}

impl TargetKind {
    /// Whether this target's using-delta should keep propagating to
    /// grandparents once merged into a dependent's closure (a library's
    /// include paths and link inputs need to reach everything above it) or
    /// whether it terminates the closure here (a program is never itself a
    /// dependency of anything, so nothing needs to see past it).
    pub fn transparent(&self) -> bool {
        match self {
            TargetKind::Library(_) | TargetKind::Preprocess(_) => true,
            TargetKind::Program(_) | TargetKind::Generic(_) => false,
        }
    }

    /// Whether this target belongs in the project's default top-level build
    /// set (`weave build` with no explicit target list builds every leaf).
    pub fn default_leaf(&self) -> bool {
        match self {
            TargetKind::Program(_) | TargetKind::Generic(_) => true,
            TargetKind::Library(_) | TargetKind::Preprocess(_) => false,
        }
    }

    /// This target's own products, computed once every dependency's
    /// using-delta has already been folded into `env`. Returns
    /// `(using_delta, products)`.
    pub fn build(
        &self,
        ident: &Ident,
        package: &Package,
        env: &Env,
    ) -> Result<(Vec<Delta>, Vec<ProductRecord>), CoreError> {
        match self {
            TargetKind::Program(p) => p.build(ident, package, env),
            TargetKind::Library(l) => l.build(ident, package, env),
            TargetKind::Preprocess(p) => p.build(ident, package, env),
            TargetKind::Generic(g) => g.build(ident, package, env),
        }
    }
}

/// A single cache entry: the merged dependency closure and the products
/// this target (and everything beneath it) contributed, for one particular
/// up-env.
#[derive(Clone)]
pub struct Evaluation {
    pub dep_map: crate::topo::DepMap,
    pub products: Vec<ProductRecord>,
}

pub struct Target {
    pub ident: Ident,
    pub kind: TargetKind,
    /// Dependencies, in authoring order — `deps` key in the loader's
    /// description. Order only matters for `__implicit__`/`__order_only__`
    /// bookkeeping upstream; the graph itself is order-independent.
    pub deps: Vec<Ident>,
    /// Extra deltas applied once, before anything else, to the environment
    /// a target is evaluated under — on top of whatever base `env_name`
    /// selects.
    pub down_delta: Vec<Delta>,
    /// A named base environment (resolved against `Project::named_envs`)
    /// this target roots itself in instead of the one its caller passed
    /// down. `program`-like leaf targets typically set this; library-ish
    /// targets typically leave it `None` and inherit whatever their
    /// consumer is building under.
    pub env_name: Option<String>,
    cache: RefCell<HashMap<String, Evaluation>>,
}

impl Target {
    pub fn new(
        ident: Ident,
        kind: TargetKind,
        deps: Vec<Ident>,
        down_delta: Vec<Delta>,
        env_name: Option<String>,
    ) -> Rc<Target> {
        Rc::new(Target { ident, kind, deps, down_delta, env_name, cache: RefCell::new(HashMap::new()) })
    }

    pub fn cached(&self, env_digest: &str) -> Option<Evaluation> {
        self.cache.borrow().get(env_digest).cloned()
    }

    pub fn store(&self, env_digest: String, evaluation: Evaluation) {
        self.cache.borrow_mut().insert(env_digest, evaluation);
    }

    pub fn transparent(&self) -> bool {
        self.kind.transparent()
    }

    pub fn leaf(&self) -> bool {
        self.kind.default_leaf()
    }
}
