//! `weave_core`: a contextual build-graph evaluator. Given a tree of
//! packages and targets, each carrying environment deltas, it walks the
//! dependency graph once per `(target, environment)` pair reached and
//! produces the ninja build products the [`crate::emitter`] writes out.

pub mod dedup;
pub mod delta;
pub mod emitter;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod ident;
pub mod loader;
pub mod product;
pub mod project;
pub mod rule;
pub mod target;
pub mod topo;

pub use error::{CoreError, CoreResult};
pub use ident::Ident;
