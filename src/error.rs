use crate::ident::Ident;
use std::path::PathBuf;

/// All errors the core can raise. Every variant is fatal to the evaluation
/// run in progress — there is no local recovery, only enough context for the
/// caller to point at the cause.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("duplicate package at {relpath}")]
    DuplicatePackage { relpath: String },

    #[error("duplicate target {name} in package {relpath}")]
    DuplicateTarget { relpath: String, name: String },

    #[error("duplicate named environment {name}")]
    DuplicateEnv { name: String },

    #[error("no such target: {0}")]
    UnknownTarget(Ident),

    #[error("named environment {0} has no such base")]
    UnknownEnvBase(String),

    #[error("bad identifier: {0}")]
    BadIdentifier(String),

    #[error(
        "rule {name} defined in {new_module} is incompatible with its earlier definition in {old_module}"
    )]
    IncompatibleRule { name: String, old_module: String, new_module: String },

    #[error("incompatible duplicate products for output(s) {outputs}")]
    IncompatibleDuplicateProducts { outputs: String },

    #[error("invalid type in environment key {key}")]
    InvalidEnvValue { key: String },

    #[error("environment key {key} not found; available keys are: {available}")]
    InterpolationMissingKey { key: String, available: String },

    #[error("dependency cycle detected: {}", path.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" -> "))]
    Cycle { path: Vec<Ident> },

    #[error("could not read project description at {path}: {source}")]
    LoaderIo { path: PathBuf, #[source] source: std::io::Error },

    #[error("could not parse project description at {path}: {source}")]
    LoaderParse { path: PathBuf, #[source] source: Box<toml::de::Error> },
}

pub type CoreResult<T> = Result<T, CoreError>;
