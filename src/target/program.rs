use super::cc::compile_sources;
use crate::delta::Delta;
use crate::env::{Env, EnvValue};
use crate::error::CoreError;
use crate::ident::Ident;
use crate::product::{product, ProductRecord, IMPLICIT_KEY};
use crate::project::Package;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An executable: compiles its own sources, then links them together with
/// whatever object files and archives its dependencies contributed through
/// their using-deltas (the `linksrcs` key). Opaque — nothing above a
/// program in the graph ever depends on it, so its using-delta is empty.
pub struct Program {
    pub sources: Vec<PathBuf>,
}

impl Program {
    pub fn build(
        &self,
        ident: &Ident,
        package: &Package,
        env: &Env,
    ) -> Result<(Vec<Delta>, Vec<ProductRecord>), CoreError> {
        let (objects, mut products) = compile_sources(ident, package, env, &self.sources);

        let mut linksrcs = objects;
        linksrcs.extend(env.get_list("linksrcs").into_iter().filter_map(|v| v.as_str().map(PathBuf::from)));

        let binary_name = ident.target_name_or_default();
        // Env-hermetic, digest-qualified path: this is what lets the same
        // program be built twice under two different environments without
        // the two link edges colliding on the same output.
        let binary = package.outpath(env, &[&binary_name]);

        let mut variables = BTreeMap::new();
        if let Some(lflags) = env.get("lflags") {
            variables.insert("lflags".to_owned(), lflags.clone());
        }
        if let Some(cc) = env.get("cc") {
            variables.insert("cc".to_owned(), cc.clone());
        }
        products.push(product("link_program", vec![binary.clone()], linksrcs, variables));

        // A stable "latest" symlink pointing at the digest-qualified binary,
        // so downstream tooling and humans have one unchanging path to run
        // regardless of which environment most recently built it.
        let symlink_path = package.leafpath(&[&binary_name]);
        let symlink_target = relative_path(&binary, symlink_path.parent().unwrap_or_else(|| Path::new("")));
        let mut symlink_vars = BTreeMap::new();
        symlink_vars
            .insert("symlink_target".to_owned(), EnvValue::from(symlink_target.to_string_lossy().into_owned()));
        symlink_vars.insert(
            IMPLICIT_KEY.to_owned(),
            EnvValue::from(vec![EnvValue::from(binary.to_string_lossy().into_owned())]),
        );
        products.push(product("symlink_leaf", vec![symlink_path], Vec::new(), symlink_vars));

        // Programs are a terminal consumer: using_delta stays empty,
        // nothing is meant to depend on a program.
        Ok((Vec::new(), products))
    }
}

/// `target`'s path relative to `from_dir`, via `..` for each leading
/// directory `from_dir` doesn't share with it. A small local stand-in for
/// `os.path.relpath` — there's no path-diffing crate in the dependency
/// table, and this is the only place one is needed.
fn relative_path(target: &Path, from_dir: &Path) -> PathBuf {
    let target_components: Vec<_> = target.components().collect();
    let from_components: Vec<_> = from_dir.components().collect();
    let shared = target_components.iter().zip(from_components.iter()).take_while(|(a, b)| a == b).count();

    let mut result = PathBuf::new();
    for _ in shared..from_components.len() {
        result.push("..");
    }
    for component in &target_components[shared..] {
        result.push(component.as_os_str());
    }
    result
}
