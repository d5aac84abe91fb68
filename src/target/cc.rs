//! Shared compile-step logic for the two C-like kinds (`Program`,
//! `Library`): both turn a list of source files into object files with the
//! same `compile_c` rule, parameterized by the env in scope at the point
//! each target is evaluated.

use crate::env::Env;
use crate::ident::Ident;
use crate::product::{product, ProductRecord, IMPLICIT_KEY, ORDER_ONLY_KEY};
use crate::project::Package;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn compile_sources(
    ident: &Ident,
    package: &Package,
    env: &Env,
    sources: &[PathBuf],
) -> (Vec<PathBuf>, Vec<ProductRecord>) {
    let mut objects = Vec::with_capacity(sources.len());
    let mut products = Vec::with_capacity(sources.len());

    for source in sources {
        let input = package.inpath(&source.to_string_lossy());
        let object_name = object_file_name(ident, source);
        let output = package.outpath(env, &[&object_name]);

        let mut variables = BTreeMap::new();
        if let Some(cflags) = env.get("cflags") {
            variables.insert("cflags".to_owned(), cflags.clone());
        }
        if let Some(cc) = env.get("cc") {
            variables.insert("cc".to_owned(), cc.clone());
        }
        // A dependency's using-delta (e.g. a preprocess step's generated
        // header) may have left edge-scoped implicit/order-only deps on
        // these reserved keys; carry them onto this compile edge so
        // `product()` can extract them into the final record.
        if let Some(implicit) = env.get(IMPLICIT_KEY) {
            variables.insert(IMPLICIT_KEY.to_owned(), implicit.clone());
        }
        if let Some(order_only) = env.get(ORDER_ONLY_KEY) {
            variables.insert(ORDER_ONLY_KEY.to_owned(), order_only.clone());
        }

        products.push(product("compile_c", vec![output.clone()], vec![input], variables));
        objects.push(output);
    }

    (objects, products)
}

fn object_file_name(ident: &Ident, source: &Path) -> String {
    let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    format!("{}_{}.o", ident.target_name_or_default(), stem)
}
