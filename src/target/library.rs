use super::cc::compile_sources;
use crate::delta::{append, make_appending_delta, Delta};
use crate::env::{Env, EnvValue};
use crate::error::CoreError;
use crate::ident::Ident;
use crate::product::{product, ProductRecord};
use crate::project::Package;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A static library: compiles its own sources, archives them, and hands
/// consumers a using-delta that prepends the archive to `linksrcs` and
/// appends its own include directory to `cflags`. Transparent — those
/// effects must reach every target above it, not just its direct parent.
pub struct Library {
    pub sources: Vec<PathBuf>,
}

impl Library {
    pub fn build(
        &self,
        ident: &Ident,
        package: &Package,
        env: &Env,
    ) -> Result<(Vec<Delta>, Vec<ProductRecord>), CoreError> {
        let (objects, mut products) = compile_sources(ident, package, env, &self.sources);

        let archive_name = format!("lib{}.a", ident.target_name_or_default());
        let archive = package.outpath(env, &[&archive_name]);

        let mut variables = BTreeMap::new();
        if let Some(ar) = env.get("ar") {
            variables.insert("ar".to_owned(), ar.clone());
        }

        products.push(product("archive", vec![archive.clone()], objects, variables));

        let include_dir = package.relpath.clone();
        let using_delta = make_appending_delta([
            ("cflags", EnvValue::from(format!("-I{include_dir}"))),
        ]);
        let mut using_delta = using_delta;
        using_delta.push(append(
            "linksrcs",
            EnvValue::from(vec![EnvValue::from(archive.to_string_lossy().into_owned())]),
        ));

        Ok((using_delta, products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    #[test]
    fn library_build_archives_its_objects_and_exposes_include_path() {
        let project = Project::new("root", "out");
        let pkg = project.add_package("libx").unwrap();
        let ident = pkg.add_target("x").unwrap();
        let library = Library { sources: vec![PathBuf::from("x.c")] };
        let env = Env::empty();

        let (using_delta, products) = library.build(&ident, &pkg, &env).unwrap();
        assert_eq!(products.last().unwrap().rule, "archive");

        let derived = env.derive(&using_delta).unwrap();
        assert_eq!(derived.get("cflags"), Some(&EnvValue::from("-Ilibx")));
        assert!(derived.contains("linksrcs"));
    }
}
