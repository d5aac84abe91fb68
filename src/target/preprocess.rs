use crate::delta::{append, Delta};
use crate::env::{Env, EnvValue};
use crate::error::CoreError;
use crate::ident::Ident;
use crate::product::{product, ProductRecord, IMPLICIT_KEY};
use crate::project::Package;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Runs a single input through a template/substitution rule to produce one
/// generated file (e.g. expanding a `config.h.in`). The `preprocess` rule's
/// command is just `$preprocess_cmd $in $out`, so `preprocess_cmd` carries
/// the actual tool invocation (an `m4` call, a codegen script, ...).
/// Transparent: consumers need the generated directory on their include
/// path to see the result, the same way a library's headers need to be
/// visible.
pub struct Preprocess {
    pub input: PathBuf,
    pub output_name: String,
}

impl Preprocess {
    pub fn build(
        &self,
        _ident: &Ident,
        package: &Package,
        env: &Env,
    ) -> Result<(Vec<Delta>, Vec<ProductRecord>), CoreError> {
        let input = package.inpath(&self.input.to_string_lossy());
        let output = package.genpath(&[&package.relpath, &self.output_name]);

        let mut variables = BTreeMap::new();
        if let Some(cmd) = env.get("preprocess_cmd") {
            variables.insert("preprocess_cmd".to_owned(), cmd.clone());
        }

        let products = vec![product("preprocess", vec![output.clone()], vec![input], variables)];

        let gen_dir = output.parent().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
        let using_delta = vec![
            append("cflags", EnvValue::from(format!("-I{gen_dir}"))),
            // Consumers compile against the generated header, so it must be
            // an implicit dependency of their compile edge or ninja has no
            // ordering guarantee it exists yet.
            append(
                IMPLICIT_KEY,
                EnvValue::from(vec![EnvValue::from(output.to_string_lossy().into_owned())]),
            ),
        ];

        Ok((using_delta, products))
    }
}
