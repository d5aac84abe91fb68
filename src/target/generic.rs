use crate::delta::Delta;
use crate::env::Env;
use crate::error::CoreError;
use crate::ident::Ident;
use crate::product::{product, ProductRecord};
use crate::project::Package;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// An arbitrary rule invocation with explicit inputs and outputs — the
/// escape hatch for anything that doesn't fit the program/library/
/// preprocess shapes (a code generator, a test runner, a packaging step).
/// Opaque and a default leaf: generic targets are typically run directly,
/// not depended on for their effects.
pub struct Generic {
    pub rule: String,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

impl Generic {
    pub fn build(
        &self,
        _ident: &Ident,
        package: &Package,
        env: &Env,
    ) -> Result<(Vec<Delta>, Vec<ProductRecord>), CoreError> {
        let inputs: Vec<PathBuf> =
            self.inputs.iter().map(|p| package.inpath(&p.to_string_lossy())).collect();
        let outputs: Vec<PathBuf> =
            self.outputs.iter().map(|p| package.outpath(env, &[&p.to_string_lossy()])).collect();

        let variables: BTreeMap<String, _> = env.dict_copy().into_iter().collect();

        let products = vec![product(self.rule.clone(), outputs, inputs, variables)];
        Ok((Vec::new(), products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    #[test]
    fn generic_build_uses_the_declared_rule_name_verbatim() {
        let project = Project::new("root", "out");
        let pkg = project.add_package("tools").unwrap();
        let ident = pkg.add_target("codegen").unwrap();
        let generic = Generic {
            rule: "run_codegen".to_owned(),
            inputs: vec![PathBuf::from("schema.proto")],
            outputs: vec![PathBuf::from("schema.rs")],
        };
        let env = Env::empty();
        let (using_delta, products) = generic.build(&ident, &pkg, &env).unwrap();
        assert!(using_delta.is_empty());
        assert_eq!(products[0].rule, "run_codegen");
    }
}
