//! The downstream rule registry: the set of named ninja rules a project's
//! loader modules contribute (`compile_c`, `archive`, `link_program`, ...),
//! each with the argument map (command template, description, depfile
//! handling) the emitter writes out verbatim.
//!
//! Two modules are free to register the same rule with identical arguments
//! — that's just two plugins agreeing on how to build `.c` files, say — but
//! disagreeing definitions are a loader-time error: the graph cannot route
//! the same rule name to two different commands.

use crate::error::CoreError;
use std::collections::HashMap;

pub type RuleArgs = HashMap<String, String>;

struct RuleDef {
    modules: Vec<String>,
    args: RuleArgs,
}

#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<String, RuleDef>,
}

impl RuleRegistry {
    pub fn new() -> RuleRegistry {
        RuleRegistry { rules: HashMap::new() }
    }

    pub fn add(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        args: RuleArgs,
    ) -> Result<(), CoreError> {
        let module = module.into();
        let name = name.into();
        match self.rules.get_mut(&name) {
            None => {
                self.rules.insert(name, RuleDef { modules: vec![module], args });
            }
            Some(existing) if existing.args == args => {
                existing.modules.push(module);
            }
            Some(existing) => {
                return Err(CoreError::IncompatibleRule {
                    name,
                    old_module: existing.modules.join(", "),
                    new_module: module,
                });
            }
        }
        Ok(())
    }

    /// `(name, contributing modules, arguments)`, one per registered rule.
    pub fn all(&self) -> Vec<(String, Vec<String>, RuleArgs)> {
        self.rules.iter().map(|(name, def)| (name.clone(), def.modules.clone(), def.args.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_of_a_rule_succeeds() {
        let mut registry = RuleRegistry::new();
        let mut args = RuleArgs::new();
        args.insert("command".to_owned(), "$cc -c $in -o $out".to_owned());
        registry.add("c_plugin", "compile_c", args).unwrap();
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn identical_redefinition_from_another_module_merges() {
        let mut registry = RuleRegistry::new();
        let mut args = RuleArgs::new();
        args.insert("command".to_owned(), "$cc -c $in -o $out".to_owned());
        registry.add("mod_a", "compile_c", args.clone()).unwrap();
        registry.add("mod_b", "compile_c", args).unwrap();
        let all = registry.all();
        assert_eq!(all[0].1, vec!["mod_a".to_owned(), "mod_b".to_owned()]);
    }

    #[test]
    fn conflicting_redefinition_is_an_error() {
        let mut registry = RuleRegistry::new();
        let mut args_a = RuleArgs::new();
        args_a.insert("command".to_owned(), "$cc -c $in -o $out".to_owned());
        registry.add("mod_a", "compile_c", args_a).unwrap();

        let mut args_b = RuleArgs::new();
        args_b.insert("command".to_owned(), "$cc -O2 -c $in -o $out".to_owned());
        let err = registry.add("mod_b", "compile_c", args_b).unwrap_err();
        assert!(matches!(err, CoreError::IncompatibleRule { .. }));
    }
}
