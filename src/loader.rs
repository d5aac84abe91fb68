//! Reads a project description from a TOML file into a fully populated
//! [`Project`]. Unlike the scripting-language loaders this design is
//! descended from, there is no embedded interpreter here — packages,
//! targets, and named environments are just typed data, deserialized with
//! `serde` and turned directly into the graph's own types.

use crate::env::{Env, EnvValue};
use crate::error::CoreError;
use crate::ident::Ident;
use crate::project::Project;
use crate::rule::RuleArgs;
use crate::target::{Generic, Library, Preprocess, Program, Target, TargetKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Deserialize)]
struct ProjectFile {
    #[serde(default = "default_root")]
    root: PathBuf,
    #[serde(default = "default_outroot")]
    outroot: PathBuf,
    #[serde(default)]
    env: HashMap<String, HashMap<String, toml::Value>>,
    #[serde(default)]
    package: Vec<PackageFile>,
    #[serde(default)]
    rule: Vec<RuleFile>,
}

/// A project-declared ninja rule, for `generic` targets whose rule name
/// isn't one of the four built in ones.
#[derive(Deserialize)]
struct RuleFile {
    name: String,
    #[serde(flatten)]
    args: HashMap<String, String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_outroot() -> PathBuf {
    PathBuf::from("build")
}

#[derive(Deserialize)]
struct PackageFile {
    path: String,
    #[serde(default)]
    target: Vec<TargetFile>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TargetFile {
    Program {
        name: String,
        sources: Vec<PathBuf>,
        #[serde(default)]
        deps: Vec<String>,
        /// Named base environment (see `[env.*]`) this program roots itself
        /// in, overriding whatever environment its caller is building
        /// under. Defaults to none, i.e. inherit the caller's environment.
        #[serde(default)]
        env_name: Option<String>,
    },
    Library {
        name: String,
        sources: Vec<PathBuf>,
        #[serde(default)]
        deps: Vec<String>,
        #[serde(default)]
        env_name: Option<String>,
    },
    Preprocess {
        name: String,
        input: PathBuf,
        output_name: String,
        #[serde(default)]
        deps: Vec<String>,
        #[serde(default)]
        env_name: Option<String>,
    },
    Generic {
        name: String,
        rule: String,
        #[serde(default)]
        inputs: Vec<PathBuf>,
        #[serde(default)]
        outputs: Vec<PathBuf>,
        #[serde(default)]
        deps: Vec<String>,
        #[serde(default)]
        env_name: Option<String>,
    },
}

impl TargetFile {
    fn name(&self) -> &str {
        match self {
            TargetFile::Program { name, .. }
            | TargetFile::Library { name, .. }
            | TargetFile::Preprocess { name, .. }
            | TargetFile::Generic { name, .. } => name,
        }
    }

    fn deps(&self) -> &[String] {
        match self {
            TargetFile::Program { deps, .. }
            | TargetFile::Library { deps, .. }
            | TargetFile::Preprocess { deps, .. }
            | TargetFile::Generic { deps, .. } => deps,
        }
    }

    fn env_name(&self) -> Option<&str> {
        match self {
            TargetFile::Program { env_name, .. }
            | TargetFile::Library { env_name, .. }
            | TargetFile::Preprocess { env_name, .. }
            | TargetFile::Generic { env_name, .. } => env_name.as_deref(),
        }
    }

    fn into_kind(self) -> TargetKind {
        match self {
            TargetFile::Program { sources, .. } => TargetKind::Program(Program { sources }),
            TargetFile::Library { sources, .. } => TargetKind::Library(Library { sources }),
            TargetFile::Preprocess { input, output_name, .. } => {
                TargetKind::Preprocess(Preprocess { input, output_name })
            }
            TargetFile::Generic { rule, inputs, outputs, .. } => {
                TargetKind::Generic(Generic { rule, inputs, outputs })
            }
        }
    }
}

/// Loads a project description from `path`.
pub fn load(path: &Path) -> Result<Rc<Project>, CoreError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| CoreError::LoaderIo { path: path.to_path_buf(), source })?;
    load_str(&contents, path)
}

fn load_str(contents: &str, path: &Path) -> Result<Rc<Project>, CoreError> {
    let file: ProjectFile = toml::from_str(contents)
        .map_err(|source| CoreError::LoaderParse { path: path.to_path_buf(), source: Box::new(source) })?;

    let project = Project::new(file.root, file.outroot);
    register_builtin_rules(&project)?;
    for rule_file in file.rule {
        project.add_rule("project", rule_file.name, rule_file.args)?;
    }

    for (name, vars) in file.env {
        let mut entries = Vec::with_capacity(vars.len());
        for (key, value) in vars {
            entries.push((key.clone(), toml_to_env_value(&key, &value)?));
        }
        let env = Env::new(entries)?;
        project.add_named_env(name, env)?;
    }

    for package_file in file.package {
        let package = project.add_package(package_file.path.clone())?;

        // Reserve every name up front so forward references between
        // targets in the same package (and cross-package deps declared
        // before their target is registered) resolve correctly.
        let mut idents = HashMap::new();
        for target_file in &package_file.target {
            idents.insert(target_file.name().to_owned(), package.add_target(target_file.name())?);
        }

        for target_file in package_file.target {
            let name = target_file.name().to_owned();
            let ident = idents.remove(&name).expect("reserved above");
            let deps = target_file
                .deps()
                .iter()
                .map(|reference| package.resolve(reference))
                .collect::<Result<Vec<Ident>, CoreError>>()?;
            let env_name = target_file.env_name().map(|s| s.to_owned());
            let kind = target_file.into_kind();
            let target = Target::new(ident, kind, deps, Vec::new(), env_name);
            package.register_target(&name, target);
        }
    }

    validate_dependencies(&project)?;
    Ok(project)
}

/// Registers the ninja rule definitions the four built-in target kinds
/// emit products under. In the scripting-language loader this is
/// descended from, each plugin module contributes a `ninja_rules` dict
/// when it's imported; there are no plugin modules here, so the loader
/// itself plays that role once, up front, for the kinds it knows about.
fn register_builtin_rules(project: &Project) -> Result<(), CoreError> {
    let rules: &[(&str, &[(&str, &str)])] = &[
        (
            "compile_c",
            &[("command", "$cc $cflags -c -o $out $in"), ("description", "CC $out")],
        ),
        (
            "archive",
            &[("command", "rm -f $out && $ar rcs $out $in"), ("description", "AR $out")],
        ),
        (
            "link_program",
            &[("command", "$cc $lflags -o $out $in"), ("description", "LINK $out")],
        ),
        (
            "preprocess",
            &[("command", "$preprocess_cmd $in $out"), ("description", "GEN $out")],
        ),
        (
            "symlink_leaf",
            &[("command", "ln -sf $symlink_target $out"), ("description", "SYMLINK $out")],
        ),
    ];
    for (name, args) in rules {
        let args: RuleArgs = args.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        project.add_rule("builtin", *name, args)?;
    }
    Ok(())
}

/// Resolves every target's dependency list against the now-fully-loaded
/// project, so a typo in a `deps` entry is reported once, at load time,
/// instead of lazily the first time evaluation happens to reach it.
fn validate_dependencies(project: &Project) -> Result<(), CoreError> {
    for package in project.packages() {
        for target in package.targets() {
            for dep in &target.deps {
                project.find_target(dep)?;
            }
        }
    }
    Ok(())
}

fn toml_to_env_value(key: &str, value: &toml::Value) -> Result<EnvValue, CoreError> {
    match value {
        toml::Value::String(s) => Ok(EnvValue::from(s.clone())),
        toml::Value::Integer(n) => Ok(EnvValue::from(*n)),
        toml::Value::Array(items) => {
            let converted =
                items.iter().map(|v| toml_to_env_value(key, v)).collect::<Result<Vec<_>, _>>()?;
            Ok(EnvValue::Tuple(converted))
        }
        _ => Err(CoreError::InvalidEnvValue { key: key.to_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
        outroot = "out"

        [env.host]
        cc = "cc"
        cflags = ["-Wall"]

        [[package]]
        path = "libx"

        [[package.target]]
        kind = "library"
        name = "x"
        sources = ["x.c"]

        [[package]]
        path = "app"

        [[package.target]]
        kind = "program"
        name = "app"
        sources = ["main.c"]
        deps = ["//libx:x"]
    "#;

    #[test]
    fn loads_packages_targets_and_named_envs() {
        let project = load_str(SIMPLE, Path::new("project.toml")).unwrap();
        let env = project.named_env("host").unwrap();
        assert_eq!(env.get("cc"), Some(&EnvValue::from("cc")));

        let app = project.find_target(&Ident::parse("//app:app").unwrap()).unwrap();
        assert_eq!(app.deps, vec![Ident::parse("//libx:x").unwrap()]);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = load_str("not valid = [", Path::new("project.toml")).unwrap_err();
        assert!(matches!(err, CoreError::LoaderParse { .. }));
    }

    #[test]
    fn builtin_rules_are_registered_for_every_project() {
        let project = load_str(SIMPLE, Path::new("project.toml")).unwrap();
        let names: Vec<String> = project.rules().into_iter().map(|(name, _, _)| name).collect();
        for expected in ["compile_c", "archive", "link_program", "preprocess", "symlink_leaf"] {
            assert!(names.contains(&expected.to_owned()), "missing builtin rule {expected}");
        }
    }

    #[test]
    fn target_env_name_is_parsed_and_carried_onto_the_target() {
        let toml = r#"
            outroot = "out"
            [env.release]
            cc = "clang"

            [[package]]
            path = "app"
            [[package.target]]
            kind = "program"
            name = "app"
            sources = ["main.c"]
            env_name = "release"
        "#;
        let project = load_str(toml, Path::new("project.toml")).unwrap();
        let app = project.find_target(&Ident::parse("//app:app").unwrap()).unwrap();
        assert_eq!(app.env_name.as_deref(), Some("release"));
    }

    #[test]
    fn project_declared_rules_are_registered_too() {
        let toml = r#"
            outroot = "out"
            [[rule]]
            name = "run_codegen"
            command = "protoc $in -o $out"
        "#;
        let project = load_str(toml, Path::new("project.toml")).unwrap();
        let rule = project.rules().into_iter().find(|(name, _, _)| name == "run_codegen").unwrap();
        assert_eq!(rule.2.get("command").unwrap(), "protoc $in -o $out");
    }

    #[test]
    fn unsupported_value_type_is_rejected() {
        let toml = r#"
            outroot = "out"
            [env.host]
            nested = { a = 1 }
        "#;
        let err = load_str(toml, Path::new("project.toml")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEnvValue { .. }));
    }
}
