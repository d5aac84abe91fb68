use crate::env::Env;
use crate::error::CoreError;
use crate::ident::Ident;
use crate::rule::{RuleArgs, RuleRegistry};
use crate::target::Target;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Holds everything the loader populates: source/output roots, packages,
/// named environments, and the downstream rule registry. Read-only once
/// loading completes — the evaluator only ever reads through `&Project`.
pub struct Project {
    pub root: PathBuf,
    pub outroot: PathBuf,
    packages: RefCell<HashMap<String, Rc<Package>>>,
    named_envs: RefCell<HashMap<String, Env>>,
    rules: RefCell<RuleRegistry>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, outroot: impl Into<PathBuf>) -> Rc<Project> {
        Rc::new(Project {
            root: root.into(),
            outroot: outroot.into(),
            packages: RefCell::new(HashMap::new()),
            named_envs: RefCell::new(HashMap::new()),
            rules: RefCell::new(RuleRegistry::new()),
        })
    }

    pub fn add_package(self: &Rc<Self>, relpath: impl Into<String>) -> Result<Rc<Package>, CoreError> {
        let relpath = relpath.into();
        let mut packages = self.packages.borrow_mut();
        if packages.contains_key(&relpath) {
            return Err(CoreError::DuplicatePackage { relpath });
        }
        let package = Rc::new(Package::new(self.clone(), relpath.clone()));
        packages.insert(relpath, package.clone());
        Ok(package)
    }

    pub fn add_named_env(&self, name: impl Into<String>, env: Env) -> Result<(), CoreError> {
        let name = name.into();
        let mut envs = self.named_envs.borrow_mut();
        if envs.contains_key(&name) {
            return Err(CoreError::DuplicateEnv { name });
        }
        envs.insert(name, env);
        Ok(())
    }

    pub fn named_env(&self, name: &str) -> Result<Env, CoreError> {
        self.named_envs
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownEnvBase(name.to_owned()))
    }

    pub fn add_rule(
        &self,
        module: impl Into<String>,
        name: impl Into<String>,
        args: RuleArgs,
    ) -> Result<(), CoreError> {
        self.rules.borrow_mut().add(module, name, args)
    }

    pub fn rules(&self) -> Vec<(String, Vec<String>, RuleArgs)> {
        self.rules.borrow().all()
    }

    pub fn find_target(&self, ident: &Ident) -> Result<Rc<Target>, CoreError> {
        let packages = self.packages.borrow();
        let package = packages
            .get(&ident.package_relpath)
            .ok_or_else(|| CoreError::UnknownTarget(ident.clone()))?;
        package
            .find_target(&ident.target_name_or_default())
            .ok_or_else(|| CoreError::UnknownTarget(ident.clone()))
    }

    pub fn packages(&self) -> Vec<Rc<Package>> {
        self.packages.borrow().values().cloned().collect()
    }

    pub fn leaves(&self) -> Vec<Rc<Target>> {
        self.packages()
            .iter()
            .flat_map(|p| p.targets())
            .filter(|t| t.leaf())
            .collect()
    }

    pub fn inpath(&self, parts: &[&str]) -> PathBuf {
        join(&self.root, parts)
    }

    /// `<outroot>/env/<digest>/...` — the mandatory hermeticity boundary: an
    /// env's digest is embedded in every path derived under it, so two
    /// environments never collide on output even if they agree on everything
    /// but one key.
    pub fn outpath(&self, env: &Env, parts: &[&str]) -> PathBuf {
        let mut base = self.outroot.join("env").join(env.digest());
        for part in parts {
            base = base.join(part);
        }
        base
    }

    pub fn leafpath(&self, parts: &[&str]) -> PathBuf {
        join(&self.outroot.join("latest"), parts)
    }

    pub fn genpath(&self, parts: &[&str]) -> PathBuf {
        join(&self.outroot.join("gen"), parts)
    }
}

fn join(base: &Path, parts: &[&str]) -> PathBuf {
    let mut out = base.to_path_buf();
    for part in parts {
        out.push(part);
    }
    out
}

/// A directory's worth of targets, self-registering by name on creation.
pub struct Package {
    pub project: Rc<Project>,
    pub relpath: String,
    reserved: RefCell<HashSet<String>>,
    targets: RefCell<HashMap<String, Rc<Target>>>,
}

impl Package {
    fn new(project: Rc<Project>, relpath: String) -> Package {
        Package {
            project,
            relpath,
            reserved: RefCell::new(HashSet::new()),
            targets: RefCell::new(HashMap::new()),
        }
    }

    /// Reserves `name` and hands back its identifier. The caller (the
    /// loader) constructs the actual `Target` afterwards — often needing
    /// the identifier to resolve its own dependency references first — and
    /// files it in with `register_target`.
    pub fn add_target(&self, name: impl Into<String>) -> Result<Ident, CoreError> {
        let name = name.into();
        let mut reserved = self.reserved.borrow_mut();
        if reserved.contains(&name) || self.targets.borrow().contains_key(&name) {
            return Err(CoreError::DuplicateTarget { relpath: self.relpath.clone(), name });
        }
        reserved.insert(name.clone());
        Ok(Ident::new(self.relpath.clone(), Some(name)))
    }

    pub fn register_target(&self, name: &str, target: Rc<Target>) {
        self.targets.borrow_mut().insert(name.to_owned(), target);
    }

    pub fn find_target(&self, name: &str) -> Option<Rc<Target>> {
        self.targets.borrow().get(name).cloned()
    }

    pub fn targets(&self) -> Vec<Rc<Target>> {
        self.targets.borrow().values().cloned().collect()
    }

    pub fn resolve(&self, reference: &str) -> Result<Ident, CoreError> {
        Ident::resolve(&self.relpath, reference)
    }

    /// `@foo` redirects to the generated tree, `//foo` to the project root,
    /// anything else is relative to this package's own input directory.
    pub fn inpath(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix('@') {
            self.project.genpath(&[rest])
        } else if let Some(rest) = path.strip_prefix("//") {
            self.project.inpath(&[rest])
        } else {
            self.project.inpath(&[&self.relpath, path])
        }
    }

    pub fn outpath(&self, env: &Env, parts: &[&str]) -> PathBuf {
        let mut full = vec![self.relpath.as_str()];
        full.extend_from_slice(parts);
        self.project.outpath(env, &full)
    }

    pub fn leafpath(&self, parts: &[&str]) -> PathBuf {
        let mut full = vec![self.relpath.as_str()];
        full.extend_from_slice(parts);
        self.project.leafpath(&full)
    }

    pub fn genpath(&self, parts: &[&str]) -> PathBuf {
        let mut full = vec![self.relpath.as_str()];
        full.extend_from_slice(parts);
        self.project.genpath(&full)
    }
}
