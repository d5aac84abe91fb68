use crate::error::CoreError;
use std::fmt;
use std::path::Path;

/// A target reference of the form `//package/relpath:target_name`.
///
/// If `target_name` is omitted (`//package/relpath`), it defaults to the
/// basename of `package_relpath` — see `target_name_or_default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident {
    pub package_relpath: String,
    pub target_name: Option<String>,
}

impl Ident {
    pub fn new(package_relpath: impl Into<String>, target_name: Option<String>) -> Self {
        Ident { package_relpath: package_relpath.into(), target_name }
    }

    /// Parses `//foo/bar:baz` or `//foo/bar` (name elided).
    pub fn parse(s: &str) -> Result<Ident, CoreError> {
        let rest = s
            .strip_prefix("//")
            .ok_or_else(|| CoreError::BadIdentifier(s.to_owned()))?;

        let mut parts = rest.splitn(3, ':');
        let relpath = parts.next().unwrap_or("").to_owned();
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Ident::new(relpath, None)),
            (Some(name), None) => Ok(Ident::new(relpath, Some(name.to_owned()))),
            (Some(_), Some(_)) => Err(CoreError::BadIdentifier(s.to_owned())),
        }
    }

    /// Resolves a relative reference (`:name`) against the owning package's
    /// relpath, or parses it as an absolute identifier otherwise.
    pub fn resolve(owner_relpath: &str, reference: &str) -> Result<Ident, CoreError> {
        if let Some(name) = reference.strip_prefix(':') {
            Ok(Ident::new(owner_relpath, Some(name.to_owned())))
        } else {
            Ident::parse(reference)
        }
    }

    pub fn target_name_or_default(&self) -> String {
        self.target_name.clone().unwrap_or_else(|| {
            Path::new(&self.package_relpath)
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_name {
            None => write!(f, "//{}", self.package_relpath),
            Some(name) => write!(f, "//{}:{}", self.package_relpath, name),
        }
    }
}
