//! The contextual graph walk: given a target and the environment its
//! consumer is building under, produces the merged dependency closure and
//! the full list of products contributed by that target and everything
//! beneath it.
//!
//! Evaluation is memoized per `(target, env)` pair and single-threaded —
//! there is no parallelism here, only enough bookkeeping (the in-progress
//! set) to turn an accidental cycle into a `CoreError::Cycle` instead of a
//! stack overflow.

use crate::delta::Delta;
use crate::error::CoreError;
use crate::ident::Ident;
use crate::product::ProductRecord;
use crate::project::Project;
use crate::target::{Evaluation, Target};
use crate::topo::{insert_self, topo_merge, topo_sort, DepMap};
use log::{debug, trace};
use crate::env::Env;
use std::collections::HashSet;
use std::rc::Rc;

pub fn evaluate(
    project: &Project,
    target: &Rc<Target>,
    env_up: &Env,
) -> Result<Evaluation, CoreError> {
    let mut in_progress = Vec::new();
    let mut stack = HashSet::new();
    walk(project, target, env_up, &mut stack, &mut in_progress)
}

fn walk(
    project: &Project,
    target: &Rc<Target>,
    env_up: &Env,
    stack: &mut HashSet<(Ident, String)>,
    path: &mut Vec<Ident>,
) -> Result<Evaluation, CoreError> {
    if let Some(cached) = target.cached(env_up.digest()) {
        trace!("cache hit for {} under {}", target.ident, env_up);
        return Ok(cached);
    }

    let key = (target.ident.clone(), env_up.digest().to_owned());
    if !stack.insert(key.clone()) {
        let mut cycle_path = path.clone();
        cycle_path.push(target.ident.clone());
        return Err(CoreError::Cycle { path: cycle_path });
    }
    path.push(target.ident.clone());

    let result = evaluate_uncached(project, target, env_up, stack, path);

    path.pop();
    stack.remove(&key);

    let evaluation = result?;
    target.store(env_up.digest().to_owned(), evaluation.clone());
    Ok(evaluation)
}

fn evaluate_uncached(
    project: &Project,
    target: &Rc<Target>,
    env_up: &Env,
    stack: &mut HashSet<(Ident, String)>,
    path: &mut Vec<Ident>,
) -> Result<Evaluation, CoreError> {
    debug!("evaluating {} under {}", target.ident, env_up);

    // Down-derivation: either inherit the caller's environment or root
    // this target in a named base environment of its own, then apply
    // whatever extra overrides the target declared.
    let base = match &target.env_name {
        Some(name) => project.named_env(name)?,
        None => env_up.clone(),
    };
    let env_down = base.derive(&target.down_delta)?;

    let package = find_package(project, target)?;

    let mut dep_map: DepMap = DepMap::new();
    let mut products: Vec<ProductRecord> = Vec::new();
    let mut dep_deltas: Vec<Delta> = Vec::new();

    for dep_ident in &target.deps {
        let dep_target = project.find_target(dep_ident)?;
        // Dependencies are evaluated against the down environment, not a
        // target-local one — a target's own overrides shouldn't leak into
        // how its dependencies are built.
        let child = walk(project, &dep_target, &env_down, stack, path)?;

        topo_merge(&mut dep_map, &child.dep_map);
        if let Some((_, entry)) = child.dep_map.iter().find(|((ident, _), _)| *ident == dep_target.ident) {
            dep_deltas.extend(entry.using_delta.clone());
        }
        products.extend(child.products);
    }

    // Fold every dependency's using-delta into the environment before this
    // target's own product construction runs, so e.g. a program sees the
    // cflags/linksrcs its libraries contributed.
    let env_for_build = env_down.derive(&dep_deltas)?;

    let (using_delta, own_products) = target.kind.build(&target.ident, &package, &env_for_build)?;
    products.extend(own_products);

    let using_key = using_key_for(&env_for_build, &using_delta)?;
    let self_key = (target.ident.clone(), env_up.digest().to_owned());

    if target.transparent() {
        insert_self(&mut dep_map, self_key, using_delta, using_key);
    } else {
        // Opaque: this target fully consumes the closure below it. Nothing
        // above should see past it, so the merged dep_map is replaced with
        // a single self-entry.
        dep_map = DepMap::new();
        insert_self(&mut dep_map, self_key, using_delta, using_key);
    }

    Ok(Evaluation { dep_map, products })
}

fn find_package(project: &Project, target: &Rc<Target>) -> Result<Rc<crate::project::Package>, CoreError> {
    project
        .packages()
        .into_iter()
        .find(|p| p.relpath == target.ident.package_relpath)
        .ok_or_else(|| CoreError::UnknownTarget(target.ident.clone()))
}

/// A stable fingerprint for a using-delta, used only to break sort ties in
/// `topo_sort` deterministically — derived by applying the delta to an
/// empty environment and hashing the result, since `Delta` itself has no
/// meaningful ordering.
fn using_key_for(base: &Env, using_delta: &[Delta]) -> Result<String, CoreError> {
    let probe = base.subset(std::iter::empty::<&str>()).derive(using_delta)?;
    Ok(probe.digest().to_owned())
}

/// Produces the final, order-respecting list of every identifier reached
/// in a closure, useful for diagnostics and for the `.dot` export.
pub fn ordered_dependency_idents(evaluation: &Evaluation) -> Vec<Ident> {
    topo_sort(&evaluation.dep_map).into_iter().map(|(ident, _, _)| ident.clone()).collect()
}
