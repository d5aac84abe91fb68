//! Writes the evaluated product list out as a ninja build file, plus a
//! sidecar `.deps` file recording which project-description files were read
//! while building it — so the generated `build.ninja` can declare itself as
//! needing regeneration whenever any of them changes.

use crate::product::ProductRecord;
use crate::project::Project;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

/// Serializes `rules` (name, argument map) and `products` into ninja
/// syntax. Rule and build blocks are emitted in name order so the output is
/// deterministic run to run.
pub fn render(rules: &[(String, Vec<String>, crate::rule::RuleArgs)], products: &[ProductRecord]) -> String {
    let mut out = String::new();
    writeln!(out, "# generated by weave; do not edit by hand").unwrap();
    out.push('\n');

    let mut rule_names: Vec<&(String, Vec<String>, crate::rule::RuleArgs)> = rules.iter().collect();
    rule_names.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, _modules, args) in rule_names {
        writeln!(out, "rule {name}").unwrap();
        let mut arg_names: Vec<&String> = args.keys().collect();
        arg_names.sort();
        for arg in arg_names {
            writeln!(out, "  {} = {}", arg, args[arg]).unwrap();
        }
        out.push('\n');
    }

    for product in products {
        render_build_edge(&mut out, product);
    }

    out
}

fn render_build_edge(out: &mut String, product: &ProductRecord) {
    let outputs = join_paths(&product.outputs);
    let inputs = join_paths(&product.inputs);

    write!(out, "build {outputs}: {}", product.rule).unwrap();
    if !inputs.is_empty() {
        write!(out, " {inputs}").unwrap();
    }
    if !product.implicit.is_empty() {
        write!(out, " | {}", join_paths(&product.implicit)).unwrap();
    }
    if !product.order_only.is_empty() {
        write!(out, " || {}", join_paths(&product.order_only)).unwrap();
    }
    out.push('\n');

    for (key, value) in &product.variables {
        writeln!(out, "  {key} = {value}").unwrap();
    }
    out.push('\n');
}

fn join_paths(paths: &[std::path::PathBuf]) -> String {
    paths.iter().map(|p| escape(&p.to_string_lossy())).collect::<Vec<_>>().join(" ")
}

fn escape(s: &str) -> String {
    s.replace(' ', "$ ").replace(':', "$:").replace('$', "$$")
}

/// Writes `build.ninja` to `outroot`, plus `build.ninja.deps`, a plain
/// newline-separated list of the description files that went into it.
/// Ninja reads this back as an implicit input of its own regeneration edge.
pub fn write_outputs(
    project: &Project,
    rules: &[(String, Vec<String>, crate::rule::RuleArgs)],
    products: &[ProductRecord],
    description_files: &BTreeSet<std::path::PathBuf>,
) -> io::Result<()> {
    std::fs::create_dir_all(&project.outroot)?;
    let ninja_path = project.outroot.join("build.ninja");
    std::fs::write(&ninja_path, render(rules, products))?;
    write_deps_file(&project.outroot.join("build.ninja.deps"), description_files)
}

fn write_deps_file(path: &Path, description_files: &BTreeSet<std::path::PathBuf>) -> io::Result<()> {
    let mut contents = String::new();
    for file in description_files {
        writeln!(contents, "{}", file.display()).unwrap();
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::product;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn renders_a_rule_block_and_a_build_edge() {
        let mut args = crate::rule::RuleArgs::new();
        args.insert("command".to_owned(), "$cc -c $in -o $out".to_owned());
        let rules = vec![("compile_c".to_owned(), vec!["c_plugin".to_owned()], args)];

        let mut vars = BTreeMap::new();
        vars.insert("cc".to_owned(), crate::env::EnvValue::from("cc"));
        let products = vec![product("compile_c", vec![PathBuf::from("a.o")], vec![PathBuf::from("a.c")], vars)];

        let rendered = render(&rules, &products);
        assert!(rendered.contains("rule compile_c"));
        assert!(rendered.contains("build a.o: compile_c a.c"));
        assert!(rendered.contains("cc = cc"));
    }

    #[test]
    fn implicit_and_order_only_inputs_use_ninja_separators() {
        let product = ProductRecord {
            rule: "link_program".to_owned(),
            outputs: vec![PathBuf::from("app")],
            inputs: vec![PathBuf::from("main.o")],
            implicit: vec![PathBuf::from("libx.a")],
            order_only: vec![PathBuf::from("gen_dir")],
            variables: BTreeMap::new(),
        };
        let rendered = render(&[], &[product]);
        assert!(rendered.contains("build app: link_program main.o | libx.a || gen_dir"));
    }

    #[test]
    fn paths_with_spaces_are_escaped() {
        let product = ProductRecord {
            rule: "copy".to_owned(),
            outputs: vec![PathBuf::from("out dir/file.txt")],
            inputs: vec![],
            implicit: vec![],
            order_only: vec![],
            variables: BTreeMap::new(),
        };
        let rendered = render(&[], &[product]);
        assert!(rendered.contains("out$ dir/file.txt"));
    }
}
