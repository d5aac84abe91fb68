use std::path::Path;
use weave_core::dedup::dedup;
use weave_core::error::CoreError;
use weave_core::evaluator::evaluate;
use weave_core::ident::Ident;
use weave_core::loader;

fn load(contents: &str) -> std::rc::Rc<weave_core::project::Project> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.toml");
    std::fs::write(&path, contents).unwrap();
    let project = loader::load(&path).unwrap();
    // keep the tempdir alive for the duration of the project's use by
    // leaking it; these are short-lived test processes.
    std::mem::forget(dir);
    project
}

fn host_env(project: &weave_core::project::Project) -> weave_core::env::Env {
    project.named_env("host").unwrap_or_else(|_| weave_core::env::Env::empty())
}

#[test]
fn single_program_two_sources() {
    let project = load(
        r#"
        outroot = "out"
        [[package]]
        path = "app"
        [[package.target]]
        kind = "program"
        name = "app"
        sources = ["a.c", "b.c"]
        "#,
    );
    let target = project.find_target(&Ident::parse("//app:app").unwrap()).unwrap();
    let evaluation = evaluate(&project, &target, &host_env(&project)).unwrap();
    let products = dedup(evaluation.products).unwrap();

    assert_eq!(products.iter().filter(|p| p.rule == "compile_c").count(), 2);
    assert_eq!(products.iter().filter(|p| p.rule == "link_program").count(), 1);
    assert_eq!(products.iter().filter(|p| p.rule == "symlink_leaf").count(), 1);

    let link = products.iter().find(|p| p.rule == "link_program").unwrap();
    let symlink = products.iter().find(|p| p.rule == "symlink_leaf").unwrap();
    assert_eq!(symlink.implicit, link.outputs, "the symlink must depend on the binary it points at");
}

#[test]
fn same_program_under_two_named_envs() {
    let project = load(
        r#"
        outroot = "out"
        [env.gcc]
        cc = "gcc"
        [env.clang]
        cc = "clang"

        [[package]]
        path = "app"
        [[package.target]]
        kind = "program"
        name = "app"
        sources = ["main.c"]
        "#,
    );
    let target = project.find_target(&Ident::parse("//app:app").unwrap()).unwrap();
    let eval_gcc = evaluate(&project, &target, &project.named_env("gcc").unwrap()).unwrap();
    let eval_clang = evaluate(&project, &target, &project.named_env("clang").unwrap()).unwrap();

    let link_gcc = eval_gcc.products.iter().find(|p| p.rule == "link_program").unwrap();
    let link_clang = eval_clang.products.iter().find(|p| p.rule == "link_program").unwrap();
    assert_ne!(link_gcc.outputs, link_clang.outputs, "building one program twice under different envs must not collide");

    dedup(eval_gcc.products).unwrap();
    dedup(eval_clang.products).unwrap();
}

#[test]
fn program_depending_on_library() {
    let project = load(
        r#"
        outroot = "out"
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
        "#,
    );
    let target = project.find_target(&Ident::parse("//app:app").unwrap()).unwrap();
    let evaluation = evaluate(&project, &target, &host_env(&project)).unwrap();
    let link = evaluation.products.iter().find(|p| p.rule == "link_program").unwrap();
    assert!(link.inputs.iter().any(|p| p.to_string_lossy().contains("libx.a")));
}

#[test]
fn diamond_of_libraries() {
    let project = load(
        r#"
        outroot = "out"
        [[package]]
        path = "base"
        [[package.target]]
        kind = "library"
        name = "base"
        sources = ["base.c"]

        [[package]]
        path = "left"
        [[package.target]]
        kind = "library"
        name = "left"
        sources = ["left.c"]
        deps = ["//base:base"]

        [[package]]
        path = "right"
        [[package.target]]
        kind = "library"
        name = "right"
        sources = ["right.c"]
        deps = ["//base:base"]

        [[package]]
        path = "app"
        [[package.target]]
        kind = "program"
        name = "app"
        sources = ["main.c"]
        deps = ["//left:left", "//right:right"]
        "#,
    );
    let target = project.find_target(&Ident::parse("//app:app").unwrap()).unwrap();
    let evaluation = evaluate(&project, &target, &host_env(&project)).unwrap();
    let products = dedup(evaluation.products).unwrap();

    let base_archives = products.iter().filter(|p| p.rule == "archive" && p.dedup_key().contains("base")).count();
    assert_eq!(base_archives, 1, "the shared base library must only be archived once");
}

#[test]
fn same_library_under_two_envs() {
    let project = load(
        r#"
        outroot = "out"
        [env.gcc]
        cc = "gcc"
        [env.clang]
        cc = "clang"

        [[package]]
        path = "libx"
        [[package.target]]
        kind = "library"
        name = "x"
        sources = ["x.c"]
        "#,
    );
    let target = project.find_target(&Ident::parse("//libx:x").unwrap()).unwrap();
    let eval_gcc = evaluate(&project, &target, &project.named_env("gcc").unwrap()).unwrap();
    let eval_clang = evaluate(&project, &target, &project.named_env("clang").unwrap()).unwrap();

    let gcc_archive = eval_gcc.products.iter().find(|p| p.rule == "archive").unwrap();
    let clang_archive = eval_clang.products.iter().find(|p| p.rule == "archive").unwrap();
    assert_ne!(gcc_archive.outputs, clang_archive.outputs, "different envs must not collide on output path");
}

#[test]
fn duplicate_product_conflict_is_rejected_at_dedup() {
    let project = load(
        r#"
        outroot = "out"
        [[package]]
        path = "a"
        [[package.target]]
        kind = "generic"
        name = "a"
        rule = "run_a"
        outputs = ["shared.bin"]

        [[package]]
        path = "b"
        [[package.target]]
        kind = "generic"
        name = "b"
        rule = "run_b"
        outputs = ["shared.bin"]
        "#,
    );
    let a = project.find_target(&Ident::parse("//a:a").unwrap()).unwrap();
    let b = project.find_target(&Ident::parse("//b:b").unwrap()).unwrap();
    let env = host_env(&project);

    let mut products = evaluate(&project, &a, &env).unwrap().products;
    products.extend(evaluate(&project, &b, &env).unwrap().products);

    assert!(matches!(dedup(products), Err(CoreError::IncompatibleDuplicateProducts { .. })));
}

#[test]
fn a_dependency_cycle_is_reported_before_anything_is_emitted() {
    let project = load(
        r#"
        outroot = "out"
        [[package]]
        path = "cyc"
        [[package.target]]
        kind = "generic"
        name = "a"
        rule = "run"
        deps = ["//cyc:b"]

        [[package.target]]
        kind = "generic"
        name = "b"
        rule = "run"
        deps = ["//cyc:a"]
        "#,
    );
    let a = project.find_target(&Ident::parse("//cyc:a").unwrap()).unwrap();
    let err = evaluate(&project, &a, &host_env(&project)).unwrap_err();
    assert!(matches!(err, CoreError::Cycle { .. }));
}

#[test]
fn unknown_dependency_reference_is_a_loader_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.toml");
    std::fs::write(
        &path,
        r#"
        outroot = "out"
        [[package]]
        path = "app"
        [[package.target]]
        kind = "program"
        name = "app"
        sources = ["main.c"]
        deps = ["//nowhere:nothing"]
        "#,
    )
    .unwrap();

    // Dependency identifiers are resolved eagerly while loading, so a typo
    // surfaces immediately rather than lazily during evaluation.
    let err = loader::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::UnknownTarget(_)));
    let _ = Path::new(&path);
}
