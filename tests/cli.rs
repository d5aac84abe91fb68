use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn build_writes_a_ninja_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.copy_from("tests/fixtures/simple-program", &["*.toml"])?;

    let mut cmd = Command::cargo_bin("weave")?;
    cmd.current_dir(temp.path()).arg("--project-file").arg("project.toml").arg("build");
    cmd.assert().success();

    temp.child("build/build.ninja").assert(predicate::path::exists());
    temp.child("build/build.ninja").assert(predicate::str::contains("rule link_program").or(
        predicate::str::contains("build").and(predicate::str::contains("link_program")),
    ));
    temp.close()?;
    Ok(())
}

#[test]
fn build_with_no_targets_and_no_leaves_fails_clearly() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("project.toml").write_str("outroot = \"build\"\n")?;

    let mut cmd = Command::cargo_bin("weave")?;
    cmd.current_dir(temp.path()).arg("--project-file").arg("project.toml").arg("build");
    cmd.assert().failure();
    temp.close()?;
    Ok(())
}

#[test]
fn graph_subcommand_writes_a_dot_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.copy_from("tests/fixtures/simple-program", &["*.toml"])?;

    let mut cmd = Command::cargo_bin("weave")?;
    cmd.current_dir(temp.path())
        .arg("--project-file")
        .arg("project.toml")
        .arg("graph")
        .arg("--out")
        .arg("graph.dot");
    cmd.assert().success();

    temp.child("graph.dot").assert(predicate::path::exists());
    temp.close()?;
    Ok(())
}
