use anyhow::{bail, Context};
use flexi_logger::Logger;
use log::info;
use std::collections::BTreeSet;
use std::path::PathBuf;
use structopt::StructOpt;
use weave_core::dedup::dedup;
use weave_core::env::{Env, EnvValue};
use weave_core::error::CoreError;
use weave_core::evaluator::evaluate;
use weave_core::ident::Ident;
use weave_core::product::{product, IMPLICIT_KEY};
use weave_core::{emitter, loader};

#[derive(StructOpt, Debug)]
#[structopt(setting(structopt::clap::AppSettings::ColorAuto), setting(structopt::clap::AppSettings::ColoredHelp))]
pub enum Command {
    /// Evaluate the project and write out build.ninja
    Build {
        /// Explicit targets to build, as `//package:name`. Defaults to
        /// every leaf target in the project.
        targets: Vec<String>,
        /// Named base environment to start evaluation from.
        #[structopt(long, default_value = "host")]
        env: String,
    },
    /// Evaluate the project and write a graphviz `.dot` of the dependency
    /// closure, for inspecting how environments flow through the graph.
    Graph {
        targets: Vec<String>,
        #[structopt(long, default_value = "host")]
        env: String,
        /// Where to write the `.dot` file.
        #[structopt(long, default_value = "graph.dot")]
        out: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(name = "weave", about = "Contextual build-graph evaluator that emits Ninja build files")]
#[structopt(setting(structopt::clap::AppSettings::ColorAuto), setting(structopt::clap::AppSettings::ColoredHelp))]
pub struct Opt {
    /// Path to the project description TOML file.
    #[structopt(short, long, parse(from_os_str), default_value = "project.toml")]
    pub project_file: PathBuf,
    /// Specify the log level (error, warn, info, debug, trace).
    #[structopt(short, long, default_value = "warn")]
    pub log: String,

    #[structopt(subcommand)]
    pub cmd: Command,
}

pub fn run(args: Opt) -> Result<(), anyhow::Error> {
    let _ = Logger::try_with_str(args.log.clone())?.start()?;

    let project = loader::load(&args.project_file).context("loading project description")?;

    match args.cmd {
        Command::Build { targets, env } => {
            let base = starting_env(&project, &env)?;
            let selected = select_targets(&project, &targets)?;

            let mut products = Vec::new();
            for target in &selected {
                let evaluation = evaluate(&project, target, &base)
                    .with_context(|| format!("evaluating {}", target.ident))?;

                // Group every output this leaf produced under one named
                // phony target, so `ninja //pkg:name` builds the whole
                // closure without the caller needing to know its products.
                let outputs: Vec<EnvValue> = evaluation
                    .products
                    .iter()
                    .flat_map(|p| p.outputs.iter())
                    .map(|p| EnvValue::from(p.to_string_lossy().into_owned()))
                    .collect();
                let mut vars = std::collections::BTreeMap::new();
                vars.insert(IMPLICIT_KEY.to_owned(), EnvValue::Tuple(outputs));
                products.push(product(
                    "phony",
                    vec![PathBuf::from(target.ident.to_string())],
                    Vec::new(),
                    vars,
                ));

                products.extend(evaluation.products);
            }
            let products = dedup(products).context("deduplicating products")?;

            let mut description_files = BTreeSet::new();
            description_files.insert(args.project_file.clone());

            let rules = project.rules();
            emitter::write_outputs(&project, &rules, &products, &description_files)
                .context("writing build.ninja")?;
            info!(
                "wrote {} build edges to {}",
                products.len(),
                project.outroot.join("build.ninja").display()
            );
            Ok(())
        }
        Command::Graph { targets, env, out } => {
            let base = starting_env(&project, &env)?;
            let selected = select_targets(&project, &targets)?;

            let mut graph = petgraph::graph::DiGraph::<String, ()>::new();
            let mut nodes = std::collections::HashMap::new();

            for target in &selected {
                let evaluation = evaluate(&project, target, &base)
                    .with_context(|| format!("evaluating {}", target.ident))?;
                for (ident, env_digest, _entry) in weave_core::topo::topo_sort(&evaluation.dep_map) {
                    let label = format!("{ident} [{}]", &env_digest[..8.min(env_digest.len())]);
                    nodes.entry(label.clone()).or_insert_with(|| graph.add_node(label));
                }
            }

            std::fs::write(&out, format!("{:?}", petgraph::dot::Dot::new(&graph)))
                .with_context(|| format!("writing {}", out.display()))?;
            info!("wrote dependency graph to {}", out.display());
            Ok(())
        }
    }
}

fn starting_env(project: &weave_core::project::Project, name: &str) -> Result<Env, anyhow::Error> {
    match project.named_env(name) {
        Ok(env) => Ok(env),
        Err(CoreError::UnknownEnvBase(_)) if name == "host" => Ok(Env::empty()),
        Err(err) => Err(err.into()),
    }
}

fn select_targets(
    project: &weave_core::project::Project,
    targets: &[String],
) -> Result<Vec<std::rc::Rc<weave_core::target::Target>>, anyhow::Error> {
    if targets.is_empty() {
        let leaves = project.leaves();
        if leaves.is_empty() {
            bail!("project has no default (leaf) targets; pass one explicitly");
        }
        return Ok(leaves);
    }
    targets
        .iter()
        .map(|s| {
            let ident = Ident::parse(s)?;
            project.find_target(&ident)
        })
        .collect::<Result<Vec<_>, CoreError>>()
        .map_err(Into::into)
}
