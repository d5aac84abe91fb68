use structopt::StructOpt;

mod cli;

fn main() -> Result<(), anyhow::Error> {
    cli::run(cli::Opt::from_args())
}
