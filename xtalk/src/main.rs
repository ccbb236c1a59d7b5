mod common;
mod run_elbow;
mod run_score;
mod run_sim;
mod run_tensor;

use crate::run_elbow::*;
use crate::run_score::*;
use crate::run_sim::*;
use crate::run_tensor::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "XTALK",
    long_about = "Cell-cell communication analysis:\n\
		  (1) score ligand-receptor communication between cell types,\n\
		  (2) stack per-context scores into a 4-way tensor, and\n\
		  (3) factorize the tensor into communication programs."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score ligand-receptor communication in one context
    Score(ScoreArgs),

    /// Build the communication tensor and factorize it at a fixed rank
    Tensor(TensorArgs),

    /// Sweep factorization ranks and pick one by the error elbow
    Elbow(ElbowArgs),

    /// Simulate multi-context expression data with planted communication
    Simulate(SimArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Score(args) => {
            run_score(args.clone())?;
        }
        Commands::Tensor(args) => {
            run_tensor(args.clone())?;
        }
        Commands::Elbow(args) => {
            run_elbow(args.clone())?;
        }
        Commands::Simulate(args) => {
            run_sim(args.clone())?;
        }
    }

    Ok(())
}
