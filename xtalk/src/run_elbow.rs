use crate::common::*;
use crate::run_tensor::read_score_cubes;

use clap::Args;
use xtalk_tensor::cp::{CpInit, CpOptions};
use xtalk_tensor::elbow::elbow_rank_selection;
use xtalk_tensor::export::export_elbow_curve;
use xtalk_tensor::tensor::{InteractionTensor, TensorJoin};
use xtalk_util::common_io::{mkdir, write_lines};

#[derive(Args, Debug, Clone)]
pub struct ElbowArgs {
    /// long-format score tables, one per context (output of
    /// `xtalk score`)
    #[arg(required = true)]
    score_files: Vec<Box<str>>,

    /// context names (comma-separated); file basenames by default
    #[arg(long, short = 'c', value_delimiter(','))]
    context_names: Option<Vec<Box<str>>>,

    /// label join across contexts: inner or outer
    #[arg(long, default_value = "outer")]
    join: TensorJoin,

    /// largest rank to try
    #[arg(long, short = 'r', default_value_t = 10)]
    max_rank: usize,

    /// fits per rank (best error kept)
    #[arg(long, default_value_t = 3)]
    runs: usize,

    /// factor initialization of the first fit per rank: svd or random
    #[arg(long, default_value = "svd")]
    init: CpInit,

    /// maximum number of update iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    max_iter: usize,

    /// relative error change declaring convergence
    #[arg(long, default_value_t = DEFAULT_TOL)]
    tol: f32,

    /// number of threads (0 = all available)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Sweep ranks and report the reconstruction-error curve with the
/// selected elbow.
pub fn run_elbow(args: ElbowArgs) -> anyhow::Result<()> {
    setup_logging(args.verbose);
    setup_threads(args.threads)?;

    let cubes = read_score_cubes(&args.score_files, args.context_names.as_deref())?;
    let tensor = InteractionTensor::build(&cubes, args.join)?;

    let opts = CpOptions {
        init: args.init,
        max_iter: args.max_iter,
        tol: args.tol,
        ..CpOptions::default()
    };

    let result = elbow_rank_selection(&tensor, args.max_rank, args.runs, &opts)?;

    let curve_file = export_elbow_curve(&result, &args.out)?;

    let json_file = format!("{}.elbow.json", args.out);
    mkdir(&json_file)?;
    write_lines(&[serde_json::to_string_pretty(&result)?], &json_file)?;

    info!(
        "selected rank {}; wrote {} and {}",
        result.selected_rank, curve_file, json_file
    );
    Ok(())
}
