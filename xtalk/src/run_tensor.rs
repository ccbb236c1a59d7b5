use crate::common::*;

use clap::Args;
use xtalk_score::scoring::ContextScores;
use xtalk_tensor::cp::{cp_decompose, CpInit, CpOptions};
use xtalk_tensor::export::{export_factors, export_summary, ExportFormat};
use xtalk_tensor::tensor::{InteractionTensor, TensorJoin};
use xtalk_util::common_io::basename;

#[derive(Args, Debug, Clone)]
pub struct TensorArgs {
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

    /// factorization rank
    #[arg(long, short = 'r', required = true)]
    rank: usize,

    /// factor initialization: svd or random. SVD initialization can
    /// run out of memory on large tensors; switch to random if so.
    #[arg(long, default_value = "svd")]
    init: CpInit,

    /// maximum number of update iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    max_iter: usize,

    /// relative error change declaring convergence
    #[arg(long, default_value_t = DEFAULT_TOL)]
    tol: f32,

    /// factor output format: parquet or tsv
    #[arg(long, default_value = "parquet")]
    format: ExportFormat,

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

/// Default context name of a score file: the file name with the
/// whole `.scores.tsv[.gz]` suffix removed, not just the last
/// extension.
fn context_name(file: &str) -> anyhow::Result<Box<str>> {
    let name = std::path::Path::new(file)
        .file_name()
        .and_then(|x| x.to_str())
        .ok_or_else(|| anyhow::anyhow!("no file name in {}", file))?;

    for suffix in [".scores.tsv.gz", ".scores.tsv", ".tsv.gz", ".tsv"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return Ok(stripped.into());
            }
        }
    }
    basename(file)
}

pub fn read_score_cubes(
    score_files: &[Box<str>],
    context_names: Option<&[Box<str>]>,
) -> anyhow::Result<Vec<ContextScores>> {
    let contexts: Vec<Box<str>> = match context_names {
        Some(names) => {
            if names.len() != score_files.len() {
                anyhow::bail!(
                    "{} context names for {} score files",
                    names.len(),
                    score_files.len()
                );
            }
            names.to_vec()
        }
        None => score_files
            .iter()
            .map(|f| context_name(f))
            .collect::<anyhow::Result<_>>()?,
    };

    score_files
        .iter()
        .zip(contexts.iter())
        .map(|(file, context)| ContextScores::from_long_tsv(file, context))
        .collect()
}

/// Stack contexts into the communication tensor and factorize it.
pub fn run_tensor(args: TensorArgs) -> anyhow::Result<()> {
    setup_logging(args.verbose);
    setup_threads(args.threads)?;

    let cubes = read_score_cubes(&args.score_files, args.context_names.as_deref())?;
    let tensor = InteractionTensor::build(&cubes, args.join)?;

    let opts = CpOptions {
        rank: args.rank,
        init: args.init,
        max_iter: args.max_iter,
        tol: args.tol,
    };
    let model = cp_decompose(&tensor, &opts)?;

    let files = export_factors(&model, &tensor, &args.out, args.format)?;
    let summary = export_summary(&model, &tensor, &args.out)?;

    info!("wrote {} factor files and {}", files.len(), summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::context_name;

    #[test]
    fn context_name_strips_score_suffix() {
        assert_eq!(
            context_name("out/ctxA.scores.tsv.gz").unwrap().as_ref(),
            "ctxA"
        );
        assert_eq!(context_name("ctxB.scores.tsv").unwrap().as_ref(), "ctxB");
        assert_eq!(context_name("ctxC.tsv.gz").unwrap().as_ref(), "ctxC");
        assert_eq!(context_name("plain_name").unwrap().as_ref(), "plain_name");
    }
}
