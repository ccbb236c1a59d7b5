use crate::common::*;

use clap::Args;
use xtalk_score::expression::ExpressionMatrix;
use xtalk_score::interaction_space::InteractionSpace;
use xtalk_score::lr_pairs::LrDatabase;
use xtalk_score::scoring::{AggregateKind, ScoreKind};
use xtalk_util::common_io::mkdir;
use xtalk_util::membership::Membership;

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// expression matrix (`gene x cell` TSV with a header of cell
    /// names, gzipped or not)
    #[arg(long, short = 'x', required = true)]
    expr_file: Box<str>,

    /// cell type membership file; each line is `cell<TAB>cell_type`
    #[arg(long, short = 'm', required = true)]
    membership_file: Box<str>,

    /// ligand-receptor reference TSV with `ligand` and `receptor`
    /// columns; complexes are written `SUB1&SUB2`
    #[arg(long, short = 'l', required = true)]
    lr_file: Box<str>,

    /// context (sample/condition/timepoint) name
    #[arg(long, short = 'c', default_value = "context")]
    context: Box<str>,

    /// communication score: product, mean, or gmean
    #[arg(long, default_value = "product")]
    score: ScoreKind,

    /// cell-cell interaction aggregate: bray_curtis, jaccard, or count
    #[arg(long, default_value = "bray_curtis")]
    aggregate: AggregateKind,

    /// cutoff kind for binarization: fixed, global_quantile, or
    /// gene_quantile
    #[arg(long, default_value = "gene_quantile")]
    cutoff_kind: Box<str>,

    /// cutoff value (threshold for fixed, quantile otherwise)
    #[arg(long, default_value_t = 0.75)]
    cutoff_value: f32,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Score one context and write the long-format score table plus the
/// cell-cell interaction matrix.
pub fn run_score(args: ScoreArgs) -> anyhow::Result<()> {
    setup_logging(args.verbose);

    let expr = ExpressionMatrix::from_tsv(&args.expr_file)?;
    let membership = Membership::from_file(&args.membership_file, '\t')?;
    let lr_db = LrDatabase::from_tsv(&args.lr_file)?;
    let cutoff = parse_cutoff(&args.cutoff_kind, args.cutoff_value)?;

    let space = InteractionSpace::new(&args.context, &expr, &membership, &lr_db, &cutoff)?;

    let scores = space.communication_scores(args.score)?;
    let cci = space.cci_matrix(args.aggregate)?;

    let score_file = format!("{}.scores.tsv.gz", args.out);
    let cci_file = format!("{}.cci.tsv.gz", args.out);
    mkdir(&score_file)?;

    scores.to_long_tsv(&score_file)?;
    cci.to_tsv(&cci_file, "sender")?;

    info!("wrote {} and {}", score_file, cci_file);
    Ok(())
}
