use crate::common::*;

use clap::Args;
use ndarray::prelude::*;
use xtalk_util::common_io::{mkdir, write_lines};
use xtalk_util::named::NamedMatrix;
use xtalk_util::traits::SampleOps;

#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// number of background genes (ligand/receptor genes come extra)
    #[arg(long, default_value_t = 50)]
    background_genes: usize,

    /// number of cell types
    #[arg(long, short = 't', default_value_t = 4)]
    cell_types: usize,

    /// cells per cell type
    #[arg(long, default_value_t = 20)]
    cells_per_type: usize,

    /// number of contexts (samples/conditions)
    #[arg(long, short = 'c', default_value_t = 4)]
    contexts: usize,

    /// number of planted ligand-receptor pairs
    #[arg(long, short = 'p', default_value_t = 6)]
    lr_pairs: usize,

    /// expression boost of a planted sender/receiver pattern
    #[arg(long, default_value_t = 8.0)]
    fold: f32,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

///
/// Simulate gamma-distributed expression across contexts with a
/// planted communication pattern: pair `k` talks from one sender
/// type to one receiver type, switching on and off across contexts.
/// Writes per-context expression, one membership file, and the
/// ligand-receptor table.
///
pub fn run_sim(args: SimArgs) -> anyhow::Result<()> {
    setup_logging(args.verbose);

    if args.cell_types < 2 {
        anyhow::bail!("need at least two cell types");
    }
    if args.lr_pairs < 1 || args.contexts < 1 {
        anyhow::bail!("need at least one pair and one context");
    }

    let ntypes = args.cell_types;
    let ncells = ntypes * args.cells_per_type;
    let ngenes = 2 * args.lr_pairs + args.background_genes;

    // gene names: LIG*/REC* first, background after
    let mut genes: Vec<Box<str>> = Vec::with_capacity(ngenes);
    for k in 0..args.lr_pairs {
        genes.push(format!("LIG{}", k).into_boxed_str());
        genes.push(format!("REC{}", k).into_boxed_str());
    }
    for j in 0..args.background_genes {
        genes.push(format!("G{}", j).into_boxed_str());
    }

    let type_names: Vec<Box<str>> = (0..ntypes)
        .map(|t| format!("T{}", t).into_boxed_str())
        .collect();

    let mut cells: Vec<Box<str>> = Vec::with_capacity(ncells);
    let mut cell_type_of: Vec<usize> = Vec::with_capacity(ncells);
    for (t, tname) in type_names.iter().enumerate() {
        for i in 0..args.cells_per_type {
            cells.push(format!("{}_{}", tname, i).into_boxed_str());
            cell_type_of.push(t);
        }
    }

    // membership file
    let membership_file = format!("{}.membership.tsv", args.out);
    mkdir(&membership_file)?;
    let membership_lines: Vec<Box<str>> = cells
        .iter()
        .zip(cell_type_of.iter())
        .map(|(cell, &t)| format!("{}\t{}", cell, type_names[t]).into_boxed_str())
        .collect();
    write_lines(&membership_lines, &membership_file)?;

    // ligand-receptor table
    let lr_file = format!("{}.lr.tsv", args.out);
    let mut lr_lines: Vec<Box<str>> = vec!["ligand\treceptor\tweight".into()];
    for k in 0..args.lr_pairs {
        lr_lines.push(format!("LIG{}\tREC{}\t1.0", k, k).into_boxed_str());
    }
    write_lines(&lr_lines, &lr_file)?;

    // per-context expression with the planted pattern
    for c in 0..args.contexts {
        let mut values = Array2::<f32>::rgamma(ngenes, ncells, (2.0, 0.5));

        for k in 0..args.lr_pairs {
            // pair k is active in every other context
            if (k + c) % 2 != 0 {
                continue;
            }
            let sender = k % ntypes;
            let receiver = (k + 1) % ntypes;
            let lig_row = 2 * k;
            let rec_row = 2 * k + 1;

            for (j, &t) in cell_type_of.iter().enumerate() {
                if t == sender {
                    values[(lig_row, j)] *= args.fold;
                }
                if t == receiver {
                    values[(rec_row, j)] *= args.fold;
                }
            }
        }

        let expr = NamedMatrix::new(values, genes.clone(), cells.clone())?;
        let expr_file = format!("{}.ctx{}.expr.tsv.gz", args.out, c);
        expr.to_tsv(&expr_file, "gene")?;
        info!("wrote {}", expr_file);
    }

    info!(
        "simulated {} contexts, {} genes x {} cells each",
        args.contexts, ngenes, ncells
    );
    Ok(())
}
