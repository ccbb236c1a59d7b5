//! The interaction space of one context: everything needed to score
//! communication between every ordered pair of cell types.

use crate::expression::{aggregate_by_type, CutoffKind, ExpressionMatrix, TypeProfiles};
use crate::lr_pairs::LrDatabase;
use crate::scoring::{complex_value, AggregateKind, ContextScores, ScoreKind};

use fnv::FnvHashMap as HashMap;
use log::info;
use ndarray::prelude::*;
use rayon::prelude::*;
use xtalk_util::membership::Membership;
use xtalk_util::named::NamedMatrix;

pub struct InteractionSpace {
    pub context: Box<str>,
    pub profiles: TypeProfiles,
    pub lr_db: LrDatabase,
    gene_index: HashMap<Box<str>, usize>,
}

impl InteractionSpace {
    ///
    /// Build the interaction space of one context: collapse cells
    /// into cell-type profiles and keep the ligand-receptor pairs
    /// whose genes were measured.
    ///
    pub fn new(
        context: &str,
        expr: &ExpressionMatrix,
        membership: &Membership,
        lr_db: &LrDatabase,
        cutoff: &CutoffKind,
    ) -> anyhow::Result<Self> {
        let profiles = aggregate_by_type(expr, membership, cutoff)?;
        let gene_index = profiles.mean.row_index()?;
        let lr_db = lr_db.restrict_to_genes(&gene_index)?;

        info!(
            "interaction space [{}]: {} cell types, {} pairs",
            context,
            profiles.cell_types().len(),
            lr_db.len()
        );

        Ok(Self {
            context: context.into(),
            profiles,
            lr_db,
            gene_index,
        })
    }

    ///
    /// Score every (lr pair, sender, receiver) triple from the mean
    /// type profiles. Pairs are scored in parallel.
    ///
    pub fn communication_scores(&self, kind: ScoreKind) -> anyhow::Result<ContextScores> {
        let mean = &self.profiles.mean.values;
        let ntypes = self.profiles.cell_types().len();

        let slabs: Vec<Array2<f32>> = self
            .lr_db
            .pairs
            .par_iter()
            .map(|pair| {
                let mut slab = Array2::<f32>::zeros((ntypes, ntypes));
                for s in 0..ntypes {
                    let lig = complex_value(mean.column(s), &self.gene_index, &pair.ligand);
                    for r in 0..ntypes {
                        let rec = complex_value(mean.column(r), &self.gene_index, &pair.receptor);
                        slab[(s, r)] = pair.weight * kind.apply(lig, rec);
                    }
                }
                slab
            })
            .collect();

        let mut scores = Array3::<f32>::zeros((slabs.len(), ntypes, ntypes));
        for (p, slab) in slabs.into_iter().enumerate() {
            scores.index_axis_mut(Axis(0), p).assign(&slab);
        }

        ContextScores::new(
            self.context.clone(),
            self.lr_db.names(),
            self.profiles.cell_types().to_vec(),
            scores,
        )
    }

    ///
    /// Aggregate binary ligand/receptor activity into one cell-cell
    /// interaction matrix (sender x receiver).
    ///
    pub fn cci_matrix(&self, aggregate: AggregateKind) -> anyhow::Result<NamedMatrix> {
        let binary = &self.profiles.binary.values;
        let ntypes = self.profiles.cell_types().len();
        let npairs = self.lr_db.len();

        // per-pair binary activity of each side
        let mut ligand_active = Array2::<f32>::zeros((npairs, ntypes));
        let mut receptor_active = Array2::<f32>::zeros((npairs, ntypes));

        for (p, pair) in self.lr_db.pairs.iter().enumerate() {
            for t in 0..ntypes {
                ligand_active[(p, t)] =
                    complex_value(binary.column(t), &self.gene_index, &pair.ligand);
                receptor_active[(p, t)] =
                    complex_value(binary.column(t), &self.gene_index, &pair.receptor);
            }
        }

        let mut cci = Array2::<f32>::zeros((ntypes, ntypes));
        for s in 0..ntypes {
            for r in 0..ntypes {
                cci[(s, r)] =
                    aggregate.apply(ligand_active.column(s), receptor_active.column(r));
            }
        }

        let cell_types = self.profiles.cell_types().to_vec();
        NamedMatrix::new(cci, cell_types.clone(), cell_types)
    }
}
