//! Communication score functions and the per-context score cube.

use crate::lr_pairs::GeneComplex;

use fnv::FnvHashMap as HashMap;
use ndarray::prelude::*;
use xtalk_util::common_io::{read_lines_of_words, write_lines};

/// How a ligand value and a receptor value combine into one
/// communication score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreKind {
    /// `l * r`
    ExpressionProduct,
    /// `(l + r) / 2`
    ExpressionMean,
    /// `sqrt(l * r)`
    ExpressionGmean,
}

impl ScoreKind {
    #[inline]
    pub fn apply(&self, ligand: f32, receptor: f32) -> f32 {
        match self {
            ScoreKind::ExpressionProduct => ligand * receptor,
            ScoreKind::ExpressionMean => 0.5 * (ligand + receptor),
            ScoreKind::ExpressionGmean => (ligand * receptor).max(0.0).sqrt(),
        }
    }
}

impl std::str::FromStr for ScoreKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expression_product" | "product" => Ok(Self::ExpressionProduct),
            "expression_mean" | "mean" => Ok(Self::ExpressionMean),
            "expression_gmean" | "gmean" => Ok(Self::ExpressionGmean),
            _ => Err(anyhow::anyhow!("unknown score kind: {}", s)),
        }
    }
}

/// How per-pair binary activity aggregates into one cell-cell
/// interaction score for a (sender, receiver) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateKind {
    /// `2 |l ∧ r| / (|l| + |r|)`
    BrayCurtis,
    /// `|l ∧ r| / |l ∨ r|`
    Jaccard,
    /// `|l ∧ r|`
    Count,
}

impl AggregateKind {
    ///
    /// * `ligand_active` - binary ligand activity of the sender, one
    ///   entry per ligand-receptor pair
    /// * `receptor_active` - binary receptor activity of the receiver
    ///
    pub fn apply(&self, ligand_active: ArrayView1<f32>, receptor_active: ArrayView1<f32>) -> f32 {
        let both = ligand_active.dot(&receptor_active);
        let n_lig = ligand_active.sum();
        let n_rec = receptor_active.sum();

        match self {
            AggregateKind::BrayCurtis => {
                let denom = n_lig + n_rec;
                if denom > 0.0 {
                    2.0 * both / denom
                } else {
                    0.0
                }
            }
            AggregateKind::Jaccard => {
                let either = n_lig + n_rec - both;
                if either > 0.0 {
                    both / either
                } else {
                    0.0
                }
            }
            AggregateKind::Count => both,
        }
    }
}

impl std::str::FromStr for AggregateKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bray_curtis" | "bray-curtis" => Ok(Self::BrayCurtis),
            "jaccard" => Ok(Self::Jaccard),
            "count" => Ok(Self::Count),
            _ => Err(anyhow::anyhow!("unknown aggregate kind: {}", s)),
        }
    }
}

/// Expression of a complex in one profile column: the minimum over
/// subunits (the limiting subunit).
pub fn complex_value(
    profile: ArrayView1<f32>,
    gene_index: &HashMap<Box<str>, usize>,
    complex: &GeneComplex,
) -> f32 {
    let mut value = f32::INFINITY;
    let mut nfound = 0_usize;
    for s in &complex.subunits {
        if let Some(&i) = gene_index.get(s) {
            value = value.min(profile[i]);
            nfound += 1;
        }
    }
    // restricted databases always find every subunit
    if nfound == 0 {
        0.0
    } else {
        value
    }
}

/// Communication scores of one context: a
/// `lr-pair x sender x receiver` cube with axis labels.
#[derive(Clone)]
pub struct ContextScores {
    pub context: Box<str>,
    pub lr_names: Vec<Box<str>>,
    pub cell_types: Vec<Box<str>>,
    pub scores: Array3<f32>,
}

impl ContextScores {
    pub fn new(
        context: Box<str>,
        lr_names: Vec<Box<str>>,
        cell_types: Vec<Box<str>>,
        scores: Array3<f32>,
    ) -> anyhow::Result<Self> {
        let expected = (lr_names.len(), cell_types.len(), cell_types.len());
        if scores.dim() != expected {
            anyhow::bail!(
                "score cube is {:?}, labels expect {:?}",
                scores.dim(),
                expected
            );
        }
        Ok(Self {
            context,
            lr_names,
            cell_types,
            scores,
        })
    }

    ///
    /// Write the cube in long format:
    /// `lr_pair <TAB> sender <TAB> receiver <TAB> score`.
    ///
    pub fn to_long_tsv(&self, file: &str) -> anyhow::Result<()> {
        let mut lines: Vec<Box<str>> =
            Vec::with_capacity(self.scores.len() + 1);
        lines.push("lr_pair\tsender\treceiver\tscore".into());

        for (p, lr) in self.lr_names.iter().enumerate() {
            for (s, sender) in self.cell_types.iter().enumerate() {
                for (r, receiver) in self.cell_types.iter().enumerate() {
                    lines.push(
                        format!("{}\t{}\t{}\t{}", lr, sender, receiver, self.scores[(p, s, r)])
                            .into_boxed_str(),
                    );
                }
            }
        }
        write_lines(&lines, file)
    }

    ///
    /// Read a long-format score table back into a cube. Axis labels
    /// are the sorted unique values seen in the file; missing
    /// combinations stay `NaN` so that tensor assembly can mask them.
    ///
    pub fn from_long_tsv(file: &str, context: &str) -> anyhow::Result<Self> {
        let words = read_lines_of_words(file, '\t', true)?;

        if words.header.len() < 4 {
            anyhow::bail!("expected 4 columns in {}", file);
        }

        let mut lr_names = vec![];
        let mut cell_types = vec![];
        for (i, line) in words.lines.iter().enumerate() {
            if line.len() < 4 {
                anyhow::bail!("short line {} in {}", i, file);
            }
            lr_names.push(line[0].clone());
            cell_types.push(line[1].clone());
            cell_types.push(line[2].clone());
        }
        lr_names.sort();
        lr_names.dedup();
        cell_types.sort();
        cell_types.dedup();

        let lr_index: HashMap<_, _> = lr_names
            .iter()
            .enumerate()
            .map(|(i, x)| (x.clone(), i))
            .collect();
        let ct_index: HashMap<_, _> = cell_types
            .iter()
            .enumerate()
            .map(|(i, x)| (x.clone(), i))
            .collect();

        let nn = cell_types.len();
        let mut scores = Array3::from_elem((lr_names.len(), nn, nn), f32::NAN);

        for line in words.lines.iter() {
            let p = lr_index[&line[0]];
            let s = ct_index[&line[1]];
            let r = ct_index[&line[2]];
            scores[(p, s, r)] = line[3].parse::<f32>()?;
        }

        Self::new(context.into(), lr_names, cell_types, scores)
    }
}
