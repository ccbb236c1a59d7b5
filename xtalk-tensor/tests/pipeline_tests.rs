//! End-to-end: expression -> interaction space -> tensor -> CP.

use ndarray::prelude::*;
use xtalk_score::expression::{CutoffKind, ExpressionMatrix};
use xtalk_score::interaction_space::InteractionSpace;
use xtalk_score::lr_pairs::{GeneComplex, LrDatabase, LrPair};
use xtalk_score::scoring::{ContextScores, ScoreKind};
use xtalk_tensor::cp::{cp_decompose, CpInit, CpOptions};
use xtalk_tensor::export::{export_factors, export_summary, ExportFormat};
use xtalk_tensor::tensor::{InteractionTensor, TensorJoin};
use xtalk_util::membership::Membership;
use xtalk_util::named::NamedMatrix;
use xtalk_util::ndarray_util::*;
use xtalk_util::traits::SampleOps;

const NTYPES: usize = 3;
const CELLS_PER_TYPE: usize = 10;
const NPAIRS: usize = 4;

fn toy_context(context: usize) -> ContextScores {
    let ngenes = 2 * NPAIRS;
    let ncells = NTYPES * CELLS_PER_TYPE;

    let mut values = Array2::<f32>::rgamma(ngenes, ncells, (2.0, 0.5));

    // pair k: sender k % NTYPES, receiver (k+1) % NTYPES, on in
    // every other context
    for k in 0..NPAIRS {
        if (k + context) % 2 != 0 {
            continue;
        }
        for j in 0..ncells {
            let t = j / CELLS_PER_TYPE;
            if t == k % NTYPES {
                values[(2 * k, j)] *= 10.0;
            }
            if t == (k + 1) % NTYPES {
                values[(2 * k + 1, j)] *= 10.0;
            }
        }
    }

    let mut genes: Vec<Box<str>> = vec![];
    for k in 0..NPAIRS {
        genes.push(format!("LIG{}", k).into_boxed_str());
        genes.push(format!("REC{}", k).into_boxed_str());
    }
    let cells: Vec<Box<str>> = (0..ncells)
        .map(|j| format!("cell{}", j).into_boxed_str())
        .collect();

    let expr =
        ExpressionMatrix::new(NamedMatrix::new(values, genes, cells.clone()).unwrap()).unwrap();

    let membership: Membership = cells
        .iter()
        .enumerate()
        .map(|(j, cell)| {
            let t = j / CELLS_PER_TYPE;
            (cell.clone(), format!("T{}", t).into_boxed_str())
        })
        .collect();

    let lr_db = LrDatabase {
        pairs: (0..NPAIRS)
            .map(|k| LrPair {
                ligand: GeneComplex::parse(&format!("LIG{}", k)).unwrap(),
                receptor: GeneComplex::parse(&format!("REC{}", k)).unwrap(),
                weight: 1.0,
            })
            .collect(),
    };

    let space = InteractionSpace::new(
        &format!("ctx{}", context),
        &expr,
        &membership,
        &lr_db,
        &CutoffKind::GeneQuantile(0.5),
    )
    .unwrap();

    space
        .communication_scores(ScoreKind::ExpressionProduct)
        .unwrap()
}

#[test]
fn score_tensor_factorize_export() {
    let cubes: Vec<ContextScores> = (0..4).map(toy_context).collect();

    let tensor = InteractionTensor::build(&cubes, TensorJoin::Outer).unwrap();
    assert_eq!(tensor.dims(), [4, NPAIRS, NTYPES, NTYPES]);

    let opts = CpOptions {
        rank: 2,
        init: CpInit::Svd,
        max_iter: 300,
        tol: 1e-6,
    };
    let model = cp_decompose(&tensor, &opts).unwrap();

    assert!(model.error.is_finite());
    assert!(model.error < 1.0);
    for (factor, &dim) in model.factors.iter().zip(tensor.dims().iter()) {
        assert_eq!(factor.nrows(), dim);
        assert_eq!(factor.ncols(), 2);
        assert!(factor.iter().all(|&x| x >= 0.0));
    }

    let temp = tempfile::tempdir().unwrap();
    let header = temp.path().join("fit");
    let header = header.to_str().unwrap();

    let files = export_factors(&model, &tensor, header, ExportFormat::Tsv).unwrap();
    assert_eq!(files.len(), 4);
    for file in &files {
        assert!(std::path::Path::new(file.as_ref()).exists());
    }

    // context loadings round-trip with the right labels
    let context_factor = NamedMatrix::from_tsv(&files[0]).unwrap();
    assert_eq!(context_factor.rows, tensor.contexts);
    let expected_cols: Vec<Box<str>> = vec!["factor_1".into(), "factor_2".into()];
    assert_eq!(context_factor.cols, expected_cols);

    let summary = export_summary(&model, &tensor, header).unwrap();
    let text = std::fs::read_to_string(summary.as_ref()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["rank"], 2);
}
