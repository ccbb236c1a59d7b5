//! Factor loading export: one named matrix per tensor mode plus a
//! JSON run summary.

use crate::cp::CpModel;
use crate::elbow::ElbowResult;
use crate::tensor::InteractionTensor;

use serde::Serialize;
use xtalk_util::common_io::{mkdir, write_lines};
use xtalk_util::named::NamedMatrix;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Tsv,
    Parquet,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(Self::Tsv),
            "parquet" => Ok(Self::Parquet),
            _ => Err(anyhow::anyhow!("unknown export format: {}", s)),
        }
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    rank: usize,
    error: f32,
    iterations: usize,
    converged: bool,
    dims: [usize; 4],
    modes: [&'static str; 4],
    weights: &'a [f32],
}

fn factor_column_names(rank: usize) -> Vec<Box<str>> {
    (1..=rank)
        .map(|r| format!("factor_{}", r).into_boxed_str())
        .collect()
}

///
/// Write one loading matrix per mode to
/// `{header}.{mode}.{tsv.gz|parquet}` and return the file names.
///
pub fn export_factors(
    model: &CpModel,
    tensor: &InteractionTensor,
    header: &str,
    format: ExportFormat,
) -> anyhow::Result<Vec<Box<str>>> {
    let labels = tensor.mode_labels();
    let modes = InteractionTensor::mode_names();
    let cols = factor_column_names(model.rank());

    let mut files = vec![];
    for (mode, factor) in model.factors.iter().enumerate() {
        let named = NamedMatrix::new(factor.clone(), labels[mode].to_vec(), cols.clone())?;

        let file = match format {
            ExportFormat::Tsv => {
                let file = format!("{}.{}.tsv.gz", header, modes[mode]);
                mkdir(&file)?;
                named.to_tsv(&file, modes[mode])?;
                file
            }
            ExportFormat::Parquet => {
                let file = format!("{}.{}.parquet", header, modes[mode]);
                mkdir(&file)?;
                named.to_parquet(&file)?;
                file
            }
        };
        files.push(file.into_boxed_str());
    }

    Ok(files)
}

/// Write rank, error, and per-component weights as JSON.
pub fn export_summary(
    model: &CpModel,
    tensor: &InteractionTensor,
    header: &str,
) -> anyhow::Result<Box<str>> {
    let weights: Vec<f32> = model.weights.to_vec();
    let summary = RunSummary {
        rank: model.rank(),
        error: model.error,
        iterations: model.iterations,
        converged: model.converged,
        dims: tensor.dims(),
        modes: InteractionTensor::mode_names(),
        weights: &weights,
    };

    let file = format!("{}.summary.json", header);
    mkdir(&file)?;
    write_lines(&[serde_json::to_string_pretty(&summary)?], &file)?;
    Ok(file.into_boxed_str())
}

/// Write the elbow error curve as a two-column TSV.
pub fn export_elbow_curve(result: &ElbowResult, header: &str) -> anyhow::Result<Box<str>> {
    let mut lines: Vec<Box<str>> = vec!["rank\terror".into()];
    for point in &result.curve {
        lines.push(format!("{}\t{}", point.rank, point.error).into_boxed_str());
    }

    let file = format!("{}.elbow.tsv", header);
    mkdir(&file)?;
    write_lines(&lines, &file)?;
    Ok(file.into_boxed_str())
}
