//! Dense `Array2<f32>` with row and column names.
//!
//! This is the in-memory form of every labelled table in the
//! workspace: expression matrices (gene x cell), aggregated profiles
//! (gene x cell type), cell-cell interaction matrices and factor
//! loading matrices.

use crate::common_io::{read_lines_of_words, write_lines};
use crate::parquet::NamedMatrixParquetWriter;

use fnv::FnvHashMap as HashMap;
use ndarray::prelude::*;

#[derive(Clone, Debug)]
pub struct NamedMatrix {
    pub values: Array2<f32>,
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
}

impl NamedMatrix {
    pub fn new(
        values: Array2<f32>,
        rows: Vec<Box<str>>,
        cols: Vec<Box<str>>,
    ) -> anyhow::Result<Self> {
        if values.nrows() != rows.len() || values.ncols() != cols.len() {
            anyhow::bail!(
                "name/shape mismatch: {} x {} values vs {} row and {} column names",
                values.nrows(),
                values.ncols(),
                rows.len(),
                cols.len()
            );
        }
        Ok(Self { values, rows, cols })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// row name -> row index; duplicate names are an error
    pub fn row_index(&self) -> anyhow::Result<HashMap<Box<str>, usize>> {
        let mut index = HashMap::default();
        for (i, name) in self.rows.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                anyhow::bail!("duplicate row name: {}", name);
            }
        }
        Ok(index)
    }

    pub fn col_index(&self) -> anyhow::Result<HashMap<Box<str>, usize>> {
        let mut index = HashMap::default();
        for (j, name) in self.cols.iter().enumerate() {
            if index.insert(name.clone(), j).is_some() {
                anyhow::bail!("duplicate column name: {}", name);
            }
        }
        Ok(index)
    }

    ///
    /// Read a delimited matrix with a header line of column names and
    /// a leading row-name field on each line. The top-left header
    /// field (corner label) is ignored if present.
    ///
    pub fn read_file_delim(file: &str, delim: char) -> anyhow::Result<Self> {
        let words = read_lines_of_words(file, delim, true)?;

        if words.lines.is_empty() {
            anyhow::bail!("no data rows in {}", file);
        }

        let nrows = words.lines.len();
        let width = words.lines[0].len();

        // header may or may not carry the corner label
        let cols: Vec<Box<str>> = if words.header.len() == width {
            words.header[1..].to_vec()
        } else if words.header.len() + 1 == width {
            words.header.clone()
        } else {
            anyhow::bail!(
                "header width {} does not match row width {} in {}",
                words.header.len(),
                width,
                file
            );
        };

        let ncols = cols.len();
        let mut rows = Vec::with_capacity(nrows);
        let mut data = Vec::with_capacity(nrows * ncols);

        for (i, line) in words.lines.iter().enumerate() {
            if line.len() != ncols + 1 {
                anyhow::bail!("ragged row {} in {}", i, file);
            }
            rows.push(line[0].clone());
            for w in &line[1..] {
                data.push(w.parse::<f32>()?);
            }
        }

        Self::new(Array2::from_shape_vec((nrows, ncols), data)?, rows, cols)
    }

    pub fn from_tsv(file: &str) -> anyhow::Result<Self> {
        Self::read_file_delim(file, '\t')
    }

    ///
    /// Write the matrix with a header line; `corner` labels the
    /// row-name column (e.g., "gene").
    ///
    pub fn write_file_delim(&self, file: &str, delim: &str, corner: &str) -> anyhow::Result<()> {
        let mut lines: Vec<Box<str>> = Vec::with_capacity(self.nrows() + 1);

        let mut header = vec![corner.to_string()];
        header.extend(self.cols.iter().map(|x| x.to_string()));
        lines.push(header.join(delim).into_boxed_str());

        for (name, row) in self.rows.iter().zip(self.values.rows()) {
            let mut fields = vec![name.to_string()];
            fields.extend(row.iter().map(|x| format!("{}", x)));
            lines.push(fields.join(delim).into_boxed_str());
        }

        write_lines(&lines, file)
    }

    pub fn to_tsv(&self, file: &str, corner: &str) -> anyhow::Result<()> {
        self.write_file_delim(file, "\t", corner)
    }

    pub fn to_parquet(&self, file: &str) -> anyhow::Result<()> {
        let writer = NamedMatrixParquetWriter::new(file, &self.rows, &self.cols)?;
        writer.write(&self.values)
    }
}
