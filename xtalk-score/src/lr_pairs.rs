//! Curated ligand-receptor reference tables.
//!
//! A table row pairs a ligand with a receptor; either side may be a
//! multi-subunit protein complex written `SUB1&SUB2`, whose
//! expression is summarized by the minimum over subunits.

use fnv::FnvHashMap as HashMap;
use log::info;
use xtalk_util::common_io::read_lines_of_words;

pub const COMPLEX_SEP: char = '&';
pub const PAIR_SEP: char = '^';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneComplex {
    pub subunits: Vec<Box<str>>,
}

impl GeneComplex {
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        let subunits: Vec<Box<str>> = token
            .split(COMPLEX_SEP)
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .map(|x| x.to_string().into_boxed_str())
            .collect();

        if subunits.is_empty() {
            anyhow::bail!("empty gene complex: {:?}", token);
        }
        Ok(Self { subunits })
    }

    /// every subunit must be present for the complex to be usable
    pub fn covered_by(&self, genes: &HashMap<Box<str>, usize>) -> bool {
        self.subunits.iter().all(|s| genes.contains_key(s))
    }
}

impl std::fmt::Display for GeneComplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for s in &self.subunits {
            if !first {
                write!(f, "{}", COMPLEX_SEP)?;
            }
            write!(f, "{}", s)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct LrPair {
    pub ligand: GeneComplex,
    pub receptor: GeneComplex,
    pub weight: f32,
}

impl LrPair {
    /// canonical name, e.g. `TGFB1^TGFBR1&TGFBR2`
    pub fn name(&self) -> Box<str> {
        format!("{}{}{}", self.ligand, PAIR_SEP, self.receptor).into_boxed_str()
    }
}

#[derive(Clone)]
pub struct LrDatabase {
    pub pairs: Vec<LrPair>,
}

impl LrDatabase {
    ///
    /// Read a delimited table with a header naming `ligand` and
    /// `receptor` columns (case-insensitive) and an optional `weight`
    /// column. Duplicate pairs are dropped, keeping the first.
    ///
    pub fn read_file_delim(file: &str, delim: char) -> anyhow::Result<Self> {
        let words = read_lines_of_words(file, delim, true)?;

        let find_column = |name: &str| -> Option<usize> {
            words
                .header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        };

        let lig_col = find_column("ligand")
            .ok_or_else(|| anyhow::anyhow!("no ligand column in {}", file))?;
        let rec_col = find_column("receptor")
            .ok_or_else(|| anyhow::anyhow!("no receptor column in {}", file))?;
        let weight_col = find_column("weight");

        let mut seen = HashMap::default();
        let mut pairs = vec![];

        for (i, line) in words.lines.iter().enumerate() {
            let width = lig_col.max(rec_col).max(weight_col.unwrap_or(0));
            if line.len() <= width {
                anyhow::bail!("short line {} in {}", i, file);
            }

            let weight = match weight_col {
                Some(j) => line[j].parse::<f32>()?,
                None => 1.0,
            };

            let pair = LrPair {
                ligand: GeneComplex::parse(&line[lig_col])?,
                receptor: GeneComplex::parse(&line[rec_col])?,
                weight,
            };

            if seen.insert(pair.name(), true).is_none() {
                pairs.push(pair);
            }
        }

        if pairs.is_empty() {
            anyhow::bail!("no ligand-receptor pairs in {}", file);
        }

        info!("ligand-receptor reference: {} pairs from {}", pairs.len(), file);
        Ok(Self { pairs })
    }

    pub fn from_tsv(file: &str) -> anyhow::Result<Self> {
        Self::read_file_delim(file, '\t')
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn names(&self) -> Vec<Box<str>> {
        self.pairs.iter().map(|p| p.name()).collect()
    }

    ///
    /// Keep only pairs whose ligand and receptor subunits all appear
    /// in the gene index. An empty result is an error: downstream
    /// scoring would be vacuous.
    ///
    pub fn restrict_to_genes(&self, genes: &HashMap<Box<str>, usize>) -> anyhow::Result<Self> {
        let pairs: Vec<LrPair> = self
            .pairs
            .iter()
            .filter(|p| p.ligand.covered_by(genes) && p.receptor.covered_by(genes))
            .cloned()
            .collect();

        let dropped = self.pairs.len() - pairs.len();
        if dropped > 0 {
            info!(
                "dropped {} of {} pairs with unmeasured genes",
                dropped,
                self.pairs.len()
            );
        }

        if pairs.is_empty() {
            anyhow::bail!("no ligand-receptor pair overlaps the measured genes");
        }
        Ok(Self { pairs })
    }
}
