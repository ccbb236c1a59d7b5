//! The 4-way communication tensor
//! (context x lr pair x sender x receiver).

use fnv::FnvHashMap as HashMap;
use log::info;
use ndarray::prelude::*;
use xtalk_score::scoring::ContextScores;
use xtalk_util::utils::{sorted_intersection, sorted_unique};

/// How axis labels of different contexts are reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorJoin {
    /// keep labels present in every context
    Inner,
    /// keep the union; entries absent from a context are masked out
    Outer,
}

impl std::str::FromStr for TensorJoin {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "outer" => Ok(Self::Outer),
            _ => Err(anyhow::anyhow!("unknown join: {}", s)),
        }
    }
}

#[derive(Clone)]
pub struct InteractionTensor {
    /// zero-filled at unobserved entries
    pub data: Array4<f32>,
    /// `Some` only when entries are unobserved; 1 = observed
    pub mask: Option<Array4<f32>>,
    pub contexts: Vec<Box<str>>,
    pub lr_names: Vec<Box<str>>,
    pub cell_types: Vec<Box<str>>,
}

impl InteractionTensor {
    ///
    /// Stack per-context score cubes into one tensor. With
    /// [`TensorJoin::Outer`], label axes are the sorted union over
    /// contexts and the mask records which entries were observed;
    /// with [`TensorJoin::Inner`], only shared labels survive.
    /// `NaN` scores in a cube are treated as unobserved either way.
    ///
    pub fn build(cubes: &[ContextScores], join: TensorJoin) -> anyhow::Result<Self> {
        if cubes.is_empty() {
            anyhow::bail!("no contexts to stack");
        }

        let contexts: Vec<Box<str>> = cubes.iter().map(|c| c.context.clone()).collect();
        {
            let unique = sorted_unique(&contexts);
            if unique.len() != contexts.len() {
                anyhow::bail!("duplicate context names");
            }
        }

        let mut lr_names = sorted_unique(&cubes[0].lr_names);
        let mut cell_types = sorted_unique(&cubes[0].cell_types);
        for cube in &cubes[1..] {
            match join {
                TensorJoin::Inner => {
                    lr_names = sorted_intersection(&lr_names, &cube.lr_names);
                    cell_types = sorted_intersection(&cell_types, &cube.cell_types);
                }
                TensorJoin::Outer => {
                    let mut lr = lr_names;
                    lr.extend(cube.lr_names.iter().cloned());
                    lr_names = sorted_unique(&lr);

                    let mut ct = cell_types;
                    ct.extend(cube.cell_types.iter().cloned());
                    cell_types = sorted_unique(&ct);
                }
            }
        }

        if lr_names.is_empty() || cell_types.is_empty() {
            anyhow::bail!("empty tensor axis after {:?} join", join);
        }

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

        let shape = (
            contexts.len(),
            lr_names.len(),
            cell_types.len(),
            cell_types.len(),
        );
        let mut data = Array4::<f32>::zeros(shape);
        let mut mask = Array4::<f32>::zeros(shape);

        for (c, cube) in cubes.iter().enumerate() {
            for (p_src, lr) in cube.lr_names.iter().enumerate() {
                let Some(&p) = lr_index.get(lr) else { continue };
                for (s_src, sender) in cube.cell_types.iter().enumerate() {
                    let Some(&s) = ct_index.get(sender) else { continue };
                    for (r_src, receiver) in cube.cell_types.iter().enumerate() {
                        let Some(&r) = ct_index.get(receiver) else { continue };

                        let value = cube.scores[(p_src, s_src, r_src)];
                        if value.is_finite() {
                            data[(c, p, s, r)] = value;
                            mask[(c, p, s, r)] = 1.0;
                        }
                    }
                }
            }
        }

        let nobs = mask.sum();
        let ntot = mask.len() as f32;

        info!(
            "tensor {:?}: {} of {} entries observed",
            shape, nobs, ntot
        );

        if nobs <= 0.0 {
            anyhow::bail!("tensor has no observed entries");
        }

        let mask = if nobs < ntot { Some(mask) } else { None };
        Ok(Self {
            data,
            mask,
            contexts,
            lr_names,
            cell_types,
        })
    }

    pub fn dims(&self) -> [usize; 4] {
        let (a, b, c, d) = self.data.dim();
        [a, b, c, d]
    }

    /// labels of each mode, in tensor order
    pub fn mode_labels(&self) -> [&[Box<str>]; 4] {
        [
            &self.contexts,
            &self.lr_names,
            &self.cell_types,
            &self.cell_types,
        ]
    }

    pub fn mode_names() -> [&'static str; 4] {
        ["context", "lr_pair", "sender", "receiver"]
    }

    /// Frobenius norm over observed entries
    pub fn norm(&self) -> f32 {
        match &self.mask {
            Some(mask) => (&self.data * &self.data * mask).sum().sqrt(),
            None => (&self.data * &self.data).sum().sqrt(),
        }
    }
}
