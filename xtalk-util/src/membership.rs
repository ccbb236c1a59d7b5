//! Cell to group membership read from two-column files.

use crate::common_io::read_lines_of_words;
use fnv::FnvHashMap as HashMap;
use log::info;

/// A mapping from item names (cells) to group names (cell types).
#[derive(Clone)]
pub struct Membership {
    map: HashMap<Box<str>, Box<str>>,
}

impl Membership {
    ///
    /// Read a membership file where each line is `item<delim>group`.
    ///
    pub fn from_file(file: &str, delim: char) -> anyhow::Result<Self> {
        let words = read_lines_of_words(file, delim, false)?;

        let mut map = HashMap::default();
        for (i, line) in words.lines.iter().enumerate() {
            match line.len() {
                2 => {
                    if map.insert(line[0].clone(), line[1].clone()).is_some() {
                        anyhow::bail!("duplicate item {} in {}", line[0], file);
                    }
                }
                _ => {
                    anyhow::bail!("line {} of {} is not `item<delim>group`", i, file);
                }
            }
        }

        if map.is_empty() {
            anyhow::bail!("empty membership file: {}", file);
        }

        info!("membership: {} items from {}", map.len(), file);
        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, item: &str) -> Option<&str> {
        self.map.get(item).map(|x| x.as_ref())
    }

    ///
    /// Assign a group label to each of the `items`, erroring out if
    /// any item has no membership record.
    ///
    pub fn assign(&self, items: &[Box<str>]) -> anyhow::Result<Vec<Box<str>>> {
        let mut labels = Vec::with_capacity(items.len());
        let mut unmatched = 0_usize;

        for item in items {
            match self.map.get(item) {
                Some(group) => labels.push(group.clone()),
                None => {
                    unmatched += 1;
                }
            }
        }

        if unmatched > 0 {
            anyhow::bail!("{} of {} items have no group label", unmatched, items.len());
        }
        Ok(labels)
    }

    /// Sorted, deduplicated group names
    pub fn groups(&self) -> Vec<Box<str>> {
        let mut groups: Vec<Box<str>> = self.map.values().cloned().collect();
        groups.sort();
        groups.dedup();
        groups
    }
}

impl FromIterator<(Box<str>, Box<str>)> for Membership {
    fn from_iter<I: IntoIterator<Item = (Box<str>, Box<str>)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
