use fnv::FnvHashMap as HashMap;
use rand::prelude::SliceRandom;
use std::hash::Hash;

/// partition a membership vector into groups of indexes
/// # Arguments
/// * `membership` - a vector of membership (e.g., cell type assignment)
/// * `nelem_per_group` - number of elements per group (if None, no downsampling)
/// # Returns
/// A hashmap: group name -> indexes of the elements
pub fn partition_by_membership<T>(
    membership: &[T],
    nelem_per_group: Option<usize>,
) -> HashMap<T, Vec<usize>>
where
    T: Eq + Hash + Clone,
{
    let mut groups: HashMap<T, Vec<usize>> = HashMap::default();
    for (elem, k) in membership.iter().enumerate() {
        groups.entry(k.clone()).or_default().push(elem);
    }

    if let Some(ntarget) = nelem_per_group {
        let mut rng = rand::rng();
        for elems in groups.values_mut() {
            if elems.len() > ntarget {
                elems.shuffle(&mut rng);
                elems.truncate(ntarget);
            }
        }
    }
    groups
}

/// Sorted, deduplicated copy of the given names
pub fn sorted_unique(names: &[Box<str>]) -> Vec<Box<str>> {
    let mut out = names.to_vec();
    out.sort();
    out.dedup();
    out
}

/// Names common to both sorted-unique lists, in order
pub fn sorted_intersection(lhs: &[Box<str>], rhs: &[Box<str>]) -> Vec<Box<str>> {
    let rhs: std::collections::HashSet<&str> = rhs.iter().map(|x| x.as_ref()).collect();
    lhs.iter()
        .filter(|x| rhs.contains(x.as_ref()))
        .cloned()
        .collect()
}
