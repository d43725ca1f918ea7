use std::{collections::HashMap, sync::Arc};

/// Partition row indices into groups following an explicit ordered list of
/// group keys.  Each inner vector holds the indices of the rows belonging
/// to the corresponding key in `order`, in the order they appear in `keys`.
/// Keys not listed in `order` are ignored.
pub fn group_indices(keys: &[Arc<str>], order: &[Arc<str>]) -> Vec<Vec<usize>> {
    let lookup: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(ix, s)| (s.as_ref(), ix))
        .collect();

    let mut groups = vec![Vec::new(); order.len()];
    for (ix, k) in keys.iter().enumerate() {
        if let Some(&g) = lookup.get(k.as_ref()) {
            groups[g].push(ix)
        }
    }
    groups
}

/// Apply a reducing function to the values of each group, returning one
/// result per group in group order.
pub fn aggregate<F>(values: &[f64], groups: &[Vec<usize>], f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    groups
        .iter()
        .map(|g| {
            let v: Vec<f64> = g.iter().map(|&ix| values[ix]).collect();
            f(&v)
        })
        .collect()
}

/// Apply an element-wise function (one output value per input value) to the
/// values of each group.  Results are returned keyed by the original row
/// index so the caller can write them back by row identity, independent of
/// how the table happens to be ordered.
pub fn transform<F>(values: &[f64], groups: &[Vec<usize>], f: F) -> Vec<(usize, f64)>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut out = Vec::with_capacity(values.len());
    for g in groups {
        let v: Vec<f64> = g.iter().map(|&ix| values[ix]).collect();
        let w = f(&v);
        assert_eq!(w.len(), v.len(), "element-wise function changed cardinality");
        out.extend(g.iter().copied().zip(w));
    }
    out
}
