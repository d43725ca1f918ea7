use std::{collections::HashMap, sync::Arc};

use crate::{
    coverage::CoverageTable,
    group::{self, group_indices},
};

/// Number of rows per sample, in the table's sample order
pub fn points_per_sample(tbl: &CoverageTable) -> Vec<usize> {
    group_indices(&tbl.sample_keys(), tbl.samples())
        .iter()
        .map(|g| g.len())
        .collect()
}

/// Window size derived from the point count of the largest sample.
/// Scales with data volume and is always odd (a valid centered running
/// median kernel); even candidates are bumped up by one, so a candidate
/// of 0 becomes 1.
pub fn auto_window_size(sample_size: usize) -> usize {
    let w = sample_size * 3 / 1000;
    if w & 1 == 0 {
        w + 1
    } else {
        w
    }
}

/// Centered running median with the given odd window size.  The first and
/// last (window - 1) / 2 values are smoothed with symmetrically shrinking
/// windows rather than dropped.
pub fn running_median(v: &[f64], window: usize) -> Vec<f64> {
    assert!(window & 1 == 1, "running median window must be odd");
    let n = v.len();
    let k = window >> 1;
    let mut out = Vec::with_capacity(n);
    let mut buf = Vec::with_capacity(window);
    for i in 0..n {
        let h = k.min(i).min(n - 1 - i);
        buf.clear();
        buf.extend_from_slice(&v[i - h..=i + h]);
        out.push(utils::median(&mut buf));
    }
    out
}

/// Smooth the coverage column with a per-sample running median.  Smoothed
/// values come back keyed by row index, so they are written back by row
/// identity rather than by position.
pub fn smooth_coverage(tbl: &mut CoverageTable, window: usize) {
    let groups = group_indices(&tbl.sample_keys(), tbl.samples());
    let cov = tbl.coverage_values();
    let smoothed = group::transform(&cov, &groups, |v| running_median(v, window));
    let rows = tbl.rows_mut();
    for (ix, z) in smoothed {
        rows[ix].coverage = z
    }
}

/// Decimate the table, keeping one row in `window` per sample plus the
/// final row of each sample.  The first row (x == 0) is always on the
/// window grid, so both ends of every track survive.
pub fn shrink_data(tbl: &mut CoverageTable, window: usize) {
    let w = window as u32;
    let mut max_x: HashMap<Arc<str>, u32> = HashMap::new();
    for r in tbl.rows() {
        let e = max_x.entry(r.sample.clone()).or_insert(0);
        if r.x > *e {
            *e = r.x
        }
    }
    tbl.retain_rows(|r| r.x % w == 0 || Some(&r.x) == max_x.get(&r.sample));
}

/// Compress the coverage table if any sample holds more points than
/// `threshold`.  A window size of 0 means auto-compute from the largest
/// sample; the same window is then applied to every sample.
pub fn compress(tbl: &mut CoverageTable, window_size: usize, threshold: usize) {
    let counts = points_per_sample(tbl);
    let max_n = match counts.iter().max() {
        Some(&n) => n,
        None => return,
    };
    if max_n <= threshold {
        debug!(
            "Largest sample has {} points (threshold {}); no compression needed",
            max_n, threshold
        );
        return;
    }
    let window = if window_size == 0 {
        if counts.iter().any(|&n| n != max_n) {
            warn!(
                "Samples have differing numbers of points; window size is computed from the largest sample ({} points) and applied to all",
                max_n
            );
        }
        auto_window_size(max_n)
    } else {
        window_size
    };
    info!(
        "Compressing coverage data ({} rows) with window size {}",
        tbl.n_rows(),
        window
    );
    smooth_coverage(tbl, window);
    shrink_data(tbl, window);
    info!("{} rows after compression", tbl.n_rows());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::tests::table_from_str;

    const HDR: &str = "unique_entry_id\tnt_position\tsplit_name\tsample_name\tcoverage\n";

    fn small_table() -> CoverageTable {
        let mut s = String::from(HDR);
        for i in 0..8 {
            s.push_str(&format!("{}\t{}\tsplit_1\ts1\t{}\n", i, i, i + 1));
        }
        table_from_str(&s).unwrap()
    }

    #[test]
    fn auto_window_is_odd_and_scales() {
        assert_eq!(auto_window_size(999), 3);
        assert_eq!(auto_window_size(2000), 7);
        assert_eq!(auto_window_size(0), 1);
        assert_eq!(auto_window_size(1000), 3);
    }

    #[test]
    fn running_median_shrinks_at_edges() {
        assert_eq!(
            running_median(&[1.0, 4.0, 3.0, 4.0], 3),
            vec![1.0, 3.0, 4.0, 4.0]
        );
        // Window 1 is a no-op smoother
        assert_eq!(running_median(&[2.0, 9.0], 1), vec![2.0, 9.0]);
    }

    #[test]
    fn shrink_keeps_grid_and_final_points() {
        let mut tbl = small_table();
        shrink_data(&mut tbl, 3);
        let x: Vec<u32> = tbl.rows().iter().map(|r| r.x).collect();
        assert_eq!(x, vec![0, 3, 6, 7]);
    }

    #[test]
    fn shrink_keeps_last_point_per_sample() {
        let mut s = String::from(HDR);
        for i in 0..8 {
            s.push_str(&format!("{}\t{}\tsplit_1\ts1\t1\n", i, i));
        }
        for i in 0..5 {
            s.push_str(&format!("{}\t{}\tsplit_1\ts2\t1\n", 8 + i, i));
        }
        let mut tbl = table_from_str(&s).unwrap();
        shrink_data(&mut tbl, 3);
        let got: Vec<(&str, u32)> = tbl
            .rows()
            .iter()
            .map(|r| (r.sample.as_ref(), r.x))
            .collect();
        assert_eq!(
            got,
            vec![
                ("s1", 0),
                ("s1", 3),
                ("s1", 6),
                ("s1", 7),
                ("s2", 0),
                ("s2", 3),
                ("s2", 4)
            ]
        );
    }

    #[test]
    fn smoothing_assigns_by_row_identity() {
        let mut tbl = table_from_str(
            "unique_entry_id\tnt_position\tsplit_name\tsample_name\tcoverage\n\
             0\t0\tsp\ts1\t1\n\
             1\t1\tsp\ts1\t4\n\
             2\t2\tsp\ts1\t3\n\
             3\t3\tsp\ts1\t4\n",
        )
        .unwrap();
        smooth_coverage(&mut tbl, 3);
        assert_eq!(tbl.coverage_values(), vec![1.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn below_threshold_is_a_no_op() {
        let mut tbl = small_table();
        let before: Vec<(u64, u32, f64)> = tbl
            .rows()
            .iter()
            .map(|r| (r.entry_id, r.x, r.coverage))
            .collect();
        compress(&mut tbl, 0, 100);
        let after: Vec<(u64, u32, f64)> = tbl
            .rows()
            .iter()
            .map(|r| (r.entry_id, r.x, r.coverage))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn above_threshold_reduces_row_count() {
        let mut s = String::from(HDR);
        for i in 0..2000u32 {
            s.push_str(&format!("{}\t{}\tsplit_1\ts1\t{}\n", i, i, i % 50));
        }
        let mut tbl = table_from_str(&s).unwrap();
        compress(&mut tbl, 0, 1000);
        // Window 7: the grid points 0,7,..,1995 plus the final point 1999
        assert_eq!(tbl.n_rows(), 287);
        assert_eq!(tbl.rows().last().unwrap().x, 1999);
    }
}
