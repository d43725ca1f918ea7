use std::{
    collections::HashSet,
    io::BufRead,
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::get_next_line;

use crate::error::PipelineError;

/// Required header of the coverage table (exact names, exact order)
pub const COVERAGE_HEADER: [&str; 5] = [
    "unique_entry_id",
    "nt_position",
    "split_name",
    "sample_name",
    "coverage",
];

/// One row of the coverage table
#[derive(Debug)]
pub struct CoverageRow {
    pub entry_id: u64,
    pub nt_position: u32,
    pub split: Arc<str>,
    pub sample: Arc<str>,
    pub coverage: f64,
    /// Sample-wide plotting coordinate, contiguous across the sample's splits
    pub x: u32,
    pub color: Option<Arc<str>>,
}

/// CoverageTable
///
/// Rows are kept sorted by (sample, split, position) after parsing; the
/// x coordinates are assigned once at that point and never recomputed.
/// `samples` holds the distinct sample names in their current group order
/// (natural order after parsing, metadata order after merging).
#[derive(Debug)]
pub struct CoverageTable {
    rows: Vec<CoverageRow>,
    samples: Vec<Arc<str>>,
}

impl CoverageTable {
    pub fn rows(&self) -> &[CoverageRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [CoverageRow] {
        &mut self.rows
    }

    pub fn samples(&self) -> &[Arc<str>] {
        &self.samples
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Sample keys for every row, aligned with rows()
    pub fn sample_keys(&self) -> Vec<Arc<str>> {
        self.rows.iter().map(|r| r.sample.clone()).collect()
    }

    /// Coverage values for every row, aligned with rows()
    pub fn coverage_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.coverage).collect()
    }

    pub fn retain_rows<F: FnMut(&CoverageRow) -> bool>(&mut self, f: F) {
        self.rows.retain(f)
    }

    /// Replace the sample ordering (used when metadata dictates the order).
    /// The new order must cover the same sample set or a subset of it.
    pub fn set_sample_order(&mut self, samples: Vec<Arc<str>>) {
        self.samples = samples
    }

    /// Cap coverage values at `max`.  Applying the cap twice is the same
    /// as applying it once.
    pub fn cap_coverage(&mut self, max: f64) {
        for r in self.rows.iter_mut() {
            if r.coverage > max {
                r.coverage = max
            }
        }
    }

    pub fn max_coverage(&self) -> f64 {
        self.rows.iter().map(|r| r.coverage).fold(0.0, f64::max)
    }

    /// Assign plotting coordinates.  With a single split overall the
    /// 0-based positions are already a contiguous coordinate per sample, so
    /// they are used directly.  With multiple splits each sample gets a
    /// fresh 0..n count across its splits in sorted split order.  Rows must
    /// already be sorted by (sample, split, position).
    fn assign_x(&mut self) {
        let n_splits = self
            .rows
            .iter()
            .map(|r| r.split.clone())
            .collect::<HashSet<_>>()
            .len();

        if n_splits < 2 {
            for r in self.rows.iter_mut() {
                r.x = r.nt_position
            }
        } else {
            let mut cur: Option<Arc<str>> = None;
            let mut x = 0;
            for r in self.rows.iter_mut() {
                if cur.as_ref() != Some(&r.sample) {
                    cur = Some(r.sample.clone());
                    x = 0;
                }
                r.x = x;
                x += 1;
            }
        }
    }
}

fn intern(names: &mut HashSet<Arc<str>>, s: &str) -> Arc<str> {
    match names.get(s) {
        Some(a) => a.clone(),
        None => {
            let a: Arc<str> = Arc::from(s);
            names.insert(a.clone());
            a
        }
    }
}

/// Read the coverage table from a (possibly compressed) tab separated file
pub fn read_coverage_table<P: AsRef<Path>>(fname: P) -> anyhow::Result<CoverageTable> {
    debug!(
        "Reading in coverage table from {}",
        fname.as_ref().display()
    );
    let mut rdr = CompressIo::new()
        .path(&fname)
        .bufreader()
        .with_context(|| "Could not open coverage table for input")?;
    parse_coverage_table(&mut rdr, &fname.as_ref().display().to_string())
}

/// Parse the coverage table from a buffered reader.  The first line must
/// match [COVERAGE_HEADER] exactly; afterwards rows are sorted and the
/// plotting coordinates assigned.
pub fn parse_coverage_table<R: BufRead>(rdr: &mut R, src: &str) -> anyhow::Result<CoverageTable> {
    let mut buf = String::new();
    let mut line = 0;

    let hdr = get_next_line(rdr, &mut buf)?
        .ok_or_else(|| PipelineError::Format(format!("{}: empty input file", src)))?;
    if hdr != COVERAGE_HEADER {
        return Err(PipelineError::Format(format!(
            "{}: unexpected header in coverage table (expected '{}')",
            src,
            COVERAGE_HEADER.join("\t")
        ))
        .into());
    }
    line += 1;

    let mut names = HashSet::new();
    let mut rows = Vec::new();

    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from {}", line, src))?
    {
        line += 1;
        // Skip empty lines
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }
        if fields.len() != 5 {
            return Err(PipelineError::Format(format!(
                "{}:{} expected 5 columns, found {}",
                src,
                line,
                fields.len()
            ))
            .into());
        }
        let entry_id = fields[0]
            .parse::<u64>()
            .with_context(|| format!("{}:{} Error reading entry id", src, line))?;
        let nt_position = fields[1]
            .parse::<u32>()
            .with_context(|| format!("{}:{} Error reading nt position", src, line))?;
        let coverage = fields[4]
            .parse::<f64>()
            .with_context(|| format!("{}:{} Error reading coverage", src, line))?;

        rows.push(CoverageRow {
            entry_id,
            nt_position,
            split: intern(&mut names, fields[2]),
            sample: intern(&mut names, fields[3]),
            coverage,
            x: 0,
            color: None,
        });
    }

    rows.sort_by(|a, b| {
        a.sample
            .cmp(&b.sample)
            .then_with(|| a.split.cmp(&b.split))
            .then_with(|| a.nt_position.cmp(&b.nt_position))
    });

    let mut samples: Vec<Arc<str>> = rows
        .iter()
        .map(|r| r.sample.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    samples.sort();

    debug!(
        "Finished reading in {} lines; found {} rows over {} samples",
        line,
        rows.len(),
        samples.len()
    );

    let mut tbl = CoverageTable { rows, samples };
    tbl.assign_x();
    Ok(tbl)
}
