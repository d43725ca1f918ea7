use std::{
    collections::{HashMap, HashSet},
    io::BufRead,
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::get_next_line;

use crate::{coverage::CoverageTable, error::PipelineError};

/// Required header of the sample metadata file
pub const METADATA_HEADER: [&str; 2] = ["sample_name", "sample_color"];

#[derive(Debug)]
pub struct SampleEntry {
    name: Arc<str>,
    color: String,
}

impl SampleEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, c: &str) {
        self.color = c.to_owned()
    }
}

/// SampleMetadata
///
/// Per-sample display attributes.  The sequence order of the entries is
/// the plotting order; sample names are unique.  Read only after the
/// color fix up at startup.
#[derive(Debug)]
pub struct SampleMetadata {
    entries: Vec<SampleEntry>,
}

impl SampleMetadata {
    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [SampleEntry] {
        &mut self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name())
    }

    /// Build directly from (name, color) pairs, keeping their order
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(n, c)| SampleEntry {
                    name: Arc::from(*n),
                    color: (*c).to_owned(),
                })
                .collect(),
        }
    }
}

/// Read the sample metadata from a (possibly compressed) tab separated file
pub fn read_sample_metadata<P: AsRef<Path>>(fname: P) -> anyhow::Result<SampleMetadata> {
    debug!(
        "Reading in sample metadata from {}",
        fname.as_ref().display()
    );
    let mut rdr = CompressIo::new()
        .path(&fname)
        .bufreader()
        .with_context(|| "Could not open sample metadata file for input")?;
    parse_sample_metadata(&mut rdr, &fname.as_ref().display().to_string())
}

pub fn parse_sample_metadata<R: BufRead>(rdr: &mut R, src: &str) -> anyhow::Result<SampleMetadata> {
    let mut buf = String::new();
    let mut line = 0;

    let hdr = get_next_line(rdr, &mut buf)?
        .ok_or_else(|| PipelineError::Format(format!("{}: empty metadata file", src)))?;
    if hdr != METADATA_HEADER {
        return Err(PipelineError::Format(format!(
            "{}: unexpected header in sample metadata (expected '{}')",
            src,
            METADATA_HEADER.join("\t")
        ))
        .into());
    }
    line += 1;

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from {}", line, src))?
    {
        line += 1;
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }
        if fields.len() != 2 {
            return Err(PipelineError::Format(format!(
                "{}:{} expected 2 columns, found {}",
                src,
                line,
                fields.len()
            ))
            .into());
        }
        // The entry order is the plotting order, so duplicates would make
        // the order ambiguous
        if !seen.insert(fields[0].to_owned()) {
            return Err(PipelineError::Format(format!(
                "{}:{} duplicate sample name {}",
                src, line, fields[0]
            ))
            .into());
        }
        entries.push(SampleEntry {
            name: Arc::from(fields[0]),
            color: fields[1].to_owned(),
        });
    }

    debug!("Found metadata for {} samples", entries.len());
    Ok(SampleMetadata { entries })
}

/// Every sample named in the metadata must exist in the coverage table
/// (the metadata may cover a subset of the table, not the reverse)
pub fn check_sample_names(meta: &SampleMetadata, tbl: &CoverageTable) -> anyhow::Result<()> {
    let known: HashSet<&str> = tbl.samples().iter().map(|s| s.as_ref()).collect();
    let missing: Vec<&str> = meta.names().filter(|n| !known.contains(n)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "Sample(s) in metadata not present in coverage table: {}",
            missing.join(", ")
        ))
        .into())
    }
}

/// Drop coverage rows for samples the metadata does not mention
pub fn subset_to_known_samples(tbl: &mut CoverageTable, meta: &SampleMetadata) {
    let wanted: HashSet<&str> = meta.names().collect();
    let before = tbl.n_rows();
    tbl.retain_rows(|r| wanted.contains(r.sample.as_ref()));
    let dropped = before - tbl.n_rows();
    if dropped > 0 {
        info!(
            "Dropped {} coverage rows for samples without metadata",
            dropped
        );
    }
    let keep: Vec<Arc<str>> = tbl
        .samples()
        .iter()
        .filter(|s| wanted.contains(s.as_ref()))
        .cloned()
        .collect();
    tbl.set_sample_order(keep);
}

/// Re-order rows so samples follow the metadata sequence order, with
/// ascending x within each sample, and install that order as the table's
/// sample order
pub fn sort_by_metadata_order(tbl: &mut CoverageTable, meta: &SampleMetadata) {
    let rank: HashMap<&str, usize> = meta
        .names()
        .enumerate()
        .map(|(ix, n)| (n, ix))
        .collect();

    tbl.rows_mut().sort_by_key(|r| {
        (
            rank.get(r.sample.as_ref()).copied().unwrap_or(usize::MAX),
            r.x,
        )
    });
    tbl.set_sample_order(meta.names().map(Arc::from).collect());
}

/// Left join of the metadata colors onto the coverage rows.  Rows without
/// a metadata entry keep an unset color (cannot happen after subsetting,
/// but is not an error if it does).
pub fn join_metadata(tbl: &mut CoverageTable, meta: &SampleMetadata) {
    let colors: HashMap<&str, Arc<str>> = meta
        .entries()
        .iter()
        .map(|e| (e.name(), Arc::from(e.color())))
        .collect();
    for r in tbl.rows_mut() {
        r.color = colors.get(r.sample.as_ref()).cloned();
    }
}

/// Merge the sample metadata into the coverage table.  The step order is
/// fixed: the name check must precede subsetting, and the sort must
/// precede the join so the join is a pure column add.
pub fn merge_sample_data(tbl: &mut CoverageTable, meta: &SampleMetadata) -> anyhow::Result<()> {
    check_sample_names(meta, tbl)?;
    subset_to_known_samples(tbl, meta);
    sort_by_metadata_order(tbl, meta);
    join_metadata(tbl, meta);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::tests::table_from_str;
    use std::io::Cursor;

    const HDR: &str = "unique_entry_id\tnt_position\tsplit_name\tsample_name\tcoverage\n";

    fn two_sample_table() -> CoverageTable {
        let mut s = String::from(HDR);
        for i in 0..3 {
            s.push_str(&format!("{}\t{}\tsp\ts_1\t1\n", i, i));
        }
        for i in 0..3 {
            s.push_str(&format!("{}\t{}\tsp\ts_2\t2\n", 3 + i, i));
        }
        table_from_str(&s).unwrap()
    }

    #[test]
    fn header_mismatch_is_a_format_error() {
        let res = parse_sample_metadata(&mut Cursor::new("name\tcolor\ns1\tblue\n"), "test");
        assert!(matches!(
            res.unwrap_err().downcast_ref::<PipelineError>(),
            Some(PipelineError::Format(_))
        ));
    }

    #[test]
    fn duplicate_sample_is_a_format_error() {
        let res = parse_sample_metadata(
            &mut Cursor::new("sample_name\tsample_color\ns1\tblue\ns1\tred\n"),
            "test",
        );
        assert!(matches!(
            res.unwrap_err().downcast_ref::<PipelineError>(),
            Some(PipelineError::Format(_))
        ));
    }

    #[test]
    fn unknown_sample_is_a_validation_error() {
        let tbl = two_sample_table();
        let meta = SampleMetadata::from_pairs(&[("s_1", "blue"), ("s_9", "red")]);
        let err = check_sample_names(&meta, &tbl).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn metadata_order_drives_row_order() {
        let mut tbl = two_sample_table();
        let meta = SampleMetadata::from_pairs(&[("s_2", "red"), ("s_1", "blue")]);
        merge_sample_data(&mut tbl, &meta).unwrap();

        let got: Vec<(&str, u32)> = tbl
            .rows()
            .iter()
            .map(|r| (r.sample.as_ref(), r.x))
            .collect();
        assert_eq!(
            got,
            vec![
                ("s_2", 0),
                ("s_2", 1),
                ("s_2", 2),
                ("s_1", 0),
                ("s_1", 1),
                ("s_1", 2)
            ]
        );
        assert_eq!(
            tbl.samples().iter().map(|s| s.as_ref()).collect::<Vec<_>>(),
            vec!["s_2", "s_1"]
        );
        assert!(tbl.rows().iter().all(|r| r.color.is_some()));
        assert_eq!(tbl.rows()[0].color.as_deref(), Some("red"));
    }

    #[test]
    fn subsetting_drops_unlisted_samples() {
        let mut tbl = two_sample_table();
        let meta = SampleMetadata::from_pairs(&[("s_2", "red")]);
        merge_sample_data(&mut tbl, &meta).unwrap();
        assert_eq!(tbl.n_rows(), 3);
        assert!(tbl.rows().iter().all(|r| r.sample.as_ref() == "s_2"));
    }
}
