use std::{io::Write, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;

use crate::{
    compress,
    config::Config,
    coverage::{self, CoverageTable},
    metadata, plot,
};

/// Strategy
///
/// Read in the coverage table (sorted and with plotting coordinates
/// assigned).  Compress it when any sample exceeds the threshold, cap the
/// coverage values, then merge in the sample metadata if supplied (check,
/// subset, sort, join - in that order).  The finished table goes to the
/// renderer and optionally to a TSV file.
pub fn process_data(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");

    let mut tbl = coverage::read_coverage_table(cfg.coverage_file())?;
    if tbl.n_rows() == 0 {
        return Err(anyhow!(
            "No coverage rows found in {}",
            cfg.coverage_file().display()
        ));
    }

    if cfg.no_compression() {
        debug!("Compression disabled");
    } else {
        compress::compress(&mut tbl, cfg.window_size(), cfg.compress_threshold());
    }

    if cfg.max_coverage() > 0.0 {
        debug!("Capping coverage at {}", cfg.max_coverage());
        tbl.cap_coverage(cfg.max_coverage());
    }

    if let Some(meta) = cfg.sample_data() {
        metadata::merge_sample_data(&mut tbl, meta)
            .with_context(|| "Error merging sample metadata")?;
    }

    if let Some(p) = cfg.table_output() {
        write_table(&tbl, p)?;
    }

    plot::render(&tbl, cfg)
}

/// Write the processed table as TSV
fn write_table(tbl: &CoverageTable, path: &Path) -> anyhow::Result<()> {
    debug!("Writing processed table to {}", path.display());
    let mut wrt = CompressIo::new()
        .path(path)
        .bufwriter()
        .with_context(|| "Failed to open table output file")?;

    let has_colors = tbl.rows().iter().any(|r| r.color.is_some());
    write!(wrt, "{}\tx_values", coverage::COVERAGE_HEADER.join("\t"))?;
    if has_colors {
        write!(wrt, "\tsample_color")?;
    }
    writeln!(wrt)?;

    for r in tbl.rows() {
        write!(
            wrt,
            "{}\t{}\t{}\t{}\t{}\t{}",
            r.entry_id, r.nt_position, r.split, r.sample, r.coverage, r.x
        )?;
        if has_colors {
            write!(wrt, "\t{}", r.color.as_deref().unwrap_or(""))?;
        }
        writeln!(wrt)?;
    }
    Ok(())
}
