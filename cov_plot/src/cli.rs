use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    Command,
};

use anyhow::Context;

use utils::{init_log, LogLevel};

use crate::{
    color::fix_colors,
    config::{ChartType, Config},
    metadata::read_sample_metadata,
};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("output_prefix")
                .short('o')
                .long("output-prefix")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("split_coverage")
                .help("Set stem for output chart file names"),
        )
        .arg(
            Arg::new("sample_data")
                .short('S')
                .long("sample-data")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Tab separated file with sample_name and sample_color columns; its row order sets the plotting order"),
        )
        .arg(
            Arg::new("window_size")
                .short('w')
                .long("window-size")
                .value_parser(value_parser!(usize))
                .value_name("INT")
                .default_value("0")
                .help("Window size for smoothing and decimation; must be odd [0 = auto-compute from the largest sample]"),
        )
        .arg(
            Arg::new("compress_threshold")
                .short('T')
                .long("compress-threshold")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .default_value("5000")
                .help("Compress when any sample has more points than this"),
        )
        .arg(
            Arg::new("no_compression")
                .long("no-compression")
                .action(ArgAction::SetTrue)
                .help("Plot every point without smoothing or decimation"),
        )
        .arg(
            Arg::new("max_coverage")
                .short('m')
                .long("max-coverage")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("0")
                .help("Cap coverage values at this level [0 = no cap]"),
        )
        .arg(
            Arg::new("chart_type")
                .short('c')
                .long("chart-type")
                .value_parser(value_parser!(ChartType))
                .ignore_case(true)
                .value_name("TYPE")
                .default_value("area")
                .help("Chart type per sample panel (area or line)"),
        )
        .arg(
            Arg::new("samples_per_page")
                .short('n')
                .long("samples-per-page")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .default_value("8")
                .help("Maximum number of sample panels per output page"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .default_value("1000")
                .help("Page width in pixels"),
        )
        .arg(
            Arg::new("panel_height")
                .long("panel-height")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .default_value("120")
                .help("Height of each sample panel in pixels"),
        )
        .arg(
            Arg::new("common_y_scale")
                .short('y')
                .long("common-y-scale")
                .action(ArgAction::SetTrue)
                .help("Use one common y axis range for all sample panels"),
        )
        .arg(
            Arg::new("table_output")
                .long("table-output")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Also write the processed coverage table to this path"),
        )
        .arg(
            Arg::new("coverage_file")
                .value_parser(value_parser!(PathBuf))
                .value_name("COVERAGE_FILE")
                .required(true)
                .help("Input tab separated file with per-nucleotide split coverage"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let coverage_file = m
        .get_one::<PathBuf>("coverage_file")
        .expect("Missing coverage file")
        .clone();

    let output_prefix = m
        .get_one::<String>("output_prefix")
        .expect("Missing default output prefix")
        .clone();

    let mut cfg = Config::new(coverage_file, output_prefix);

    // The core expects an odd window size or the auto sentinel; even
    // values are bumped here at the boundary
    let mut window = *m.get_one::<usize>("window_size").unwrap();
    if window > 0 && window & 1 == 0 {
        warn!(
            "Window size must be odd; using {} instead of {}",
            window + 1,
            window
        );
        window += 1;
    }
    cfg.set_window_size(window);

    cfg.set_compress_threshold(usize::from(
        *m.get_one::<NonZeroUsize>("compress_threshold").unwrap(),
    ));
    if m.get_flag("no_compression") {
        cfg.set_no_compression()
    }

    let max_cov = *m.get_one::<f64>("max_coverage").unwrap();
    if max_cov < 0.0 {
        return Err(anyhow!("Invalid max coverage {} (must be >= 0)", max_cov));
    }
    cfg.set_max_coverage(max_cov);

    cfg.set_chart_type(*m.get_one::<ChartType>("chart_type").unwrap());
    cfg.set_samples_per_page(usize::from(
        *m.get_one::<NonZeroUsize>("samples_per_page").unwrap(),
    ));
    cfg.set_width(usize::from(*m.get_one::<NonZeroUsize>("width").unwrap()) as u32);
    cfg.set_panel_height(usize::from(*m.get_one::<NonZeroUsize>("panel_height").unwrap()) as u32);
    if m.get_flag("common_y_scale") {
        cfg.set_common_y_scale()
    }

    if let Some(p) = m.get_one::<PathBuf>("table_output") {
        cfg.set_table_output(p)
    }

    // Read in sample metadata if supplied; colors are normalized here so
    // the rest of the pipeline only sees valid ones
    if let Some(p) = m.get_one::<PathBuf>("sample_data") {
        let mut meta =
            read_sample_metadata(p).with_context(|| "Could not read sample metadata file")?;
        fix_colors(&mut meta);
        cfg.set_sample_data(meta);
    }

    Ok(cfg)
}
