use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::metadata::SampleMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Area,
    Line,
}

impl FromStr for ChartType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "area" => Ok(Self::Area),
            "line" => Ok(Self::Line),
            _ => Err("no match"),
        }
    }
}

/// Config
///
/// Configuration info for the program, generated from the command line
/// arguments.  Once set it is read only.
///
/// coverage_file - path to the coverage table
/// sample_data - optional per-sample colors/order (colors already fixed up)
/// output_prefix - stem for the chart page file names
/// table_output - optional path for the processed table
/// window_size - smoothing/decimation window; 0 means auto-compute
/// compress_threshold - samples with more points than this get compressed
/// no_compression - skip smoothing and decimation entirely
/// max_coverage - cap for coverage values; 0 disables the cap
/// chart_type - area or line panels
/// samples_per_page - panels per output page
/// width / panel_height - page width and per-panel height in pixels
/// common_y_scale - share one y range across all panels
///
pub struct Config {
    coverage_file: PathBuf,
    sample_data: Option<SampleMetadata>,
    output_prefix: String,
    table_output: Option<PathBuf>,
    window_size: usize,
    compress_threshold: usize,
    no_compression: bool,
    max_coverage: f64,
    chart_type: ChartType,
    samples_per_page: usize,
    width: u32,
    panel_height: u32,
    common_y_scale: bool,
}

impl Config {
    pub fn new(coverage_file: PathBuf, output_prefix: String) -> Self {
        Self {
            coverage_file,
            output_prefix,
            sample_data: None,
            table_output: None,
            window_size: 0,
            compress_threshold: 5000,
            no_compression: false,
            max_coverage: 0.0,
            chart_type: ChartType::Area,
            samples_per_page: 8,
            width: 1000,
            panel_height: 120,
            common_y_scale: false,
        }
    }

    pub fn set_sample_data(&mut self, meta: SampleMetadata) {
        self.sample_data = Some(meta)
    }

    pub fn set_table_output<P: AsRef<Path>>(&mut self, p: P) {
        self.table_output = Some(p.as_ref().to_owned())
    }

    pub fn set_window_size(&mut self, w: usize) {
        self.window_size = w
    }

    pub fn set_compress_threshold(&mut self, t: usize) {
        self.compress_threshold = t
    }

    pub fn set_no_compression(&mut self) {
        self.no_compression = true
    }

    pub fn set_max_coverage(&mut self, m: f64) {
        self.max_coverage = m
    }

    pub fn set_chart_type(&mut self, c: ChartType) {
        self.chart_type = c
    }

    pub fn set_samples_per_page(&mut self, n: usize) {
        self.samples_per_page = n
    }

    pub fn set_width(&mut self, w: u32) {
        self.width = w
    }

    pub fn set_panel_height(&mut self, h: u32) {
        self.panel_height = h
    }

    pub fn set_common_y_scale(&mut self) {
        self.common_y_scale = true
    }

    pub fn coverage_file(&self) -> &Path {
        &self.coverage_file
    }

    pub fn sample_data(&self) -> Option<&SampleMetadata> {
        self.sample_data.as_ref()
    }

    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    pub fn table_output(&self) -> Option<&Path> {
        self.table_output.as_deref()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn compress_threshold(&self) -> usize {
        self.compress_threshold
    }

    pub fn no_compression(&self) -> bool {
        self.no_compression
    }

    pub fn max_coverage(&self) -> f64 {
        self.max_coverage
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn samples_per_page(&self) -> usize {
        self.samples_per_page
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn panel_height(&self) -> u32 {
        self.panel_height
    }

    pub fn common_y_scale(&self) -> bool {
        self.common_y_scale
    }
}
