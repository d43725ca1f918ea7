use std::{fs, io::Write, path::PathBuf};

use tempfile::tempdir;

use cov_plot::{
    color::fix_colors,
    config::{ChartType, Config},
    coverage::read_coverage_table,
    error::PipelineError,
    metadata::read_sample_metadata,
    process::process_data,
};

fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
    let p = dir.join(name);
    let mut f = fs::File::create(&p).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    p
}

fn coverage_file(dir: &std::path::Path) -> PathBuf {
    let mut s =
        String::from("unique_entry_id\tnt_position\tsplit_name\tsample_name\tcoverage\n");
    let mut id = 0;
    for sample in ["s_1", "s_2"] {
        for split in ["split_001", "split_002"] {
            for pos in 0..10 {
                s.push_str(&format!(
                    "{}\t{}\t{}\t{}\t{}\n",
                    id,
                    pos,
                    split,
                    sample,
                    (pos % 7) * 10
                ));
                id += 1;
            }
        }
    }
    write_file(dir, "coverage.txt", &s)
}

#[test]
fn end_to_end_with_metadata() {
    let dir = tempdir().unwrap();
    let cov = coverage_file(dir.path());
    let meta_file = write_file(
        dir.path(),
        "samples.txt",
        "sample_name\tsample_color\ns_2\tblue\ns_1\tnot-a-color\n",
    );

    let mut meta = read_sample_metadata(&meta_file).unwrap();
    fix_colors(&mut meta);

    let out = dir.path().join("chart");
    let table_out = dir.path().join("processed.txt");
    let mut cfg = Config::new(cov, out.to_string_lossy().into_owned());
    cfg.set_sample_data(meta);
    cfg.set_chart_type(ChartType::Line);
    cfg.set_max_coverage(50.0);
    cfg.set_table_output(&table_out);

    process_data(&cfg).unwrap();

    let svg = dir.path().join("chart.svg");
    assert!(svg.exists(), "chart page not written");

    let table = fs::read_to_string(&table_out).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(
        lines[0],
        "unique_entry_id\tnt_position\tsplit_name\tsample_name\tcoverage\tx_values\tsample_color"
    );
    // 40 rows survive (below the compression threshold), s_2 first per
    // metadata order, with contiguous x over both splits
    assert_eq!(lines.len(), 41);
    let first: Vec<&str> = lines[1].split('\t').collect();
    assert_eq!(first[3], "s_2");
    assert_eq!(first[5], "0");
    assert_eq!(first[6], "blue");
    let last: Vec<&str> = lines[40].split('\t').collect();
    assert_eq!(last[3], "s_1");
    assert_eq!(last[5], "19");
    assert_eq!(last[6], "#333333");
    // Cap applied
    assert!(lines[1..]
        .iter()
        .all(|l| l.split('\t').nth(4).unwrap().parse::<f64>().unwrap() <= 50.0));
}

#[test]
fn bad_coverage_header_is_fatal() {
    let dir = tempdir().unwrap();
    let cov = write_file(
        dir.path(),
        "coverage.txt",
        "id\tpos\tsplit\tsample\tcov\n0\t0\ta\tb\t1\n",
    );
    let err = read_coverage_table(&cov).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Format(_))
    ));
}

#[test]
fn compression_and_pagination() {
    let dir = tempdir().unwrap();
    let mut s =
        String::from("unique_entry_id\tnt_position\tsplit_name\tsample_name\tcoverage\n");
    let mut id = 0;
    for sample in ["a", "b", "c"] {
        for pos in 0..2000 {
            s.push_str(&format!("{}\t{}\tsplit_1\t{}\t{}\n", id, pos, sample, pos % 30));
            id += 1;
        }
    }
    let cov = write_file(dir.path(), "coverage.txt", &s);

    let out = dir.path().join("big");
    let mut cfg = Config::new(cov, out.to_string_lossy().into_owned());
    cfg.set_compress_threshold(1000);
    cfg.set_samples_per_page(2);

    process_data(&cfg).unwrap();

    // 3 samples, 2 per page
    assert!(dir.path().join("big_1.svg").exists());
    assert!(dir.path().join("big_2.svg").exists());
    assert!(!dir.path().join("big_3.svg").exists());
}
