use log::{debug, info, warn};

use annotation_compare::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::cmp::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_json;
mod report;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CmpError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing report"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading folder {path}"))]
    ReadingFolder {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Configuration file {path} has no parent folder"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Input files not found"))]
    NoInputRecords {},
    #[snafu(display("Annotator {annotator} not found"))]
    UnknownAnnotator { annotator: String },
    #[snafu(display("Comparison failed: {source}"))]
    Comparison { source: CompareErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CmpResult<T> = Result<T, CmpError>;

fn log_summary(summary: &DatasetSummary) {
    info!(
        "Summary: {} records, {} codes, {} distinct codes",
        summary.records,
        summary.codes,
        summary.code_usage.len()
    );
    for a in summary.annotators.iter() {
        info!(
            "Summary: annotator {}: {} records, {} codes",
            a.annotator, a.records, a.codes
        );
    }
    for (code, count) in summary.code_usage.iter() {
        debug!("Summary: code {}: {}", code, count);
    }
}

fn find_table<'a>(tables: &'a [RecordTable], annotator: &str) -> CmpResult<&'a RecordTable> {
    tables
        .iter()
        .find(|t| t.annotator() == annotator)
        .context(UnknownAnnotatorSnafu {
            annotator: annotator.to_string(),
        })
}

/// Checks a computed report against a reference report.
///
/// Both are pretty-printed, so that the differences can be shown line by line.
fn check_reference(reference_path: &str, pretty_js_stats: &str) -> CmpResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_js_reference =
        serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {})?;
    if pretty_js_reference != pretty_js_stats {
        warn!("Found differences with the reference report");
        print_diff(pretty_js_reference.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated statistics and reference statistics")
    }
    info!("The statistics match the reference {}", reference_path);
    Ok(())
}

/// Runs the full comparison and writes all the requested outputs.
pub fn run_comparison(settings: &Settings) -> CmpResult<()> {
    info!("settings: {:?}", settings);

    let records = io_json::read_input_paths(&settings.input_paths)?;
    if records.is_empty() {
        return NoInputRecordsSnafu {}.fail();
    }

    if settings.summary {
        log_summary(&DatasetSummary::from_records(&records));
    }

    let thesaurus = match settings.thesaurus_path.as_ref() {
        Some(p) => Some(read_thesaurus(p)?),
        None => None,
    };

    let result = annotation_compare::run_comparison(records, &settings.rules, thesaurus.as_ref())
        .context(ComparisonSnafu {})?;

    let stats_js = report::stats_report(&result, thesaurus.as_ref());
    let pretty_js_stats =
        serde_json::to_string_pretty(&stats_js).context(SerializingJsonSnafu {})?;
    io_common::write_output(settings.output_path.as_deref(), &pretty_js_stats)?;

    if let Some(p) = settings.agreement_output_path.as_deref() {
        let agreement = annotators_by_code(&result.tables, thesaurus.as_ref());
        let js = report::agreement_report(&result, &agreement, thesaurus.as_ref());
        let pretty_js = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
        io_common::write_output(Some(p), &pretty_js)?;
    }

    if let Some(p) = settings.match_counts_output_path.as_deref() {
        let js = report::match_counts_report(&comparing_sets(&result.tables));
        let pretty_js = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
        io_common::write_output(Some(p), &pretty_js)?;
    }

    if let Some((ref_annr, test_annr)) = settings.pair.as_ref() {
        let reference = find_table(&result.tables, ref_annr)?;
        let other = find_table(&result.tables, test_annr)?;
        let cmp = compare_tables(reference, other);
        info!(
            "{} vs {}: {} records, {} matches, {} misses",
            ref_annr,
            test_annr,
            cmp.records.len(),
            cmp.counts.true_positives,
            cmp.misses()
        );
        let js = report::pair_report(&cmp, &match_counts_by_code(reference, other));
        let pretty_js = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
        io_common::write_output(settings.pair_output_path.as_deref(), &pretty_js)?;
    }

    // The reference report, if provided for comparison
    if let Some(p) = settings.reference_path.as_deref() {
        check_reference(p, &pretty_js_stats)?;
    }

    Ok(())
}

/// Reads a JSON report written by a previous run.
fn read_reference(path: &str) -> CmpResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> String {
        format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn settings(name: &str) -> Settings {
        let dir = test_dir(name);
        Settings {
            input_paths: vec![format!("{}/data", dir)],
            thesaurus_path: Some(format!("{}/thesaurus.json", dir)),
            output_path: Some(format!(
                "{}/anncmp_{}_stats.json",
                std::env::temp_dir().display(),
                name
            )),
            reference_path: Some(format!("{}/expected_stats.json", dir)),
            ..Settings::default()
        }
    }

    fn load(name: &str) -> (ComparisonResult, Thesaurus) {
        let s = settings(name);
        let records = io_json::read_input_paths(&s.input_paths).unwrap();
        let thesaurus = read_thesaurus(s.thesaurus_path.as_ref().unwrap()).unwrap();
        let result =
            annotation_compare::run_comparison(records, &s.rules, Some(&thesaurus)).unwrap();
        (result, thesaurus)
    }

    #[test]
    fn three_annotators_match_reference() {
        let res = run_comparison(&settings("three_annotators"));
        if let Err(e) = &res {
            eprintln!("An error occured {}", e);
        }
        assert!(res.is_ok());
    }

    #[test]
    fn three_annotators_with_config() {
        let dir = test_dir("three_annotators");
        let s = Settings::from_config_file(&format!("{}/config.json", dir)).unwrap();
        assert_eq!(s.input_paths, vec![format!("{}/data", dir)]);
        assert_eq!(s.rules.max_annotators, 5);
        assert!(run_comparison(&s).is_ok());
    }

    #[test]
    fn three_annotators_records() {
        let (result, thesaurus) = load("three_annotators");
        assert_eq!(thesaurus.len(), 10);
        assert_eq!(result.thesaurus_version, Some("ecg-1".to_string()));
        assert_eq!(result.matrix.annotators, vec!["alice", "bob", "carol"]);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].annotator, "dave");
    }

    #[test]
    fn wrong_reference_fails() {
        let mut s = settings("three_annotators");
        s.rules.max_annotators = 2;
        let res = run_comparison(&s);
        assert!(matches!(res, Err(CmpError::Whatever { .. })));
    }

    #[test]
    fn too_few_annotators_fails() {
        let mut s = settings("three_annotators");
        s.rules.min_annotators = 4;
        s.rules.max_annotators = 5;
        let res = run_comparison(&s);
        assert!(matches!(
            res,
            Err(CmpError::Comparison {
                source: CompareErrors::InsufficientAnnotators {
                    found: 3,
                    required: 4
                }
            })
        ));
    }

    #[test]
    fn empty_input_fails() {
        let mut s = settings("three_annotators");
        s.input_paths = vec![format!("{}/thesaurus.json", test_dir("three_annotators"))];
        let res = run_comparison(&s);
        assert!(matches!(res, Err(CmpError::NoInputRecords {})));
    }

    #[test]
    fn unknown_pair_annotator_fails() {
        let mut s = settings("three_annotators");
        s.reference_path = None;
        s.pair = Some(("alice".to_string(), "zoe".to_string()));
        let res = run_comparison(&s);
        assert!(matches!(res, Err(CmpError::UnknownAnnotator { .. })));
    }

    #[test]
    fn pair_report_alice_bob() {
        let (result, _) = load("three_annotators");
        let alice = find_table(&result.tables, "alice").unwrap();
        let bob = find_table(&result.tables, "bob").unwrap();
        let cmp = compare_tables(alice, bob);
        let js = report::pair_report(&cmp, &match_counts_by_code(alice, bob));
        assert_eq!(js["recordsCount"], 2);
        assert_eq!(js["matchCount"], 3);
        assert_eq!(js["misses"], 3);
        assert_eq!(js["refAnnotations"], 4);
        assert_eq!(js["testAnnotations"], 5);
        assert_eq!(js["records"][0]["record"], "100");
        assert_eq!(js["records"][0]["labels"][0], serde_json::json!([1, null]));
        assert_eq!(js["records"][0]["labels"][1], serde_json::json!([2, 2]));
    }

    #[test]
    fn agreement_report_follows_thesaurus() {
        let (result, thesaurus) = load("three_annotators");
        let agreement = annotators_by_code(&result.tables, Some(&thesaurus));
        let js = report::agreement_report(&result, &agreement, Some(&thesaurus));
        assert_eq!(js["thesaurus"], "ecg-1");
        let first = &js["records"][0];
        assert_eq!(first["database"], "mitdb");
        assert_eq!(first["record"], "100");
        assert_eq!(
            first["conclusionsAnnotators"][0],
            serde_json::json!({"conclusion": 1, "annotators": ["alice", "carol"]})
        );
    }

    #[test]
    fn match_counts_report_lists_matches() {
        let (result, _) = load("three_annotators");
        let js = report::match_counts_report(&comparing_sets(&result.tables));
        assert_eq!(js[0]["annotator"], "alice");
        assert_eq!(js[0]["recordsCount"], 2);
        assert_eq!(js[0]["matches"][0]["annotator"], "bob");
        assert_eq!(
            js[0]["matches"][0]["counts"],
            serde_json::json!([{"conclusion": 2, "count": 1}, {"conclusion": 3, "count": 1}, {"conclusion": 5, "count": 1}])
        );
    }
}
