use crate::cmp::*;

use serde_json::json;
use serde_json::Map as JSMap;
use std::collections::BTreeMap;

fn code_to_json(code: &Code) -> JSValue {
    match code {
        Code::Int(i) => json!(i),
        Code::Text(s) => json!(s),
    }
}

fn optional_code_to_json(code: Option<&Code>) -> JSValue {
    code.map(code_to_json).unwrap_or(JSValue::Null)
}

/// Undefined statistics are written as null.
fn ratio_to_json(x: Option<f64>) -> JSValue {
    match x {
        Some(v) => json!(v),
        None => JSValue::Null,
    }
}

fn cell_to_json(cell: &MatrixCell) -> JSValue {
    match cell {
        MatrixCell::NotApplicable => json!({"status": "self"}),
        MatrixCell::NoComparableData => json!({"status": "noComparableData"}),
        MatrixCell::Failed(e) => json!({"status": "error", "message": e.to_string()}),
        MatrixCell::Stats(ps) => json!({
            "status": "ok",
            "Se": ratio_to_json(ps.stats.se),
            "Sp": ratio_to_json(ps.stats.sp),
            "PPV": ratio_to_json(ps.stats.ppv),
            "NPV": ratio_to_json(ps.stats.npv),
            "Acc": ratio_to_json(ps.stats.acc),
            "Records": ps.records,
            "TP": ps.counts.true_positives,
            "FP": ps.counts.false_positives,
            "FN": ps.counts.false_negatives,
            "TN": ps.true_negatives,
        }),
    }
}

/// The label of the thesaurus file if one was read, otherwise the version
/// used by the majority of the records.
fn thesaurus_label(result: &ComparisonResult, thesaurus: Option<&Thesaurus>) -> JSValue {
    match thesaurus {
        Some(t) => json!(t.label),
        None => json!(result.thesaurus_version),
    }
}

pub fn stats_report(result: &ComparisonResult, thesaurus: Option<&Thesaurus>) -> JSValue {
    let m = &result.matrix;
    let mut matrix: JSMap<String, JSValue> = JSMap::new();
    for (i, reference) in m.annotators.iter().enumerate() {
        let mut row: JSMap<String, JSValue> = JSMap::new();
        for (j, other) in m.annotators.iter().enumerate() {
            if let Some(cell) = m.cells.get(i).and_then(|r| r.get(j)) {
                row.insert(other.clone(), cell_to_json(cell));
            }
        }
        matrix.insert(reference.clone(), JSValue::Object(row));
    }

    let excluded: Vec<JSValue> = m
        .excluded
        .iter()
        .map(|e| json!({"annotator": e.annotator, "records": e.records}))
        .collect();

    let removed: Vec<JSValue> = result
        .removed
        .iter()
        .map(|r| {
            json!({
                "database": r.database,
                "record": r.record_id,
                "annotator": r.annotator,
                "value": r.thesaurus_version,
            })
        })
        .collect();

    json!({
        "thesaurus": thesaurus_label(result, thesaurus),
        "universeSize": m.universe_size,
        "annotators": m.annotators,
        "excludedAnnotators": excluded,
        "removedRecords": removed,
        "matrix": matrix,
    })
}

pub fn agreement_report(
    result: &ComparisonResult,
    agreement: &[RecordAgreement],
    thesaurus: Option<&Thesaurus>,
) -> JSValue {
    let records: Vec<JSValue> = agreement
        .iter()
        .map(|ra| {
            let codes: Vec<JSValue> = ra
                .codes
                .iter()
                .map(|(code, annotators)| {
                    json!({"conclusion": code_to_json(code), "annotators": annotators})
                })
                .collect();
            json!({
                "database": ra.database,
                "record": ra.record_id,
                "conclusionsAnnotators": codes,
            })
        })
        .collect();
    let mut annotators: Vec<&str> = result.tables.iter().map(|t| t.annotator()).collect();
    annotators.sort_unstable();
    json!({
        "thesaurus": thesaurus_label(result, thesaurus),
        "annotators": annotators,
        "records": records,
    })
}

fn counts_to_json(counts: &BTreeMap<Code, u64>) -> JSValue {
    let l: Vec<JSValue> = counts
        .iter()
        .map(|(code, count)| json!({"conclusion": code_to_json(code), "count": count}))
        .collect();
    JSValue::Array(l)
}

pub fn match_counts_report(sets: &[ComparingSet]) -> JSValue {
    let l: Vec<JSValue> = sets
        .iter()
        .map(|cs| {
            let matches: Vec<JSValue> = cs
                .matches
                .iter()
                .map(|(other, counts)| json!({"annotator": other, "counts": counts_to_json(counts)}))
                .collect();
            json!({
                "annotator": cs.annotator,
                "recordsCount": cs.records_count,
                "conclusionsCount": cs.codes_count,
                "matches": matches,
            })
        })
        .collect();
    JSValue::Array(l)
}

/// The record by record comparison of two annotators.
pub fn pair_report(cmp: &TableComparison, matches_by_code: &BTreeMap<Code, u64>) -> JSValue {
    let records: Vec<JSValue> = cmp
        .records
        .iter()
        .map(|rc| {
            let labels: Vec<JSValue> = rc
                .pairs
                .iter()
                .map(|p| {
                    json!([
                        optional_code_to_json(p.reference()),
                        optional_code_to_json(p.other())
                    ])
                })
                .collect();
            json!({
                "database": rc.database,
                "record": rc.record_id,
                "matchCount": rc.matches,
                "refAnnotations": rc.reference_codes,
                "testAnnotations": rc.other_codes,
                "labels": labels,
            })
        })
        .collect();
    json!({
        "reference": cmp.reference,
        "test": cmp.other,
        "recordsCount": cmp.records.len(),
        "matchCount": cmp.counts.true_positives,
        "misses": cmp.misses(),
        "refAnnotations": cmp.reference_codes(),
        "testAnnotations": cmp.other_codes(),
        "matchesByCode": counts_to_json(matches_by_code),
        "records": records,
    })
}
