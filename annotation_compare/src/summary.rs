use std::collections::BTreeMap;

use crate::{build_tables, AnnotationRecord, Code};

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnnotatorSummary {
    pub annotator: String,
    /// Distinct (database, record id) keys.
    pub records: usize,
    pub codes: usize,
}

/// Counts describing a batch of records, before any comparison.
///
/// All the counts are taken after grouping by annotator: a record provided
/// twice by the same annotator, or a code repeated within a record, counts once.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DatasetSummary {
    /// Distinct (annotator, database, record id) keys.
    pub records: usize,
    /// All the codes assigned.
    pub codes: usize,
    /// The number of records each code was assigned to.
    pub code_usage: BTreeMap<Code, usize>,
    pub annotators: Vec<AnnotatorSummary>,
}

impl DatasetSummary {
    pub fn from_records(records: &[AnnotationRecord]) -> DatasetSummary {
        let tables = build_tables(records);
        let mut code_usage: BTreeMap<Code, usize> = BTreeMap::new();
        for t in tables.iter() {
            for code in t.iter().flat_map(|(_, _, codes)| codes.iter()) {
                *code_usage.entry(code.clone()).or_insert(0) += 1;
            }
        }
        let annotators: Vec<AnnotatorSummary> = tables
            .iter()
            .map(|t| AnnotatorSummary {
                annotator: t.annotator().to_string(),
                records: t.records_count(),
                codes: t.codes_count(),
            })
            .collect();
        DatasetSummary {
            records: annotators.iter().map(|a| a.records).sum(),
            codes: code_usage.values().sum(),
            code_usage,
            annotators,
        }
    }
}
