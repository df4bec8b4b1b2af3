use log::debug;

use std::collections::BTreeMap;

use crate::{Code, RecordTable, Thesaurus};

/// For one record, the annotators that assigned each code.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RecordAgreement {
    pub database: String,
    pub record_id: String,
    /// The annotators of each code are sorted by name.
    pub codes: Vec<(Code, Vec<String>)>,
}

/// Reshapes the tables of all the annotators into one entry per record.
///
/// If a thesaurus is provided, the codes that do not belong to it are dropped
/// and the codes are listed in thesaurus order. Otherwise they are listed in
/// their natural order.
pub fn annotators_by_code(
    tables: &[RecordTable],
    thesaurus: Option<&Thesaurus>,
) -> Vec<RecordAgreement> {
    let mut reshaped: BTreeMap<(&str, &str), BTreeMap<&Code, Vec<String>>> = BTreeMap::new();
    for t in tables.iter() {
        for (db, rec, codes) in t.iter() {
            let entry = reshaped.entry((db, rec)).or_default();
            for code in codes.iter() {
                if let Some(th) = thesaurus {
                    if !th.contains(code) {
                        debug!(
                            "annotators_by_code: {}-{}: dropping code {} of {}, not in thesaurus",
                            db,
                            rec,
                            code,
                            t.annotator()
                        );
                        continue;
                    }
                }
                entry
                    .entry(code)
                    .or_default()
                    .push(t.annotator().to_string());
            }
        }
    }

    reshaped
        .into_iter()
        .map(|((db, rec), groups)| {
            let mut codes: Vec<(Code, Vec<String>)> = groups
                .into_iter()
                .map(|(code, mut annotators)| {
                    annotators.sort();
                    (code.clone(), annotators)
                })
                .collect();
            if let Some(th) = thesaurus {
                codes.sort_by_key(|(code, _)| th.position(code));
            }
            RecordAgreement {
                database: db.to_string(),
                record_id: rec.to_string(),
                codes,
            }
        })
        .collect()
}

/// How many times each code of the reference was also assigned by the other
/// annotator, over their shared records.
pub fn match_counts_by_code(reference: &RecordTable, other: &RecordTable) -> BTreeMap<Code, u64> {
    let mut counts: BTreeMap<Code, u64> = BTreeMap::new();
    for (db, rec, codes) in reference.iter() {
        if let Some(other_codes) = other.get(db, rec) {
            for code in codes.intersection(other_codes) {
                *counts.entry(code.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// The per-code matches of one annotator against all the others.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ComparingSet {
    pub annotator: String,
    /// Only the annotators with at least one match, in table order.
    pub matches: Vec<(String, BTreeMap<Code, u64>)>,
    pub records_count: usize,
    pub codes_count: usize,
}

pub fn comparing_sets(tables: &[RecordTable]) -> Vec<ComparingSet> {
    tables
        .iter()
        .map(|t| {
            let matches = tables
                .iter()
                .filter(|other| other.annotator() != t.annotator())
                .filter_map(|other| {
                    let counts = match_counts_by_code(t, other);
                    if counts.is_empty() {
                        None
                    } else {
                        Some((other.annotator().to_string(), counts))
                    }
                })
                .collect();
            ComparingSet {
                annotator: t.annotator().to_string(),
                matches,
                records_count: t.records_count(),
                codes_count: t.codes_count(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_tables, AnnotationRecord};

    fn record(annr: &str, rec: &str, cs: &[i64]) -> AnnotationRecord {
        AnnotationRecord {
            database: "db".to_string(),
            record_id: rec.to_string(),
            annotator: annr.to_string(),
            thesaurus_version: None,
            codes: cs.iter().map(|c| Code::Int(*c)).collect(),
        }
    }

    #[test]
    fn agreement_without_thesaurus() {
        let tables = build_tables(&[
            record("zed", "1", &[3, 1]),
            record("amy", "1", &[1]),
            record("amy", "2", &[]),
        ]);
        let res = annotators_by_code(&tables, None);
        assert_eq!(
            res,
            vec![
                RecordAgreement {
                    database: "db".to_string(),
                    record_id: "1".to_string(),
                    codes: vec![
                        (Code::Int(1), vec!["amy".to_string(), "zed".to_string()]),
                        (Code::Int(3), vec!["zed".to_string()]),
                    ],
                },
                RecordAgreement {
                    database: "db".to_string(),
                    record_id: "2".to_string(),
                    codes: vec![],
                },
            ]
        );
    }

    #[test]
    fn agreement_follows_thesaurus() {
        let tables = build_tables(&[record("a", "1", &[1, 2, 7]), record("b", "1", &[2])]);
        let thesaurus = Thesaurus {
            label: "t".to_string(),
            language: None,
            items: vec![
                (Code::Int(2), "two".to_string()),
                (Code::Int(1), "one".to_string()),
            ],
        };
        let res = annotators_by_code(&tables, Some(&thesaurus));
        assert_eq!(res.len(), 1);
        let codes: Vec<&Code> = res[0].codes.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec![&Code::Int(2), &Code::Int(1)]);
        assert_eq!(res[0].codes[0].1, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn per_code_matches() {
        let tables = build_tables(&[
            record("a", "1", &[1, 2]),
            record("a", "2", &[1]),
            record("b", "1", &[1]),
            record("b", "2", &[1, 5]),
            record("c", "9", &[1]),
        ]);
        let counts = match_counts_by_code(&tables[0], &tables[1]);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(Code::Int(1), 2)]);

        let sets = comparing_sets(&tables);
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].annotator, "a");
        assert_eq!(sets[0].records_count, 2);
        assert_eq!(sets[0].codes_count, 3);
        let others: Vec<&str> = sets[0].matches.iter().map(|(o, _)| o.as_str()).collect();
        assert_eq!(others, vec!["b"]);
        assert!(sets[2].matches.is_empty());
    }
}
