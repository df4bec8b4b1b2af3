mod agreement;
pub mod builder;
mod config;
pub mod manual;
mod summary;

use log::{debug, info, warn};

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::Hash,
};

pub use crate::agreement::*;
pub use crate::config::*;
pub use crate::summary::*;

// **** Record tables ****

/// All the records of one annotator, indexed by database and record id.
///
/// Within a table, a (database, record id) key is unique: when the same key
/// is added twice, the last codes win.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RecordTable {
    annotator: String,
    databases: BTreeMap<String, BTreeMap<String, BTreeSet<Code>>>,
}

impl RecordTable {
    /// Builds the table of an annotator from its records.
    ///
    /// The `annotator` field of the records is not checked, see [build_tables]
    /// to split a mixed collection.
    pub fn from_records<'a, I>(annotator: &str, records: I) -> RecordTable
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        let mut table = RecordTable {
            annotator: annotator.to_string(),
            databases: BTreeMap::new(),
        };
        for r in records {
            table.insert(&r.database, &r.record_id, &r.codes);
        }
        table
    }

    fn insert(&mut self, database: &str, record_id: &str, codes: &[Code]) {
        let previous = self
            .databases
            .entry(database.to_string())
            .or_insert_with(BTreeMap::new)
            .insert(record_id.to_string(), codes.iter().cloned().collect());
        if previous.is_some() {
            debug!(
                "RecordTable::insert: annotator {}: overwriting {}-{}",
                self.annotator, database, record_id
            );
        }
    }

    pub fn annotator(&self) -> &str {
        &self.annotator
    }

    pub fn get(&self, database: &str, record_id: &str) -> Option<&BTreeSet<Code>> {
        self.databases.get(database)?.get(record_id)
    }

    /// All the records, ordered by database and then by record id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &BTreeSet<Code>)> {
        self.databases.iter().flat_map(|(db, recs)| {
            recs.iter()
                .map(move |(rec, codes)| (db.as_str(), rec.as_str(), codes))
        })
    }

    pub fn records_count(&self) -> usize {
        self.databases.values().map(|recs| recs.len()).sum()
    }

    /// The number of codes assigned, over all the records.
    pub fn codes_count(&self) -> usize {
        self.iter().map(|(_, _, codes)| codes.len()).sum()
    }
}

/// Groups a collection of records by annotator.
///
/// The tables are returned in the order in which the annotators first appear.
pub fn build_tables(records: &[AnnotationRecord]) -> Vec<RecordTable> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&AnnotationRecord>> = HashMap::new();
    for r in records.iter() {
        let group = groups.entry(r.annotator.as_str()).or_insert_with(|| {
            order.push(r.annotator.as_str());
            Vec::new()
        });
        group.push(r);
    }
    order
        .iter()
        .map(|annr| RecordTable::from_records(annr, groups[annr].iter().copied()))
        .collect()
}

// **** Majority filter ****

/// The outcome of a majority vote on a field of the items.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MajorityPartition<T, K> {
    /// The most frequent value, or None if no item carries the field.
    pub majority: Option<K>,
    pub accepted: Vec<T>,
    pub rejected: Vec<T>,
}

/// Keeps the items whose key is the most frequent one.
///
/// Ties are won by the value encountered first. Items without a key are
/// rejected, unless no item at all has one, in which case everything is
/// accepted.
pub fn partition_by_majority<T, K, F>(items: Vec<T>, key: F) -> MajorityPartition<T, K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> Option<K>,
{
    // Counts in the order of first appearance.
    let mut counts: Vec<(K, usize)> = Vec::new();
    let mut positions: HashMap<K, usize> = HashMap::new();
    for item in items.iter() {
        if let Some(k) = key(item) {
            if let Some(&pos) = positions.get(&k) {
                counts[pos].1 += 1;
            } else {
                positions.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }

    let mut majority: Option<&(K, usize)> = None;
    for c in counts.iter() {
        let better = match majority {
            Some(best) => c.1 > best.1,
            None => true,
        };
        if better {
            majority = Some(c);
        }
    }
    let majority: Option<K> = majority.map(|(k, _)| k.clone());

    let (accepted, rejected) = match &majority {
        None => (items, Vec::new()),
        Some(m) => items
            .into_iter()
            .partition(|item| key(item).as_ref() == Some(m)),
    };
    MajorityPartition {
        majority,
        accepted,
        rejected,
    }
}

/// Removes the records that do not use the thesaurus version of the majority.
///
/// Every removed record is reported in the logs.
pub fn remove_deviations(
    records: Vec<AnnotationRecord>,
) -> MajorityPartition<AnnotationRecord, String> {
    let res = partition_by_majority(records, |r| r.thesaurus_version.clone());
    for r in res.rejected.iter() {
        warn!(
            "Removed {}-{} with thesaurus = {:?} (expected {:?})",
            r.database, r.record_id, r.thesaurus_version, res.majority
        );
    }
    res
}

// **** Merging codes ****

/// Aligns the codes of two annotators for the same record.
///
/// The reference codes come first in ascending order, each one matched or not,
/// followed by the codes only present in `other`, also ascending. Every code of
/// either set appears in exactly one pair.
pub fn merge_codes(reference: &BTreeSet<Code>, other: &BTreeSet<Code>) -> Vec<CodePair> {
    let mut pairs: Vec<CodePair> = reference
        .iter()
        .map(|code| {
            if other.contains(code) {
                CodePair::Match(code.clone())
            } else {
                CodePair::ReferenceOnly(code.clone())
            }
        })
        .collect();
    pairs.extend(
        other
            .difference(reference)
            .map(|code| CodePair::OtherOnly(code.clone())),
    );
    pairs
}

// **** Confusion counts ****

/// Compares two annotators over the records they both annotated.
///
/// Records present in only one of the tables are ignored.
pub fn compare_tables(reference: &RecordTable, other: &RecordTable) -> TableComparison {
    let mut counts = ConfusionCounts::default();
    let mut records: Vec<RecordComparison> = Vec::new();
    for (db, rec, ref_codes) in reference.iter() {
        let other_codes = match other.get(db, rec) {
            Some(codes) => codes,
            None => continue,
        };
        let pairs = merge_codes(ref_codes, other_codes);
        let mut rc = RecordComparison {
            database: db.to_string(),
            record_id: rec.to_string(),
            pairs: Vec::new(),
            matches: 0,
            reference_codes: 0,
            other_codes: 0,
        };
        for p in pairs.iter() {
            match p {
                CodePair::Match(_) => {
                    rc.matches += 1;
                    rc.reference_codes += 1;
                    rc.other_codes += 1;
                    counts.true_positives += 1;
                }
                CodePair::ReferenceOnly(_) => {
                    rc.reference_codes += 1;
                    counts.false_negatives += 1;
                }
                CodePair::OtherOnly(_) => {
                    rc.other_codes += 1;
                    counts.false_positives += 1;
                }
            }
        }
        rc.pairs = pairs;
        records.push(rc);
    }
    debug!(
        "compare_tables: {} vs {}: {} shared records, counts: {:?}",
        reference.annotator(),
        other.annotator(),
        records.len(),
        counts
    );
    TableComparison {
        reference: reference.annotator().to_string(),
        other: other.annotator().to_string(),
        counts,
        records,
    }
}

// **** Statistics ****

fn ratio(num: u64, den: u64) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

impl MatchStats {
    pub fn from_counts(counts: &ConfusionCounts, true_negatives: u64, universe: u64) -> MatchStats {
        let tp = counts.true_positives;
        let fp = counts.false_positives;
        let fn_ = counts.false_negatives;
        let tn = true_negatives;
        MatchStats {
            se: ratio(tp, tp + fn_),
            sp: ratio(tn, fp + tn),
            ppv: ratio(tp, tp + fp),
            npv: ratio(tn, tn + fn_),
            acc: ratio(tp + tn, universe),
        }
    }
}

/// Runs the full comparison of two annotators against a universe of codes.
///
/// Returns None when there is nothing to compare: no shared record, or shared
/// records without any code on either side.
pub fn compare_pair(
    reference: &RecordTable,
    other: &RecordTable,
    universe: u64,
) -> Result<Option<PairStats>, CompareErrors> {
    let cmp = compare_tables(reference, other);
    if !cmp.is_comparable() {
        return Ok(None);
    }
    let true_negatives =
        cmp.counts
            .true_negatives(universe)
            .ok_or_else(|| CompareErrors::NegativeTrueNegatives {
                reference: cmp.reference.clone(),
                other: cmp.other.clone(),
                universe,
                observed: cmp.counts.total(),
            })?;
    Ok(Some(PairStats {
        counts: cmp.counts,
        true_negatives,
        stats: MatchStats::from_counts(&cmp.counts, true_negatives, universe),
        records: cmp.records.len(),
    }))
}

// **** Pairwise matrix ****

/// The number of distinct codes assigned across all the tables.
pub fn count_distinct_codes(tables: &[RecordTable]) -> u64 {
    let codes: HashSet<&Code> = tables
        .iter()
        .flat_map(|t| t.iter().flat_map(|(_, _, codes)| codes.iter()))
        .collect();
    codes.len() as u64
}

pub fn resolve_universe(source: UniverseSource, tables: &[RecordTable]) -> Result<u64, CompareErrors> {
    match source {
        UniverseSource::Thesaurus(0) => Err(CompareErrors::InvalidUniverseSize),
        UniverseSource::Thesaurus(n) => Ok(n),
        UniverseSource::ObservedCodes => Ok(count_distinct_codes(tables)),
    }
}

// Keeps the annotators with the most records, in input order.
fn select_annotators(
    tables: &[RecordTable],
    max_annotators: usize,
) -> (Vec<&RecordTable>, Vec<ExcludedAnnotator>) {
    if tables.len() <= max_annotators {
        return (tables.iter().collect(), Vec::new());
    }
    // Stable sort: ties keep the input order.
    let mut ranking: Vec<usize> = (0..tables.len()).collect();
    ranking.sort_by_key(|&idx| std::cmp::Reverse(tables[idx].records_count()));
    let kept: HashSet<usize> = ranking[..max_annotators].iter().cloned().collect();
    let excluded = ranking[max_annotators..]
        .iter()
        .map(|&idx| ExcludedAnnotator {
            annotator: tables[idx].annotator().to_string(),
            records: tables[idx].records_count(),
        })
        .collect();
    let selected = tables
        .iter()
        .enumerate()
        .filter_map(|(idx, t)| if kept.contains(&idx) { Some(t) } else { None })
        .collect();
    (selected, excluded)
}

/// Compares every ordered pair of distinct annotators.
///
/// When there are more annotators than `rules.max_annotators`, the ones with
/// the fewest records are excluded and reported.
pub fn build_matrix(
    tables: &[RecordTable],
    universe: UniverseSource,
    rules: &CompareRules,
) -> Result<ComparisonMatrix, CompareErrors> {
    rules.validate()?;
    if tables.len() < rules.min_annotators {
        return Err(CompareErrors::InsufficientAnnotators {
            found: tables.len(),
            required: rules.min_annotators,
        });
    }
    let universe_size = resolve_universe(universe, tables)?;
    info!(
        "Comparing {} annotators, universe size: {} ({:?})",
        tables.len(),
        universe_size,
        universe
    );

    let (selected, excluded) = select_annotators(tables, rules.max_annotators);
    for e in excluded.iter() {
        warn!(
            "Cannot compare more than {} annotators, ignoring {} ({} records)",
            rules.max_annotators, e.annotator, e.records
        );
    }

    let mut cells: Vec<Vec<MatrixCell>> = Vec::new();
    for (i, reference) in selected.iter().enumerate() {
        let mut row: Vec<MatrixCell> = Vec::new();
        for (j, other) in selected.iter().enumerate() {
            if i == j {
                row.push(MatrixCell::NotApplicable);
                continue;
            }
            let cell = match compare_pair(reference, other, universe_size) {
                Ok(Some(stats)) => MatrixCell::Stats(stats),
                Ok(None) => {
                    info!(
                        "Cannot compare {} with {}: no common records",
                        reference.annotator(),
                        other.annotator()
                    );
                    MatrixCell::NoComparableData
                }
                Err(e) => {
                    warn!("{}", e);
                    MatrixCell::Failed(e)
                }
            };
            row.push(cell);
        }
        cells.push(row);
    }

    Ok(ComparisonMatrix {
        annotators: selected.iter().map(|t| t.annotator().to_string()).collect(),
        cells,
        excluded,
        universe_size,
    })
}

/// Filters, groups and compares a batch of records.
///
/// Arguments:
/// * `records` all the records, from all the annotators
/// * `rules` the limits on the number of annotators
/// * `thesaurus` the vocabulary of codes. If not provided, the universe of
/// codes is inferred from the records.
pub fn run_comparison(
    records: Vec<AnnotationRecord>,
    rules: &CompareRules,
    thesaurus: Option<&Thesaurus>,
) -> Result<ComparisonResult, CompareErrors> {
    info!(
        "Processing {:?} records, thesaurus: {:?}, rules: {:?}",
        records.len(),
        thesaurus.map(|t| t.label.as_str()),
        rules
    );
    let partition = remove_deviations(records);
    let tables = build_tables(&partition.accepted);
    for t in tables.iter() {
        info!(
            "Annotator: {}: {} records, {} codes",
            t.annotator(),
            t.records_count(),
            t.codes_count()
        );
    }
    let universe = match thesaurus {
        Some(t) => UniverseSource::Thesaurus(t.len() as u64),
        None => UniverseSource::ObservedCodes,
    };
    let matrix = build_matrix(&tables, universe, rules)?;
    Ok(ComparisonResult {
        thesaurus_version: partition.majority,
        removed: partition.rejected,
        tables,
        matrix,
    })
}
