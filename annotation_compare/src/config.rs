// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A code (conclusion) from the controlled vocabulary.
///
/// Exported records use either integers or strings for their codes. Integer
/// codes sort numerically and before all textual codes.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum Code {
    Int(i64),
    Text(String),
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Code::Int(i) => write!(f, "{}", i),
            Code::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Code {
    fn from(i: i64) -> Self {
        Code::Int(i)
    }
}

impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Code::Text(s.to_string())
    }
}

impl From<String> for Code {
    fn from(s: String) -> Self {
        Code::Text(s)
    }
}

/// The assessment of one record by one annotator.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnnotationRecord {
    pub database: String,
    pub record_id: String,
    pub annotator: String,
    /// The thesaurus version the annotator worked with. It is expected to be
    /// the same for the whole batch.
    pub thesaurus_version: Option<String>,
    pub codes: Vec<Code>,
}

/// The ordered vocabulary of all the valid codes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Thesaurus {
    pub label: String,
    pub language: Option<String>,
    /// The codes and their human-readable names, in display order.
    pub items: Vec<(Code, String)>,
}

impl Thesaurus {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The display position of a code, if it belongs to this thesaurus.
    pub fn position(&self, code: &Code) -> Option<usize> {
        self.items.iter().position(|(c, _)| c == code)
    }

    pub fn contains(&self, code: &Code) -> bool {
        self.position(code).is_some()
    }
}

// ******** Output data structures *********

/// The alignment of one code between a reference and a compared set of codes.
///
/// A pair never holds two different codes: a code is either present on both
/// sides or on one side only.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum CodePair {
    Match(Code),
    ReferenceOnly(Code),
    OtherOnly(Code),
}

impl CodePair {
    pub fn reference(&self) -> Option<&Code> {
        match self {
            CodePair::Match(c) | CodePair::ReferenceOnly(c) => Some(c),
            CodePair::OtherOnly(_) => None,
        }
    }

    pub fn other(&self) -> Option<&Code> {
        match self {
            CodePair::Match(c) | CodePair::OtherOnly(c) => Some(c),
            CodePair::ReferenceOnly(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, CodePair::Match(_))
    }
}

/// The comparison of one record annotated by two annotators.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RecordComparison {
    pub database: String,
    pub record_id: String,
    pub pairs: Vec<CodePair>,
    pub matches: usize,
    pub reference_codes: usize,
    pub other_codes: usize,
}

/// The comparison of two annotators over all their shared records.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableComparison {
    pub reference: String,
    pub other: String,
    pub counts: ConfusionCounts,
    /// Only the shared records, by database and record id.
    pub records: Vec<RecordComparison>,
}

impl TableComparison {
    /// False when no code was found on either side of the shared records.
    pub fn is_comparable(&self) -> bool {
        self.counts.total() > 0
    }

    pub fn reference_codes(&self) -> u64 {
        self.counts.true_positives + self.counts.false_negatives
    }

    pub fn other_codes(&self) -> u64 {
        self.counts.true_positives + self.counts.false_positives
    }

    pub fn misses(&self) -> u64 {
        self.counts.false_positives + self.counts.false_negatives
    }
}

/// Counts of agreement between a reference annotator and a compared one.
///
/// The true negatives are not part of it: they only exist relative to a
/// universe of codes, see [ConfusionCounts::true_negatives].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ConfusionCounts {
    /// Codes assigned by both annotators.
    pub true_positives: u64,
    /// Codes assigned only by the compared annotator.
    pub false_positives: u64,
    /// Codes assigned only by the reference annotator.
    pub false_negatives: u64,
}

impl ConfusionCounts {
    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.false_negatives
    }

    /// The number of codes that neither annotator assigned, or None if the
    /// universe is too small to hold all the observed codes.
    pub fn true_negatives(&self, universe: u64) -> Option<u64> {
        universe.checked_sub(self.total())
    }
}

/// Agreement statistics. A statistic is None when its denominator is zero.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct MatchStats {
    /// Sensitivity
    pub se: Option<f64>,
    /// Specificity
    pub sp: Option<f64>,
    /// Positive predictive value
    pub ppv: Option<f64>,
    /// Negative predictive value
    pub npv: Option<f64>,
    /// Accuracy
    pub acc: Option<f64>,
}

/// Everything known about one ordered pair of annotators.
#[derive(PartialEq, Debug, Clone)]
pub struct PairStats {
    pub counts: ConfusionCounts,
    pub true_negatives: u64,
    pub stats: MatchStats,
    /// The number of records annotated by both.
    pub records: usize,
}

/// One cell of the comparison matrix.
#[derive(PartialEq, Debug, Clone)]
pub enum MatrixCell {
    /// The diagonal: an annotator is not compared with itself.
    NotApplicable,
    /// The two annotators share no record, or only records without codes.
    NoComparableData,
    /// The comparison could not be completed.
    Failed(CompareErrors),
    Stats(PairStats),
}

/// An annotator left out of the matrix, with its number of records.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExcludedAnnotator {
    pub annotator: String,
    pub records: usize,
}

/// The N×N comparison between annotators.
///
/// Rows are the reference annotators and columns the compared ones.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonMatrix {
    pub annotators: Vec<String>,
    pub cells: Vec<Vec<MatrixCell>>,
    pub excluded: Vec<ExcludedAnnotator>,
    pub universe_size: u64,
}

impl ComparisonMatrix {
    pub fn get(&self, reference: &str, other: &str) -> Option<&MatrixCell> {
        let i = self.annotators.iter().position(|a| a == reference)?;
        let j = self.annotators.iter().position(|a| a == other)?;
        self.cells.get(i).and_then(|row| row.get(j))
    }
}

/// The outcome of a full run over a batch of records.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonResult {
    /// The thesaurus version used by the majority of the records.
    pub thesaurus_version: Option<String>,
    /// The records left out because of their thesaurus version.
    pub removed: Vec<AnnotationRecord>,
    pub tables: Vec<crate::RecordTable>,
    pub matrix: ComparisonMatrix,
}

/// Errors that prevent a comparison from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CompareErrors {
    InsufficientAnnotators {
        found: usize,
        required: usize,
    },
    InvalidRules(String),
    /// A universe of codes was provided but it is empty.
    InvalidUniverseSize,
    /// The universe holds fewer codes than the ones counted for this pair.
    NegativeTrueNegatives {
        reference: String,
        other: String,
        universe: u64,
        observed: u64,
    },
}

impl Error for CompareErrors {}

impl Display for CompareErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareErrors::InsufficientAnnotators { found, required } => write!(
                f,
                "cannot compare less than {} annotators, found {}",
                required, found
            ),
            CompareErrors::InvalidRules(msg) => write!(f, "invalid rules: {}", msg),
            CompareErrors::InvalidUniverseSize => write!(f, "the universe of codes is empty"),
            CompareErrors::NegativeTrueNegatives {
                reference,
                other,
                universe,
                observed,
            } => write!(
                f,
                "comparing {} with {}: universe size {} is smaller than the {} counted codes",
                reference, other, universe, observed
            ),
        }
    }
}

// ********* Configuration **********

/// Where the number of possible codes comes from.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UniverseSource {
    /// The size of the thesaurus.
    Thesaurus(u64),
    /// The number of distinct codes assigned by all the annotators.
    ObservedCodes,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CompareRules {
    /// Above this number, only the annotators with the most records are kept.
    pub max_annotators: usize,
    pub min_annotators: usize,
}

impl CompareRules {
    pub const DEFAULT_RULES: CompareRules = CompareRules {
        max_annotators: 5,
        min_annotators: 2,
    };

    pub(crate) fn validate(&self) -> Result<(), CompareErrors> {
        if self.min_annotators < 2 {
            return Err(CompareErrors::InvalidRules(format!(
                "min_annotators must be at least 2, got {}",
                self.min_annotators
            )));
        }
        if self.max_annotators < self.min_annotators {
            return Err(CompareErrors::InvalidRules(format!(
                "max_annotators ({}) is lower than min_annotators ({})",
                self.max_annotators, self.min_annotators
            )));
        }
        Ok(())
    }
}
