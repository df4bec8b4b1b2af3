pub use crate::config::*;

/// A builder for adding annotation records.
///
/// It is the simplest way to run a comparison from code.
///
/// ```
/// pub use annotation_compare::builder::Builder;
/// pub use annotation_compare::{CompareRules, MatrixCell};
/// # use annotation_compare::CompareErrors;
///
/// let mut builder = Builder::new(&CompareRules::DEFAULT_RULES)?
///     .thesaurus_codes("v1", &["A", "B", "C", "D", "E"])?;
///
/// builder.add_record_simple("db", "1", "alice", &["A", "B"])?;
/// builder.add_record_simple("db", "1", "bob", &["B"])?;
///
/// let result = builder.run()?;
/// assert!(matches!(result.matrix.get("alice", "bob"), Some(MatrixCell::Stats(_))));
///
/// # Ok::<(), CompareErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: CompareRules,
    pub(crate) _thesaurus: Option<Thesaurus>,
    pub(crate) _records: Vec<AnnotationRecord>,
}

impl Builder {
    pub fn new(rules: &CompareRules) -> Result<Builder, CompareErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _thesaurus: None,
            _records: Vec::new(),
        })
    }

    pub fn thesaurus(self, thesaurus: Thesaurus) -> Result<Builder, CompareErrors> {
        if thesaurus.is_empty() {
            return Err(CompareErrors::InvalidUniverseSize);
        }
        Ok(Builder {
            _rules: self._rules,
            _thesaurus: Some(thesaurus),
            _records: self._records,
        })
    }

    /// Sets a thesaurus whose labels are the codes themselves.
    pub fn thesaurus_codes(self, label: &str, codes: &[&str]) -> Result<Builder, CompareErrors> {
        self.thesaurus(Thesaurus {
            label: label.to_string(),
            language: None,
            items: codes
                .iter()
                .map(|c| (Code::from(*c), c.to_string()))
                .collect(),
        })
    }

    /// Adds the codes of one annotator for one record.
    ///
    /// The record is marked with the label of the thesaurus, if one was set.
    pub fn add_record_simple(
        &mut self,
        database: &str,
        record_id: &str,
        annotator: &str,
        codes: &[&str],
    ) -> Result<(), CompareErrors> {
        let thesaurus_version = self._thesaurus.as_ref().map(|t| t.label.clone());
        self.add_record(&AnnotationRecord {
            database: database.to_string(),
            record_id: record_id.to_string(),
            annotator: annotator.to_string(),
            thesaurus_version,
            codes: codes.iter().map(|c| Code::from(*c)).collect(),
        })
    }

    pub fn add_record(&mut self, record: &AnnotationRecord) -> Result<(), CompareErrors> {
        self._records.push(record.clone());
        Ok(())
    }

    pub fn run(self) -> Result<ComparisonResult, CompareErrors> {
        crate::run_comparison(self._records, &self._rules, self._thesaurus.as_ref())
    }
}
