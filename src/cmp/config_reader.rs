use crate::args::Args;
use crate::cmp::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::path::Path;

/// The configuration file.
///
/// All the paths are relative to the folder of the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct CmpConfig {
    #[serde(rename = "inputPaths", default)]
    pub input_paths: Vec<String>,
    #[serde(rename = "thesaurusPath")]
    pub thesaurus_path: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "agreementOutputPath")]
    pub agreement_output_path: Option<String>,
    #[serde(rename = "matchCountsOutputPath")]
    pub match_counts_output_path: Option<String>,
    #[serde(rename = "maxAnnotators")]
    pub max_annotators: Option<usize>,
    #[serde(rename = "minAnnotators")]
    pub min_annotators: Option<usize>,
}

/// One annotation record, as stored in the input folders.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsonRecord {
    pub database: String,
    #[serde(rename = "record")]
    _record: JSValue,
    pub annotator: String,
    #[serde(rename = "conclusionThesaurus")]
    pub conclusion_thesaurus: Option<String>,
    pub conclusions: Vec<JSValue>,
}

impl JsonRecord {
    /// Record ids may be written as numbers.
    pub fn record_id(&self) -> CmpResult<String> {
        match &self._record {
            JSValue::String(s) => Ok(s.clone()),
            JSValue::Number(n) => Ok(n.to_string()),
            x => whatever!("Invalid record id: {:?}", x),
        }
    }

    pub fn codes(&self) -> CmpResult<Vec<Code>> {
        self.conclusions.iter().map(read_js_code).collect()
    }

    pub fn to_record(&self) -> CmpResult<AnnotationRecord> {
        Ok(AnnotationRecord {
            database: self.database.clone(),
            record_id: self.record_id()?,
            annotator: self.annotator.clone(),
            thesaurus_version: self.conclusion_thesaurus.clone(),
            codes: self.codes()?,
        })
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ThesaurusReport {
    pub id: JSValue,
    pub name: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ThesaurusGroup {
    pub name: Option<String>,
    pub reports: Vec<ThesaurusReport>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ThesaurusFile {
    pub thesaurus: String,
    pub language: Option<String>,
    pub groups: Vec<ThesaurusGroup>,
}

/// Saved comparison results share the folders of the records, and do not
/// carry the fields of a record.
pub fn is_comparison_result(js: &JSValue) -> bool {
    js.get("type").and_then(|t| t.as_str()) == Some("cmpresult")
}

/// The settings of a run, once the command line and the configuration file
/// are combined.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub input_paths: Vec<String>,
    pub thesaurus_path: Option<String>,
    pub output_path: Option<String>,
    pub agreement_output_path: Option<String>,
    pub match_counts_output_path: Option<String>,
    pub reference_path: Option<String>,
    /// The reference and the tested annotator of the detailed comparison.
    pub pair: Option<(String, String)>,
    pub pair_output_path: Option<String>,
    pub rules: CompareRules,
    pub summary: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input_paths: vec!["data".to_string()],
            thesaurus_path: None,
            output_path: None,
            agreement_output_path: None,
            match_counts_output_path: None,
            reference_path: None,
            pair: None,
            pair_output_path: None,
            rules: CompareRules::DEFAULT_RULES,
            summary: false,
        }
    }
}

impl Settings {
    pub fn from_config_file(path: &str) -> CmpResult<Settings> {
        let config = read_config(path)?;
        let mut res = Settings::default();
        if !config.input_paths.is_empty() {
            res.input_paths = config.input_paths;
        }
        res.thesaurus_path = config.thesaurus_path;
        res.output_path = config.output_path;
        res.agreement_output_path = config.agreement_output_path;
        res.match_counts_output_path = config.match_counts_output_path;
        if let Some(x) = config.max_annotators {
            res.rules.max_annotators = x;
        }
        if let Some(x) = config.min_annotators {
            res.rules.min_annotators = x;
        }
        Ok(res)
    }

    /// The command line options take precedence over the configuration file.
    pub fn from_args(args: &Args) -> CmpResult<Settings> {
        let mut res = match args.config.as_deref() {
            Some(p) => Settings::from_config_file(p)?,
            None => Settings::default(),
        };
        if !args.inputs.is_empty() {
            res.input_paths = args.inputs.clone();
        }
        if args.thesaurus.is_some() {
            res.thesaurus_path = args.thesaurus.clone();
        }
        if args.out.is_some() {
            res.output_path = args.out.clone();
        }
        if args.agreement_out.is_some() {
            res.agreement_output_path = args.agreement_out.clone();
        }
        if args.match_counts_out.is_some() {
            res.match_counts_output_path = args.match_counts_out.clone();
        }
        if let Some(x) = args.max_annotators {
            res.rules.max_annotators = x;
        }
        if let Some(x) = args.min_annotators {
            res.rules.min_annotators = x;
        }
        res.pair = match (args.ref_annotator.clone(), args.test_annotator.clone()) {
            (Some(r), Some(t)) => Some((r, t)),
            (None, None) => None,
            (r, t) => {
                return InvalidConfigSnafu {
                    message: format!(
                        "both --ref-annotator and --test-annotator are required, got {:?} and {:?}",
                        r, t
                    ),
                }
                .fail()
            }
        };
        res.pair_output_path = args.pair_out.clone();
        res.reference_path = args.reference.clone();
        res.summary = args.summary;
        Ok(res)
    }
}

pub fn read_config(path: &str) -> CmpResult<CmpConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: CmpConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let root_p = Path::new(path)
        .parent()
        .context(MissingParentDirSnafu { path })?;
    debug!("read_config: {:?}, root: {:?}", config, root_p);
    let resolve = |p: &String| -> String {
        if p == io_common::STDOUT {
            p.clone()
        } else {
            root_p.join(p).display().to_string()
        }
    };
    Ok(CmpConfig {
        input_paths: config.input_paths.iter().map(resolve).collect(),
        thesaurus_path: config.thesaurus_path.as_ref().map(resolve),
        output_path: config.output_path.as_ref().map(resolve),
        agreement_output_path: config.agreement_output_path.as_ref().map(resolve),
        match_counts_output_path: config.match_counts_output_path.as_ref().map(resolve),
        ..config
    })
}

pub fn read_thesaurus(path: &str) -> CmpResult<Thesaurus> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let tf: ThesaurusFile =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let mut items: Vec<(Code, String)> = Vec::new();
    for report in tf.groups.iter().flat_map(|g| g.reports.iter()) {
        let code = read_js_code(&report.id)?;
        if items.iter().any(|(c, _)| *c == code) {
            warn!("read_thesaurus: {}: duplicate code {}", path, code);
            continue;
        }
        items.push((code, report.name.clone()));
    }
    info!(
        "read_thesaurus: {}: thesaurus {} with {} codes",
        path,
        tf.thesaurus,
        items.len()
    );
    Ok(Thesaurus {
        label: tf.thesaurus,
        language: tf.language,
        items,
    })
}

fn read_js_code(x: &JSValue) -> CmpResult<Code> {
    match x {
        JSValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Code::Int(i)),
            None => whatever!("Invalid code {}: not an integer", n),
        },
        JSValue::String(s) => Ok(Code::Text(s.clone())),
        _ => whatever!("Invalid code: {:?}", x),
    }
}
