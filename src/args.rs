use clap::Parser;

/// This is a program to compare the conclusions of several annotators.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (folder or file paths, default 'data') The annotation records, one JSON file per record. All the
    /// JSON files of a folder are read.
    #[clap(value_parser)]
    pub inputs: Vec<String>,

    /// (file path, optional) A configuration file in JSON format. The options passed on the command line
    /// take precedence over the ones of the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The thesaurus of all the valid codes. If not provided, the number of
    /// possible codes is inferred from the records.
    #[clap(short, long, value_parser)]
    pub thesaurus: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the statistics will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the annotators of each code of each record will be written in JSON
    /// format to the given location.
    #[clap(long, value_parser)]
    pub agreement_out: Option<String>,

    /// (file path or empty) If specified, the number of matches per code between annotators will be written
    /// in JSON format to the given location.
    #[clap(long, value_parser)]
    pub match_counts_out: Option<String>,

    /// (file path) A reference file containing the expected statistics in JSON format. If provided, anncmp will
    /// check that the computed statistics match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default 5) The maximum number of annotators to compare. The annotators with the fewest records
    /// are left out.
    #[clap(long, value_parser)]
    pub max_annotators: Option<usize>,

    /// (default 2) The minimum number of annotators to compare.
    #[clap(long, value_parser)]
    pub min_annotators: Option<usize>,

    /// (annotator name, optional) The reference annotator for a detailed comparison of two annotators.
    /// Requires --test-annotator.
    #[clap(long, value_parser)]
    pub ref_annotator: Option<String>,

    /// (annotator name, optional) The tested annotator for a detailed comparison of two annotators.
    /// Requires --ref-annotator.
    #[clap(long, value_parser)]
    pub test_annotator: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the detailed comparison of two annotators.
    #[clap(long, value_parser)]
    pub pair_out: Option<String>,

    // Other arguments
    /// If passed as an argument, will print counts of records and codes before comparing.
    #[clap(long, takes_value = false)]
    pub summary: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
