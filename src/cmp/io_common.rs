use crate::cmp::*;

use std::path::Path;

/// The output path that sends a report to the standard output.
pub const STDOUT: &str = "stdout";

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Writes a report to a file, or to the standard output if no path is given.
pub fn write_output(path: Option<&str>, contents: &str) -> CmpResult<()> {
    match path {
        None | Some("") | Some(STDOUT) => {
            println!("{}", contents);
        }
        Some(p) => {
            info!("Writing output to {}", p);
            fs::write(p, contents).context(WritingOutputSnafu { path: p })?;
        }
    }
    Ok(())
}
