use crate::cmp::io_common::{is_json_file, simplify_file_name};
use crate::cmp::*;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Lists the JSON files of a folder, sorted by name.
fn list_json_files(path: &Path) -> CmpResult<Vec<PathBuf>> {
    let entries = fs::read_dir(path).context(ReadingFolderSnafu {
        path: path.display().to_string(),
    })?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let p = entry
            .context(ReadingFolderSnafu {
                path: path.display().to_string(),
            })?
            .path();
        if p.is_file() && is_json_file(&p) {
            files.push(p);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one record file.
///
/// Returns None for the files that are not records: invalid JSON or UTF-8,
/// missing fields or saved comparison results.
fn read_record_file(path: &Path) -> CmpResult<Option<AnnotationRecord>> {
    let contents = match fs::read_to_string(path) {
        Ok(x) => x,
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!(
                "read_record_file: skipping {}: not UTF-8: {}",
                simplify_file_name(path),
                e
            );
            return Ok(None);
        }
        Err(e) => {
            return Err(e).context(OpeningJsonSnafu {
                path: path.display().to_string(),
            })
        }
    };
    let js: JSValue = match serde_json::from_str(contents.as_str()) {
        Ok(x) => x,
        Err(e) => {
            warn!(
                "read_record_file: skipping {}: invalid JSON: {}",
                simplify_file_name(path),
                e
            );
            return Ok(None);
        }
    };
    if is_comparison_result(&js) {
        debug!(
            "read_record_file: skipping {}: comparison result",
            simplify_file_name(path)
        );
        return Ok(None);
    }
    let jr: JsonRecord = match serde_json::from_value(js) {
        Ok(x) => x,
        Err(e) => {
            warn!(
                "read_record_file: skipping {}: not an annotation record: {}",
                simplify_file_name(path),
                e
            );
            return Ok(None);
        }
    };
    match jr.to_record() {
        Ok(r) => Ok(Some(r)),
        Err(e) => {
            warn!(
                "read_record_file: skipping {}: {}",
                simplify_file_name(path),
                e
            );
            Ok(None)
        }
    }
}

/// Reads all the records of the given folders and files, in order.
pub fn read_input_paths(paths: &[String]) -> CmpResult<Vec<AnnotationRecord>> {
    let mut res: Vec<AnnotationRecord> = Vec::new();
    for p in paths.iter() {
        let path = Path::new(p);
        if !path.exists() {
            warn!("read_input_paths: {} not found, skipping", p);
            continue;
        }
        let files = if path.is_dir() {
            list_json_files(path)?
        } else {
            vec![path.to_path_buf()]
        };
        info!("Reading {} files from {}", files.len(), p);
        for f in files.iter() {
            if let Some(r) = read_record_file(f)? {
                debug!("read_input_paths: {}: {:?}", simplify_file_name(f), r);
                res.push(r);
            }
        }
    }
    info!("Read {} records", res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A fresh folder holding the records of the three annotators fixture.
    fn copy_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("anncmp_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let src = format!("{}/tests/three_annotators/data", env!("CARGO_MANIFEST_DIR"));
        for f in list_json_files(Path::new(&src)).unwrap() {
            fs::copy(&f, dir.join(f.file_name().unwrap())).unwrap();
        }
        dir
    }

    #[test]
    fn skips_files_that_are_not_utf8() {
        let dir = copy_fixture("latin1");
        fs::write(dir.join("zz_latin1.json"), b"{\"database\": \"caf\xe9\"}").unwrap();
        let records = read_input_paths(&[dir.display().to_string()]).unwrap();
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.database == "mitdb"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn skips_saved_comparison_results() {
        let dir = copy_fixture("cmpresult");
        let result = serde_json::json!({
            "type": "cmpresult",
            "conclusionThesaurus": "ecg-1",
            "annotators": {"ref": "alice", "test": "bob"},
            "records": []
        });
        fs::write(dir.join("zz_result.json"), result.to_string()).unwrap();
        let path = dir.join("zz_result.json");
        assert_eq!(read_record_file(&path).unwrap(), None);
        let records = read_input_paths(&[dir.display().to_string()]).unwrap();
        assert_eq!(records.len(), 7);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn comparison_result_type() {
        assert!(is_comparison_result(&serde_json::json!({"type": "cmpresult"})));
        assert!(!is_comparison_result(&serde_json::json!({"type": "record"})));
        assert!(!is_comparison_result(&serde_json::json!([1, 2])));
    }
}
