use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced an export: input files and run parameters.
pub struct Payload {
    pub params: Value,
    pub inputs: Vec<String>,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            inputs: Vec::new(),
        }
    }

    pub fn with_input<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inputs.push(path.as_ref().to_string_lossy().into_owned());
        self
    }
}

/// Provenance block without outputs (used by `report`).
pub fn summary(params: Value) -> Value {
    json!({
        "code_rev": current_git_rev(),
        "engine_version": parcel_engine::VERSION,
        "params": params,
    })
}

/// Write `<export>.provenance.json` with git commit, engine version, callsite, inputs and params.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(export: P, payload: Payload) -> Result<PathBuf> {
    let export = export.as_ref();
    let path = provenance_path(export);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let mut doc = summary(payload.params);
    doc["callsite"] = json!({ "file": callsite.file(), "line": callsite.line() });
    doc["inputs"] = json!(payload.inputs);
    doc["outputs"] = json!([export.to_string_lossy()]);
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn provenance_path(export: &Path) -> PathBuf {
    let mut name = export
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("export"));
    name.push(".provenance.json");
    export.with_file_name(name)
}

pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|s| !s.is_empty()) {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_replaces_extension() {
        let derived = provenance_path(Path::new("/tmp/farm/parcels.geojson"));
        assert_eq!(derived, Path::new("/tmp/farm/parcels.provenance.json"));
    }

    #[test]
    fn sidecar_lists_inputs_and_outputs() {
        let dir = tempdir().unwrap();
        let export = dir.path().join("out.geojson");
        fs::write(&export, "{}").unwrap();
        let payload = Payload::new(json!({"steps": 4})).with_input("script.json");
        let path = write_sidecar(&export, payload).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], export.to_string_lossy().as_ref());
        assert_eq!(parsed["inputs"][0], "script.json");
        assert_eq!(parsed["params"]["steps"], 4);
        assert_eq!(parsed["engine_version"], parcel_engine::VERSION);
    }
}
