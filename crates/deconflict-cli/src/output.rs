//! Where `analyze` writes each report.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Report destination for every input, in input order. `None` means stdout.
///
/// Several inputs require `out_dir`, and two inputs may not map to the same
/// report file (`a/day.json` and `b/day.json` both give `day.report.json`).
pub fn plan_reports(
    inputs: &[PathBuf],
    output: Option<&Path>,
    out_dir: Option<&Path>,
) -> Result<Vec<Option<PathBuf>>> {
    if inputs.len() > 1 && out_dir.is_none() {
        bail!(
            "{} inputs given; use --out-dir to write one report per input",
            inputs.len()
        );
    }

    let paths: Vec<_> = inputs
        .iter()
        .map(|input| report_path(input, output, out_dir))
        .collect();

    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for (input, path) in inputs.iter().zip(&paths) {
        let Some(path) = path else { continue };
        if let Some(first) = seen.insert(path.as_path(), input.as_path()) {
            bail!(
                "{} and {} would both write {}",
                first.display(),
                input.display(),
                path.display()
            );
        }
    }
    Ok(paths)
}

/// `output` if given, else `<out_dir>/<input stem>.report.json`.
fn report_path(input: &Path, output: Option<&Path>, out_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(output) = output {
        return Some(output.to_path_buf());
    }
    let dir = out_dir?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    Some(dir.join(format!("{stem}.report.json")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_one_report_per_input() {
        let inputs = paths(&["in/mon.json", "in/tue.json"]);
        let planned = plan_reports(&inputs, None, Some(Path::new("out"))).unwrap();
        assert_eq!(
            planned,
            vec![
                Some(PathBuf::from("out/mon.report.json")),
                Some(PathBuf::from("out/tue.report.json")),
            ]
        );
    }

    #[test]
    fn test_single_input_defaults_to_stdout() {
        let planned = plan_reports(&paths(&["day.json"]), None, None).unwrap();
        assert_eq!(planned, vec![None]);

        let planned =
            plan_reports(&paths(&["day.json"]), Some(Path::new("r.json")), None).unwrap();
        assert_eq!(planned, vec![Some(PathBuf::from("r.json"))]);
    }

    #[test]
    fn test_multiple_inputs_need_out_dir() {
        let err = plan_reports(&paths(&["a.json", "b.json"]), None, None).unwrap_err();
        assert!(err.to_string().contains("--out-dir"));
    }

    #[test]
    fn test_same_stem_collision_rejected() {
        let inputs = paths(&["east/day.json", "west/day.json"]);
        let err = plan_reports(&inputs, None, Some(Path::new("out"))).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("east/day.json"));
        assert!(msg.contains("west/day.json"));
        assert!(msg.contains("day.report.json"));

        // Same stem, different extension, still one file
        let inputs = paths(&["day.json", "day.txt"]);
        assert!(plan_reports(&inputs, None, Some(Path::new("out"))).is_err());
    }
}
