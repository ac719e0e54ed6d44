//! Input Resolution
//!
//! Turns the configuration into the list of declared input files for the
//! selected scales. Existence is checked later by the planner so that a missing
//! file is reported as a configuration error with full context.

use crate::config::WavebenchConfig;
use crate::error::ConfigurationError;
use std::path::Path;
use wavebench_core::{Format, InputSpec, Scale, conventional_file_name, scale_directory};

/// Declared inputs for the given scales, in scale then format then name order
pub fn resolve_inputs(
    config: &WavebenchConfig,
    scales: &[Scale],
) -> Result<Vec<InputSpec>, ConfigurationError> {
    if !config.inputs.is_empty() {
        return explicit_inputs(config, scales);
    }

    let root = config.data_dir();
    let mut inputs = Vec::new();
    for &scale in scales {
        let dir = scale_directory(&root, scale);
        for &format in &config.data.formats {
            inputs.push(InputSpec::new(
                dir.join(conventional_file_name(scale, format)),
                format,
                scale,
            ));
        }
        if config.data.discover {
            inputs.extend(discover_extra(&dir, scale, &config.data.formats));
        }
    }
    Ok(inputs)
}

fn explicit_inputs(
    config: &WavebenchConfig,
    scales: &[Scale],
) -> Result<Vec<InputSpec>, ConfigurationError> {
    let mut inputs = Vec::new();
    for decl in &config.inputs {
        let path = config.resolve_path(&decl.path);
        let format = decl
            .format
            .or_else(|| Format::from_path(&path))
            .ok_or_else(|| ConfigurationError::UnclassifiedInput {
                path: path.clone(),
                what: "format",
            })?;
        let scale = decl
            .scale
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(Scale::from_stem)
            })
            .ok_or_else(|| ConfigurationError::UnclassifiedInput {
                path: path.clone(),
                what: "scale",
            })?;

        if !scales.contains(&scale) || !config.data.formats.contains(&format) {
            continue;
        }

        let mut spec = InputSpec::new(path, format, scale);
        if let Some(id) = &decl.id {
            spec.id = id.clone();
        }
        inputs.push(spec);
    }
    Ok(inputs)
}

/// `*_<scale>.<ext>` files other than the generated one, sorted by name
fn discover_extra(dir: &Path, scale: Scale, formats: &[Format]) -> Vec<InputSpec> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut found: Vec<InputSpec> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let format = Format::from_path(&path).filter(|f| formats.contains(f))?;
            let stem = path.file_stem()?.to_str()?;
            if Scale::from_stem(stem) != Some(scale) {
                return None;
            }
            let name = path.file_name()?.to_str()?;
            if name == conventional_file_name(scale, format) {
                return None;
            }
            Some(InputSpec::new(path.clone(), format, scale))
        })
        .collect();

    found.sort_by(|a, b| a.id.cmp(&b.id));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputDeclaration;
    use std::path::PathBuf;

    fn config_for(dir: &Path) -> WavebenchConfig {
        let mut config = WavebenchConfig::default();
        config.data.directory = dir.to_path_buf();
        config
    }

    fn touch(path: PathBuf) {
        std::fs::write(path, b"$end\n").unwrap();
    }

    #[test]
    fn test_conventional_names_per_scale() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.data.discover = false;

        let inputs = resolve_inputs(&config, &[Scale::Small, Scale::Large]).unwrap();
        let ids: Vec<_> = inputs.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "bench_small.vcd",
                "bench_small.fst",
                "bench_large.vcd",
                "bench_large.fst"
            ]
        );
        assert_eq!(inputs[2].scale, Scale::Large);
        assert_eq!(inputs[3].format, Format::Fst);
    }

    #[test]
    fn test_scale_subdirectory_preferred() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("medium")).unwrap();
        let config = config_for(dir.path());

        let inputs = resolve_inputs(&config, &[Scale::Medium]).unwrap();
        assert_eq!(
            inputs[0].path,
            dir.path().join("medium").join("bench_medium.vcd")
        );
    }

    #[test]
    fn test_discovery_adds_extra_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path().join("bench_medium.vcd"));
        touch(dir.path().join("zeta_capture_medium.vcd"));
        touch(dir.path().join("alpha_medium.fst"));
        touch(dir.path().join("other_small.vcd"));
        touch(dir.path().join("notes_medium.txt"));
        let config = config_for(dir.path());

        let inputs = resolve_inputs(&config, &[Scale::Medium]).unwrap();
        let ids: Vec<_> = inputs.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "bench_medium.vcd",
                "bench_medium.fst",
                "alpha_medium.fst",
                "zeta_capture_medium.vcd"
            ]
        );
    }

    #[test]
    fn test_discovery_respects_formats() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path().join("extra_small.fst"));
        let mut config = config_for(dir.path());
        config.data.formats = vec![Format::Vcd];

        let inputs = resolve_inputs(&config, &[Scale::Small]).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].id, "bench_small.vcd");
    }

    #[test]
    fn test_explicit_inputs_replace_convention() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.base_dir = dir.path().to_path_buf();
        config.inputs = vec![
            InputDeclaration {
                path: PathBuf::from("captures/cpu_large.vcd"),
                id: None,
                format: None,
                scale: None,
            },
            InputDeclaration {
                path: PathBuf::from("gpu.fst"),
                id: Some("gpu-trace".to_string()),
                format: None,
                scale: Some(Scale::Small),
            },
        ];

        let inputs = resolve_inputs(&config, &[Scale::Small]).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].id, "gpu-trace");
        assert_eq!(inputs[0].path, dir.path().join("gpu.fst"));

        let all = resolve_inputs(&config, &Scale::ALL).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].scale, Scale::Large);
    }

    #[test]
    fn test_explicit_input_without_scale_is_rejected() {
        let mut config = WavebenchConfig::default();
        config.inputs = vec![InputDeclaration {
            path: PathBuf::from("trace.vcd"),
            id: None,
            format: None,
            scale: None,
        }];
        assert!(matches!(
            resolve_inputs(&config, &Scale::ALL),
            Err(ConfigurationError::UnclassifiedInput { what: "scale", .. })
        ));
    }
}
