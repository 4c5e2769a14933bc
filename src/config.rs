use crate::constants::{DEFAULT_MODEL_NAME, DEFAULT_REF_NAME};
use crate::error::PackagerError;
use anyhow::Result;
use std::collections::HashMap;

/// Prefix the build driver applies to caller-supplied options.
const BUILD_ARG_PREFIX: &str = "build-arg:";

/// Frontend target being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Modelpack,
    Generic,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Modelpack => "modelpack",
            Target::Generic => "generic",
        }
    }
}

/// How source files become layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackMode {
    /// One layer per file, uncompressed
    #[default]
    Raw,
    Tar,
    TarGzip,
    TarZstd,
}

impl PackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackMode::Raw => "raw",
            PackMode::Tar => "tar",
            PackMode::TarGzip => "tar+gzip",
            PackMode::TarZstd => "tar+zstd",
        }
    }

    /// Parse the layer_packaging option; empty selects the default.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "" | "raw" => Ok(PackMode::Raw),
            "tar" => Ok(PackMode::Tar),
            "tar+gzip" => Ok(PackMode::TarGzip),
            "tar+zstd" => Ok(PackMode::TarZstd),
            other => Err(PackagerError::UnknownPackMode {
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// Output shape for the generic target. Any value other than "files" behaves
/// as archive, matching the original option comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenericOutputMode {
    #[default]
    Archive,
    /// Raw file passthrough; no assembler runs
    Files,
}

impl GenericOutputMode {
    pub fn parse(value: &str) -> Self {
        if value == "files" {
            GenericOutputMode::Files
        } else {
            GenericOutputMode::Archive
        }
    }
}

/// Common build parameters extracted from the driver's option map.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub source: String,
    pub exclude: String,
    pub pack_mode: PackMode,
    pub name: String,
    pub ref_name: String,
    pub session_id: String,
    pub generic_output_mode: GenericOutputMode,
    pub debug: bool,
}

/// Look up a caller-supplied option by its bare name.
pub fn build_arg<'a>(opts: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    opts.get(&format!("{}{}", BUILD_ARG_PREFIX, key))
        .map(String::as_str)
}

/// Extract and validate build configuration from the driver options.
pub fn parse_build_config(
    opts: &HashMap<String, String>,
    session_id: &str,
    target: Target,
) -> Result<BuildConfig> {
    let source = build_arg(opts, "source").unwrap_or_default().to_string();
    if source.is_empty() {
        return Err(PackagerError::MissingSource {
            target: target.as_str().to_string(),
        }
        .into());
    }

    let pack_mode = PackMode::parse(build_arg(opts, "layer_packaging").unwrap_or_default())?;

    let generic_output_mode = match target {
        Target::Generic => {
            GenericOutputMode::parse(build_arg(opts, "generic_output_mode").unwrap_or_default())
        }
        Target::Modelpack => GenericOutputMode::default(),
    };

    Ok(BuildConfig {
        source,
        exclude: build_arg(opts, "exclude").unwrap_or_default().to_string(),
        pack_mode,
        name: determine_name(opts),
        ref_name: determine_ref_name(opts),
        session_id: session_id.to_string(),
        generic_output_mode,
        debug: build_arg(opts, "debug") == Some("1"),
    })
}

/// The provided model name, or a fallback so the title annotation is never empty.
fn determine_name(opts: &HashMap<String, String>) -> String {
    match build_arg(opts, "name") {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => DEFAULT_MODEL_NAME.to_string(),
    }
}

/// The reference name for index annotations. Only follows the name option if
/// present; otherwise stays "latest" (different semantic than the title fallback).
fn determine_ref_name(opts: &HashMap<String, String>) -> String {
    match build_arg(opts, "name") {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => DEFAULT_REF_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (format!("build-arg:{}", k), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_source_for_modelpack() {
        let err = parse_build_config(&HashMap::new(), "session123", Target::Modelpack)
            .unwrap_err()
            .to_string();
        assert_eq!(err, "source is required for modelpack target");
    }

    #[test]
    fn test_missing_source_for_generic() {
        let err = parse_build_config(&HashMap::new(), "session123", Target::Generic)
            .unwrap_err()
            .to_string();
        assert_eq!(err, "source is required for generic target");
    }

    #[test]
    fn test_empty_source_string_rejected() {
        let o = opts(&[("source", "")]);
        let err = parse_build_config(&o, "session123", Target::Modelpack).unwrap_err();
        assert!(err.to_string().contains("source is required"));
    }

    #[test]
    fn test_minimal_config_defaults() {
        let o = opts(&[("source", "https://example.com/model.bin")]);
        let cfg = parse_build_config(&o, "session123", Target::Generic).unwrap();
        assert_eq!(cfg.source, "https://example.com/model.bin");
        assert_eq!(cfg.pack_mode, PackMode::Raw);
        assert_eq!(cfg.name, "aikitmodel");
        assert_eq!(cfg.ref_name, "latest");
        assert_eq!(cfg.generic_output_mode, GenericOutputMode::Archive);
        assert!(!cfg.debug);
        assert_eq!(cfg.session_id, "session123");
    }

    #[test]
    fn test_custom_pack_mode() {
        let o = opts(&[("source", "."), ("layer_packaging", "tar+gzip")]);
        let cfg = parse_build_config(&o, "s", Target::Generic).unwrap();
        assert_eq!(cfg.pack_mode, PackMode::TarGzip);
    }

    #[test]
    fn test_unknown_pack_mode_rejected() {
        let o = opts(&[("source", "."), ("layer_packaging", "zip")]);
        let err = parse_build_config(&o, "s", Target::Generic).unwrap_err();
        assert!(err.to_string().contains("layer_packaging"));
        assert!(err.to_string().contains("zip"));
    }

    #[test]
    fn test_name_sets_title_and_ref_name() {
        let o = opts(&[("source", "."), ("name", "llama-pack")]);
        let cfg = parse_build_config(&o, "s", Target::Modelpack).unwrap();
        assert_eq!(cfg.name, "llama-pack");
        assert_eq!(cfg.ref_name, "llama-pack");
    }

    #[test]
    fn test_generic_output_mode_only_for_generic() {
        let o = opts(&[("source", "."), ("generic_output_mode", "files")]);
        let generic = parse_build_config(&o, "s", Target::Generic).unwrap();
        assert_eq!(generic.generic_output_mode, GenericOutputMode::Files);

        let modelpack = parse_build_config(&o, "s", Target::Modelpack).unwrap();
        assert_eq!(modelpack.generic_output_mode, GenericOutputMode::Archive);
    }

    #[test]
    fn test_unknown_generic_output_mode_is_archive() {
        let o = opts(&[("source", "."), ("generic_output_mode", "weird")]);
        let cfg = parse_build_config(&o, "s", Target::Generic).unwrap();
        assert_eq!(cfg.generic_output_mode, GenericOutputMode::Archive);
    }

    #[test]
    fn test_debug_flag() {
        let o = opts(&[("source", "."), ("debug", "1")]);
        assert!(parse_build_config(&o, "s", Target::Generic).unwrap().debug);

        let o = opts(&[("source", "."), ("debug", "true")]);
        assert!(!parse_build_config(&o, "s", Target::Generic).unwrap().debug);
    }

    #[test]
    fn test_exclude_passthrough() {
        let o = opts(&[("source", "huggingface://org/model"), ("exclude", "'*.md' '*.bin'")]);
        let cfg = parse_build_config(&o, "s", Target::Modelpack).unwrap();
        assert_eq!(cfg.exclude, "'*.md' '*.bin'");
    }

    #[test]
    fn test_pack_mode_round_trip() {
        for mode in [PackMode::Raw, PackMode::Tar, PackMode::TarGzip, PackMode::TarZstd] {
            assert_eq!(PackMode::parse(mode.as_str()).unwrap(), mode);
        }
    }
}
