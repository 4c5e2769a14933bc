use crate::constants::HF_TOKEN_SECRET_PATH;
use crate::error::PackagerError;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// A parsed huggingface:// reference.
///
/// Supported forms:
///
///   huggingface://namespace/model                -> revision: main
///   huggingface://namespace/model@rev            -> explicit revision
///   huggingface://namespace/model:rev            -> (legacy separator) explicit revision
///   huggingface://namespace/model@rev/path/to    -> revision with subpath
///   huggingface://namespace/model/path/to        -> implicit main revision with subpath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuggingFaceSpec {
    pub namespace: String,
    pub model: String,
    pub revision: String,
    /// Optional; empty means whole repository
    pub subpath: String,
}

static HF_SPEC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^huggingface://([^/]+)/([^/@:]+)(?:[@:]([^/]+))?(?:/(.*))?$")
        .expect("invalid huggingface reference pattern")
});

impl HuggingFaceSpec {
    /// Parse a huggingface:// reference into its components. Defaults the
    /// revision to "main" when omitted.
    pub fn parse(source: &str) -> Result<Self> {
        if !source.starts_with("huggingface://") {
            return Err(PackagerError::NotHuggingFace {
                source: source.to_string(),
            }
            .into());
        }
        let caps = HF_SPEC_PATTERN.captures(source).ok_or_else(|| {
            PackagerError::InvalidHuggingFace {
                source: source.to_string(),
            }
        })?;

        let spec = HuggingFaceSpec {
            namespace: caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string(),
            model: caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string(),
            revision: caps
                .get(3)
                .map(|m| m.as_str())
                .filter(|r| !r.is_empty())
                .unwrap_or("main")
                .to_string(),
            subpath: caps.get(4).map(|m| m.as_str()).unwrap_or_default().to_string(),
        };
        if spec.namespace.is_empty() || spec.model.is_empty() {
            return Err(PackagerError::InvalidHuggingFace {
                source: source.to_string(),
            }
            .into());
        }
        Ok(spec)
    }
}

/// Split an exclusion option like `'original/*' "metal/*"` into bare patterns.
/// Opening and closing quotes are interchangeable (an unmatched `'a` still
/// yields `a`); characters outside quotes are dropped.
pub fn parse_exclude_patterns(exclude: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for ch in exclude.chars() {
        if ch == '\'' || ch == '"' {
            if in_quote {
                // end of quoted pattern
                if !current.is_empty() {
                    patterns.push(std::mem::take(&mut current));
                }
                in_quote = false;
            } else {
                in_quote = true;
            }
        } else if in_quote {
            current.push(ch);
        }
        // whitespace outside quotes is skipped
    }

    // handle any remaining pattern
    if !current.is_empty() {
        patterns.push(current);
    }
    patterns
}

/// Shell script downloading a full repository snapshot into /out, honoring an
/// optional token exposed through the driver secret. Each parsed exclusion
/// pattern becomes its own --exclude flag per hf CLI syntax.
pub fn snapshot_script(namespace: &str, model: &str, revision: &str, exclude: &str) -> String {
    let mut exclude_flags = String::new();
    for pattern in parse_exclude_patterns(exclude) {
        exclude_flags.push_str(&format!(" --exclude '{}'", pattern));
    }
    format!(
        "set -euo pipefail\n\
         if [ -f {secret} ]; then export HF_TOKEN=\"$(cat {secret})\"; fi\n\
         mkdir -p /out\n\
         hf download {namespace}/{model} --revision {revision} --local-dir /out{exclude_flags}\n\
         # remove transient cache / lock artifacts\n\
         rm -rf /out/.cache || true\n\
         find /out -type f -name '*.lock' -delete || true\n",
        secret = HF_TOKEN_SECRET_PATH,
    )
}

/// Shell script downloading a single file from a repository. subpath is the
/// relative path inside the repo.
pub fn single_file_script(namespace: &str, model: &str, revision: &str, subpath: &str) -> String {
    format!(
        "set -euo pipefail\n\
         if [ -f {secret} ]; then export HF_TOKEN=\"$(cat {secret})\"; fi\n\
         mkdir -p /out\n\
         hf download {namespace}/{model} {subpath} --revision {revision} --local-dir /out\n\
         # remove transient cache / lock artifacts\n\
         rm -rf /out/.cache || true\n\
         find /out -type f -name '*.lock' -delete || true\n",
        secret = HF_TOKEN_SECRET_PATH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_revision_to_main() {
        let spec = HuggingFaceSpec::parse("huggingface://org/model").unwrap();
        assert_eq!(spec.namespace, "org");
        assert_eq!(spec.model, "model");
        assert_eq!(spec.revision, "main");
        assert_eq!(spec.subpath, "");
    }

    #[test]
    fn test_parse_explicit_revision_separators() {
        let at = HuggingFaceSpec::parse("huggingface://org/model@rev1").unwrap();
        assert_eq!(at.revision, "rev1");

        let colon = HuggingFaceSpec::parse("huggingface://org/model:rev1").unwrap();
        assert_eq!(colon.revision, "rev1");
        assert_eq!(at, colon);
    }

    #[test]
    fn test_parse_subpath_forms() {
        let spec = HuggingFaceSpec::parse("huggingface://org/model@rev1/path/file.bin").unwrap();
        assert_eq!(spec.revision, "rev1");
        assert_eq!(spec.subpath, "path/file.bin");

        let implicit = HuggingFaceSpec::parse("huggingface://org/model/file.bin").unwrap();
        assert_eq!(implicit.revision, "main");
        assert_eq!(implicit.subpath, "file.bin");
    }

    #[test]
    fn test_parse_rejects_malformed_references() {
        for source in ["huggingface://", "huggingface://org"] {
            let err = HuggingFaceSpec::parse(source).unwrap_err().to_string();
            assert!(err.contains("invalid huggingface"), "{}: {}", source, err);
        }
        let err = HuggingFaceSpec::parse("https://example.com/model.bin")
            .unwrap_err()
            .to_string();
        assert!(err.contains("not a huggingface source"));
    }

    #[test]
    fn test_parse_exclude_patterns_empty() {
        assert!(parse_exclude_patterns("").is_empty());
        assert!(parse_exclude_patterns("   ").is_empty());
        assert!(parse_exclude_patterns("''").is_empty());
        assert!(parse_exclude_patterns("''  ''  ''").is_empty());
    }

    #[test]
    fn test_parse_exclude_patterns_quoted() {
        assert_eq!(parse_exclude_patterns("'original/*'"), vec!["original/*"]);
        assert_eq!(
            parse_exclude_patterns("'original/*' 'metal/*'"),
            vec!["original/*", "metal/*"]
        );
        assert_eq!(
            parse_exclude_patterns(r#""*.safetensors" "metal/**""#),
            vec!["*.safetensors", "metal/**"]
        );
        assert_eq!(
            parse_exclude_patterns("'original/**' \"metal/*\" '*.bin'"),
            vec!["original/**", "metal/*", "*.bin"]
        );
        assert_eq!(parse_exclude_patterns("'a' \"b\" 'c'"), vec!["a", "b", "c"]);
        assert_eq!(
            parse_exclude_patterns("'pattern with spaces'"),
            vec!["pattern with spaces"]
        );
        assert_eq!(
            parse_exclude_patterns("'**/*.bin' '*.safetensors' 'model-[0-9]*.gguf'"),
            vec!["**/*.bin", "*.safetensors", "model-[0-9]*.gguf"]
        );
    }

    #[test]
    fn test_parse_exclude_patterns_tolerates_unclosed_quotes() {
        // the scanner captures content until end of input
        assert_eq!(parse_exclude_patterns("'pattern"), vec!["pattern"]);
        // opening and closing quote kinds may differ
        assert_eq!(parse_exclude_patterns("'a\""), vec!["a"]);
    }

    #[test]
    fn test_snapshot_script_contents() {
        let script = snapshot_script("org", "model", "rev123", "");
        for expect in [
            "set -euo pipefail",
            "org/model",
            "--revision rev123",
            "/run/secrets/hf-token",
            "hf download",
            "rm -rf /out/.cache",
            "find /out -type f -name '*.lock' -delete || true",
        ] {
            assert!(script.contains(expect), "expected script to contain {:?}; got {}", expect, script);
        }
        assert!(!script.contains("--exclude"));
    }

    #[test]
    fn test_snapshot_script_with_excludes() {
        let script = snapshot_script("org", "model", "rev123", "'original/*' 'metal/*'");
        assert!(script.contains("--exclude 'original/*' --exclude 'metal/*'"));
    }

    #[test]
    fn test_single_file_script_contents() {
        let script = single_file_script("org", "model", "rev1", "path/file.bin");
        assert!(script.contains("hf download org/model path/file.bin --revision rev1"));
        assert!(script.contains("--local-dir /out"));
        assert!(script.contains("/run/secrets/hf-token"));
    }
}
