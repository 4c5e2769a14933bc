use crate::constants::{
    HF_CLI_IMAGE, HF_TOKEN_SECRET_ID, HF_TOKEN_SECRET_PATH, LOCAL_NAME_CONTEXT,
    MIN_PATH_DEPTH_FOR_HF_FILE,
};
use crate::graph::State;
use anyhow::Result;

pub mod huggingface;

use huggingface::HuggingFaceSpec;

/// A normalized artifact source; exactly one variant applies to any input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// Entire local build context ("", "." or "context")
    LocalContext,
    /// Path or glob inside the local context
    LocalSubpath { pattern: String },
    /// Single file fetched over HTTP(S)
    Http {
        url: String,
        preserve_filename: bool,
    },
    /// Full repository snapshot download
    HuggingFaceRepo {
        spec: HuggingFaceSpec,
        exclude: String,
    },
    /// Single file inside a repository
    HuggingFaceFile { spec: HuggingFaceSpec },
}

impl SourceReference {
    /// Classify a raw source string. For HTTP(S) sources,
    /// `preserve_http_filename` pins the URL basename as the downloaded name
    /// (avoids anonymous temp names). `exclude` only applies to snapshots.
    pub fn parse(source: &str, preserve_http_filename: bool, exclude: &str) -> Result<Self> {
        if source.is_empty() || source == "." || source == LOCAL_NAME_CONTEXT {
            return Ok(SourceReference::LocalContext);
        }
        if source.starts_with("https://") || source.starts_with("http://") {
            return Ok(SourceReference::Http {
                url: source.to_string(),
                preserve_filename: preserve_http_filename,
            });
        }
        if let Some(trimmed) = source.strip_prefix("huggingface://") {
            // namespace/model/file (optionally with further subdirs) selects
            // the single-file path
            if trimmed.matches('/').count() >= MIN_PATH_DEPTH_FOR_HF_FILE {
                match HuggingFaceSpec::parse(source) {
                    Ok(spec) if !spec.subpath.is_empty() => {
                        return Ok(SourceReference::HuggingFaceFile { spec });
                    }
                    _ => {
                        tracing::debug!(
                            source,
                            "single-file dispatch unavailable, falling back to repository snapshot"
                        );
                    }
                }
            }
            let spec = HuggingFaceSpec::parse(source)?;
            return Ok(SourceReference::HuggingFaceRepo {
                spec,
                exclude: exclude.to_string(),
            });
        }
        Ok(SourceReference::LocalSubpath {
            pattern: source.to_string(),
        })
    }

    /// Resolve into a filesystem-producing graph state. Pure: the same
    /// reference and session always yield the same graph.
    pub fn resolve(&self, session_id: &str) -> State {
        match self {
            SourceReference::LocalContext => State::local(
                LOCAL_NAME_CONTEXT,
                session_id,
                Vec::new(),
                LOCAL_NAME_CONTEXT,
            ),
            SourceReference::LocalSubpath { pattern } => {
                let mut include = pattern.clone();
                if include.ends_with('/') {
                    include.push_str("**");
                }
                let shared_key = format!("{}:{}", LOCAL_NAME_CONTEXT, include);
                State::local(LOCAL_NAME_CONTEXT, session_id, vec![include], &shared_key)
            }
            SourceReference::Http {
                url,
                preserve_filename,
            } => {
                let filename = preserve_filename.then(|| url_basename(url));
                State::http(url, filename)
            }
            SourceReference::HuggingFaceRepo { spec, exclude } => {
                downloader_state(&huggingface::snapshot_script(
                    &spec.namespace,
                    &spec.model,
                    &spec.revision,
                    exclude,
                ))
            }
            SourceReference::HuggingFaceFile { spec } => {
                downloader_state(&huggingface::single_file_script(
                    &spec.namespace,
                    &spec.model,
                    &spec.revision,
                    &spec.subpath,
                ))
            }
        }
    }
}

/// Parse and resolve in one step; this is the frontends' entry point.
pub fn resolve_source_state(
    source: &str,
    session_id: &str,
    preserve_http_filename: bool,
    exclude: &str,
) -> Result<State> {
    Ok(SourceReference::parse(source, preserve_http_filename, exclude)?.resolve(session_id))
}

/// Run a downloader script in the pinned hf CLI image with the token secret
/// optionally mounted, keeping only the contents of /out.
fn downloader_state(script: &str) -> State {
    let run = State::image(HF_CLI_IMAGE)
        .run(vec!["bash".to_string(), "-c".to_string(), script.to_string()])
        .secret(HF_TOKEN_SECRET_PATH, HF_TOKEN_SECRET_ID, true)
        .root();
    State::scratch().copy_contents(&run, "/out/", "/")
}

fn url_basename(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_context_forms() {
        for source in ["", ".", "context"] {
            let parsed = SourceReference::parse(source, false, "").unwrap();
            assert_eq!(parsed, SourceReference::LocalContext, "{:?}", source);
        }
    }

    #[test]
    fn test_parse_http_preserve_flag() {
        let preserved = SourceReference::parse("https://example.com/file.bin", true, "").unwrap();
        assert_eq!(
            preserved,
            SourceReference::Http {
                url: "https://example.com/file.bin".to_string(),
                preserve_filename: true,
            }
        );
        let plain = SourceReference::parse("http://example.com/file.bin", false, "").unwrap();
        assert!(matches!(
            plain,
            SourceReference::Http {
                preserve_filename: false,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_subpath_appends_glob_on_resolve() {
        let parsed = SourceReference::parse("subdir/", false, "").unwrap();
        assert_eq!(
            parsed,
            SourceReference::LocalSubpath {
                pattern: "subdir/".to_string()
            }
        );
        let def = parsed.resolve("sess123").marshal("t").unwrap();
        let encoded = String::from_utf8(def.encode().unwrap()).unwrap();
        assert!(encoded.contains("subdir/**"));
        assert!(encoded.contains("context:subdir/**"));
    }

    #[test]
    fn test_parse_huggingface_repo_vs_file() {
        let repo = SourceReference::parse("huggingface://org/model@rev", false, "'*.md'").unwrap();
        match repo {
            SourceReference::HuggingFaceRepo { spec, exclude } => {
                assert_eq!(spec.revision, "rev");
                assert_eq!(exclude, "'*.md'");
            }
            other => panic!("expected repo variant, got {:?}", other),
        }

        let file =
            SourceReference::parse("huggingface://org/model@rev1/path/file.bin", false, "").unwrap();
        match file {
            SourceReference::HuggingFaceFile { spec } => {
                assert_eq!(spec.subpath, "path/file.bin");
                assert_eq!(spec.revision, "rev1");
            }
            other => panic!("expected file variant, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_slash_subpath_falls_back_to_snapshot() {
        // two slashes but an empty subpath: snapshot fallback
        let parsed = SourceReference::parse("huggingface://org/model@rev/", false, "").unwrap();
        assert!(matches!(parsed, SourceReference::HuggingFaceRepo { .. }));
    }

    #[test]
    fn test_parse_malformed_huggingface_fails() {
        let err = SourceReference::parse("huggingface://org", false, "")
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid huggingface"));
    }

    #[test]
    fn test_resolve_variants_marshal_expected_content() {
        let cases: Vec<(&str, bool, &str)> = vec![
            ("context", true, "context"),
            (".", false, "context"),
            ("https://example.com/file.bin", true, "file.bin"),
            ("https://example.com/file.bin", false, "file.bin"),
            ("huggingface://org/model@rev", false, "hf download"),
            ("subdir/", false, "subdir"),
        ];
        for (source, preserve, expect) in cases {
            let state = resolve_source_state(source, "sess123", preserve, "").unwrap();
            let encoded = String::from_utf8(
                state.marshal("t").unwrap().encode().unwrap(),
            )
            .unwrap();
            assert!(
                encoded.contains(expect),
                "expected definition for {:?} to contain {:?}",
                source,
                expect
            );
        }
    }

    #[test]
    fn test_http_filename_only_when_preserved() {
        let preserved = resolve_source_state("https://example.com/file.bin", "s", true, "")
            .unwrap()
            .marshal("t")
            .unwrap();
        let encoded = String::from_utf8(preserved.encode().unwrap()).unwrap();
        assert!(encoded.contains("\"filename\":\"file.bin\""));

        let plain = resolve_source_state("https://example.com/file.bin", "s", false, "")
            .unwrap()
            .marshal("t")
            .unwrap();
        let encoded = String::from_utf8(plain.encode().unwrap()).unwrap();
        assert!(!encoded.contains("filename"));
    }

    #[test]
    fn test_huggingface_state_mounts_token_secret() {
        let state = resolve_source_state("huggingface://org/model", "s", false, "").unwrap();
        let encoded = String::from_utf8(state.marshal("t").unwrap().encode().unwrap()).unwrap();
        assert!(encoded.contains("/run/secrets/hf-token"));
        assert!(encoded.contains("\"optional\":true"));
        assert!(encoded.contains("ghcr.io/kaito-project/aikit/hf-cli:latest"));
        assert!(encoded.contains("\"dir_contents_only\":true"));
    }
}
