// Centralized constants for the modelpacker frontend to avoid magic strings

/// Logical name under which the build driver exposes the local context.
pub const LOCAL_NAME_CONTEXT: &str = "context";

/// Container image running the layout assembler scripts.
pub const BASH_IMAGE: &str = "cgr.dev/chainguard/bash:latest";

/// Pinned image carrying the Hugging Face downloader CLI.
pub const HF_CLI_IMAGE: &str = "ghcr.io/kaito-project/aikit/hf-cli:latest";

/// Well-known path where the build driver mounts the Hugging Face token secret.
pub const HF_TOKEN_SECRET_PATH: &str = "/run/secrets/hf-token";

/// Secret identifier requested from the build driver's session.
pub const HF_TOKEN_SECRET_ID: &str = "hf-token";

/// Size (10 MiB) above which otherwise-unclassified files count as weights.
pub const LARGE_FILE_THRESHOLD: u64 = 10_485_760;

/// Minimum number of slashes after huggingface:// that indicates a file path
/// (namespace/model/file...).
pub const MIN_PATH_DEPTH_FOR_HF_FILE: usize = 2;

/// Fallback artifact title so the index annotation is never empty.
pub const DEFAULT_MODEL_NAME: &str = "aikitmodel";

/// Fallback reference name for the index annotation.
pub const DEFAULT_REF_NAME: &str = "latest";

/// Platform recorded in the minimal image config.
pub const DEFAULT_PLATFORM_OS: &str = "linux";

/// Architecture recorded in the minimal image config.
pub const DEFAULT_PLATFORM_ARCH: &str = "amd64";
