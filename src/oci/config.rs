use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Image config attached to every packager result. The rootfs carries no
/// diff IDs because the artifact layers are not runnable filesystem layers.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImageConfig {
    pub architecture: String,
    pub os: String,
    #[serde(default)]
    pub config: RuntimeConfig,
    pub rootfs: RootFs,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "Env", skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    #[serde(rename = "Cmd", skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    #[serde(rename = "WorkingDir", skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootFs {
    #[serde(rename = "type")]
    pub fs_type: String,
    pub diff_ids: Vec<String>,
}

/// Serialized minimal image config with the provided OS and architecture.
/// RootFS is empty (no layers), matching the other packager outputs.
pub fn minimal_image_config(os: &str, arch: &str) -> Result<Vec<u8>> {
    let cfg = ImageConfig {
        architecture: arch.to_string(),
        os: os.to_string(),
        config: RuntimeConfig::default(),
        rootfs: RootFs {
            fs_type: "layers".to_string(),
            diff_ids: Vec::new(),
        },
    };
    Ok(serde_json::to_vec(&cfg)?)
}
