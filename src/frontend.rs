use crate::config::{parse_build_config, GenericOutputMode, Target};
use crate::constants::{BASH_IMAGE, DEFAULT_PLATFORM_ARCH, DEFAULT_PLATFORM_OS};
use crate::error::PackagerError;
use crate::graph::{Definition, State};
use crate::oci;
use crate::oci::config::minimal_image_config;
use crate::scripts::{generic::generate_generic_script, modelpack::generate_modelpack_script};
use crate::source::resolve_source_state;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Metadata key under which the serialized image config reaches the exporter.
pub const EXPORTER_IMAGE_CONFIG_KEY: &str = "containerimage.config";

/// Options the build driver surfaces for one frontend invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildOpts {
    pub opts: HashMap<String, String>,
    pub session_id: String,
}

/// Opaque handle to a solved filesystem result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub definition: Definition,
}

/// Outcome of a solve. The packager graphs always produce a single result.
#[derive(Debug, Clone)]
pub struct SolveResponse {
    refs: Vec<Reference>,
}

impl SolveResponse {
    pub fn new(refs: Vec<Reference>) -> Self {
        Self { refs }
    }

    pub fn single_ref(mut self) -> Result<Reference> {
        if self.refs.len() != 1 {
            bail!("expected exactly one result reference, got {}", self.refs.len());
        }
        Ok(self.refs.remove(0))
    }
}

/// Gateway surface the build driver exposes to the frontend.
#[async_trait]
pub trait BuildClient: Send + Sync {
    fn build_opts(&self) -> &BuildOpts;
    async fn solve(&self, req: SolveRequest) -> Result<SolveResponse>;
}

/// Frontend result: the solved reference plus exporter metadata.
#[derive(Debug, Clone)]
pub struct BuildResult {
    reference: Reference,
    metadata: HashMap<String, Vec<u8>>,
}

impl BuildResult {
    pub fn new(reference: Reference) -> Self {
        Self {
            reference,
            metadata: HashMap::new(),
        }
    }

    pub fn add_meta(&mut self, key: &str, value: Vec<u8>) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn metadata(&self, key: &str) -> Option<&[u8]> {
        self.metadata.get(key).map(Vec::as_slice)
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }
}

/// Build the packager/modelpack target: classify the source into ModelPack
/// categories and emit an annotated OCI layout.
pub async fn build_modelpack(client: &dyn BuildClient) -> Result<BuildResult> {
    let build_opts = client.build_opts();
    let cfg = parse_build_config(&build_opts.opts, &build_opts.session_id, Target::Modelpack)?;
    tracing::info!(
        source = %cfg.source,
        pack_mode = cfg.pack_mode.as_str(),
        name = %cfg.name,
        "building modelpack layout"
    );

    let model_state = resolve_source_state(&cfg.source, &cfg.session_id, true, &cfg.exclude)
        .with_context(|| format!("failed to resolve modelpack source {:?}", cfg.source))?;

    let script = generate_modelpack_script(
        cfg.pack_mode,
        oci::ARTIFACT_TYPE_MODEL_MANIFEST,
        oci::MEDIA_TYPE_MODEL_CONFIG,
        &cfg.name,
        &cfg.ref_name,
        cfg.debug,
    );
    let final_state = assemble_layout_state(&model_state, &script);

    solve_and_build_result(client, final_state, "packager:modelpack").await
}

/// Build the packager/generic target: either a plain OCI layout of the source
/// files or, in files mode, a verbatim copy of the resolved source.
pub async fn build_generic(client: &dyn BuildClient) -> Result<BuildResult> {
    let build_opts = client.build_opts();
    let cfg = parse_build_config(&build_opts.opts, &build_opts.session_id, Target::Generic)?;
    tracing::info!(
        source = %cfg.source,
        pack_mode = cfg.pack_mode.as_str(),
        "building generic layout"
    );

    let src_state = resolve_source_state(&cfg.source, &cfg.session_id, false, &cfg.exclude)
        .with_context(|| format!("failed to resolve generic source {:?}", cfg.source))?;

    if cfg.generic_output_mode == GenericOutputMode::Files {
        // Raw file passthrough copies directly from the resolved source root,
        // so no assembler container runs at all.
        let final_state = State::scratch().copy(&src_state, "/", "/");
        return solve_and_build_result(client, final_state, "packager:generic-files").await;
    }

    let script = generate_generic_script(
        cfg.pack_mode,
        oci::ARTIFACT_TYPE_UNKNOWN,
        &cfg.name,
        &cfg.ref_name,
        cfg.debug,
    );
    let final_state = assemble_layout_state(&src_state, &script);

    solve_and_build_result(client, final_state, "packager:generic").await
}

/// Run an assembler script in the bash image with the source mounted
/// read-only at /src, then keep only the produced /layout tree.
fn assemble_layout_state(source: &State, script: &str) -> State {
    let run = State::image(BASH_IMAGE)
        .run(vec!["bash".to_string(), "-c".to_string(), script.to_string()])
        .mount("/src", source, true)
        .root();
    State::scratch().copy(&run, "/layout/", "/")
}

/// Marshal a state, solve it, and wrap the single result with the image
/// config metadata every packager output carries.
async fn solve_and_build_result(
    client: &dyn BuildClient,
    state: State,
    custom_name: &str,
) -> Result<BuildResult> {
    let definition = state.marshal(custom_name).map_err(|e| PackagerError::Graph {
        stage: "marshal".to_string(),
        name: custom_name.to_string(),
        cause: e.to_string(),
    })?;
    tracing::debug!(
        custom_name,
        ops = definition.ops().len(),
        result = definition.result_digest(),
        "submitting solve request"
    );

    let response = client
        .solve(SolveRequest { definition })
        .await
        .map_err(|e| PackagerError::Graph {
            stage: "solve".to_string(),
            name: custom_name.to_string(),
            cause: e.to_string(),
        })?;

    let reference = response.single_ref().map_err(|e| PackagerError::Graph {
        stage: "get result reference".to_string(),
        name: custom_name.to_string(),
        cause: e.to_string(),
    })?;

    let config = minimal_image_config(DEFAULT_PLATFORM_OS, DEFAULT_PLATFORM_ARCH)
        .context("failed to create image config")?;

    let mut out = BuildResult::new(reference);
    out.add_meta(EXPORTER_IMAGE_CONFIG_KEY, config);
    Ok(out)
}
