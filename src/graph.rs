use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One operation in the build graph. Input edges live on the surrounding
/// node, so an op serializes to a stable form independent of graph identity.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpKind {
    /// File transfer from the build client's local context
    Local {
        name: String,
        session_id: String,
        include_patterns: Vec<String>,
        shared_key_hint: String,
    },
    /// Single-file HTTP(S) fetch
    Http {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    /// Resolved container image used as an execution root
    Image { reference: String },
    /// Empty filesystem
    Scratch,
    /// Process executed on input 0; inputs 1.. back the mounts in order
    Exec {
        args: Vec<String>,
        mounts: Vec<MountSpec>,
        secrets: Vec<SecretSpec>,
    },
    /// Copy from input 1 into input 0
    Copy {
        src: String,
        dst: String,
        dir_contents_only: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct MountSpec {
    pub dest: String,
    pub readonly: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretSpec {
    pub id: String,
    pub dest: String,
    pub optional: bool,
}

#[derive(Debug)]
struct Node {
    kind: OpKind,
    inputs: Vec<State>,
}

/// Immutable handle to a filesystem-producing graph node. Cloning shares the
/// underlying node, so common subgraphs marshal once.
#[derive(Debug, Clone)]
pub struct State {
    node: Arc<Node>,
}

impl State {
    fn new(kind: OpKind, inputs: Vec<State>) -> Self {
        Self {
            node: Arc::new(Node { kind, inputs }),
        }
    }

    /// Local context transfer keyed by logical name and session.
    pub fn local(
        name: &str,
        session_id: &str,
        include_patterns: Vec<String>,
        shared_key_hint: &str,
    ) -> Self {
        Self::new(
            OpKind::Local {
                name: name.to_string(),
                session_id: session_id.to_string(),
                include_patterns,
                shared_key_hint: shared_key_hint.to_string(),
            },
            Vec::new(),
        )
    }

    /// HTTP(S) fetch; filename pins the on-disk name of the downloaded file.
    pub fn http(url: &str, filename: Option<String>) -> Self {
        Self::new(
            OpKind::Http {
                url: url.to_string(),
                filename,
            },
            Vec::new(),
        )
    }

    pub fn image(reference: &str) -> Self {
        Self::new(
            OpKind::Image {
                reference: reference.to_string(),
            },
            Vec::new(),
        )
    }

    pub fn scratch() -> Self {
        Self::new(OpKind::Scratch, Vec::new())
    }

    /// Start an exec on top of this state.
    pub fn run(&self, args: Vec<String>) -> ExecState {
        ExecState {
            root: self.clone(),
            args,
            mounts: Vec::new(),
            secrets: Vec::new(),
        }
    }

    /// Copy `src` from another state into `dst` on this one.
    pub fn copy(&self, from: &State, src: &str, dst: &str) -> State {
        self.copy_with(from, src, dst, false)
    }

    /// Like copy, but unpacks the source directory's contents rather than the
    /// directory itself.
    pub fn copy_contents(&self, from: &State, src: &str, dst: &str) -> State {
        self.copy_with(from, src, dst, true)
    }

    fn copy_with(&self, from: &State, src: &str, dst: &str, dir_contents_only: bool) -> State {
        State::new(
            OpKind::Copy {
                src: src.to_string(),
                dst: dst.to_string(),
                dir_contents_only,
            },
            vec![self.clone(), from.clone()],
        )
    }

    /// Marshal the graph rooted at this state into its wire definition.
    /// Ops are serialized in post-order, digested with SHA-256, and reference
    /// their inputs by digest, so identical graphs marshal to identical bytes.
    pub fn marshal(&self, custom_name: &str) -> Result<Definition> {
        let mut ops = Vec::new();
        let mut seen_nodes: HashMap<*const Node, String> = HashMap::new();
        let mut seen_digests: HashSet<String> = HashSet::new();
        let result = marshal_node(self, &mut seen_nodes, &mut seen_digests, &mut ops)?;
        Ok(Definition {
            custom_name: custom_name.to_string(),
            ops,
            result,
        })
    }
}

/// Builder for an exec node; finish with [`ExecState::root`].
pub struct ExecState {
    root: State,
    args: Vec<String>,
    mounts: Vec<(MountSpec, State)>,
    secrets: Vec<SecretSpec>,
}

impl ExecState {
    pub fn mount(mut self, dest: &str, state: &State, readonly: bool) -> Self {
        self.mounts.push((
            MountSpec {
                dest: dest.to_string(),
                readonly,
            },
            state.clone(),
        ));
        self
    }

    pub fn secret(mut self, dest: &str, id: &str, optional: bool) -> Self {
        self.secrets.push(SecretSpec {
            id: id.to_string(),
            dest: dest.to_string(),
            optional,
        });
        self
    }

    /// The filesystem state after the process ran.
    pub fn root(self) -> State {
        let mut inputs = vec![self.root];
        let mut mounts = Vec::with_capacity(self.mounts.len());
        for (spec, state) in self.mounts {
            mounts.push(spec);
            inputs.push(state);
        }
        State::new(
            OpKind::Exec {
                args: self.args,
                mounts,
                secrets: self.secrets,
            },
            inputs,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
struct MarshaledOp {
    inputs: Vec<String>,
    #[serde(flatten)]
    kind: OpKind,
}

/// Content-addressed entry in a marshaled definition.
#[derive(Debug, Clone, Serialize)]
pub struct OpEntry {
    pub digest: String,
    op: MarshaledOp,
}

/// Wire form of a build graph, ready for a solve request. The custom name is
/// the human-readable label the build driver shows for progress.
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    custom_name: String,
    ops: Vec<OpEntry>,
    result: String,
}

impl Definition {
    pub fn custom_name(&self) -> &str {
        &self.custom_name
    }

    /// Digest of the root op.
    pub fn result_digest(&self) -> &str {
        &self.result
    }

    pub fn ops(&self) -> &[OpEntry] {
        &self.ops
    }

    /// Canonical wire bytes of the whole definition.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn marshal_node(
    state: &State,
    seen_nodes: &mut HashMap<*const Node, String>,
    seen_digests: &mut HashSet<String>,
    ops: &mut Vec<OpEntry>,
) -> Result<String> {
    let ptr = Arc::as_ptr(&state.node);
    if let Some(digest) = seen_nodes.get(&ptr) {
        return Ok(digest.clone());
    }

    let mut inputs = Vec::with_capacity(state.node.inputs.len());
    for input in &state.node.inputs {
        inputs.push(marshal_node(input, seen_nodes, seen_digests, ops)?);
    }

    let op = MarshaledOp {
        inputs,
        kind: state.node.kind.clone(),
    };
    let bytes = serde_json::to_vec(&op)?;
    let digest = format!("sha256:{}", hex::encode(Sha256::digest(&bytes)));

    if seen_digests.insert(digest.clone()) {
        ops.push(OpEntry {
            digest: digest.clone(),
            op,
        });
    }
    seen_nodes.insert(ptr, digest.clone());
    Ok(digest)
}
