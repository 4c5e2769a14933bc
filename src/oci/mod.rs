//! Media type and annotation constants plus the small serde bindings for the
//! OCI structures the packager emits.

pub mod config;
pub mod manifest;

pub const MEDIA_TYPE_IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const MEDIA_TYPE_IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub const MEDIA_TYPE_IMAGE_LAYER: &str = "application/vnd.oci.image.layer.v1.tar";
pub const MEDIA_TYPE_IMAGE_LAYER_GZIP: &str = "application/vnd.oci.image.layer.v1.tar+gzip";
pub const MEDIA_TYPE_IMAGE_LAYER_ZSTD: &str = "application/vnd.oci.image.layer.v1.tar+zstd";
pub const MEDIA_TYPE_EMPTY_JSON: &str = "application/vnd.oci.empty.v1+json";
pub const MEDIA_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// ModelPack artifact type embedded in modelpack manifests.
pub const ARTIFACT_TYPE_MODEL_MANIFEST: &str = "application/vnd.cncf.model.manifest.v1+json";
/// ModelPack manifest config media type.
pub const MEDIA_TYPE_MODEL_CONFIG: &str = "application/vnd.cncf.model.config.v1+json";
/// Artifact type used for generic (non-model) layouts.
pub const ARTIFACT_TYPE_UNKNOWN: &str = "application/vnd.unknown.artifact.v1";

pub const ANNOTATION_IMAGE_TITLE: &str = "org.opencontainers.image.title";
pub const ANNOTATION_IMAGE_REF_NAME: &str = "org.opencontainers.image.ref.name";
pub const ANNOTATION_MODEL_FILEPATH: &str = "org.cncf.model.filepath";
pub const ANNOTATION_MODEL_FILE_METADATA: &str = "org.cncf.model.file.metadata+json";
pub const ANNOTATION_MODEL_MEDIATYPE_UNTESTED: &str = "org.cncf.model.file.mediatype.untested";

/// Layer media types for one ModelPack category, by packaging flavor.
#[derive(Debug, Clone, Copy)]
pub struct ModelLayerMediaTypes {
    pub raw: &'static str,
    pub tar: &'static str,
    pub tar_gzip: &'static str,
    pub tar_zstd: &'static str,
}

pub const WEIGHT_LAYER_TYPES: ModelLayerMediaTypes = ModelLayerMediaTypes {
    raw: "application/vnd.cncf.model.weight.v1.raw",
    tar: "application/vnd.cncf.model.weight.v1.tar",
    tar_gzip: "application/vnd.cncf.model.weight.v1.tar+gzip",
    tar_zstd: "application/vnd.cncf.model.weight.v1.tar+zstd",
};

pub const WEIGHT_CONFIG_LAYER_TYPES: ModelLayerMediaTypes = ModelLayerMediaTypes {
    raw: "application/vnd.cncf.model.weight.config.v1.raw",
    tar: "application/vnd.cncf.model.weight.config.v1.tar",
    tar_gzip: "application/vnd.cncf.model.weight.config.v1.tar+gzip",
    tar_zstd: "application/vnd.cncf.model.weight.config.v1.tar+zstd",
};

pub const DOC_LAYER_TYPES: ModelLayerMediaTypes = ModelLayerMediaTypes {
    raw: "application/vnd.cncf.model.doc.v1.raw",
    tar: "application/vnd.cncf.model.doc.v1.tar",
    tar_gzip: "application/vnd.cncf.model.doc.v1.tar+gzip",
    tar_zstd: "application/vnd.cncf.model.doc.v1.tar+zstd",
};

pub const CODE_LAYER_TYPES: ModelLayerMediaTypes = ModelLayerMediaTypes {
    raw: "application/vnd.cncf.model.code.v1.raw",
    tar: "application/vnd.cncf.model.code.v1.tar",
    tar_gzip: "application/vnd.cncf.model.code.v1.tar+gzip",
    tar_zstd: "application/vnd.cncf.model.code.v1.tar+zstd",
};

pub const DATASET_LAYER_TYPES: ModelLayerMediaTypes = ModelLayerMediaTypes {
    raw: "application/vnd.cncf.model.dataset.v1.raw",
    tar: "application/vnd.cncf.model.dataset.v1.tar",
    tar_gzip: "application/vnd.cncf.model.dataset.v1.tar+gzip",
    tar_zstd: "application/vnd.cncf.model.dataset.v1.tar+zstd",
};
