use crate::config::PackMode;
use crate::oci;

use super::{debug_line, fill};

/// Generic layout assembler template. Simpler than modelpack: no
/// classification, a single aggregated archive (or one octet-stream layer per
/// file in raw mode), and no extended layer annotations.
const GENERIC_TEMPLATE: &str = r##"set -euo pipefail
__DEBUG__
PACK_MODE=__PACK_MODE__

# Initialize OCI layout directory structure
mkdir -p /layout/blobs/sha256

# Handle single file input (copy to temporary directory)
work=/src
if [ -f /src ]; then mkdir -p /worksrc && cp /src /worksrc/; work=/worksrc; fi
cd "$work"

# Find all files, excluding lock files and cache, sorted deterministically
# Cache file sizes for later use
find . -type f ! -name '*.lock' ! -path './.cache/*' -print0 | \
	xargs -0 -P $(nproc) -I {} sh -c 'f="{}"; echo "$f|$(stat -c%s "$f")"' | \
	sed 's|^\./||' | LC_ALL=C sort > /tmp/files_with_size.list

# Extract just the file paths for processing
cut -d'|' -f1 < /tmp/files_with_size.list > /tmp/files.list

# Initialize JSON array for manifest layers
layers_json=""

# get_file_size: Retrieve cached file size
get_file_size() {
	grep -F "$1|" /tmp/files_with_size.list 2>/dev/null | cut -d'|' -f2 | head -n1
}

# append_layer: Add a file as a layer blob
# Args: file path, media type
append_layer() {
	file="$1"; mt="$2"
	[ ! -f "$file" ] && return 0
	dgst=$(sha256sum "$file" | cut -d' ' -f1)
	size=$(stat -c%s "$file")
	mv "$file" /layout/blobs/sha256/$dgst
	[ -n "$layers_json" ] && layers_json="$layers_json , "
	layers_json="${layers_json}{ \"mediaType\": \"$mt\", \"digest\": \"sha256:$dgst\", \"size\": $size }"
}

# Process files according to pack mode
case "$PACK_MODE" in
	raw)
		# Raw mode: each file becomes its own layer
		while IFS= read -r f; do
			cp "$f" "/tmp/$(basename "$f")"
			append_layer "/tmp/$(basename "$f")" "__RAW_MEDIA_TYPE__"
		done < /tmp/files.list ;;
	tar|tar+gzip|tar+zstd)
		# Archive mode: bundle all files into single tar
		tarFile=/tmp/allfiles.tar
		tar -cf "$tarFile" -T /tmp/files.list || true
		case "$PACK_MODE" in
			tar) outFile="$tarFile"; mt="__TAR_MEDIA_TYPE__" ;;
			tar+gzip) gzip -n "$tarFile"; outFile="$tarFile.gz"; mt="__TAR_GZIP_MEDIA_TYPE__" ;;
			tar+zstd) zstd -q --no-progress "$tarFile"; outFile="$tarFile.zst"; mt="__TAR_ZSTD_MEDIA_TYPE__" ;;
		esac
		append_layer "$outFile" "$mt" ;;
	*) echo "unknown PACK_MODE $PACK_MODE" >&2; exit 1 ;;
esac

# Create empty config blob
printf '{}' > /tmp/config.json
cfg_dgst=$(sha256sum /tmp/config.json | awk '{print $1}')
cfg_size=$(stat -c%s /tmp/config.json)
cp /tmp/config.json /layout/blobs/sha256/$cfg_dgst

# Generate OCI manifest
manifest="{ \"schemaVersion\": 2, \"mediaType\": \"application/vnd.oci.image.manifest.v1+json\", \"artifactType\": \"__ARTIFACT_TYPE__\", \"config\": {\"mediaType\": \"application/vnd.oci.empty.v1+json\", \"digest\": \"sha256:$cfg_dgst\", \"size\": $cfg_size}, \"layers\": [ $layers_json ] }"
printf '%s' "$manifest" > /tmp/manifest.json

# Add manifest as blob
m_dgst=$(sha256sum /tmp/manifest.json | awk '{print $1}')
m_size=$(stat -c%s /tmp/manifest.json)
cp /tmp/manifest.json /layout/blobs/sha256/$m_dgst

# Create OCI index pointing to manifest
cat > /layout/index.json <<EOF
{ "schemaVersion": 2, "mediaType": "application/vnd.oci.image.index.v1+json", "manifests": [ { "mediaType": "application/vnd.oci.image.manifest.v1+json", "digest": "sha256:$m_dgst", "size": $m_size, "annotations": { "org.opencontainers.image.title": "__NAME__", "org.opencontainers.image.ref.name": "__REF_NAME__" } } ] }
EOF

# Create OCI layout version marker
cat > /layout/oci-layout <<EOF
{ "imageLayoutVersion": "1.0.0" }
EOF
"##;

/// Render the generic assembler script for one build. Raw mode emits
/// octet-stream layers; archive modes use the OCI image-layer media type
/// matching the compression.
pub fn generate_generic_script(
    pack_mode: PackMode,
    artifact_type: &str,
    name: &str,
    ref_name: &str,
    debug: bool,
) -> String {
    let raw_media_type = if pack_mode == PackMode::Raw {
        oci::MEDIA_TYPE_OCTET_STREAM
    } else {
        oci::MEDIA_TYPE_IMAGE_LAYER
    };
    fill(
        GENERIC_TEMPLATE,
        &[
            ("__DEBUG__", debug_line(debug)),
            ("__PACK_MODE__", pack_mode.as_str()),
            ("__RAW_MEDIA_TYPE__", raw_media_type),
            ("__TAR_MEDIA_TYPE__", oci::MEDIA_TYPE_IMAGE_LAYER),
            ("__TAR_GZIP_MEDIA_TYPE__", oci::MEDIA_TYPE_IMAGE_LAYER_GZIP),
            ("__TAR_ZSTD_MEDIA_TYPE__", oci::MEDIA_TYPE_IMAGE_LAYER_ZSTD),
            ("__ARTIFACT_TYPE__", artifact_type),
            ("__NAME__", name),
            ("__REF_NAME__", ref_name),
        ],
    )
}
