//! Layout assembler script generation. The templates are verbatim shell —
//! interoperability with the builder container's shell environment is the
//! contract, so they are filled by plain marker substitution rather than
//! being assembled from any structured representation.

pub mod generic;
pub mod modelpack;

/// Replace `__MARKER__` tokens in a template. Markers never collide with
/// shell syntax, so the surrounding script text stays untouched.
pub(crate) fn fill(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (marker, value) in substitutions {
        out = out.replace(marker, value);
    }
    out
}

/// Shell tracing line injected when the debug option is set.
pub(crate) fn debug_line(debug: bool) -> &'static str {
    if debug {
        "set -x"
    } else {
        ""
    }
}
