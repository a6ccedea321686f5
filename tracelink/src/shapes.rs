//! Text rendering for captured argument shapes
//!
//! Shape lists travel structured on [`CapturedEvent`](crate::CapturedEvent)s;
//! backend-facing activities carry the rendered form produced here.

use std::fmt::Write as _;

/// Render a list of tensor shapes as nested bracketed text.
///
/// Two tensors of shape `[2, 3]` and `[4]` render as `[[2, 3], [4]]`; an
/// empty list renders as `[]`.
#[must_use]
pub fn format_shapes(shapes: &[Vec<i64>]) -> String {
    let mut out = String::from("[");
    for (t_idx, dims) in shapes.iter().enumerate() {
        if t_idx > 0 {
            out.push_str(", ");
        }
        out.push('[');
        for (s_idx, dim) in dims.iter().enumerate() {
            if s_idx > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{dim}");
        }
        out.push(']');
    }
    out.push(']');
    out
}
