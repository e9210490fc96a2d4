//! Text rendering utilities

use crate::TextDraw;

/// Compute the text matrix for a scaled, rotated run of text
///
/// Rotation is given in degrees clockwise as seen on screen, which is a
/// negative angle in PDF user space (y axis pointing up).
///
/// # Returns
/// The six `Tm` operands `[a b c d e f]`
pub fn text_matrix(x: f64, y: f64, x_scale: f64, y_scale: f64, rotate: f64) -> [f64; 6] {
    let theta = (-rotate).to_radians();
    let (sin, cos) = theta.sin_cos();
    [
        x_scale * cos,
        x_scale * sin,
        -y_scale * sin,
        y_scale * cos,
        x,
        y,
    ]
}

/// Generate PDF operators for text insertion
///
/// Creates the text operators (BT, rg, Tf, Tm, Tj, ET) to render an already
/// encoded string with the placement in `draw`.
///
/// # Arguments
/// * `text_hex` - Hex-encoded text (e.g., "<0041004200>")
/// * `font_resource` - Font resource name on the page (e.g., "F1")
/// * `draw` - Position, size, color, scale and rotation
pub fn generate_text_operators(text_hex: &str, font_resource: &str, draw: &TextDraw) -> Vec<u8> {
    let mut ops = String::new();
    let (r, g, b) = draw.color.components();
    let matrix = text_matrix(draw.x, draw.y, draw.x_scale, draw.y_scale, draw.rotate);

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        format_number(r),
        format_number(g),
        format_number(b)
    ));
    ops.push_str(&format!(
        "/{} {} Tf\n",
        font_resource,
        format_number(draw.size)
    ));
    let operands: Vec<String> = matrix.iter().map(|&v| format_number(v)).collect();
    ops.push_str(&format!("{} Tm\n", operands.join(" ")));
    ops.push_str(&format!("{text_hex} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Format a number for a content stream, rounded to 4 decimal places
pub(crate) fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        // Also folds negative zero
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}
