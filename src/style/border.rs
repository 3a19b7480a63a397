//! Image borders.
//!
//! Pictures embedded in runs (`w:drawing`, placed inline or anchored) get
//! a solid black outline on their shape properties. Existing outlines are
//! removed first, so repeated application leaves exactly one.

use crate::xml::{ns, Element};

/// Line widths are stored in EMUs: 12700 per point.
pub const EMU_PER_POINT: f64 = 12700.0;

/// Shape property children that must follow `a:ln`.
const AFTER_LINE: &[&str] = &["effectLst", "effectDag", "scene3d", "sp3d", "extLst"];

/// Convert a width in points to EMUs.
pub fn border_width_emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round() as i64
}

/// Border every picture inside `run`. Returns the number of pictures
/// bordered; pictures without shape properties are left alone.
pub fn add_image_borders(run: &mut Element, border_pt: f64) -> usize {
    let width = border_width_emu(border_pt).to_string();
    let mut bordered = 0;

    run.visit_mut(&|e| e.is(ns::W, "drawing"), &mut |drawing| {
        drawing.visit_mut(
            &|e| e.is(ns::WP, "inline") || e.is(ns::WP, "anchor"),
            &mut |container| {
                if let Some(shape_properties) = container.find_mut(ns::PIC, "spPr") {
                    set_outline(shape_properties, &width);
                    bordered += 1;
                }
            },
        );
    });

    bordered
}

fn set_outline(shape_properties: &mut Element, width: &str) {
    shape_properties.remove_children(ns::A, "ln");

    let mut line = shape_properties.create_child(ns::A, "ln");
    line.set_attribute("w", width);

    let mut fill = line.create_child(ns::A, "solidFill");
    let mut color = fill.create_child(ns::A, "srgbClr");
    color.set_attribute("val", "000000");
    fill.push(color);
    line.push(fill);

    let mut dash = line.create_child(ns::A, "prstDash");
    dash.set_attribute("val", "solid");
    line.push(dash);

    shape_properties.insert_before(line, |e| {
        e.namespace() == Some(ns::A) && AFTER_LINE.contains(&e.local_name())
    });
}
