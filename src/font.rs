use crate::types::Pt;

/// AFM advance widths (1/1000 em) for the printable ASCII range of the two
/// base-14 faces the sheet renderer uses. Characters outside the table fall
/// back to the tabular figure width.
const FIRST_CHAR: u32 = 0x20;
const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn width_table(font_name: &str) -> &'static [u16; 95] {
    if font_name.eq_ignore_ascii_case("helvetica-bold") {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    }
}

fn glyph_width_units(font_name: &str, ch: char) -> u16 {
    let code = ch as u32;
    if (FIRST_CHAR..FIRST_CHAR + 95).contains(&code) {
        width_table(font_name)[(code - FIRST_CHAR) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Advance width of `text` set in `font_name` at `font_size`.
pub(crate) fn measure_text_width(font_name: &str, font_size: Pt, text: &str) -> Pt {
    let mut units: i64 = 0;
    for ch in text.chars() {
        units += glyph_width_units(font_name, ch) as i64;
    }
    let units = units.clamp(0, i32::MAX as i64) as i32;
    font_size * units / 1000
}
