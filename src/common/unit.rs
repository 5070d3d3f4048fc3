//! Unit conversion utilities.
//!
//! DrawingML measures every length in English Metric Units (EMU). Font sizes
//! are stored in hundredths of a point and spacing in hundredths of a point
//! as well; these helpers keep the conversions in one place.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_CM: i64 = 360_000;
pub const EMUS_PER_PT: i64 = 12_700;

/// Points per inch.
pub const PTS_PER_INCH: f64 = 72.0;

#[inline]
pub fn pt_to_emu_f64(pt: f64) -> i64 {
    (pt * EMUS_PER_PT as f64) as i64
}

#[inline]
pub fn emu_to_pt_f64(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_PT as f64
}

#[inline]
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_INCH as f64
}

#[inline]
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMUS_PER_INCH as f64).round() as i64
}

/// Convert points to the centipoint integers used by `sz` and `spcPts`.
#[inline]
pub fn pt_to_centipoints(pt: f64) -> i64 {
    (pt * 100.0).round() as i64
}

#[inline]
pub fn centipoints_to_pt(value: i64) -> f64 {
    value as f64 / 100.0
}

/// Left margin of a bulleted paragraph: `size * (1.6 + level * 1.6)` points.
#[inline]
pub fn bullet_margin_emu(font_size_pt: f64, level: u32) -> i64 {
    pt_to_emu_f64(font_size_pt * (1.6 + level as f64 * 1.6))
}

/// Hanging indent of a bulleted paragraph: `-size * 0.8` points.
#[inline]
pub fn bullet_hanging_indent_emu(font_size_pt: f64) -> i64 {
    pt_to_emu_f64(-font_size_pt * 0.8)
}
