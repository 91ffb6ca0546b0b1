//! Chart geometry: numeric series → renderable primitives.
//!
//! Pure functions, no graphics dependencies. Angles are degrees measured
//! clockwise from 12 o'clock (0° = up), matching the reference rendering —
//! [`polar_to_planar`] must keep that convention exactly. Degenerate input
//! (zero totals, zero maxima) produces zero-extent output, never a panic or
//! a division by zero.

/// One pie slice. Angles in degrees; `color_index` is the slice's position
/// in the input, for palette lookup (mod the palette length).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSlice {
    pub value: f64,
    pub start_angle_deg: f64,
    pub sweep_angle_deg: f64,
    pub color_index: usize,
}

/// Sign class of a signed-magnitude bar. Picks the color class, never the
/// extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    Positive,
    Negative,
}

/// One signed-magnitude bar: the raw value, its rendered extent in [0, 1],
/// and its sign class.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedBar {
    pub value: f64,
    pub extent: f64,
    pub contribution: Contribution,
}

/// Magnitude floor for signed bars: near-zero entries render at least this
/// large on the natural scale so they stay visually distinguishable.
pub const MIN_VISIBLE_MAGNITUDE: f64 = 0.5;

/// Decompose non-negative values into consecutive pie slices.
///
/// Each sweep is `360° × value/total`, laid out from 0° in input order with
/// no gaps or overlaps. A total ≤ 0 yields zero-sized slices for every
/// entry.
pub fn pie_slices(values: &[f64]) -> Vec<ChartSlice> {
    let total: f64 = values.iter().sum();
    let mut cursor = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let sweep = if total > 0.0 {
                360.0 * value / total
            } else {
                0.0
            };
            let slice = ChartSlice {
                value,
                start_angle_deg: cursor,
                sweep_angle_deg: sweep,
                color_index: i,
            };
            cursor += sweep;
            slice
        })
        .collect()
}

/// Map polar coordinates to the plane: 0° points up, angles grow clockwise.
///
/// `(x, y) = (cx + r·sin θ, cy − r·cos θ)`.
pub fn polar_to_planar(cx: f64, cy: f64, radius: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (cx + radius * rad.sin(), cy - radius * rad.cos())
}

/// SVG path for a filled pie wedge from `start_deg` sweeping `sweep_deg`
/// clockwise. The large-arc flag is set for sweeps over 180°.
pub fn wedge_path(cx: f64, cy: f64, radius: f64, start_deg: f64, sweep_deg: f64) -> String {
    let end_deg = start_deg + sweep_deg;
    let (ax, ay) = polar_to_planar(cx, cy, radius, end_deg);
    let (bx, by) = polar_to_planar(cx, cy, radius, start_deg);
    let large_arc = i32::from(sweep_deg > 180.0);
    format!("M {cx} {cy} L {ax} {ay} A {radius} {radius} 0 {large_arc} 0 {bx} {by} Z")
}

/// Proportional bar extents in [0, 1]: each bar is `value/max` of the unit
/// extent. `max` is inferred from the series when `None`. A max ≤ 0 (or an
/// empty series) yields all-zero extents.
pub fn bar_extents(values: &[f64], max: Option<f64>) -> Vec<f64> {
    let max = max.unwrap_or_else(|| values.iter().copied().fold(f64::MIN, f64::max));
    values
        .iter()
        .map(|&v| if max > 0.0 { v / max } else { 0.0 })
        .collect()
}

/// Signed-magnitude bars: extent from `|value|`, color class from the sign.
///
/// Magnitudes (and the scale maximum) are floored at
/// [`MIN_VISIBLE_MAGNITUDE`] so low-magnitude entries stay visible. When
/// every magnitude is zero the series is degenerate and all extents are 0.
pub fn signed_bars(values: &[f64]) -> Vec<SignedBar> {
    let max_abs = values.iter().map(|v| v.abs()).fold(0.0, f64::max);
    values
        .iter()
        .map(|&value| {
            let extent = if max_abs > 0.0 {
                value.abs().max(MIN_VISIBLE_MAGNITUDE) / max_abs.max(MIN_VISIBLE_MAGNITUDE)
            } else {
                0.0
            };
            let contribution = if value < 0.0 {
                Contribution::Negative
            } else {
                Contribution::Positive
            };
            SignedBar {
                value,
                extent,
                contribution,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sweeps(slices: &[ChartSlice]) -> Vec<f64> {
        slices.iter().map(|s| s.sweep_angle_deg).collect()
    }

    #[test]
    fn pie_shares_of_total() {
        let slices = pie_slices(&[1.0, 1.0, 2.0]);
        let s = sweeps(&slices);
        assert!((s[0] - 90.0).abs() < EPS);
        assert!((s[1] - 90.0).abs() < EPS);
        assert!((s[2] - 180.0).abs() < EPS);
        assert!((s.iter().sum::<f64>() - 360.0).abs() < EPS);
    }

    #[test]
    fn pie_slices_are_consecutive() {
        let slices = pie_slices(&[3.0, 1.0]);
        assert!((slices[0].start_angle_deg - 0.0).abs() < EPS);
        assert!(
            (slices[1].start_angle_deg - (slices[0].start_angle_deg + slices[0].sweep_angle_deg))
                .abs()
                < EPS
        );
        assert_eq!(slices[0].color_index, 0);
        assert_eq!(slices[1].color_index, 1);
    }

    #[test]
    fn pie_zero_total_is_degenerate() {
        let slices = pie_slices(&[0.0, 0.0, 0.0]);
        assert_eq!(sweeps(&slices), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn pie_empty_input() {
        assert!(pie_slices(&[]).is_empty());
    }

    #[test]
    fn polar_convention_is_clock_face() {
        let (x, y) = polar_to_planar(0.0, 0.0, 10.0, 0.0);
        assert!(x.abs() < EPS);
        assert!((y - (-10.0)).abs() < EPS);

        let (x, y) = polar_to_planar(0.0, 0.0, 10.0, 90.0);
        assert!((x - 10.0).abs() < EPS);
        assert!(y.abs() < EPS);

        let (x, y) = polar_to_planar(0.0, 0.0, 10.0, 180.0);
        assert!(x.abs() < EPS);
        assert!((y - 10.0).abs() < EPS);

        let (x, y) = polar_to_planar(50.0, 50.0, 10.0, 270.0);
        assert!((x - 40.0).abs() < EPS);
        assert!((y - 50.0).abs() < EPS);
    }

    #[test]
    fn wedge_path_large_arc_flag() {
        let small = wedge_path(100.0, 100.0, 80.0, 0.0, 90.0);
        assert!(small.contains(" 0 0 "), "small sweep uses flag 0: {small}");

        let large = wedge_path(100.0, 100.0, 80.0, 0.0, 270.0);
        assert!(large.contains(" 1 0 "), "large sweep uses flag 1: {large}");

        assert!(small.starts_with("M 100 100 L "));
        assert!(small.ends_with(" Z"));
    }

    #[test]
    fn bars_scale_against_max() {
        assert_eq!(bar_extents(&[1.0, 2.0, 4.0], None), vec![0.25, 0.5, 1.0]);
        assert_eq!(bar_extents(&[5.0], Some(10.0)), vec![0.5]);
    }

    #[test]
    fn bars_zero_max_is_degenerate() {
        assert_eq!(bar_extents(&[1.0, 2.0], Some(0.0)), vec![0.0, 0.0]);
        assert_eq!(bar_extents(&[0.0, 0.0], None), vec![0.0, 0.0]);
        assert!(bar_extents(&[], None).is_empty());
    }

    #[test]
    fn signed_bars_magnitude_and_sign() {
        let bars = signed_bars(&[2.0, -1.0]);
        assert_eq!(bars[0].extent, 1.0);
        assert_eq!(bars[0].contribution, Contribution::Positive);
        assert_eq!(bars[1].extent, 0.5);
        assert_eq!(bars[1].contribution, Contribution::Negative);
    }

    #[test]
    fn signed_bars_floor_near_zero_values() {
        let bars = signed_bars(&[2.0, 0.01]);
        // 0.01 is floored to 0.5 of the natural scale, not rendered at 0.005.
        assert_eq!(bars[1].extent, MIN_VISIBLE_MAGNITUDE / 2.0);
        assert!(bars[1].extent >= 0.25);
    }

    #[test]
    fn signed_bars_all_zero_is_degenerate() {
        let bars = signed_bars(&[0.0, 0.0]);
        assert!(bars.iter().all(|b| b.extent == 0.0));
    }

    #[test]
    fn signed_bars_sign_never_changes_extent() {
        let pos = signed_bars(&[3.0, 1.5]);
        let neg = signed_bars(&[-3.0, -1.5]);
        assert_eq!(pos[0].extent, neg[0].extent);
        assert_eq!(pos[1].extent, neg[1].extent);
    }
}
