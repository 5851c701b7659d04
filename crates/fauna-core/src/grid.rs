//! Bilinear sample/splat primitives shared by every grid-backed field
//! (`ResourceField`, `PotentialField`, `FlowField`, `ShadowMap`). All grids in
//! this crate are toroidal: indices wrap rather than clamp.

/// Bilinear-sample a row-major `width x height` grid at continuous
/// coordinates `(x, y)` measured in grid cells, wrapping toroidally.
pub fn bilinear_sample(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let w = width as f64;
    let h = height as f64;
    let x = x.rem_euclid(w);
    let y = y.rem_euclid(h);
    let x0 = x.floor() as usize % width;
    let y0 = y.floor() as usize % height;
    let x1 = (x0 + 1) % width;
    let y1 = (y0 + 1) % height;
    let fx = (x - x.floor()) as f32;
    let fy = (y - y.floor()) as f32;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    let top = v00 * (1.0 - fx) + v10 * fx;
    let bottom = v01 * (1.0 - fx) + v11 * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Distribute `amount` into the 2x2 neighborhood of `(x, y)` by bilinear
/// weights, wrapping toroidally, via `accept`. `accept(index, weighted_amount)
/// -> actually_accepted` lets the caller apply a per-cell capacity; the
/// total actually deposited is returned.
pub fn bilinear_splat(
    width: usize,
    height: usize,
    x: f64,
    y: f64,
    amount: f32,
    mut accept: impl FnMut(usize, f32) -> f32,
) -> f32 {
    let w = width as f64;
    let h = height as f64;
    let x = x.rem_euclid(w);
    let y = y.rem_euclid(h);
    let x0 = x.floor() as usize % width;
    let y0 = y.floor() as usize % height;
    let x1 = (x0 + 1) % width;
    let y1 = (y0 + 1) % height;
    let fx = (x - x.floor()) as f32;
    let fy = (y - y.floor()) as f32;

    let weights = [
        (y0 * width + x0, (1.0 - fx) * (1.0 - fy)),
        (y0 * width + x1, fx * (1.0 - fy)),
        (y1 * width + x0, (1.0 - fx) * fy),
        (y1 * width + x1, fx * fy),
    ];

    let mut total = 0.0f32;
    for (idx, weight) in weights {
        total += accept(idx, amount * weight);
    }
    total
}

/// A tent-kernel weight for the `graze` operation: 1.0 at the center,
/// linearly falling to 0.0 at `radius + 1` cells out.
pub fn tent_weight(dist_cells: f64, radius: f64) -> f32 {
    (1.0 - (dist_cells / (radius + 1.0))).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_sample_is_exact_on_grid_points() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(bilinear_sample(&data, 2, 2, 0.0, 0.0), 1.0);
        assert_eq!(bilinear_sample(&data, 2, 2, 1.0, 0.0), 2.0);
    }

    #[test]
    fn bilinear_sample_wraps() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let at_zero = bilinear_sample(&data, 2, 2, 0.0, 0.0);
        let at_width = bilinear_sample(&data, 2, 2, 2.0, 0.0);
        assert_eq!(at_zero, at_width);
    }

    #[test]
    fn bilinear_splat_conserves_mass_with_unbounded_capacity() {
        let total = bilinear_splat(4, 4, 1.3, 2.7, 10.0, |_idx, w| w);
        assert!((total - 10.0).abs() < 1e-4);
    }

    #[test]
    fn bilinear_splat_respects_partial_capacity() {
        let total = bilinear_splat(4, 4, 0.0, 0.0, 10.0, |idx, w| if idx == 0 { 0.0 } else { w });
        assert!(total < 10.0);
    }
}
