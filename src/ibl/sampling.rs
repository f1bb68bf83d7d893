//! Low-discrepancy sampling helpers.
//!
//! Progressive accumulation draws consecutive windows of one Halton (2, 3)
//! sequence: frame `k` uses indices `k * per_frame .. (k + 1) * per_frame` out
//! of `total`, so the union over all frames is the full sequence. Every
//! window of a Halton sequence covers the whole square, which keeps
//! intermediate results unbiased in azimuth. One-shot integrals with a known
//! point count use the Hammersley set.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

/// Van der Corput radical inverse in base 2.
#[inline]
#[must_use]
pub fn radical_inverse_vdc(mut bits: u32) -> f32 {
    bits = bits.rotate_right(16);
    bits = ((bits & 0x5555_5555) << 1) | ((bits & 0xAAAA_AAAA) >> 1);
    bits = ((bits & 0x3333_3333) << 2) | ((bits & 0xCCCC_CCCC) >> 2);
    bits = ((bits & 0x0F0F_0F0F) << 4) | ((bits & 0xF0F0_F0F0) >> 4);
    bits = ((bits & 0x00FF_00FF) << 8) | ((bits & 0xFF00_FF00) >> 8);
    bits as f32 * 2.328_306_4e-10
}

/// Radical inverse of `i` in an arbitrary `base`.
#[must_use]
pub fn radical_inverse(base: u32, mut i: u32) -> f32 {
    let base = base.max(2);
    let inv_base = 1.0 / f64::from(base);
    let mut digit_weight = inv_base;
    let mut result = 0.0;
    while i > 0 {
        result += f64::from(i % base) * digit_weight;
        i /= base;
        digit_weight *= inv_base;
    }
    result as f32
}

/// Point `i` of the Halton (3, 2) sequence: base 3 drives the azimuth.
#[inline]
#[must_use]
pub fn halton(i: u32) -> Vec2 {
    Vec2::new(radical_inverse(3, i), radical_inverse_vdc(i))
}

/// Point `i` of an `n`-point Hammersley set.
#[inline]
#[must_use]
pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n.max(1) as f32, radical_inverse_vdc(i))
}

/// Indices of the sample window used by accumulation step `sample_offset`.
#[must_use]
pub fn sample_window(sample_offset: u32, samples_per_frame: u32, total: u32) -> std::ops::Range<u32> {
    let start = sample_offset.saturating_mul(samples_per_frame).min(total);
    let end = start.saturating_add(samples_per_frame).min(total);
    start..end
}

/// Orthonormal basis with `n` as the third axis.
#[must_use]
pub fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let up = if n.z.abs() < 0.999 { Vec3::Z } else { Vec3::X };
    let tangent = up.cross(n).normalize();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

/// Cosine-weighted hemisphere direction around `n`.
#[must_use]
pub fn cosine_sample_hemisphere(xi: Vec2, n: Vec3) -> Vec3 {
    let phi = 2.0 * PI * xi.x;
    let cos_theta = (1.0 - xi.y).sqrt();
    let sin_theta = xi.y.sqrt();
    let (tangent, bitangent) = tangent_frame(n);
    (tangent * (phi.cos() * sin_theta) + bitangent * (phi.sin() * sin_theta) + n * cos_theta).normalize()
}

/// GGX half vector around `n` for perceptual `roughness`.
#[must_use]
pub fn importance_sample_ggx(xi: Vec2, n: Vec3, roughness: f32) -> Vec3 {
    let a = roughness * roughness;
    let phi = 2.0 * PI * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (a * a - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let (tangent, bitangent) = tangent_frame(n);
    (tangent * (phi.cos() * sin_theta) + bitangent * (phi.sin() * sin_theta) + n * cos_theta).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radical_inverse_first_terms() {
        assert_eq!(radical_inverse_vdc(0), 0.0);
        assert!((radical_inverse_vdc(1) - 0.5).abs() < 1e-7);
        assert!((radical_inverse_vdc(2) - 0.25).abs() < 1e-7);
        assert!((radical_inverse_vdc(3) - 0.75).abs() < 1e-7);
    }

    #[test]
    fn test_radical_inverse_base_three() {
        assert_eq!(radical_inverse(3, 0), 0.0);
        assert!((radical_inverse(3, 1) - 1.0 / 3.0).abs() < 1e-7);
        assert!((radical_inverse(3, 2) - 2.0 / 3.0).abs() < 1e-7);
        assert!((radical_inverse(3, 3) - 1.0 / 9.0).abs() < 1e-7);
        assert!((radical_inverse(2, 3) - radical_inverse_vdc(3)).abs() < 1e-7);
    }

    #[test]
    fn test_every_halton_window_spans_all_azimuths() {
        // Each window of 64 must put points in all 8 azimuth octants.
        for offset in 0..16 {
            let mut octants = [false; 8];
            for i in sample_window(offset, 64, 1024) {
                let x = halton(i).x;
                assert!((0.0..1.0).contains(&x));
                octants[((x * 8.0) as usize).min(7)] = true;
            }
            assert!(octants.iter().all(|&hit| hit), "window {offset}: {octants:?}");
        }
    }

    #[test]
    fn test_sample_windows_tile_the_sequence() {
        assert_eq!(sample_window(0, 64, 100), 0..64);
        assert_eq!(sample_window(1, 64, 100), 64..100);
        assert_eq!(sample_window(2, 64, 100), 100..100);
    }

    #[test]
    fn test_samples_stay_in_hemisphere() {
        let n = Vec3::new(0.3, 0.8, -0.2).normalize();
        for i in 0..32 {
            let xi = hammersley(i, 32);
            assert!(cosine_sample_hemisphere(xi, n).dot(n) >= -1e-5);
            assert!(importance_sample_ggx(xi, n, 0.5).dot(n) >= -1e-5);
        }
    }
}
