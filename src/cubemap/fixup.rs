//! Cubemap edge fixup.
//!
//! Filtering each face of a cubemap independently leaves visible seams where
//! faces meet. This pass, run on every mip level:
//!
//! 1. collapses a 1x1 cubemap to the mean of its six faces,
//! 2. averages the three texels meeting at each of the 8 cube corners,
//! 3. averages the paired boundary texels along each of the 12 cube edges and
//!    feathers the change over the `fixup_width` interior texels behind the
//!    boundary on both faces.
//!
//! The feathering stops short of the face midpoint, so on small mips it covers
//! fewer than `fixup_width` texels and never touches another edge.

use serde::{Deserialize, Serialize};

use super::image::{Channel, CubeImage, PixelBox};
use super::topology::{CubeFace, CubeTopology};

/// How the correction applied on an edge fades into the face interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FixupType {
    /// Leave the cubemap untouched.
    None,
    /// Lerp interior texels toward the edge average, linear falloff.
    AverageLinear,
    /// Lerp interior texels toward the edge average, smoothstep falloff.
    AverageHermite,
    /// Shift interior texels by the edge delta, linear falloff.
    PullLinear,
    /// Shift interior texels by the edge delta, smoothstep falloff.
    #[default]
    PullHermite,
}

impl FixupType {
    fn weight(self, frac: f32) -> f32 {
        match self {
            FixupType::AverageHermite | FixupType::PullHermite => (-2.0 * frac + 3.0) * frac * frac,
            _ => frac,
        }
    }

    fn is_average(self) -> bool {
        matches!(self, FixupType::AverageLinear | FixupType::AverageHermite)
    }
}

/// Hides face seams on every mip level of `image`.
///
/// A no-op for [`FixupType::None`] or a zero `fixup_width`.
pub fn fixup_cube_edges<T: Channel>(image: &mut CubeImage<T>, fixup: FixupType, fixup_width: u32) {
    if fixup == FixupType::None || fixup_width == 0 {
        return;
    }
    for mip in 0..image.mip_levels() {
        fixup_mip(image, mip, fixup, fixup_width);
    }
}

fn fixup_mip<T: Channel>(image: &mut CubeImage<T>, mip: u32, fixup: FixupType, fixup_width: u32) {
    let size = image.mip_size(mip);
    let channels = image.channels();
    let boxes: [PixelBox; 6] = CubeFace::ALL.map(|face| image.pixel_box(face, mip));
    let data = image.data_mut();

    if size == 1 {
        for c in 0..channels {
            let sum: f32 = boxes.iter().map(|b| data[b.index(0, 0, channels, c)].to_f32()).sum();
            let mean = T::from_f32(sum / 6.0);
            for b in &boxes {
                data[b.index(0, 0, channels, c)] = mean;
            }
        }
        return;
    }

    let topology = CubeTopology::get();

    for corner in topology.corners() {
        let taps = corner.taps.map(|(face, face_corner)| {
            let (x, y) = face_corner.texel(size);
            boxes[face.index()].index(x, y, channels, 0)
        });
        for c in 0..channels as usize {
            let sum: f32 = taps.iter().map(|&idx| data[idx + c].to_f32()).sum();
            let mean = T::from_f32(sum / 3.0);
            for &idx in &taps {
                data[idx + c] = mean;
            }
        }
    }

    // Interior texels strictly before the midpoint.
    let fixup_dist = fixup_width.min((size / 2).saturating_sub(1));

    for edge in topology.edges() {
        let face_box = boxes[edge.face.index()];
        let neighbor_box = boxes[edge.neighbor_face.index()];
        let (in_x, in_y) = edge.edge.inward();
        let (nbr_in_x, nbr_in_y) = edge.neighbor_edge.inward();

        // Corner texels were settled above.
        for i in 1..size - 1 {
            let j = if edge.reversed { size - 1 - i } else { i };
            let (x, y) = edge.edge.texel(i, size);
            let (nx, ny) = edge.neighbor_edge.texel(j, size);

            for c in 0..channels {
                let tap_idx = face_box.index(x, y, channels, c);
                let nbr_idx = neighbor_box.index(nx, ny, channels, c);

                let tap = data[tap_idx].to_f32();
                let nbr = data[nbr_idx].to_f32();
                let avg = 0.5 * (tap + nbr);
                data[tap_idx] = T::from_f32(avg);
                data[nbr_idx] = T::from_f32(avg);

                let tap_dev = tap - avg;
                let nbr_dev = nbr - avg;

                for step in 1..=fixup_dist {
                    let frac = (fixup_dist + 1 - step) as f32 / (fixup_dist + 1) as f32;
                    let weight = fixup.weight(frac);
                    let step = step as i32;

                    let inner_idx = face_box.index(
                        (x as i32 + in_x * step) as u32,
                        (y as i32 + in_y * step) as u32,
                        channels,
                        c,
                    );
                    let nbr_inner_idx = neighbor_box.index(
                        (nx as i32 + nbr_in_x * step) as u32,
                        (ny as i32 + nbr_in_y * step) as u32,
                        channels,
                        c,
                    );

                    let inner = data[inner_idx].to_f32();
                    let nbr_inner = data[nbr_inner_idx].to_f32();
                    let (inner_dev, nbr_inner_dev) = if fixup.is_average() {
                        (inner - avg, nbr_inner - avg)
                    } else {
                        (tap_dev, nbr_dev)
                    };

                    data[inner_idx] = T::from_f32(inner - weight * inner_dev);
                    data[nbr_inner_idx] = T::from_f32(nbr_inner - weight * nbr_inner_dev);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hermite_weight_endpoints() {
        assert_eq!(FixupType::PullHermite.weight(0.0), 0.0);
        assert_eq!(FixupType::PullHermite.weight(1.0), 1.0);
        assert!((FixupType::AverageHermite.weight(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(FixupType::PullLinear.weight(0.25), 0.25);
    }

    #[test]
    fn test_pull_shifts_interior_by_edge_delta() {
        // +X is 1.0, everything else 0.0: every +X edge texel averages to 0.5.
        let mut image = CubeImage::<f32>::from_fn(16, 1, 1, |face, _, _, _, _| {
            if face == CubeFace::PositiveX { 1.0 } else { 0.0 }
        })
        .unwrap();
        fixup_cube_edges(&mut image, FixupType::PullLinear, 4);

        // Left edge of +X at row 8: texels 1..=4 shifted by 0.5 * (5 - k) / 5.
        for k in 1..=4u32 {
            let inner = image.texel(CubeFace::PositiveX, 0, k, 8, 0);
            let expected = 1.0 - 0.5 * (5 - k) as f32 / 5.0;
            assert!((inner - expected).abs() < 1e-6, "texel {k}: {inner}");
        }
        assert_eq!(image.texel(CubeFace::PositiveX, 0, 5, 8, 0), 1.0);
        // Centre of the face is untouched.
        assert_eq!(image.texel(CubeFace::PositiveX, 0, 8, 8, 0), 1.0);
    }
}
