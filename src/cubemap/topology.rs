//! Cube face adjacency.
//!
//! Face orientation follows the D3D cubemap convention. A texel at face
//! coordinates `(s, t)` in `[-1, 1]` (`s` grows right, `t` grows down) looks
//! along:
//!
//! | Face | Direction       |
//! |------|-----------------|
//! | +X   | `( 1, -t, -s)`  |
//! | -X   | `(-1, -t,  s)`  |
//! | +Y   | `( s,  1,  t)`  |
//! | -Y   | `( s, -1, -t)`  |
//! | +Z   | `( s, -t,  1)`  |
//! | -Z   | `(-s, -t, -1)`  |
//!
//! Edge pairings, walk reversal and corner triples are derived from this
//! mapping on first use: two face edges are the same cube edge when their end
//! points coincide in 3D, and the neighbor walk runs backwards when the start
//! of one edge is the end of the other.

use std::sync::LazyLock;

use glam::{IVec3, Vec3};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unnormalized direction through face coordinates `(s, t)`.
    #[must_use]
    pub fn direction(self, s: f32, t: f32) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::new(1.0, -t, -s),
            CubeFace::NegativeX => Vec3::new(-1.0, -t, s),
            CubeFace::PositiveY => Vec3::new(s, 1.0, t),
            CubeFace::NegativeY => Vec3::new(s, -1.0, -t),
            CubeFace::PositiveZ => Vec3::new(s, -t, 1.0),
            CubeFace::NegativeZ => Vec3::new(-s, -t, -1.0),
        }
    }

    /// Normalized direction through the center of texel `(x, y)` on a face of `size` texels.
    #[must_use]
    pub fn texel_direction(self, x: u32, y: u32, size: u32) -> Vec3 {
        let s = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
        let t = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
        self.direction(s, t).normalize()
    }

    /// Face hit by `direction` and the `(s, t)` coordinates of the hit.
    #[must_use]
    pub fn from_direction(direction: Vec3) -> (CubeFace, f32, f32) {
        let abs = direction.abs();
        if abs.x >= abs.y && abs.x >= abs.z {
            let ma = abs.x.max(f32::MIN_POSITIVE);
            if direction.x > 0.0 {
                (CubeFace::PositiveX, -direction.z / ma, -direction.y / ma)
            } else {
                (CubeFace::NegativeX, direction.z / ma, -direction.y / ma)
            }
        } else if abs.y >= abs.z {
            let ma = abs.y;
            if direction.y > 0.0 {
                (CubeFace::PositiveY, direction.x / ma, direction.z / ma)
            } else {
                (CubeFace::NegativeY, direction.x / ma, -direction.z / ma)
            }
        } else {
            let ma = abs.z;
            if direction.z > 0.0 {
                (CubeFace::PositiveZ, direction.x / ma, -direction.y / ma)
            } else {
                (CubeFace::NegativeZ, -direction.x / ma, -direction.y / ma)
            }
        }
    }

    fn lattice_point(self, s: f32, t: f32) -> IVec3 {
        self.direction(s, t).round().as_ivec3()
    }
}

/// One of the four boundary rows/columns of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceEdge {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

impl FaceEdge {
    pub const ALL: [FaceEdge; 4] = [FaceEdge::Left, FaceEdge::Right, FaceEdge::Top, FaceEdge::Bottom];

    /// Texel `i` along the edge, walking top-to-bottom or left-to-right.
    #[inline]
    #[must_use]
    pub fn texel(self, i: u32, size: u32) -> (u32, u32) {
        match self {
            FaceEdge::Left => (0, i),
            FaceEdge::Right => (size - 1, i),
            FaceEdge::Top => (i, 0),
            FaceEdge::Bottom => (i, size - 1),
        }
    }

    /// Unit step from the edge into the face interior.
    #[inline]
    #[must_use]
    pub fn inward(self) -> (i32, i32) {
        match self {
            FaceEdge::Left => (1, 0),
            FaceEdge::Right => (-1, 0),
            FaceEdge::Top => (0, 1),
            FaceEdge::Bottom => (0, -1),
        }
    }

    /// Face coordinates of the first and last texel of the walk.
    fn endpoints(self) -> ((f32, f32), (f32, f32)) {
        match self {
            FaceEdge::Left => ((-1.0, -1.0), (-1.0, 1.0)),
            FaceEdge::Right => ((1.0, -1.0), (1.0, 1.0)),
            FaceEdge::Top => ((-1.0, -1.0), (1.0, -1.0)),
            FaceEdge::Bottom => ((-1.0, 1.0), (1.0, 1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceCorner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl FaceCorner {
    pub const ALL: [FaceCorner; 4] = [
        FaceCorner::TopLeft,
        FaceCorner::TopRight,
        FaceCorner::BottomRight,
        FaceCorner::BottomLeft,
    ];

    #[inline]
    #[must_use]
    pub fn texel(self, size: u32) -> (u32, u32) {
        let last = size - 1;
        match self {
            FaceCorner::TopLeft => (0, 0),
            FaceCorner::TopRight => (last, 0),
            FaceCorner::BottomRight => (last, last),
            FaceCorner::BottomLeft => (0, last),
        }
    }

    fn coords(self) -> (f32, f32) {
        match self {
            FaceCorner::TopLeft => (-1.0, -1.0),
            FaceCorner::TopRight => (1.0, -1.0),
            FaceCorner::BottomRight => (1.0, 1.0),
            FaceCorner::BottomLeft => (-1.0, 1.0),
        }
    }
}

/// A cube edge as seen from its two faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeEdge {
    pub face: CubeFace,
    pub edge: FaceEdge,
    pub neighbor_face: CubeFace,
    pub neighbor_edge: FaceEdge,
    /// Texel `i` on `edge` meets texel `size - 1 - i` on `neighbor_edge`.
    pub reversed: bool,
}

/// A cube corner with the three face corners meeting there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeCorner {
    pub position: IVec3,
    pub taps: [(CubeFace, FaceCorner); 3],
}

/// Complete adjacency of the cube faces.
#[derive(Debug)]
pub struct CubeTopology {
    edges: Vec<CubeEdge>,
    corners: Vec<CubeCorner>,
    neighbors: [[(CubeFace, FaceEdge, bool); 4]; 6],
}

static TOPOLOGY: LazyLock<CubeTopology> = LazyLock::new(CubeTopology::build);

impl CubeTopology {
    /// Shared, lazily derived topology.
    #[must_use]
    pub fn get() -> &'static CubeTopology {
        &TOPOLOGY
    }

    fn build() -> Self {
        let mut edge_groups: FxHashMap<(IVec3, IVec3), Vec<(CubeFace, FaceEdge, IVec3)>> =
            FxHashMap::default();
        let mut corner_groups: FxHashMap<IVec3, Vec<(CubeFace, FaceCorner)>> = FxHashMap::default();

        for face in CubeFace::ALL {
            for edge in FaceEdge::ALL {
                let ((s0, t0), (s1, t1)) = edge.endpoints();
                let start = face.lattice_point(s0, t0);
                let end = face.lattice_point(s1, t1);
                let key = if start.to_array() <= end.to_array() {
                    (start, end)
                } else {
                    (end, start)
                };
                edge_groups.entry(key).or_default().push((face, edge, start));
            }
            for corner in FaceCorner::ALL {
                let (s, t) = corner.coords();
                corner_groups
                    .entry(face.lattice_point(s, t))
                    .or_default()
                    .push((face, corner));
            }
        }

        let mut edges: Vec<CubeEdge> = edge_groups
            .into_values()
            .filter_map(|group| match group.as_slice() {
                [(face, edge, start), (neighbor_face, neighbor_edge, neighbor_start)] => Some(CubeEdge {
                    face: *face,
                    edge: *edge,
                    neighbor_face: *neighbor_face,
                    neighbor_edge: *neighbor_edge,
                    reversed: start != neighbor_start,
                }),
                _ => None,
            })
            .collect();
        edges.sort_by_key(|e| (e.face.index(), e.edge as usize));

        let mut corners: Vec<CubeCorner> = corner_groups
            .into_iter()
            .filter_map(|(position, group)| match group.as_slice() {
                [a, b, c] => Some(CubeCorner {
                    position,
                    taps: [*a, *b, *c],
                }),
                _ => None,
            })
            .collect();
        corners.sort_by_key(|c| c.position.to_array());

        debug_assert_eq!(edges.len(), 12);
        debug_assert_eq!(corners.len(), 8);

        let mut neighbors = [[(CubeFace::PositiveX, FaceEdge::Left, false); 4]; 6];
        for e in &edges {
            neighbors[e.face.index()][e.edge as usize] = (e.neighbor_face, e.neighbor_edge, e.reversed);
            neighbors[e.neighbor_face.index()][e.neighbor_edge as usize] = (e.face, e.edge, e.reversed);
        }

        Self {
            edges,
            corners,
            neighbors,
        }
    }

    /// The twelve cube edges, each listed once.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[CubeEdge] {
        &self.edges
    }

    /// The eight cube corners.
    #[inline]
    #[must_use]
    pub fn corners(&self) -> &[CubeCorner] {
        &self.corners
    }

    /// Face and edge abutting `(face, edge)`, and whether the walk reverses.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, face: CubeFace, edge: FaceEdge) -> (CubeFace, FaceEdge, bool) {
        self.neighbors[face.index()][edge as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_counts() {
        let topology = CubeTopology::get();
        assert_eq!(topology.edges().len(), 12);
        assert_eq!(topology.corners().len(), 8);
    }

    #[test]
    fn test_known_abutments() {
        let topology = CubeTopology::get();
        assert_eq!(
            topology.neighbor(CubeFace::PositiveX, FaceEdge::Right),
            (CubeFace::NegativeZ, FaceEdge::Left, false)
        );
        assert_eq!(
            topology.neighbor(CubeFace::PositiveY, FaceEdge::Left),
            (CubeFace::NegativeX, FaceEdge::Top, false)
        );
        assert_eq!(
            topology.neighbor(CubeFace::PositiveY, FaceEdge::Top),
            (CubeFace::NegativeZ, FaceEdge::Top, true)
        );
        assert_eq!(
            topology.neighbor(CubeFace::PositiveZ, FaceEdge::Bottom),
            (CubeFace::NegativeY, FaceEdge::Top, false)
        );
    }

    #[test]
    fn test_from_direction_inverts_direction() {
        for face in CubeFace::ALL {
            let (hit, s, t) = CubeFace::from_direction(face.direction(0.25, -0.5));
            assert_eq!(hit, face);
            assert!((s - 0.25).abs() < 1e-6);
            assert!((t + 0.5).abs() < 1e-6);
        }
    }
}
