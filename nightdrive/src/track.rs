use bevy::prelude::*;

use crate::centerline::CurveVariant;

/// Geometry of one map. Fixed for the lifetime of a round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSpec {
    pub variant: CurveVariant,
    pub road_width: f32,
    pub sidewalk_width: f32,
    /// Height of the step from road surface up to sidewalk surface.
    pub curb_height: f32,
    /// World `y` of the road surface.
    pub surface_y: f32,
    pub step: f32,
    pub start_z: f32,
    pub end_z: f32,
}

impl TrackSpec {
    pub fn center_x(&self, z: f32) -> f32 {
        self.variant.center_x(z)
    }

    pub fn half_width(&self) -> f32 {
        self.road_width * 0.5
    }

    /// Number of `(z, z - step)` sections between `start_z` and `end_z`.
    /// A remainder shorter than a thousandth of a step is folded into the last
    /// section instead of becoming a sliver.
    pub fn segment_count(&self) -> usize {
        let span = (self.start_z - self.end_z) / self.step;
        (span - 1e-3).ceil().max(0.0) as usize
    }

    /// Near and far `z` of section `index`; the last section ends exactly at
    /// `end_z`. Computed from the index so rebuilding never accumulates drift.
    pub fn segment(&self, index: usize) -> (f32, f32) {
        let near = self.start_z - index as f32 * self.step;
        let far = if index + 1 >= self.segment_count() {
            self.end_z
        } else {
            near - self.step
        };
        (near, far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadVertex {
    pub position: Vec3,
    pub tint: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl RoadVertex {
    /// Interleaved `position, tint, uv, normal` layout (11 floats).
    pub fn to_array(&self) -> [f32; 11] {
        let [px, py, pz] = self.position.to_array();
        let [r, g, b] = self.tint.to_array();
        let [u, v] = self.uv.to_array();
        let [nx, ny, nz] = self.normal.to_array();
        [px, py, pz, r, g, b, u, v, nx, ny, nz]
    }
}

/// `(start, count)` into [`TrackMesh::vertices`], drawn as a triangle list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawRange {
    pub start: usize,
    pub count: usize,
}

impl DrawRange {
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPartition {
    Road,
    /// Both sidewalks plus the two curb faces.
    Sidewalk,
}

/// Ribbon geometry for a whole track, split in two contiguous partitions so
/// each one can be drawn with its own material.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMesh {
    pub vertices: Vec<RoadVertex>,
    pub road: DrawRange,
    pub sidewalk: DrawRange,
}

impl TrackMesh {
    pub fn range(&self, partition: TrackPartition) -> DrawRange {
        match partition {
            TrackPartition::Road => self.road,
            TrackPartition::Sidewalk => self.sidewalk,
        }
    }

    pub fn partition(&self, partition: TrackPartition) -> &[RoadVertex] {
        let range = self.range(partition);
        &self.vertices[range.start..range.end()]
    }

    /// Non-indexed triangle-list mesh for one partition.
    pub fn partition_mesh(&self, partition: TrackPartition) -> Mesh {
        let vertices = self.partition(partition);

        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position.to_array()).collect();
        let normals: Vec<[f32; 3]> = vertices.iter().map(|v| v.normal.to_array()).collect();
        let uvs: Vec<[f32; 2]> = vertices.iter().map(|v| v.uv.to_array()).collect();
        let colors: Vec<[f32; 4]> = vertices
            .iter()
            .map(|v| [v.tint.x, v.tint.y, v.tint.z, 1.0])
            .collect();

        let mut mesh = Mesh::new(
            bevy::mesh::PrimitiveTopology::TriangleList,
            bevy::asset::RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
        mesh
    }
}

const SURFACE_TINT: Vec3 = Vec3::ONE;
const CURB_TINT: Vec3 = Vec3::splat(0.8);

/// Texture `v` coordinate for a boundary at `z`; tiles once every 10 units.
fn texture_v(z: f32) -> f32 {
    -z * 0.1
}

#[derive(Default)]
struct RibbonBuilder {
    vertices: Vec<RoadVertex>,
}

impl RibbonBuilder {
    /// Emits `a b c` and `a c d`; corners must be counter-clockwise seen from
    /// the side `normal` points to.
    fn quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4], normal: Vec3, tint: Vec3) {
        for i in [0, 1, 2, 0, 2, 3] {
            self.vertices.push(RoadVertex {
                position: corners[i],
                tint,
                uv: uvs[i],
                normal,
            });
        }
    }

    /// Horizontal strip between `left..right` at the near edge `z0` and the far
    /// edge `z1`, facing +Y.
    fn top(&mut self, near: (f32, f32, f32), far: (f32, f32, f32), y: f32) {
        let (left0, right0, z0) = near;
        let (left1, right1, z1) = far;
        let (v0, v1) = (texture_v(z0), texture_v(z1));
        self.quad(
            [
                vec3(left0, y, z0),
                vec3(right0, y, z0),
                vec3(right1, y, z1),
                vec3(left1, y, z1),
            ],
            [vec2(0.0, v0), vec2(1.0, v0), vec2(1.0, v1), vec2(0.0, v1)],
            Vec3::Y,
            SURFACE_TINT,
        );
    }

    /// Vertical curb face along the road edge, from `bottom` up to `top`.
    /// `facing` is +1 for a face looking towards +X, -1 towards -X.
    fn curb(&mut self, near: (f32, f32), far: (f32, f32), bottom: f32, top: f32, facing: f32) {
        let (x0, z0) = near;
        let (x1, z1) = far;
        let (v0, v1) = (texture_v(z0), texture_v(z1));
        let base_near = (vec3(x0, bottom, z0), vec2(0.0, v0));
        let base_far = (vec3(x1, bottom, z1), vec2(0.0, v1));
        let top_far = (vec3(x1, top, z1), vec2(1.0, v1));
        let top_near = (vec3(x0, top, z0), vec2(1.0, v0));

        let ring = if facing > 0.0 {
            [base_near, base_far, top_far, top_near]
        } else {
            [base_near, top_near, top_far, base_far]
        };
        self.quad(
            ring.map(|(p, _)| p),
            ring.map(|(_, uv)| uv),
            Vec3::X * facing.signum(),
            CURB_TINT,
        );
    }
}

/// Build the full track ribbon from `start_z` down to `end_z`. The road
/// partition comes first, then sidewalks and curbs.
pub fn build_track_mesh(spec: &TrackSpec) -> TrackMesh {
    let segments = spec.segment_count();
    let half = spec.half_width();
    let walk = spec.sidewalk_width;
    let curb_top = spec.surface_y + spec.curb_height;

    let mut builder = RibbonBuilder {
        vertices: Vec::with_capacity(segments * 30),
    };

    for i in 0..segments {
        let (z0, z1) = spec.segment(i);
        let (c0, c1) = (spec.center_x(z0), spec.center_x(z1));
        builder.top(
            (c0 - half, c0 + half, z0),
            (c1 - half, c1 + half, z1),
            spec.surface_y,
        );
    }
    let road = DrawRange {
        start: 0,
        count: builder.vertices.len(),
    };

    for i in 0..segments {
        let (z0, z1) = spec.segment(i);
        let (c0, c1) = (spec.center_x(z0), spec.center_x(z1));

        // Left and right sidewalks
        builder.top(
            (c0 - half - walk, c0 - half, z0),
            (c1 - half - walk, c1 - half, z1),
            curb_top,
        );
        builder.top(
            (c0 + half, c0 + half + walk, z0),
            (c1 + half, c1 + half + walk, z1),
            curb_top,
        );

        // Curb faces look inwards, towards the road
        builder.curb((c0 - half, z0), (c1 - half, z1), spec.surface_y, curb_top, 1.0);
        builder.curb((c0 + half, z0), (c1 + half, z1), spec.surface_y, curb_top, -1.0);
    }
    let sidewalk = DrawRange {
        start: road.end(),
        count: builder.vertices.len() - road.end(),
    };

    TrackMesh {
        vertices: builder.vertices,
        road,
        sidewalk,
    }
}
