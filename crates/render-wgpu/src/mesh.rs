use backdrop_scene::layers::{LinesLayer, PointsLayer, SquaresLayer};
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct SquareInstanceData {
    pub offset: [f32; 3],
    pub scale_seed: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct CornerVertex {
    pub corner: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct PointVertex {
    pub position: [f32; 3],
}

pub(crate) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Unit plane in XY centred on the origin. UV origin is top-left to match
/// texture space.
pub(crate) fn unit_plane() -> [Vertex; 4] {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = [
        Vertex { position: [-p, -p, 0.0], uv: [0.0, 1.0] },
        Vertex { position: [ p, -p, 0.0], uv: [1.0, 1.0] },
        Vertex { position: [ p,  p, 0.0], uv: [1.0, 0.0] },
        Vertex { position: [-p,  p, 0.0], uv: [0.0, 0.0] },
    ];
    vertices
}

/// Billboard corners for particle sprites, in point-size units.
pub(crate) fn sprite_corners() -> [CornerVertex; 4] {
    let p = 0.5_f32;
    [
        CornerVertex { corner: [-p, -p] },
        CornerVertex { corner: [p, -p] },
        CornerVertex { corner: [p, p] },
        CornerVertex { corner: [-p, p] },
    ]
}

pub(crate) fn square_instances(layer: &SquaresLayer) -> Vec<SquareInstanceData> {
    layer
        .instances()
        .iter()
        .map(|i| SquareInstanceData {
            offset: i.position.to_array(),
            scale_seed: i.scale_seed,
        })
        .collect()
}

pub(crate) fn point_vertices(layer: &PointsLayer) -> Vec<PointVertex> {
    layer
        .positions()
        .iter()
        .map(|p| PointVertex {
            position: p.to_array(),
        })
        .collect()
}

/// Two vertices per segment, for a `LineList` topology.
pub(crate) fn line_vertices(layer: &LinesLayer) -> Vec<PointVertex> {
    layer
        .segments()
        .iter()
        .flat_map(|[a, b]| [a, b])
        .map(|p| PointVertex {
            position: p.to_array(),
        })
        .collect()
}
