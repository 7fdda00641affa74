//! Procedural starter assets: a unit cube, a ground plane, tiny test images.
//!
//! These cover demo and test scenes without any file I/O. Every builder
//! returns plain CPU data; registration in an [`AssetStore`](crate::AssetStore)
//! is the caller's job.

use crate::{Image, Mesh, Vertex};

/// Axis-aligned unit cube centered on the origin.
///
/// 24 vertices (four per face, so normals and texcoords stay flat per face)
/// and 36 indices. Each face maps the full `0..1` texture square.
pub fn unit_cube() -> Mesh {
    let p = 0.5;
    #[rustfmt::skip]
    let vertices = vec![
        // +X
        Vertex { position: [ p, -p, -p], texcoord: [0.0, 1.0], normal: [ 1.0,  0.0,  0.0] },
        Vertex { position: [ p,  p, -p], texcoord: [1.0, 1.0], normal: [ 1.0,  0.0,  0.0] },
        Vertex { position: [ p,  p,  p], texcoord: [1.0, 0.0], normal: [ 1.0,  0.0,  0.0] },
        Vertex { position: [ p, -p,  p], texcoord: [0.0, 0.0], normal: [ 1.0,  0.0,  0.0] },
        // -X
        Vertex { position: [-p, -p,  p], texcoord: [0.0, 1.0], normal: [-1.0,  0.0,  0.0] },
        Vertex { position: [-p,  p,  p], texcoord: [1.0, 1.0], normal: [-1.0,  0.0,  0.0] },
        Vertex { position: [-p,  p, -p], texcoord: [1.0, 0.0], normal: [-1.0,  0.0,  0.0] },
        Vertex { position: [-p, -p, -p], texcoord: [0.0, 0.0], normal: [-1.0,  0.0,  0.0] },
        // +Y
        Vertex { position: [-p,  p, -p], texcoord: [0.0, 1.0], normal: [ 0.0,  1.0,  0.0] },
        Vertex { position: [-p,  p,  p], texcoord: [1.0, 1.0], normal: [ 0.0,  1.0,  0.0] },
        Vertex { position: [ p,  p,  p], texcoord: [1.0, 0.0], normal: [ 0.0,  1.0,  0.0] },
        Vertex { position: [ p,  p, -p], texcoord: [0.0, 0.0], normal: [ 0.0,  1.0,  0.0] },
        // -Y
        Vertex { position: [-p, -p,  p], texcoord: [0.0, 1.0], normal: [ 0.0, -1.0,  0.0] },
        Vertex { position: [-p, -p, -p], texcoord: [1.0, 1.0], normal: [ 0.0, -1.0,  0.0] },
        Vertex { position: [ p, -p, -p], texcoord: [1.0, 0.0], normal: [ 0.0, -1.0,  0.0] },
        Vertex { position: [ p, -p,  p], texcoord: [0.0, 0.0], normal: [ 0.0, -1.0,  0.0] },
        // +Z
        Vertex { position: [-p, -p,  p], texcoord: [0.0, 1.0], normal: [ 0.0,  0.0,  1.0] },
        Vertex { position: [ p, -p,  p], texcoord: [1.0, 1.0], normal: [ 0.0,  0.0,  1.0] },
        Vertex { position: [ p,  p,  p], texcoord: [1.0, 0.0], normal: [ 0.0,  0.0,  1.0] },
        Vertex { position: [-p,  p,  p], texcoord: [0.0, 0.0], normal: [ 0.0,  0.0,  1.0] },
        // -Z
        Vertex { position: [ p, -p, -p], texcoord: [0.0, 1.0], normal: [ 0.0,  0.0, -1.0] },
        Vertex { position: [-p, -p, -p], texcoord: [1.0, 1.0], normal: [ 0.0,  0.0, -1.0] },
        Vertex { position: [-p,  p, -p], texcoord: [1.0, 0.0], normal: [ 0.0,  0.0, -1.0] },
        Vertex { position: [ p,  p, -p], texcoord: [0.0, 0.0], normal: [ 0.0,  0.0, -1.0] },
    ];

    let mut indices = Vec::with_capacity(36);
    for face in 0..6u32 {
        let base = face * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::new(vertices, indices)
}

/// Flat square plane on the XZ axes, facing +Y, spanning `-extent..extent`.
///
/// Texture coordinates span `0..extent` so repeat-addressed samplers tile the
/// surface instead of stretching one texel across it.
pub fn plane(extent: f32) -> Mesh {
    let e = extent;
    #[rustfmt::skip]
    let vertices = vec![
        Vertex { position: [-e, 0.0, -e], texcoord: [0.0, 0.0], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-e, 0.0,  e], texcoord: [0.0,   e], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ e, 0.0,  e], texcoord: [  e,   e], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ e, 0.0, -e], texcoord: [  e, 0.0], normal: [0.0, 1.0, 0.0] },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    Mesh::new(vertices, indices)
}

/// Single-pixel image of one color. Handy as a no-op base texture for
/// materials that only care about their color factor.
pub fn solid_image(rgba: [u8; 4]) -> Image {
    Image::new(1, 1, rgba.to_vec())
}

/// Square two-color checkerboard with one pixel per cell.
pub fn checker_image(size: u32, a: [u8; 4], b: [u8; 4]) -> Image {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let cell = if (x + y) % 2 == 0 { a } else { b };
            pixels.extend_from_slice(&cell);
        }
    }
    Image::new(size, size, pixels)
}
