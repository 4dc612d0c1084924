//! Shared fixtures for integration tests
//!
//! Meshes are generated on the fly and written as binary STL into a
//! temporary directory, so no test depends on files checked into the repo.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use stl2vox::stl::write_stl;
use stl2vox::{Mesh, Triangle};

/// Triangles of a closed axis-aligned box with outward-facing winding
pub fn box_triangles(min: [f32; 3], max: [f32; 3]) -> Vec<Triangle> {
    let corner = |x: usize, y: usize, z: usize| {
        Point3::new(
            if x == 0 { min[0] } else { max[0] },
            if y == 0 { min[1] } else { max[1] },
            if z == 0 { min[2] } else { max[2] },
        )
    };

    // Each face listed counter-clockwise when seen from outside
    let faces = [
        [corner(0, 0, 0), corner(0, 1, 0), corner(1, 1, 0), corner(1, 0, 0)], // -Z
        [corner(0, 0, 1), corner(1, 0, 1), corner(1, 1, 1), corner(0, 1, 1)], // +Z
        [corner(0, 0, 0), corner(1, 0, 0), corner(1, 0, 1), corner(0, 0, 1)], // -Y
        [corner(0, 1, 0), corner(0, 1, 1), corner(1, 1, 1), corner(1, 1, 0)], // +Y
        [corner(0, 0, 0), corner(0, 0, 1), corner(0, 1, 1), corner(0, 1, 0)], // -X
        [corner(1, 0, 0), corner(1, 1, 0), corner(1, 1, 1), corner(1, 0, 1)], // +X
    ];

    faces
        .iter()
        .flat_map(|&[a, b, c, d]| [Triangle::new(a, b, c), Triangle::new(a, c, d)])
        .collect()
}

/// Closed box mesh
pub fn box_mesh(min: [f32; 3], max: [f32; 3]) -> Mesh {
    Mesh::from_triangles(box_triangles(min, max).into_iter().map(|t| t.vertices))
}

/// Cube spanning `[min, max]` on every axis
pub fn cube_mesh(min: f32, max: f32) -> Mesh {
    box_mesh([min; 3], [max; 3])
}

/// Write triangles as a binary STL file in `dir`
pub fn write_stl_file(dir: &Path, name: &str, triangles: &[Triangle]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create fixture");
    write_stl(file, triangles).expect("write fixture");
    path
}

/// Write a box as a binary STL file in `dir`
pub fn write_box_stl(dir: &Path, name: &str, min: [f32; 3], max: [f32; 3]) -> PathBuf {
    write_stl_file(dir, name, &box_triangles(min, max))
}

/// Slice `depth` (1-based) of a raw volume
pub fn slice_of(volume: &[u8], width: usize, height: usize, depth: usize) -> &[u8] {
    let len = width * height;
    &volume[(depth - 1) * len..depth * len]
}
