//! Property-based tests for stl2vox
//!
//! These tests use proptest to generate random meshes, material ids and
//! cursor movements and verify invariants hold across a wide range of inputs.

use std::io::Cursor;

use nalgebra::Point3;
use proptest::prelude::*;
use stl2vox::stl::{read_stl, write_stl};
use stl2vox::{
    ClassificationBuffer, Error, LayerCompositor, MaterialId, SliceCursor, Triangle,
    decode_channel,
};

// ============================================================================
// Generators
// ============================================================================

/// Finite coordinate in a range typical for voxel scenes
fn coord() -> impl Strategy<Value = f32> {
    -1000.0f32..1000.0
}

fn point_strategy() -> impl Strategy<Value = Point3<f32>> {
    (coord(), coord(), coord()).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn triangle_strategy() -> impl Strategy<Value = Triangle> {
    (point_strategy(), point_strategy(), point_strategy())
        .prop_map(|(a, b, c)| Triangle::new(a, b, c))
}

fn stl_bytes(triangles: &[Triangle]) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_stl(&mut bytes, triangles).unwrap();
    bytes
}

// ============================================================================
// Mesh loading
// ============================================================================

proptest! {
    #[test]
    fn prop_buffers_match_triangle_count(triangles in prop::collection::vec(triangle_strategy(), 0..64)) {
        let mesh = read_stl(Cursor::new(stl_bytes(&triangles))).unwrap();

        prop_assert_eq!(mesh.triangle_count(), triangles.len());
        prop_assert_eq!(mesh.vertices().len(), 9 * triangles.len());
        prop_assert_eq!(mesh.normals().len(), 9 * triangles.len());
    }

    #[test]
    fn prop_face_normals_are_unit_or_zero(triangles in prop::collection::vec(triangle_strategy(), 1..32)) {
        let mesh = read_stl(Cursor::new(stl_bytes(&triangles))).unwrap();

        for triangle in mesh.triangles() {
            let length = triangle.normal.norm();
            let [a, b, c] = triangle.vertices;
            let doubled_area = (b - a).cross(&(c - a)).norm();
            if doubled_area > 1e-3 {
                prop_assert!((length - 1.0).abs() < 1e-4, "normal length {}", length);
            } else {
                prop_assert!(length == 0.0 || (length - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn prop_any_truncation_is_a_parse_error(
        triangles in prop::collection::vec(triangle_strategy(), 1..16),
        cut in 1usize..800,
    ) {
        let bytes = stl_bytes(&triangles);
        let keep = bytes.len().saturating_sub(cut);

        let err = read_stl(Cursor::new(bytes[..keep].to_vec())).unwrap_err();
        let is_parse = matches!(err, Error::Parse { .. });
        prop_assert!(is_parse);
    }
}

// ============================================================================
// Materials and compositing
// ============================================================================

#[test]
fn test_channel_round_trip_every_material() {
    for id in 1..=255u8 {
        let material = MaterialId::new(id).unwrap();
        assert_eq!(decode_channel(material.encode()), id);
    }
    assert_eq!(decode_channel(0.0), 0);
}

fn buffer_strategy(cells: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(0u8), 1u8..=255], cells)
}

proptest! {
    #[test]
    fn prop_composite_takes_last_nonzero(
        layers in prop::collection::vec(buffer_strategy(12), 0..6),
    ) {
        let buffers: Vec<ClassificationBuffer> = layers
            .iter()
            .map(|cells| ClassificationBuffer::from_cells(4, 3, cells.clone()).unwrap())
            .collect();

        let slice = LayerCompositor::new(4, 3).composite(1, &buffers).unwrap();

        for i in 0..12 {
            let expected = layers.iter().rev().map(|l| l[i]).find(|&v| v != 0).unwrap_or(0);
            prop_assert_eq!(slice.as_bytes()[i], expected);
        }
    }

    #[test]
    fn prop_cursor_stays_in_range(
        max_depth in 1usize..500,
        moves in prop::collection::vec(-1000i32..1000, 0..50),
    ) {
        let mut cursor = SliceCursor::new(max_depth);
        for delta in moves {
            let depth = cursor.scroll(delta);
            prop_assert!((1..=max_depth).contains(&depth));
        }
    }
}
