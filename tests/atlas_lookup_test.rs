use cube_drift::data_structures::atlas::AtlasLayout;

#[test]
fn should_map_first_tile_to_top_left_cell() {
    let atlas = AtlasLayout::new(4, 4);

    let (offset, scale) = atlas.uv_rect(0);
    assert_eq!(offset, [0.0, 0.0]);
    assert_eq!(scale, [0.25, 0.25]);
}

#[test]
fn should_advance_tiles_row_major() {
    let atlas = AtlasLayout::new(4, 2);

    // tile 5 is the second cell of the second row
    let (offset, scale) = atlas.uv_rect(5);
    assert_eq!(offset, [0.25, 0.5]);
    assert_eq!(scale, [0.25, 0.5]);
}

#[test]
fn should_map_last_tile_to_bottom_right_cell() {
    let atlas = AtlasLayout::new(4, 4);

    let (offset, _) = atlas.uv_rect(atlas.tile_count() - 1);
    assert_eq!(offset, [0.75, 0.75]);
}

#[test]
fn should_wrap_out_of_range_tiles() {
    let atlas = AtlasLayout::new(3, 3);

    assert_eq!(atlas.uv_rect(9), atlas.uv_rect(0));
    assert_eq!(atlas.uv_rect(13), atlas.uv_rect(4));
}

#[test]
fn should_keep_every_rect_inside_the_image() {
    let atlas = AtlasLayout::new(5, 3);

    for tile in 0..atlas.tile_count() {
        let (offset, scale) = atlas.uv_rect(tile);
        for axis in 0..2 {
            assert!(offset[axis] >= 0.0);
            assert!(
                offset[axis] + scale[axis] <= 1.0 + f32::EPSILON,
                "tile {} overflows the atlas on axis {}",
                tile,
                axis
            );
        }
    }
}

#[test]
fn should_count_tiles() {
    assert_eq!(AtlasLayout::new(4, 4).tile_count(), 16);
    assert_eq!(AtlasLayout::new(8, 1).tile_count(), 8);
    assert_eq!(AtlasLayout::default().tile_count(), 16);
}
