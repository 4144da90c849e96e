use std::io::{BufReader, Cursor};

use cgmath::SquareMatrix;

use crate::resources::texture::load_binary;

/**
 * This module contains all logic for loading the model/atlas from external
 * files and for building the cube mesh.
 */
pub mod mesh;
pub mod texture;

/// Load a glTF/GLB asset and extract one world-space position per scene node.
///
/// The asset is only mined for its node transforms; meshes, materials and
/// animations it may carry are ignored. Parent transforms are composed so
/// nested nodes land where the authoring tool placed them.
pub async fn load_node_positions(file_name: &str) -> anyhow::Result<Vec<cgmath::Vector3<f32>>> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    let positions = node_positions(&gltf.document);
    log::info!(
        "extracted {} node positions from {}",
        positions.len(),
        file_name
    );
    Ok(positions)
}

/// Walk every scene of the document and collect the world translation of
/// every reachable node.
pub fn node_positions(document: &gltf::Document) -> Vec<cgmath::Vector3<f32>> {
    let mut positions = Vec::new();
    for scene in document.scenes() {
        for node in scene.nodes() {
            collect_positions(node, cgmath::Matrix4::identity(), &mut positions);
        }
    }
    positions
}

fn collect_positions(
    node: gltf::scene::Node,
    parent: cgmath::Matrix4<f32>,
    positions: &mut Vec<cgmath::Vector3<f32>>,
) {
    // glTF matrices are column-major, same as cgmath
    let local: cgmath::Matrix4<f32> = node.transform().matrix().into();
    let world = parent * local;
    positions.push(world.w.truncate());
    for child in node.children() {
        collect_positions(child, world, positions);
    }
}
