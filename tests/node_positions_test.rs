use cgmath::Vector3;
use cube_drift::resources::node_positions;

// A mesh-free asset: three nodes, one nested, one placed via matrix.
const GLTF_JSON: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [{ "nodes": [0, 2] }],
    "nodes": [
        { "translation": [1.0, 2.0, 3.0], "children": [1] },
        { "translation": [0.0, 1.0, 0.0] },
        { "matrix": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, -4, 0, 5, 1] }
    ]
}"#;

fn load_document() -> gltf::Document {
    let gltf = gltf::Gltf::from_slice(GLTF_JSON.as_bytes()).expect("failed to parse test asset");
    gltf.document
}

#[test]
fn should_extract_one_position_per_node() {
    let document = load_document();

    let positions = node_positions(&document);
    assert_eq!(positions.len(), document.nodes().len());
}

#[test]
fn should_compose_parent_transforms() {
    let document = load_document();

    let positions = node_positions(&document);
    assert_eq!(positions[0], Vector3::new(1.0, 2.0, 3.0));
    // the child node is offset by its parent's translation
    assert_eq!(positions[1], Vector3::new(1.0, 3.0, 3.0));
}

#[test]
fn should_read_matrix_nodes() {
    let document = load_document();

    let positions = node_positions(&document);
    assert_eq!(positions[2], Vector3::new(-4.0, 0.0, 5.0));
}

#[test]
fn should_extract_nothing_without_scenes() {
    let gltf = gltf::Gltf::from_slice(br#"{ "asset": { "version": "2.0" } }"#)
        .expect("failed to parse test asset");

    assert!(node_positions(&gltf.document).is_empty());
}
