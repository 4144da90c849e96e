#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour_until_assets_arrive() {
    use cube_drift::context::Context;
    use cube_drift::viewer::{FrameProbe, FrameProbeResult, ViewerConfig, run_with_probe};

    // Nonexistent assets: the loads fail, the field stays unpopulated and
    // every frame is just the clear colour.
    let config = ViewerConfig {
        model_file: "does_not_exist.glb".to_string(),
        atlas_file: "does_not_exist.png".to_string(),
        ..Default::default()
    };

    let probe: FrameProbe = Box::new(
        |_: &Context,
         frame: u32,
         texture: &image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>| {
            if frame > 0 {
                assert!(
                    common::test_utils::frame_is_uniform(texture),
                    "an unpopulated scene must render as a uniform frame"
                );
                let pixel = texture.pixels().next().expect("empty frame");
                assert_eq!(pixel[3], 255, "the clear colour is opaque");
                Ok(FrameProbeResult::Passed)
            } else {
                Ok(FrameProbeResult::Waiting)
            }
        },
    );

    run_with_probe(config, probe).expect("Failed to run the viewer for the integration test.");
}
