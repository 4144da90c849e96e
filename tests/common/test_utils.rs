/// True when every pixel of the frame equals the first one.
#[cfg(feature = "integration-tests")]
pub fn frame_is_uniform(
    texture: &image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
) -> bool {
    let mut pixels = texture.pixels();
    match pixels.next() {
        Some(first) => pixels.all(|pixel| pixel == first),
        None => true,
    }
}
