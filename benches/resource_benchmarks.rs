use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gl_resources::{
    DummyDevice, InternalFormat, MipmapGeneration, PixelFormat, PixelType, StorageBuffer,
    Texture2D, TextureFilter, TextureLayout, TextureWrap,
};

fn layout(width: u32, height: u32) -> TextureLayout {
    TextureLayout::new(
        InternalFormat::Rgba8,
        width,
        height,
        PixelFormat::Rgba,
        PixelType::UnsignedByte,
    )
    .with_filter(TextureFilter::LinearMipmapLinear, TextureFilter::Linear)
    .with_wrap(TextureWrap::Repeat, TextureWrap::Repeat)
}

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

fn bench_texture_create(c: &mut Criterion) {
    let device = Rc::new(DummyDevice::new());
    let pixels = vec![0u8; 256 * 256 * 4];
    let layout = layout(256, 256);
    c.bench_function("texture_create_256_full_chain", |b| {
        b.iter(|| {
            let texture = Texture2D::new(
                device.clone(),
                "bench",
                &layout,
                Some(pixels.as_slice()),
                MipmapGeneration::FullChain,
            )
            .unwrap();
            black_box(&texture);
            device.clear_calls();
        });
    });
}

fn bench_texture_reload(c: &mut Criterion) {
    let device = Rc::new(DummyDevice::new());
    let small = layout(64, 64);
    let large = layout(128, 128);
    let mut texture = Texture2D::new(
        device.clone(),
        "bench",
        &small,
        None,
        MipmapGeneration::Disabled,
    )
    .unwrap();
    c.bench_function("texture_reload_alternating", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let target = if flip { &large } else { &small };
            texture
                .reload(target, None, MipmapGeneration::FullChain)
                .unwrap();
            black_box(&texture);
            device.clear_calls();
        });
    });
}

// ---------------------------------------------------------------------------
// Storage buffers
// ---------------------------------------------------------------------------

fn bench_buffer_map(c: &mut Criterion) {
    let device = Rc::new(DummyDevice::new());
    let data: Vec<u32> = (0..4096).collect();
    let mut buffer = StorageBuffer::from_slice(device.clone(), &data).unwrap();
    c.bench_function("storage_buffer_map_16k", |b| {
        b.iter(|| {
            let mapping = buffer.map().unwrap();
            black_box(mapping.iter().map(|&v| u64::from(v)).sum::<u64>());
            drop(mapping);
            device.clear_calls();
        });
    });
}

criterion_group!(
    benches,
    bench_texture_create,
    bench_texture_reload,
    bench_buffer_map
);
criterion_main!(benches);
