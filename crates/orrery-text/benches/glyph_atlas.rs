//! Benchmarks for glyph batching, string measurement and atlas growth

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use orrery_render::MockDevice;
use orrery_text::{AtlasConfig, AtlasLayout, GlyphAtlas, MockRasterizer, TextureFont};
use std::sync::Arc;

fn font() -> TextureFont {
    let device = Arc::new(MockDevice::new().with_max_texture_size(8192));
    TextureFont::new(Box::new(MockRasterizer::new()), device).unwrap()
}

fn bench_render_str(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_str");
    let mut font = font();

    let long_text = "Lorem ipsum dolor sit amet. ".repeat(20);
    let texts: Vec<(&str, &str)> = vec![
        ("single_char", "A"),
        ("label", "Ganymede"),
        ("sentence", "The quick brown fox jumps over the lazy dog"),
        ("long_text", &long_text),
    ];

    for (name, content) in texts {
        group.throughput(Throughput::Elements(content.chars().count() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let end = font.render_str(black_box(content), 0.0, 0.0);
                font.flush();
                black_box(end)
            });
        });
    }

    group.finish();
}

fn bench_width(c: &mut Criterion) {
    let mut font = font();
    c.bench_function("width_greek", |b| {
        b.iter(|| black_box(font.width(black_box("αβγδεζηθικλμνξοπρστυφχψω"))));
    });
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("atlas_layout");
    let device = Arc::new(MockDevice::new().with_max_texture_size(8192));

    for extra in [0usize, 256, 1024] {
        let mut atlas = GlyphAtlas::new(
            Box::new(MockRasterizer::new()),
            device.clone(),
            AtlasConfig::default(),
        )
        .unwrap();
        for ch in ('\u{0400}'..).take(extra) {
            atlas.glyph(ch, '?');
        }
        let glyphs: Vec<_> = (0..atlas.len()).filter_map(|i| atlas.glyph_at(i)).collect();

        group.throughput(Throughput::Elements(glyphs.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(glyphs.len()), &glyphs, |b, glyphs| {
            b.iter(|| black_box(AtlasLayout::compute(black_box(glyphs), 8192)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_str, bench_width, bench_layout);
criterion_main!(benches);
