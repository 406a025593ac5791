//! Overlay text streams drawn through the mock device.
//!
//! The mock rasterizer has an ascent of 9, a descent of 3 and 10 pixel tall
//! glyph boxes whose top sits 7 pixels above the baseline.

use orrery_render::{Color, DeviceCall, MockDevice, QuadVertex};
use orrery_text::*;
use std::io::Write as _;
use std::sync::Arc;

fn overlay() -> (Arc<MockDevice>, SharedFont, Overlay) {
    let device = Arc::new(MockDevice::new());
    let font = TextureFont::new(Box::new(MockRasterizer::new()), device.clone())
        .unwrap()
        .into_shared();
    let mut overlay = Overlay::new(device.clone());
    overlay.set_window_size(800, 600);
    overlay.begin();
    overlay.set_font(Some(font.clone()));
    (device, font, overlay)
}

/// Bottom-left corner of each quad in a draw.
fn quad_origins(vertices: &[QuadVertex]) -> Vec<[f32; 2]> {
    vertices.chunks(4).map(|quad| quad[0].position).collect()
}

#[test]
fn test_multiline_block() {
    let (device, _, mut overlay) = overlay();
    overlay.move_by(10.0, 500.0);
    overlay.begin_text();
    overlay.print_str("A\nB");
    overlay.end_text();
    overlay.end();

    let draws = device.draws();
    assert_eq!(draws.len(), 1);
    let (vertices, indices) = &draws[0];
    assert_eq!(indices, &vec![0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);

    // Second line starts 1 + (9 + 3) pixels lower.
    assert_eq!(quad_origins(vertices), vec![[10.0, 497.0], [10.0, 484.0]]);
    assert_eq!(overlay.cursor(), glam::Vec2::new(10.0, 500.0));
}

#[test]
fn test_formatted_text() {
    let (device, font, mut overlay) = overlay();
    overlay.begin_text();
    std::fmt::Write::write_fmt(&mut overlay, format_args!("{}={:.1}", "v", 2.2)).unwrap();
    overlay.end_text();

    let expected = font.lock().width("v=2.2");
    let (vertices, _) = &device.draws()[0];
    assert_eq!(vertices.len(), 5 * 4);
    let last = vertices[vertices.len() - 4].position[0];
    assert_eq!(
        last + MockRasterizer::glyph_width('2') as f32 + 1.0,
        expected as f32
    );
}

#[test]
fn test_color_changes_split_batches() {
    let (device, _, mut overlay) = overlay();
    overlay.set_color(Color::WHITE);
    overlay.print_str("ab");
    overlay.set_color(Color::rgb(0.0, 1.0, 0.0));
    overlay.print_str("cd");
    overlay.end();

    let colors_and_draws: Vec<&'static str> = device
        .calls()
        .iter()
        .filter_map(|call| match call {
            DeviceCall::SetVertexColor(_) => Some("color"),
            DeviceCall::DrawIndexed { .. } => Some("draw"),
            _ => None,
        })
        .collect();
    assert_eq!(colors_and_draws, vec!["color", "draw", "color", "draw"]);
}

#[test]
fn test_byte_stream_split_sequences() {
    let (device, _, mut overlay) = overlay();
    let text = "λ=€";
    for byte in text.bytes() {
        overlay.write_all(&[byte]).unwrap();
    }
    overlay.flush().unwrap();

    // '€' is not preloaded, so "λ=" goes out before the atlas grows.
    let counts: Vec<usize> = device.draws().iter().map(|(v, _)| v.len()).collect();
    assert_eq!(counts, vec![2 * 4, 4]);
}

#[test]
fn test_invalid_bytes_skipped() {
    let (device, _, mut overlay) = overlay();
    overlay.write_all(&[b'o', 0xff, b'k']).unwrap();
    overlay.flush().unwrap();

    let (vertices, _) = &device.draws()[0];
    assert_eq!(vertices.len(), 2 * 4);
}

#[test]
fn test_new_glyph_mid_string_keeps_earlier_quads() {
    let (device, font, mut overlay) = overlay();
    overlay.begin_text();
    overlay.print_str("a€b");
    overlay.end_text();

    // The atlas is rebuilt for '€', so "a" is drawn against the first
    // texture and "€b" against the second.
    let draws = device.draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].0.len(), 4);
    assert_eq!(draws[1].0.len(), 8);
    assert_eq!(font.lock().atlas().rebuild_count(), 2);
}

#[test]
fn test_save_restore_pos() {
    let (_, _, mut overlay) = overlay();
    overlay.move_by(100.0, 100.0);
    overlay.save_pos();
    overlay.print_str("abc");
    overlay.move_by(0.0, -20.0);
    overlay.restore_pos();
    assert_eq!(overlay.cursor(), glam::Vec2::new(100.0, 100.0));
}

#[test]
fn test_begin_resets_cursor() {
    let (_, _, mut overlay) = overlay();
    overlay.move_by(42.0, 42.0);
    overlay.print('x');
    overlay.end();
    overlay.begin();
    assert_eq!(overlay.cursor(), glam::Vec2::ZERO);
}
