//! End-to-end frame rendering through the fetch, cache and layer stack.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aeromap::prelude::*;
use aeromap::section::{Shape, StyleRef};

/// Serves one world-covering green square for every section key.
struct WorldSquareFetcher {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SectionFetcher for WorldSquareFetcher {
    async fn fetch(&self, _key: &str) -> Result<Option<Section>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Section {
            shapes: vec![Shape {
                map_points: vec![
                    [-1.0, -1.0],
                    [2.0, -1.0],
                    [2.0, 2.0],
                    [-1.0, 2.0],
                    [-1.0, -1.0],
                ],
                map_aabb: Aabb::new(-1.0, -1.0, 2.0, 2.0),
                fill_colour: Some(StyleRef::Rgb(0x00ff00)),
                stroke_colour: None,
                stroke_width: 0.0,
            }],
            ..Default::default()
        }))
    }
}

fn frame_has_ink(frame: &tiny_skia::Pixmap) -> bool {
    frame.pixels().iter().any(|p| p.alpha() > 0)
}

#[tokio::test]
async fn test_first_frame_blank_second_frame_painted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = SectionSource::new(WorldSquareFetcher {
        calls: calls.clone(),
    });

    let mut map = MapRenderer::new();
    map.add_layer(Box::new(ground_layer(source)));
    map.set_view(ViewUpdate::new(0.5, 0.5, 0.0, 0.0));

    // Fetches are in flight after the first frame, nothing drawn yet.
    let first = map.render(64, 64).unwrap();
    assert!(!frame_has_ink(&first));

    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = map.render(64, 64).unwrap();
    assert!(frame_has_ink(&second));
    let center = second.pixel(32, 32).unwrap();
    assert_eq!(center.green(), 255);
}

#[tokio::test]
async fn test_repeated_frames_do_not_refetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = SectionSource::new(WorldSquareFetcher {
        calls: calls.clone(),
    });

    let mut map = MapRenderer::new();
    map.add_layer(Box::new(ground_layer(source)));
    map.set_view(ViewUpdate::new(0.5, 0.5, 0.0, 0.0));

    map.render(64, 64).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    map.render(64, 64).unwrap();
    let settled = calls.load(Ordering::SeqCst);

    for _ in 0..5 {
        map.render(64, 64).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), settled);
}

#[tokio::test]
async fn test_deep_zoom_is_covered_by_coarse_data() {
    // The fetcher serves data at every clamped key; zooming far past the
    // data level must still paint the frame from the shared geometry.
    let source = SectionSource::new(WorldSquareFetcher {
        calls: Arc::new(AtomicUsize::new(0)),
    });

    let mut map = MapRenderer::new();
    map.add_layer(Box::new(ground_layer(source)));
    map.set_view(ViewUpdate::new(0.5, 0.5, 12.0, 0.0));

    map.render(64, 64).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let frame = map.render(64, 64).unwrap();
    assert_eq!(frame.pixel(32, 32).unwrap().green(), 255);
}

#[tokio::test]
async fn test_rotated_frame_is_painted() {
    let source = SectionSource::new(WorldSquareFetcher {
        calls: Arc::new(AtomicUsize::new(0)),
    });

    let mut map = MapRenderer::new();
    map.add_layer(Box::new(ground_layer(source)));
    map.set_view(ViewUpdate::new(0.5, 0.5, 2.0, 0.8));

    map.render(64, 64).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let frame = map.render(64, 64).unwrap();
    assert_eq!(frame.pixel(32, 32).unwrap().green(), 255);
}
