//! Property tests over the view transform and tile selection maths.

use aeromap::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_project_unproject_round_trip(
        origin_x in -2.0f64..2.0,
        origin_y in -2.0f64..2.0,
        scale in 1e-3f64..1e6,
        rotation in 0.0f64..std::f64::consts::TAU,
        x in 0.0f64..1.0,
        y in 0.0f64..1.0,
    ) {
        let t = Transform::new(origin_x, origin_y, scale, rotation);
        let (px, py) = t.project(x, y);
        let (rx, ry) = t.unproject(px, py);
        prop_assert!((rx - x).abs() < 1e-6);
        prop_assert!((ry - y).abs() < 1e-6);
    }

    #[test]
    fn prop_level_is_monotonic_in_scale(
        scale in 1.0f64..1e8,
        factor in 1.0f64..64.0,
    ) {
        let close = Transform::new(0.0, 0.0, scale, 0.0).level_for_size(256);
        let closer = Transform::new(0.0, 0.0, scale * factor, 0.0).level_for_size(256);
        prop_assert!(closer >= close);
    }

    #[test]
    fn prop_world_bounds_enclose_visible_points(
        origin_x in 0.0f64..1.0,
        origin_y in 0.0f64..1.0,
        scale in 10.0f64..1e5,
        rotation in 0.0f64..std::f64::consts::TAU,
        width in 16.0f64..2048.0,
        height in 16.0f64..2048.0,
    ) {
        let transform = Transform::new(origin_x, origin_y, scale, rotation);
        let rect = Aabb::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0);
        let view = ViewTransform::new(transform, rect);
        // Small slack absorbs float rounding at the corners.
        let bounds = view.world_bounds().expanded(1e-9);

        for i in 0..=4 {
            for j in 0..=4 {
                let px = rect.min_x + rect.width() * (i as f64 / 4.0);
                let py = rect.min_y + rect.height() * (j as f64 / 4.0);
                let (wx, wy) = transform.unproject(px, py);
                prop_assert!(bounds.contains(wx, wy), "({wx}, {wy}) outside {bounds:?}");
            }
        }
    }

    #[test]
    fn prop_tile_range_stays_on_the_map(
        min_x in -2.0f64..2.0,
        min_y in -2.0f64..2.0,
        extent in 0.001f64..2.0,
        level in 0u8..12,
    ) {
        let bounds = Aabb::new(min_x, min_y, min_x + extent, min_y + extent);
        if let Some(((x0, y0), (x1, y1))) = TileEngine::<SectionSource<NeverFetcher>>::tile_range(&bounds, level) {
            let n = TileAddress::tiles_across(level);
            prop_assert!(x0 <= x1 && y0 <= y1);
            prop_assert!(x1 < n && y1 < n);
            prop_assert!(TileAddress::new(level, x0, y0).is_valid());
            prop_assert!(TileAddress::new(level, x1, y1).is_valid());
        }
    }

    #[test]
    fn prop_tile_range_covers_interior_points(
        center_x in 0.1f64..0.9,
        center_y in 0.1f64..0.9,
        extent in 0.01f64..0.2,
        level in 1u8..10,
    ) {
        let bounds = Aabb::new(
            center_x - extent / 2.0,
            center_y - extent / 2.0,
            center_x + extent / 2.0,
            center_y + extent / 2.0,
        );
        let ((x0, y0), (x1, y1)) =
            TileEngine::<SectionSource<NeverFetcher>>::tile_range(&bounds, level).unwrap();

        // The tile under the box center is always part of the range.
        let n = TileAddress::tiles_across(level) as f64;
        let cx = (center_x * n).floor() as u32;
        let cy = (center_y * n).floor() as u32;
        prop_assert!(x0 <= cx && cx <= x1);
        prop_assert!(y0 <= cy && cy <= y1);
    }
}

/// Type parameter filler; the range helpers never touch the provider.
struct NeverFetcher;

#[async_trait::async_trait]
impl SectionFetcher for NeverFetcher {
    async fn fetch(&self, _key: &str) -> Result<Option<Section>> {
        Ok(None)
    }
}
