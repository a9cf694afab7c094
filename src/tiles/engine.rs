//! Rendering of section geometry into cached tile bitmaps, with style
//! epoch and ancestor fallback.

use std::sync::Arc;

use tiny_skia::{Pixmap, Transform as SkTransform};

use crate::cache::ttl::TtlCache;
use crate::core::bounds::Aabb;
use crate::core::transform::Transform;
use crate::core::viewport::ViewTransform;
use crate::render::context::RenderContext;
use crate::render::style::StyleContext;
use crate::section::{Section, SectionProvider};
use crate::tiles::{RenderedTile, TileAddress, TileEngineOptions, TileKey};
use crate::{MapError, Result};

use fxhash::FxHashSet;

/// Draws one section payload onto a tile-local render context. The context
/// transform already maps world coordinates to tile pixels; the address
/// carries the draw level for detail decisions.
pub type PaintFn =
    dyn Fn(&mut RenderContext, &Section, &StyleContext, TileAddress) -> Result<()> + Send + Sync;

/// Renders, caches and composes quadtree tiles for one layer.
///
/// Per frame the engine figures out the level matching the current scale,
/// draws every tile intersecting the visible world bounds and fills gaps
/// from whatever is already cached: first bitmaps of recent style epochs,
/// then enlarged sub-rectangles of cached ancestors. A tile whose paint or
/// section fetch failed goes on the broken list and is never retried until
/// [`reset_broken`](Self::reset_broken).
pub struct TileEngine<P> {
    provider: P,
    options: TileEngineOptions,
    layer: Arc<str>,
    paint: Box<PaintFn>,
    cache: TtlCache<TileKey, Arc<RenderedTile>>,
    broken: FxHashSet<TileKey>,
}

impl<P: SectionProvider> TileEngine<P> {
    pub fn new<F>(provider: P, options: TileEngineOptions, paint: F) -> Self
    where
        F: Fn(&mut RenderContext, &Section, &StyleContext, TileAddress) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        let cache = TtlCache::new(options.ttl);
        Self::with_cache(provider, options, cache, paint)
    }

    /// As [`new`](Self::new) with an externally built cache, so tests can
    /// drive expiry through a manual clock.
    pub fn with_cache<F>(
        provider: P,
        options: TileEngineOptions,
        cache: TtlCache<TileKey, Arc<RenderedTile>>,
        paint: F,
    ) -> Self
    where
        F: Fn(&mut RenderContext, &Section, &StyleContext, TileAddress) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self {
            provider,
            layer: Arc::from(options.name.as_str()),
            options,
            paint: Box::new(paint),
            cache,
            broken: FxHashSet::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.layer
    }

    pub fn tile_size(&self) -> u32 {
        self.options.tile_size
    }

    pub fn cached_tiles(&self) -> usize {
        self.cache.len()
    }

    pub fn broken_tiles(&self) -> usize {
        self.broken.len()
    }

    /// Forgets every broken tile so the next frame retries them, e.g. after
    /// connectivity returns.
    pub fn reset_broken(&mut self) {
        self.broken.clear();
    }

    /// Drops all cached bitmaps.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    fn key(&self, epoch: &Arc<str>, addr: TileAddress) -> TileKey {
        TileKey {
            layer: self.layer.clone(),
            epoch: epoch.clone(),
            size: self.options.tile_size,
            addr,
        }
    }

    /// Inclusive tile index range at `level` covering `bounds`, or `None`
    /// when the bounds lie entirely outside the map. The 0.01-tile bias on
    /// each side pulls in neighbours whose edge sits on the boundary.
    pub fn tile_range(bounds: &Aabb, level: u8) -> Option<((u32, u32), (u32, u32))> {
        let n = TileAddress::tiles_across(level) as f64;
        let last = n - 1.0;

        let x0 = (bounds.min_x * n - 0.01).floor().max(0.0);
        let y0 = (bounds.min_y * n - 0.01).floor().max(0.0);
        let x1 = (bounds.max_x * n + 0.01).floor().min(last);
        let y1 = (bounds.max_y * n + 0.01).floor().min(last);

        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some(((x0 as u32, y0 as u32), (x1 as u32, y1 as u32)))
    }

    /// Rasterizes `addr` from its section data under the current style.
    /// `Ok(None)` means the section fetch is still in flight.
    fn render_tile(
        &self,
        addr: TileAddress,
        style: &StyleContext,
    ) -> Result<Option<Arc<RenderedTile>>> {
        let Some(section) = self.provider.get(addr.level, addr.x, addr.y)? else {
            return Ok(None);
        };

        let size = self.options.tile_size;
        let surface = Pixmap::new(size, size)
            .ok_or_else(|| MapError::Render(format!("bad tile size {size}")))?;

        let (wx, wy) = addr.world_origin();
        let scale = size as f64 * TileAddress::tiles_across(addr.level) as f64;
        let view = ViewTransform::new(
            Transform::new(wx, wy, scale, 0.0),
            Aabb::from_size(0.0, 0.0, size as f64, size as f64),
        );

        let mut ctx = RenderContext::from_pixmap(surface, view);
        (self.paint)(&mut ctx, &section, style, addr)?;

        Ok(Some(Arc::new(RenderedTile {
            pixmap: ctx.into_pixmap(),
        })))
    }

    /// Returns a ready bitmap for `addr`, rendering under the current style
    /// epoch if no recent epoch has one cached. `None` means still pending
    /// or broken.
    fn lookup_or_render(
        &mut self,
        addr: TileAddress,
        style: &StyleContext,
    ) -> Option<Arc<RenderedTile>> {
        for epoch in style.keys() {
            let key = self.key(epoch, addr);
            if self.broken.contains(&key) {
                continue;
            }
            if let Some(hit) = self.cache.touch(&key) {
                return Some(hit);
            }
        }

        let key = self.key(&style.current_key(), addr);
        if self.broken.contains(&key) {
            return None;
        }

        match self.render_tile(addr, style) {
            Ok(Some(rendered)) => {
                Some(
                    self.cache
                        .pull(key, Some(self.options.ttl), || rendered, None),
                )
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!(
                    "{}: tile {}/{}/{} failed: {err}",
                    self.layer,
                    addr.level,
                    addr.x,
                    addr.y
                );
                self.broken.insert(key);
                None
            }
        }
    }

    /// Draws one tile into `dest` on the frame surface, falling back to the
    /// matching sub-rectangle of the nearest cached ancestor when the tile
    /// itself is not ready.
    fn draw_tile(
        &mut self,
        ctx: &mut RenderContext,
        addr: TileAddress,
        dest: (f64, f64, f64, f64),
        transform: SkTransform,
        style: &StyleContext,
    ) {
        let size = self.options.tile_size as f64;

        if let Some(tile) = self.lookup_or_render(addr, style) {
            ctx.blit(&tile.pixmap, (0.0, 0.0, size, size), dest, transform);
            return;
        }

        let mut ancestor = addr.parent();
        while let Some(anc) = ancestor {
            for epoch in style.keys() {
                let key = self.key(epoch, anc);
                if let Some(hit) = self.cache.touch(&key) {
                    let delta = addr.level - anc.level;
                    let sub = size / (1u64 << delta) as f64;
                    let mask = (1u32 << delta) - 1;
                    let sx = (addr.x & mask) as f64 * sub;
                    let sy = (addr.y & mask) as f64 * sub;
                    ctx.blit(&hit.pixmap, (sx, sy, sub, sub), dest, transform);
                    return;
                }
            }
            ancestor = anc.parent();
        }
    }

    /// Kicks off renders for every visible tile at `level` without drawing,
    /// so coarser levels are cached before the frame needs them as
    /// fallbacks.
    fn preload_level(&mut self, bounds: &Aabb, level: u8, style: &StyleContext) {
        let Some(((x0, y0), (x1, y1))) = Self::tile_range(bounds, level) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let _ = self.lookup_or_render(TileAddress::new(level, x, y), style);
            }
        }
    }

    /// Draws the layer for the current frame.
    pub fn draw(&mut self, ctx: &mut RenderContext, style: &StyleContext) -> Result<()> {
        self.cache.purge_expired();

        let view = ctx.view;
        let t = *view.transform();
        let level = view.level_for_size(self.options.tile_size).min(31);
        let bounds = *view.world_bounds();

        // Warm grandparent before parent so the deepest fallback fills in
        // first while panning into fresh territory.
        for up in [2u8, 1] {
            if level >= up {
                self.preload_level(&bounds, level - up, style);
            }
        }

        let Some(((x0, y0), (x1, y1))) = Self::tile_range(&bounds, level) else {
            return Ok(());
        };

        let vts = t.scale / TileAddress::tiles_across(level) as f64;
        let rotated = t.sin() != 0.0;
        // Rotated edges land between pixels; overdraw half a pixel so seams
        // between neighbouring tiles stay closed.
        let pad = if rotated { 0.5 } else { 0.0 };

        let rect = view.view_rect();
        let transform = SkTransform::from_row(
            t.cos() as f32,
            t.sin() as f32,
            -t.sin() as f32,
            t.cos() as f32,
            -rect.min_x as f32,
            -rect.min_y as f32,
        );

        for y in y0..=y1 {
            for x in x0..=x1 {
                let addr = TileAddress::new(level, x, y);
                let (wx, wy) = addr.world_origin();
                // Pre-rotation pixel position; the canvas transform applies
                // the rotation.
                let ux = (wx - t.x) * t.scale;
                let uy = (wy - t.y) * t.scale;
                self.draw_tile(ctx, addr, (ux, uy, vts + pad, vts + pad), transform, style);
            }
        }

        Ok(())
    }
}
