//! Raster rendering of standalone SVG markup.
//!
//! The rendering capability sits behind [`SvgRasterizer`] so the export
//! pipeline is testable without a real graphics surface and hosts can swap
//! in a platform renderer. The default implementation parses with `usvg`
//! and paints with resvg/tiny-skia.
//!
//! Every render starts from an opaque white canvas: transparent SVG regions
//! otherwise come out black when the legacy word processor decodes the PNG.

use resvg::tiny_skia::{Color, Pixmap, Transform};
use thiserror::Error;
use tracing::debug;

/// Memory guard: the longest raster edge after supersampling. A graphic
/// that would exceed it is rendered at a proportionally lower scale.
const MAX_RASTER_EDGE: f64 = 8192.0;

/// A single graphic failed to render. Absorbed by the export pipeline;
/// never propagated past it.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct RasterError(pub String);

/// Injected raster-rendering capability: given standalone SVG markup and
/// target logical dimensions, produce encoded PNG bytes at `scale`× the
/// logical resolution.
pub trait SvgRasterizer: Send + Sync {
    fn rasterize(
        &self,
        svg: &str,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<Vec<u8>, RasterError>;
}

/// Default rasterizer: usvg parse, tiny-skia paint, PNG encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgRasterizer;

impl SvgRasterizer for ResvgRasterizer {
    fn rasterize(
        &self,
        svg: &str,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<Vec<u8>, RasterError> {
        let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
            .map_err(|e| RasterError(format!("SVG parse failed: {e}")))?;

        let mut px_w = width * scale;
        let mut px_h = height * scale;
        if px_w <= 0.0 || px_h <= 0.0 {
            return Err(RasterError(format!(
                "Invalid raster dimensions: {px_w}x{px_h}"
            )));
        }
        let max_edge = px_w.max(px_h);
        if max_edge > MAX_RASTER_EDGE {
            let shrink = MAX_RASTER_EDGE / max_edge;
            px_w *= shrink;
            px_h *= shrink;
        }
        let px_w = px_w.round().max(1.0) as u32;
        let px_h = px_h.round().max(1.0) as u32;

        let mut pixmap = Pixmap::new(px_w, px_h)
            .ok_or_else(|| RasterError(format!("Pixmap allocation failed: {px_w}x{px_h}")))?;
        pixmap.fill(Color::WHITE);

        let size = tree.size();
        let sx = px_w as f32 / size.width();
        let sy = px_h as f32 / size.height();
        resvg::render(&tree, Transform::from_scale(sx, sy), &mut pixmap.as_mut());

        debug!("Rasterised SVG -> {}x{} px", px_w, px_h);

        pixmap
            .encode_png()
            .map_err(|e| RasterError(format!("PNG encode failed: {e}")))
    }
}
