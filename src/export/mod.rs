//! Export post-processing: make model markup safe for the legacy
//! word-processor import path.
//!
//! The word processor cannot render inline SVG, so every vector graphic is
//! substituted with a supersampled raster `<img>` carrying the same logical
//! dimensions, and the whole body is wrapped in the fixed document shell.
//!
//! ## Data Flow
//!
//! ```text
//! markup ──▶ locate ──▶ rasterize ──▶ splice ──▶ shell
//!  (html)    (svg)     (fan-out/in)  (in place)  (BOM + @page + Section1)
//! ```
//!
//! This stage never fails hard: a graphic that cannot be converted keeps its
//! original markup, and a document with no graphics passes through the
//! substitution step byte-identical.

mod svg;

pub mod raster;
pub mod shell;

pub use raster::{RasterError, ResvgRasterizer, SvgRasterizer};
pub use shell::{write_to_file, ExportableDocument, DOC_MIME_TYPE};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raster resolution multiplier over the logical size. 3× keeps diagram
/// strokes and labels crisp in print after the word processor scales the
/// image back down to its logical dimensions.
pub const SUPERSAMPLE_FACTOR: f64 = 3.0;

/// Prepare converted markup for export with the default resvg rasterizer.
///
/// `base_name` is the output name without extension; the result is named
/// `{base_name}.doc`.
pub async fn prepare_for_export(markup: &str, base_name: &str) -> ExportableDocument {
    prepare_for_export_with(markup, base_name, Arc::new(ResvgRasterizer)).await
}

/// Prepare converted markup for export with an injected rasterizer.
pub async fn prepare_for_export_with(
    markup: &str,
    base_name: &str,
    rasterizer: Arc<dyn SvgRasterizer>,
) -> ExportableDocument {
    let body = substitute_graphics(markup, rasterizer).await;
    shell::wrap(&body, base_name)
}

/// Replace every inline SVG in the markup with a raster `<img>` substitute.
///
/// All graphics are rendered concurrently on the blocking pool; the call
/// returns only when every one has settled. A graphic that fails to render
/// keeps its original markup — partial completion is never observable, and
/// markup without any vector graphics is returned unchanged.
pub async fn substitute_graphics(markup: &str, rasterizer: Arc<dyn SvgRasterizer>) -> String {
    let blocks = svg::find_svg_blocks(markup);
    if blocks.is_empty() {
        return markup.to_string();
    }
    debug!("Substituting {} vector graphics", blocks.len());

    let tasks: Vec<_> = blocks
        .iter()
        .map(|block| {
            let rasterizer = Arc::clone(&rasterizer);
            let source = block.source.clone();
            tokio::task::spawn_blocking(move || render_replacement(&source, rasterizer.as_ref()))
        })
        .collect();
    let results = futures::future::join_all(tasks).await;

    // Splice back-to-front so earlier block offsets stay valid.
    let mut out = markup.to_string();
    for (block, result) in blocks.iter().zip(results).rev() {
        match result {
            Ok(Some(replacement)) => out.replace_range(block.start..block.end, &replacement),
            Ok(None) => {}
            Err(e) => warn!("Graphic conversion task failed: {e}"),
        }
    }
    out
}

/// Render one block into its `<img>` substitute, or `None` to keep the
/// original vector element.
fn render_replacement(source: &str, rasterizer: &dyn SvgRasterizer) -> Option<String> {
    let graphic = match svg::normalize_block(source) {
        Some(g) => g,
        None => {
            warn!("Skipping graphic with no parsable <svg> root");
            return None;
        }
    };

    let png = match rasterizer.rasterize(
        &graphic.svg,
        graphic.width,
        graphic.height,
        SUPERSAMPLE_FACTOR,
    ) {
        Ok(png) => png,
        Err(e) => {
            warn!("Rasterisation failed, keeping vector element: {e}");
            return None;
        }
    };

    let w = svg::fmt_len(graphic.width);
    let h = svg::fmt_len(graphic.height);
    Some(format!(
        r#"<img src="data:image/png;base64,{data}" width="{w}" height="{h}" style="width:{w}px;height:{h}px;display:block;">"#,
        data = STANDARD.encode(&png),
    ))
}
