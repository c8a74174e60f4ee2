//! The instruction prompt for PDF-to-Word-HTML conversion.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the conversion behaviour (e.g.
//!    tightening the diagram rules or adding a subject) requires editing
//!    exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    calling a real model, making prompt regressions easy to catch.
//!
//! Callers can override via [`crate::config::ConversionConfig::prompt`]; the
//! constant here is used only when no override is provided.

/// Default instruction prompt sent alongside the PDF payload.
///
/// The model is asked for body-only HTML with inline SVG for any diagrams,
/// so the export path can rewrite those vectors for Word compatibility.
pub const DEFAULT_CONVERSION_PROMPT: &str = r#"You are an expert Educational Document Digitizer specialized in ALL academic subjects (Math, Physics, Chemistry, Biology, Geography, and Languages).

Target: Convert the provided PDF document into a high-fidelity HTML document compatible with MS Word.

1. FULL DOCUMENT CONVERSION
   - Convert EVERY SINGLE PAGE in the PDF file.
   - Do NOT stop after the first few pages and do NOT summarize.
   - If the document is long, continue generating HTML until the very last line of the last page.

2. DIAGRAMS & MAPS (SVG GENERATION)
   - The document may contain geometry figures, electric circuits, molecular
     structures, anatomical diagrams, or map outlines.
   - Do NOT use image placeholders. Draw these as inline SVG code.
   - Style: black stroke (#000), stroke-width="2", transparent or light-gray (#eee) fill.
   - Preserve labels inside the SVG (e.g. "Voltmeter", "Cytoplasm", "5cm").
   - For complex maps or drawings, draw a clean schematic vector representation (outlines only).

3. TEXT & LAYOUT
   - Return ONLY the HTML <body> content.
   - Default direction: dir="rtl". If a section is in English or French, wrap it in
     <div dir="ltr" style="text-align: left; font-family: 'Arial', sans-serif;">...</div>.
   - Preserve H1/H2 headings, bold, and font sizes.
   - Scientific notation uses <sub> and <sup> tags (e.g. H<sub>2</sub>O, x<sup>2</sup>).
   - Tables use border="1" style="border-collapse: collapse; width: 100%;".
   - Fix obvious OCR errors (e.g. broken characters) only when completely certain.

4. OUTPUT FORMAT
   - Output raw HTML only. No markdown fences, no commentary."#;
