use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia;
use tracing::{info, warn};
use usvg::fontdb;

use super::error::RenderError;
use crate::domain::dimensions::RenderDimensions;
use crate::domain::image_processor_trait::ImageProcessor;
use crate::domain::text_overlay::TextOverlay;

/// Faces tried, in order, for the generic `sans-serif` family.
const SANS_SERIF_CANDIDATES: &[&str] = &[
    "Arial",
    "Helvetica",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "FreeSans",
];
const SERIF_CANDIDATES: &[&str] = &[
    "Times New Roman",
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "FreeSerif",
];

/// Slide renderer backed by `image` (decode, cover-fit, PNG) and `resvg` (overlay text).
pub struct DefaultImageProcessor {
    fontdb: Arc<fontdb::Database>,
}

impl DefaultImageProcessor {
    /// Loads the system fonts plus any `.ttf`/`.otf`/`.ttc` files found in `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            db.load_fonts_dir(dir);
        }
        Self::with_database(db)
    }

    /// Points the generic families at installed faces so every overlay chain, which always
    /// ends in `sans-serif` or `serif`, resolves to something that can be drawn.
    pub fn with_database(mut db: fontdb::Database) -> Self {
        let sans_serif = resolve_generic_family(&db, SANS_SERIF_CANDIDATES);
        match &sans_serif {
            Some(family) => {
                db.set_sans_serif_family(family.clone());
                db.set_fantasy_family(family.clone());
            }
            None => warn!("no usable font face found; slide text will not be drawn"),
        }
        let serif = resolve_generic_family(&db, SERIF_CANDIDATES).or(sans_serif.clone());
        if let Some(family) = &serif {
            db.set_serif_family(family.clone());
        }
        info!(
            faces = db.len(),
            sans_serif = sans_serif.as_deref().unwrap_or("-"),
            serif = serif.as_deref().unwrap_or("-"),
            "font database loaded"
        );
        Self { fontdb: Arc::new(db) }
    }

    fn rasterize_overlay(&self, overlay: &TextOverlay) -> Result<RgbaImage, RenderError> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&overlay.to_svg(), &options)?;

        let width = overlay.dimensions.width();
        let height = overlay.dimensions.height();
        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        demultiplied_layer(pixmap)
    }
}

/// First candidate present in `db`, else the first family of any loaded face.
fn resolve_generic_family(db: &fontdb::Database, candidates: &[&str]) -> Option<String> {
    let has_family = |name: &str| {
        db.faces()
            .any(|face| face.families.iter().any(|(family, _)| family == name))
    };
    candidates
        .iter()
        .find(|name| has_family(name))
        .map(|name| name.to_string())
        .or_else(|| {
            db.faces()
                .find_map(|face| face.families.first().map(|(family, _)| family.clone()))
        })
}

// tiny-skia はプリマルチプライド、image はストレート alpha。バッファはそのまま再利用する
fn demultiplied_layer(pixmap: tiny_skia::Pixmap) -> Result<RgbaImage, RenderError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut data = pixmap.take();
    for px in data.chunks_exact_mut(4) {
        if let Some(color) = tiny_skia::PremultipliedColorU8::from_rgba(px[0], px[1], px[2], px[3])
        {
            let color = color.demultiply();
            px.copy_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
    }
    RgbaImage::from_raw(width, height, data).ok_or(RenderError::Pixmap { width, height })
}

impl ImageProcessor for DefaultImageProcessor {
    fn render_slide(
        &self,
        background: &[u8],
        overlay: &TextOverlay,
        dimensions: RenderDimensions,
    ) -> Result<Vec<u8>, RenderError> {
        let decoded = image::load_from_memory(background)?;
        // cover + center: 枠を埋めて、はみ出た部分を中央基準で切り落とす
        let mut canvas = decoded
            .resize_to_fill(dimensions.width(), dimensions.height(), FilterType::Lanczos3)
            .to_rgba8();

        if !overlay.is_empty() {
            let layer = self.rasterize_overlay(overlay)?;
            imageops::overlay(&mut canvas, &layer, 0, 0);
        }

        let mut buffer = Cursor::new(Vec::new());
        canvas.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}
