use std::fmt::Write as _;

use crate::domain::color::TextColor;
use crate::domain::dimensions::RenderDimensions;
use crate::domain::font_family::FontFamily;
use crate::domain::position::Position;
use crate::domain::slide::SlideSpec;

const TITLE_SCALE: f32 = 0.055; // 1080px で約 60px
const SUBTITLE_SCALE: f32 = 0.033; // 1080px で約 36px
const PADDING_SCALE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Subtitle,
}

impl TextRole {
    fn font_weight(self) -> &'static str {
        match self {
            Self::Title => "bold",
            Self::Subtitle => "normal",
        }
    }

    // (stroke opacity, stroke width)
    fn outline(self) -> (&'static str, u32) {
        match self {
            Self::Title => ("0.3", 2),
            Self::Subtitle => ("0.2", 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub role: TextRole,
    pub text: String,
    pub position: Position,
    pub font_size: u32,
}

/// Vector text layer for one slide: zero, one or two centred text blocks over a transparent
/// canvas of the slide's size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub dimensions: RenderDimensions,
    pub blocks: Vec<TextBlock>,
    pub color: TextColor,
    pub font_family: FontFamily,
    /// Horizontal margin a wrapping layout would keep free. Not enforced yet.
    pub padding: u32,
}

impl TextOverlay {
    pub fn compose(
        title: &str,
        subtitle: &str,
        color: TextColor,
        dimensions: RenderDimensions,
        font_family: FontFamily,
    ) -> Self {
        let width = dimensions.width() as f32;
        let height = dimensions.height() as f32;
        let title_size = (width * TITLE_SCALE).floor() as u32;
        let subtitle_size = (width * SUBTITLE_SCALE).floor() as u32;
        let padding = (width * PADDING_SCALE).floor() as u32;

        let title = title.trim();
        let subtitle = subtitle.trim();
        let center_x = width / 2.0;
        let middle_y = height / 2.0;

        let mut blocks = Vec::with_capacity(2);
        match (!title.is_empty(), !subtitle.is_empty()) {
            (true, true) => {
                blocks.push(TextBlock {
                    role: TextRole::Title,
                    text: title.to_string(),
                    position: Position::new(center_x, middle_y - subtitle_size as f32),
                    font_size: title_size,
                });
                blocks.push(TextBlock {
                    role: TextRole::Subtitle,
                    text: subtitle.to_string(),
                    position: Position::new(center_x, middle_y + title_size as f32),
                    font_size: subtitle_size,
                });
            }
            (true, false) => blocks.push(TextBlock {
                role: TextRole::Title,
                text: title.to_string(),
                position: Position::new(center_x, middle_y),
                font_size: title_size,
            }),
            (false, true) => blocks.push(TextBlock {
                role: TextRole::Subtitle,
                text: subtitle.to_string(),
                position: Position::new(center_x, middle_y),
                font_size: subtitle_size,
            }),
            (false, false) => {}
        }

        Self {
            dimensions,
            blocks,
            color,
            font_family,
            padding,
        }
    }

    pub fn from_slide(spec: &SlideSpec, dimensions: RenderDimensions) -> Self {
        let color = spec
            .text_color
            .as_deref()
            .map(TextColor::parse)
            .unwrap_or_default();
        Self::compose(
            spec.title.as_deref().unwrap_or_default(),
            spec.subtitle.as_deref().unwrap_or_default(),
            color,
            dimensions,
            FontFamily::from_name(spec.font_family.as_deref()),
        )
    }

    /// `true` when there is nothing to draw; the renderer skips compositing in that case.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, role: TextRole) -> Option<&TextBlock> {
        self.blocks.iter().find(|b| b.role == role)
    }

    pub fn max_text_width(&self) -> u32 {
        self.dimensions.width().saturating_sub(self.padding * 2)
    }

    pub fn to_svg(&self) -> String {
        let width = self.dimensions.width();
        let height = self.dimensions.height();
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        if !self.is_empty() {
            svg.push_str(
                r##"<defs><filter id="shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="2" dy="2" stdDeviation="4" flood-color="#000000" flood-opacity="0.5"/></filter></defs>"##,
            );
        }
        for block in &self.blocks {
            let (stroke_opacity, stroke_width) = block.role.outline();
            // write! on String は失敗しない
            let _ = write!(
                svg,
                r##"<text x="{x}" y="{y}" text-anchor="middle" font-family="{family}" font-size="{size}" font-weight="{weight}" fill="{fill}" stroke="#000000" stroke-opacity="{stroke_opacity}" stroke-width="{stroke_width}" paint-order="stroke fill" filter="url(#shadow)">{text}</text>"##,
                x = block.position.x,
                y = block.position.y,
                family = self.font_family.css_chain(),
                size = block.font_size,
                weight = block.role.font_weight(),
                fill = self.color,
                text = escape_xml(&block.text),
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

pub fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: i64, height: i64) -> RenderDimensions {
        RenderDimensions::new(width, height).unwrap()
    }

    fn compose(title: &str, subtitle: &str, d: RenderDimensions) -> TextOverlay {
        TextOverlay::compose(title, subtitle, TextColor::default(), d, FontFamily::Arial)
    }

    #[test]
    fn typography_scales_with_width() {
        let overlay = compose("T", "S", dims(1080, 1080));
        assert_eq!(overlay.block(TextRole::Title).unwrap().font_size, 59);
        assert_eq!(overlay.block(TextRole::Subtitle).unwrap().font_size, 35);
        assert_eq!(overlay.padding, 54);
        assert_eq!(overlay.max_text_width(), 972);
    }

    #[test]
    fn both_blocks_straddle_the_midpoint() {
        let overlay = compose("Title", "Sub", dims(1080, 800));
        let title = overlay.block(TextRole::Title).unwrap();
        let subtitle = overlay.block(TextRole::Subtitle).unwrap();
        assert_eq!(title.position, Position::new(540.0, 400.0 - 35.0));
        assert_eq!(subtitle.position, Position::new(540.0, 400.0 + 59.0));
    }

    #[test]
    fn single_block_is_centred() {
        let only_title = compose("Hello", "  ", dims(1080, 1080));
        assert_eq!(only_title.blocks.len(), 1);
        assert_eq!(only_title.blocks[0].role, TextRole::Title);
        assert_eq!(only_title.blocks[0].position, Position::new(540.0, 540.0));

        let only_subtitle = compose("", "World", dims(600, 300));
        assert_eq!(only_subtitle.blocks.len(), 1);
        assert_eq!(only_subtitle.blocks[0].role, TextRole::Subtitle);
        assert_eq!(only_subtitle.blocks[0].position, Position::new(300.0, 150.0));
    }

    #[test]
    fn blank_text_yields_empty_overlay_for_any_size() {
        for (w, h) in [(200, 200), (1080, 1350), (4000, 200)] {
            let overlay = compose(" ", "\n\t", dims(w, h));
            assert!(overlay.is_empty());
            let svg = overlay.to_svg();
            assert!(!svg.contains("<text"));
            assert!(svg.contains(&format!(r#"width="{w}" height="{h}""#)));
        }
    }

    #[test]
    fn svg_escapes_markup_characters() {
        let svg = compose(r#"<b>"Tom" & 'Jerry'</b>"#, "", dims(1080, 1080)).to_svg();
        assert!(svg.contains("&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;"));
        assert!(!svg.contains("<b>"));
    }

    #[test]
    fn svg_uses_resolved_style() {
        let overlay = TextOverlay::from_slide(
            &SlideSpec {
                title: Some("Hello".into()),
                subtitle: Some("World".into()),
                text_color: Some("#FF0000".into()),
                font_family: Some("Georgia".into()),
            },
            dims(1080, 1080),
        );
        let svg = overlay.to_svg();
        assert!(svg.contains(r#"font-family="Georgia, 'Times New Roman', serif""#));
        assert!(svg.contains(r##"fill="#FF0000""##));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains(r#"font-weight="normal""#));
        assert!(svg.contains("feDropShadow"));
        assert!(svg.contains(r#"paint-order="stroke fill""#));
    }

    #[test]
    fn missing_color_defaults_to_white() {
        let overlay = TextOverlay::from_slide(
            &SlideSpec {
                title: Some("Hello".into()),
                ..SlideSpec::default()
            },
            dims(1080, 1080),
        );
        assert_eq!(overlay.color.as_str(), "#FFFFFF");
        assert_eq!(overlay.font_family, FontFamily::Arial);
    }
}
