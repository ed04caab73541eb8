//! Picture references and their placement geometry.

use serde::Serialize;

/// Denominator of DrawingML percentage values (100000 = 100%).
pub const PERCENT_SCALE: i64 = 100_000;

/// Crop insets from `a:srcRect`, in 1/100000 of the image size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CropBox {
    /// Left inset
    pub l: i64,
    /// Right inset
    pub r: i64,
    /// Top inset
    pub t: i64,
    /// Bottom inset
    pub b: i64,
}

impl CropBox {
    pub fn new(l: i64, r: i64, t: i64, b: i64) -> Self {
        Self { l, r, t, b }
    }

    /// Pixel rectangle for an image of `width` x `height`.
    ///
    /// Coordinates are floored and clamped into the image. Returns `None`
    /// when the rectangle has no area.
    pub fn pixel_rect(&self, width: u32, height: u32) -> Option<CropRect> {
        let (w, h) = (i64::from(width), i64::from(height));
        let scale = |fraction: i64, extent: i64| {
            (fraction * extent).div_euclid(PERCENT_SCALE).clamp(0, extent) as u32
        };

        let rect = CropRect {
            x1: scale(self.l, w),
            y1: scale(self.t, h),
            x2: scale(PERCENT_SCALE - self.r, w),
            y2: scale(PERCENT_SCALE - self.b, h),
        };
        (rect.x1 < rect.x2 && rect.y1 < rect.y2).then_some(rect)
    }
}

/// A pixel rectangle `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Whether the rectangle covers the whole image.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        self.x1 == 0 && self.y1 == 0 && self.x2 == width && self.y2 == height
    }
}

/// Placement from `a:xfrm`, in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeTransform {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// Rotation in 1/60000 degree
    #[serde(skip_serializing_if = "is_zero")]
    pub rotation: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub flip_h: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub flip_v: bool,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// One picture occurrence in the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    /// Relationship id of the embedded media (`r:embed` / `r:id`)
    pub relationship_id: String,

    /// Crop insets, when the picture is cropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropBox>,

    /// Placed size, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<SizeTransform>,

    /// Unique artifact name, derived from the media basename.
    /// `None` when the relationship does not resolve to media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ImageReference {
    pub fn new(relationship_id: impl Into<String>) -> Self {
        Self {
            relationship_id: relationship_id.into(),
            crop: None,
            transform: None,
            key: None,
        }
    }

    /// Both geometry nodes are present.
    pub fn has_geometry(&self) -> bool {
        self.crop.is_some() && self.transform.is_some()
    }
}

/// An image placeholder inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineImage {
    pub reference: ImageReference,

    /// Alt text from `wp:docPr`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}
