use crate::foundation::error::{VidsumError, VidsumResult};

pub use kurbo::{Point, Rect};

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Pixel dimensions `(w, h)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Largest size with the same aspect ratio that fits inside `bounds`.
    ///
    /// Never scales up: a size already inside `bounds` is returned unchanged.
    pub fn fit_within(self, bounds: Size) -> Size {
        if self.w <= bounds.w && self.h <= bounds.h {
            return self;
        }
        let scale = (f64::from(bounds.w) / f64::from(self.w))
            .min(f64::from(bounds.h) / f64::from(self.h));
        Size {
            w: ((f64::from(self.w) * scale).round() as u32).clamp(1, bounds.w.max(1)),
            h: ((f64::from(self.h) * scale).round() as u32).clamp(1, bounds.h.max(1)),
        }
    }
}

/// Integer pixel rectangle with exclusive right/bottom edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl PixelRect {
    pub const fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(self) -> i64 {
        (self.right - self.left).max(0)
    }

    pub fn height(self) -> i64 {
        (self.bottom - self.top).max(0)
    }

    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Intersect with the `[0, size.w) x [0, size.h)` frame area.
    pub fn clip_to(self, size: Size) -> PixelRect {
        PixelRect {
            left: self.left.clamp(0, i64::from(size.w)),
            top: self.top.clamp(0, i64::from(size.h)),
            right: self.right.clamp(0, i64::from(size.w)),
            bottom: self.bottom.clamp(0, i64::from(size.h)),
        }
    }
}

/// Round half up, the way pixel coordinates are snapped everywhere in the overlay code.
pub fn round_px(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Straight-alpha RGBA color, serialized as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 0xFF])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn parse_hex(s: &str) -> VidsumResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(VidsumError::invalid_input(format!(
                "color '{s}' must be #RRGGBB or #RRGGBBAA"
            )));
        }
        let mut out = [0xFFu8; 4];
        for (i, slot) in out.iter_mut().take(hex.len() / 2).enumerate() {
            *slot = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(|e| VidsumError::invalid_input(format!("color '{s}': {e}")))?;
        }
        Ok(Self(out))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 0xFF {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.0[0], self.0[1], self.0[2]])
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba8::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_within_never_upscales() {
        let s = Size::new(320, 180);
        assert_eq!(s.fit_within(Size::new(640, 360)), s);
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let s = Size::new(1920, 1080);
        assert_eq!(s.fit_within(Size::new(960, 960)), Size::new(960, 540));
        assert_eq!(s.fit_within(Size::new(1920, 540)), Size::new(960, 540));
    }

    #[test]
    fn round_px_rounds_half_up() {
        assert_eq!(round_px(19.5), 20);
        assert_eq!(round_px(20.0), 20);
        assert_eq!(round_px(20.49), 20);
    }

    #[test]
    fn clip_to_frame_bounds() {
        let r = PixelRect::new(-5, 10, 250, 120).clip_to(Size::new(200, 100));
        assert_eq!(r, PixelRect::new(0, 10, 200, 100));
        assert!(PixelRect::new(300, 0, 400, 10).clip_to(Size::new(200, 100)).is_empty());
    }

    #[test]
    fn hex_colors_round_trip_through_serde() {
        let c: Rgba8 = serde_json::from_str("\"#00000040\"").unwrap();
        assert_eq!(c, Rgba8::rgba(0, 0, 0, 0x40));
        assert_eq!(serde_json::to_string(&Rgba8::rgb(0, 255, 0)).unwrap(), "\"#00FF00\"");
        assert!(Rgba8::parse_hex("#12345").is_err());
    }
}
