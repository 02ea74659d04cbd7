use std::fmt;

use crate::foundation::error::{CollageError, CollageResult};

/// Zero-based output frame index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameIndex(pub u64);

/// Pixel rectangle in canvas coordinates.
///
/// `width`/`height` are positive and `x + width`, `y + height` fit in `u32`; both are checked by
/// [`TileRect::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> CollageResult<Self> {
        if width == 0 || height == 0 {
            return Err(CollageError::malformed_spec(format!(
                "tile size must be positive, got {width}x{height}"
            )));
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(CollageError::malformed_spec(format!(
                "tile {width}x{height}+{x}+{y} extends past the addressable canvas"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes in one packed RGB24 frame of this size.
    pub fn rgb24_len(self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Smallest canvas that also covers `rect`.
    pub fn grow_to(self, rect: TileRect) -> Self {
        Self {
            width: self.width.max(rect.right()),
            height: self.height.max(rect.bottom()),
        }
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Integer output frame rate (>= 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fps(u32);

impl Fps {
    pub const DEFAULT: Fps = Fps(30);

    pub fn new(fps: i64) -> CollageResult<Self> {
        if fps < 1 {
            return Err(CollageError::invalid_fps("FPS must be a positive integer"));
        }
        let fps = u32::try_from(fps)
            .map_err(|_| CollageError::invalid_fps(format!("FPS {fps} is out of range")))?;
        Ok(Self(fps))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Four-character codec identifier, stored as typed (case preserved).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fourcc([u8; 4]);

impl Fourcc {
    pub fn parse(code: &str) -> CollageResult<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 4 || !code.is_ascii() {
            return Err(CollageError::invalid_codec(format!(
                "'{code}': codec must be a FOURCC identifier (www.fourcc.org)"
            )));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII is accepted by `parse`.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Upper-cased form used for codec lookups.
    pub fn canonical(&self) -> [u8; 4] {
        self.0.map(|b| b.to_ascii_uppercase())
    }
}

impl Default for Fourcc {
    fn default() -> Self {
        Self(*b"xvid")
    }
}

impl fmt::Display for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_rejects_zero_size_and_overflow() {
        assert!(TileRect::new(0, 0, 0, 10).is_err());
        assert!(TileRect::new(0, 0, 10, 0).is_err());
        assert!(TileRect::new(u32::MAX, 0, 1, 1).is_err());
        let r = TileRect::new(10, 20, 30, 40).unwrap();
        assert_eq!((r.right(), r.bottom()), (40, 60));
    }

    #[test]
    fn canvas_grows_to_cover_rects() {
        let c = CanvasSize::default()
            .grow_to(TileRect::new(0, 0, 100, 50).unwrap())
            .grow_to(TileRect::new(20, 30, 10, 10).unwrap());
        assert_eq!(c, CanvasSize { width: 100, height: 50 });
        assert_eq!(c.rgb24_len(), 100 * 50 * 3);
        assert!(CanvasSize::default().is_empty());
    }

    #[test]
    fn fps_must_be_positive() {
        assert!(Fps::new(0).is_err());
        assert!(Fps::new(-5).is_err());
        assert!(Fps::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(Fps::new(24).unwrap().get(), 24);
        assert_eq!(Fps::default().get(), 30);
    }

    #[test]
    fn fourcc_requires_exactly_four_ascii_chars() {
        assert!(Fourcc::parse("xvi").is_err());
        assert!(Fourcc::parse("xvids").is_err());
        assert!(Fourcc::parse("").is_err());
        assert!(Fourcc::parse("éab").is_err());
        let f = Fourcc::parse("mjpg").unwrap();
        assert_eq!(f.as_str(), "mjpg");
        assert_eq!(&f.canonical(), b"MJPG");
        assert_eq!(Fourcc::default().to_string(), "xvid");
    }
}
