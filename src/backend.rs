// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `font-chars`.
//
// `font-chars` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `font-chars` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `font-chars`. If not, see <https://www.gnu.org/licenses/>.

//! The seam between [`FontChars`](crate::FontChars) and whatever provides fonts.

use crate::{FontError, MAX_POINT_SIZE};

use piet::{FontFamily, FontWeight};

/// A request for a font: family, size in points and weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRequest {
    /// The requested family.
    family: FontFamily,

    /// Size in typographic points.
    point_size: u32,

    /// Whether the bold variant was requested.
    bold: bool,
}

impl FontRequest {
    /// Validate and build a request.
    ///
    /// The generic names `serif`, `sans-serif`, `monospace` and `system-ui` refer to the
    /// host's default families of that kind.
    pub fn new(name: &str, point_size: u32, bold: bool) -> Result<Self, FontError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FontError::InvalidFamilyName);
        }

        if point_size == 0 || point_size > MAX_POINT_SIZE {
            return Err(FontError::InvalidSize(point_size));
        }

        let family = match name.to_ascii_lowercase().as_str() {
            "serif" => FontFamily::SERIF,
            "sans-serif" => FontFamily::SANS_SERIF,
            "monospace" => FontFamily::MONOSPACE,
            "system-ui" => FontFamily::SYSTEM_UI,
            _ => FontFamily::new_unchecked(name),
        };

        Ok(Self {
            family,
            point_size,
            bold,
        })
    }

    /// The requested family.
    pub fn family(&self) -> &FontFamily {
        &self.family
    }

    /// The requested size, in points.
    pub fn point_size(&self) -> u32 {
        self.point_size
    }

    /// Was the bold variant requested?
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// The weight corresponding to the bold flag.
    pub fn weight(&self) -> FontWeight {
        if self.bold {
            FontWeight::BOLD
        } else {
            FontWeight::NORMAL
        }
    }

    /// Tell if this request names the same font as the given parameters.
    ///
    /// Family names are compared without regard to ASCII case.
    pub fn matches(&self, name: &str, point_size: u32, bold: bool) -> bool {
        self.point_size == point_size
            && self.bold == bold
            && self.family.name().eq_ignore_ascii_case(name.trim())
    }
}

/// Vertical metrics of an acquired face, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceMetrics {
    /// The em size in pixels.
    pub pixel_size: f32,

    /// Distance from the baseline to the top of the tallest glyphs.
    pub ascent: f32,

    /// Distance from the baseline to the bottom of the lowest glyphs, positive downward.
    pub descent: f32,

    /// Extra gap between lines.
    pub leading: f32,
}

impl FaceMetrics {
    /// Height of a character cell: whole pixels above plus whole pixels below the baseline.
    pub fn cell_height(&self) -> u32 {
        let height = self.ascent.max(0.0).ceil() + self.descent.max(0.0).ceil();
        (height as u32).max(1)
    }

    /// Row of the baseline inside a character cell.
    pub fn baseline(&self) -> u32 {
        self.ascent.max(0.0).ceil() as u32
    }
}

/// A single rasterized glyph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterGlyph {
    /// Horizontal pen advance, in pixels.
    pub advance: f32,

    /// Offset from the pen position to the left edge of the bitmap.
    pub left: i32,

    /// Offset from the baseline up to the top edge of the bitmap.
    pub top: i32,

    /// Bitmap width.
    pub width: u32,

    /// Bitmap height.
    pub height: u32,

    /// Row-major 8-bit coverage, `width * height` bytes.
    pub coverage: Vec<u8>,
}

/// Something that can produce fonts from a [`FontRequest`].
///
/// [`FontService`](crate::FontService) is the implementation backed by the host's fonts.
pub trait FontBackend {
    /// The acquired font resource. Dropping it releases the font.
    type Face: FontFace;

    /// Acquire the face that best matches the request.
    ///
    /// A family that the backend does not know must be reported as
    /// [`FontError::FamilyNotFound`], not replaced by another family.
    fn acquire(&mut self, request: &FontRequest) -> Result<Self::Face, FontError>;
}

/// An acquired font face at a fixed pixel size.
pub trait FontFace {
    /// The family name of the face that was actually selected.
    fn family_name(&self) -> &str;

    /// Vertical metrics at the acquired size.
    fn metrics(&self) -> FaceMetrics;

    /// Rasterize a single character.
    ///
    /// Characters the face has no glyph for produce the face's missing-glyph shape.
    fn rasterize(&mut self, ch: char) -> Result<RasterGlyph, FontError>;

    /// Whether bold has to be emulated because the family has no bold face.
    fn synthetic_bold(&self) -> bool {
        false
    }
}
