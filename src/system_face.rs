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

//! Faces acquired from the [`FontService`](crate::FontService), rasterized with `swash`.

use crate::backend::{FaceMetrics, FontFace, RasterGlyph};
use crate::font_service::FaceLease;
use crate::FontError;

use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::FontRef;

use std::fmt;
use std::sync::Arc;

/// A face owned by the caller, at a fixed pixel size.
///
/// The face keeps its own copy of the font data, so it stays usable while the font
/// service is busy. Dropping it releases the face.
pub struct SystemFace {
    /// Counts this face as open until dropped.
    _lease: FaceLease,

    /// Family the face was selected from.
    family: String,

    /// Raw font file data.
    data: Arc<[u8]>,

    /// Index of the face in a font collection.
    index: usize,

    /// Em size in pixels.
    pixel_size: f32,

    /// Bold is emulated.
    synthetic_bold: bool,

    /// Metrics at `pixel_size`.
    metrics: FaceMetrics,

    /// Scratch state for the scaler.
    context: ScaleContext,
}

impl fmt::Debug for SystemFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemFace")
            .field("family", &self.family)
            .field("index", &self.index)
            .field("pixel_size", &self.pixel_size)
            .field("synthetic_bold", &self.synthetic_bold)
            .finish_non_exhaustive()
    }
}

impl SystemFace {
    pub(crate) fn new(
        lease: FaceLease,
        family: String,
        data: Arc<[u8]>,
        index: usize,
        pixel_size: f32,
        synthetic_bold: bool,
    ) -> Result<Self, FontError> {
        let font = FontRef::from_index(&data, index).ok_or(FontError::MalformedFace)?;

        let metrics = {
            let metrics = font.metrics(&[]);
            let scale = pixel_size / f32::from(metrics.units_per_em.max(1));

            FaceMetrics {
                pixel_size,
                ascent: metrics.ascent * scale,
                descent: metrics.descent * scale,
                leading: metrics.leading * scale,
            }
        };

        Ok(Self {
            _lease: lease,
            family,
            data,
            index,
            pixel_size,
            synthetic_bold,
            metrics,
            context: ScaleContext::new(),
        })
    }

    /// Size of the em square in pixels.
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }
}

impl FontFace for SystemFace {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn rasterize(&mut self, ch: char) -> Result<RasterGlyph, FontError> {
        let font = FontRef::from_index(&self.data, self.index).ok_or(FontError::MalformedFace)?;

        // Unmapped characters come back as glyph zero, the missing-glyph shape.
        let glyph_id = font.charmap().map(ch);
        let advance = {
            let units_per_em = f32::from(font.metrics(&[]).units_per_em.max(1));
            font.glyph_metrics(&[]).advance_width(glyph_id) * self.pixel_size / units_per_em
        };

        let mut scaler = self
            .context
            .builder(font)
            .size(self.pixel_size)
            .hint(true)
            .build();
        let image = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ])
        .render(&mut scaler, glyph_id);

        // Whitespace has nothing to draw.
        let image = match image {
            Some(image) => image,
            None => {
                trace!("no image for {:?}, treating as blank", ch);
                return Ok(RasterGlyph {
                    advance,
                    ..RasterGlyph::default()
                });
            }
        };

        let coverage = match image.content {
            Content::Mask => image.data,
            // Keep the alpha channel of colour glyphs.
            Content::Color => image.data.chunks_exact(4).map(|px| px[3]).collect(),
            // Collapse subpixel masks into one coverage value per pixel.
            Content::SubpixelMask => image
                .data
                .chunks_exact(4)
                .map(|px| px[0].max(px[1]).max(px[2]))
                .collect(),
        };

        Ok(RasterGlyph {
            advance,
            left: image.placement.left,
            top: image.placement.top,
            width: image.placement.width,
            height: image.placement.height,
            coverage,
        })
    }

    fn synthetic_bold(&self) -> bool {
        self.synthetic_bold
    }
}
