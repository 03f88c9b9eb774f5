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

//! The font-character collaborator.

use crate::backend::{FaceMetrics, FontBackend, FontFace, FontRequest};
use crate::char_cache::{CharCache, CharData};
use crate::font_service::FontService;
use crate::FontError;

use piet::kurbo::Size;
use tinyvec::TinyVec;

use std::fmt;

/// A font plus the characters rendered with it so far.
///
/// `FontChars` acquires a font from its [`FontBackend`] through
/// [`initialize_font`](Self::initialize_font) and then serves per-character cells, which are
/// rasterized on first use and cached. The font is released when the `FontChars` is dropped,
/// when [`release`](Self::release) is called or when another font replaces it.
pub struct FontChars<B: FontBackend = FontService> {
    /// Where fonts come from.
    backend: B,

    /// The current font, if any.
    font: Option<LoadedFont<B::Face>>,
}

/// An acquired face and its character cache.
struct LoadedFont<F> {
    request: FontRequest,
    face: F,
    metrics: FaceMetrics,
    cache: CharCache,
}

impl<F: FontFace> LoadedFont<F> {
    fn char_data(&mut self, ch: char) -> Result<&CharData, FontError> {
        let Self {
            face,
            metrics,
            cache,
            ..
        } = self;

        cache.get_or_try_insert_with(ch, || {
            trace!("rasterizing {:?}", ch);
            let glyph = face.rasterize(ch)?;
            CharData::compose(ch, &glyph, metrics, face.synthetic_bold())
        })
    }
}

impl<B: FontBackend + fmt::Debug> fmt::Debug for FontChars<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ds = f.debug_struct("FontChars");
        ds.field("backend", &self.backend);

        match &self.font {
            Some(font) => ds
                .field("request", &font.request)
                .field("family", &font.face.family_name())
                .field("cached_chars", &font.cache.len()),
            None => ds.field("request", &None::<FontRequest>),
        };

        ds.finish()
    }
}

impl FontChars<FontService> {
    /// Create a collaborator that takes its fonts from the host font service.
    pub fn new() -> Self {
        Self::with_backend(FontService::new())
    }
}

impl Default for FontChars<FontService> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: FontBackend> FontChars<B> {
    /// Create a collaborator with no font, taking fonts from `backend`.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            font: None,
        }
    }

    /// The backend fonts are acquired from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Acquire the font `name` at `size` points, bold or not.
    ///
    /// On success the previous font, if any, is released and all cached characters are
    /// dropped. On failure the previous font stays in place. Initializing with the font that
    /// is already loaded does nothing; like [`is_font`](Self::is_font), this ignores the
    /// case of the family name.
    ///
    /// # Errors
    ///
    /// - [`FontError::InvalidFamilyName`] if `name` is blank.
    /// - [`FontError::InvalidSize`] if `size` is zero or above [`MAX_POINT_SIZE`].
    /// - [`FontError::FamilyNotFound`] if the backend has no such family.
    /// - Anything else the backend reports, e.g. an unavailable font service.
    ///
    /// [`MAX_POINT_SIZE`]: crate::MAX_POINT_SIZE
    pub fn initialize_font(&mut self, name: &str, size: u32, bold: bool) -> Result<(), FontError> {
        let span = debug_span!("initialize_font", name, size, bold);
        let _enter = span.enter();

        let request = FontRequest::new(name, size, bold)?;

        if self.is_font(name, size, bold) {
            trace!("font is already initialized");
            return Ok(());
        }

        let face = self.backend.acquire(&request).map_err(|err| {
            warn!("failed to acquire font: {}", err);
            err
        })?;
        let metrics = face.metrics();

        debug!(
            "acquired {} at {}px (ascent {}, descent {})",
            face.family_name(),
            metrics.pixel_size,
            metrics.ascent,
            metrics.descent
        );

        // Dropping the old font here releases it.
        self.font = Some(LoadedFont {
            request,
            face,
            metrics,
            cache: CharCache::default(),
        });

        Ok(())
    }

    /// Release the current font. Returns `false` if there was none.
    pub fn release(&mut self) -> bool {
        self.font.take().is_some()
    }

    /// Tell if a font has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.font.is_some()
    }

    /// The request the current font was initialized with.
    pub fn request(&self) -> Option<&FontRequest> {
        self.font.as_ref().map(|font| &font.request)
    }

    /// Family name of the face that was actually selected.
    pub fn family_name(&self) -> Option<&str> {
        self.font.as_ref().map(|font| font.face.family_name())
    }

    /// Tell if the current font was initialized with these parameters.
    pub fn is_font(&self, name: &str, size: u32, bold: bool) -> bool {
        self.request()
            .map_or(false, |request| request.matches(name, size, bold))
    }

    fn font(&self) -> Result<&LoadedFont<B::Face>, FontError> {
        self.font.as_ref().ok_or(FontError::NotInitialized)
    }

    fn font_mut(&mut self) -> Result<&mut LoadedFont<B::Face>, FontError> {
        self.font.as_mut().ok_or(FontError::NotInitialized)
    }

    /// Vertical metrics of the current font.
    pub fn metrics(&self) -> Result<FaceMetrics, FontError> {
        self.font().map(|font| font.metrics)
    }

    /// Height of every character cell, in pixels.
    pub fn char_height(&self) -> Result<u32, FontError> {
        self.font().map(|font| font.metrics.cell_height())
    }

    /// The cell for `ch`, rasterizing it if it is not cached yet.
    pub fn char_data(&mut self, ch: char) -> Result<&CharData, FontError> {
        self.font_mut()?.char_data(ch)
    }

    /// The cell for `ch` if it has already been rasterized.
    pub fn cached_char(&self, ch: char) -> Option<&CharData> {
        self.font.as_ref()?.cache.get(ch)
    }

    /// Number of characters in the cache.
    pub fn cached_chars(&self) -> usize {
        self.font.as_ref().map_or(0, |font| font.cache.len())
    }

    /// Drop all cached characters, keeping the font.
    pub fn clear_cache(&mut self) {
        if let Some(font) = &mut self.font {
            font.cache.clear();
        }
    }

    /// Width of the cell for `ch`, in pixels.
    pub fn char_width(&mut self, ch: char) -> Result<u32, FontError> {
        self.char_data(ch).map(CharData::width)
    }

    /// How far the pen moves after `ch`, in pixels.
    pub fn char_spacing(&mut self, ch: char) -> Result<u32, FontError> {
        self.char_data(ch).map(CharData::spacing)
    }

    /// Draw `ch` into an 8-bit coverage surface with its cell's top-left corner at `(x, y)`.
    ///
    /// `dest` holds rows of `stride` bytes. Pixels outside of the surface are skipped and
    /// coverage is combined with what is already there by taking the maximum.
    ///
    /// Returns the spacing of the character, so the caller can advance the pen.
    pub fn blit_char(
        &mut self,
        ch: char,
        dest: &mut [u8],
        stride: usize,
        x: i32,
        y: i32,
    ) -> Result<u32, FontError> {
        let data = self.char_data(ch)?;
        if stride == 0 {
            return Ok(data.spacing());
        }

        // 64-bit positions: far-off origins clip instead of wrapping.
        let rows = (dest.len() / stride) as i64;
        for cy in 0..data.height() {
            let dy = i64::from(y) + i64::from(cy);
            if dy < 0 || dy >= rows {
                continue;
            }

            for cx in 0..data.width() {
                let dx = i64::from(x) + i64::from(cx);
                if dx < 0 || dx >= stride as i64 {
                    continue;
                }

                let value = data.pixel(cx, cy);
                if value != 0 {
                    let pixel = &mut dest[dy as usize * stride + dx as usize];
                    *pixel = (*pixel).max(value);
                }
            }
        }

        Ok(data.spacing())
    }

    /// Size of `text` drawn one line per `\n`, advancing by each character's spacing.
    ///
    /// Empty text still occupies one line.
    pub fn measure(&mut self, text: &str) -> Result<Size, FontError> {
        let height = self.char_height()?;
        let widths = self.line_widths(text)?;
        let width = widths.iter().copied().max().unwrap_or(0);

        Ok(Size::new(
            f64::from(width),
            f64::from(height) * widths.len() as f64,
        ))
    }

    fn line_widths(&mut self, text: &str) -> Result<TinyVec<[u32; 4]>, FontError> {
        let mut widths = TinyVec::new();

        for line in text.split('\n') {
            let mut width = 0;
            for ch in line.chars().filter(|&ch| ch != '\r') {
                width += self.char_spacing(ch)?;
            }
            widths.push(width);
        }

        Ok(widths)
    }
}
