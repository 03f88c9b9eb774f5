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

//! Cached character cells.

use crate::backend::{FaceMetrics, RasterGlyph};
use crate::FontError;

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;

/// Characters below this code point live in a direct lookup table.
const DIRECT_TABLE_SIZE: usize = 256;

/// One rendered character: a `width × height` coverage cell with the baseline at a fixed row.
#[derive(Clone, PartialEq, Eq)]
pub struct CharData {
    ch: char,
    width: u32,
    height: u32,
    spacing: u32,
    coverage: Vec<u8>,
}

impl fmt::Debug for CharData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharData")
            .field("ch", &self.ch)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("spacing", &self.spacing)
            .finish_non_exhaustive()
    }
}

impl CharData {
    /// Compose a cell from a rasterized glyph.
    ///
    /// The glyph is placed relative to the pen at column zero and the baseline row of
    /// `metrics`. Parts sticking out to the left or above/below the cell are clipped.
    /// With `bold`, coverage is smeared one column to the right and the cell grows by one.
    ///
    /// Fails with [`FontError::CellTooLarge`] if the cell does not fit in memory.
    pub(crate) fn compose(
        ch: char,
        glyph: &RasterGlyph,
        metrics: &FaceMetrics,
        bold: bool,
    ) -> Result<Self, FontError> {
        let height = metrics.cell_height();
        let baseline = i64::from(metrics.baseline());
        let extra = u32::from(bold);

        let right = (i64::from(glyph.left) + i64::from(glyph.width)).max(0);
        let right = u32::try_from(right).map_err(|_| FontError::CellTooLarge)?;
        let advance = glyph.advance.max(0.0);
        let width = (advance.ceil() as u32)
            .max(right)
            .checked_add(extra)
            .ok_or(FontError::CellTooLarge)?;
        let spacing = (advance.round() as u32).saturating_add(extra);

        let len = width.checked_mul(height).ok_or(FontError::CellTooLarge)?;
        let mut coverage = vec![0u8; len as usize];

        for row in 0..glyph.height {
            let y = baseline - i64::from(glyph.top) + i64::from(row);
            if y < 0 || y >= i64::from(height) {
                continue;
            }

            for col in 0..glyph.width {
                let x = i64::from(glyph.left) + i64::from(col);
                if x < 0 {
                    continue;
                }

                let value = glyph
                    .coverage
                    .get(row as usize * glyph.width as usize + col as usize)
                    .copied()
                    .unwrap_or(0);
                if value == 0 {
                    continue;
                }

                let index = y as usize * width as usize + x as usize;
                coverage[index] = coverage[index].max(value);
                if bold {
                    coverage[index + 1] = coverage[index + 1].max(value);
                }
            }
        }

        Ok(Self {
            ch,
            width,
            height,
            spacing,
            coverage,
        })
    }

    /// The character this cell shows.
    pub fn ch(&self) -> char {
        self.ch
    }

    /// Width of the cell in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the cell in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// How far the pen moves after drawing this character.
    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    /// Row-major coverage, `width * height` bytes.
    pub fn coverage(&self) -> &[u8] {
        &self.coverage
    }

    /// Coverage at a pixel of the cell, zero outside of it.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }

        self.coverage[(y * self.width + x) as usize]
    }
}

/// Storage for rendered characters of the current font.
pub(crate) struct CharCache {
    /// Latin-1 characters, indexed by code point.
    direct: Vec<Option<CharData>>,

    /// Everything else.
    others: HashMap<char, CharData>,
}

impl Default for CharCache {
    fn default() -> Self {
        let mut direct = Vec::new();
        direct.resize_with(DIRECT_TABLE_SIZE, || None);

        Self {
            direct,
            others: HashMap::new(),
        }
    }
}

impl CharCache {
    pub(crate) fn get(&self, ch: char) -> Option<&CharData> {
        match self.direct.get(ch as usize) {
            Some(slot) => slot.as_ref(),
            None => self.others.get(&ch),
        }
    }

    /// Get a cell, creating it with `f` if it is not cached yet.
    pub(crate) fn get_or_try_insert_with<E>(
        &mut self,
        ch: char,
        f: impl FnOnce() -> Result<CharData, E>,
    ) -> Result<&CharData, E> {
        if let Some(slot) = self.direct.get_mut(ch as usize) {
            let data = match slot.take() {
                Some(data) => data,
                None => f()?,
            };

            return Ok(&*slot.insert(data));
        }

        match self.others.entry(ch) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => Ok(&*entry.insert(f()?)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.direct.iter().filter(|slot| slot.is_some()).count() + self.others.len()
    }

    pub(crate) fn clear(&mut self) {
        self.direct.iter_mut().for_each(|slot| *slot = None);
        self.others.clear();
    }
}
