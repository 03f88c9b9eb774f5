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

//! A font backend that knows a fixed list of families and draws every glyph as a box.

#![allow(dead_code)]

use font_chars::{FaceMetrics, FontBackend, FontError, FontFace, FontRequest, RasterGlyph};

use std::cell::Cell;
use std::rc::Rc;

/// Hands out [`StubFace`]s for a fixed set of families.
#[derive(Debug)]
pub struct StubBackend {
    families: Vec<&'static str>,

    /// Faces that have not been dropped yet.
    pub open: Rc<Cell<usize>>,

    /// Number of successful acquisitions.
    pub acquired: usize,

    /// Number of characters rasterized by all faces.
    pub rasterized: Rc<Cell<usize>>,

    /// Overrides the pixel size of every face.
    pub pixel_size: Option<f32>,
}

impl StubBackend {
    pub fn new(families: &[&'static str]) -> Self {
        Self {
            families: families.to_vec(),
            open: Rc::new(Cell::new(0)),
            acquired: 0,
            rasterized: Rc::new(Cell::new(0)),
            pixel_size: None,
        }
    }
}

impl FontBackend for StubBackend {
    type Face = StubFace;

    fn acquire(&mut self, request: &FontRequest) -> Result<StubFace, FontError> {
        let name = request.family().name();
        let family = self
            .families
            .iter()
            .find(|family| family.eq_ignore_ascii_case(name))
            .ok_or_else(|| FontError::FamilyNotFound(name.to_string()))?;

        self.acquired += 1;
        self.open.set(self.open.get() + 1);

        // 96 DPI: four pixels for every three points.
        let pixel_size = self
            .pixel_size
            .unwrap_or(request.point_size() as f32 * 4.0 / 3.0);
        Ok(StubFace {
            family: family.to_string(),
            metrics: FaceMetrics {
                pixel_size,
                ascent: pixel_size * 0.75,
                descent: pixel_size * 0.25,
                leading: 0.0,
            },
            bold: request.is_bold(),
            open: self.open.clone(),
            rasterized: self.rasterized.clone(),
        })
    }
}

/// Every printable glyph is a solid 5×6 box sitting on the baseline, advancing by 7.
/// Spaces are blank and advance by 4.
#[derive(Debug)]
pub struct StubFace {
    family: String,
    metrics: FaceMetrics,
    bold: bool,
    open: Rc<Cell<usize>>,
    rasterized: Rc<Cell<usize>>,
}

impl FontFace for StubFace {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn rasterize(&mut self, ch: char) -> Result<RasterGlyph, FontError> {
        self.rasterized.set(self.rasterized.get() + 1);

        if ch == ' ' {
            return Ok(RasterGlyph {
                advance: 4.0,
                ..RasterGlyph::default()
            });
        }

        Ok(RasterGlyph {
            advance: 7.0,
            left: 1,
            top: 6,
            width: 5,
            height: 6,
            coverage: vec![255; 30],
        })
    }

    // The stub has no bold faces.
    fn synthetic_bold(&self) -> bool {
        self.bold
    }
}

impl Drop for StubFace {
    fn drop(&mut self) {
        self.open.set(self.open.get() - 1);
    }
}
