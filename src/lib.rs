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

//! Font acquisition and per-character glyph data built on [`cosmic-text`] and [`swash`].
//!
//! The entry point is [`FontChars`]. It asks a [`FontBackend`] (by default the host's
//! [`FontService`]) for a font matching a family name, a point size and a bold flag, and
//! then hands out per-character metrics and coverage cells that can be blitted onto an
//! 8-bit coverage surface.
//!
//! ```no_run
//! use font_chars::FontChars;
//!
//! let mut chars = FontChars::new();
//! chars.initialize_font("Arial", 12, false)?;
//!
//! let height = chars.char_height()?;
//! let width = chars.char_width('A')?;
//! # let _ = (height, width);
//! # Ok::<(), font_chars::FontError>(())
//! ```
//!
//! # Limitations
//!
//! - Handles are single-threaded; only loading the font database may happen on
//!   another thread (see [`ExportWork`]).
//! - A font family that is not installed is an error. No other family is substituted.
//!
//! [`cosmic-text`]: https://docs.rs/cosmic-text
//! [`swash`]: https://docs.rs/swash

#![allow(clippy::await_holding_refcell_ref)]
#![forbid(unsafe_code, future_incompatible, rust_2018_idioms)]

// Logging shims. These must come before the module declarations.

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($tt:tt)*) => { ::tracing::trace!($($tt)*) };
}

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($tt:tt)*) => { ::tracing::debug!($($tt)*) };
}

#[cfg(feature = "tracing")]
macro_rules! warn {
    ($($tt:tt)*) => { ::tracing::warn!($($tt)*) };
}

#[cfg(feature = "tracing")]
macro_rules! error {
    ($($tt:tt)*) => { ::tracing::error!($($tt)*) };
}

#[cfg(feature = "tracing")]
macro_rules! debug_span {
    ($($tt:tt)*) => { ::tracing::debug_span!($($tt)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($tt:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! error {
    ($($tt:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_span {
    ($($tt:tt)*) => {
        $crate::NoSpan
    };
}

mod backend;
mod channel;
mod char_cache;
mod export_work;
mod font_chars;
mod font_service;
mod system_face;

pub use backend::{FaceMetrics, FontBackend, FontFace, FontRequest, RasterGlyph};
pub use char_cache::CharData;
pub use export_work::{CurrentThread, ExportWork, NewThread};
pub use font_chars::FontChars;
pub use font_service::FontService;
pub use system_face::SystemFace;

#[cfg(feature = "rayon")]
pub use export_work::Rayon;

use std::error::Error as StdError;
use std::fmt;

/// The dots-per-inch assumed when nothing else is configured.
pub const STANDARD_DPI: f64 = 96.0;

/// Typographic points in one inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// The largest point size a font may be initialized with.
pub const MAX_POINT_SIZE: u32 = 1000;

/// The highest resolution the font service can be configured with.
pub const MAX_DPI: f64 = 1200.0;

/// Stand-in for a `tracing` span when logging is compiled out.
#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
pub struct NoSpan;

#[cfg(not(feature = "tracing"))]
impl NoSpan {
    #[inline]
    pub fn enter(&self) {}
}

/// Errors that can occur while acquiring or using a font.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FontError {
    /// The family name was empty.
    InvalidFamilyName,

    /// The point size was zero or larger than [`MAX_POINT_SIZE`].
    InvalidSize(u32),

    /// No face in the font service belongs to this family.
    FamilyNotFound(String),

    /// The font database is still being loaded.
    NotLoaded,

    /// The font system is already borrowed.
    AlreadyBorrowed,

    /// The thread loading the font database went away without delivering it.
    LoaderLost,

    /// The face data could not be parsed.
    MalformedFace,

    /// No font has been initialized yet.
    NotInitialized,

    /// The resolution was not a finite number in `(0, MAX_DPI]`.
    InvalidDpi,

    /// A character cell is too large to be allocated.
    CellTooLarge,
}

impl FontError {
    /// Tell whether this error means that the font service could not be reached.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotLoaded | Self::AlreadyBorrowed | Self::LoaderLost
        )
    }
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFamilyName => f.write_str("font family name is empty"),
            Self::InvalidSize(size) => write!(
                f,
                "font size {} is outside of 1..={}",
                size, MAX_POINT_SIZE
            ),
            Self::FamilyNotFound(name) => write!(f, "font family \"{}\" is not available", name),
            Self::NotLoaded => f.write_str("font system is not yet loaded"),
            Self::AlreadyBorrowed => f.write_str("font system is already borrowed"),
            Self::LoaderLost => f.write_str("font system loader exited without a result"),
            Self::MalformedFace => f.write_str("font face data could not be parsed"),
            Self::NotInitialized => f.write_str("no font has been initialized"),
            Self::InvalidDpi => write!(f, "resolution must be positive and at most {}", MAX_DPI),
            Self::CellTooLarge => f.write_str("character cell is too large"),
        }
    }
}

impl StdError for FontError {}

/// Convert a point size into pixels at the given DPI.
pub(crate) fn points_to_pixels(points: u32, dpi: f64) -> f32 {
    (f64::from(points) * dpi / POINTS_PER_INCH) as f32
}

fn cvt_family(p: &piet::FontFamily) -> cosmic_text::Family<'_> {
    macro_rules! generic {
        ($piet:ident => $cosmic:ident) => {
            if p == &piet::FontFamily::$piet {
                return cosmic_text::Family::$cosmic;
            }
        };
    }

    if p.is_generic() {
        generic!(SERIF => Serif);
        generic!(SANS_SERIF => SansSerif);
        generic!(MONOSPACE => Monospace);
        generic!(SYSTEM_UI => SansSerif);
    }

    cosmic_text::Family::Name(p.name())
}

fn cvt_weight(p: piet::FontWeight) -> cosmic_text::Weight {
    cosmic_text::Weight(p.to_raw())
}
