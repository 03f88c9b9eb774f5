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

//! Where the font database gets loaded.
//!
//! Scanning the host's fonts can take a while, so [`FontService`](crate::FontService) can
//! push that work somewhere else and pick the result up later.

/// Trait for exporting work to another thread.
pub trait ExportWork {
    /// Run this closure, possibly on another thread.
    fn run(self, f: impl FnOnce() + Send + 'static);
}

/// Run work on the current thread. Loading finishes before the service is returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CurrentThread;

impl ExportWork for CurrentThread {
    fn run(self, f: impl FnOnce() + Send + 'static) {
        f()
    }
}

/// Run work on a freshly spawned, detached thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NewThread;

impl ExportWork for NewThread {
    fn run(self, f: impl FnOnce() + Send + 'static) {
        let spawned = std::thread::Builder::new()
            .name("font-chars-loader".into())
            .spawn(f);

        // If the thread could not start, the closure is dropped along with its sender and
        // waiters observe a lost loader.
        if let Err(_err) = spawned {
            error!("failed to spawn font loader thread: {}", _err);
        }
    }
}

/// Run work on the `rayon` thread pool.
#[cfg(feature = "rayon")]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rayon;

#[cfg(feature = "rayon")]
impl ExportWork for Rayon {
    fn run(self, f: impl FnOnce() + Send + 'static) {
        rayon_core::spawn(f)
    }
}
