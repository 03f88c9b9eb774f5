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

//! The host font service, backed by a `cosmic-text` `FontSystem`.

use crate::backend::{FontBackend, FontRequest};
use crate::export_work::ExportWork;
use crate::system_face::SystemFace;
use crate::{
    channel, cvt_family, cvt_weight, points_to_pixels, FontError, MAX_DPI, STANDARD_DPI,
};

#[cfg(not(feature = "rayon"))]
use crate::export_work::CurrentThread;

#[cfg(feature = "rayon")]
use crate::export_work::Rayon;

use cosmic_text as ct;
use event_listener::Event;

use ct::fontdb::{Database, Family, Query, Source};
use ct::FontSystem;

use std::cell::{Cell, RefCell, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::Arc;

/// Handle to the host font service.
///
/// Cloning the handle is cheap; all clones share the same font database.
#[derive(Clone)]
pub struct FontService(Rc<Inner>);

impl fmt::Debug for FontService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Borrowed;
        impl fmt::Debug for Borrowed {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("<borrowed>")
            }
        }

        let mut ds = f.debug_struct("FontService");

        let font_db = self.0.font_db.try_borrow();
        let _ = match &font_db {
            Ok(font_db) => ds.field("font_db", font_db),
            Err(_) => ds.field("font_db", &Borrowed),
        };

        ds.field("dpi", &self.0.dpi.get())
            .field("open_faces", &self.0.open_faces.get())
            .finish()
    }
}

/// Inner shared data.
pub(crate) struct Inner {
    /// Font database.
    font_db: RefCell<DelayedFontSystem>,

    /// Signalled whenever the font database is released.
    font_db_free: Event,

    /// The dots-per-inch used to turn points into pixels.
    dpi: Cell<f64>,

    /// Number of faces handed out and not yet dropped.
    open_faces: Cell<usize>,
}

impl Inner {
    fn borrow_font_system(&self) -> Option<FontSystemGuard<'_>> {
        self.font_db
            .try_borrow_mut()
            .map(|font_db| FontSystemGuard {
                font_db,
                font_db_free: &self.font_db_free,
            })
            .ok()
    }
}

/// Keeps the font service alive and counts the face as open until dropped.
pub(crate) struct FaceLease(Rc<Inner>);

impl FaceLease {
    fn new(inner: &Rc<Inner>) -> Self {
        inner.open_faces.set(inner.open_faces.get() + 1);
        Self(inner.clone())
    }
}

impl Drop for FaceLease {
    fn drop(&mut self) {
        let open = self.0.open_faces.get().saturating_sub(1);
        self.0.open_faces.set(open);
        trace!("released face lease, {} still open", open);
    }
}

/// A guard for accessing the font system.
///
/// This is essentially a thread-unsafe mutex that uses `EventListener` for notifications.
struct FontSystemGuard<'a> {
    font_db: RefMut<'a, DelayedFontSystem>,
    font_db_free: &'a Event,
}

impl Deref for FontSystemGuard<'_> {
    type Target = DelayedFontSystem;

    fn deref(&self) -> &Self::Target {
        &self.font_db
    }
}

impl DerefMut for FontSystemGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.font_db
    }
}

impl Drop for FontSystemGuard<'_> {
    fn drop(&mut self) {
        self.font_db_free.notify(1);
    }
}

/// Either a `FontSystem` or a handle that can be resolved to one.
#[allow(clippy::large_enum_variant)] // The FontSystem will be used soon anyway.
enum DelayedFontSystem {
    /// The real font system.
    Real(FontSystem),

    /// We are waiting for a font system to be loaded.
    Waiting(channel::Receiver<FontSystem>),
}

impl fmt::Debug for DelayedFontSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(fs) => f
                .debug_struct("FontSystem")
                .field("faces", &fs.db().len())
                .field("locale", &fs.locale())
                .finish_non_exhaustive(),
            Self::Waiting(_) => f.write_str("<waiting for availability>"),
        }
    }
}

impl DelayedFontSystem {
    /// Get the font system if it has arrived.
    fn get(&mut self) -> Result<Option<&mut FontSystem>, FontError> {
        if let Self::Waiting(recv) = self {
            match recv.try_recv() {
                Ok(Some(system)) => *self = Self::Real(system),
                Ok(None) => return Ok(None),
                Err(channel::Closed) => return Err(FontError::LoaderLost),
            }
        }

        match self {
            Self::Real(system) => Ok(Some(system)),
            Self::Waiting(_) => Ok(None),
        }
    }

    /// Wait until the font system is loaded.
    async fn wait(&mut self) -> Result<&mut FontSystem, FontError> {
        if let Self::Waiting(recv) = self {
            let system = recv.recv().await.map_err(|_| FontError::LoaderLost)?;
            *self = Self::Real(system);
        }

        match self {
            Self::Real(system) => Ok(system),
            Self::Waiting(_) => Err(FontError::NotLoaded),
        }
    }

    /// Wait until the font system is loaded, blocking redux.
    fn wait_blocking(&mut self) -> Result<&mut FontSystem, FontError> {
        if let Self::Waiting(recv) = self {
            let system = recv.recv_blocking().map_err(|_| FontError::LoaderLost)?;
            *self = Self::Real(system);
        }

        match self {
            Self::Real(system) => Ok(system),
            Self::Waiting(_) => Err(FontError::NotLoaded),
        }
    }
}

impl FontService {
    /// Connect to the host font service.
    ///
    /// System fonts are loaded on the current thread, or on the `rayon` pool when the
    /// `rayon` feature is enabled.
    pub fn new() -> Self {
        #[cfg(all(feature = "rayon", not(target_arch = "wasm32")))]
        {
            Self::with_thread(Rayon)
        }

        #[cfg(not(all(feature = "rayon", not(target_arch = "wasm32"))))]
        {
            Self::with_thread(CurrentThread)
        }
    }

    /// Connect to the host font service, loading system fonts on the given thread.
    pub fn with_thread(thread: impl ExportWork) -> Self {
        let (send, recv) = channel::channel();

        thread.run(move || {
            let system = FontSystem::new();
            debug!("loaded {} font faces", system.db().len());
            send.send(system);
        });

        Self::with_delayed_font_system(DelayedFontSystem::Waiting(recv))
    }

    /// Use an existing `FontSystem` as the font service.
    pub fn from_font_system(font_system: FontSystem) -> Self {
        Self::with_delayed_font_system(DelayedFontSystem::Real(font_system))
    }

    fn with_delayed_font_system(font_db: DelayedFontSystem) -> Self {
        Self(Rc::new(Inner {
            font_db: RefCell::new(font_db),
            font_db_free: Event::new(),
            dpi: Cell::new(STANDARD_DPI),
            open_faces: Cell::new(0),
        }))
    }

    /// Get the current dots-per-inch (DPI) used to size fonts.
    pub fn dpi(&self) -> f64 {
        self.0.dpi.get()
    }

    /// Set the dots-per-inch (DPI) used to size fonts acquired from now on.
    ///
    /// Returns the old DPI. Anything that is not a finite value in `(0, MAX_DPI]` is
    /// rejected with [`FontError::InvalidDpi`] and leaves the DPI unchanged.
    ///
    /// [`MAX_DPI`]: crate::MAX_DPI
    pub fn set_dpi(&self, dpi: f64) -> Result<f64, FontError> {
        if !(dpi.is_finite() && dpi > 0.0 && dpi <= MAX_DPI) {
            warn!("rejecting resolution of {} DPI", dpi);
            return Err(FontError::InvalidDpi);
        }

        Ok(self.0.dpi.replace(dpi))
    }

    /// Number of faces acquired from this service that are still alive.
    pub fn open_faces(&self) -> usize {
        self.0.open_faces.get()
    }

    /// Tell if the font system is loaded.
    pub fn is_loaded(&self) -> bool {
        self.0
            .borrow_font_system()
            .map_or(false, |mut font_db| matches!(font_db.get(), Ok(Some(_))))
    }

    /// Wait for the font system to be loaded.
    pub async fn wait_for_load(&self) -> Result<(), FontError> {
        loop {
            if let Ok(mut guard) = self.0.font_db.try_borrow_mut() {
                return guard.wait().await.map(|_| ());
            }

            // Create an event listener.
            let listener = self.0.font_db_free.listen();

            if let Ok(mut guard) = self.0.font_db.try_borrow_mut() {
                return guard.wait().await.map(|_| ());
            }

            // Wait for the event to be signaled.
            listener.await;
        }
    }

    /// Wait for the font system to be loaded, blocking redux.
    pub fn wait_for_load_blocking(&self) -> Result<(), FontError> {
        let mut guard = self
            .0
            .borrow_font_system()
            .ok_or(FontError::AlreadyBorrowed)?;
        guard.wait_blocking().map(|_| ())
    }

    /// Run a closure with mutable access to the underlying `FontSystem`.
    ///
    /// Does not wait for the font system to finish loading.
    pub fn with_font_system_mut<R>(
        &self,
        f: impl FnOnce(&mut FontSystem) -> R,
    ) -> Result<R, FontError> {
        let mut guard = self
            .0
            .borrow_font_system()
            .ok_or(FontError::AlreadyBorrowed)?;
        let system = guard.get()?.ok_or(FontError::NotLoaded)?;
        Ok(f(system))
    }

    /// Resolve a family name to the name the font database uses for it.
    ///
    /// Matching ignores ASCII case. Generic names such as `serif` resolve to the configured
    /// default family of that kind, if it is installed. Returns `Ok(None)` if the family is
    /// not installed, and an error if the name is blank or the font system is unavailable.
    pub fn family_name(&self, name: &str) -> Result<Option<String>, FontError> {
        let request = FontRequest::new(name, 1, false)?;
        self.with_font_system_mut(|system| resolve_family(system.db(), request.family()))
    }

    /// Register a font from its raw bytes and return its family name.
    ///
    /// Only the first face of a font collection is reported.
    pub fn load_font(&self, data: &[u8]) -> Result<String, FontError> {
        let span = debug_span!("load_font", data_len = data.len());
        let _enter = span.enter();

        let mut guard = self
            .0
            .borrow_font_system()
            .ok_or(FontError::AlreadyBorrowed)?;
        let system = guard.wait_blocking()?;

        let ids = system
            .db_mut()
            .load_font_source(Source::Binary(Arc::new(data.to_vec())));

        let id = match ids.len() {
            0 => {
                error!("font data contained no faces");
                return Err(FontError::MalformedFace);
            }
            1 => ids[0],
            _len => {
                warn!("received font collection of length {_len}, only reporting first face");
                ids[0]
            }
        };

        system
            .db()
            .face(id)
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .ok_or(FontError::MalformedFace)
    }

    /// Acquire a face without waiting for the font system to finish loading.
    pub fn try_acquire(&self, request: &FontRequest) -> Result<SystemFace, FontError> {
        let mut guard = self
            .0
            .borrow_font_system()
            .ok_or(FontError::AlreadyBorrowed)?;
        let system = guard.get()?.ok_or(FontError::NotLoaded)?;
        self.acquire_from(system, request)
    }

    fn acquire_from(
        &self,
        system: &FontSystem,
        request: &FontRequest,
    ) -> Result<SystemFace, FontError> {
        let span = debug_span!(
            "acquire",
            family = request.family().name(),
            size = request.point_size(),
            bold = request.is_bold()
        );
        let _enter = span.enter();

        let db = system.db();
        let not_found = || FontError::FamilyNotFound(request.family().name().to_string());

        let family_name = resolve_family(db, request.family()).ok_or_else(not_found)?;

        let id = db
            .query(&Query {
                families: &[Family::Name(&family_name)],
                weight: cvt_weight(request.weight()),
                ..Default::default()
            })
            .ok_or_else(not_found)?;
        let face = db.face(id).ok_or_else(not_found)?;

        // Emulate bold when the family only offers lighter faces.
        let synthetic_bold = request.is_bold() && face.weight.0 < 600;
        if synthetic_bold {
            debug!("no bold face in {}, emulating bold", family_name);
        }

        let (data, index) = db
            .with_face_data(id, |data, index| (Arc::<[u8]>::from(data), index))
            .ok_or(FontError::MalformedFace)?;

        let pixel_size = points_to_pixels(request.point_size(), self.dpi());
        SystemFace::new(
            FaceLease::new(&self.0),
            family_name,
            data,
            index as usize,
            pixel_size,
            synthetic_bold,
        )
    }
}

impl Default for FontService {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBackend for FontService {
    type Face = SystemFace;

    /// Acquire a face, blocking until the font system has been loaded.
    fn acquire(&mut self, request: &FontRequest) -> Result<SystemFace, FontError> {
        let mut guard = self
            .0
            .borrow_font_system()
            .ok_or(FontError::AlreadyBorrowed)?;
        let system = guard.wait_blocking()?;
        self.acquire_from(system, request)
    }
}

/// Find the canonical name of a family in the database.
fn resolve_family(db: &Database, family: &piet::FontFamily) -> Option<String> {
    let installed = |wanted: &str| {
        db.faces()
            .flat_map(|face| &face.families)
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(name, _)| name.clone())
    };

    match cvt_family(family) {
        Family::Name(name) => installed(name),
        generic => installed(db.family_name(&generic)),
    }
}
