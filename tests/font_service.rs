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

use cosmic_text::fontdb::Database;
use cosmic_text::FontSystem;

use font_chars::{
    ExportWork, FontBackend, FontChars, FontError, FontFace, FontRequest, FontService, NewThread,
    MAX_DPI, STANDARD_DPI,
};

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn empty_service() -> FontService {
    FontService::from_font_system(FontSystem::new_with_locale_and_db(
        "en-US".into(),
        Database::new(),
    ))
}

/// Holds on to the loading work until told to run it.
#[derive(Clone, Default)]
struct Deferred(Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>);

impl Deferred {
    fn finish(&self) {
        let work = self.0.lock().unwrap().take();
        if let Some(work) = work {
            work();
        }
    }
}

impl ExportWork for Deferred {
    fn run(self, f: impl FnOnce() + Send + 'static) {
        *self.0.lock().unwrap() = Some(Box::new(f));
    }
}

/// Raw data of some font files on this host, one per file.
fn host_font_files() -> Vec<Vec<u8>> {
    let system = FontSystem::new();
    let db = system.db();

    db.faces()
        .filter(|face| face.index == 0)
        .take(16)
        .filter_map(|face| db.with_face_data(face.id, |data, _| data.to_vec()))
        .collect()
}

/// A service holding a single regular-weight face from this host, and its family name.
fn single_face_service() -> Option<(FontService, String)> {
    host_font_files().into_iter().find_map(|data| {
        let service = empty_service();
        let family = service.load_font(&data).ok()?;

        let regular_only = service
            .with_font_system_mut(|system| {
                let mut faces = system.db().faces();
                match (faces.next(), faces.next()) {
                    (Some(face), None) => face.weight.0 < 600,
                    _ => false,
                }
            })
            .ok()?;

        let usable = regular_only && !family.is_empty() && family.trim() == family.as_str();
        usable.then(|| (service, family))
    })
}

/// Throws the loading work away.
struct Lost;

impl ExportWork for Lost {
    fn run(self, f: impl FnOnce() + Send + 'static) {
        drop(f);
    }
}

#[test]
fn missing_family_is_not_substituted() {
    let service = empty_service();
    assert!(service.is_loaded());
    assert_eq!(service.family_name("Arial"), Ok(None));
    assert_eq!(service.family_name("serif"), Ok(None));

    let mut chars = FontChars::with_backend(service.clone());
    assert_eq!(
        chars.initialize_font("Arial", 12, false),
        Err(FontError::FamilyNotFound("Arial".into()))
    );
    assert_eq!(
        chars.initialize_font("monospace", 12, false),
        Err(FontError::FamilyNotFound("monospace".into()))
    );

    let request = FontRequest::new("Arial", 12, false).unwrap();
    assert_eq!(
        service.try_acquire(&request).unwrap_err(),
        FontError::FamilyNotFound("Arial".into())
    );
    assert_eq!(service.open_faces(), 0);
}

#[test]
fn garbage_font_data_is_rejected() {
    let service = empty_service();
    assert_eq!(
        service.load_font(b"definitely not a font"),
        Err(FontError::MalformedFace)
    );
}

#[test]
fn dpi_is_configurable() {
    let service = empty_service();
    assert_eq!(service.dpi(), STANDARD_DPI);
    assert_eq!(service.set_dpi(144.0), Ok(STANDARD_DPI));
    assert_eq!(service.dpi(), 144.0);
    assert_eq!(service.set_dpi(MAX_DPI), Ok(144.0));

    for dpi in [
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
        0.0,
        -96.0,
        MAX_DPI * 2.0,
    ] {
        assert_eq!(service.set_dpi(dpi), Err(FontError::InvalidDpi));
    }
    assert_eq!(service.dpi(), MAX_DPI);
}

#[test]
fn family_lookup_reports_unavailable_service() {
    let service = FontService::with_thread(Deferred::default());
    assert_eq!(service.family_name("Arial"), Err(FontError::NotLoaded));

    let service = FontService::with_thread(Lost);
    assert_eq!(service.family_name("Arial"), Err(FontError::LoaderLost));

    let service = empty_service();
    assert_eq!(service.family_name("  "), Err(FontError::InvalidFamilyName));
}

#[test]
fn service_not_loaded_yet() {
    let deferred = Deferred::default();
    let service = FontService::with_thread(deferred.clone());
    let request = FontRequest::new("Arial", 12, false).unwrap();

    assert!(!service.is_loaded());
    let err = service.try_acquire(&request).unwrap_err();
    assert_eq!(err, FontError::NotLoaded);
    assert!(err.is_service_unavailable());
    assert_eq!(
        service.with_font_system_mut(|_| ()),
        Err(FontError::NotLoaded)
    );

    deferred.finish();
    assert!(service.is_loaded());
}

#[test]
fn service_with_lost_loader() {
    let mut service = FontService::with_thread(Lost);
    let request = FontRequest::new("Arial", 12, false).unwrap();

    assert!(!service.is_loaded());
    assert_eq!(service.wait_for_load_blocking(), Err(FontError::LoaderLost));

    let err = service.acquire(&request).unwrap_err();
    assert_eq!(err, FontError::LoaderLost);
    assert!(err.is_service_unavailable());
}

#[test]
fn service_already_borrowed() {
    let service = empty_service();
    let request = FontRequest::new("Arial", 12, false).unwrap();

    let inner = service
        .with_font_system_mut(|_| service.try_acquire(&request).unwrap_err())
        .unwrap();
    assert_eq!(inner, FontError::AlreadyBorrowed);
    assert!(inner.is_service_unavailable());
}

#[test]
fn async_wait_for_load() {
    let deferred = Deferred::default();
    let service = FontService::with_thread(deferred.clone());
    assert!(!service.is_loaded());

    let loader = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        deferred.finish();
    });

    assert_eq!(pollster::block_on(service.wait_for_load()), Ok(()));
    assert!(service.is_loaded());
    loader.join().unwrap();

    // Already loaded: returns right away.
    assert_eq!(pollster::block_on(service.wait_for_load()), Ok(()));

    let service = FontService::with_thread(Lost);
    assert_eq!(
        pollster::block_on(service.wait_for_load()),
        Err(FontError::LoaderLost)
    );
}

#[test]
fn loads_on_another_thread() {
    let service = FontService::with_thread(NewThread);
    assert_eq!(service.wait_for_load_blocking(), Ok(()));
    assert!(service.is_loaded());
}

#[test]
fn system_font_round_trip() {
    let _ = tracing_subscriber::fmt::try_init();

    let service = FontService::new();
    service.wait_for_load_blocking().unwrap();

    let family = service
        .with_font_system_mut(|system| {
            system
                .db()
                .faces()
                .flat_map(|face| &face.families)
                .map(|(name, _)| name.clone())
                .find(|name| !name.is_empty() && name.trim() == name.as_str())
        })
        .unwrap();

    // Hosts without any fonts have nothing to check.
    let family = match family {
        Some(family) => family,
        None => return,
    };

    let mut chars = FontChars::with_backend(service.clone());
    chars.initialize_font(&family, 16, false).unwrap();
    assert_eq!(service.open_faces(), 1);
    assert_eq!(
        service.family_name(&family.to_ascii_uppercase()),
        Ok(Some(family.clone()))
    );

    let height = chars.char_height().unwrap();
    assert!(height > 0);

    let data = chars.char_data('M').unwrap();
    assert_eq!(data.height(), height);
    assert_eq!(data.coverage().len(), (data.width() * data.height()) as usize);

    let mut surface = vec![0u8; 64 * height as usize];
    let spacing = chars.blit_char('M', &mut surface, 64, 0, 0).unwrap();
    assert_eq!(spacing, chars.char_spacing('M').unwrap());

    drop(chars);
    assert_eq!(service.open_faces(), 0);
}

#[test]
fn loaded_font_can_be_initialized() {
    // Hosts without any fonts have nothing to load.
    let (service, family) = match single_face_service() {
        Some(found) => found,
        None => return,
    };

    assert_eq!(
        service.family_name(&family.to_ascii_lowercase()),
        Ok(Some(family.clone()))
    );

    let mut chars = FontChars::with_backend(service.clone());
    chars.initialize_font(&family, 12, false).unwrap();
    assert_eq!(chars.family_name(), Some(family.as_str()));
    assert!(chars.char_height().unwrap() > 0);
    assert_eq!(service.open_faces(), 1);
}

#[test]
fn generic_family_resolves_to_configured_default() {
    let (service, family) = match single_face_service() {
        Some(found) => found,
        None => return,
    };

    service
        .with_font_system_mut(|system| system.db_mut().set_monospace_family(family.clone()))
        .unwrap();
    assert_eq!(service.family_name("monospace"), Ok(Some(family.clone())));

    let mut chars = FontChars::with_backend(service);
    chars.initialize_font("Monospace", 10, false).unwrap();
    assert_eq!(chars.family_name(), Some(family.as_str()));
    assert!(chars.is_font("monospace", 10, false));
}

#[test]
fn bold_is_synthesized_without_a_bold_face() {
    let (service, family) = match single_face_service() {
        Some(found) => found,
        None => return,
    };

    let bold_request = FontRequest::new(&family, 12, true).unwrap();
    assert!(service.try_acquire(&bold_request).unwrap().synthetic_bold());
    let regular_request = FontRequest::new(&family, 12, false).unwrap();
    assert!(!service.try_acquire(&regular_request).unwrap().synthetic_bold());

    let mut chars = FontChars::with_backend(service);
    chars.initialize_font(&family, 12, false).unwrap();
    let regular = chars.char_data('M').unwrap().clone();

    chars.initialize_font(&family, 12, true).unwrap();
    let bold = chars.char_data('M').unwrap();
    assert_eq!(bold.width(), regular.width() + 1);
    assert_eq!(bold.spacing(), regular.spacing() + 1);
    assert_eq!(bold.height(), regular.height());
}
