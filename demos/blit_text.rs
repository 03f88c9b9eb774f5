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

//! Render a line of text with a system font and print it as ASCII art.
//!
//! Usage: `cargo run --example blit_text -- [FAMILY] [SIZE] [--bold] [TEXT]`

use font_chars::FontChars;

const SHADES: &[u8] = b" .:-=+*#%@";

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    let bold = match args.iter().position(|arg| arg == "--bold") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };

    let mut args = args.into_iter();
    let family = args.next().unwrap_or_else(|| "sans-serif".into());
    let size = args.next().and_then(|s| s.parse().ok()).unwrap_or(12);
    let text = args.next().unwrap_or_else(|| "Hello, world!".into());

    let mut chars = FontChars::new();
    if let Err(err) = chars.initialize_font(&family, size, bold) {
        tracing::error!("cannot use {:?} at {}pt: {}", family, size, err);
        std::process::exit(1);
    }

    let size = chars.measure(&text).unwrap();
    tracing::info!(
        "rendering {:?} with {} into {}x{} pixels",
        text,
        chars.family_name().unwrap_or_default(),
        size.width,
        size.height
    );
    let stride = size.width as usize;
    let height = size.height as usize;
    let mut surface = vec![0u8; stride * height];

    let mut x = 0;
    for ch in text.chars() {
        x += chars.blit_char(ch, &mut surface, stride, x, 0).unwrap() as i32;
    }

    for row in surface.chunks(stride.max(1)) {
        let line = row
            .iter()
            .map(|&c| SHADES[c as usize * (SHADES.len() - 1) / 255] as char)
            .collect::<String>();
        println!("{}", line.trim_end());
    }
}
