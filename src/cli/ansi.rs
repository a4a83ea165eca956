// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! ANSI colouring for CLI output.
//!
//! Colour is applied only when stdout supports it, as decided by
//! `supports-color` (which honours `NO_COLOR`, `CLICOLOR` and terminal
//! detection). Piped output stays plain.

use std::fmt::{self, Display};

use supports_color::Stream;

const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[0;33m";
const RESET: &str = "\x1b[0m";

/// Render `content` in red when stdout has colour support.
pub fn red<T: Display>(content: T) -> Styled<T> {
    Styled {
        style: RED,
        content,
    }
}

/// Render `content` in green when stdout has colour support.
pub fn green<T: Display>(content: T) -> Styled<T> {
    Styled {
        style: GREEN,
        content,
    }
}

/// Render `content` in yellow when stdout has colour support.
pub fn yellow<T: Display>(content: T) -> Styled<T> {
    Styled {
        style: YELLOW,
        content,
    }
}

/// A value wrapped with an ANSI style that only takes effect on
/// colour-capable stdout.
pub struct Styled<T: Display> {
    style: &'static str,
    content: T,
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let with_color =
            supports_color::on_cached(Stream::Stdout).is_some_and(|level| level.has_basic);
        if with_color {
            f.write_str(self.style)?;
        }
        self.content.fmt(f)?;
        if with_color {
            f.write_str(RESET)?;
        }
        Ok(())
    }
}
