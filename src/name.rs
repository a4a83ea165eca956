// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS name algebra.
//!
//! A [`DnsName`] is a sequence of labels, leftmost first, compared
//! case-insensitively. Zone names are absolute; record owner names are
//! relative to their zone and become absolute through [`DnsName::concatenate`].
//! The canonical text form is lowercase and carries no trailing dot; the
//! empty name (a relativised apex) renders as `@`.

use thiserror::Error;

/// A DNS name failed basic label validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid DNS name: '{name}'")]
pub struct InvalidName {
    /// The offending input text
    pub name: String,
}

/// A DNS name as an ordered list of lowercase labels, leftmost first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DnsName {
    labels: Vec<String>,
}

impl DnsName {
    /// The empty name. Relative contexts render it as `@`.
    #[must_use]
    pub fn empty() -> Self {
        Self { labels: Vec::new() }
    }

    /// Parse a name from text.
    ///
    /// Accepts `@` and the empty string as the empty name, tolerates a
    /// single trailing dot, and lowercases every label.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidName`] when the text contains an empty label
    /// (consecutive or leading dots).
    pub fn from_text(text: &str) -> Result<Self, InvalidName> {
        let trimmed = text.strip_suffix('.').unwrap_or(text);
        if trimmed.is_empty() || trimmed == "@" {
            return Ok(Self::empty());
        }

        let mut labels = Vec::new();
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(InvalidName {
                    name: text.to_string(),
                });
            }
            labels.push(label.to_ascii_lowercase());
        }
        Ok(Self { labels })
    }

    /// Number of labels in the name.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// True for the empty name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The leftmost label, if any.
    #[must_use]
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// The name with its leftmost label removed, if any.
    #[must_use]
    pub fn parent(&self) -> Option<DnsName> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Self {
            labels: self.labels[1..].to_vec(),
        })
    }

    /// True when `self` is equal to or ends with `other`.
    #[must_use]
    pub fn is_subdomain(&self, other: &DnsName) -> bool {
        self.labels.ends_with(&other.labels)
    }

    /// Append `origin`, turning a relative name into an absolute one.
    #[must_use]
    pub fn concatenate(&self, origin: &DnsName) -> DnsName {
        let mut labels = self.labels.clone();
        labels.extend(origin.labels.iter().cloned());
        Self { labels }
    }

    /// Strip the `origin` suffix, turning an absolute name into one
    /// relative to `origin`. The origin itself relativises to the empty
    /// name. Returns `None` when `self` is not under `origin`.
    #[must_use]
    pub fn relativize(&self, origin: &DnsName) -> Option<DnsName> {
        if !self.is_subdomain(origin) {
            return None;
        }
        Some(Self {
            labels: self.labels[..self.labels.len() - origin.label_count()].to_vec(),
        })
    }

    /// The wildcard sibling of this name: `*` prepended to the parent.
    ///
    /// `anything.example.com` maps to `*.example.com`. The empty name has
    /// no parent and yields `None`.
    #[must_use]
    pub fn wildcard_sibling(&self) -> Option<DnsName> {
        let parent = self.parent()?;
        let mut labels = Vec::with_capacity(parent.label_count() + 1);
        labels.push("*".to_string());
        labels.extend(parent.labels);
        Some(Self { labels })
    }
}

impl std::fmt::Display for DnsName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.labels.is_empty() {
            return write!(f, "@");
        }
        write!(f, "{}", self.labels.join("."))
    }
}

impl std::str::FromStr for DnsName {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}
