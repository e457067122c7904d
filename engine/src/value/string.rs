// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dual Latin-1 / UTF-16 string representation (`spec.md` §3 "Strings are
//! polymorphic").
//!
//! A [`JsString`] stores its narrowest fitting representation: Latin-1
//! (8-bit) when every code unit is below 0x100, UTF-16 (16-bit) otherwise.
//! [`StringBuilder`] tracks the narrowest representation that still fits
//! while accumulating pieces and promotes on demand, per `spec.md` §4.1.

use gc::{Finalize, Trace};
use std::cmp::Ordering;

/// Maximum length accepted by [`StringBuilder::finish`], matching the
/// engine-wide string-length ceiling `spec.md` §4.1 calls out as a *range*
/// failure source.
pub const MAX_STRING_LENGTH: usize = 1 << 30;

#[derive(Debug, Clone, Trace, Finalize)]
pub enum JsString {
    Latin1(Box<[u8]>),
    Utf16(Box<[u16]>),
}

impl JsString {
    pub fn from_utf8(src: &str) -> Self {
        if src.is_ascii() {
            JsString::Latin1(src.as_bytes().to_vec().into_boxed_slice())
        } else {
            JsString::Utf16(src.encode_utf16().collect::<Vec<_>>().into_boxed_slice())
        }
    }

    pub fn from_latin1(src: Vec<u8>) -> Self {
        JsString::Latin1(src.into_boxed_slice())
    }

    pub fn from_utf16(src: Vec<u16>) -> Self {
        // Narrow back down to Latin-1 if every unit fits; keeps the
        // "narrowest representation" invariant even for externally-built
        // buffers (e.g. string concatenation results).
        if src.iter().all(|u| *u <= 0xFF) {
            JsString::Latin1(src.iter().map(|u| *u as u8).collect::<Vec<_>>().into_boxed_slice())
        } else {
            JsString::Utf16(src.into_boxed_slice())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            JsString::Latin1(s) => s.len(),
            JsString::Utf16(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// UTF-16 code unit at `index`, or `None` if out of range. This is the
    /// indexing ECMAScript `String.prototype.charCodeAt` uses, so it must
    /// work uniformly over either representation.
    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        match self {
            JsString::Latin1(s) => s.get(index).map(|b| *b as u16),
            JsString::Utf16(s) => s.get(index).copied(),
        }
    }

    pub fn to_utf16(&self) -> Vec<u16> {
        match self {
            JsString::Latin1(s) => s.iter().map(|b| *b as u16).collect(),
            JsString::Utf16(s) => s.to_vec(),
        }
    }

    /// Lossy UTF-8 rendering (unpaired surrogates become U+FFFD). Used for
    /// host-facing `Display`/diagnostics, never for spec algorithms that
    /// must see raw code units.
    pub fn to_string_lossy(&self) -> String {
        match self {
            JsString::Latin1(s) => s.iter().map(|b| *b as char).collect(),
            JsString::Utf16(s) => char::decode_utf16(s.iter().copied())
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        }
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        match (self, other) {
            (JsString::Latin1(a), JsString::Latin1(b)) => {
                let mut v = Vec::with_capacity(a.len() + b.len());
                v.extend_from_slice(a);
                v.extend_from_slice(b);
                JsString::Latin1(v.into_boxed_slice())
            }
            _ => {
                let mut v = self.to_utf16();
                v.extend(other.to_utf16());
                JsString::from_utf16(v)
            }
        }
    }
}

impl PartialEq for JsString {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsString::Latin1(a), JsString::Latin1(b)) => a == b,
            (JsString::Utf16(a), JsString::Utf16(b)) => a == b,
            _ => self.len() == other.len() && self.to_utf16() == other.to_utf16(),
        }
    }
}
impl Eq for JsString {}

impl PartialOrd for JsString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for JsString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utf16().cmp(&other.to_utf16())
    }
}

impl std::hash::Hash for JsString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            JsString::Latin1(s) => {
                for b in s.iter() {
                    state.write_u16(*b as u16);
                }
            }
            JsString::Utf16(s) => {
                for u in s.iter() {
                    state.write_u16(*u);
                }
            }
        }
        state.write_u8(0xFF);
    }
}

/// Accumulates string content while tracking the narrowest representation
/// that still fits, promoting from Latin-1 to UTF-16 only when a non-Latin-1
/// unit is pushed (`spec.md` §4.1).
#[derive(Debug, Default)]
pub struct StringBuilder {
    latin1: Vec<u8>,
    utf16: Option<Vec<u16>>,
}

impl StringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, s: &str) {
        if let Some(buf) = &mut self.utf16 {
            buf.extend(s.encode_utf16());
            return;
        }
        if s.is_ascii() {
            self.latin1.extend_from_slice(s.as_bytes());
        } else {
            self.promote();
            self.utf16.as_mut().unwrap().extend(s.encode_utf16());
        }
    }

    pub fn push_code_unit(&mut self, unit: u16) {
        if let Some(buf) = &mut self.utf16 {
            buf.push(unit);
            return;
        }
        if unit <= 0xFF {
            self.latin1.push(unit as u8);
        } else {
            self.promote();
            self.utf16.as_mut().unwrap().push(unit);
        }
    }

    pub fn push_js_string(&mut self, s: &JsString) {
        match s {
            JsString::Latin1(bytes) if self.utf16.is_none() => {
                self.latin1.extend_from_slice(bytes);
            }
            _ => {
                for unit in s.to_utf16() {
                    self.push_code_unit(unit);
                }
            }
        }
    }

    fn promote(&mut self) {
        if self.utf16.is_none() {
            self.utf16 = Some(self.latin1.iter().map(|b| *b as u16).collect());
        }
    }

    pub fn len(&self) -> usize {
        self.utf16.as_ref().map(|b| b.len()).unwrap_or(self.latin1.len())
    }

    /// Finalizes the builder into a [`JsString`], failing with a *range*
    /// error if the content exceeds [`MAX_STRING_LENGTH`].
    pub fn finish(self) -> Result<JsString, ()> {
        if self.len() > MAX_STRING_LENGTH {
            return Err(());
        }
        Ok(match self.utf16 {
            Some(buf) => JsString::from_utf16(buf),
            None => JsString::Latin1(self.latin1.into_boxed_slice()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowest_representation_is_latin1_for_ascii() {
        let s = JsString::from_utf8("hello");
        assert!(matches!(s, JsString::Latin1(_)));
    }

    #[test]
    fn promotes_to_utf16_for_non_latin1() {
        let s = JsString::from_utf8("héllo \u{1F600}");
        assert!(matches!(s, JsString::Utf16(_)));
    }

    #[test]
    fn builder_promotes_on_demand() {
        let mut b = StringBuilder::new();
        b.push_str("abc");
        b.push_code_unit(0x1234);
        b.push_str("def");
        let s = b.finish().unwrap();
        assert!(matches!(s, JsString::Utf16(_)));
        assert_eq!(s.len(), 7);
    }

    #[test]
    fn cross_representation_equality() {
        let a = JsString::from_latin1(vec![b'a', b'b']);
        let b = JsString::from_utf16(vec![b'a' as u16, b'b' as u16]);
        assert_eq!(a, b);
    }

    #[test]
    fn narrows_back_down_when_every_unit_fits() {
        let s = JsString::from_utf16(vec![0x61, 0x62]);
        assert!(matches!(s, JsString::Latin1(_)));
    }
}
