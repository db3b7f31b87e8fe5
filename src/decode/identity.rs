//! Recovers an author identity and an original filename from an encoded
//! submission name.
//!
//! Bulk-download exports name every file by a fixed convention:
//! `<author>_<submission-id>_<timestamp>_<original-stem>.<ext>`, with a
//! `-copyN`-style disambiguator appended to the stem when the platform saw a
//! resubmission. The decoder recovers the pieces by delimiter position alone;
//! it never interprets the metadata fields between the first and third
//! delimiter.

#![allow(missing_docs)]

use memchr::{memchr, memrchr};
use serde::Serialize;

use crate::core::errors::{Result, SfoError};

/// Decoding characters, validated to single ASCII bytes by config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeRules {
    /// Separator between encoded fields.
    pub field_delimiter: u8,
    /// Introduces a copy-identifier suffix on the decoded stem.
    pub copy_marker: u8,
}

impl Default for DecodeRules {
    fn default() -> Self {
        Self::new(b'_', b'-')
    }
}

/// Identity recovered from one raw filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedIdentity {
    /// Submitter identifier: everything before the first field delimiter.
    pub author_key: String,
    /// Original file stem, copy-identifier suffix stripped.
    pub original_stem: String,
    /// Extension after the last `.` in the raw name.
    pub extension: String,
}

impl DecodedIdentity {
    /// Destination filename: the original stem with its extension restored.
    #[must_use]
    pub fn destination_name(&self) -> String {
        format!("{}.{}", self.original_stem, self.extension)
    }
}

impl DecodeRules {
    /// Build rules from validated single ASCII characters.
    #[must_use]
    pub fn new(field_delimiter: u8, copy_marker: u8) -> Self {
        debug_assert!(field_delimiter.is_ascii() && copy_marker.is_ascii());
        Self {
            field_delimiter,
            copy_marker,
        }
    }

    /// Author key: the substring before the first field delimiter.
    ///
    /// A name with no delimiter, or with nothing before it, cannot encode an
    /// author and is malformed. The key becomes a directory name downstream,
    /// so it must also be a plain path component: `.`, `..`, and separator
    /// characters are rejected rather than resolved against the output root.
    pub fn decode_author<'a>(&self, raw: &'a str) -> Result<&'a str> {
        let first = memchr(self.field_delimiter, raw.as_bytes()).ok_or_else(|| {
            SfoError::MalformedName {
                name: raw.to_string(),
                details: "missing field delimiter",
            }
        })?;
        if first == 0 {
            return Err(SfoError::MalformedName {
                name: raw.to_string(),
                details: "empty author key",
            });
        }
        let author = &raw[..first];
        if author == "." || author == ".." || author.contains(['/', '\\']) {
            return Err(SfoError::MalformedName {
                name: raw.to_string(),
                details: "author key is not a plain directory name",
            });
        }
        Ok(author)
    }

    /// Original stem: the substring strictly between the third field
    /// delimiter and the *last* `.` (so multi-dot filenames keep their true
    /// extension), with the copy-identifier suffix stripped.
    ///
    /// Returns the empty string — deterministically, never an error — when
    /// the last `.` sits at or before the third delimiter, keeping the
    /// fan-out pass total over its input set.
    pub fn decode_original_stem(&self, raw: &str) -> Result<String> {
        let (stem, _) = self.stem_and_extension(raw)?;
        Ok(stem)
    }

    /// Decode the full identity for one raw filename.
    pub fn decode(&self, raw: &str) -> Result<DecodedIdentity> {
        let author_key = self.decode_author(raw)?.to_string();
        let (original_stem, extension) = self.stem_and_extension(raw)?;
        Ok(DecodedIdentity {
            author_key,
            original_stem,
            extension,
        })
    }

    /// Truncate a stem at the first copy-marker occurrence.
    ///
    /// This is prefix truncation, not suffix removal: `Essay-copy2` becomes
    /// `Essay`, and so does `Essay-v1-copy2`. Intentional — it recovers the
    /// canonical name the platform disambiguated.
    #[must_use]
    pub fn strip_copy_identifier<'a>(&self, stem: &'a str) -> &'a str {
        memchr(self.copy_marker, stem.as_bytes()).map_or(stem, |idx| &stem[..idx])
    }

    fn stem_and_extension(&self, raw: &str) -> Result<(String, String)> {
        let bytes = raw.as_bytes();
        let third = self.nth_delimiter(bytes, 3).ok_or_else(|| {
            SfoError::MalformedName {
                name: raw.to_string(),
                details: "fewer than three field delimiters",
            }
        })?;
        let dot = memrchr(b'.', bytes).ok_or_else(|| SfoError::MalformedName {
            name: raw.to_string(),
            details: "no extension separator",
        })?;

        let extension = raw[dot + 1..].to_string();
        if dot <= third {
            // Extension separator before the third delimiter: no stem can be
            // recovered. Deterministic empty result, not an error.
            return Ok((String::new(), extension));
        }

        let stem = self.strip_copy_identifier(&raw[third + 1..dot]);
        Ok((stem.to_string(), extension))
    }

    /// Byte index of the `n`-th delimiter occurrence, scanning left to right
    /// with each search starting after the previous match.
    fn nth_delimiter(&self, bytes: &[u8], n: usize) -> Option<usize> {
        let mut from = 0;
        let mut found = None;
        for _ in 0..n {
            let idx = memchr(self.field_delimiter, &bytes[from..])? + from;
            found = Some(idx);
            from = idx + 1;
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_author_before_first_delimiter() {
        let rules = DecodeRules::default();
        let author = rules
            .decode_author("alice_20230101_120000_Essay1.java")
            .unwrap();
        assert_eq!(author, "alice");
    }

    #[test]
    fn author_without_delimiter_is_malformed() {
        let rules = DecodeRules::default();
        let err = rules.decode_author("README.java").unwrap_err();
        assert_eq!(err.code(), "SFO-2002");
        assert!(err.is_per_file());
    }

    #[test]
    fn leading_delimiter_means_empty_author_key() {
        let rules = DecodeRules::default();
        let err = rules.decode_author("_20230101_120000_Essay1.java").unwrap_err();
        assert!(err.to_string().contains("empty author key"));
    }

    #[test]
    fn dot_dot_author_key_is_malformed() {
        // The key turns into a directory name; relative components must not
        // resolve against the output root.
        let rules = DecodeRules::default();
        for raw in [".._1_1_Evil.java", "._1_1_Evil.java", "a/b_1_1_Evil.java"] {
            let err = rules.decode_author(raw).unwrap_err();
            assert_eq!(err.code(), "SFO-2002");
            assert!(err.is_per_file());
        }
    }

    #[test]
    fn decodes_stem_between_third_delimiter_and_extension() {
        let rules = DecodeRules::default();
        let stem = rules
            .decode_original_stem("alice_20230101_120000_Essay1.java")
            .unwrap();
        assert_eq!(stem, "Essay1");
    }

    #[test]
    fn strips_copy_identifier_suffix() {
        let rules = DecodeRules::default();
        assert_eq!(rules.strip_copy_identifier("Essay-copy2"), "Essay");
        let stem = rules
            .decode_original_stem("bob_20230101_120000_Essay1-2.java")
            .unwrap();
        assert_eq!(stem, "Essay1");
    }

    #[test]
    fn copy_stripping_truncates_at_first_marker() {
        // Prefix truncation by design: everything after the first marker goes.
        let rules = DecodeRules::default();
        assert_eq!(rules.strip_copy_identifier("Essay-v1-copy2"), "Essay");
    }

    #[test]
    fn fewer_than_three_delimiters_is_malformed() {
        let rules = DecodeRules::default();
        let err = rules.decode_original_stem("alice_123_Essay.java").unwrap_err();
        assert_eq!(err.code(), "SFO-2002");
    }

    #[test]
    fn missing_extension_separator_is_malformed() {
        let rules = DecodeRules::default();
        let err = rules
            .decode_original_stem("alice_20230101_120000_Makefile")
            .unwrap_err();
        assert!(err.to_string().contains("no extension separator"));
    }

    #[test]
    fn extension_dot_before_third_delimiter_yields_empty_stem() {
        // Delimiters at positions 1, 7, 9; the only dot precedes all but the
        // first. Must stay deterministic, never slice out of bounds.
        let rules = DecodeRules::default();
        let stem = rules.decode_original_stem("a_b.txt_c_d").unwrap();
        assert_eq!(stem, "");
    }

    #[test]
    fn multi_dot_names_keep_true_extension() {
        let rules = DecodeRules::default();
        let id = rules.decode("carol_1_2_notes.tar.gz").unwrap();
        assert_eq!(id.original_stem, "notes.tar");
        assert_eq!(id.extension, "gz");
        assert_eq!(id.destination_name(), "notes.tar.gz");
    }

    #[test]
    fn decode_assembles_full_identity() {
        let rules = DecodeRules::default();
        let id = rules.decode("alice_20230101_120000_Essay1.java").unwrap();
        assert_eq!(
            id,
            DecodedIdentity {
                author_key: "alice".to_string(),
                original_stem: "Essay1".to_string(),
                extension: "java".to_string(),
            }
        );
        assert_eq!(id.destination_name(), "Essay1.java");
    }

    #[test]
    fn custom_rules_respect_configured_characters() {
        let rules = DecodeRules::new(b'+', b'~');
        let id = rules.decode("dave+1+2+Essay~copy3.txt").unwrap();
        assert_eq!(id.author_key, "dave");
        assert_eq!(id.original_stem, "Essay");
    }

    proptest! {
        // Decoding must be total: arbitrary input produces Ok or a typed
        // error, never a panic.
        #[test]
        fn decoding_never_panics(raw in ".*") {
            let rules = DecodeRules::default();
            let _ = rules.decode_author(&raw);
            let _ = rules.decode_original_stem(&raw);
            let _ = rules.decode(&raw);
        }

        #[test]
        fn well_formed_names_round_trip(
            author in "[a-z]{1,8}",
            submission in "[0-9]{1,8}",
            timestamp in "[0-9]{1,6}",
            stem in "[A-Za-z0-9]{1,12}",
            ext in "[a-z]{1,4}",
        ) {
            let raw = format!("{author}_{submission}_{timestamp}_{stem}.{ext}");
            let rules = DecodeRules::default();
            let id = rules.decode(&raw).unwrap();
            prop_assert_eq!(&id.author_key, &author);
            prop_assert_eq!(&id.original_stem, &stem);
            prop_assert!(!id.original_stem.contains('_'));
            // Re-applying the extension yields a valid relative filename.
            let rebuilt = id.destination_name();
            prop_assert_eq!(rebuilt, format!("{stem}.{ext}"));
        }

        #[test]
        fn short_names_always_fail_typed(
            a in "[a-z]{1,8}",
            b in "[a-z]{0,8}",
            ext in "[a-z]{1,3}",
        ) {
            // At most two delimiters — decoding must fail, not throw.
            let raw = format!("{a}_{b}.{ext}");
            let rules = DecodeRules::default();
            let err = rules.decode_original_stem(&raw).unwrap_err();
            prop_assert_eq!(err.code(), "SFO-2002");
        }
    }
}
