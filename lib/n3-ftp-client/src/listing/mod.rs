/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::sync::Arc;

use async_trait::async_trait;

use crate::transfer::FtpLineDataReceiver;

mod entry;
pub use entry::{
    FtpAccessClass, FtpEntryTime, FtpFilePermissions, FtpFileType, FtpListEntry,
    FtpPermissionType,
};

mod parser;
pub use parser::{FtpListEntryParser, FtpListParsePolicy};

mod unix;
pub use unix::UnixListEntryParser;

/// Receiver that collects raw LIST lines, end-of-line bytes stripped.
#[derive(Default)]
pub(crate) struct FtpListingCollector {
    lines: Vec<String>,
}

impl FtpListingCollector {
    pub(crate) fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[async_trait]
impl FtpLineDataReceiver for FtpListingCollector {
    async fn recv_line(&mut self, line: &str) {
        self.lines
            .push(line.trim_end_matches(['\r', '\n']).to_string());
    }

    fn should_return_early(&self) -> bool {
        false
    }
}

/// The raw result of one LIST fetch, in server order.
///
/// The buffer is immutable once fetched. Structured access goes through
/// [`parse`](Self::parse) for the whole listing at once, or a
/// [`pager`](Self::pager); several pagers with different grammars may run
/// over the same fetch.
pub struct FtpDirectoryListing {
    lines: Arc<Vec<String>>,
}

impl FtpDirectoryListing {
    pub(crate) fn new(lines: Vec<String>) -> Self {
        FtpDirectoryListing {
            lines: Arc::new(lines),
        }
    }

    #[inline]
    pub fn raw_lines(&self) -> &[String] {
        &self.lines
    }

    /// Parse the whole listing. Under the strict policy a single
    /// unparsable non-blank line past the banner makes the whole fetch
    /// unreliable and yields `None`.
    pub fn parse<P>(&self, parser: &P, policy: FtpListParsePolicy) -> Option<Vec<FtpListEntry>>
    where
        P: FtpListEntryParser,
    {
        let lines = parser.pre_parse(self.lines.as_ref().clone());
        let mut entries = Vec::with_capacity(lines.len());
        for line in &lines {
            match parser.parse_entry(line) {
                Some(entry) => entries.push(entry),
                None => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if policy == FtpListParsePolicy::Strict {
                        return None;
                    }
                }
            }
        }
        Some(entries)
    }

    pub fn pager<P>(&self, parser: P) -> FtpListingPager<P>
    where
        P: FtpListEntryParser,
    {
        FtpListingPager::new(parser.pre_parse(self.lines.as_ref().clone()), parser)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstEntryIndex {
    Unscanned,
    Known(usize),
    Empty,
}

/// Demand-driven cursor over one listing fetch.
///
/// Entries are parsed only as pages are requested, which matters for
/// directories with tens of thousands of entries the caller may never
/// page through.
pub struct FtpListingPager<P: FtpListEntryParser> {
    parser: P,
    lines: Vec<String>,
    first: FirstEntryIndex,
    cursor: usize,
}

impl<P: FtpListEntryParser> FtpListingPager<P> {
    fn new(lines: Vec<String>, parser: P) -> Self {
        FtpListingPager {
            parser,
            lines,
            first: FirstEntryIndex::Unscanned,
            cursor: 0,
        }
    }

    fn resolve_first(&mut self) -> Option<usize> {
        match self.first {
            FirstEntryIndex::Known(i) => Some(i),
            FirstEntryIndex::Empty => None,
            FirstEntryIndex::Unscanned => {
                for (i, line) in self.lines.iter().enumerate() {
                    if self.parser.parse_entry(line).is_some() {
                        self.first = FirstEntryIndex::Known(i);
                        self.cursor = self.cursor.max(i);
                        return Some(i);
                    }
                }
                self.first = FirstEntryIndex::Empty;
                None
            }
        }
    }

    /// Return up to `n` entries from the cursor onwards, `0` meaning all
    /// remaining. Unparsable lines are stepped over.
    pub fn get_next(&mut self, n: usize) -> Vec<FtpListEntry> {
        if self.resolve_first().is_none() {
            return Vec::new();
        }
        let limit = if n == 0 { usize::MAX } else { n };
        let mut out = Vec::new();
        while self.cursor < self.lines.len() && out.len() < limit {
            if let Some(entry) = self.parser.parse_entry(&self.lines[self.cursor]) {
                out.push(entry);
            }
            self.cursor += 1;
        }
        out
    }

    /// Return up to `n` entries going backwards from the cursor, closest
    /// first, `0` meaning all. The cursor cannot retreat past the first
    /// parsable entry.
    pub fn get_previous(&mut self, n: usize) -> Vec<FtpListEntry> {
        let Some(first) = self.resolve_first() else {
            return Vec::new();
        };
        let limit = if n == 0 { usize::MAX } else { n };
        let mut out = Vec::new();
        while self.cursor > first && out.len() < limit {
            self.cursor -= 1;
            if let Some(entry) = self.parser.parse_entry(&self.lines[self.cursor]) {
                out.push(entry);
            }
        }
        out
    }

    pub fn has_next(&mut self) -> bool {
        match self.resolve_first() {
            Some(_) => self.cursor < self.lines.len(),
            None => false,
        }
    }

    pub fn has_previous(&mut self) -> bool {
        match self.resolve_first() {
            Some(first) => self.cursor > first,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_parser() -> UnixListEntryParser {
        UnixListEntryParser::with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn five_entry_listing() -> FtpDirectoryListing {
        FtpDirectoryListing::new(
            (0..5)
                .map(|i| format!("-rw-r--r--   1 user     group       {i} Jan 15 12:34 f{i}"))
                .collect(),
        )
    }

    #[test]
    fn banner_is_stripped() {
        let listing = FtpDirectoryListing::new(vec![
            "total 12".to_string(),
            "-rw-r--r--   1 user     group       4096 Jan 15 12:34 a".to_string(),
            "-rw-r--r--   1 user     group       4096 Jan 15 12:34 b".to_string(),
        ]);
        let entries = listing
            .parse(&test_parser(), FtpListParsePolicy::Lenient)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "a");
    }

    #[test]
    fn mid_listing_gap_by_policy() {
        let listing = FtpDirectoryListing::new(vec![
            "-rw-r--r--   1 user     group       4096 Jan 15 12:34 a".to_string(),
            "no entry here".to_string(),
            "-rw-r--r--   1 user     group       4096 Jan 15 12:34 b".to_string(),
        ]);

        let lenient = listing
            .parse(&test_parser(), FtpListParsePolicy::Lenient)
            .unwrap();
        assert_eq!(lenient.len(), 2);

        assert!(
            listing
                .parse(&test_parser(), FtpListParsePolicy::Strict)
                .is_none()
        );
    }

    #[test]
    fn paging_in_twos() {
        let listing = five_entry_listing();
        let mut pager = listing.pager(test_parser());

        let page = pager.get_next(2);
        assert_eq!(
            page.iter().map(|e| e.name()).collect::<Vec<_>>(),
            ["f0", "f1"]
        );
        let page = pager.get_next(2);
        assert_eq!(
            page.iter().map(|e| e.name()).collect::<Vec<_>>(),
            ["f2", "f3"]
        );
        let page = pager.get_next(2);
        assert_eq!(page.iter().map(|e| e.name()).collect::<Vec<_>>(), ["f4"]);
        assert!(!pager.has_next());
    }

    #[test]
    fn paging_backwards() {
        let listing = five_entry_listing();
        let mut pager = listing.pager(test_parser());

        assert!(!pager.has_previous());
        pager.get_next(3);
        let back = pager.get_previous(2);
        assert_eq!(
            back.iter().map(|e| e.name()).collect::<Vec<_>>(),
            ["f2", "f1"]
        );
        assert!(pager.has_previous());
        assert_eq!(pager.get_previous(0).len(), 1);
        assert!(!pager.has_previous());
    }

    #[test]
    fn get_next_zero_returns_all() {
        let listing = five_entry_listing();
        let mut pager = listing.pager(test_parser());
        assert_eq!(pager.get_next(0).len(), 5);
        assert!(!pager.has_next());
    }

    #[test]
    fn all_unparsable_is_known_empty() {
        let listing = FtpDirectoryListing::new(vec!["garbage".to_string()]);
        let mut pager = listing.pager(test_parser());
        assert!(pager.get_next(0).is_empty());
        assert!(!pager.has_next());
        assert!(!pager.has_previous());
        assert!(pager.get_previous(0).is_empty());
    }

    #[test]
    fn empty_fetch_yields_empty_listing() {
        let listing = FtpDirectoryListing::new(Vec::new());
        assert_eq!(
            listing
                .parse(&test_parser(), FtpListParsePolicy::Strict)
                .unwrap()
                .len(),
            0
        );
        let mut pager = listing.pager(test_parser());
        assert!(!pager.has_next());
    }
}
