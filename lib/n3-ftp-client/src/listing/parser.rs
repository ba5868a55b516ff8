/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use super::FtpListEntry;

/// How to treat a non-blank line that fails to parse after the leading
/// preamble has been stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtpListParsePolicy {
    /// skip the line, keep the rest of the listing
    #[default]
    Lenient,
    /// discard the whole listing, a single misparsed boundary may corrupt
    /// every following field offset in some formats
    Strict,
}

/// One listing grammar.
///
/// `parse_entry` turns a single raw line into a structured entry, or
/// nothing if the line does not belong to the grammar. `pre_parse` runs
/// once over the raw buffer before any entry is handed out; grammars with
/// semantic preprocessing needs, such as version deduplication, override
/// it.
pub trait FtpListEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpListEntry>;

    /// Strip the leading banner run, such as a `total 12` summary line.
    /// Only lines before the first parsable one are considered banner
    /// content; later unparsable lines are a matter of parse policy.
    fn pre_parse(&self, mut lines: Vec<String>) -> Vec<String> {
        let skip = lines
            .iter()
            .take_while(|line| self.parse_entry(line).is_none())
            .count();
        if skip > 0 {
            lines.drain(..skip);
        }
        lines
    }
}
