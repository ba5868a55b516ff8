/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Utc};

use super::{
    FtpAccessClass, FtpEntryTime, FtpFilePermissions, FtpFileType, FtpListEntry,
    FtpListEntryParser,
};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Whitespace-delimited field scanner that keeps its byte position, so the
/// filename can be taken verbatim after the date field.
struct FieldCursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(s: &'a str) -> Self {
        FieldCursor { s, pos: 0 }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let bytes = self.s.as_bytes();
        while self.pos < bytes.len() && (bytes[self.pos] == b' ' || bytes[self.pos] == b'\t') {
            self.pos += 1;
        }
        let start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos] != b' ' && bytes[self.pos] != b'\t' {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(&self.s[start..self.pos])
        }
    }

    /// The rest of the line after exactly one separating space. Further
    /// whitespace is part of the value, a filename may start with spaces.
    fn remainder_after_one_space(&self) -> Option<&'a str> {
        if *self.s.as_bytes().get(self.pos)? != b' ' {
            return None;
        }
        self.s.get(self.pos + 1..)
    }
}

/// Parser for `ls -l` style Unix listings.
pub struct UnixListEntryParser {
    reference_date: NaiveDate,
}

impl Default for UnixListEntryParser {
    fn default() -> Self {
        UnixListEntryParser {
            reference_date: Utc::now().date_naive(),
        }
    }
}

impl UnixListEntryParser {
    pub fn new() -> Self {
        Default::default()
    }

    /// Fix the date used for year inference of `HH:MM` timestamps.
    pub fn with_reference_date(reference_date: NaiveDate) -> Self {
        UnixListEntryParser { reference_date }
    }

    fn parse_month(token: &str) -> Option<u32> {
        let prefix = token.get(..3)?.to_ascii_lowercase();
        MONTHS
            .iter()
            .position(|m| *m == prefix)
            .map(|i| i as u32 + 1)
    }

    fn parse_timestamp(&self, month: u32, day: u32, token: &str) -> Option<FtpEntryTime> {
        if let Some((hh, mm)) = token.split_once(':') {
            let hour = u32::from_str(hh).ok()?;
            let minute = u32::from_str(mm).ok()?;
            // no year on the wire: assume the most recent occurrence of
            // that month, which misfires around year boundaries but is the
            // convention such servers expect
            let mut year = self.reference_date.year();
            if month > self.reference_date.month() {
                year -= 1;
            }
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
            Some(FtpEntryTime::Recent(date.and_time(time)))
        } else {
            let year = i32::from_str(token).ok()?;
            Some(FtpEntryTime::Dated(NaiveDate::from_ymd_opt(
                year, month, day,
            )?))
        }
    }
}

impl FtpListEntryParser for UnixListEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpListEntry> {
        let line = line.trim_end_matches(['\r', '\n']);
        let bytes = line.as_bytes();
        if bytes.len() < 10 {
            return None;
        }

        let (file_type, is_device) = match bytes[0] {
            b'd' => (FtpFileType::Directory, false),
            b'l' => (FtpFileType::SymbolicLink, false),
            b'b' | b'c' => (FtpFileType::File, true),
            _ => (FtpFileType::File, false),
        };

        // nine permission slots, anything other than '-' counts as granted,
        // so setuid/setgid/sticky markers read as plain grants
        let mut permissions = FtpFilePermissions::default();
        let access_classes = [
            FtpAccessClass::User,
            FtpAccessClass::Group,
            FtpAccessClass::World,
        ];
        let permission_types = [
            super::FtpPermissionType::Read,
            super::FtpPermissionType::Write,
            super::FtpPermissionType::Execute,
        ];
        for (ai, access) in access_classes.iter().enumerate() {
            for (pi, perm) in permission_types.iter().enumerate() {
                if bytes[1 + ai * 3 + pi] != b'-' {
                    permissions.set(*access, *perm);
                }
            }
        }

        let mut cursor = FieldCursor::new(line.get(10..)?);

        let link_count = u32::from_str(cursor.next_token()?).ok()?;
        let user = cursor.next_token()?.to_string();
        let group = cursor.next_token()?.to_string();

        let size = if is_device {
            // major and minor numbers take the place of the size
            cursor.next_token()?;
            cursor.next_token()?;
            0
        } else {
            u64::from_str(cursor.next_token()?).ok()?
        };

        let month = Self::parse_month(cursor.next_token()?)?;
        let day = u32::from_str(cursor.next_token()?).ok()?;
        if !(1..=31).contains(&day) {
            return None;
        }
        let mtime = self.parse_timestamp(month, day, cursor.next_token()?)?;

        let remainder = cursor.remainder_after_one_space()?;
        if remainder.is_empty() {
            return None;
        }
        let (name, link_target) = if file_type == FtpFileType::SymbolicLink {
            match remainder.split_once(" -> ") {
                Some((name, target)) => (name.to_string(), Some(target.to_string())),
                None => (remainder.to_string(), None),
            }
        } else {
            (remainder.to_string(), None)
        };

        Some(FtpListEntry {
            raw_line: line.to_string(),
            file_type,
            name,
            link_target,
            user,
            group,
            size,
            link_count,
            permissions,
            mtime: Some(mtime),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::FtpPermissionType;

    fn parser() -> UnixListEntryParser {
        UnixListEntryParser::with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    #[test]
    fn parse_plain_file() {
        let e = parser()
            .parse_entry("-rw-r--r--   1 user     group       4096 Jan 15 12:34 report.txt")
            .unwrap();
        assert_eq!(e.file_type(), FtpFileType::File);
        assert_eq!(e.size(), 4096);
        assert_eq!(e.link_count(), 1);
        assert_eq!(e.user(), "user");
        assert_eq!(e.group(), "group");
        assert_eq!(e.name(), "report.txt");
        let p = e.permissions();
        assert!(p.allows(FtpAccessClass::User, FtpPermissionType::Read));
        assert!(p.allows(FtpAccessClass::User, FtpPermissionType::Write));
        assert!(!p.allows(FtpAccessClass::User, FtpPermissionType::Execute));
        assert!(p.allows(FtpAccessClass::Group, FtpPermissionType::Read));
        assert!(!p.allows(FtpAccessClass::Group, FtpPermissionType::Write));
        assert!(p.allows(FtpAccessClass::World, FtpPermissionType::Read));
        let mtime = e.mtime().unwrap();
        assert!(mtime.has_time_of_day());
        assert_eq!(mtime.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn parse_directory_with_year() {
        let e = parser()
            .parse_entry("drwxr-xr-x   5 user     group        512 Mar  3  2019 archive")
            .unwrap();
        assert_eq!(e.file_type(), FtpFileType::Directory);
        assert_eq!(e.size(), 512);
        assert_eq!(e.name(), "archive");
        let mtime = e.mtime().unwrap();
        assert!(!mtime.has_time_of_day());
        assert_eq!(mtime.date(), NaiveDate::from_ymd_opt(2019, 3, 3).unwrap());
    }

    #[test]
    fn parse_symlink() {
        let e = parser()
            .parse_entry("lrwxrwxrwx   1 user     group          7 Jun  1 08:00 current -> /data/v3")
            .unwrap();
        assert_eq!(e.file_type(), FtpFileType::SymbolicLink);
        assert_eq!(e.name(), "current");
        assert_eq!(e.link_target(), Some("/data/v3"));
    }

    #[test]
    fn infer_year_backwards() {
        // month later than the reference month means last year
        let e = parser()
            .parse_entry("-rw-r--r--   1 user     group         10 Nov  2 23:59 note")
            .unwrap();
        assert_eq!(
            e.mtime().unwrap().date(),
            NaiveDate::from_ymd_opt(2023, 11, 2).unwrap()
        );
    }

    #[test]
    fn parse_device_entry() {
        let e = parser()
            .parse_entry("brw-rw----   1 root     disk       8,   0 Jan  1 10:00 sda")
            .unwrap();
        assert_eq!(e.file_type(), FtpFileType::File);
        assert_eq!(e.size(), 0);
        assert_eq!(e.name(), "sda");
    }

    #[test]
    fn keep_leading_space_in_name() {
        let e = parser()
            .parse_entry("-rw-r--r--   1 user     group          1 Jan 15 12:34   spaced")
            .unwrap();
        assert_eq!(e.name(), "  spaced");
    }

    #[test]
    fn reject_banner_and_short_lines() {
        let p = parser();
        assert!(p.parse_entry("total 12").is_none());
        assert!(p.parse_entry("").is_none());
        assert!(p.parse_entry("drwxr-x").is_none());
        // missing name after the date field
        assert!(
            p.parse_entry("-rw-r--r--   1 user     group          1 Jan 15 12:34")
                .is_none()
        );
    }

    #[test]
    fn reject_bad_numeric_fields() {
        let p = parser();
        assert!(
            p.parse_entry("-rw-r--r--   x user     group       4096 Jan 15 12:34 a")
                .is_none()
        );
        assert!(
            p.parse_entry("-rw-r--r--   1 user     group       big Jan 15 12:34 a")
                .is_none()
        );
        assert!(
            p.parse_entry("-rw-r--r--   1 user     group       4096 Foo 15 12:34 a")
                .is_none()
        );
        assert!(
            p.parse_entry("-rw-r--r--   1 user     group       4096 Jan 45 12:34 a")
                .is_none()
        );
    }
}
