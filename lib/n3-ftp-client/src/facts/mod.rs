/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::str::FromStr;

use chrono::{DateTime, Utc};
use mime::Mime;

use crate::error::FtpFileFactsParseError;

mod entry_type;
pub(crate) mod time_val;

pub use entry_type::FtpFileEntryType;

/// Per-file facts as learned from MLST, or pieced together from SIZE and
/// MDTM on servers without MLST support.
pub struct FtpFileFacts {
    entry_path: String,
    entry_type: FtpFileEntryType,
    size: Option<u64>,
    media_type: Option<Mime>,
    modify_time: Option<DateTime<Utc>>,
    create_time: Option<DateTime<Utc>>,
}

impl FtpFileFacts {
    pub(crate) fn new(path: &str) -> Self {
        FtpFileFacts {
            entry_path: path.to_string(),
            entry_type: FtpFileEntryType::Unknown,
            size: None,
            media_type: None,
            modify_time: None,
            create_time: None,
        }
    }

    #[inline]
    pub fn entry_path(&self) -> &str {
        self.entry_path.as_str()
    }

    #[inline]
    pub fn entry_type(&self) -> &FtpFileEntryType {
        &self.entry_type
    }

    #[inline]
    pub fn maybe_file(&self) -> bool {
        self.entry_type.maybe_file()
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = Some(size);
    }

    #[inline]
    pub fn mtime(&self) -> Option<&DateTime<Utc>> {
        self.modify_time.as_ref()
    }

    #[inline]
    pub(crate) fn set_mtime(&mut self, mtime: DateTime<Utc>) {
        self.modify_time = Some(mtime);
    }

    #[inline]
    pub fn ctime(&self) -> Option<&DateTime<Utc>> {
        self.create_time.as_ref()
    }

    #[inline]
    pub fn media_type(&self) -> Option<&Mime> {
        self.media_type.as_ref()
    }

    /// Parse one MLST fact line, `fact=value;fact=value; path`.
    pub(crate) fn parse_line(line: &str) -> Result<Self, FtpFileFactsParseError> {
        if let Some((facts, path)) = line.trim_start().split_once(' ') {
            let mut ff = FtpFileFacts::new(path);

            for fact in facts.split(';') {
                if fact.is_empty() {
                    continue;
                }

                if let Some((key, value)) = fact.split_once('=') {
                    ff.set_fact(key, value)?;
                } else {
                    return Err(FtpFileFactsParseError::NoDelimiterInFact(fact.to_string()));
                }
            }

            Ok(ff)
        } else {
            Err(FtpFileFactsParseError::NoSpaceDelimiter)
        }
    }

    fn set_fact(&mut self, key: &str, value: &str) -> Result<(), FtpFileFactsParseError> {
        match key.to_lowercase().as_str() {
            "type" => self.entry_type = FtpFileEntryType::parse(value),
            "modify" => {
                let dt = time_val::parse_from_str(value)
                    .map_err(FtpFileFactsParseError::InvalidModifyTime)?;
                self.modify_time = Some(dt);
            }
            "create" => {
                let dt = time_val::parse_from_str(value)
                    .map_err(FtpFileFactsParseError::InvalidCreateTime)?;
                self.create_time = Some(dt);
            }
            "size" => {
                let size = u64::from_str(value).map_err(|_| FtpFileFactsParseError::InvalidSize)?;
                self.size = Some(size);
            }
            "media-type" => {
                if let Ok(mime) = value.parse() {
                    self.media_type = Some(mime);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dir_line() {
        let ff = FtpFileFacts::parse_line(
            "type=pdir;sizd=4096;modify=20210525083610;UNIX.mode=0755;UNIX.uid=0;UNIX.gid=0;unique=804g2; /",
        )
        .unwrap();
        assert_eq!(ff.entry_type, FtpFileEntryType::ParentDir);
        assert!(ff.entry_type.is_dir());
        assert!(ff.size.is_none());
        assert!(ff.mtime().is_some());
    }

    #[test]
    fn parse_file_line() {
        let ff =
            FtpFileFacts::parse_line("type=file;size=1024;media-type=text/plain; /srv/a.txt")
                .unwrap();
        assert_eq!(ff.entry_path(), "/srv/a.txt");
        assert!(ff.maybe_file());
        assert_eq!(ff.size(), Some(1024));
        assert_eq!(ff.media_type().unwrap().essence_str(), "text/plain");
    }

    #[test]
    fn reject_fact_without_value() {
        assert!(FtpFileFacts::parse_line("type=file;size; /srv/a.txt").is_err());
    }
}
