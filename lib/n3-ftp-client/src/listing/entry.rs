/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpFileType {
    File,
    Directory,
    SymbolicLink,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpAccessClass {
    User,
    Group,
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpPermissionType {
    Read,
    Write,
    Execute,
}

/// The nine permission slots of a listing entry, one bit each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FtpFilePermissions(u16);

impl FtpFilePermissions {
    pub(crate) fn set(&mut self, access: FtpAccessClass, perm: FtpPermissionType) {
        self.0 |= 1 << Self::slot(access, perm);
    }

    pub fn allows(&self, access: FtpAccessClass, perm: FtpPermissionType) -> bool {
        self.0 & (1 << Self::slot(access, perm)) != 0
    }

    fn slot(access: FtpAccessClass, perm: FtpPermissionType) -> u16 {
        let a = match access {
            FtpAccessClass::User => 0,
            FtpAccessClass::Group => 1,
            FtpAccessClass::World => 2,
        };
        let p = match perm {
            FtpPermissionType::Read => 0,
            FtpPermissionType::Write => 1,
            FtpPermissionType::Execute => 2,
        };
        a * 3 + p
    }
}

/// Timestamp of a listing entry.
///
/// Unix listings carry either `HH:MM` with no year, for entries the server
/// deems recent, or a bare year with no time of day. The year of a
/// `Recent` value is inferred by the parser and may be off around year
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpEntryTime {
    Recent(NaiveDateTime),
    Dated(NaiveDate),
}

impl FtpEntryTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            FtpEntryTime::Recent(dt) => dt.date(),
            FtpEntryTime::Dated(d) => *d,
        }
    }

    #[inline]
    pub fn has_time_of_day(&self) -> bool {
        matches!(self, FtpEntryTime::Recent(_))
    }
}

/// One successfully parsed listing line.
///
/// There is no defaulted variant of this type: a line the parser cannot
/// make sense of yields no entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpListEntry {
    pub(crate) raw_line: String,
    pub(crate) file_type: FtpFileType,
    pub(crate) name: String,
    pub(crate) link_target: Option<String>,
    pub(crate) user: String,
    pub(crate) group: String,
    pub(crate) size: u64,
    pub(crate) link_count: u32,
    pub(crate) permissions: FtpFilePermissions,
    pub(crate) mtime: Option<FtpEntryTime>,
}

impl FtpListEntry {
    #[inline]
    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    #[inline]
    pub fn file_type(&self) -> FtpFileType {
        self.file_type
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    #[inline]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn link_count(&self) -> u32 {
        self.link_count
    }

    #[inline]
    pub fn permissions(&self) -> FtpFilePermissions {
        self.permissions
    }

    #[inline]
    pub fn mtime(&self) -> Option<&FtpEntryTime> {
        self.mtime.as_ref()
    }
}
