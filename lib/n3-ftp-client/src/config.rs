/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::time::Duration;

const MINIMAL_LINE_LEN: usize = 64;

/// Limits and timeouts for the control connection.
#[derive(Debug, Clone)]
pub struct FtpControlConfig {
    pub max_line_len: usize,
    pub max_multi_lines: usize,
    pub command_timeout: Duration,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: 2048,
            max_multi_lines: 128,
            command_timeout: Duration::from_secs(30),
        }
    }
}

impl FtpControlConfig {
    pub fn set_max_line_len(&mut self, len: usize) {
        self.max_line_len = len.max(MINIMAL_LINE_LEN);
    }
}

/// Limits and timeouts for data connections and transfers.
#[derive(Debug, Clone)]
pub struct FtpTransferConfig {
    pub list_max_line_len: usize,
    pub list_max_entries: usize,
    pub list_all_timeout: Duration,
    pub end_wait_timeout: Duration,
    pub data_connect_timeout: Duration,
    pub data_accept_timeout: Duration,
    /// require the data connection peer to be the control connection peer
    pub verify_data_peer: bool,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            list_max_line_len: 2048,
            list_max_entries: 65536,
            list_all_timeout: Duration::from_secs(300),
            end_wait_timeout: Duration::from_secs(60),
            data_connect_timeout: Duration::from_secs(30),
            data_accept_timeout: Duration::from_secs(60),
            verify_data_peer: true,
        }
    }
}

impl FtpTransferConfig {
    pub fn set_list_all_timeout(&mut self, timeout: Duration) {
        self.list_all_timeout = timeout;
    }
}

#[derive(Debug, Clone)]
pub struct FtpClientConfig {
    pub control: FtpControlConfig,
    pub transfer: FtpTransferConfig,
    pub connect_timeout: Duration,
    pub greeting_timeout: Duration,
    pub always_try_epsv: bool,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: FtpControlConfig::default(),
            transfer: FtpTransferConfig::default(),
            connect_timeout: Duration::from_secs(30),
            greeting_timeout: Duration::from_secs(10),
            always_try_epsv: true,
        }
    }
}
