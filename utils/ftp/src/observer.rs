/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use n3_ftp_client::FtpEventObserver;

/// Control channel tracer for verbose runs. Passwords are masked.
#[derive(Default)]
pub(crate) struct StderrTracer {}

impl FtpEventObserver for StderrTracer {
    fn on_command_sent(&mut self, verb: &str, raw: &str) {
        if verb == "PASS" {
            eprintln!("> PASS ***");
        } else {
            eprintln!("> {raw}");
        }
    }

    fn on_reply_received(&mut self, _code: u16, raw: &str) {
        for line in raw.lines() {
            eprintln!("< {line}");
        }
    }
}
