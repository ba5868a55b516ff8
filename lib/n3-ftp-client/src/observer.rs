/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

/// Passive protocol tracing hook. Observers are notified after a command
/// line has been written and after a reply has been fully read; they have
/// no effect on protocol behavior.
pub trait FtpEventObserver {
    fn on_command_sent(&mut self, verb: &str, raw: &str) {
        let _ = verb;
        let _ = raw;
    }

    fn on_reply_received(&mut self, code: u16, raw: &str) {
        let _ = code;
        let _ = raw;
    }
}

#[derive(Default)]
pub(crate) struct FtpEventObserverList {
    observers: Vec<Box<dyn FtpEventObserver + Send>>,
}

impl FtpEventObserverList {
    pub(crate) fn push(&mut self, observer: Box<dyn FtpEventObserver + Send>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify_command_sent(&mut self, verb: &str, raw: &str) {
        for o in self.observers.iter_mut() {
            o.on_command_sent(verb, raw);
        }
    }

    pub(crate) fn notify_reply_received(&mut self, code: u16, raw: &str) {
        for o in self.observers.iter_mut() {
            o.on_reply_received(code, raw);
        }
    }
}
