/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, Stdout};

use n3_ftp_client::{
    FtpClient, FtpConnectionProvider, FtpLineDataReceiver, FtpListParsePolicy, UnixListEntryParser,
};

pub(super) const COMMAND: &str = "list";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_PARSED: &str = "parsed";
const COMMAND_ARG_STRICT: &str = "strict";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("List path")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("FILE PATH")
                .num_args(1),
        )
        .arg(
            Arg::new(COMMAND_ARG_PARSED)
                .help("parse entries instead of dumping raw lines")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("parsed"),
        )
        .arg(
            Arg::new(COMMAND_ARG_STRICT)
                .help("fail on any unparsable entry line")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("strict")
                .requires(COMMAND_ARG_PARSED),
        )
}

pub(super) async fn run<CP, S, E>(
    client: &mut FtpClient<CP, S, E, ()>,
    args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S, E, ()>,
    S: AsyncRead + AsyncWrite + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();

    if args.get_flag(COMMAND_ARG_PARSED) {
        let policy = if args.get_flag(COMMAND_ARG_STRICT) {
            FtpListParsePolicy::Strict
        } else {
            FtpListParsePolicy::Lenient
        };
        let listing = client.fetch_directory_listing(path, &()).await?;
        let Some(entries) = listing.parse(&UnixListEntryParser::new(), policy) else {
            return Err(anyhow::anyhow!("listing contains unparsable lines"));
        };
        for entry in entries {
            match entry.link_target() {
                Some(target) => println!(
                    "{:?} {:>12} {} -> {}",
                    entry.file_type(),
                    entry.size(),
                    entry.name(),
                    target
                ),
                None => println!(
                    "{:?} {:>12} {}",
                    entry.file_type(),
                    entry.size(),
                    entry.name()
                ),
            }
        }
        return Ok(());
    }

    let mut line_receiver = StdioLineReceiver::default();
    let data_stream = client.list_directory_detailed_start(path, &()).await?;
    client
        .list_directory_detailed_receive(data_stream, &mut line_receiver)
        .await?;
    Ok(())
}

pub struct StdioLineReceiver {
    io: Stdout,
    has_error: bool,
}

impl Default for StdioLineReceiver {
    fn default() -> Self {
        StdioLineReceiver {
            io: tokio::io::stdout(),
            has_error: false,
        }
    }
}

#[async_trait]
impl FtpLineDataReceiver for StdioLineReceiver {
    async fn recv_line(&mut self, line: &str) {
        self.has_error = self.io.write_all(line.as_bytes()).await.is_err();
    }

    #[inline]
    fn should_return_early(&self) -> bool {
        self.has_error
    }
}
