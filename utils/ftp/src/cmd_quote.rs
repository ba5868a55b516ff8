/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use n3_ftp_client::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "quote";

const COMMAND_ARG_LINE: &str = "line";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Send a raw command line, such as SITE or STAT")
        .arg(
            Arg::new(COMMAND_ARG_LINE)
                .value_name("COMMAND LINE")
                .num_args(1..)
                .required(true),
        )
}

pub(super) async fn run<CP, S, E, UD>(
    client: &mut FtpClient<CP, S, E, UD>,
    args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S, E, UD>,
    S: AsyncRead + AsyncWrite + Unpin,
    E: std::error::Error,
{
    let line = args
        .get_many::<String>(COMMAND_ARG_LINE)
        .map(|v| v.map(|s| s.as_str()).collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let reply = client.send_raw_command(&line).await?;
    for line in reply.lines() {
        println!("{line}");
    }
    Ok(())
}
