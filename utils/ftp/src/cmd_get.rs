/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use n3_ftp_client::{FtpClient, FtpConnectionProvider, FtpTransferType};

pub(super) const COMMAND: &str = "get";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_OUTPUT: &str = "output";
const COMMAND_ARG_ASCII: &str = "ascii";
const COMMAND_ARG_OFFSET: &str = "offset";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Download file")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("FILE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_OUTPUT)
                .help("local output file, stdout if not set")
                .value_name("LOCAL PATH")
                .num_args(1)
                .long("output")
                .short('o'),
        )
        .arg(
            Arg::new(COMMAND_ARG_ASCII)
                .help("transfer in ASCII mode")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("ascii")
                .short('a'),
        )
        .arg(
            Arg::new(COMMAND_ARG_OFFSET)
                .help("restart the transfer at this byte offset")
                .value_name("OFFSET")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .long("offset"),
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

    if args.get_flag(COMMAND_ARG_ASCII) {
        client.set_transfer_type(FtpTransferType::Ascii);
    }
    if let Some(offset) = args.get_one::<u64>(COMMAND_ARG_OFFSET) {
        client.set_restart_offset(*offset);
    }

    let copied = match args.get_one::<String>(COMMAND_ARG_OUTPUT) {
        Some(local_path) => {
            let mut file = tokio::fs::File::create(local_path).await?;
            client.retrieve_file(path, &(), &mut file).await?
        }
        None => {
            let mut stdout = tokio::io::stdout();
            client.retrieve_file(path, &(), &mut stdout).await?
        }
    };
    log::info!("fetched {copied} bytes");

    Ok(())
}
