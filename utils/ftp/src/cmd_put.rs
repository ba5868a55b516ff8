/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use n3_ftp_client::{FtpClient, FtpConnectionProvider, FtpTransferType};

pub(super) const COMMAND: &str = "put";

const COMMAND_ARG_LOCAL_PATH: &str = "local-path";
const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_ASCII: &str = "ascii";
const COMMAND_ARG_APPEND: &str = "append";
const COMMAND_ARG_UNIQUE: &str = "unique";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Upload file")
        .arg(
            Arg::new(COMMAND_ARG_LOCAL_PATH)
                .value_name("LOCAL PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .help("remote file path, required unless --unique is set")
                .value_name("FILE PATH")
                .num_args(1)
                .required_unless_present(COMMAND_ARG_UNIQUE),
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
            Arg::new(COMMAND_ARG_APPEND)
                .help("append to the remote file instead of replacing it")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("append")
                .conflicts_with(COMMAND_ARG_UNIQUE),
        )
        .arg(
            Arg::new(COMMAND_ARG_UNIQUE)
                .help("let the server pick a unique remote name")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("unique"),
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
    let local_path = args
        .get_one::<String>(COMMAND_ARG_LOCAL_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();

    if args.get_flag(COMMAND_ARG_ASCII) {
        client.set_transfer_type(FtpTransferType::Ascii);
    }

    let mut file = tokio::fs::File::open(local_path).await?;

    let copied = if args.get_flag(COMMAND_ARG_UNIQUE) {
        client.store_unique_file(&(), &mut file).await?
    } else {
        let path = args
            .get_one::<String>(COMMAND_ARG_PATH)
            .map(|s| s.as_str())
            .unwrap_or_default();
        if args.get_flag(COMMAND_ARG_APPEND) {
            client.append_file(path, &(), &mut file).await?
        } else {
            client.store_file(path, &(), &mut file).await?
        }
    };
    log::info!("sent {copied} bytes");

    Ok(())
}
