/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::io;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Arg, ArgAction, Command, value_parser};
use clap_complete::Shell;

use n3_ftp_client::{
    FtpClient, FtpClientConfig, Password, TcpConnectionProvider, UpstreamAddr, Username,
};

mod logger;
mod observer;

mod cmd_del;
mod cmd_get;
mod cmd_list;
mod cmd_mkd;
mod cmd_mv;
mod cmd_put;
mod cmd_quote;
mod cmd_rmd;
mod cmd_stat;

const GLOBAL_ARG_COMPLETION: &str = "completion";
const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_ACTIVE: &str = "active";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

fn build_cli_args() -> Command {
    Command::new("n3-ftp")
        .arg(
            Arg::new(GLOBAL_ARG_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTP server address")
                .num_args(1)
                .value_name("SERVER ADDRESS")
                .required_unless_present(GLOBAL_ARG_COMPLETION),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_ACTIVE)
                .help("use active mode data connections")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("active")
                .short('A')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(cmd_list::command())
        .subcommand(cmd_stat::command())
        .subcommand(cmd_get::command())
        .subcommand(cmd_put::command())
        .subcommand(cmd_del::command())
        .subcommand(cmd_rmd::command())
        .subcommand(cmd_mkd::command())
        .subcommand(cmd_mv::command())
        .subcommand(cmd_quote::command())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(GLOBAL_ARG_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    let logger = logger::SyncLogger::new(verbose_level);
    logger.into_global_logger()?;

    let server = args
        .get_one::<String>(GLOBAL_ARG_SERVER)
        .ok_or_else(|| anyhow!("no server address set"))?;
    let mut server =
        UpstreamAddr::from_str(server).map_err(|e| anyhow!("invalid server address: {e}"))?;
    if server.port() == 0 {
        server.set_port(21);
    }

    let username = args
        .get_one::<String>(GLOBAL_ARG_USERNAME)
        .map(|s| Username::from_original(s))
        .transpose()
        .map_err(|e| anyhow!("invalid username: {e}"))?;
    let password = args
        .get_one::<String>(GLOBAL_ARG_PASSWORD)
        .map(|s| Password::from_original(s))
        .transpose()
        .map_err(|e| anyhow!("invalid password: {e}"))?;

    let bind_ip = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP).copied();
    let conn_provider = TcpConnectionProvider::new(bind_ip);

    let config = Arc::new(FtpClientConfig::default());

    let Some((subcommand, args)) = args.subcommand() else {
        return Err(anyhow!("no subcommand found"));
    };

    let mut client = match FtpClient::connect_to(server, conn_provider, &(), &config).await {
        Ok(client) => client,
        Err((e, _)) => return Err(e.into()),
    };
    if verbose_level > 0 {
        client.add_observer(Box::new(observer::StderrTracer::default()));
    }
    client
        .new_user_session(username.as_ref(), password.as_ref())
        .await?;
    if args.get_flag(GLOBAL_ARG_ACTIVE) {
        client.enter_local_active_mode();
    } else {
        // passive gets through NAT, so it is the command line default
        client.enter_local_passive_mode();
    }

    let ret = match subcommand {
        cmd_list::COMMAND => cmd_list::run(&mut client, args).await,
        cmd_stat::COMMAND => cmd_stat::run(&mut client, args).await,
        cmd_get::COMMAND => cmd_get::run(&mut client, args).await,
        cmd_put::COMMAND => cmd_put::run(&mut client, args).await,
        cmd_del::COMMAND => cmd_del::run(&mut client, args).await,
        cmd_rmd::COMMAND => cmd_rmd::run(&mut client, args).await,
        cmd_mkd::COMMAND => cmd_mkd::run(&mut client, args).await,
        cmd_mv::COMMAND => cmd_mv::run(&mut client, args).await,
        cmd_quote::COMMAND => cmd_quote::run(&mut client, args).await,
        cmd => Err(anyhow!("invalid subcommand {cmd}")),
    };

    client.quit_and_close().await?;

    ret
}
