/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use n3_ftp_client::error::{
    FtpCommandError, FtpFileCopyError, FtpTransferServerError, FtpTransferSetupError,
};
use n3_ftp_client::{
    FtpClient, FtpClientConfig, FtpFileStructure, FtpListParsePolicy, FtpTransferMode,
    TcpConnectionProvider, UnixListEntryParser, UpstreamAddr,
};

struct ScriptedControl {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    buf: String,
}

impl ScriptedControl {
    async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().await.unwrap();
        let (r, w) = stream.into_split();
        ScriptedControl {
            reader: BufReader::new(r),
            writer: w,
            buf: String::new(),
        }
    }

    async fn reply(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn expect(&mut self, prefix: &str) -> String {
        self.buf.clear();
        self.reader.read_line(&mut self.buf).await.unwrap();
        assert!(
            self.buf.starts_with(prefix),
            "expected {prefix:?}, got {:?}",
            self.buf
        );
        self.buf.trim_end().to_string()
    }

    async fn login_anonymous(&mut self) {
        self.reply("220 service ready\r\n").await;
        self.expect("USER anonymous").await;
        self.reply("331 need password\r\n").await;
        self.expect("PASS").await;
        self.reply("230 logged in\r\n").await;
        self.expect("FEAT").await;
        self.reply("500 unknown command\r\n").await;
    }
}

async fn connect_client(
    server: SocketAddr,
    config: FtpClientConfig,
) -> FtpClient<TcpConnectionProvider, TcpStream, std::io::Error, ()> {
    let upstream = UpstreamAddr::from_str(&server.to_string()).unwrap();
    let config = Arc::new(config);
    match FtpClient::connect_to(upstream, TcpConnectionProvider::default(), &(), &config).await {
        Ok(client) => client,
        Err((e, _)) => panic!("connect failed: {e}"),
    }
}

fn port_from_port_cmd(line: &str) -> u16 {
    let arg = line.strip_prefix("PORT ").unwrap();
    let fields: Vec<u16> = arg.split(',').map(|v| v.parse().unwrap()).collect();
    assert_eq!(fields.len(), 6);
    fields[4] * 256 + fields[5]
}

#[tokio::test]
async fn passive_list_with_pager() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.login_anonymous().await;

        ctl.expect("TYPE A").await;
        ctl.reply("200 ok\r\n").await;

        let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let data_port = data_listener.local_addr().unwrap().port();
        ctl.expect("EPSV").await;
        ctl.reply(&format!(
            "229 Entering Extended Passive Mode (|||{data_port}|)\r\n"
        ))
        .await;

        ctl.expect("LIST").await;
        ctl.reply("150 here it comes\r\n").await;
        let (mut data, _) = data_listener.accept().await.unwrap();
        data.write_all(
            b"total 2\r\n\
              -rw-r--r--   1 ftp      ftp          1024 Mar 01 12:30 f1.txt\r\n\
              -rw-r--r--   1 ftp      ftp          2048 Mar 02  2023 f2.txt\r\n",
        )
        .await
        .unwrap();
        drop(data);
        ctl.reply("226 done\r\n").await;

        ctl.expect("QUIT").await;
        ctl.reply("221 bye\r\n").await;
    });

    let mut client = connect_client(server_addr, FtpClientConfig::default()).await;
    client.new_user_session(None, None).await.unwrap();
    client.enter_local_passive_mode();

    let listing = client.fetch_directory_listing("", &()).await.unwrap();
    assert_eq!(listing.raw_lines().len(), 3);

    let entries = listing
        .parse(&UnixListEntryParser::new(), FtpListParsePolicy::Lenient)
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name(), "f1.txt");
    assert_eq!(entries[0].size(), 1024);

    let mut pager = listing.pager(UnixListEntryParser::new());
    let first = pager.get_next(1);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name(), "f1.txt");
    assert!(pager.has_next());
    let rest = pager.get_next(5);
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].name(), "f2.txt");
    assert!(!pager.has_next());
    let back = pager.get_previous(1);
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].name(), "f2.txt");

    client.quit_and_close().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn active_retrieve_completes_after_data_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.login_anonymous().await;

        ctl.expect("TYPE I").await;
        ctl.reply("200 ok\r\n").await;

        let line = ctl.expect("PORT ").await;
        let data_port = port_from_port_cmd(&line);
        ctl.reply("200 ok\r\n").await;

        ctl.expect("RETR file.bin").await;
        ctl.reply("150 opening\r\n").await;
        // connect back only after the preliminary reply, like a real server
        let mut data = TcpStream::connect(("127.0.0.1", data_port)).await.unwrap();
        data.write_all(b"payload-bytes").await.unwrap();
        drop(data);
        ctl.reply("226 transfer complete\r\n").await;
    });

    let mut client = connect_client(server_addr, FtpClientConfig::default()).await;
    client.new_user_session(None, None).await.unwrap();
    client.enter_local_active_mode();

    let mut out = Vec::new();
    let copied = client.retrieve_file("file.bin", &(), &mut out).await.unwrap();
    assert_eq!(copied, 13);
    assert_eq!(out, b"payload-bytes");

    server.await.unwrap();
}

#[tokio::test]
async fn active_retrieve_reports_lost_transfer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.login_anonymous().await;

        ctl.expect("TYPE I").await;
        ctl.reply("200 ok\r\n").await;
        let line = ctl.expect("PORT ").await;
        let data_port = port_from_port_cmd(&line);
        ctl.reply("200 ok\r\n").await;

        ctl.expect("RETR file.bin").await;
        ctl.reply("150 opening\r\n").await;
        let mut data = TcpStream::connect(("127.0.0.1", data_port)).await.unwrap();
        data.write_all(b"trunc").await.unwrap();
        drop(data);
        ctl.reply("426 connection lost\r\n").await;
    });

    let mut client = connect_client(server_addr, FtpClientConfig::default()).await;
    client.new_user_session(None, None).await.unwrap();
    client.enter_local_active_mode();

    let mut out = Vec::new();
    let r = client.retrieve_file("file.bin", &(), &mut out).await;
    assert!(matches!(
        r,
        Err(FtpFileCopyError::ServerReportedError(
            FtpTransferServerError::DataTransferLost
        ))
    ));
}

#[tokio::test]
async fn pasv_redirect_to_foreign_host_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.login_anonymous().await;

        ctl.expect("TYPE I").await;
        ctl.reply("200 ok\r\n").await;
        ctl.expect("PASV").await;
        // redirect to a host other than ourselves
        ctl.reply("227 Entering Passive Mode (127,0,0,2,4,0)\r\n").await;
        // hold the control connection open until the test ends
        let _ = ctl.expect("").await;
    });

    let mut config = FtpClientConfig::default();
    config.always_try_epsv = false;
    let mut client = connect_client(server_addr, config).await;
    client.new_user_session(None, None).await.unwrap();
    client.enter_local_passive_mode();

    let r = client.retrieve_file_start("file.bin", &()).await;
    match r {
        Err(FtpTransferSetupError::DataPeerMismatch { expected, actual }) => {
            assert_eq!(expected, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
            assert_eq!(actual, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn active_data_connection_from_foreign_host_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.login_anonymous().await;

        ctl.expect("TYPE I").await;
        ctl.reply("200 ok\r\n").await;
        let line = ctl.expect("PORT ").await;
        let data_port = port_from_port_cmd(&line);
        ctl.reply("200 ok\r\n").await;

        ctl.expect("RETR file.bin").await;
        ctl.reply("150 opening\r\n").await;
        // a third party beats the server to the data port
        let socket = TcpSocket::new_v4().unwrap();
        socket
            .bind("127.0.0.2:0".parse::<SocketAddr>().unwrap())
            .unwrap();
        let rogue = socket
            .connect(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                data_port,
            ))
            .await
            .unwrap();
        // keep the connection open, the client must drop it
        let _ = ctl.expect("").await;
        drop(rogue);
    });

    let mut client = connect_client(server_addr, FtpClientConfig::default()).await;
    client.new_user_session(None, None).await.unwrap();
    client.enter_local_active_mode();

    let r = client.retrieve_file_start("file.bin", &()).await;
    match r {
        Err(FtpTransferSetupError::DataPeerMismatch { actual, .. }) => {
            assert_eq!(actual, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn structure_mode_and_status_verbs() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.login_anonymous().await;

        ctl.expect("STRU F").await;
        ctl.reply("200 ok\r\n").await;
        ctl.expect("MODE S").await;
        ctl.reply("200 ok\r\n").await;
        ctl.expect("MODE B").await;
        ctl.reply("504 not for this server\r\n").await;
        ctl.expect("ALLO 4096").await;
        ctl.reply("202 superfluous\r\n").await;
        ctl.expect("STAT").await;
        ctl.reply("211-status follows\r\n connected\r\n211 end\r\n")
            .await;
        ctl.expect("HELP").await;
        ctl.reply("214 nothing to say\r\n").await;
        ctl.expect("SITE CHMOD 644 f.txt").await;
        ctl.reply("200 done\r\n").await;
    });

    let mut client = connect_client(server_addr, FtpClientConfig::default()).await;
    client.new_user_session(None, None).await.unwrap();

    client
        .set_file_structure(FtpFileStructure::File)
        .await
        .unwrap();
    client
        .set_transfer_mode(FtpTransferMode::Stream)
        .await
        .unwrap();
    let r = client.set_transfer_mode(FtpTransferMode::Block).await;
    assert!(matches!(r, Err(FtpCommandError::ParameterNotImplemented(_))));
    client.allocate_space(4096).await.unwrap();

    let status = client.request_server_status("").await.unwrap();
    assert_eq!(status.len(), 3);
    let help = client.request_help("").await.unwrap();
    assert_eq!(help.len(), 1);
    client.send_site_command("CHMOD 644 f.txt").await.unwrap();
}

#[tokio::test]
async fn login_reports_refused_credentials() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ctl = ScriptedControl::accept(&listener).await;
        ctl.reply("220 service ready\r\n").await;
        ctl.expect("USER anonymous").await;
        ctl.reply("331 need password\r\n").await;
        ctl.expect("PASS").await;
        ctl.reply("530 not welcome here\r\n").await;
    });

    let mut client = connect_client(server_addr, FtpClientConfig::default()).await;
    let logged_in = client.login(None, None).await.unwrap();
    assert!(!logged_in);
}
