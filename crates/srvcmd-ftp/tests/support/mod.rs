//! Scripted in-process FTP server for integration tests.
//!
//! Serves exactly one control connection on `127.0.0.1:0`, records every
//! command line it receives and keeps uploaded files in memory. Explicit
//! FTPS is available when the script carries a server TLS config.

#![allow(dead_code)]

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use srvcmd_core::{Protocol, Session};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

trait Io: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

type Control = BufReader<Box<dyn Io>>;

/// How the mock server answers.
#[derive(Clone)]
pub struct Script {
    pub greeting: String,
    pub user_reply: String,
    pub pass_reply: String,
    /// Per-path `MKD` replies; anything else gets 257.
    pub mkd_replies: HashMap<String, String>,
    pub list_body: String,
    /// Reply sent after a data transfer finishes.
    pub complete_reply: String,
    pub files: HashMap<String, Vec<u8>>,
    pub tls: Option<Arc<rustls::ServerConfig>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: "220 ready".into(),
            user_reply: "331 Password required".into(),
            pass_reply: "230 Logged in".into(),
            mkd_replies: HashMap::new(),
            list_body: String::new(),
            complete_reply: "226 Transfer complete".into(),
            files: HashMap::new(),
            tls: None,
        }
    }
}

impl Script {
    pub fn with_tls(mut self) -> Self {
        self.tls = Some(self_signed_server_config());
        self
    }

    pub fn mkd(mut self, path: &str, reply: &str) -> Self {
        self.mkd_replies.insert(path.into(), reply.into());
        self
    }

    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        self.files.insert(path.into(), contents.to_vec());
        self
    }
}

pub struct MockFtp {
    pub addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    _task: JoinHandle<()>,
}

impl MockFtp {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let files = Arc::new(Mutex::new(script.files.clone()));

        let state = (commands.clone(), files.clone());
        let task = tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = serve(stream, script, state.0, state.1).await;
            }
        });

        Self {
            addr,
            commands,
            files,
            _task: task,
        }
    }

    /// An FTP session pointing at this server.
    pub fn session(&self, use_tls: bool) -> Session {
        let mut session = Session::new("mock", Protocol::Ftp, "127.0.0.1", "bob");
        session.port = self.addr.port();
        session.use_tls = use_tls;
        session
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Recorded commands starting with `verb`.
    pub fn commands_named(&self, verb: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .collect()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

pub fn self_signed_server_config() -> Arc<rustls::ServerConfig> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_der = CertificateDer::from(cert.serialize_der().unwrap());
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.serialize_private_key_der()));
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der)
        .unwrap();
    Arc::new(config)
}

async fn reply(ctl: &mut Control, line: &str) -> io::Result<()> {
    let stream = ctl.get_mut();
    stream.write_all(format!("{}\r\n", line).as_bytes()).await?;
    stream.flush().await
}

/// Accept the passive connection as soon as the client dials, securing it
/// when the control channel is TLS.
async fn accept_data(listener: TcpListener, tls: Option<TlsAcceptor>) -> io::Result<Box<dyn Io>> {
    let (tcp, _) = listener.accept().await?;
    let stream: Box<dyn Io> = match tls {
        Some(acceptor) => Box::new(acceptor.accept(tcp).await?),
        None => Box::new(tcp),
    };
    Ok(stream)
}

async fn serve(
    stream: TcpStream,
    script: Script,
    commands: Arc<Mutex<Vec<String>>>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
) -> io::Result<()> {
    let plain: Box<dyn Io> = Box::new(stream);
    let mut ctl: Control = BufReader::new(plain);
    let mut secured = false;
    let mut pending: Option<JoinHandle<io::Result<Box<dyn Io>>>> = None;

    reply(&mut ctl, &script.greeting).await?;

    loop {
        let mut line = String::new();
        if ctl.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        commands.lock().unwrap().push(line.clone());

        let (verb, arg) = match line.split_once(' ') {
            Some((v, a)) => (v.to_ascii_uppercase(), a.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        match verb.as_str() {
            "AUTH" => match script.tls.clone() {
                Some(config) => {
                    reply(&mut ctl, "234 Proceed with negotiation").await?;
                    let inner = ctl.into_inner();
                    let tls: Box<dyn Io> = Box::new(TlsAcceptor::from(config).accept(inner).await?);
                    ctl = BufReader::new(tls);
                    secured = true;
                }
                None => reply(&mut ctl, "502 TLS not available").await?,
            },
            "USER" => reply(&mut ctl, &script.user_reply).await?,
            "PASS" => reply(&mut ctl, &script.pass_reply).await?,
            "MKD" => {
                let answer = script
                    .mkd_replies
                    .get(&arg)
                    .cloned()
                    .unwrap_or_else(|| format!("257 \"{}\" created", arg));
                reply(&mut ctl, &answer).await?;
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                let acceptor = match (&script.tls, secured) {
                    (Some(config), true) => Some(TlsAcceptor::from(config.clone())),
                    _ => None,
                };
                pending = Some(tokio::spawn(accept_data(listener, acceptor)));
                let text = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{})",
                    port / 256,
                    port % 256
                );
                reply(&mut ctl, &text).await?;
            }
            "LIST" | "STOR" | "RETR" => {
                let Some(handle) = pending.take() else {
                    reply(&mut ctl, "425 Use PASV first").await?;
                    continue;
                };
                let mut data = handle.await.map_err(io::Error::other)??;

                let download = if verb == "RETR" {
                    let stored = files.lock().unwrap().get(&arg).cloned();
                    match stored {
                        Some(bytes) => Some(bytes),
                        None => {
                            drop(data);
                            reply(&mut ctl, "550 No such file").await?;
                            continue;
                        }
                    }
                } else {
                    None
                };

                reply(&mut ctl, "150 Opening data connection").await?;
                match verb.as_str() {
                    "LIST" => {
                        data.write_all(script.list_body.as_bytes()).await?;
                        data.shutdown().await?;
                    }
                    "STOR" => {
                        let mut received = Vec::new();
                        data.read_to_end(&mut received).await?;
                        files.lock().unwrap().insert(arg, received);
                    }
                    _ => {
                        data.write_all(&download.unwrap_or_default()).await?;
                        data.shutdown().await?;
                    }
                }
                drop(data);
                reply(&mut ctl, &script.complete_reply).await?;
            }
            "QUIT" => {
                reply(&mut ctl, "221 Goodbye").await?;
                return Ok(());
            }
            _ => reply(&mut ctl, "502 Command not implemented").await?,
        }
    }
}
