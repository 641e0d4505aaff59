//! IRC transport over plain TCP or TLS.
//!
//! Outgoing lines are queued on a channel and written by a dedicated task.
//! Inbound lines are parsed into
//! [`IrcEvent`]s; `PING` is answered here and never reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{debug, info, warn};
use trebek_core::chat::{ChatMessage, ChatSink};
use trebek_core::error::DomainError;

use crate::error::AppError;

/// Outgoing lines buffered before senders wait.
const OUTBOUND_QUEUE: usize = 64;

/// A parsed inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Server keep-alive carrying a token to echo back.
    Ping(String),
    /// Registration finished (`001`).
    Welcome,
    /// A channel or private message.
    Privmsg(ChatMessage),
    /// Anything else.
    Other,
}

/// Parses one raw IRC line (without the trailing CRLF).
#[must_use]
pub fn parse_line(line: &str) -> Line {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(token) = line.strip_prefix("PING ") {
        return Line::Ping(token.trim_start_matches(':').to_owned());
    }

    let (prefix, rest) = match line.strip_prefix(':') {
        Some(rest) => match rest.split_once(' ') {
            Some((prefix, rest)) => (Some(prefix), rest),
            None => return Line::Other,
        },
        None => (None, line),
    };
    let (command, params) = rest.split_once(' ').unwrap_or((rest, ""));

    match command {
        "001" => Line::Welcome,
        "PRIVMSG" => {
            let Some((target, text)) = params.split_once(" :") else {
                return Line::Other;
            };
            let user = prefix
                .and_then(|p| p.split('!').next())
                .unwrap_or_default();
            Line::Privmsg(ChatMessage {
                target: target.trim().to_owned(),
                user: user.to_owned(),
                text: text.trim().to_owned(),
            })
        }
        _ => Line::Other,
    }
}

/// Events surfaced to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// The server accepted our registration.
    Registered,
    /// A message addressed to a channel or to us.
    Message(ChatMessage),
}

/// Queues raw lines for the writer task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IrcSender {
    tx: mpsc::Sender<String>,
}

impl IrcSender {
    /// Wraps the sending half of an outbound line queue.
    #[must_use]
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Queues a raw protocol line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Chat` if the writer task has stopped.
    pub async fn raw(&self, line: String) -> Result<(), DomainError> {
        self.tx
            .send(line)
            .await
            .map_err(|_| DomainError::Chat("IRC connection closed".into()))
    }

    /// Joins `channel`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Chat` if the writer task has stopped.
    pub async fn join(&self, channel: &str) -> Result<(), DomainError> {
        info!(channel, "joining channel");
        self.raw(format!("JOIN {channel}")).await
    }
}

#[async_trait]
impl ChatSink for IrcSender {
    async fn send(&self, target: &str, text: &str) -> Result<(), DomainError> {
        // Embedded line breaks would start a new protocol line.
        let text = text.replace(['\r', '\n'], " ");
        self.raw(format!("PRIVMSG {target} :{text}")).await
    }
}

/// Reads inbound lines, answering `PING`s through its sender.
#[derive(Debug)]
pub struct IrcReader<R> {
    lines: Lines<R>,
    sender: IrcSender,
}

impl<R: AsyncBufRead + Unpin> IrcReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R, sender: IrcSender) -> Self {
        Self {
            lines: reader.lines(),
            sender,
        }
    }

    /// Returns the next event, or `None` when the server closed the
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Server` on a read failure and `AppError::Domain`
    /// if a `PONG` could not be queued.
    pub async fn next_event(&mut self) -> Result<Option<IrcEvent>, AppError> {
        while let Some(line) = self.lines.next_line().await? {
            debug!(line = line.trim_end(), "<--");
            match parse_line(&line) {
                Line::Ping(token) => self.sender.raw(format!("PONG :{token}")).await?,
                Line::Welcome => return Ok(Some(IrcEvent::Registered)),
                Line::Privmsg(message) => return Ok(Some(IrcEvent::Message(message))),
                Line::Other => {}
            }
        }
        Ok(None)
    }
}

/// Writes queued lines with CRLF framing until the queue closes or the
/// socket fails.
pub async fn write_lines<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::Receiver<String>) {
    while let Some(line) = rx.recv().await {
        debug!(line, "-->");
        let framed = format!("{line}\r\n");
        let written = match writer.write_all(framed.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(error) => Err(error),
        };
        if let Err(error) = written {
            warn!(%error, "failed to write to IRC server");
            break;
        }
    }
    debug!("IRC writer stopped");
}

/// Where the IRC server lives and whether to speak TLS to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcEndpoint {
    /// Server address as `host:port`.
    pub address: String,
    /// Wrap the connection in TLS.
    pub tls: bool,
}

type BoxedRead = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;

/// An open IRC connection.
pub struct IrcConnection {
    /// Outbound side.
    pub sender: IrcSender,
    /// Inbound side.
    pub reader: IrcReader<BufReader<BoxedRead>>,
    /// The writer task.
    pub writer: JoinHandle<()>,
}

impl std::fmt::Debug for IrcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrcConnection")
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

/// Connects to `endpoint` and registers as `nick`.
///
/// # Errors
///
/// Returns `AppError::Server` if the connection or TLS handshake fails and
/// `AppError::Tls` if the server address is not a valid TLS server name.
pub async fn connect(endpoint: &IrcEndpoint, nick: &str) -> Result<IrcConnection, AppError> {
    let server = endpoint.address.as_str();
    info!(server, tls = endpoint.tls, nick, "connecting to IRC server");
    let stream = TcpStream::connect(server).await?;
    let (read, write): (BoxedRead, BoxedWrite) = if endpoint.tls {
        let (read, write) = tokio::io::split(tls_handshake(stream, server).await?);
        (Box::new(read), Box::new(write))
    } else {
        let (read, write) = stream.into_split();
        (Box::new(read), Box::new(write))
    };

    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let writer = tokio::spawn(write_lines(write, rx));
    let sender = IrcSender::new(tx);
    sender.raw(format!("NICK {nick}")).await?;
    sender.raw(format!("USER {nick} 0 * :{nick}")).await?;
    info!(server, "connected");

    Ok(IrcConnection {
        reader: IrcReader::new(BufReader::new(read), sender.clone()),
        sender,
        writer,
    })
}

async fn tls_handshake(stream: TcpStream, server: &str) -> Result<TlsStream<TcpStream>, AppError> {
    let host = server_host(server);
    let name = ServerName::try_from(host.to_owned())
        .map_err(|e| AppError::Tls(format!("invalid server name {host:?}: {e}")))?;
    let connector = TlsConnector::from(Arc::new(tls_config()?));
    let stream = connector.connect(name, stream).await?;
    debug!(host, "TLS handshake complete");
    Ok(stream)
}

/// Client config trusting the bundled Mozilla root store.
fn tls_config() -> Result<ClientConfig, AppError> {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| AppError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Host part of a `host:port` address, IPv6 brackets removed.
fn server_host(address: &str) -> &str {
    let host = address.rsplit_once(':').map_or(address, |(host, _)| host);
    host.trim_start_matches('[').trim_end_matches(']')
}
