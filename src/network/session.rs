//! A tiny TCP exchange for checking that an invite actually reaches its host.

use crate::canonical::Endpoint;
use futures::FutureExt as FutureFutureExt;
use futures::StreamExt as FutureStreamExt;
use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use std::net::{Ipv4Addr, Shutdown, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

const MESSAGE_BACKLOG: usize = 16;

pub enum SessionError {
    Io(io::Error),
    Timeout(Duration),
}

impl Debug for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(inner) => Debug::fmt(inner, f),
            SessionError::Timeout(dur) => write!(f, "SessionError::Timeout({:?})", dur),
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(inner) => Display::fmt(inner, f),
            SessionError::Timeout(dur) => {
                write!(f, "Connection timed out after {} ms.", dur.as_millis())
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<io::Error> for SessionError {
    fn from(inner: io::Error) -> Self {
        Self::Io(inner)
    }
}

/// A message received by the host: who sent it and what they said.
pub type Greeting = (SocketAddr, String);

/// Accepts connections in the background and publishes whatever each client
/// sends before closing its side. Stops when dropped.
pub struct HostSession {
    local_addr: SocketAddr,
    messages: broadcast::Sender<Greeting>,
    task: BackgroundTask,
}

impl HostSession {
    pub async fn bind(port: u16) -> Result<Self, SessionError> {
        Self::bind_addr(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
    }

    pub async fn bind_addr(addr: SocketAddr) -> Result<Self, SessionError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (messages, _) = broadcast::channel(MESSAGE_BACKLOG);
        let task = BackgroundTask::new(listener, messages.clone());
        log::info!("Listening for test connections on {}.", local_addr);
        Ok(Self {
            local_addr,
            messages,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn messages(&self) -> broadcast::Receiver<Greeting> {
        self.messages.subscribe()
    }

    pub fn stop(&mut self) {
        self.task.abort();
    }
}

struct BackgroundTask {
    #[allow(unused)]
    handle: JoinHandle<()>,
    die_signal: Option<oneshot::Sender<()>>,
}

impl BackgroundTask {
    fn new(mut listener: TcpListener, message_sink: broadcast::Sender<Greeting>) -> Self {
        let (die_signal, kill_signal) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut constream = listener.incoming();
            let mut die_future = kill_signal.fuse();
            loop {
                let mut nxtfut = constream.next().fuse();
                let con = futures::select! {
                    con = nxtfut => con,
                    _dropped = die_future => { break; }
                };
                match con {
                    Some(Ok(stream)) => {
                        tokio::spawn(read_greeting(stream, message_sink.clone()));
                    }
                    Some(Err(e)) => {
                        log::warn!("Error accepting a connection: {}", e);
                    }
                    None => {
                        break;
                    }
                }
            }
            log::info!("Test host stopped.");
        });
        Self {
            die_signal: Some(die_signal),
            handle,
        }
    }

    fn abort(&mut self) {
        if let Some(signal) = self.die_signal.take() {
            if let Err(_e) = signal.send(()) {}
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn read_greeting(mut stream: TcpStream, message_sink: broadcast::Sender<Greeting>) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            log::warn!("Dropping a connection with no peer address: {}", e);
            return;
        }
    };
    log::info!("Connection from {}.", peer);
    let mut buff = Vec::new();
    if let Err(e) = stream.read_to_end(&mut buff).await {
        log::warn!("Error reading from {}: {}", peer, e);
        return;
    }
    let message = String::from_utf8_lossy(&buff).into_owned();
    log::info!("({}): {}", peer, message);
    if let Err(_e) = message_sink.send((peer, message)) {}
}

/// Connects to `endpoint`, sends `greeting`, and closes the write side.
pub async fn connect_and_greet(
    endpoint: Endpoint,
    greeting: &str,
    timeout: Duration,
) -> Result<(), SessionError> {
    let addr = SocketAddr::from(endpoint);
    let mut stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(res) => res?,
        Err(_elapsed) => return Err(SessionError::Timeout(timeout)),
    };
    log::info!("Connected to {}.", addr);
    stream.write_all(greeting.as_bytes()).await?;
    stream.shutdown(Shutdown::Write)?;
    Ok(())
}
