//! Loopback receiver for the OAuth redirect.
//!
//! Binds `127.0.0.1:<port>`, waits for `GET /callback?code=...&state=...`,
//! answers the browser with a short HTML page and returns the parameters.
//! The `state` value is not checked here; the engine verifies it.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};
use url::Url;

use crate::error::{CliError, CliResult};

/// How long to wait for the user to finish consenting.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// How long one connection may take to send its request line.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

const CALLBACK_PATH: &str = "/callback";

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization complete</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization failed</h1>\
    <p>You can close this window.</p></body></html>";

const NOT_FOUND_PAGE: &str = "HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n";

/// Parameters delivered on the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// A bound loopback listener.
pub struct CallbackReceiver {
    listener: TcpListener,
    port: u16,
}

impl CallbackReceiver {
    /// Binds the listener. Port 0 picks a free port.
    pub async fn bind(port: u16) -> CliResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|e| {
            CliError::Callback(format!("cannot listen on 127.0.0.1:{}: {}", port, e))
        })?;
        let port = listener.local_addr()?.port();
        debug!(port, "loopback receiver listening");
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the redirect, ignoring unrelated requests (favicon, etc.).
    pub async fn wait(self, timeout: Duration) -> CliResult<CallbackParams> {
        tokio::time::timeout(timeout, self.accept_loop())
            .await
            .map_err(|_| {
                CliError::Callback(format!(
                    "no redirect received within {}s",
                    timeout.as_secs()
                ))
            })?
    }

    async fn accept_loop(self) -> CliResult<CallbackParams> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "callback connection");
            match tokio::time::timeout(REQUEST_READ_TIMEOUT, handle_connection(stream)).await {
                Ok(Ok(Some(result))) => return result,
                Ok(Ok(None)) => continue,
                Ok(Err(e)) => warn!(error = %e, "failed to read callback request"),
                Err(_) => debug!(%peer, "dropping idle callback connection"),
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream) -> std::io::Result<Option<CliResult<CallbackParams>>> {
    let mut request_line = String::new();
    BufReader::new(&mut stream)
        .read_line(&mut request_line)
        .await?;

    let result = parse_request_line(&request_line);
    let page = match result {
        None => NOT_FOUND_PAGE,
        Some(Ok(_)) => SUCCESS_PAGE,
        Some(Err(_)) => FAILURE_PAGE,
    };
    stream.write_all(page.as_bytes()).await?;
    stream.flush().await?;
    Ok(result)
}

/// Parses `GET /callback?... HTTP/1.1`.
///
/// Returns `None` for requests that are not the redirect.
pub fn parse_request_line(line: &str) -> Option<CliResult<CallbackParams>> {
    let mut parts = line.split_whitespace();
    let (method, target) = (parts.next()?, parts.next()?);
    if method != "GET" {
        return None;
    }

    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(CliError::Callback(format!(
            "authorization denied: {}",
            error
        ))));
    }
    match (code, state) {
        (Some(code), Some(state)) => Some(Ok(CallbackParams { code, state })),
        (None, _) => Some(Err(CliError::Callback(
            "redirect carried no authorization code".to_string(),
        ))),
        (Some(_), None) => Some(Err(CliError::Callback(
            "redirect carried no state".to_string(),
        ))),
    }
}
