//! Single-request HTTP listener receiving the OAuth redirect.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use super::error::AuthError;

const CALLBACK_PATH: &str = "/oauth2callback";
const MAX_REQUEST_BYTES: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h2>Authorization complete.</h2>\
<p>You can close this window and return to the terminal.</p></body></html>";

/// Local listener bound to `127.0.0.1`.
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
}

impl CallbackListener {
    pub async fn bind(port: u16) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| AuthError::Io(format!("cannot listen on 127.0.0.1:{port}: {e}")))?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn local_port(&self) -> u16 {
        self.port
    }

    /// Wait for the redirect carrying `code`, verifying `state`.
    ///
    /// Consumes the listener: it is closed on every exit path.
    pub async fn wait_for_code(
        self,
        expected_state: &str,
        timeout: Duration,
    ) -> Result<String, AuthError> {
        match tokio::time::timeout(timeout, self.accept_loop(expected_state)).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::CallbackTimeout(timeout.as_secs())),
        }
    }

    async fn accept_loop(&self, expected_state: &str) -> Result<String, AuthError> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!(%peer, "oauth callback connection");
            let target = match read_request_target(&mut stream).await {
                Ok(target) => target,
                Err(err) => {
                    warn!(error = %err, "malformed callback request");
                    respond(&mut stream, 400, "Bad Request", "<h2>Bad request</h2>").await;
                    continue;
                }
            };
            let Some(params) = callback_params(&target) else {
                respond(&mut stream, 404, "Not Found", "<h2>Not found</h2>").await;
                continue;
            };

            if let Some(error) = params.get("error") {
                respond(
                    &mut stream,
                    400,
                    "Bad Request",
                    &format!("<h2>Authorization failed: {}</h2>", html_escape(error)),
                )
                .await;
                return Err(AuthError::AccessDenied(error.clone()));
            }
            if params.get("state").map(String::as_str) != Some(expected_state) {
                respond(&mut stream, 400, "Bad Request", "<h2>State mismatch</h2>").await;
                return Err(AuthError::StateMismatch);
            }
            let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
                respond(&mut stream, 400, "Bad Request", "<h2>Missing code</h2>").await;
                return Err(AuthError::InvalidResponse(
                    "callback did not include an authorization code".to_string(),
                ));
            };
            respond(&mut stream, 200, "OK", SUCCESS_PAGE).await;
            return Ok(code.clone());
        }
    }
}

async fn read_request_target(stream: &mut TcpStream) -> Result<String, AuthError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(AuthError::InvalidResponse("request too large".to_string()));
        }
    }
    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_string()),
        _ => Err(AuthError::InvalidResponse(format!(
            "unexpected request line: {request_line}"
        ))),
    }
}

/// Query parameters of a request to the callback path, `None` for other paths.
fn callback_params(target: &str) -> Option<HashMap<String, String>> {
    let url = Url::parse(&format!("http://127.0.0.1{target}")).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }
    Some(url.query_pairs().into_owned().collect())
}

async fn respond(stream: &mut TcpStream, status: u16, reason: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(err) = stream.write_all(response.as_bytes()).await {
        warn!(error = %err, "failed to answer oauth callback");
    }
    let _ = stream.shutdown().await;
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_only_for_callback_path() {
        assert!(callback_params("/favicon.ico").is_none());
        let params = callback_params("/oauth2callback?code=4%2F0Ab&state=xyz").unwrap();
        assert_eq!(params["code"], "4/0Ab");
        assert_eq!(params["state"], "xyz");
    }

    async fn get(port: u16, path: &str) -> reqwest::Response {
        reqwest::get(format!("http://127.0.0.1:{port}{path}"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn returns_code_after_ignoring_other_paths() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.local_port();
        let waiter = tokio::spawn(async move {
            listener
                .wait_for_code("s1", Duration::from_secs(5))
                .await
        });
        assert_eq!(get(port, "/favicon.ico").await.status(), 404);
        let resp = get(port, "/oauth2callback?code=abc&state=s1").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(waiter.await.unwrap().unwrap(), "abc");
    }

    #[tokio::test]
    async fn provider_error_rejects() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.local_port();
        let waiter = tokio::spawn(async move {
            listener
                .wait_for_code("s1", Duration::from_secs(5))
                .await
        });
        get(port, "/oauth2callback?error=access_denied&state=s1").await;
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(AuthError::AccessDenied(e)) if e == "access_denied"));
    }

    #[tokio::test]
    async fn state_mismatch_rejects() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.local_port();
        let waiter = tokio::spawn(async move {
            listener
                .wait_for_code("expected", Duration::from_secs(5))
                .await
        });
        get(port, "/oauth2callback?code=abc&state=forged").await;
        assert!(matches!(
            waiter.await.unwrap(),
            Err(AuthError::StateMismatch)
        ));
    }

    #[tokio::test]
    async fn times_out_without_callback() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let result = listener
            .wait_for_code("s", Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(AuthError::CallbackTimeout(_))));
    }
}
