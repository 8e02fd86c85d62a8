use std::time::{Duration, Instant};

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Client, Uri};
use hyper_tls::HttpsConnector;
use tokio::time::timeout;
use tracing::debug;

use crate::models::outcome::{Outcome, RequestError};

pub type HttpsClient = Client<HttpsConnector<HttpConnector>>;

/// Must yield exactly one [`Outcome`] per call; failures are never returned as errors.
#[async_trait]
pub trait Requester: Send + Sync + 'static {
    async fn execute(&self, url: &str) -> Outcome;
}

#[derive(Clone)]
pub struct HttpRequester {
    client: HttpsClient,
    timeout: Duration,
}

impl HttpRequester {
    pub fn new(timeout: Duration) -> Self {
        let https = HttpsConnector::new();
        let client: HttpsClient = Client::builder().build::<_, hyper::Body>(https);
        Self { client, timeout }
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn execute(&self, url: &str) -> Outcome {
        let uri: Uri = match url.parse() {
            Ok(uri) => uri,
            Err(e) => {
                return Outcome::failed(
                    RequestError::InvalidUrl(format!("{url}: {e}")),
                    Duration::ZERO,
                )
            }
        };

        let start = Instant::now();
        let response = timeout(self.timeout, self.client.get(uri)).await;
        let duration = start.elapsed();

        match response {
            Ok(Ok(resp)) => {
                let status = resp.status().as_u16();
                // Drain the body so the pooled connection can be reused.
                match timeout(self.timeout, hyper::body::to_bytes(resp.into_body())).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => debug!(error = %e, "Failed to drain response body"),
                    Err(_) => debug!("Timed out draining response body"),
                }
                debug!(status, duration_ms = duration.as_millis() as u64, "Request completed");
                Outcome::response(status, duration)
            }
            Ok(Err(e)) => {
                let error = classify_error(&e, self.timeout);
                debug!(error = %error, duration_ms = duration.as_millis() as u64, "Request failed");
                Outcome::failed(error, duration)
            }
            Err(_) => {
                debug!(timeout_ms = self.timeout.as_millis() as u64, "Request timed out");
                Outcome::failed(RequestError::Timeout(self.timeout), duration)
            }
        }
    }
}

trait TransportFailure: std::fmt::Display {
    fn is_connect(&self) -> bool;
    fn is_timeout(&self) -> bool;
    fn is_closed(&self) -> bool;
}

impl TransportFailure for hyper::Error {
    fn is_connect(&self) -> bool {
        hyper::Error::is_connect(self)
    }

    fn is_timeout(&self) -> bool {
        hyper::Error::is_timeout(self)
    }

    fn is_closed(&self) -> bool {
        hyper::Error::is_closed(self) || self.is_incomplete_message()
    }
}

fn classify_error(e: &impl TransportFailure, timeout: Duration) -> RequestError {
    if e.is_connect() {
        RequestError::Connect(e.to_string())
    } else if e.is_timeout() {
        RequestError::Timeout(timeout)
    } else if e.is_closed() {
        RequestError::Closed(e.to_string())
    } else {
        RequestError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_origin(status: u16, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 {status} Test\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok"
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}/")
    }

    async fn refused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_reports_status_code_as_returned() {
        let url = spawn_origin(503, Duration::ZERO).await;
        let requester = HttpRequester::new(Duration::from_secs(5));

        let outcome = requester.execute(&url).await;
        assert_eq!(outcome.status(), Some(503));
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn test_measures_request_latency() {
        let url = spawn_origin(200, Duration::from_millis(50)).await;
        let requester = HttpRequester::new(Duration::from_secs(5));

        let outcome = requester.execute(&url).await;
        assert_eq!(outcome.status(), Some(200));
        assert!(outcome.duration() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_connection_refused_becomes_outcome() {
        let url = refused_url().await;
        let requester = HttpRequester::new(Duration::from_secs(5));

        let outcome = requester.execute(&url).await;
        assert!(outcome.is_error());
        assert_eq!(outcome.status(), None);
        assert!(matches!(outcome.error(), Some(RequestError::Connect(_))));
    }

    #[tokio::test]
    async fn test_timeout_becomes_outcome() {
        let url = spawn_origin(200, Duration::from_secs(2)).await;
        let requester = HttpRequester::new(Duration::from_millis(100));

        let outcome = requester.execute(&url).await;
        assert!(matches!(outcome.error(), Some(RequestError::Timeout(_))));
        assert!(outcome.duration() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unparseable_url_becomes_outcome() {
        let requester = HttpRequester::new(Duration::from_secs(1));
        let outcome = requester.execute("http://bad host/").await;
        assert_eq!(outcome.error().map(RequestError::kind), Some("INVALID_URL"));
    }

    struct FakeFailure {
        connect: bool,
        timeout: bool,
        closed: bool,
    }

    impl std::fmt::Display for FakeFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake transport failure")
        }
    }

    impl TransportFailure for FakeFailure {
        fn is_connect(&self) -> bool {
            self.connect
        }

        fn is_timeout(&self) -> bool {
            self.timeout
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    #[test]
    fn test_transport_timeout_counts_as_timeout() {
        let failure = FakeFailure { connect: false, timeout: true, closed: false };
        let error = classify_error(&failure, Duration::from_millis(750));
        assert_eq!(error, RequestError::Timeout(Duration::from_millis(750)));
        assert_eq!(error.kind(), "TIMEOUT");
    }

    #[test]
    fn test_transport_failure_kinds() {
        let timeout = Duration::from_secs(1);
        let connect = FakeFailure { connect: true, timeout: false, closed: false };
        let closed = FakeFailure { connect: false, timeout: false, closed: true };
        let other = FakeFailure { connect: false, timeout: false, closed: false };

        assert_eq!(classify_error(&connect, timeout).kind(), "CONNECT");
        assert_eq!(classify_error(&closed, timeout).kind(), "CLOSED");
        assert_eq!(classify_error(&other, timeout).kind(), "REQUEST_ERROR");
    }
}
