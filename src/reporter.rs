// reporter.rs

use log::{debug, error};

use crate::checks::Verdict;

/// Reports each cycle's outcome to the dead-man's-switch endpoint.
/// A healthy verdict is a plain GET ping; an unhealthy one POSTs the reason
/// to the `/fail` URL. Transport errors are logged and swallowed so a dead
/// health-check service can never stall the poll loop.
pub struct HealthReporter {
    http: reqwest::Client,
    ping_url: String,
}

impl HealthReporter {
    pub fn new(hc_server: &str, ping_uid: &str) -> Self {
        let ping_url = format!("{}/ping/{}", hc_server.trim_end_matches('/'), ping_uid);
        Self {
            http: reqwest::Client::new(),
            ping_url,
        }
    }

    pub fn ping_url(&self) -> &str {
        &self.ping_url
    }

    pub fn fail_url(&self) -> String {
        format!("{}/fail", self.ping_url)
    }

    pub async fn report(&self, verdict: &Verdict) {
        match verdict {
            Verdict::Healthy => self.report_success().await,
            Verdict::Unhealthy(reason) => self.report_failure(reason).await,
        }
    }

    pub async fn report_success(&self) {
        let result = self
            .http
            .get(&self.ping_url)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => debug!("Success ping sent"),
            Err(e) => error!("Failed to send success ping: {e}"),
        }
    }

    pub async fn report_failure(&self, reason: &str) {
        let result = self
            .http
            .post(self.fail_url())
            .body(reason.to_string())
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => debug!("Failure ping sent: {reason}"),
            Err(e) => error!("Failed to send failure ping: {e}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use hyper::body::{Bytes, Incoming};
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// One-endpoint HTTP server that records (method, path, body) for every
    /// request it receives and always answers 200.
    pub(crate) async fn spawn_capture_server(
    ) -> (String, mpsc::UnboundedReceiver<(String, String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let tx = tx.clone();
                        async move {
                            let method = req.method().to_string();
                            let path = req.uri().path().to_string();
                            let body = req.into_body().collect().await.unwrap().to_bytes();
                            let _ = tx.send((
                                method,
                                path,
                                String::from_utf8_lossy(&body).to_string(),
                            ));
                            Ok::<_, std::convert::Infallible>(Response::new(Full::new(
                                Bytes::from("OK"),
                            )))
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        (format!("http://{addr}"), rx)
    }

    #[test]
    fn test_url_shapes() {
        let reporter = HealthReporter::new("https://hc-ping.com/", "abc-123");
        assert_eq!(reporter.ping_url(), "https://hc-ping.com/ping/abc-123");
        assert_eq!(reporter.fail_url(), "https://hc-ping.com/ping/abc-123/fail");
    }

    #[tokio::test]
    async fn test_success_ping_is_get() {
        let (base, mut rx) = spawn_capture_server().await;
        let reporter = HealthReporter::new(&base, "uid-1");

        reporter.report(&Verdict::Healthy).await;

        let (method, path, body) = rx.recv().await.unwrap();
        assert_eq!(method, "GET");
        assert_eq!(path, "/ping/uid-1");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_failure_ping_posts_reason() {
        let (base, mut rx) = spawn_capture_server().await;
        let reporter = HealthReporter::new(&base, "uid-1");

        reporter
            .report(&Verdict::Unhealthy("CPU usage at 80%".to_string()))
            .await;

        let (method, path, body) = rx.recv().await.unwrap();
        assert_eq!(method, "POST");
        assert_eq!(path, "/ping/uid-1/fail");
        assert_eq!(body, "CPU usage at 80%");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_does_not_panic() {
        // Port 9 is not listening; the error is logged and swallowed.
        let reporter = HealthReporter::new("http://127.0.0.1:9", "uid-1");
        reporter.report(&Verdict::Healthy).await;
        reporter.report(&Verdict::Unhealthy("down".to_string())).await;
    }
}
