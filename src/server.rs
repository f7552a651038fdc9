// server.rs

use anyhow::Result;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use log::{debug, error, info};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::metrics::PbxMetrics;

/// Serve Prometheus metrics over plain HTTP.
pub async fn start_metrics_server(addr: SocketAddr, metrics: Arc<PbxMetrics>) -> Result<()> {
    info!("Starting metrics server on {addr}");
    let listener = TcpListener::bind(addr).await?;
    serve(listener, metrics).await
}

pub async fn serve(listener: TcpListener, metrics: Arc<PbxMetrics>) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::task::spawn(async move {
            let conn_builder = ConnBuilder::new(hyper_util::rt::TokioExecutor::new());
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle_request(req, metrics.clone()));

            if let Err(err) = conn_builder.serve_connection(io, service).await {
                error!("Error serving connection: {err:?}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<PbxMetrics>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            debug!("Serving metrics endpoint");
            match metrics.encode() {
                Ok(text) => Ok(Response::builder()
                    .status(StatusCode::OK)
                    .header("content-type", "text/plain; version=0.0.4; charset=utf-8")
                    .body(Full::new(Bytes::from(text)))
                    .unwrap()),
                Err(e) => {
                    error!("Failed to gather metrics: {e}");
                    Ok(Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .body(Full::new(Bytes::from("Error gathering metrics")))
                        .unwrap())
                }
            }
        }
        (&Method::GET, "/health") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("OK")))
            .unwrap()),
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap()),
    }
}
