use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::{convert::Infallible, io, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub(crate) struct Server;

impl Server {
    pub async fn serve<S>(
        listener: TcpListener,
        service: S,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        S: Service<Request<Incoming>, Response = Response<Full<Bytes>>, Error = Infallible>
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            if let Some(delay) = accept_backoff(&err) {
                                log::error!("Accept error: {}, retrying in {:?}", err, delay);
                                tokio::time::sleep(delay).await;
                            }
                            continue;
                        }
                    };

                    let service = service.clone();
                    let io = TokioIo::new(stream);

                    // Dropping the connection future on disconnect also drops any
                    // pending guard validation for that request.
                    tokio::spawn(async move {
                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            log::error!("Connection error from {}: {}", peer, err);
                        }
                    });
                }
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Per-connection failures are retried at once; anything else (e.g. running
/// out of file descriptors) pauses the accept loop.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(Duration::from_secs(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_retried_immediately() {
        for kind in [
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset,
        ] {
            assert_eq!(accept_backoff(&io::Error::from(kind)), None);
        }
    }

    #[test]
    fn resource_exhaustion_backs_off() {
        // EMFILE
        let err = io::Error::from_raw_os_error(24);
        assert_eq!(accept_backoff(&err), Some(Duration::from_secs(1)));
    }
}
