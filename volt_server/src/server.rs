use crate::Engine;
use crate::error::Result;
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodecError};
use tracing::{debug, info, instrument, warn};
use volt_driver::protocol::{self, Invocation};
use volt_driver::{ClientResponse, Status};

/// Accepts client sessions and answers their invocations from an [`Engine`]
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    engine: Arc<Engine>,
}

impl Server {
    /// Bind a listener on `address`.
    ///
    /// # Errors
    /// * [`IoError`](crate::Error::IoError) if the address cannot be bound
    pub async fn bind(address: &str, engine: Engine) -> Result<Server> {
        let listener = TcpListener::bind(address).await?;
        Ok(Server {
            listener,
            engine: Arc::new(engine),
        })
    }

    /// # Errors
    /// * [`IoError`](crate::Error::IoError) if the local address is unavailable
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve sessions until the task is dropped.
    ///
    /// # Errors
    /// * Never returns an error today; accept failures are logged and skipped
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve sessions until `shutdown` completes. Sessions already accepted
    /// keep running on their own tasks.
    ///
    /// # Errors
    /// * Never returns an error today; accept failures are logged and skipped
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let engine = Arc::clone(&self.engine);
                        tokio::spawn(async move {
                            if let Err(error) = serve_session(stream, peer, engine).await {
                                warn!("session {peer} ended: {error}");
                            }
                        });
                    }
                    Err(error) => warn!("accept failed: {error}"),
                },
            }
        }
    }
}

#[instrument(level = "info", skip(stream, engine))]
async fn serve_session(stream: TcpStream, peer: SocketAddr, engine: Arc<Engine>) -> Result<()> {
    debug!("session opened");
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, protocol::codec());

    while let Some(line) = framed.next().await {
        let decoded = match line {
            Ok(line) => protocol::decode::<Invocation>(&line).map_err(|error| error.to_string()),
            // The codec ends the stream after these; the client still gets an answer.
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Err(LinesCodecError::MaxLineLengthExceeded.to_string())
            }
            Err(LinesCodecError::Io(error)) if error.kind() == ErrorKind::InvalidData => {
                Err(error.to_string())
            }
            Err(error) => return Err(volt_driver::Error::from(error).into()),
        };
        let response = match decoded {
            Ok(invocation) => {
                let client_handle = invocation.client_handle;
                let engine = Arc::clone(&engine);
                match tokio::task::spawn_blocking(move || engine.invoke(&invocation)).await {
                    Ok(response) => response,
                    Err(error) => {
                        warn!("invocation {client_handle} failed: {error}");
                        ClientResponse::failure(
                            client_handle,
                            Status::UnexpectedFailure,
                            format!("procedure failed: {error}"),
                        )
                    }
                }
            }
            Err(message) => ClientResponse::failure(
                0,
                Status::GracefulFailure,
                format!("malformed invocation: {message}"),
            ),
        };
        framed
            .send(protocol::encode(&response)?)
            .await
            .map_err(volt_driver::Error::from)?;
    }

    debug!("session closed");
    Ok(())
}
