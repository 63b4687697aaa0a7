use crate::Error::{ConnectionError, ConnectionLost, ProtocolError};
use crate::error::Result;
use crate::protocol::{self, Invocation};
use crate::{ClientResponse, Connection, Value};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::net::{Ipv6Addr, SocketAddr};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, instrument};

/// Connection to a procedure host over TCP. One invocation is in flight at
/// a time.
#[derive(Debug)]
pub struct TcpConnection {
    endpoint: String,
    framed: Framed<TcpStream, LinesCodec>,
    next_handle: u64,
}

impl TcpConnection {
    /// Open a session to `host`, using `default_port` unless the host names
    /// its own port.
    ///
    /// # Errors
    /// * [`ConnectionError`] if the endpoint is unreachable or refuses the session
    #[instrument(name = "connect", level = "info")]
    pub async fn connect(host: &str, default_port: u16) -> Result<TcpConnection> {
        let endpoint = endpoint(host, default_port);
        let stream = TcpStream::connect(endpoint.as_str())
            .await
            .map_err(|error| ConnectionError {
                endpoint: endpoint.clone(),
                message: error.to_string(),
            })?;
        stream.set_nodelay(true)?;
        debug!("connected to {endpoint}");

        Ok(TcpConnection {
            endpoint,
            framed: Framed::new(stream, protocol::codec()),
            next_handle: 0,
        })
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    #[instrument(name = "call_procedure", level = "debug", skip(self, parameters))]
    async fn call_procedure(
        &mut self,
        procedure: &str,
        parameters: &[Value],
    ) -> Result<ClientResponse> {
        self.next_handle += 1;
        let client_handle = self.next_handle;
        let invocation = Invocation::new(client_handle, procedure, parameters.to_vec());
        self.framed.send(protocol::encode(&invocation)?).await?;

        let Some(line) = self.framed.next().await else {
            return Err(ConnectionLost);
        };
        let response: ClientResponse = protocol::decode(&line?)?;
        if response.client_handle() != client_handle {
            return Err(ProtocolError(format!(
                "response handle {} does not match invocation handle {client_handle}",
                response.client_handle()
            )));
        }

        debug!("{procedure} returned {}", response.status());
        Ok(response)
    }

    async fn close(&mut self) -> Result<()> {
        self.framed.get_mut().shutdown().await?;
        Ok(())
    }
}

/// Resolve `host` to a `host:port` endpoint, keeping an explicit port.
#[must_use]
pub fn endpoint(host: &str, default_port: u16) -> String {
    if host.parse::<SocketAddr>().is_ok() {
        return host.to_string();
    }
    if host.parse::<Ipv6Addr>().is_ok() {
        return format!("[{host}]:{default_port}");
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && port.parse::<u16>().is_ok() => host.to_string(),
        _ => format!("{host}:{default_port}"),
    }
}
