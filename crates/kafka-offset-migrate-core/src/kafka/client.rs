//! Kafka client for protocol-level communication.

use bytes::{BufMut, Bytes, BytesMut};
use kafka_protocol::messages::{
    ApiKey, FindCoordinatorRequest, FindCoordinatorResponse, RequestHeader, ResponseHeader,
};
use kafka_protocol::protocol::StrBytes;
use kafka_protocol::protocol::{Decodable, Encodable};
use socket2::{SockRef, TcpKeepalive};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};

use crate::config::{KafkaConfig, SaslMechanism};
use crate::error::KafkaError;
use crate::Result;

const CLIENT_ID: &str = "kafka-offset-migrate";

/// Coordinator key type for consumer groups in FindCoordinator
const COORDINATOR_KEY_TYPE_GROUP: i8 = 0;

/// Kafka client for protocol-level operations
pub struct KafkaClient {
    /// Configuration
    config: KafkaConfig,

    /// Connection to the current broker
    connection: Mutex<Option<BrokerConnection>>,

    /// Correlation ID counter
    correlation_id: AtomicI32,
}

/// A stream that can be either plain TCP or TLS-wrapped
enum ConnectionStream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl ConnectionStream {
    async fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        match self {
            ConnectionStream::Plain(s) => {
                s.read_exact(buf).await?;
                Ok(())
            }
            ConnectionStream::Tls(s) => {
                s.read_exact(buf).await?;
                Ok(())
            }
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            ConnectionStream::Plain(s) => s.write_all(buf).await,
            ConnectionStream::Tls(s) => s.write_all(buf).await,
        }
    }

    async fn shutdown(&mut self) -> std::io::Result<()> {
        match self {
            ConnectionStream::Plain(s) => s.shutdown().await,
            ConnectionStream::Tls(s) => s.shutdown().await,
        }
    }
}

struct BrokerConnection {
    stream: ConnectionStream,
    address: String,
}

impl KafkaClient {
    /// Create a new Kafka client
    pub fn new(config: KafkaConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
            correlation_id: AtomicI32::new(1),
        }
    }

    /// Connect to the Kafka cluster.
    ///
    /// TLS setup failures (bad CA, certificate or key file) are returned as
    /// is, since every broker would fail the same way. Otherwise the error
    /// names the last broker failure.
    pub async fn connect(&self) -> Result<()> {
        let mut last_error = None;

        // Try each bootstrap server until one connects
        for server in &self.config.bootstrap_servers {
            match self.try_connect(server).await {
                Ok(stream) => {
                    self.install(stream, server).await?;
                    debug!("Connected to Kafka broker: {}", server);
                    return Ok(());
                }
                Err(
                    e @ crate::Error::Kafka(
                        KafkaError::TlsConfig(_)
                        | KafkaError::CertificateLoad { .. }
                        | KafkaError::PrivateKeyLoad { .. },
                    ),
                ) => return Err(e),
                Err(e) => {
                    debug!("Failed to connect to {}: {}", server, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(KafkaError::NoBrokersAvailable {
            last_error: last_error.unwrap_or_else(|| "no bootstrap servers configured".to_string()),
        }
        .into())
    }

    /// Move the connection to the coordinator of `group_id`.
    ///
    /// OffsetFetch and OffsetCommit are only served by the group coordinator,
    /// so this must run after [`connect`](Self::connect) and before any group
    /// offset request.
    pub async fn connect_to_coordinator(&self, group_id: &str) -> Result<()> {
        let request = FindCoordinatorRequest::default()
            .with_key(StrBytes::from_string(group_id.to_string()))
            .with_key_type(COORDINATOR_KEY_TYPE_GROUP);

        let response: FindCoordinatorResponse = self
            .send_request(ApiKey::FindCoordinator, request)
            .await?;

        if response.error_code != 0 {
            return Err(KafkaError::BrokerError {
                code: response.error_code,
                message: format!(
                    "FindCoordinator for group {} failed: {}",
                    group_id,
                    response
                        .error_message
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "no error message".to_string())
                ),
            }
            .into());
        }

        let address = format!("{}:{}", response.host, response.port);

        {
            let conn = self.connection.lock().await;
            if conn.as_ref().map(|c| c.address.as_str()) == Some(address.as_str()) {
                debug!("Already connected to coordinator {} for group {}", address, group_id);
                return Ok(());
            }
        }

        debug!("Coordinator for group {} is {}", group_id, address);
        self.close().await?;
        let stream = self.try_connect(&address).await?;
        self.install(stream, &address).await
    }

    /// Shut down the current broker connection, if any.
    ///
    /// Safe to call more than once.
    pub async fn close(&self) -> Result<()> {
        let taken = self.connection.lock().await.take();
        if let Some(mut conn) = taken {
            // The peer may already have gone away; a failed shutdown still drops the socket.
            if let Err(e) = conn.stream.shutdown().await {
                debug!("Error shutting down connection to {}: {}", conn.address, e);
            }
            debug!("Closed connection to {}", conn.address);
        }
        Ok(())
    }

    async fn install(&self, stream: ConnectionStream, address: &str) -> Result<()> {
        {
            let mut conn = self.connection.lock().await;
            *conn = Some(BrokerConnection {
                stream,
                address: address.to_string(),
            });
        }

        if self.config.security.security_protocol.uses_sasl() {
            self.authenticate().await?;
        }

        Ok(())
    }

    async fn try_connect(&self, server: &str) -> Result<ConnectionStream> {
        let tcp_stream =
            TcpStream::connect(server)
                .await
                .map_err(|e| KafkaError::ConnectionFailed {
                    broker: server.to_string(),
                    message: e.to_string(),
                })?;

        self.configure_socket(&tcp_stream, server)?;

        if self.config.security.security_protocol.uses_tls() {
            debug!("Establishing TLS connection to {}", server);

            let tls_config = super::tls::build_tls_config(&self.config.security)?;
            let connector = TlsConnector::from(Arc::new(tls_config));

            // Extract hostname from server address (host:port)
            let hostname = server.split(':').next().unwrap_or(server);

            let server_name = ServerName::try_from(hostname.to_string()).map_err(|e| {
                KafkaError::ConnectionFailed {
                    broker: server.to_string(),
                    message: format!("Invalid server name for TLS: {}", e),
                }
            })?;

            let tls_stream = connector
                .connect(server_name, tcp_stream)
                .await
                .map_err(|e| KafkaError::ConnectionFailed {
                    broker: server.to_string(),
                    message: format!("TLS handshake failed: {}", e),
                })?;

            debug!("TLS connection established to {}", server);
            Ok(ConnectionStream::Tls(Box::new(tls_stream)))
        } else {
            Ok(ConnectionStream::Plain(tcp_stream))
        }
    }

    /// Configure TCP socket options (keepalive, nodelay) based on connection config.
    fn configure_socket(&self, stream: &TcpStream, server: &str) -> Result<()> {
        let conn_config = &self.config.connection;
        let sock_ref = SockRef::from(stream);

        if conn_config.tcp_nodelay {
            sock_ref
                .set_nodelay(true)
                .map_err(|e| KafkaError::ConnectionFailed {
                    broker: server.to_string(),
                    message: format!("Failed to set TCP_NODELAY: {}", e),
                })?;
        }

        if conn_config.tcp_keepalive {
            let keepalive = TcpKeepalive::new()
                .with_time(Duration::from_secs(conn_config.keepalive_time_secs))
                .with_interval(Duration::from_secs(conn_config.keepalive_interval_secs));

            sock_ref
                .set_tcp_keepalive(&keepalive)
                .map_err(|e| KafkaError::ConnectionFailed {
                    broker: server.to_string(),
                    message: format!("Failed to set TCP keepalive: {}", e),
                })?;

            trace!(
                "TCP keepalive enabled for {}: time={}s, interval={}s",
                server,
                conn_config.keepalive_time_secs,
                conn_config.keepalive_interval_secs
            );
        }

        Ok(())
    }

    async fn authenticate(&self) -> Result<()> {
        let security = &self.config.security;

        match security.sasl_mechanism {
            Some(SaslMechanism::Plain) => {
                self.sasl_plain_auth(
                    security.sasl_username.as_deref().unwrap_or(""),
                    security.sasl_password.as_deref().unwrap_or(""),
                )
                .await
            }
            Some(SaslMechanism::ScramSha256) | Some(SaslMechanism::ScramSha512) => Err(
                crate::Error::Authentication("SCRAM authentication is not supported".to_string()),
            ),
            None => Ok(()),
        }
    }

    async fn sasl_plain_auth(&self, username: &str, password: &str) -> Result<()> {
        use kafka_protocol::messages::{SaslAuthenticateRequest, SaslHandshakeRequest};

        let handshake_request = SaslHandshakeRequest::default().with_mechanism("PLAIN".into());
        let _handshake_response: kafka_protocol::messages::SaslHandshakeResponse = self
            .send_request(ApiKey::SaslHandshake, handshake_request)
            .await?;

        // PLAIN format: \0username\0password
        let mut auth_bytes = Vec::new();
        auth_bytes.push(0);
        auth_bytes.extend_from_slice(username.as_bytes());
        auth_bytes.push(0);
        auth_bytes.extend_from_slice(password.as_bytes());

        let auth_request =
            SaslAuthenticateRequest::default().with_auth_bytes(Bytes::from(auth_bytes));
        let auth_response: kafka_protocol::messages::SaslAuthenticateResponse = self
            .send_request(ApiKey::SaslAuthenticate, auth_request)
            .await?;

        if auth_response.error_code != 0 {
            return Err(crate::Error::Authentication(format!(
                "SASL authentication failed: {}",
                auth_response
                    .error_message
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("error code {}", auth_response.error_code))
            )));
        }

        debug!("SASL PLAIN authentication successful");
        Ok(())
    }

    fn next_correlation_id(&self) -> i32 {
        self.correlation_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a request and receive a response
    pub async fn send_request<Req, Resp>(&self, api_key: ApiKey, request: Req) -> Result<Resp>
    where
        Req: Encodable + Default,
        Resp: Decodable + Default,
    {
        let correlation_id = self.next_correlation_id();
        let api_version = api_version(api_key);

        let header = RequestHeader::default()
            .with_request_api_key(api_key as i16)
            .with_request_api_version(api_version)
            .with_correlation_id(correlation_id)
            .with_client_id(Some(StrBytes::from_static_str(CLIENT_ID)));

        let header_version = api_key.request_header_version(api_version);
        let mut buf = BytesMut::new();

        // Reserve space for the length prefix
        buf.put_i32(0);

        header
            .encode(&mut buf, header_version)
            .map_err(|e| KafkaError::Protocol(format!("Failed to encode header: {:?}", e)))?;
        request
            .encode(&mut buf, api_version)
            .map_err(|e| KafkaError::Protocol(format!("Failed to encode request: {:?}", e)))?;

        let len = (buf.len() - 4) as i32;
        buf[0..4].copy_from_slice(&len.to_be_bytes());

        trace!(
            "Sending request: api_key={:?}, api_version={}, correlation_id={}, len={}",
            api_key,
            api_version,
            correlation_id,
            len
        );

        let mut conn = self.connection.lock().await;
        let conn = conn
            .as_mut()
            .ok_or_else(|| KafkaError::Protocol("Not connected".to_string()))?;

        conn.stream
            .write_all(&buf)
            .await
            .map_err(|e| KafkaError::Protocol(format!("Failed to send request: {}", e)))?;

        let mut len_buf = [0u8; 4];
        conn.stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| KafkaError::Protocol(format!("Failed to read response length: {}", e)))?;
        let response_len = i32::from_be_bytes(len_buf) as usize;

        trace!("Receiving response: len={}", response_len);

        let mut response_buf = vec![0u8; response_len];
        conn.stream
            .read_exact(&mut response_buf)
            .await
            .map_err(|e| KafkaError::Protocol(format!("Failed to read response body: {}", e)))?;

        let mut response_bytes = Bytes::from(response_buf);
        let response_header_version = api_key.response_header_version(api_version);
        let response_header = ResponseHeader::decode(&mut response_bytes, response_header_version)
            .map_err(|e| {
                KafkaError::Protocol(format!("Failed to decode response header: {:?}", e))
            })?;

        if response_header.correlation_id != correlation_id {
            return Err(KafkaError::Protocol(format!(
                "Correlation ID mismatch: sent {}, received {}",
                correlation_id, response_header.correlation_id
            ))
            .into());
        }

        let response = Resp::decode(&mut response_bytes, api_version)
            .map_err(|e| KafkaError::Protocol(format!("Failed to decode response: {:?}", e)))?;

        Ok(response)
    }
}

/// API version used for each request this client sends.
///
/// Versions are pinned below the flexible-encoding cut-over where possible so
/// they are served by every broker from Kafka 2.x onwards.
fn api_version(api_key: ApiKey) -> i16 {
    match api_key {
        ApiKey::SaslHandshake => 1,
        ApiKey::SaslAuthenticate => 2,
        ApiKey::FindCoordinator => 2,
        // v2+ allows a null topic list meaning "all topics"
        ApiKey::OffsetFetch => 5,
        ApiKey::OffsetCommit => 2,
        _ => 0,
    }
}
