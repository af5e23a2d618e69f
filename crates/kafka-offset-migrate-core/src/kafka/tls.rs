//! TLS client configuration for broker connections.
//!
//! Trusts the CA bundle at `ssl_ca_location` when given, otherwise the
//! webpki root set. A client certificate and key enable mTLS; they must be
//! supplied together.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::debug;

use crate::config::SecurityConfig;
use crate::error::KafkaError;
use crate::Result;

/// Build a TLS ClientConfig from SecurityConfig.
pub fn build_tls_config(security: &SecurityConfig) -> Result<ClientConfig> {
    let roots = root_store(security.ssl_ca_location.as_deref())?;
    let builder = ClientConfig::builder().with_root_certificates(roots);

    let config = match (
        &security.ssl_certificate_location,
        &security.ssl_key_location,
    ) {
        (Some(cert_path), Some(key_path)) => {
            debug!(
                "Configuring mTLS with cert={}, key={}",
                cert_path.display(),
                key_path.display()
            );
            builder
                .with_client_auth_cert(read_certificates(cert_path)?, read_private_key(key_path)?)
                .map_err(|e| {
                    KafkaError::TlsConfig(format!(
                        "Failed to configure client authentication: {}",
                        e
                    ))
                })?
        }
        (Some(cert_path), None) => {
            return Err(KafkaError::TlsConfig(format!(
                "ssl_certificate_location ({}) provided without ssl_key_location",
                cert_path.display()
            ))
            .into());
        }
        (None, Some(key_path)) => {
            return Err(KafkaError::TlsConfig(format!(
                "ssl_key_location ({}) provided without ssl_certificate_location",
                key_path.display()
            ))
            .into());
        }
        (None, None) => builder.with_no_client_auth(),
    };

    Ok(config)
}

fn root_store(ca_path: Option<&Path>) -> Result<RootCertStore> {
    let Some(path) = ca_path else {
        debug!("Using webpki-roots for TLS verification");
        return Ok(RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        });
    };

    let mut store = RootCertStore::empty();
    for cert in read_certificates(path)? {
        store
            .add(cert)
            .map_err(|e| cert_error(path, format!("Failed to add CA certificate: {}", e)))?;
    }

    debug!("Loaded {} CA certificate(s) from {}", store.len(), path.display());
    Ok(store)
}

fn read_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| cert_error(path, format!("Failed to open file: {}", e)))?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| cert_error(path, format!("Failed to parse PEM certificates: {}", e)))?;

    if certs.is_empty() {
        return Err(cert_error(path, "No certificates found in file".to_string()).into());
    }

    Ok(certs)
}

/// PKCS#1, PKCS#8 and SEC1 keys are accepted; the first key in the file wins.
fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let key_error = |message: String| KafkaError::PrivateKeyLoad {
        path: path.display().to_string(),
        message,
    };

    let file = File::open(path).map_err(|e| key_error(format!("Failed to open file: {}", e)))?;

    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| key_error(format!("Failed to parse PEM private key: {}", e)))?
        .ok_or_else(|| key_error("No private key found in file".to_string()).into())
}

fn cert_error(path: &Path, message: String) -> KafkaError {
    KafkaError::CertificateLoad {
        path: path.display().to_string(),
        message,
    }
}
