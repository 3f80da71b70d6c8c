use crate::errors::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use openssl::pkcs12::Pkcs12;
use openssl::provider::Provider;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::{debug, warn};

const CERT_FILE_NAME: &str = "cert.pem";
const KEY_FILE_NAME: &str = "key.pem";
const TEMP_DIR_PREFIX: &str = "nfse-cert-";
const LEGACY_PROVIDER_NAME: &str = "legacy";

static LEGACY_PROVIDER: OnceLock<Option<Provider>> = OnceLock::new();

/// Loads OpenSSL's legacy provider once per process.
///
/// A1 archives exported by Windows tooling encrypt the certificate bag with
/// RC2-40, which OpenSSL 3 only decrypts with this provider loaded. Fallbacks
/// stay enabled so the default provider keeps serving everything else.
fn ensure_legacy_provider() {
    LEGACY_PROVIDER.get_or_init(|| match Provider::try_load(None, LEGACY_PROVIDER_NAME, true) {
        Ok(provider) => {
            debug!("OpenSSL legacy provider loaded");
            Some(provider)
        }
        Err(e) => {
            warn!(error = %e, "OpenSSL legacy provider unavailable, RC2 archives will be rejected");
            None
        }
    });
}

/// Private key and certificate chain decoded from an A1 (PKCS#12) archive.
///
/// Lives for a single request; the PEM buffers are dropped with it.
pub struct CertificateIdentity {
    key_pem: Vec<u8>,
    cert_pem: Vec<u8>,
    chain_pem: Vec<u8>,
    intermediates: usize,
}

impl CertificateIdentity {
    /// Decodes a base64 PKCS#12 blob and decrypts it with `password`.
    ///
    /// Whitespace inside the blob (line-wrapped uploads) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Authentication`] when the blob is not valid base64,
    /// is not a PKCS#12 archive, the password is wrong, or the archive lacks a
    /// private key or certificate.
    pub fn from_base64(blob: &str, password: &str) -> AppResult<Self> {
        let compact: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD.decode(compact.as_bytes()).map_err(|e| {
            debug!(error = %e, "Certificate is not valid base64");
            AppError::Authentication
        })?;
        Self::from_der(&der, password)
    }

    /// Decrypts a DER-encoded PKCS#12 archive.
    pub fn from_der(der: &[u8], password: &str) -> AppResult<Self> {
        ensure_legacy_provider();
        let parsed = Pkcs12::from_der(der)
            .and_then(|archive| archive.parse2(password))
            .map_err(|e| {
                debug!(error = %e, "Failed to decrypt PKCS#12 archive");
                AppError::Authentication
            })?;

        let pkey = parsed.pkey.ok_or_else(|| {
            debug!("PKCS#12 archive has no private key");
            AppError::Authentication
        })?;
        let cert = parsed.cert.ok_or_else(|| {
            debug!("PKCS#12 archive has no certificate");
            AppError::Authentication
        })?;

        let mut chain_pem = Vec::new();
        let mut intermediates = 0;
        for ca in parsed.ca.into_iter().flatten() {
            chain_pem.extend_from_slice(&ca.to_pem()?);
            intermediates += 1;
        }

        Ok(Self {
            key_pem: pkey.private_key_to_pem_pkcs8()?,
            cert_pem: cert.to_pem()?,
            chain_pem,
            intermediates,
        })
    }

    /// Number of intermediate certificates bundled with the leaf.
    pub fn intermediates(&self) -> usize {
        self.intermediates
    }

    /// Writes the key and certificate chain to a fresh private directory.
    ///
    /// The directory is created under `parent` when given, otherwise under the
    /// system temp directory. The returned guard removes it when dropped.
    pub fn write_temp_credentials(&self, parent: Option<&Path>) -> AppResult<TempCredentials> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        let cert_path = dir.path().join(CERT_FILE_NAME);
        let key_path = dir.path().join(KEY_FILE_NAME);
        // From here on `credentials` owns the directory, so an early return
        // still removes whatever was written.
        let credentials = TempCredentials {
            dir: Some(dir),
            cert_path,
            key_path,
        };

        let mut cert_chain = self.cert_pem.clone();
        cert_chain.extend_from_slice(&self.chain_pem);
        fs::write(&credentials.cert_path, cert_chain)?;
        fs::write(&credentials.key_path, &self.key_pem)?;

        debug!(
            dir = %credentials.dir_path().map(|p| p.display().to_string()).unwrap_or_default(),
            "Certificate material written to temporary files"
        );
        Ok(credentials)
    }
}

impl fmt::Debug for CertificateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateIdentity")
            .field("key_pem", &"<redacted>")
            .field("intermediates", &self.intermediates)
            .finish()
    }
}

/// Temporary `cert.pem` / `key.pem` pair backing one portal session.
///
/// Removal happens in [`close`](Self::close) or, failing that, on drop.
/// Removal errors are logged and never propagated.
#[derive(Debug)]
pub struct TempCredentials {
    dir: Option<TempDir>,
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl TempCredentials {
    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn dir_path(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    /// Builds the TLS client identity from the files on disk.
    pub fn load_identity(&self) -> AppResult<reqwest::Identity> {
        let mut pem = fs::read(&self.key_path)?;
        pem.push(b'\n');
        pem.extend_from_slice(&fs::read(&self.cert_path)?);
        reqwest::Identity::from_pem(&pem).map_err(|e| {
            warn!(error = %e, "Certificate files rejected by the TLS backend");
            AppError::Authentication
        })
    }

    /// Deletes the files and their directory now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(dir = %path.display(), "Temporary certificate files removed"),
            Err(e) => warn!(
                dir = %path.display(),
                error = %e,
                "Failed to remove temporary certificate files"
            ),
        }
    }
}

impl Drop for TempCredentials {
    fn drop(&mut self) {
        self.release();
    }
}
