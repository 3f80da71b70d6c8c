//! Certificate handling and the authenticated portal session.
//!
//! [`CertificateIdentity`] decodes the caller's A1 archive, [`TempCredentials`]
//! guards the on-disk PEM files for exactly one call, and [`PortalSession`]
//! logs in and fetches listing pages.

mod certificate;
mod portal;

// Re-export public API
pub use certificate::{CertificateIdentity, TempCredentials};
pub use portal::{extract_cnpj, listing_url, PageFetch, PortalSession};
