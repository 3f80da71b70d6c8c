use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which HTTP service the binary exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// `POST /api/faturamento-emissao`: walks every listing page internally
    FullScan,
    /// `POST /api/faturamento-paginado-emissao`: one listing page per call
    Paginated,
    /// Both endpoints on the same listener
    All,
}

impl ServiceKind {
    /// Returns a human-readable name for the service.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FullScan => "Full scan",
            Self::Paginated => "Paginated",
            Self::All => "Full scan + paginated",
        }
    }

    pub fn serves_full_scan(&self) -> bool {
        matches!(self, Self::FullScan | Self::All)
    }

    pub fn serves_paginated(&self) -> bool {
        matches!(self, Self::Paginated | Self::All)
    }
}

impl From<&str> for ServiceKind {
    fn from(value: &str) -> Self {
        // Trim whitespace and compare case-insensitively
        let lower = value.trim().to_lowercase();

        if FULL_SCAN_ALIASES.contains(&lower.as_str()) {
            Self::FullScan
        } else if PAGINATED_ALIASES.contains(&lower.as_str()) {
            Self::Paginated
        } else {
            // Anything else serves both endpoints.
            Self::All
        }
    }
}

/// Certificate fields shared by both request bodies.
#[derive(Clone, Deserialize)]
pub struct CertificateCredentials {
    /// A1 certificate (`.pfx`/`.p12`) encoded in base64
    pub certificado_base64: String,
    /// Certificate passphrase
    pub senha_certificado: String,
}

impl fmt::Debug for CertificateCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateCredentials")
            .field("certificado_base64", &format_args!("<{} bytes>", self.certificado_base64.len()))
            .field("senha_certificado", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/faturamento-emissao`.
#[derive(Debug, Clone, Deserialize)]
pub struct FaturamentoRequest {
    #[serde(flatten)]
    pub credentials: CertificateCredentials,
    /// Issuance year (`YYYY`)
    pub ano: String,
}

/// Response of `POST /api/faturamento-emissao`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaturamentoResponse {
    #[serde(rename = "CNPJ")]
    pub cnpj: String,
    #[serde(rename = "Faturamento")]
    pub faturamento: f64,
    #[serde(rename = "Notas_Encontradas")]
    pub notas_encontradas: u32,
    #[serde(rename = "Ano_Emissao")]
    pub ano_emissao: String,
}

/// Body of `POST /api/faturamento-paginado-emissao`.
#[derive(Debug, Clone, Deserialize)]
pub struct FaturamentoPaginadoRequest {
    #[serde(flatten)]
    pub credentials: CertificateCredentials,
    /// Issuance year (`YYYY`)
    pub ano: String,
    /// 1-based listing page
    pub pagina: u32,
}

/// Response of `POST /api/faturamento-paginado-emissao`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaturamentoPaginadoResponse {
    #[serde(rename = "CNPJ")]
    pub cnpj: String,
    #[serde(rename = "Pagina")]
    pub pagina: u32,
    #[serde(rename = "Faturamento_Pagina")]
    pub faturamento_pagina: f64,
    #[serde(rename = "Notas_Pagina")]
    pub notas_pagina: u32,
    #[serde(rename = "Tem_Proxima_Pagina")]
    pub tem_proxima_pagina: bool,
    #[serde(rename = "Motivo_Parada")]
    pub motivo_parada: Option<String>,
    #[serde(rename = "Ano_Emissao_Filtro")]
    pub ano_emissao_filtro: String,
}

/// Liveness payload served on `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
