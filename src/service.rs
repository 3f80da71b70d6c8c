//! Request pipeline shared by both endpoints.
//!
//! validate → decode certificate → log in → scan → respond. The session (and
//! with it the temporary certificate files) is closed before returning,
//! whether the scan succeeded or not.

use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::listing::{scan_all_pages, scan_single_page, YearFilter};
use crate::models::{
    CertificateCredentials, FaturamentoPaginadoRequest, FaturamentoPaginadoResponse,
    FaturamentoRequest, FaturamentoResponse,
};
use crate::session::{CertificateIdentity, PortalSession};
use crate::utils::round_two_decimals;
use tracing::info;

async fn open_session(
    config: &ResolvedConfig,
    credentials: &CertificateCredentials,
) -> AppResult<PortalSession> {
    let identity = CertificateIdentity::from_base64(
        &credentials.certificado_base64,
        &credentials.senha_certificado,
    )?;
    PortalSession::login(&identity, config).await
}

/// Total invoiced in `request.ano`, walking every listing page.
///
/// # Errors
///
/// - `InvalidInput` when `ano` is not `YYYY`
/// - `Authentication` when the certificate or login fails
/// - `NetworkError` on transport failures while scanning
pub async fn faturamento_emissao(
    config: &ResolvedConfig,
    request: FaturamentoRequest,
) -> AppResult<FaturamentoResponse> {
    let year = YearFilter::parse(&request.ano)?;
    info!(year = %year, "Full-scan request received");

    let session = open_session(config, &request.credentials).await?;
    let scan = scan_all_pages(&session, year).await;
    let cnpj = session.cnpj_or_unknown();
    session.close();
    let totals = scan?;

    Ok(FaturamentoResponse {
        cnpj,
        faturamento: round_two_decimals(totals.total),
        notas_encontradas: totals.count,
        ano_emissao: request.ano,
    })
}

/// Partial total for `request.pagina` only.
///
/// # Errors
///
/// Same as [`faturamento_emissao`], plus `InvalidInput` when `pagina` is 0.
pub async fn faturamento_paginado(
    config: &ResolvedConfig,
    request: FaturamentoPaginadoRequest,
) -> AppResult<FaturamentoPaginadoResponse> {
    let year = YearFilter::parse(&request.ano)?;
    if request.pagina == 0 {
        return Err(AppError::InvalidInput(
            "Página deve ser maior ou igual a 1".into(),
        ));
    }
    info!(year = %year, page = request.pagina, "Paginated request received");

    let session = open_session(config, &request.credentials).await?;
    let scan = scan_single_page(&session, year, request.pagina).await;
    let cnpj = session.cnpj_or_unknown();
    session.close();
    let report = scan?;

    Ok(FaturamentoPaginadoResponse {
        cnpj,
        pagina: report.page,
        faturamento_pagina: round_two_decimals(report.total),
        notas_pagina: report.count,
        tem_proxima_pagina: report.has_next,
        motivo_parada: report.stop_reason.map(|r| r.to_string()),
        ano_emissao_filtro: request.ano,
    })
}
