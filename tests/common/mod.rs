//! Common test utilities for integration tests

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nfse_faturamento::config::ResolvedConfig;
use nfse_faturamento::models::CertificateCredentials;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509NameBuilder, X509};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CERT_PASSWORD: &str = "senha-teste";

/// Self-signed A1-style archive, base64 encoded.
#[allow(dead_code)]
pub fn sample_certificate_base64(password: &str) -> String {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "EMPRESA TESTE LTDA:12345678000190")
        .unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(42).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let der = Pkcs12::builder()
        .name("empresa-teste")
        .pkey(&pkey)
        .cert(&cert)
        .build2(password)
        .unwrap()
        .to_der()
        .unwrap();
    STANDARD.encode(der)
}

#[allow(dead_code)]
pub fn valid_credentials() -> CertificateCredentials {
    CertificateCredentials {
        certificado_base64: sample_certificate_base64(CERT_PASSWORD),
        senha_certificado: CERT_PASSWORD.to_string(),
    }
}

/// Archive exported with `openssl pkcs12 -export -legacy` (RC2-40 / 3DES, SHA-1 MAC).
#[allow(dead_code)]
pub fn legacy_credentials() -> CertificateCredentials {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy_a1.p12");
    CertificateCredentials {
        certificado_base64: STANDARD.encode(std::fs::read(path).unwrap()),
        senha_certificado: "senha".to_string(),
    }
}

/// Config pointing at a fake portal, with certificate files under `credentials_dir`.
#[allow(dead_code)]
pub fn test_config(portal_base_url: &str, credentials_dir: &Path) -> ResolvedConfig {
    ResolvedConfig {
        portal_base_url: portal_base_url.to_string(),
        request_timeout_secs: 5,
        credentials_dir: Some(credentials_dir.to_path_buf()),
        ..ResolvedConfig::default()
    }
}

#[allow(dead_code)]
pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

/// One row of the issued-invoices table.
#[allow(dead_code)]
pub fn listing_row(issued: bool, date: &str, value: &str) -> String {
    let icon = if issued {
        "/EmissorNacional/img/tb-gerada.svg"
    } else {
        "/EmissorNacional/img/tb-cancelada.svg"
    };
    format!(
        r#"<tr>
             <td class="td-situacao"><img src="{icon}" alt="situação"></td>
             <td class="td-data">{date}</td>
             <td class="td-competencia">12/2024</td>
             <td class="td-valor">{value}</td>
           </tr>"#
    )
}

/// Full listing page with an optional usable "Próxima" link.
#[allow(dead_code)]
pub fn listing_page(rows: &[String], next_page: Option<u32>) -> String {
    let href = match next_page {
        Some(n) => format!("/EmissorNacional/Notas/Emitidas?pg={n}"),
        None => "javascript:void(0);".to_string(),
    };
    format!(
        r#"<html><body>
             <table class="table">
               <thead><tr><th>Situação</th><th>Emissão</th><th>Competência</th><th>Valor</th></tr></thead>
               <tbody>{}</tbody>
             </table>
             <div class="paginacao"><a title="Próxima" href="{href}">&gt;</a></div>
           </body></html>"#,
        rows.concat()
    )
}

#[allow(dead_code)]
pub const PROFILE_WITH_CNPJ: &str = r##"<html><body><ul class="nav">
  <li class="dropdown perfil"><a href="#">EMPRESA TESTE LTDA <br/> CNPJ: 12345678000190</a></li>
</ul></body></html>"##;

#[allow(dead_code)]
pub const PROFILE_WITHOUT_CNPJ: &str =
    r#"<html><body><ul class="nav"><li class="dropdown perfil">Usuário</li></ul></body></html>"#;

/// Response served by the fake portal for one listing page.
#[derive(Clone)]
pub struct FakePage {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

#[allow(dead_code)]
impl FakePage {
    pub fn ok(body: String) -> Self {
        Self {
            status: 200,
            body,
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: None,
        }
    }

    /// Answers only after `delay`, long enough to trip the client timeout.
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok(listing_page(&[], None))
        }
    }
}

#[derive(Clone)]
struct PortalState {
    pages: Arc<Vec<FakePage>>,
    login_sets_cookie: bool,
    profile: &'static str,
    requested_pages: Arc<Mutex<Vec<u32>>>,
}

/// Local stand-in for the NFS-e portal, served over plain HTTP.
pub struct FakePortal {
    pub base_url: String,
    requested_pages: Arc<Mutex<Vec<u32>>>,
}

#[allow(dead_code)]
impl FakePortal {
    /// Listing pages requested so far, in order.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }
}

async fn login(State(state): State<PortalState>) -> Response {
    if state.login_sets_cookie {
        (
            [(header::SET_COOKIE, "Emissor=sessao-teste; Path=/; HttpOnly")],
            Html(state.profile),
        )
            .into_response()
    } else {
        Html(state.profile).into_response()
    }
}

async fn listing(
    State(state): State<PortalState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page: u32 = params
        .get("pg")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    state.requested_pages.lock().unwrap().push(page);

    match page
        .checked_sub(1)
        .and_then(|index| state.pages.get(index as usize))
    {
        Some(fake) => {
            if let Some(delay) = fake.delay {
                tokio::time::sleep(delay).await;
            }
            let status = StatusCode::from_u16(fake.status).unwrap();
            (status, Html(fake.body.clone())).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Starts a fake portal on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_portal(
    pages: Vec<FakePage>,
    login_sets_cookie: bool,
    profile: &'static str,
) -> FakePortal {
    let requested_pages = Arc::new(Mutex::new(Vec::new()));
    let state = PortalState {
        pages: Arc::new(pages),
        login_sets_cookie,
        profile,
        requested_pages: Arc::clone(&requested_pages),
    };

    let app = Router::new()
        .route("/EmissorNacional/Certificado", get(login))
        .route("/EmissorNacional/Notas/Emitidas", get(listing))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakePortal {
        base_url: format!("http://{addr}"),
        requested_pages,
    }
}
