use super::certificate::{CertificateIdentity, TempCredentials};
use crate::config::ResolvedConfig;
use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::utils::format_cnpj;
use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use scraper::{Html, Selector};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use url::Url;

static PROFILE_SELECTOR_CACHED: OnceLock<Selector> = OnceLock::new();
static CNPJ_REGEX: OnceLock<Regex> = OnceLock::new();

/// Result of requesting one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    /// HTTP 200 with the page markup
    Html(String),
    /// Any other status; callers treat it as "no more pages"
    Unavailable(u16),
}

/// Authenticated portal session scoped to one API call.
///
/// Owns the HTTP client, its cookie jar and the temporary certificate files.
/// Dropping the session (or calling [`close`](Self::close)) removes the files.
#[derive(Debug)]
pub struct PortalSession {
    client: reqwest::Client,
    base_url: Url,
    cnpj: Option<String>,
    credentials: TempCredentials,
}

impl PortalSession {
    /// Logs into the portal with the client certificate.
    ///
    /// # Workflow
    ///
    /// 1. Writes the key and certificate to temporary files and loads them back as the TLS identity
    /// 2. Requests the certificate login page
    /// 3. Confirms the `Emissor` session cookie was set
    /// 4. Extracts the CNPJ from the profile dropdown, if present
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Authentication`] on TLS/transport failure or when the
    /// login cookie is missing. The temporary files are removed before returning.
    pub async fn login(identity: &CertificateIdentity, config: &ResolvedConfig) -> AppResult<Self> {
        let base_url = config.portal_url()?;
        let login_url = base_url.join(LOGIN_PATH)?;

        let credentials = identity.write_temp_credentials(config.credentials_dir.as_deref())?;
        let tls_identity = credentials.load_identity()?;

        let jar = Arc::new(Jar::default());
        let client = build_client(config, tls_identity, Arc::clone(&jar))?;

        let response = client.get(login_url.as_str()).send().await.map_err(|e| {
            warn!(error = %e, "Certificate login request failed");
            AppError::Authentication
        })?;
        let status = response.status();

        if !has_login_cookie(jar.as_ref(), &login_url) {
            warn!(status = status.as_u16(), "Login response did not set the session cookie");
            return Err(AppError::Authentication);
        }

        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read login response body");
            AppError::Authentication
        })?;
        let cnpj = extract_cnpj(&body);

        info!(
            cnpj_found = cnpj.is_some(),
            intermediates = identity.intermediates(),
            "Portal login succeeded"
        );

        Ok(Self {
            client,
            base_url,
            cnpj,
            credentials,
        })
    }

    /// CNPJ or the "unknown" placeholder used in responses.
    pub fn cnpj_or_unknown(&self) -> String {
        self.cnpj.clone().unwrap_or_else(|| UNKNOWN_CNPJ.to_string())
    }

    /// Requests one page of the issued-invoices listing.
    ///
    /// # Errors
    ///
    /// Transport failures (timeouts included) are returned as `NetworkError`.
    /// Non-200 statuses are not errors; they come back as [`PageFetch::Unavailable`].
    pub async fn fetch_page(&self, page: u32) -> AppResult<PageFetch> {
        let url = listing_url(&self.base_url, page)?;
        debug!(page = page, url = %url, "Fetching listing page");

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(page = page, status = status.as_u16(), "Listing page unavailable");
            return Ok(PageFetch::Unavailable(status.as_u16()));
        }

        Ok(PageFetch::Html(response.text().await?))
    }

    /// Ends the session and removes the temporary certificate files.
    pub fn close(self) {
        self.credentials.close();
    }
}

/// Builds the listing URL: page 1 is the bare path, later pages add `?pg=N`.
pub fn listing_url(base_url: &Url, page: u32) -> AppResult<Url> {
    let mut url = base_url.join(LISTING_PATH)?;
    if page > 1 {
        url.query_pairs_mut()
            .append_pair(PAGE_QUERY_PARAM, &page.to_string());
    }
    Ok(url)
}

/// Extracts the 14-digit CNPJ from the profile dropdown and formats it.
///
/// Returns `None` when the dropdown or a 14-digit number is missing.
pub fn extract_cnpj(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = PROFILE_SELECTOR_CACHED.get_or_init(|| {
        Selector::parse(PROFILE_SELECTOR).expect("PROFILE_SELECTOR is a valid CSS selector")
    });
    let regex = CNPJ_REGEX.get_or_init(|| {
        Regex::new(CNPJ_REGEX_PATTERN).expect("CNPJ_REGEX_PATTERN is a valid regex pattern")
    });

    let profile = document.select(selector).next()?;
    let text: String = profile.text().collect();
    let digits = regex.captures(&text)?.get(1)?.as_str();
    format_cnpj(digits)
}

fn has_login_cookie(jar: &Jar, url: &Url) -> bool {
    let Some(header) = jar.cookies(url) else {
        return false;
    };
    let Ok(cookies) = header.to_str() else {
        return false;
    };
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split('=').next())
        .any(|name| name == LOGIN_COOKIE_NAME)
}

fn build_client(
    config: &ResolvedConfig,
    identity: reqwest::Identity,
    jar: Arc<Jar>,
) -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| AppError::InvalidInput(format!("Invalid user agent: {e}")))?;
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

    reqwest::Client::builder()
        .identity(identity)
        .cookie_provider(jar)
        .default_headers(headers)
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| {
            warn!(error = %e, "Failed to build TLS client with certificate");
            AppError::Authentication
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_first_page_has_no_query() {
        let base = Url::parse("https://www.nfse.gov.br").unwrap();
        let url = listing_url(&base, 1).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.nfse.gov.br/EmissorNacional/Notas/Emitidas"
        );
    }

    #[test]
    fn listing_url_later_pages_use_pg_param() {
        let base = Url::parse("https://www.nfse.gov.br/").unwrap();
        let url = listing_url(&base, 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.nfse.gov.br/EmissorNacional/Notas/Emitidas?pg=3"
        );
    }

    #[test]
    fn extract_cnpj_formats_fourteen_digits() {
        let html = r##"
            <ul class="nav">
              <li class="dropdown perfil">
                <a href="#">EMPRESA TESTE LTDA<br/>CNPJ: 12345678000190</a>
              </li>
            </ul>
        "##;
        assert_eq!(extract_cnpj(html).as_deref(), Some("12.345.678/0001-90"));
    }

    #[test]
    fn extract_cnpj_ignores_wrong_length() {
        let html = r#"<li class="dropdown perfil">CPF: 123 CNPJ: 1234567800019</li>"#;
        assert_eq!(extract_cnpj(html), None);
    }

    #[test]
    fn extract_cnpj_requires_profile_dropdown() {
        let html = r#"<li class="dropdown">CNPJ: 12345678000190</li>"#;
        assert_eq!(extract_cnpj(html), None);
    }

    #[test]
    fn login_cookie_is_detected_by_name() {
        let url = Url::parse("https://www.nfse.gov.br/EmissorNacional/Certificado").unwrap();
        let jar = Jar::default();
        jar.add_cookie_str("Outro=1; Path=/", &url);
        assert!(!has_login_cookie(&jar, &url));

        jar.add_cookie_str("Emissor=abc123; Path=/", &url);
        assert!(has_login_cookie(&jar, &url));
    }

    #[test]
    fn login_cookie_name_must_match_exactly() {
        let url = Url::parse("https://www.nfse.gov.br/EmissorNacional/Certificado").unwrap();
        let jar = Jar::default();
        jar.add_cookie_str("EmissorAntigo=1; Path=/", &url);
        assert!(!has_login_cookie(&jar, &url));
    }
}
