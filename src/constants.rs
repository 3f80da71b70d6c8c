// Portal defaults
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://www.nfse.gov.br";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

// Portal paths
pub const LOGIN_PATH: &str = "/EmissorNacional/Certificado";
pub const LISTING_PATH: &str = "/EmissorNacional/Notas/Emitidas";
pub const PAGE_QUERY_PARAM: &str = "pg";

// Login markers
pub const LOGIN_COOKIE_NAME: &str = "Emissor";
pub const PROFILE_SELECTOR: &str = "li.dropdown.perfil";
pub const CNPJ_REGEX_PATTERN: &str = r"CNPJ:\s*(\d+)";

// Listing markup
pub const TABLE_BODY_SELECTOR: &str = "tbody";
pub const ROW_SELECTOR: &str = "tr";
pub const ISSUED_ICON_SELECTOR: &str = r#"img[src="/EmissorNacional/img/tb-gerada.svg"]"#;
pub const ISSUE_DATE_SELECTOR: &str = "td.td-data";
pub const VALUE_SELECTOR: &str = "td.td-valor";
pub const ISSUE_DATE_REGEX_PATTERN: &str = r"(\d{2})/(\d{2})/(\d{4})";
pub const NEXT_PAGE_SELECTOR: &str = r#"div.paginacao a[title="Próxima"]"#;

// Response placeholders
pub const UNKNOWN_CNPJ: &str = "Não identificado";

// Service aliases
pub const FULL_SCAN_ALIASES: &[&str] = &["full", "full-scan", "emissao"];
pub const PAGINATED_ALIASES: &[&str] = &["paginated", "paginado", "page"];
