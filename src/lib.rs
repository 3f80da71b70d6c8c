//! nfse-faturamento library
//!
//! Core of the `nfse-faturamento` HTTP service: logs into the national NFS-e
//! issuer portal with an A1 certificate and sums the invoices issued in a
//! given year, filtered by issuance date rather than accrual period.
//!
//! ## Overview
//!
//! - [`session`] - PKCS#12 decoding, temporary certificate files and the authenticated portal session
//! - [`listing`] - Row filter / stop logic and the full-scan and single-page loops
//! - [`service`] - Request pipeline shared by both endpoints
//! - [`server`] - axum router and handlers
//! - [`cli`] - Command-line entry point
//! - [`config`] - TOML configuration
//! - [`models`] - Request/response bodies
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use nfse_faturamento::{config::ResolvedConfig, models::FaturamentoRequest, service};
//!
//! # async fn example(request: FaturamentoRequest) -> nfse_faturamento::errors::AppResult<()> {
//! let config = ResolvedConfig::default();
//! let response = service::faturamento_emissao(&config, request).await?;
//! println!("{} notas, R$ {}", response.notas_encontradas, response.faturamento);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod listing;
pub mod models;
pub mod server;
pub mod service;
pub mod session;
pub mod utils;
