use crate::errors::{AppError, AppResult};
use std::fmt;

/// Issuance year requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearFilter(u32);

impl YearFilter {
    /// Validates that `year` is exactly four ASCII digits (`YYYY`).
    ///
    /// Returns `InvalidInput` otherwise.
    pub fn parse(year: &str) -> AppResult<Self> {
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput(format!(
                "Ano deve estar no formato YYYY, recebido: '{year}'"
            )));
        }
        year.parse()
            .map(Self)
            .map_err(|e| AppError::InvalidInput(format!("Ano inválido '{year}': {e}")))
    }

    pub fn year(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}
