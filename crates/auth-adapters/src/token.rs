use domains::{AppError, Result, TokenSource};

const TOKEN_BYTES: usize = 24;

/// Session tokens: 24 bytes from the OS random source, hex encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenSource;

impl TokenSource for RandomTokenSource {
    fn generate(&self) -> Result<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| {
            AppError::Configuration(format!("secure random source unavailable: {e}"))
        })?;
        Ok(hex::encode(bytes))
    }
}
