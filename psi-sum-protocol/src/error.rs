//! Error types for the PSI-Sum protocol.

/// Errors that can occur during PSI-Sum protocol execution.
///
/// Every variant is fatal to the current run. A caller may restart from
/// scratch with fresh parties, but must never resume a failed run.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PsiSumError {
    /// Group parameter search did not converge.
    #[error("Group parameter generation failed: {0}")]
    ParameterGeneration(String),

    /// Paillier key generation did not converge.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Requested or supplied parameters are unusable.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A value failed the group range or membership check.
    #[error("Invalid group element: {0}")]
    InvalidGroupElement(String),

    /// A plaintext is outside `[0, n)`.
    #[error("Invalid plaintext: {0}")]
    InvalidPlaintext(String),

    /// A ciphertext is outside `Z*_{n^2}`.
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// A round was invoked before its prerequisite, or twice.
    #[error("Protocol sequence error: {0}")]
    ProtocolSequence(String),
}

/// Result type for PSI-Sum operations.
pub type Result<T> = std::result::Result<T, PsiSumError>;
