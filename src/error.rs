use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A native integer does not fit the fixed limb layout.
    #[error("{value} does not fit in {bits} bits")]
    Construction { value: String, bits: usize },

    #[error("constraint system: {0:?}")]
    Synthesis(#[from] halo2_proofs::plonk::Error),

    /// The freshly produced proof does not verify, so some asserted relation
    /// was not satisfied by the witness.
    #[error("{relation} relation is unsatisfied for input {input}")]
    Unsatisfied { relation: &'static str, input: String },

    #[error("step input {found} does not continue the chain started at {expected}")]
    ContinuityMismatch { expected: String, found: String },

    #[error("attestation rejected at link {link}")]
    Verification { link: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
