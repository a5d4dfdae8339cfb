//! Proof-of-work mining

pub mod pow;

pub use pow::ProofOfWork;
