// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Helmsman orchestration core.
//!
//! This crate provides the foundational trait definitions, error type,
//! model catalog types, and common types used throughout the Helmsman
//! workspace. All backend, embedding, and device-probe collaborators
//! implement traits defined here.

pub mod catalog;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use catalog::{BackendKind, ModelDescriptor};
pub use error::HelmsmanError;
pub use types::{clamp_difficulty, GenerationMeta, GenerationRequest, DEFAULT_DIFFICULTY};

// Re-export all collaborator traits at crate root.
pub use traits::{
    AcceleratorProbe, AcceleratorSnapshot, DifficultyEstimator, EmbeddingAdapter, LoadedModel,
    LocalEngine, RemoteBackend,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helmsman_error_has_all_variants() {
        // Verify all 10 error variants exist and can be constructed.
        let _config = HelmsmanError::Config("test".into());
        let _backend = HelmsmanError::Backend {
            name: "openai".into(),
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _open = HelmsmanError::CircuitOpen {
            backend: "openai".into(),
        };
        let _cooldown = HelmsmanError::CooldownActive {
            subsystem: "local-inference".into(),
            remaining: std::time::Duration::from_secs(30),
        };
        let _exhausted = HelmsmanError::ResourceExhausted {
            accelerator: 0,
            required_mb: 16000,
            available_mb: 4000,
        };
        let _not_loaded = HelmsmanError::ModelNotLoaded {
            model: "qwen-14b".into(),
        };
        let _no_candidate = HelmsmanError::NoCandidateModel { difficulty: 50 };
        let _retrieval = HelmsmanError::Retrieval("test".into());
        let _timeout = HelmsmanError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = HelmsmanError::Internal("test".into());
    }

    #[test]
    fn error_messages_name_the_backend() {
        let err = HelmsmanError::CircuitOpen {
            backend: "local-qwen-14b".into(),
        };
        assert!(err.to_string().contains("local-qwen-14b"));

        let err = HelmsmanError::ResourceExhausted {
            accelerator: 1,
            required_mb: 16000,
            available_mb: 4000,
        };
        let msg = err.to_string();
        assert!(msg.contains("16000"));
        assert!(msg.contains("4000"));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every collaborator trait is reachable
        // through the public API.
        fn _assert_local_engine<T: LocalEngine>() {}
        fn _assert_loaded_model<T: LoadedModel>() {}
        fn _assert_remote_backend<T: RemoteBackend>() {}
        fn _assert_embedding<T: EmbeddingAdapter>() {}
        fn _assert_estimator<T: DifficultyEstimator>() {}
        fn _assert_probe<T: AcceleratorProbe>() {}
    }
}
