#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Failures that stop a run before or after the render pass.
///
/// Problems found while rendering individual nodes are not reported through
/// this type; they are collected into a [`crate::render::RenderResult`].
#[derive(Debug, Error, Diagnostic)]
pub enum StampError {
    #[error("Input directory not found: {path}")]
    #[diagnostic(help("Pass an existing template directory with --input"))]
    InputNotFound { path: PathBuf },

    #[error("Output directory already exists: {path}")]
    #[diagnostic(help("Use --overwrite to replace the existing directory"))]
    OutputExists { path: PathBuf },

    #[error("Failed to parse {path}")]
    #[diagnostic(help("Check the TOML syntax in your stamp.toml file"))]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse cookiecutter.json")]
    #[diagnostic(help("Check the JSON syntax in your cookiecutter.json file"))]
    ManifestParseCookiecutter {
        #[source]
        source: serde_json::Error,
    },

    #[error("cookiecutter.json must contain a JSON object")]
    CookiecutterNotObject,

    #[error("Invalid template manifest: {reason}")]
    InvalidManifest { reason: String },

    #[error("Invalid variable definition for '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },

    #[error("Failed to parse answers file {path}: {message}")]
    #[diagnostic(help("Answers files are flat key = value tables in TOML or JSON"))]
    AnswersParse { path: PathBuf, message: String },

    #[error("Invalid --data argument '{input}'")]
    #[diagnostic(help("Use the form -d key=value"))]
    InvalidData { input: String },

    #[error("Validation failed for variable '{name}': {message}")]
    ValidationFailed { name: String, message: String },

    #[error("Prompt cancelled by user")]
    PromptCancelled,

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Hook '{hook}' failed: {message}")]
    #[diagnostic(help("The project was generated; fix the hook command and rerun it by hand"))]
    HookError { hook: String, message: String },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StampError>;
