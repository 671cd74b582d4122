//! Human-readable error descriptions, structured JSON errors, and exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration problems (clap uses 2 for usage errors).
pub const EXIT_CONFIG: i32 = 3;
pub const EXIT_FAILURE: i32 = 1;

/// Errors raised by the CLI itself before the engine exists.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("config file not found: {}", .0.display())]
    MissingConfig(PathBuf),
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use progressor_core::error::{BuildError, EngineError};

    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/progressor.toml for a sample."
            ),
            CliError::MissingConfig(path) => format!(
                "What happened: Config file {} does not exist.\nLikely causes: Typo in --config or the file was moved.\nHow to fix: Point --config at an existing TOML file, or omit it to use defaults.",
                path.display()
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingTransport => {
                "What happened: No transport was provided to the engine.\nLikely causes: The peripheral link failed to initialize.\nHow to fix: Pass a transport via with_transport(...).".to_string()
            }
            BuildError::MissingLoadCell => {
                "What happened: No load cell was provided to the engine.\nLikely causes: The sensor backend failed to initialize.\nHow to fix: Check [sensor] in the config.".to_string()
            }
            BuildError::MissingBattery | BuildError::MissingPower => format!(
                "What happened: {be}.\nLikely causes: Engine assembly is incomplete.\nHow to fix: Provide every collaborator to the builder."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range stream or hibernation values.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ee) = err.downcast_ref::<EngineError>() {
        if matches!(ee, EngineError::Timeout) {
            return "What happened: Load cell read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify DT/SCK pins and power, and consider increasing sensor.read_timeout_ms in the config.".to_string();
        }
        return format!(
            "What happened: {ee}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open hx711") || lower.contains("requires the `hardware` feature") {
        return format!(
            "What happened: Failed to initialize the HX711.\nLikely causes: Built without the `hardware` feature, wrong pin numbers, or missing GPIO permissions.\nHow to fix: Rebuild with --features hardware and check [sensor.pins]. Original: {msg}"
        );
    }

    if lower.contains("weight profile csv") || lower.contains("invalid csv row") {
        return format!(
            "What happened: The weight profile CSV could not be used ({msg}).\nHow to fix: Use headers 't_ms,kg' with non-decreasing t_ms and at least one row."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Configuration problems exit with 3, everything else with 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use progressor_core::error::BuildError;
    if err.downcast_ref::<CliError>().is_some()
        || matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        )
    {
        return EXIT_CONFIG;
    }
    EXIT_FAILURE
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use progressor_core::error::{BuildError, EngineError};
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::InvalidConfig(_) => "InvalidConfig",
            CliError::MissingConfig(_) => "MissingConfig",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    if let Some(EngineError::Timeout) = err.downcast_ref::<EngineError>() {
        return "Timeout";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_three() {
        let e = eyre::Report::new(CliError::InvalidConfig("x".into()));
        assert_eq!(exit_code_for_error(&e), EXIT_CONFIG);
        let e = eyre::Report::new(progressor_core::BuildError::InvalidConfig("y"));
        assert_eq!(exit_code_for_error(&e), EXIT_CONFIG);
        let e = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&e), EXIT_FAILURE);
    }

    #[test]
    fn json_error_names_reason() {
        let e = eyre::Report::new(CliError::MissingConfig(PathBuf::from("nope.toml")));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "MissingConfig");
        assert_eq!(v["exit_code"], 3);
        assert!(v["message"].as_str().unwrap().contains("nope.toml"));
    }
}
