//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use crate::error::{Error, ErrorCode, Hint, Result};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
            }),
        }
    }
}

fn write_response<T: Serialize, W: Write>(out: &mut W, response: &CliResponse<T>) -> Result<()> {
    let payload = response.to_json()?;
    if let Err(e) = writeln!(out, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

/// Write the JSON envelope to `out` and return the process exit code.
///
/// A command that succeeded but whose output could not be written exits 1.
pub fn write_json_result<W: Write>(
    out: &mut W,
    result: Result<serde_json::Value>,
    exit_code: i32,
) -> i32 {
    let written = match result {
        Ok(data) => write_response(out, &CliResponse::success(data)),
        Err(err) => write_response(out, &CliResponse::<()>::from_error(&err)),
    };

    match written {
        Ok(()) => exit_code,
        Err(err) => {
            log_status!("output", "{}", err);
            if exit_code == 0 {
                1
            } else {
                exit_code
            }
        }
    }
}

pub fn print_json_result(result: Result<serde_json::Value>, exit_code: i32) -> i32 {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json_result(&mut handle, result, exit_code)
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(&err);
            (Err(err), exit_code)
        }
    }
}

/// Failed external commands pass their own exit status through; everything
/// else maps to a fixed code per error category.
pub fn exit_code_for_error(err: &Error) -> i32 {
    if let Some(code) = err.command_exit_code() {
        return code.clamp(1, 255);
    }

    match err.code {
        ErrorCode::ConfigMissingKey
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationMissingArgument
        | ErrorCode::ValidationInvalidArgument => 2,

        ErrorCode::ServerNotFound => 4,

        ErrorCode::SshIdentityFileNotFound | ErrorCode::SshConnectFailed => 255,

        ErrorCode::RemoteCommandFailed
        | ErrorCode::GitCommandFailed
        | ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}
