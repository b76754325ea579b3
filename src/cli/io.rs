//! JSON output for CLI
//!
//! One envelope per invocation on stdout: `{"status":"ok","data":...}` or
//! `{"status":"error","code":...,"message":...}`.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use super::errors::CliResult;

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Envelope<'a> {
    Ok { data: Value },
    Error { code: &'a str, message: &'a str },
}

fn emit(envelope: &Envelope<'_>) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, envelope)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

pub fn write_response(data: Value) -> CliResult<()> {
    emit(&Envelope::Ok { data })
}

pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    emit(&Envelope::Error { code, message })
}
