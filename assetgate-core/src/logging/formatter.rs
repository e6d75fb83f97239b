//! Log line formats

use crate::logging::destinations::LogEntry;
use std::fmt;
use std::str::FromStr;

/// How log lines are formatted
#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    /// One JSON object per line
    /// Example: {"timestamp":"2024-01-15T10:30:00Z","level":"INFO","target":"assetgate_core::session","message":"Auth store initialized"}
    Json,

    /// Example: 2024-01-15 10:30:00.000 INFO  [assetgate_core::session] Auth store initialized
    Human,

    /// Example: timestamp=2024-01-15T10:30:00Z level=INFO target=assetgate_core::session message="Auth store initialized"
    Logfmt,
}

impl LogFormat {
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
            LogFormat::Logfmt => format_logfmt(entry),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Human => "human",
            LogFormat::Logfmt => "logfmt",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "human" | "text" => Ok(LogFormat::Human),
            "logfmt" => Ok(LogFormat::Logfmt),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();

    json.insert("timestamp".to_string(), serde_json::Value::String(entry.timestamp.to_rfc3339()));
    json.insert("level".to_string(), serde_json::Value::String(entry.level.to_string()));
    json.insert("target".to_string(), serde_json::Value::String(entry.target.clone()));
    json.insert("message".to_string(), serde_json::Value::String(entry.message.clone()));

    if let Some((file, line)) = &entry.location {
        json.insert("file".to_string(), serde_json::Value::String(file.clone()));
        json.insert("line".to_string(), serde_json::Value::from(*line));
    }

    for (key, value) in &entry.fields {
        json.insert(key.clone(), value.clone());
    }

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

fn format_human(entry: &LogEntry) -> String {
    let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
    let mut line = format!("{} {:5} [{}] {}", timestamp, entry.level.as_str(), entry.target, entry.message);

    for (key, value) in &entry.fields {
        line.push_str(&format!(" {}={}", key, plain(value)));
    }

    line
}

fn format_logfmt(entry: &LogEntry) -> String {
    let mut parts = vec![
        format!("timestamp={}", entry.timestamp.to_rfc3339()),
        format!("level={}", entry.level),
        format!("target={}", entry.target),
        format!("message={}", quoted(&entry.message)),
    ];

    if let Some((file, line)) = &entry.location {
        parts.push(format!("file={}", quoted(file)));
        parts.push(format!("line={}", line));
    }

    for (key, value) in &entry.fields {
        let value = match value {
            serde_json::Value::Number(_) | serde_json::Value::Bool(_) => value.to_string(),
            _ => quoted(&plain(value)),
        };
        parts.push(format!("{}={}", key, value));
    }

    parts.join(" ")
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}
