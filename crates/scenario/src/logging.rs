//! Logging descriptor document written next to each staged node config.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// An appender entry in the node's logging descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appender {
    /// Appender name referenced by loggers.
    pub name: String,
    /// Appender type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific arguments.
    pub args: serde_json::Value,
    /// Whether the appender is active.
    pub enabled: bool,
}

/// A logger entry in the node's logging descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logger {
    /// Logger name.
    pub name: String,
    /// Minimum level emitted.
    pub level: String,
    /// Whether the logger is active.
    pub enabled: bool,
    /// Whether records also flow to parent loggers.
    pub additivity: bool,
    /// Appenders this logger writes to.
    pub appenders: Vec<String>,
}

/// The structured logging document the node reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingDescriptor {
    /// Descriptor fragments to include.
    pub includes: Vec<String>,
    /// Available appenders.
    pub appenders: Vec<Appender>,
    /// Configured loggers.
    pub loggers: Vec<Logger>,
}

impl LoggingDescriptor {
    /// The descriptor staged for every node: colored console output on
    /// stderr and stdout plus a network appender, with a debug-level
    /// default logger.
    pub fn standard() -> Self {
        let level_colors = json!([
            { "level": "debug", "color": "green" },
            { "level": "warn", "color": "brown" },
            { "level": "error", "color": "red" }
        ]);
        Self {
            includes: Vec::new(),
            appenders: vec![
                Appender {
                    name: "stderr".to_string(),
                    kind: "console".to_string(),
                    args: json!({ "stream": "std_error", "level_colors": level_colors }),
                    enabled: true,
                },
                Appender {
                    name: "stdout".to_string(),
                    kind: "console".to_string(),
                    args: json!({ "stream": "std_out", "level_colors": level_colors }),
                    enabled: true,
                },
                Appender {
                    name: "net".to_string(),
                    kind: "gelf".to_string(),
                    args: json!({ "endpoint": "127.0.0.1:12201", "host": "testnet_00" }),
                    enabled: true,
                },
            ],
            loggers: vec![Logger {
                name: "default".to_string(),
                level: "debug".to_string(),
                enabled: true,
                additivity: false,
                appenders: vec!["stderr".to_string(), "net".to_string()],
            }],
        }
    }

    /// Serialize the descriptor as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_descriptor_shape() {
        let descriptor = LoggingDescriptor::standard();
        assert!(descriptor.includes.is_empty());
        assert_eq!(descriptor.appenders.len(), 3);
        assert_eq!(descriptor.loggers.len(), 1);
        assert_eq!(descriptor.loggers[0].appenders, vec!["stderr", "net"]);
    }

    #[test]
    fn test_json_roundtrip() {
        let descriptor = LoggingDescriptor::standard();
        let encoded = descriptor.to_json().unwrap();
        let decoded: LoggingDescriptor = serde_json::from_str(&encoded).unwrap();
        assert_eq!(descriptor, decoded);
    }

    #[test]
    fn test_appender_type_field_name() {
        let encoded = LoggingDescriptor::standard().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["appenders"][0]["type"], "console");
    }
}
