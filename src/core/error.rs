use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,
    ValidationInvalidJson,

    ProjectNotFound,

    TemplateMissingKey,

    ScmCommandFailed,
    TransferFailed,
    RemoteCommandFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::ProjectNotFound => "project.not_found",

            ErrorCode::TemplateMissingKey => "template.missing_key",

            ErrorCode::ScmCommandFailed => "scm.command_failed",
            ErrorCode::TransferFailed => "transfer.failed",
            ErrorCode::RemoteCommandFailed => "remote.command_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingKeysDetails {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMissingKeyDetails {
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn details_value<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn config_missing_keys(keys: Vec<String>) -> Self {
        let message = format!("Missing required settings: {}", keys.join(", "));
        Self::new(
            ErrorCode::ConfigMissingKey,
            message,
            details_value(MissingKeysDetails { keys }),
        )
        .with_hint("Set values in the project settings map or pass --var key=value")
    }

    pub fn config_invalid_json(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details_value(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid configuration value: {}", problem),
            details_value(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem,
            }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details_value(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                value,
            }),
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });
        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn project_not_found(id: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            "Project not found",
            details_value(NotFoundDetails {
                id: id.into(),
                suggestions,
            }),
        )
        .with_hint("Run 'deckhand project list' to see available projects")
    }

    pub fn template_missing_key(placeholder: impl Into<String>, source: Option<String>) -> Self {
        let placeholder = placeholder.into();
        Self::new(
            ErrorCode::TemplateMissingKey,
            format!("Template placeholder '{}' is not in the context", placeholder),
            details_value(TemplateMissingKeyDetails {
                placeholder,
                source,
            }),
        )
    }

    pub fn scm_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ScmCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TransferFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn remote_command_failed(details: RemoteCommandFailedDetails) -> Self {
        Self::new(
            ErrorCode::RemoteCommandFailed,
            "Remote command failed",
            details_value(details),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            details_value(InternalErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            details_value(InternalErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        let error: String = error.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
