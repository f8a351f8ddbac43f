use std::fmt;
use std::str::FromStr;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::ranking::CandidateList;
use crate::updater::RefreshStatus;

/// First field of the `/ping` body; the second is the daemon's pid.
pub const PING_MESSAGE: &str = "instance-selector";

pub const UPDATE_STARTED: &str = "Updating list of instances. This may take a while.";
pub const UPDATE_IN_PROGRESS: &str = "Update already in progress";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub candidates: CandidateList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    pub name: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub error: String,
}

impl CommandResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            error: String::new(),
        }
    }

    fn err(error: impl fmt::Display) -> Self {
        Self {
            body: String::new(),
            error: error.to_string(),
        }
    }
}

/// Commands accepted on `/cmd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Update,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid command: \"{0}\"")]
pub struct InvalidCommand(pub String);

impl FromStr for Command {
    type Err = InvalidCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Command::Update),
            "stats" => Ok(Command::Stats),
            other => Err(InvalidCommand(other.to_string())),
        }
    }
}

pub async fn ping() -> String {
    format!("{};{}", PING_MESSAGE, std::process::id())
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        candidates: state.routing.snapshot(),
    })
}

pub async fn run_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let command = match request.name.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!(name = %request.name, "Rejected unknown command");
            return Json(CommandResponse::err(e));
        }
    };

    tracing::info!(command = ?command, "Control command received");
    let response = match command {
        Command::Update => match state.refresh.force_refresh() {
            RefreshStatus::Started => CommandResponse::ok(UPDATE_STARTED),
            RefreshStatus::AlreadyInProgress => CommandResponse::ok(UPDATE_IN_PROGRESS),
            RefreshStatus::Stopped => CommandResponse::err("Refresh scheduler is not running"),
        },
        Command::Stats => {
            let stats = StatsResponse {
                candidates: state.routing.snapshot(),
            };
            match serde_json::to_string(&stats) {
                Ok(body) => CommandResponse::ok(body),
                Err(e) => CommandResponse::err(e),
            }
        }
    };
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!("update".parse::<Command>(), Ok(Command::Update));
        assert_eq!("stats".parse::<Command>(), Ok(Command::Stats));
        let err = "Update".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid command: \"Update\"");
    }

    #[tokio::test]
    async fn test_ping_body() {
        let body = ping().await;
        let (name, pid) = body.split_once(';').unwrap();
        assert_eq!(name, PING_MESSAGE);
        assert_eq!(pid.parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn test_command_response_fields() {
        let json = serde_json::to_value(CommandResponse::err(InvalidCommand("x".into()))).unwrap();
        assert_eq!(json["body"], "");
        assert_eq!(json["error"], "Invalid command: \"x\"");
    }
}
