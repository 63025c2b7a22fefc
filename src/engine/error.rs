use thiserror::Error;

/// Everything that can end a turn early.
#[derive(Debug, Error)]
pub enum GameError {
    /// Non-2xx answer, or the request never got one (`status` is `None`).
    #[error("{}", transport_message(.status, .body))]
    Transport { status: Option<u16>, body: String },

    #[error("Unexpected completion payload: {0}")]
    MalformedResponse(String),

    #[error("The model did not produce a valid scene, even after a reformat request")]
    SceneFormat,

    #[error("Session is not initialized")]
    NotInitialized,

    #[error("A turn is already in progress")]
    ConcurrentTurn,

    #[error("Storage error: {0}")]
    Storage(String),
}

fn transport_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("HTTP {code}: {body}"),
        None => format!("Request failed: {body}"),
    }
}

impl From<reqwest::Error> for GameError {
    fn from(err: reqwest::Error) -> Self {
        GameError::Transport {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for GameError {
    fn from(err: anyhow::Error) -> Self {
        GameError::Storage(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_includes_status() {
        let err = GameError::Transport { status: Some(401), body: "bad key".into() };
        assert_eq!(err.to_string(), "HTTP 401: bad key");

        let err = GameError::Transport { status: None, body: "timeout".into() };
        assert_eq!(err.to_string(), "Request failed: timeout");
    }
}
