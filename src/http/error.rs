use rouille::Response;

use crate::{game::error::GameError, host::HostError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<HostError> for ApiError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Game(GameError::UnknownPlaylist(id)) => {
                ApiError::NotFound(format!("playlist {} not found", id))
            }

            HostError::Game(GameError::EmptyCatalog(id)) => {
                ApiError::BadRequest(format!("playlist {} has no songs", id))
            }

            HostError::Stopped => ApiError::Internal("internal server error".into()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                Response::text(msg).with_status_code(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_errors_map_to_status_codes() {
        let not_found = ApiError::from(HostError::Game(GameError::UnknownPlaylist("x".into())));
        assert_eq!(not_found.status_code(), 404);

        let empty = ApiError::from(HostError::Game(GameError::EmptyCatalog("x".into())));
        assert_eq!(empty.status_code(), 400);

        assert_eq!(ApiError::from(HostError::Stopped).status_code(), 500);
    }
}
