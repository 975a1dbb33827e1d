use log::debug;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    config::HttpConfig,
    domain::catalog::{Catalog, Library},
    game::Intent,
    host::GameHost,
    http::error::ApiError,
};

pub struct HttpServer {
    host: GameHost,
    library: Library,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(host: GameHost, library: Library, config: HttpConfig) -> Self {
        Self {
            host,
            library,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/state) => {
                Self::respond(self.host.snapshot().map_err(ApiError::from))
            },
            (GET) (/playlists) => {
                Response::json(&self.playlists())
            },
            (POST) (/round) => {
                self.apply(Intent::ResetRound)
            },
            (POST) (/round/{catalog: String}) => {
                self.apply(Intent::StartRound(catalog))
            },
            (POST) (/playlist/{catalog: String}) => {
                self.apply(Intent::SelectCatalog(catalog))
            },
            (POST) (/playback) => {
                self.apply(Intent::TogglePlayback)
            },
            (POST) (/reveal) => {
                self.apply(Intent::RevealNext)
            },
            (POST) (/seek) => {
                match Self::seek_param(request) {
                    Ok(position) => self.apply(Intent::Seek(position)),
                    Err(e) => e.into_response(),
                }
            },
            (POST) (/guess) => {
                match Self::required_param(request, "title") {
                    Ok(title) => self.apply(Intent::SubmitGuess(title)),
                    Err(e) => e.into_response(),
                }
            },
            _ => self.handle_guess_text(request)
        );

        debug!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        debug!("{} {}", request.method(), request.raw_url());
    }

    /// `POST /guess-text?q=...`, routed by hand since the path has a dash
    fn handle_guess_text(&self, request: &Request) -> Response {
        if request.method() != "POST" || request.url() != "/guess-text" {
            return Response::empty_404();
        }
        match Self::required_param(request, "q") {
            Ok(text) => self.apply(Intent::SetGuessText(text)),
            Err(e) => e.into_response(),
        }
    }

    fn apply(&self, intent: Intent) -> Response {
        Self::respond(self.host.apply(intent).map_err(ApiError::from))
    }

    fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
        match result {
            Ok(body) => Response::json(&body),
            Err(e) => e.into_response(),
        }
    }

    fn required_param(request: &Request, name: &str) -> Result<String, ApiError> {
        request
            .get_param(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing query parameter '{name}'")))
    }

    /// Seek target in seconds, fractions allowed
    fn seek_param(request: &Request) -> Result<Duration, ApiError> {
        let raw = Self::required_param(request, "t")?;
        let invalid = || ApiError::BadRequest(format!("invalid seek position '{raw}'"));

        let secs: f64 = raw.parse().map_err(|_| invalid())?;
        Duration::try_from_secs_f64(secs).map_err(|_| invalid())
    }

    fn playlists(&self) -> Vec<PlaylistResponse> {
        self.library
            .catalogs()
            .iter()
            .map(PlaylistResponse::from_domain)
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct PlaylistResponse {
    id: String,
    name: String,
    songs: Vec<String>,
}

impl PlaylistResponse {
    fn from_domain(catalog: &Catalog) -> Self {
        Self {
            id: catalog.id.clone(),
            name: catalog.name.clone(),
            songs: catalog.titles().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
