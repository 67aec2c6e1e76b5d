use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::ACCEPT,
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::history::HistoryEntry;
use crate::domain::ticket::{Ticket, TicketId};
use crate::domain::update::{SaveRequest, TicketUpdate};
use crate::domain::user::Technician;
use crate::error::{AppError, AppResult};
use crate::services::TicketBackend;

pub struct HttpBackend {
    http: Client,
    base_url: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> AppResult<String> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("backend base URL not configured".to_string()))?;
        Ok(format!("{}{path}", base_url.trim_end_matches('/')))
    }

    fn save_form(request: SaveRequest) -> AppResult<Form> {
        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }
        for file in request.files {
            let mut part = Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(content_type) = file.content_type.as_deref() {
                part = part.mime_str(content_type).map_err(|err| {
                    AppError::Draft(format!("invalid content type {content_type}: {err}"))
                })?;
            }
            form = form.part("files", part);
        }
        Ok(form)
    }

    async fn send(request: reqwest::RequestBuilder) -> AppResult<Response> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to call backend: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Decode(err.to_string()))
    }
}

#[async_trait]
impl TicketBackend for HttpBackend {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        let url = self.endpoint("/api/tickets")?;
        let response = Self::send(self.http.get(url)).await?;
        let payload: TicketsResponse = Self::read_json(response).await?;
        payload.status.ensure_success()?;
        Ok(payload.tickets)
    }

    async fn save_update(&self, request: SaveRequest) -> AppResult<()> {
        let url = self.endpoint("/api/tickets/save_update")?;
        debug!(
            ticket = %request.ticket_id,
            files = request.files.len(),
            "sending save_update"
        );
        let form = Self::save_form(request)?;
        let response = Self::send(self.http.post(url).multipart(form)).await?;
        let payload: StatusResponse = Self::read_json(response).await?;
        payload.ensure_success()
    }

    async fn update_ticket(&self, update: TicketUpdate) -> AppResult<()> {
        let url = self.endpoint("/api/tickets/update")?;
        Self::send(self.http.put(url).json(&update)).await?;
        Ok(())
    }

    async fn list_photos(&self, ticket_id: &TicketId) -> AppResult<Vec<String>> {
        let url = self.endpoint(&format!("/api/photos/{ticket_id}"))?;
        let response = Self::send(self.http.get(url)).await?;
        let payload: PhotosResponse = Self::read_json(response).await?;
        payload.status.ensure_success()?;
        Ok(payload.into_urls())
    }

    async fn list_technicians(&self) -> AppResult<Vec<Technician>> {
        let url = self.endpoint("/api/users")?;
        let response = Self::send(self.http.get(url).query(&[("role", "technician")])).await?;
        let payload: UsersResponse = Self::read_json(response).await?;
        Ok(payload.users)
    }

    async fn ticket_history(&self, query: Option<&str>) -> AppResult<Vec<HistoryEntry>> {
        let url = self.endpoint("/api/tickets/history")?;
        let mut request = self.http.get(url);
        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            request = request.query(&[("q", query)]);
        }
        let response = Self::send(request).await?;
        let payload: HistoryResponse = Self::read_json(response).await?;
        payload.status.ensure_success()?;
        Ok(payload.entries)
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl StatusResponse {
    fn ensure_success(&self) -> AppResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::Rejected(
                self.message
                    .clone()
                    .unwrap_or_else(|| "success flag not set".to_string()),
            ))
        }
    }
}

#[derive(Deserialize)]
struct TicketsResponse {
    #[serde(flatten)]
    status: StatusResponse,
    #[serde(default)]
    tickets: Vec<Ticket>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhotoRef {
    Url(String),
    Object { url: String },
}

#[derive(Deserialize)]
struct PhotosResponse {
    #[serde(flatten)]
    status: StatusResponse,
    #[serde(default)]
    pictures: Option<Vec<PhotoRef>>,
    #[serde(default)]
    photos: Option<Vec<PhotoRef>>,
}

impl PhotosResponse {
    fn into_urls(self) -> Vec<String> {
        self.pictures
            .or(self.photos)
            .unwrap_or_default()
            .into_iter()
            .map(|photo| match photo {
                PhotoRef::Url(url) | PhotoRef::Object { url } => url,
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<Technician>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    status: StatusResponse,
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}
