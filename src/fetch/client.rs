use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam over the HTTP transport used to download spreadsheet exports.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
