use async_trait::async_trait;
use reqwest::{Request, Response};

/// The one network capability the quote fetcher needs.
#[async_trait]
pub trait HttpClient {
    async fn execute(&self, request: Request) -> Result<Response, reqwest::Error>;
}

#[async_trait]
impl HttpClient for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        reqwest::Client::execute(self, request).await
    }
}
