use crate::domain::model::Session;
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn login_path(&self) -> &str;
}

/// Maps a bearer token or session cookie value to the session it names.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<Session>;
}
