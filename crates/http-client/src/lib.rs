use anyhow::{Context, Result};
use bon::bon;
use log::debug;
use reqwest::Client as HttpClient;
use reqwest::{Proxy, Response};
use serde::Serialize;

/// Shared HTTP client. Timeouts are enforced by callers, per request.
#[derive(Clone)]
pub struct Client {
    client: HttpClient,
}

#[bon]
impl Client {
    #[builder]
    pub fn new(proxy: Option<String>) -> Result<Client> {
        let mut client_builder = HttpClient::builder().user_agent(app::USER_AGENT);
        if let Some(url) = proxy {
            let proxy = Proxy::all(&url).with_context(|| format!("set proxy to {url}"))?;
            client_builder = client_builder.proxy(proxy);
        }
        let client = client_builder
            .build()
            .with_context(|| "build reqwest client")?;
        let client = Client { client };

        Ok(client)
    }

    /// POSTs `body` as `application/json`.
    pub async fn post_json<T>(&self, url: &str, body: &T) -> reqwest::Result<Response>
    where
        T: Serialize + ?Sized,
    {
        debug!("POST {url}");
        self.client.post(url).json(body).send().await
    }
}
