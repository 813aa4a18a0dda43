//! URL-shortening hook applied to the render context's `url` field before
//! rendering (§4.G). Grounded on
//! `original_source/src/services/url_shorter.py::URLShortener`: any failure
//! — bad URL, provider error, network error — falls back to the original
//! URL rather than failing the render.

use crate::config::ShortenerConfig;

#[derive(Clone)]
pub struct UrlShortener {
    provider: Option<String>,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl UrlShortener {
    pub fn new(config: &ShortenerConfig) -> Self {
        UrlShortener {
            provider: config.provider.clone(),
            api_key: config.api_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Shorten `url`, falling back to the original on any failure: invalid
    /// URL, no provider configured, or a failing request.
    pub async fn shorten(&self, url: &str) -> String {
        if url::Url::parse(url).is_err() {
            tracing::warn!("shortener: not a valid URL, keeping original: {}", url);
            return url.to_string();
        }

        let Some(provider) = &self.provider else {
            return url.to_string();
        };

        match self.call_provider(provider, url).await {
            Ok(short) => short,
            Err(e) => {
                tracing::warn!("shortener: provider {} failed, keeping original url: {}", provider, e);
                url.to_string()
            }
        }
    }

    async fn call_provider(&self, provider: &str, url: &str) -> Result<String, reqwest::Error> {
        let endpoint = format!("https://{provider}/api/shorten");
        let mut request = self.http.post(endpoint).query(&[("url", url)]);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?.error_for_status()?;
        let body: ShortenResponse = response.json().await?;
        Ok(body.short_url)
    }
}

#[derive(serde::Deserialize)]
struct ShortenResponse {
    short_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_returned_unchanged() {
        let shortener = UrlShortener::new(&ShortenerConfig {
            provider: None,
            api_key: None,
        });
        assert_eq!(shortener.shorten("not a url").await, "not a url");
    }

    #[tokio::test]
    async fn no_provider_configured_is_passthrough() {
        let shortener = UrlShortener::new(&ShortenerConfig {
            provider: None,
            api_key: None,
        });
        let url = "https://example.com/watch?v=1";
        assert_eq!(shortener.shorten(url).await, url);
    }
}
