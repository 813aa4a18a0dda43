pub mod shortener;

use crate::error::WorkerError;
use shortener::UrlShortener;

/// Component G — Renderer (§4.G). Template parse errors are caught by the
/// Template store validator at write time (see `Renderer::validate`), so a
/// render-time error here is unexpected and treated as fatal for the one
/// message, logged by the caller.
pub struct Renderer {
    shortener: UrlShortener,
}

impl Renderer {
    pub fn new(shortener: UrlShortener) -> Self {
        Renderer { shortener }
    }

    /// Validates that `body` parses under the renderer's grammar. Called by
    /// the Template store on create/update (§3's invariant that `body` must
    /// parse at write time).
    pub fn validate(body: &str) -> Result<(), WorkerError> {
        let mut env = minijinja::Environment::new();
        env.add_template("validate", body)?;
        Ok(())
    }

    /// Renders `body` against `context`, first replacing a string `url`
    /// field (if present) with its shortened form. Unknown variables render
    /// as empty per Jinja defaults (minijinja's `Undefined` default).
    pub async fn render(
        &self,
        body: &str,
        mut context: serde_json::Value,
    ) -> Result<String, WorkerError> {
        if let Some(url) = context.get("url").and_then(|v| v.as_str()).map(str::to_string) {
            let shortened = self.shortener.shorten(&url).await;
            if let Some(map) = context.as_object_mut() {
                map.insert("url".to_string(), serde_json::Value::String(shortened));
            }
        }

        let mut env = minijinja::Environment::new();
        env.add_template("message", body)?;
        let template = env.get_template("message")?;
        let rendered = template.render(context)?;
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShortenerConfig;

    fn renderer() -> Renderer {
        Renderer::new(UrlShortener::new(&ShortenerConfig {
            provider: None,
            api_key: None,
        }))
    }

    #[tokio::test]
    async fn renders_known_variables() {
        let renderer = renderer();
        let out = renderer
            .render("Hello {{ first_name }}!", serde_json::json!({"first_name": "Ada"}))
            .await
            .unwrap();
        assert_eq!(out, "Hello Ada!");
    }

    #[tokio::test]
    async fn unknown_variables_render_empty() {
        let renderer = renderer();
        let out = renderer
            .render("Hello {{ missing }}!", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(out, "Hello !");
    }

    #[test]
    fn validate_rejects_malformed_template() {
        assert!(Renderer::validate("{{ unterminated").is_err());
        assert!(Renderer::validate("{{ name }}").is_ok());
    }
}
