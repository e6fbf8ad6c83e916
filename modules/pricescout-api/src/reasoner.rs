// The caller's X-API-KEY is the reasoning-service credential, so a reasoner
// is built per request.

use ai_client::Gemini;
use pricescout_scout::Reasoner;

pub trait ReasonerProvider: Send + Sync {
    fn for_key(&self, api_key: &str) -> Box<dyn Reasoner>;
}

pub struct GeminiReasoners {
    model: String,
    base_url: Option<String>,
}

impl GeminiReasoners {
    pub fn new(model: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            base_url,
        }
    }
}

impl ReasonerProvider for GeminiReasoners {
    fn for_key(&self, api_key: &str) -> Box<dyn Reasoner> {
        let gemini = Gemini::new(api_key, self.model.as_str());
        match &self.base_url {
            Some(url) => Box::new(gemini.with_base_url(url.as_str())),
            None => Box::new(gemini),
        }
    }
}
