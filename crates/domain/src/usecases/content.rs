//! AI content generation use case
//!
//! Builds prompts for each kind of content and runs them through a
//! [`ContentGenerator`] with fixed sampling parameters.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::model::{
    BestTime, CaptionRequest, CompletionRequest, HashtagsRequest, IdeasRequest, ReplyRequest,
    Sentiment, VariationsRequest,
};
use crate::ports::{ClientRepository, ContentGenerator, GenerateError};
use crate::usecases::ServiceError;

/// Caption, hashtag, reply and idea generation
#[derive(Clone)]
pub struct ContentService {
    generator: Arc<dyn ContentGenerator>,
    clients: Arc<dyn ClientRepository>,
}

impl ContentService {
    pub fn new(generator: Arc<dyn ContentGenerator>, clients: Arc<dyn ClientRepository>) -> Self {
        Self { generator, clients }
    }

    pub fn provider(&self) -> &'static str {
        self.generator.provider()
    }

    pub async fn caption(&self, request: CaptionRequest) -> Result<String, ServiceError> {
        let voice = self
            .brand_voice(request.client_id.as_deref(), "professional")
            .await?;
        let text = self
            .run(caption_prompt(&request, &voice), 0.8, 200, false)
            .await?;
        Ok(text.trim().to_string())
    }

    pub async fn variations(&self, request: VariationsRequest) -> Result<Vec<String>, ServiceError> {
        let voice = self
            .brand_voice(request.client_id.as_deref(), "professional")
            .await?;
        let text = self
            .run(variations_prompt(&request, &voice), 0.9, 300, true)
            .await?;
        Ok(parse_list(&text, "variations")?)
    }

    pub async fn hashtags(&self, request: HashtagsRequest) -> Result<Vec<String>, ServiceError> {
        let text = self.run(hashtags_prompt(&request), 0.7, 150, false).await?;
        Ok(split_hashtags(&text))
    }

    pub async fn reply(&self, request: ReplyRequest) -> Result<String, ServiceError> {
        let voice = self
            .brand_voice(request.client_id.as_deref(), "professional and friendly")
            .await?;
        let text = self
            .run(reply_prompt(&request, &voice), 0.7, 100, false)
            .await?;
        Ok(text.trim().to_string())
    }

    pub async fn ideas(&self, request: IdeasRequest) -> Result<Vec<String>, ServiceError> {
        let voice = self
            .brand_voice(request.client_id.as_deref(), "engaging")
            .await?;
        let text = self
            .run(ideas_prompt(&request, &voice), 0.9, 400, true)
            .await?;
        Ok(parse_list(&text, "ideas")?)
    }

    /// Posting-time recommendations for a known client
    pub async fn best_times(&self, client_id: &str) -> Result<Vec<BestTime>, ServiceError> {
        let client = self
            .clients
            .get(client_id)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;
        let industry = client.industry.as_deref().unwrap_or("general");
        let text = self.run(best_times_prompt(industry), 0.7, 400, true).await?;

        #[derive(serde::Deserialize)]
        struct Recommendations {
            #[serde(default)]
            recommendations: Vec<BestTime>,
        }
        let parsed: Recommendations = parse_json(&text)?;
        Ok(parsed.recommendations)
    }

    /// Short on-brand answer to an incoming comment
    pub async fn auto_reply(&self, comment: &str, brand_voice: &str) -> Result<String, ServiceError> {
        let text = self
            .run(auto_reply_prompt(comment, brand_voice), 0.7, 80, false)
            .await?;
        Ok(text.trim().to_string())
    }

    async fn brand_voice(
        &self,
        client_id: Option<&str>,
        fallback: &str,
    ) -> Result<String, ServiceError> {
        let Some(id) = client_id else {
            return Ok(fallback.to_string());
        };
        Ok(self
            .clients
            .get(id)
            .await?
            .map(|c| c.brand_voice)
            .unwrap_or_else(|| fallback.to_string()))
    }

    async fn run(
        &self,
        prompt: String,
        temperature: f64,
        max_tokens: u32,
        json_output: bool,
    ) -> Result<String, GenerateError> {
        let result = self
            .generator
            .complete(CompletionRequest {
                prompt,
                temperature,
                max_tokens,
                json_output,
            })
            .await;
        if let Err(e) = &result {
            tracing::warn!(provider = self.generator.provider(), error = %e, "Generation failed");
        }
        result
    }
}

pub fn caption_prompt(request: &CaptionRequest, brand_voice: &str) -> String {
    let emojis = if request.include_emojis {
        "- Include relevant emojis"
    } else {
        "- No emojis"
    };
    let hashtags = if request.include_hashtags {
        "- Include 3-5 relevant hashtags at the end"
    } else {
        "- No hashtags"
    };
    format!(
        "You are a social media content creator.\n\n\
         Generate a {length} length social media caption about: {topic}\n\n\
         Requirements:\n\
         - Tone: {tone}\n\
         - Brand voice: {brand_voice}\n\
         {emojis}\n\
         {hashtags}\n\
         - Make it attention-grabbing and shareable\n\
         - Keep it authentic and relatable\n\n\
         Return only the caption, nothing else.",
        length = request.length.as_deref().unwrap_or("medium"),
        topic = request.topic.as_deref().unwrap_or("an exciting update"),
        tone = request.tone.as_deref().unwrap_or("engaging"),
    )
}

pub fn variations_prompt(request: &VariationsRequest, brand_voice: &str) -> String {
    format!(
        "Rewrite this social media caption {count} different ways, keeping the same message but varying the style:\n\n\
         Original: \"{caption}\"\n\n\
         Brand voice: {brand_voice}\n\n\
         Return as JSON: {{\"variations\": [\"variation1\", \"variation2\", \"variation3\"]}}",
        count = request.count.unwrap_or(3),
        caption = request.caption.as_deref().unwrap_or_default(),
    )
}

pub fn hashtags_prompt(request: &HashtagsRequest) -> String {
    format!(
        "Generate {count} relevant hashtags for this social media post:\n\n\
         \"{content}\"\n\n\
         Industry: {industry}\n\n\
         Requirements:\n\
         - Mix of popular and niche hashtags\n\
         - Relevant to the content\n\
         - Include industry-specific tags\n\
         - Return as space-separated list\n\n\
         Format: #hashtag1 #hashtag2 #hashtag3",
        count = request.count.unwrap_or(10),
        content = request.content.as_deref().unwrap_or_default(),
        industry = request.industry.as_deref().unwrap_or("general"),
    )
}

pub fn reply_prompt(request: &ReplyRequest, brand_voice: &str) -> String {
    let context = match request.sentiment {
        Sentiment::Negative => {
            "This is a negative comment, respond with empathy and try to resolve their concern."
        }
        Sentiment::Positive => {
            "This is a positive comment, respond with gratitude and enthusiasm."
        }
        Sentiment::Neutral => "This is a neutral comment, respond helpfully and engage them.",
    };
    format!(
        "You are a social media manager responding to a comment.\n\n\
         Original post: \"{post}\"\n\
         Comment: \"{comment}\"\n\n\
         {context}\n\n\
         Brand voice: {brand_voice}\n\n\
         Generate a helpful, genuine reply (max 50 words). Be conversational, not corporate.",
        post = request.post_content.as_deref().unwrap_or_default(),
        comment = request.comment.as_deref().unwrap_or_default(),
    )
}

pub fn ideas_prompt(request: &IdeasRequest, brand_voice: &str) -> String {
    format!(
        "Generate {count} creative social media post ideas for:\n\n\
         Industry: {industry}\n\
         Target audience: {audience}\n\
         Brand voice: {brand_voice}\n\n\
         Make them diverse (questions, tips, behind-the-scenes, testimonials, etc.)\n\n\
         Return as JSON: {{\"ideas\": [\"idea1\", \"idea2\", ...]}}",
        count = request.count.unwrap_or(10),
        industry = request.industry.as_deref().unwrap_or("general"),
        audience = request.audience.as_deref().unwrap_or("general audience"),
    )
}

pub fn best_times_prompt(industry: &str) -> String {
    format!(
        "Based on industry best practices for {industry}, suggest the 3 best times to post on social media for maximum engagement.\n\n\
         Return as JSON: {{\n  \"recommendations\": [\n    \
         {{\"day\": \"Monday\", \"time\": \"9:00 AM\", \"reason\": \"...\"}},\n    \
         {{\"day\": \"Wednesday\", \"time\": \"12:00 PM\", \"reason\": \"...\"}},\n    \
         {{\"day\": \"Friday\", \"time\": \"5:00 PM\", \"reason\": \"...\"}}\n  ]\n}}"
    )
}

pub fn auto_reply_prompt(comment: &str, brand_voice: &str) -> String {
    format!(
        "Reply to this social media comment professionally:\n\n\
         Comment: \"{comment}\"\n\
         Brand voice: {brand_voice}\n\n\
         Keep it brief (max 30 words), friendly, and on-brand."
    )
}

/// Words of the response that start with `#`
pub fn split_hashtags(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.starts_with('#') && w.len() > 1)
        .map(str::to_string)
        .collect()
}

/// A list under `key` in a JSON object, or a bare JSON array
fn parse_list(text: &str, key: &str) -> Result<Vec<String>, GenerateError> {
    let value: serde_json::Value = parse_json(text)?;
    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map.remove(key).unwrap_or_default(),
        _ => serde_json::Value::Null,
    };
    match list {
        serde_json::Value::Null => Ok(vec![]),
        other => serde_json::from_value(other)
            .map_err(|e| GenerateError::InvalidFormat(format!("{}: {}", key, e))),
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, GenerateError> {
    serde_json::from_str(extract_json(text))
        .map_err(|e| GenerateError::InvalidFormat(format!("Failed to parse JSON: {}", e)))
}

/// Extract JSON from response (handles markdown code blocks)
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return trimmed[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        if let Some(end) = trimmed[start + 3..].find("```") {
            let content = trimmed[start + 3..start + 3 + end].trim();
            if let Some(newline) = content.find('\n') {
                let first_line = &content[..newline];
                if !first_line.starts_with('{') && !first_line.starts_with('[') {
                    return content[newline + 1..].trim();
                }
            }
            return content;
        }
    }

    trimmed
}
