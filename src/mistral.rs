use crate::config::LlmConfig;
use crate::error::{AgentError, Result};
use crate::types::ConversationTurn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationTurn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct MistralClient {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl MistralClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    // One blocking completion over the full turn sequence. Transport and
    // non-2xx outcomes surface as errors the loop reports and survives.
    pub fn chat(&self, messages: &[ConversationTurn]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AgentError::Api {
                status: status.as_u16(),
                message: "response carried no choices".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn request_serializes_with_lowercase_roles() {
        let messages = vec![
            ConversationTurn::new(Role::System, "be brief"),
            ConversationTurn::new(Role::User, "hello"),
        ];
        let body = ChatRequest {
            model: "mistral-large-latest",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 4000,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["model"], "mistral-large-latest");
    }

    #[test]
    fn response_parsing_takes_the_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"df -h"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "df -h");
    }
}
