use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::services::evaluation::{self, NormalizedEvaluation};

#[derive(Debug, Clone)]
pub(crate) struct AiFeedbackService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct QuestionPrompt {
    pub(crate) subject: String,
    pub(crate) difficulty: String,
    pub(crate) keywords: Vec<String>,
    pub(crate) regenerate: bool,
    pub(crate) previous_question: Option<String>,
    pub(crate) attempt: u32,
}

impl AiFeedbackService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(timeout)
            .build()
            .context("Failed to build AI HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().api_key.clone(),
            base_url: settings.ai().base_url.trim_end_matches('/').to_string(),
            model: settings.ai().model.clone(),
            max_tokens: settings.ai().max_tokens,
            max_retries: settings.ai().max_retries,
        })
    }

    /// Lightweight availability probe. The interactive experience is gated on
    /// this; failures are logged and reported as unavailable, never raised.
    pub(crate) async fn ping(&self) -> bool {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": "Hello"}],
            "max_tokens": 5
        });

        let url = format!("{}/chat/completions", self.base_url);
        match self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "AI availability check failed");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "AI availability check failed");
                false
            }
        }
    }

    /// Evaluate a student answer. Every failure mode (transport, provider,
    /// malformed output) is absorbed into the normalizer's fallback shape;
    /// callers always receive the full contract.
    pub(crate) async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
    ) -> NormalizedEvaluation {
        let prompt = format!(
            "Evaluate this student answer to the question:\n\n\
             Question: {question}\n\n\
             Student's answer: {answer}\n\n\
             Evaluate the answer based on its relevance, accuracy, depth, and structure.\n\n\
             Return your evaluation in this JSON format (nothing else):\n\
             {{\n\
                 \"score\": 0.X,\n\
                 \"feedback\": \"Brief overall assessment in English\",\n\
                 \"suggestions\": [\n\
                     \"First improvement suggestion in English\",\n\
                     \"Second improvement suggestion in English\",\n\
                     \"Third improvement suggestion in English\"\n\
                 ]\n\
             }}\n\n\
             Keep your suggestions straightforward, action-oriented, and in proper English only.\n\
             NEVER include any comments, instructions, or non-English text in your suggestions."
        );

        let content = match self.chat(&prompt, 0.1, self.max_tokens).await {
            Ok(content) => content,
            Err(err) => {
                tracing::error!(error = %err, "AI evaluation request failed; using fallback");
                metrics::counter!("ai_evaluations_total", "source" => "unreachable").increment(1);
                return NormalizedEvaluation {
                    evaluation: evaluation::fallback_evaluation(),
                    source: evaluation::EvaluationSource::Fallback,
                };
            }
        };

        let normalized = evaluation::normalize(&content);
        let source_label = match normalized.source {
            evaluation::EvaluationSource::Structured => "structured",
            evaluation::EvaluationSource::Suggestions => "suggestions",
            evaluation::EvaluationSource::Fallback => "fallback",
        };
        metrics::counter!("ai_evaluations_total", "source" => source_label).increment(1);

        if normalized.source == evaluation::EvaluationSource::Fallback {
            tracing::warn!(
                response_prefix = %content.chars().take(80).collect::<String>(),
                "AI evaluation response had no usable shape"
            );
        }

        normalized
    }

    /// Authoring aid: generate a discussion question. Unlike evaluation this
    /// surfaces errors; the teacher can simply retry.
    pub(crate) async fn generate_question(&self, prompt: &QuestionPrompt) -> Result<String> {
        let keywords = if prompt.keywords.is_empty() {
            "no specific keywords".to_string()
        } else {
            prompt.keywords.join(", ")
        };

        let text = if prompt.regenerate {
            let previous = prompt.previous_question.as_deref().unwrap_or("");
            let emphasis = if prompt.attempt > 1 {
                "COMPLETELY DIFFERENT from your previous one. Use a different approach, perspective, or angle on the subject."
            } else {
                "different from your previous one."
            };
            format!(
                "Generate a NEW thought-provoking discussion question about {} at {} difficulty level.\n\
                 The question should incorporate these keywords or concepts if possible: {}.\n\n\
                 IMPORTANT: Your previous generated question was:\n\"{}\"\n\n\
                 Please ensure this new question is {}\n\
                 The question should still be clear, open-ended, and designed to encourage critical thinking.\n\n\
                 Just respond with the question text only, without any additional explanations or formatting.",
                prompt.subject, prompt.difficulty, keywords, previous, emphasis
            )
        } else {
            format!(
                "Generate a thought-provoking discussion question about {} at {} difficulty level.\n\
                 The question should incorporate these keywords or concepts if possible: {}.\n\
                 The question should be clear, open-ended, and designed to encourage critical thinking and classroom discussion.\n\
                 Just respond with the question text only, without any additional explanations or formatting.",
                prompt.subject, prompt.difficulty, keywords
            )
        };

        let temperature = if prompt.regenerate { 0.9 } else { 0.7 };
        let question = self.chat(&text, temperature, 500).await?;
        Ok(question.trim().to_string())
    }

    async fn chat(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
            "max_tokens": max_tokens
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=self.max_retries {
            let response =
                self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    body = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        last_error = None;
                        break;
                    }
                    last_error = Some(anyhow::anyhow!("AI provider error: {body}"));
                }
                Err(err) => {
                    last_error = Some(anyhow::anyhow!(err).context("Failed to call AI provider"));
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt))).await;
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .context("Missing AI response content")?;

        Ok(content.to_string())
    }
}
