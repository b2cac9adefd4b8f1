// Language service client: the five remote operations over the Cloud Natural Language REST API.
use reqwest::blocking::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{ClientConfig, Credentials};
use crate::error::CallError;
use crate::nlp::raw::{
    CategoryScore, EntityMention, EntitySentimentPair, EntityType, ModerationScore,
    RawCapabilityResult, SentenceSentiment, SentimentPayload, SentimentScore,
};

#[cfg_attr(test, mockall::automock)]
pub trait LanguageService {
    fn analyze_sentiment(&self, text: &str) -> Result<RawCapabilityResult, CallError>;
    fn analyze_entities(&self, text: &str) -> Result<RawCapabilityResult, CallError>;
    fn analyze_entity_sentiment(&self, text: &str) -> Result<RawCapabilityResult, CallError>;
    fn classify_text(&self, text: &str) -> Result<RawCapabilityResult, CallError>;
    fn moderate_text(&self, text: &str) -> Result<RawCapabilityResult, CallError>;
}

pub struct HttpLanguageService {
    client: Client,
    config: ClientConfig,
}

impl HttpLanguageService {
    pub fn new(config: ClientConfig) -> Result<Self, CallError> {
        let client = Client::builder()
            .user_agent(concat!("textlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CallError::Transport(format!("HTTP client build failed: {}", e)))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        text: &str,
        with_encoding: bool,
    ) -> Result<T, CallError> {
        let url = format!("{}/documents:{}", self.config.endpoint, method);
        let body = DocumentRequest {
            document: Document {
                kind: "PLAIN_TEXT",
                content: text,
            },
            encoding_type: with_encoding.then_some("UTF8"),
        };

        let request = self.client.post(&url).json(&body);
        let request = match &self.config.credentials {
            Credentials::ApiKey(key) => request.query(&[("key", key.expose_secret())]),
            Credentials::AccessToken(token) => request.bearer_auth(token.expose_secret()),
        };

        debug!("POST {}", url);
        let resp = request
            .send()
            .map_err(|e| CallError::Transport(format!("{} request failed: {}", method, e)))?;
        let status = resp.status();
        let payload = resp
            .text()
            .map_err(|e| CallError::Transport(format!("{} response unreadable: {}", method, e)))?;
        trace!("{} answered {}: {}", method, status, payload);

        if !status.is_success() {
            return Err(classify_failure(status, &payload));
        }
        serde_json::from_str(&payload)
            .map_err(|e| CallError::Transport(format!("{} response undecodable: {}", method, e)))
    }
}

impl LanguageService for HttpLanguageService {
    fn analyze_sentiment(&self, text: &str) -> Result<RawCapabilityResult, CallError> {
        let resp: AnalyzeSentimentResponse = self.call("analyzeSentiment", text, true)?;
        Ok(RawCapabilityResult::Sentiment(resp.into()))
    }

    fn analyze_entities(&self, text: &str) -> Result<RawCapabilityResult, CallError> {
        let resp: AnalyzeEntitiesResponse = self.call("analyzeEntities", text, true)?;
        Ok(RawCapabilityResult::Entities(
            resp.entities
                .into_iter()
                .map(|e| EntityMention {
                    entity_type: EntityType::from_api_name(&e.entity_type),
                    name: e.name,
                })
                .collect(),
        ))
    }

    fn analyze_entity_sentiment(&self, text: &str) -> Result<RawCapabilityResult, CallError> {
        let resp: AnalyzeEntitiesResponse = self.call("analyzeEntitySentiment", text, true)?;
        Ok(RawCapabilityResult::EntitySentiment(
            resp.entities
                .into_iter()
                .map(|e| EntitySentimentPair {
                    entity_type: EntityType::from_api_name(&e.entity_type),
                    score: e.sentiment.map(|s| s.score).unwrap_or_default(),
                    name: e.name,
                })
                .collect(),
        ))
    }

    fn classify_text(&self, text: &str) -> Result<RawCapabilityResult, CallError> {
        let resp: ClassifyTextResponse = self.call("classifyText", text, false)?;
        Ok(RawCapabilityResult::Categories(
            resp.categories
                .into_iter()
                .map(|c| CategoryScore {
                    name: c.name,
                    confidence: c.confidence,
                })
                .collect(),
        ))
    }

    fn moderate_text(&self, text: &str) -> Result<RawCapabilityResult, CallError> {
        let resp: ModerateTextResponse = self.call("moderateText", text, false)?;
        Ok(RawCapabilityResult::Moderation(
            resp.moderation_categories
                .into_iter()
                .map(|c| ModerationScore {
                    category: c.name,
                    confidence: c.confidence,
                })
                .collect(),
        ))
    }
}

const CREDENTIAL_STATUSES: [&str; 2] = ["UNAUTHENTICATED", "PERMISSION_DENIED"];
const CREDENTIAL_REASONS: [&str; 2] = ["API_KEY_INVALID", "API_KEY_EXPIRED"];

/// Sorts a non-success response into request, credential or transport failures.
pub fn classify_failure(status: StatusCode, body: &str) -> CallError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();
    let message = if detail.message.is_empty() {
        format!("HTTP {}", status)
    } else {
        detail.message.clone()
    };

    let credential_hint = CREDENTIAL_STATUSES.contains(&detail.status.as_str())
        || detail
            .details
            .iter()
            .filter_map(|d| d.reason.as_deref())
            .any(|r| CREDENTIAL_REASONS.contains(&r));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || credential_hint {
        CallError::Credential(message)
    } else if status.is_client_error() {
        CallError::Request(message)
    } else {
        CallError::Transport(message)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRequest<'a> {
    document: Document<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding_type: Option<&'static str>,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(default)]
struct WireSentiment {
    score: f64,
    magnitude: f64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireTextSpan {
    content: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireSentence {
    text: WireTextSpan,
    sentiment: WireSentiment,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AnalyzeSentimentResponse {
    document_sentiment: WireSentiment,
    sentences: Vec<WireSentence>,
}

impl From<AnalyzeSentimentResponse> for SentimentPayload {
    fn from(resp: AnalyzeSentimentResponse) -> Self {
        SentimentPayload {
            document: SentimentScore {
                score: resp.document_sentiment.score,
                magnitude: resp.document_sentiment.magnitude,
            },
            sentences: resp
                .sentences
                .into_iter()
                .map(|s| SentenceSentiment {
                    text: s.text.content,
                    score: s.sentiment.score,
                    magnitude: s.sentiment.magnitude,
                })
                .collect(),
        }
    }
}

fn unknown_type() -> String {
    "UNKNOWN".to_string()
}

#[derive(Deserialize)]
struct WireEntity {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default = "unknown_type")]
    entity_type: String,
    #[serde(default)]
    sentiment: Option<WireSentiment>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AnalyzeEntitiesResponse {
    entities: Vec<WireEntity>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireCategory {
    name: String,
    confidence: f64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ClassifyTextResponse {
    categories: Vec<WireCategory>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ModerateTextResponse {
    moderation_categories: Vec<WireCategory>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiErrorDetail {
    message: String,
    status: String,
    details: Vec<ApiErrorReason>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiErrorReason {
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::SecretString;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    // Accepts one connection, records the raw request and answers with a canned response.
    fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                request.push_str(&line);
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8_lossy(&payload));

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (format!("http://{}", addr), handle)
    }

    fn service(endpoint: &str, credentials: Credentials) -> Result<HttpLanguageService> {
        let client = Client::builder().no_proxy().build()?;
        Ok(HttpLanguageService::with_client(
            ClientConfig::new(endpoint, credentials),
            client,
        ))
    }

    #[test]
    fn test_sentiment_request_and_response() -> Result<()> {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"documentSentiment":{"score":0.8,"magnitude":1.2},"language":"en",
                "sentences":[{"text":{"content":"I love this product","beginOffset":0},
                              "sentiment":{"score":0.8,"magnitude":1.2}}]}"#,
        );
        let svc = service(&endpoint, Credentials::ApiKey(SecretString::from("k-123")))?;

        let result = svc.analyze_sentiment("I love this product")?;
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /documents:analyzeSentiment?key=k-123 "));
        assert!(request.contains(r#""type":"PLAIN_TEXT""#));
        assert!(request.contains(r#""encodingType":"UTF8""#));
        match result {
            RawCapabilityResult::Sentiment(payload) => {
                assert_eq!(payload.document.score, 0.8);
                assert_eq!(payload.document.magnitude, 1.2);
                assert_eq!(payload.sentences[0].text, "I love this product");
            }
            other => panic!("unexpected payload {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_access_token_is_sent_as_bearer() -> Result<()> {
        let (endpoint, server) = serve_once("200 OK", r#"{"categories":[]}"#);
        let svc = service(&endpoint, Credentials::AccessToken(SecretString::from("ya29.x")))?;

        let result = svc.classify_text("some text")?;
        let request = server.join().unwrap().to_ascii_lowercase();

        assert!(request.contains("authorization: bearer ya29.x"));
        assert!(!request.contains("encodingtype"));
        assert_eq!(result, RawCapabilityResult::Categories(vec![]));
        Ok(())
    }

    #[test]
    fn test_unauthorized_response_is_a_credential_error() -> Result<()> {
        let (endpoint, server) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        );
        let svc = service(&endpoint, Credentials::ApiKey(SecretString::from("bad")))?;

        let err = svc.moderate_text("hello").unwrap_err();
        server.join().unwrap();
        assert_eq!(
            err,
            CallError::Credential("Request had invalid authentication credentials.".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_entity_payload_conversion() -> Result<()> {
        let resp: AnalyzeEntitiesResponse = serde_json::from_str(
            r#"{"entities":[
                {"name":"Apple","type":"ORGANIZATION","salience":0.7,"sentiment":{"score":0.5,"magnitude":0.5}},
                {"name":"555-0100","type":"PHONE_NUMBER","sentiment":{}},
                {"name":"mystery"}
            ],"language":"en"}"#,
        )?;
        assert_eq!(resp.entities.len(), 3);
        assert_eq!(resp.entities[0].sentiment.map(|s| s.score), Some(0.5));
        assert_eq!(resp.entities[1].sentiment.map(|s| s.score), Some(0.0));
        assert_eq!(resp.entities[2].entity_type, "UNKNOWN");
        Ok(())
    }

    #[test]
    fn test_moderation_payload_conversion() -> Result<()> {
        let resp: ModerateTextResponse = serde_json::from_str(
            r#"{"moderationCategories":[{"name":"Toxic","confidence":0.123456},{"name":"Insult"}]}"#,
        )?;
        assert_eq!(resp.moderation_categories[0].name, "Toxic");
        assert_eq!(resp.moderation_categories[0].confidence, 0.123456);
        assert_eq!(resp.moderation_categories[1].confidence, 0.0);
        Ok(())
    }

    #[test]
    fn test_classify_failure() {
        let invalid_key = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.",
            "status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, invalid_key),
            CallError::Credential(_)
        ));

        let too_short = concat!(
            r#"{"error":{"code":400,"#,
            r#""message":"Invalid text content: too few tokens (words) to process.","#,
            r#""status":"INVALID_ARGUMENT"}}"#
        );
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, too_short),
            CallError::Request(
                "Invalid text content: too few tokens (words) to process.".to_string()
            )
        );

        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, ""),
            CallError::Credential(_)
        ));
        assert_eq!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, "<html>unavailable</html>"),
            CallError::Transport("HTTP 503 Service Unavailable".to_string())
        );
    }
}
