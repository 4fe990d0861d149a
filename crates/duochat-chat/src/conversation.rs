//! Conversation controller — the ordered transcript plus one send at a time.
//!
//! Each `send` takes the `ApiConfig` to use for that message, builds the
//! provider through a [`ProviderFactory`], and appends both the user turn and
//! the assistant reply. Provider failures become assistant messages prefixed
//! with `Error:`; they never abort the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use duochat_core::types::{ApiConfig, ChatResponse, FileAttachment, Message, UserInput};
use duochat_providers::ProviderFactory;

/// Why a message was not sent.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("no API key configured; run `duochat setup`")]
    MissingApiKey,
    #[error("nothing to send")]
    EmptyInput,
    #[error("a message is already being sent")]
    Busy,
}

/// Clears the busy flag however the send ends, including cancellation.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Conversation {
    factory: Arc<dyn ProviderFactory>,
    messages: RwLock<Vec<Message>>,
    busy: AtomicBool,
}

impl Conversation {
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            messages: RwLock::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Send one user turn and wait for the reply.
    ///
    /// Returns the appended assistant message, which may carry an error.
    pub async fn send(&self, input: UserInput, config: &ApiConfig) -> Result<Message, SendError> {
        if !config.is_configured() {
            return Err(SendError::MissingApiKey);
        }
        if input.is_empty() {
            return Err(SendError::EmptyInput);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SendError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let content = match input.file {
            Some(ref file) => with_file_text(&input.text, file),
            None => input.text.clone(),
        };
        let user_message = Message::user(content, input.image, input.file);

        info!(
            provider = config.provider.name(),
            chars = user_message.content.len(),
            image = user_message.image.is_some(),
            file = user_message.file.as_ref().map(|f| f.name.as_str()).unwrap_or(""),
            "sending message"
        );

        let history = {
            let mut messages = self.write();
            messages.push(user_message);
            messages.clone()
        };

        let response = match self.factory.create(config) {
            Ok(provider) => {
                debug!(
                    provider = provider.display_name(),
                    model = provider.model(),
                    messages = history.len(),
                    "calling provider"
                );
                provider.chat(&history).await
            }
            Err(e) => ChatResponse::error(e.to_string()),
        };

        let reply = match response {
            ChatResponse::Content(text) => {
                debug!(chars = text.len(), "received reply");
                Message::assistant(text)
            }
            ChatResponse::Error(error) => {
                warn!(provider = config.provider.name(), error = %error, "provider returned an error");
                Message::assistant(format!("Error: {}", error))
            }
        };

        self.write().push(reply.clone());
        Ok(reply)
    }

    /// Forget the whole transcript.
    pub fn clear(&self) {
        let mut messages = self.write();
        info!(dropped = messages.len(), "conversation cleared");
        messages.clear();
    }

    /// Snapshot of the transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Message>> {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// `"{text}\n\n[File: {name}]\n{extracted_text}"`
fn with_file_text(text: &str, file: &FileAttachment) -> String {
    format!("{}\n\n[File: {}]\n{}", text, file.name, file.extracted_text)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use duochat_core::config::ProvidersConfig;
    use duochat_core::types::{ProviderKind, Role};
    use duochat_providers::{ChatProvider, HttpProviderFactory, ProviderError};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns a canned response and records what it was sent.
    struct MockProvider {
        response: ChatResponse,
        delay: Duration,
        seen: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    #[async_trait]
    impl ChatProvider for MockProvider {
        async fn chat(&self, messages: &[Message]) -> ChatResponse {
            self.seen.lock().unwrap().push(messages.to_vec());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    struct MockFactory {
        response: ChatResponse,
        delay: Duration,
        seen: Arc<Mutex<Vec<Vec<Message>>>>,
        created: Mutex<Vec<ProviderKind>>,
    }

    impl MockFactory {
        fn replying(response: ChatResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                delay: Duration::ZERO,
                seen: Arc::default(),
                created: Mutex::default(),
            })
        }

        fn slow(response: ChatResponse, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                response,
                delay,
                seen: Arc::default(),
                created: Mutex::default(),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl ProviderFactory for MockFactory {
        fn create(&self, api: &ApiConfig) -> Result<Box<dyn ChatProvider>, ProviderError> {
            self.created.lock().unwrap().push(api.provider);
            Ok(Box::new(MockProvider {
                response: self.response.clone(),
                delay: self.delay,
                seen: self.seen.clone(),
            }))
        }
    }

    fn openai() -> ApiConfig {
        ApiConfig::new(ProviderKind::OpenAi, "sk-test")
    }

    #[tokio::test]
    async fn test_send_appends_user_and_assistant() {
        let factory = MockFactory::replying(ChatResponse::Content("Hi there".into()));
        let conversation = Conversation::new(factory.clone());

        let reply = conversation.send(UserInput::text("Hello"), &openai()).await.unwrap();

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Hi there");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1], reply);
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_provider_sees_full_history() {
        let factory = MockFactory::replying(ChatResponse::Content("ok".into()));
        let conversation = Conversation::new(factory.clone());

        conversation.send(UserInput::text("one"), &openai()).await.unwrap();
        conversation.send(UserInput::text("two"), &openai()).await.unwrap();

        let seen = factory.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let contents: Vec<&str> = seen[1].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "ok", "two"]);
    }

    #[tokio::test]
    async fn test_provider_selected_per_send() {
        let factory = MockFactory::replying(ChatResponse::Content("ok".into()));
        let conversation = Conversation::new(factory.clone());

        conversation.send(UserInput::text("a"), &openai()).await.unwrap();
        conversation
            .send(UserInput::text("b"), &ApiConfig::new(ProviderKind::Gemini, "g-key"))
            .await
            .unwrap();

        assert_eq!(
            *factory.created.lock().unwrap(),
            vec![ProviderKind::OpenAi, ProviderKind::Gemini]
        );
    }

    #[tokio::test]
    async fn test_error_becomes_assistant_message() {
        let factory = MockFactory::replying(ChatResponse::error("rate limited"));
        let conversation = Conversation::new(factory);

        let reply = conversation.send(UserInput::text("Hello"), &openai()).await.unwrap();

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Error: rate limited");
        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_call() {
        let factory = MockFactory::replying(ChatResponse::Content("unused".into()));
        let conversation = Conversation::new(factory.clone());

        let err = conversation
            .send(UserInput::text("Hello"), &ApiConfig::new(ProviderKind::OpenAi, "  "))
            .await
            .unwrap_err();

        assert_eq!(err, SendError::MissingApiKey);
        assert!(conversation.is_empty());
        assert_eq!(factory.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let factory = MockFactory::replying(ChatResponse::Content("unused".into()));
        let conversation = Conversation::new(factory.clone());

        let err = conversation.send(UserInput::text("   "), &openai()).await.unwrap_err();
        assert_eq!(err, SendError::EmptyInput);
        assert!(conversation.is_empty());
        assert_eq!(factory.calls(), 0);
    }

    #[tokio::test]
    async fn test_image_only_input_is_sent() {
        let factory = MockFactory::replying(ChatResponse::Content("A cat.".into()));
        let conversation = Conversation::new(factory.clone());

        let input = UserInput::text("").with_image("data:image/png;base64,iVBORw==");
        conversation.send(input, &openai()).await.unwrap();

        let messages = conversation.messages();
        assert_eq!(messages[0].content, "");
        assert_eq!(messages[0].image.as_deref(), Some("data:image/png;base64,iVBORw=="));
    }

    #[tokio::test]
    async fn test_file_text_is_folded_into_content() {
        let factory = MockFactory::replying(ChatResponse::Content("Summary.".into()));
        let conversation = Conversation::new(factory.clone());

        let file = FileAttachment {
            name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            extracted_text: "Q3 revenue grew.".into(),
        };
        conversation
            .send(UserInput::text("Summarize").with_file(file.clone()), &openai())
            .await
            .unwrap();

        let first = &conversation.messages()[0];
        assert_eq!(first.content, "Summarize\n\n[File: report.pdf]\nQ3 revenue grew.");
        assert_eq!(first.file.as_ref(), Some(&file));
    }

    #[tokio::test]
    async fn test_concurrent_send_is_busy() {
        let factory = MockFactory::slow(ChatResponse::Content("done".into()), Duration::from_millis(200));
        let conversation = Conversation::new(factory.clone());
        let config = openai();

        let (first, second) = tokio::join!(
            conversation.send(UserInput::text("first"), &config),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                conversation.send(UserInput::text("second"), &config).await
            }
        );

        assert_eq!(first.unwrap().content, "done");
        assert_eq!(second.unwrap_err(), SendError::Busy);
        assert_eq!(conversation.len(), 2);
        assert_eq!(factory.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_send_releases_busy() {
        let factory = MockFactory::slow(ChatResponse::Content("late".into()), Duration::from_secs(5));
        let conversation = Conversation::new(factory);

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            conversation.send(UserInput::text("slow"), &openai()),
        )
        .await;

        assert!(result.is_err());
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_clear() {
        let factory = MockFactory::replying(ChatResponse::Content("ok".into()));
        let conversation = Conversation::new(factory);

        conversation.send(UserInput::text("hi"), &openai()).await.unwrap();
        assert_eq!(conversation.len(), 2);

        conversation.clear();
        assert!(conversation.is_empty());
        assert!(conversation.messages().is_empty());
    }

    // ── Through the real HTTP adapters ──

    fn http_conversation(kind: ProviderKind, api_base: &str) -> Conversation {
        let mut settings = ProvidersConfig::default();
        settings.get_mut(kind).api_base = Some(api_base.to_string());
        Conversation::new(Arc::new(HttpProviderFactory::new(settings)))
    }

    #[tokio::test]
    async fn test_openai_hello_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Hello"}],
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let conversation = http_conversation(ProviderKind::OpenAi, &mock_server.uri());
        let reply = conversation.send(UserInput::text("Hello"), &openai()).await.unwrap();

        assert_eq!(reply.content, "Hi there");
        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_vendor_error_in_transcript() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let conversation = http_conversation(ProviderKind::Gemini, &mock_server.uri());
        let reply = conversation
            .send(UserInput::text("hi"), &ApiConfig::new(ProviderKind::Gemini, "g-key"))
            .await
            .unwrap();

        assert!(reply.content.starts_with("Error: "));
        assert!(reply.content.len() > "Error: ".len());
        assert_eq!(conversation.messages()[1].role, Role::Assistant);
    }
}
