//! Composes user input into provider requests and streams the answers back.

use crate::aggregator::StreamAggregator;
use crate::aggregator::StreamResult;
use crate::config::Config;
use crate::error::ChatError;
use crate::error::Result;
use crate::persona::Persona;
use crate::session::Session;
use async_stream::stream;
use futures::Stream;
use futures::StreamExt;
use iete_api::ApiError;
use iete_api::ApiKeyAuth;
use iete_api::AspectRatio;
use iete_api::GeminiClient;
use iete_api::GeminiRequest;
use iete_api::GeminiRequestBuilder;
use iete_api::GenerationParams;
use iete_api::HttpTransport;
use iete_api::ImagenClient;
use iete_api::ResponseEvent;
use iete_protocol::models::Media;
use iete_protocol::models::Turn;
use serde_json::Value;
use tracing::debug;

/// One logical user action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInput {
    pub message: String,
    pub media: Option<Media>,
    pub use_search: bool,
}

impl UserInput {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_search(mut self, use_search: bool) -> Self {
        self.use_search = use_search;
        self
    }
}

/// A validated request ready to be streamed, together with the user turn that
/// will be committed once the answer completes.
#[derive(Debug, Clone)]
pub struct ComposedRequest {
    turn: Turn,
    request: GeminiRequest,
}

impl ComposedRequest {
    pub fn turn(&self) -> &Turn {
        &self.turn
    }

    pub fn body(&self) -> &Value {
        &self.request.body
    }

    pub fn model(&self) -> &str {
        &self.request.model
    }
}

/// A chat with one user: owns the bounded history and the provider clients.
///
/// [`Conversation::send`] borrows the conversation mutably until its stream is
/// dropped, so requests on one conversation are serialized by construction.
pub struct Conversation<T: HttpTransport + Clone> {
    chat: GeminiClient<T, ApiKeyAuth>,
    images: ImagenClient<T, ApiKeyAuth>,
    session: Session,
    persona: Persona,
    model: String,
    image_model: String,
    params: GenerationParams,
}

impl<T: HttpTransport + Clone> Conversation<T> {
    pub fn new(config: &Config, transport: T, persona: Persona) -> Self {
        let auth = ApiKeyAuth::new(config.api_key.clone());
        let provider = config.provider();
        Self {
            chat: GeminiClient::new(transport.clone(), provider.clone(), auth.clone()),
            images: ImagenClient::new(transport, provider, auth),
            session: Session::new(config.max_turns, persona.system_instruction()),
            persona,
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            params: config.generation_params(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn history(&self) -> Vec<Turn> {
        self.session.snapshot()
    }

    pub fn has_credential(&self) -> bool {
        self.chat.has_credential()
    }

    /// Switches to a new user. History is cleared only when the name actually
    /// changes; returns whether it did.
    pub fn set_display_name(&mut self, name: &str) -> bool {
        let persona = Persona::new(name);
        if persona == self.persona {
            return false;
        }
        self.persona = persona;
        self.reset();
        true
    }

    /// Starts over with the current persona.
    pub fn reset(&mut self) {
        self.session.reset(self.persona.system_instruction());
    }

    /// Builds the provider request for `input` on top of the current history.
    pub fn compose(&self, input: &UserInput) -> Result<ComposedRequest> {
        let blank = input.message.trim().is_empty();
        if blank && input.media.is_none() {
            return Err(ChatError::InvalidRequest(
                "a message or an attachment is required".to_string(),
            ));
        }

        // Sent verbatim; indentation in pasted code is meaningful.
        let message = if blank { "" } else { input.message.as_str() };
        let turn = Turn::user(message, input.media.clone());
        let history = self.session.snapshot();
        let request = GeminiRequestBuilder::new(
            &self.model,
            self.session.system_instruction(),
            &history,
            &turn,
        )
        .params(self.params)
        .use_search(input.use_search)
        .build()?;

        Ok(ComposedRequest { turn, request })
    }

    /// Sends `input` and returns the incremental results.
    ///
    /// Validation and the credential check happen before this returns, so
    /// those failures never cost a network call. The stream yields one
    /// [`StreamResult`] per provider chunk; on clean completion the user turn
    /// and the assistant reply are appended to the history. A failure ends the
    /// stream with an error and leaves the history untouched.
    pub fn send(
        &mut self,
        input: UserInput,
    ) -> Result<impl Stream<Item = Result<StreamResult>> + '_> {
        let composed = self.compose(&input)?;
        if !self.chat.has_credential() {
            return Err(ApiError::MissingCredential.into());
        }

        let chat = &self.chat;
        let session = &mut self.session;
        Ok(stream! {
            let mut events = match chat.stream_request(composed.request).await {
                Ok(events) => events,
                Err(err) => {
                    yield Err(ChatError::from(err));
                    return;
                }
            };

            let mut aggregator = StreamAggregator::new();
            while let Some(event) = events.next().await {
                match event {
                    Ok(ResponseEvent::Chunk(chunk)) => {
                        yield Ok(aggregator.apply(chunk).clone());
                    }
                    Ok(ResponseEvent::Completed { token_usage }) => {
                        debug!(?token_usage, "response completed");
                        break;
                    }
                    Err(err) => {
                        yield Err(ChatError::from(err));
                        return;
                    }
                }
            }

            session.append(composed.turn);
            session.append(Turn::assistant(aggregator.finish().into_text()));
        })
    }

    /// Generates at most one image. `Ok(None)` means the provider produced
    /// nothing, which is not an error. History is not touched.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<Media>> {
        let image = self
            .images
            .generate(&self.image_model, prompt.trim(), aspect_ratio)
            .await?;
        Ok(image)
    }
}
