// Analysis request dispatcher: runs each requested capability once, containing request errors.
use tracing::{info, warn};

use crate::error::{CallError, DispatchError};
use crate::nlp::client::LanguageService;
use crate::nlp::raw::{RawCapabilityResult, RawResults};
use crate::nlp::{AnalysisRequest, Capability};

type Handler<S> = fn(&S, &str) -> Result<RawCapabilityResult, CallError>;

fn handler<S: LanguageService>(capability: Capability) -> Handler<S> {
    match capability {
        Capability::Sentiment => S::analyze_sentiment,
        Capability::EntityRecognition => S::analyze_entities,
        Capability::EntitySentiment => S::analyze_entity_sentiment,
        Capability::Classification => S::classify_text,
        Capability::Moderation => S::moderate_text,
    }
}

pub struct Dispatcher<S> {
    service: S,
}

impl<S: LanguageService> Dispatcher<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Calls every requested capability in processing order.
    ///
    /// Request errors are recorded per capability and the run continues. Credential
    /// and transport errors stop the run and no partial results are returned.
    pub fn dispatch(&self, request: &AnalysisRequest) -> Result<RawResults, DispatchError> {
        let mut results = RawResults::new();
        for capability in request.capabilities() {
            info!("Running {}", capability);
            match handler::<S>(capability)(&self.service, request.text()) {
                Ok(payload) => results = results.with(payload),
                Err(CallError::Request(message)) => {
                    warn!("{} failed, continuing without it: {}", capability, message);
                    results = results.with_failure(capability, message);
                }
                Err(CallError::Credential(message)) => {
                    return Err(DispatchError::Credential {
                        capability,
                        message,
                    });
                }
                Err(CallError::Transport(message)) => {
                    return Err(DispatchError::Transport {
                        capability,
                        message,
                    });
                }
            }
        }
        Ok(results)
    }
}
