//! Interaction router: maps inbound user actions to outbound effects.
//!
//! Callback payloads are flat strings (`category_world`, `help`, ...). They
//! are parsed once into [`Action`] so handlers match on variants rather than
//! on string prefixes.

use crate::categories::CategoryRegistry;
use crate::delivery::{Delivery, DeliveryOutcome};
use crate::errors::SendError;
use crate::outputs::messages;
use crate::outputs::{ChatSink, OutboundMessage};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const CATEGORY_PREFIX: &str = "category_";

/// An inbound user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The `/start` command.
    Start,
    /// A category button; the key is not validated yet.
    Category(String),
    Subscribe,
    Refresh,
    Help,
    /// Any payload this bot never issued.
    Unknown(String),
}

impl Action {
    /// Parse a callback payload.
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "subscribe" => Action::Subscribe,
            "refresh" => Action::Refresh,
            "help" => Action::Help,
            other => match other.strip_prefix(CATEGORY_PREFIX) {
                Some(key) => Action::Category(key.to_string()),
                None => Action::Unknown(other.to_string()),
            },
        }
    }

    /// The callback payload for this action. `Start` arrives as a command,
    /// so its payload is only used in logs.
    pub fn payload(&self) -> String {
        match self {
            Action::Start => "start".to_string(),
            Action::Category(key) => format!("{CATEGORY_PREFIX}{key}"),
            Action::Subscribe => "subscribe".to_string(),
            Action::Refresh => "refresh".to_string(),
            Action::Help => "help".to_string(),
            Action::Unknown(payload) => payload.clone(),
        }
    }
}

/// What handling an action amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A static reply was sent.
    Replied,
    /// The category key was not in the registry.
    CategoryNotFound,
    /// A delivery ran to completion.
    Delivered(DeliveryOutcome),
    /// The action was not recognized and nothing was sent.
    Ignored,
}

/// Dispatches actions for any number of conversations.
///
/// The router keeps no per-conversation state; each call is independent.
#[derive(Clone)]
pub struct Router {
    registry: Arc<CategoryRegistry>,
    delivery: Delivery,
}

impl Router {
    pub fn new(registry: Arc<CategoryRegistry>, delivery: Delivery) -> Self {
        Self { registry, delivery }
    }

    /// Handle one action, sending its effects to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the transport error that interrupted the reply, if any.
    #[instrument(level = "info", skip(self, sink))]
    pub async fn handle(&self, action: Action, sink: &dyn ChatSink) -> Result<RouteOutcome, SendError> {
        let menu = || messages::main_menu(&self.registry);

        match action {
            Action::Start => {
                sink.send(OutboundMessage::with_keyboard(
                    messages::welcome(&self.registry),
                    menu(),
                ))
                .await?;
                Ok(RouteOutcome::Replied)
            }
            Action::Category(key) => {
                let category = match self.registry.resolve(&key) {
                    Ok(category) => category,
                    Err(e) => {
                        info!(error = %e, "Rejected category selection");
                        sink.edit(OutboundMessage::text(messages::category_not_found()))
                            .await?;
                        return Ok(RouteOutcome::CategoryNotFound);
                    }
                };
                let outcome = self.delivery.deliver(category, sink).await?;
                Ok(RouteOutcome::Delivered(outcome))
            }
            Action::Subscribe => {
                // Acknowledgement only; nothing is stored or scheduled.
                sink.edit(OutboundMessage::with_keyboard(messages::subscribed(), menu()))
                    .await?;
                Ok(RouteOutcome::Replied)
            }
            Action::Refresh => {
                sink.edit(OutboundMessage::text(messages::refreshing()))
                    .await?;
                sink.edit(OutboundMessage::with_keyboard(
                    messages::choose_category(),
                    menu(),
                ))
                .await?;
                Ok(RouteOutcome::Replied)
            }
            Action::Help => {
                sink.edit(OutboundMessage::with_keyboard(messages::help(), menu()))
                    .await?;
                Ok(RouteOutcome::Replied)
            }
            Action::Unknown(payload) => {
                debug!(%payload, "Ignoring unrecognized action");
                Ok(RouteOutcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliverySettings;
    use crate::delivery::tests::{FakeFetcher, listing};
    use crate::outputs::testing::{Kind, RecordingSink};

    fn router(fetcher: Arc<FakeFetcher>) -> Router {
        let registry = Arc::new(CategoryRegistry::bbc().unwrap());
        let delivery = Delivery::new(fetcher, registry.clone(), DeliverySettings::default());
        Router::new(registry, delivery)
    }

    #[test]
    fn test_parse_payloads() {
        assert_eq!(Action::from_payload("subscribe"), Action::Subscribe);
        assert_eq!(Action::from_payload("refresh"), Action::Refresh);
        assert_eq!(Action::from_payload("help"), Action::Help);
        assert_eq!(
            Action::from_payload("category_world"),
            Action::Category("world".to_string())
        );
        assert_eq!(Action::from_payload("category_"), Action::Category(String::new()));
        assert_eq!(
            Action::from_payload("Help"),
            Action::Unknown("Help".to_string())
        );
        assert_eq!(Action::from_payload(""), Action::Unknown(String::new()));
    }

    #[test]
    fn test_menu_payloads_parse_back() {
        let registry = CategoryRegistry::bbc().unwrap();
        for row in messages::main_menu(&registry).rows {
            for button in row {
                assert!(!matches!(
                    Action::from_payload(&button.action),
                    Action::Unknown(_)
                ));
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_category_skips_fetch() {
        let fetcher = Arc::new(FakeFetcher::serving(listing(&["A"])));
        let sink = RecordingSink::default();

        let outcome = router(fetcher.clone())
            .handle(Action::from_payload("category_unknown_x"), &sink)
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::CategoryNotFound);
        assert_eq!(sink.texts(), [messages::category_not_found()]);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_runs_delivery() {
        let fetcher = Arc::new(FakeFetcher::serving(listing(&["A", "B"])));
        let sink = RecordingSink::default();

        let outcome = router(fetcher.clone())
            .handle(Action::Category("world".to_string()), &sink)
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Delivered(DeliveryOutcome::Delivered(2)));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(sink.events().len(), 5);
    }

    #[tokio::test]
    async fn test_start_sends_welcome_with_menu() {
        let sink = RecordingSink::default();
        let outcome = router(Arc::new(FakeFetcher::timing_out()))
            .handle(Action::Start, &sink)
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Replied);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, Kind::Send);
        assert!(events[0].message.text.contains("Welcome"));
        assert_eq!(
            events[0].message.keyboard,
            Some(messages::main_menu(&CategoryRegistry::bbc().unwrap()))
        );
    }

    #[tokio::test]
    async fn test_subscribe_is_acknowledged_only() {
        let fetcher = Arc::new(FakeFetcher::timing_out());
        let sink = RecordingSink::default();
        router(fetcher.clone())
            .handle(Action::Subscribe, &sink)
            .await
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, Kind::Edit);
        assert_eq!(events[0].message.text, messages::subscribed());
        assert!(events[0].message.keyboard.is_some());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_edits_twice() {
        let sink = RecordingSink::default();
        router(Arc::new(FakeFetcher::timing_out()))
            .handle(Action::Refresh, &sink)
            .await
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == Kind::Edit));
        assert_eq!(events[0].message.text, messages::refreshing());
        assert!(events[0].message.keyboard.is_none());
        assert_eq!(events[1].message.text, messages::choose_category());
        assert!(events[1].message.keyboard.is_some());
    }

    #[tokio::test]
    async fn test_help() {
        let sink = RecordingSink::default();
        router(Arc::new(FakeFetcher::timing_out()))
            .handle(Action::Help, &sink)
            .await
            .unwrap();

        assert_eq!(sink.texts(), [messages::help()]);
    }

    #[tokio::test]
    async fn test_unknown_action_is_ignored() {
        let sink = RecordingSink::default();
        let outcome = router(Arc::new(FakeFetcher::timing_out()))
            .handle(Action::from_payload("something_else"), &sink)
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Ignored);
        assert!(sink.events().is_empty());
    }
}
