//! MQTT session management and topic dispatch.
//!
//! The manager owns at most one live session obtained from a
//! [`MqttTransport`] factory. Connecting retries forever (there is no
//! fallback transport, so retrying is the only correct policy); any error
//! while polling abandons the session so the next poll reconnects and
//! re-subscribes. Incoming messages are dispatched to per-suffix handlers
//! registered in the callback table.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::settings::Settings;

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Full topic the message arrived on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// One live broker session.
pub trait MqttSession {
    /// Subscribe to a topic filter.
    fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Publish a payload.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<()>;

    /// Non-blocking receive of the next buffered message, if any.
    fn try_recv(&mut self) -> Result<Option<InboundMessage>>;

    /// Best-effort session teardown.
    fn disconnect(&mut self) -> Result<()>;
}

/// Session factory abstracting the broker connection.
pub trait MqttTransport {
    /// Open a fresh session.
    fn connect(&mut self, options: &MqttOptions) -> Result<Box<dyn MqttSession>>;
}

/// Broker and topic configuration.
#[derive(Debug, Clone)]
pub struct MqttOptions {
    /// Broker address.
    pub broker: String,
    /// Optional username.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Client identifier presented to the broker.
    pub client_id: String,
    /// Root topic; normalized to end with a single `/`.
    pub root_topic: String,
    /// Delay between reconnect attempts.
    pub retry_delay: Duration,
}

impl Default for MqttOptions {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            username: None,
            password: None,
            client_id: "neomatrix".to_string(),
            root_topic: "neomatrix/".to_string(),
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl MqttOptions {
    /// Build options from settings.
    ///
    /// Blank entries count as absent; the client id falls back to the stable
    /// `device_id` when the settings supply none.
    pub fn from_settings(settings: &Settings, device_id: &str) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            settings
                .get(key)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            broker: non_blank("mqtt_server").unwrap_or(defaults.broker),
            username: non_blank("mqtt_user"),
            password: non_blank("mqtt_pass"),
            client_id: non_blank("mqtt_client_id").unwrap_or_else(|| device_id.to_string()),
            root_topic: non_blank("main_topic").unwrap_or(defaults.root_topic),
            retry_delay: defaults.retry_delay,
        }
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqttState {
    /// No session.
    Disconnected,
    /// Mid-`connect()`: the old session is disposed of, the new one is not
    /// subscribed yet.
    Connecting,
    /// Connected with the root subscription in place.
    Connected,
}

/// Handler invoked for messages on one topic suffix.
///
/// Receives the suffix, the raw payload and the dispatch context (typically
/// the engine). A returned error is caught and logged at the dispatch
/// boundary; it never stops the poll loop.
pub type Handler<C> = Box<dyn FnMut(&str, &[u8], &mut C) -> Result<()>>;

/// MQTT connection manager and dispatcher.
///
/// Generic over the dispatch context `C` handed to registered handlers, so
/// independent instances can drive independent engines under test.
pub struct MqttManager<C> {
    transport: Box<dyn MqttTransport>,
    options: MqttOptions,
    root: String,
    session: Option<Box<dyn MqttSession>>,
    state: MqttState,
    callbacks: HashMap<String, Handler<C>>,
}

impl<C> MqttManager<C> {
    /// Create a manager over a session factory.
    pub fn new(transport: Box<dyn MqttTransport>, options: MqttOptions) -> Self {
        let root = normalize_root(&options.root_topic);
        Self {
            transport,
            options,
            root,
            session: None,
            state: MqttState::Disconnected,
            callbacks: HashMap::new(),
        }
    }

    /// Normalized root topic, always ending with `/`.
    pub fn root_topic(&self) -> &str {
        &self.root
    }

    /// Current session state.
    pub fn state(&self) -> MqttState {
        self.state
    }

    /// Whether a session is live.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Register a handler for a topic suffix.
    ///
    /// At most one handler per suffix; the last registration wins and the
    /// previous handler, if any, is returned.
    pub fn register_callback(
        &mut self,
        suffix: impl Into<String>,
        handler: Handler<C>,
    ) -> Option<Handler<C>> {
        self.callbacks.insert(suffix.into(), handler)
    }

    /// Remove and return the handler for a topic suffix.
    pub fn unregister_callback(&mut self, suffix: &str) -> Option<Handler<C>> {
        self.callbacks.remove(suffix)
    }

    /// Establish a session, retrying forever.
    ///
    /// Any existing session is disposed of first (errors ignored). On every
    /// successful connection the single wildcard root subscription is
    /// re-established, since broker-side subscriptions are not assumed to
    /// survive a reconnect.
    pub fn connect(&mut self) {
        if let Some(mut old) = self.session.take() {
            let _ = old.disconnect();
        }
        self.state = MqttState::Connecting;

        info!(
            "Connecting to MQTT server {} with main topic {}",
            self.options.broker, self.root
        );
        let filter = format!("{}#", self.root);
        loop {
            match self.transport.connect(&self.options) {
                Ok(mut session) => match session.subscribe(&filter) {
                    Ok(()) => {
                        info!("MQTT connected and subscribed to {filter}");
                        self.session = Some(session);
                        self.state = MqttState::Connected;
                        return;
                    }
                    Err(err) => {
                        warn!("MQTT subscribe to {filter} failed: {err}");
                        let _ = session.disconnect();
                    }
                },
                Err(err) => {
                    warn!(
                        "Failed to connect to MQTT broker {}: {err}",
                        self.options.broker
                    );
                }
            }
            if !self.options.retry_delay.is_zero() {
                thread::sleep(self.options.retry_delay);
            }
        }
    }

    /// Drain and dispatch the currently buffered messages.
    ///
    /// Self-healing: with no session a fresh [`connect`](Self::connect) is
    /// forced first, and any receive error abandons the session so the next
    /// poll reconnects. Errors surface only as log lines and the absence of
    /// a session, never to the caller.
    pub fn poll(&mut self, cx: &mut C) {
        if self.session.is_none() {
            self.connect();
        }
        loop {
            let received = match self.session.as_mut() {
                Some(session) => session.try_recv(),
                None => return,
            };
            match received {
                Ok(Some(message)) => self.dispatch(&message, cx),
                Ok(None) => return,
                Err(err) => {
                    warn!("Error polling MQTT: {err}");
                    // Abandon the session to force a reconnect.
                    self.session = None;
                    self.state = MqttState::Disconnected;
                    return;
                }
            }
        }
    }

    /// Publish to a sub-topic under the root topic.
    ///
    /// # Errors
    /// Fails with [`Error::NotConnected`] and no side effect when no session
    /// is live; a transport failure abandons the session before returning.
    pub fn publish(&mut self, sub_topic: &str, payload: &[u8], retain: bool) -> Result<()> {
        self.publish_to(sub_topic, payload, None, retain)
    }

    /// Publish under an explicit root instead of the configured one.
    ///
    /// # Errors
    /// Same conditions as [`publish`](Self::publish).
    pub fn publish_to(
        &mut self,
        sub_topic: &str,
        payload: &[u8],
        root: Option<&str>,
        retain: bool,
    ) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(Error::NotConnected);
        };
        let topic = join_topic(root.unwrap_or(&self.root), sub_topic);
        debug!("Publishing to {topic}");
        match session.publish(&topic, payload, retain) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.session = None;
                self.state = MqttState::Disconnected;
                Err(err)
            }
        }
    }

    /// Route one message to its handler.
    fn dispatch(&mut self, message: &InboundMessage, cx: &mut C) {
        let topic = message.topic.trim();
        let suffix = topic.strip_prefix(self.root.as_str()).unwrap_or(topic);
        match self.callbacks.get_mut(suffix) {
            Some(handler) => {
                if let Err(err) = handler(suffix, &message.payload, cx) {
                    warn!("Error in handler for {suffix}: {err}");
                }
            }
            None => warn!("No handler for MQTT sub-topic: \"{suffix}\"."),
        }
    }
}

/// Normalize a root topic so it ends with exactly one `/`.
fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_end_matches('/');
    format!("{trimmed}/")
}

/// Join a root and a sub-topic with a single separator, regardless of the
/// separators supplied on either side.
pub fn join_topic(root: &str, sub_topic: &str) -> String {
    let edge = |c: char| c == '/' || c.is_whitespace();
    format!(
        "{}/{}",
        root.trim_matches(edge),
        sub_topic.trim_matches(edge)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fall_back_to_the_device_id_client() {
        let settings = Settings::parse("mqtt_server = broker.local\nmqtt_client_id =\n");
        let options = MqttOptions::from_settings(&settings, "ab12cd");
        assert_eq!(options.broker, "broker.local");
        assert_eq!(options.client_id, "ab12cd");
        assert!(options.username.is_none());
        assert!(options.password.is_none());
    }

    #[test]
    fn normalize_root_adds_exactly_one_separator() {
        assert_eq!(normalize_root("home/tree"), "home/tree/");
        assert_eq!(normalize_root("home/tree/"), "home/tree/");
        assert_eq!(normalize_root("home/tree//"), "home/tree/");
        assert_eq!(normalize_root("  home/tree "), "home/tree/");
    }

    #[test]
    fn join_topic_collapses_separators() {
        assert_eq!(join_topic("home/tree/", "effect"), "home/tree/effect");
        assert_eq!(join_topic("home/tree", "/effect"), "home/tree/effect");
        assert_eq!(join_topic(" /home/tree/ ", " effect/ "), "home/tree/effect");
    }
}
