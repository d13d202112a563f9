//! MQTT session management and dispatch against a scripted broker.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use neomatrix::connectivity::mqtt::{
    InboundMessage, MqttManager, MqttOptions, MqttSession, MqttState, MqttTransport,
};
use neomatrix::{effect_handler, Engine, Error, FrameBuffer, Registry, Result};

/// Shared broker script and call log.
#[derive(Default)]
struct Broker {
    connect_attempts: u32,
    connect_failures_remaining: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>, bool)>,
    inbound: VecDeque<InboundMessage>,
    fail_next_recv: bool,
    disconnects: u32,
}

impl Broker {
    fn queue(&mut self, topic: &str, payload: &str) {
        self.inbound.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.as_bytes().to_vec(),
        });
    }
}

struct MockTransport(Rc<RefCell<Broker>>);

impl MqttTransport for MockTransport {
    fn connect(&mut self, _options: &MqttOptions) -> Result<Box<dyn MqttSession>> {
        let mut broker = self.0.borrow_mut();
        broker.connect_attempts += 1;
        if broker.connect_failures_remaining > 0 {
            broker.connect_failures_remaining -= 1;
            return Err(Error::Mqtt("connection refused".into()));
        }
        drop(broker);
        Ok(Box::new(MockSession(Rc::clone(&self.0))))
    }
}

struct MockSession(Rc<RefCell<Broker>>);

impl MqttSession for MockSession {
    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.0.borrow_mut().subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<()> {
        self.0
            .borrow_mut()
            .published
            .push((topic.to_string(), payload.to_vec(), retain));
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<InboundMessage>> {
        let mut broker = self.0.borrow_mut();
        if broker.fail_next_recv {
            broker.fail_next_recv = false;
            return Err(Error::Mqtt("socket reset".into()));
        }
        Ok(broker.inbound.pop_front())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.0.borrow_mut().disconnects += 1;
        Ok(())
    }
}

fn options() -> MqttOptions {
    MqttOptions {
        broker: "broker.test".to_string(),
        username: None,
        password: None,
        client_id: "tester".to_string(),
        root_topic: "home/tree".to_string(),
        retry_delay: Duration::ZERO,
    }
}

fn engine() -> Engine<FrameBuffer> {
    Engine::new(FrameBuffer::new(3, 4), Registry::discover().unwrap())
}

fn manager(broker: &Rc<RefCell<Broker>>) -> MqttManager<Engine<FrameBuffer>> {
    let mut manager = MqttManager::new(Box::new(MockTransport(Rc::clone(broker))), options());
    manager.register_callback("effect", effect_handler());
    manager
}

#[test]
fn connect_retries_until_the_broker_accepts() {
    let broker = Rc::new(RefCell::new(Broker {
        connect_failures_remaining: 2,
        ..Broker::default()
    }));
    let mut mqtt = manager(&broker);

    mqtt.connect();

    assert!(mqtt.is_connected());
    assert_eq!(broker.borrow().connect_attempts, 3);
    // The wildcard root subscription is established on success.
    assert_eq!(broker.borrow().subscriptions, vec!["home/tree/#"]);
}

#[test]
fn control_message_switches_the_effect() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    broker
        .borrow_mut()
        .queue("home/tree/effect", r#"{ "effect": "cross" }"#);
    let mut mqtt = manager(&broker);
    let mut engine = engine();

    mqtt.connect();
    mqtt.poll(&mut engine);

    assert_eq!(engine.active_effect(), Some("cross"));
}

#[test]
fn unknown_suffix_is_dropped() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    broker
        .borrow_mut()
        .queue("home/tree/unknown-suffix", r#"{ "effect": "cross" }"#);
    let mut mqtt = manager(&broker);
    let mut engine = engine();

    mqtt.connect();
    mqtt.poll(&mut engine);

    assert_eq!(engine.active_effect(), None);
    assert!(mqtt.is_connected());
}

#[test]
fn foreign_root_topics_do_not_match_suffix_handlers() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    broker
        .borrow_mut()
        .queue("other/effect", r#"{ "effect": "cross" }"#);
    let mut mqtt = manager(&broker);
    let mut engine = engine();

    mqtt.connect();
    mqtt.poll(&mut engine);

    assert_eq!(engine.active_effect(), None);
}

#[test]
fn handler_errors_do_not_stop_the_poll_loop() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    {
        let mut broker = broker.borrow_mut();
        broker.queue("home/tree/boom", "ignored");
        broker.queue("home/tree/effect", r#"{ "effect": "cycle" }"#);
    }
    let mut mqtt = manager(&broker);
    mqtt.register_callback(
        "boom",
        Box::new(|_, _, _| Err(Error::Effect("handler blew up".into()))),
    );
    let mut engine = engine();

    mqtt.connect();
    mqtt.poll(&mut engine);

    // The failing handler was caught at the dispatch boundary; the next
    // message still switched the effect.
    assert_eq!(engine.active_effect(), Some("cycle"));
    assert!(mqtt.is_connected());
}

#[test]
fn malformed_control_messages_keep_the_current_effect() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    {
        let mut broker = broker.borrow_mut();
        broker.queue("home/tree/effect", r#"{ "effect": "cross" }"#);
        broker.queue("home/tree/effect", r#"{ "color": [1, 2, 3] }"#);
        broker.queue("home/tree/effect", r#"{ "effect": "no-such-effect" }"#);
    }
    let mut mqtt = manager(&broker);
    let mut engine = engine();

    mqtt.connect();
    mqtt.poll(&mut engine);

    assert_eq!(engine.active_effect(), Some("cross"));
}

#[test]
fn publish_without_a_session_has_no_side_effect() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mut mqtt = manager(&broker);

    let result = mqtt.publish("status", b"up", false);

    assert!(matches!(result, Err(Error::NotConnected)));
    assert_eq!(broker.borrow().connect_attempts, 0);
    assert!(broker.borrow().published.is_empty());
}

#[test]
fn publish_joins_topics_with_a_single_separator() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mut mqtt = manager(&broker);
    mqtt.connect();

    mqtt.publish("/status/", b"up", true).unwrap();
    mqtt.publish_to("state", b"ok", Some("/custom/root/"), false)
        .unwrap();

    let published = &broker.borrow().published;
    assert_eq!(published[0].0, "home/tree/status");
    assert!(published[0].2);
    assert_eq!(published[1].0, "custom/root/state");
}

#[test]
fn poll_errors_drop_the_session_and_self_heal() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mut mqtt = manager(&broker);
    let mut engine = engine();

    mqtt.connect();
    assert_eq!(broker.borrow().connect_attempts, 1);

    broker.borrow_mut().fail_next_recv = true;
    mqtt.poll(&mut engine);
    assert!(!mqtt.is_connected());

    // The next poll reconnects, re-subscribes and processes the backlog.
    broker
        .borrow_mut()
        .queue("home/tree/effect", r#"{ "effect": "blink" }"#);
    mqtt.poll(&mut engine);

    assert!(mqtt.is_connected());
    assert_eq!(broker.borrow().connect_attempts, 2);
    assert_eq!(broker.borrow().subscriptions.len(), 2);
    assert_eq!(engine.active_effect(), Some("blink"));
}

#[test]
fn reconnect_disposes_of_the_previous_session() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mut mqtt = manager(&broker);

    mqtt.connect();
    mqtt.connect();

    assert_eq!(broker.borrow().disconnects, 1);
    assert_eq!(broker.borrow().connect_attempts, 2);
}

#[test]
fn last_callback_registration_wins() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mut mqtt = manager(&broker);

    let previous = mqtt.register_callback("effect", Box::new(|_, _, _| Ok(())));
    assert!(previous.is_some());
    let none_before = mqtt.register_callback("fresh", Box::new(|_, _, _| Ok(())));
    assert!(none_before.is_none());
    assert!(mqtt.unregister_callback("fresh").is_some());
    assert!(mqtt.unregister_callback("fresh").is_none());
}

#[test]
fn root_topic_is_normalized() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mqtt = manager(&broker);
    assert_eq!(mqtt.root_topic(), "home/tree/");
}

#[test]
fn state_follows_the_session_lifecycle() {
    let broker = Rc::new(RefCell::new(Broker::default()));
    let mut mqtt = manager(&broker);
    let mut engine = engine();

    assert_eq!(mqtt.state(), MqttState::Disconnected);
    mqtt.connect();
    assert_eq!(mqtt.state(), MqttState::Connected);

    broker.borrow_mut().fail_next_recv = true;
    mqtt.poll(&mut engine);
    assert_eq!(mqtt.state(), MqttState::Disconnected);
}
