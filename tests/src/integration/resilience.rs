//! # Resilience Scenarios
//!
//! Garbage on the wire, oversized publishes, backpressure and concurrent
//! subscription changes must never take a dispatcher down.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use ether_bus::{
        Bus, BusConfig, DispatcherState, MemorySegment, Message, PublishError, TransportError,
    };

    const RECV_TIMEOUT: Duration = Duration::from_secs(3);

    fn attach(segment: &MemorySegment, config: BusConfig) -> Bus {
        ether_telemetry::try_init_test_logging();
        Bus::with_link(Arc::new(segment.attach()), config)
    }

    async fn next(stream: &mut ether_bus::MessageStream) -> Message {
        timeout(RECV_TIMEOUT, stream.recv())
            .await
            .expect("timeout")
            .expect("stream closed")
    }

    #[tokio::test]
    async fn test_malformed_frames_are_skipped() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment, BusConfig::for_testing());
        let sender = attach(&segment, BusConfig::for_testing());

        listener.subscribe("t").unwrap();
        let mut stream = listener.listen().unwrap();

        segment.inject(b"\xff\xfe not an envelope");
        segment.inject(b"{\"tpc\":\"t\"}\0\0\0\0");
        segment.inject(b"{\"tpc\":\"\",\"Payload\":\"empty topic\"}");
        sender.publish("t", "survived").unwrap();

        assert_eq!(next(&mut stream).await, Message::new("t", "survived"));
        assert_eq!(stream.try_recv(), Ok(None));

        let stats = listener.stats().expect("listening");
        assert_eq!(stats.decode_errors, 3);
        assert_eq!(stats.messages_delivered, 1);
        assert_eq!(listener.state(), DispatcherState::Running);
    }

    #[tokio::test]
    async fn test_hand_padded_frame_is_decoded() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment, BusConfig::for_testing());

        listener.subscribe("pad").unwrap();
        let mut stream = listener.listen().unwrap();

        let mut wire = br#"{"tpc":"pad","Payload":"ok"}"#.to_vec();
        wire.resize(60, 0);
        segment.inject(&wire);

        assert_eq!(next(&mut stream).await, Message::new("pad", "ok"));
    }

    #[tokio::test]
    async fn test_oversized_publish_fails_without_side_effects() {
        let segment = MemorySegment::new().with_max_payload(64);
        let mut listener = attach(&segment, BusConfig::for_testing());
        let sender = attach(&segment, BusConfig::for_testing());

        listener.subscribe("t").unwrap();
        let mut stream = listener.listen().unwrap();

        let result = sender.publish("t", &"x".repeat(128));
        assert!(matches!(
            result,
            Err(PublishError::Send(TransportError::PayloadTooLarge { .. }))
        ));
        assert_eq!(sender.messages_published(), 0);

        sender.publish("t", "small").unwrap();
        assert_eq!(next(&mut stream).await, Message::new("t", "small"));
    }

    #[tokio::test]
    async fn test_slow_consumer_loses_nothing_in_order() {
        let segment = MemorySegment::new();
        let mut listener = attach(
            &segment,
            BusConfig::for_testing().with_delivery_capacity(1),
        );
        let sender = attach(&segment, BusConfig::for_testing());

        listener.subscribe("t").unwrap();
        let mut stream = listener.listen().unwrap();

        for i in 0..5 {
            sender.publish("t", &i.to_string()).unwrap();
        }

        for i in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(next(&mut stream).await, Message::new("t", i.to_string()));
        }
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_dispatcher() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment, BusConfig::for_testing());

        let stream = listener.listen().unwrap();
        drop(stream);

        let stopped = timeout(RECV_TIMEOUT, async {
            while listener.state() != DispatcherState::Stopped {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(stopped.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_subscription_changes_while_publishing() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment, BusConfig::for_testing());
        let sender = attach(&segment, BusConfig::for_testing());

        listener.subscribe("stable").unwrap();
        let mut stream = listener.listen().unwrap();

        let publisher = sender.publisher();
        let noise = tokio::spawn(async move {
            for i in 0..200 {
                publisher.publish("churn", &i.to_string()).unwrap();
                tokio::task::yield_now().await;
            }
        });

        for _ in 0..50 {
            listener.subscribe("churn").unwrap();
            listener.unsubscribe("churn").unwrap();
        }
        noise.await.unwrap();

        sender.publish("stable", "end").unwrap();

        // Any churn messages that slipped in while subscribed come first.
        loop {
            let message = next(&mut stream).await;
            if message.topic() == "stable" {
                assert_eq!(message.payload(), "end");
                break;
            }
            assert_eq!(message.topic(), "churn");
        }
        assert_eq!(listener.subscriptions(), vec!["stable"]);
    }
}
