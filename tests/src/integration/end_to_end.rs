//! # End-to-End Scenarios
//!
//! Two or more buses attached to one in-process broadcast segment, each
//! running its own dispatcher thread.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use ether_bus::{Bus, BusConfig, BusError, DispatcherState, MemorySegment, Message};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const RECV_TIMEOUT: Duration = Duration::from_secs(3);

    fn attach(segment: &MemorySegment) -> Bus {
        ether_telemetry::try_init_test_logging();
        Bus::with_link(Arc::new(segment.attach()), BusConfig::for_testing())
    }

    async fn next(stream: &mut ether_bus::MessageStream) -> Message {
        timeout(RECV_TIMEOUT, stream.recv())
            .await
            .expect("timeout")
            .expect("stream closed")
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// Bus A listens for "fermenter"; bus B publishes a reading every second.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fermenter_readings_arrive_in_publish_order() {
        let segment = MemorySegment::new();
        let mut bus_a = attach(&segment);
        let bus_b = attach(&segment);

        bus_a.subscribe("fermenter").unwrap();
        let mut stream = bus_a.listen().unwrap();

        let publisher = bus_b.publisher();
        let publishing = tokio::spawn(async move {
            for i in 0..3 {
                if i > 0 {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                publisher.publish("fermenter", "20.5").unwrap();
            }
        });

        for _ in 0..3 {
            let message = next(&mut stream).await;
            assert_eq!(message, Message::new("fermenter", "20.5"));
        }

        publishing.await.unwrap();
        assert_eq!(bus_b.messages_published(), 3);
        assert_eq!(stream.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_receive_order_matches_send_order() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment);
        let sender = attach(&segment);

        listener.subscribe("seq").unwrap();
        let stream = listener.listen().unwrap();

        for i in 0..10 {
            sender.publish("seq", &i.to_string()).unwrap();
        }

        let payloads: Vec<String> = timeout(
            RECV_TIMEOUT,
            stream.take(10).map(|m| m.payload().to_string()).collect(),
        )
        .await
        .expect("timeout");

        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(payloads, expected);
    }

    #[tokio::test]
    async fn test_each_bus_sees_only_its_topics() {
        let segment = MemorySegment::new();
        let mut kettle = attach(&segment);
        let mut fermenter = attach(&segment);
        let sensor = attach(&segment);

        kettle.subscribe("kettle").unwrap();
        fermenter.subscribe("fermenter").unwrap();
        let mut kettle_stream = kettle.listen().unwrap();
        let mut fermenter_stream = fermenter.listen().unwrap();

        sensor.publish("kettle", "98.1").unwrap();
        sensor.publish("fermenter", "20.5").unwrap();
        sensor.publish("mash", "66").unwrap();

        assert_eq!(next(&mut kettle_stream).await, Message::new("kettle", "98.1"));
        assert_eq!(
            next(&mut fermenter_stream).await,
            Message::new("fermenter", "20.5")
        );

        // Give the dispatchers time to see "mash" and drop it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(kettle_stream.try_recv(), Ok(None));
        assert_eq!(fermenter_stream.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_duplicate_subscription_duplicates_delivery() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment);
        let sender = attach(&segment);

        listener.subscribe("t").unwrap();
        listener.subscribe("t").unwrap();
        let mut stream = listener.listen().unwrap();

        sender.publish("t", "once").unwrap();

        assert_eq!(next(&mut stream).await, Message::new("t", "once"));
        assert_eq!(next(&mut stream).await, Message::new("t", "once"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(stream.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_every_occurrence() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment);
        let sender = attach(&segment);

        for _ in 0..3 {
            listener.subscribe("t").unwrap();
        }
        listener.subscribe("marker").unwrap();
        listener.unsubscribe("t").unwrap();
        assert_eq!(listener.subscriptions(), vec!["marker"]);

        let mut stream = listener.listen().unwrap();
        sender.publish("t", "dropped").unwrap();
        sender.publish("marker", "after").unwrap();

        // The marker arrives after "t" was processed, so nothing else is pending.
        assert_eq!(next(&mut stream).await, Message::new("marker", "after"));
        assert_eq!(stream.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_publisher_hears_its_own_broadcast() {
        let segment = MemorySegment::new();
        let mut bus = attach(&segment);

        bus.subscribe("echo").unwrap();
        let mut stream = bus.listen().unwrap();
        bus.publish("echo", "me").unwrap();

        assert_eq!(next(&mut stream).await, Message::new("echo", "me"));
    }

    #[tokio::test]
    async fn test_shutdown_then_drain() {
        let segment = MemorySegment::new();
        let mut listener = attach(&segment);
        let sender = attach(&segment);

        listener.subscribe("t").unwrap();
        let mut stream = listener.listen().unwrap();
        sender.publish("t", "before").unwrap();
        assert_eq!(next(&mut stream).await, Message::new("t", "before"));

        listener.shutdown();
        assert_eq!(listener.state(), DispatcherState::Stopped);

        sender.publish("t", "after").unwrap();
        let end = timeout(RECV_TIMEOUT, stream.recv()).await.expect("timeout");
        assert_eq!(end, None);
    }

    #[test]
    fn test_unknown_interface_yields_no_bus() {
        ether_telemetry::try_init_test_logging();
        match Bus::new("bad1") {
            Err(BusError::InterfaceResolution(e)) => {
                assert!(e.to_string().contains("bad1"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("bus created on a nonexistent interface"),
        }
    }
}
