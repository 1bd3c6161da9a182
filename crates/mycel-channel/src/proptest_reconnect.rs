//! Property-based tests for reconnect behaviour.

use mycel_util::{ClientId, RetryPolicy};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{spawn_pump, LiveChannel, MockTransport, SessionSignal};

struct Outcome {
    signals: Vec<SessionSignal>,
    activations: Option<u64>,
    dials: usize,
}

/// One ping per connection; every connection but the last drops after its
/// ping, alternating between a clean close and a transport error.
fn run_session(pings: &[i64], extra: i64) -> Outcome {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let transport = Arc::new(MockTransport::new());
        let peers: Vec<_> = pings
            .iter()
            .enumerate()
            .map(|(i, minutes)| {
                let peer = transport.accept();
                peer.logged_on("n0123");
                peer.ping("n0123", *minutes);
                if i + 1 < pings.len() {
                    if i % 2 == 0 {
                        peer.close();
                    } else {
                        peer.fail();
                    }
                }
                peer
            })
            .collect();

        let channel = LiveChannel::connect(
            transport.clone(),
            "ws://mycel:9001/subscribe/clients/1",
            ClientId::new(1),
            "n0123",
            RetryPolicy::immediate(),
        )
        .await;

        let (tx, mut rx) = mpsc::channel(pings.len());
        let pump = spawn_pump(channel, extra, tx);
        let mut signals = Vec::new();
        for _ in pings {
            match rx.recv().await {
                Some(signal) => signals.push(signal),
                None => break,
            }
        }

        let activations = pump.stop().await.map(|c| c.activations());
        drop(peers);
        Outcome {
            signals,
            activations,
            dials: transport.dials(),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: After N redials the channel has logged on N + 1 times and
    /// every ping still carries the same extra minutes.
    #[test]
    fn prop_redials_keep_extra(
        pings in prop::collection::vec(-30i64..600, 1..8),
        extra in -120i64..120,
    ) {
        let outcome = run_session(&pings, extra);
        let expected: Vec<_> = pings
            .iter()
            .map(|m| SessionSignal::from_minutes(*m, extra))
            .collect();

        prop_assert_eq!(outcome.signals, expected);
        prop_assert_eq!(outcome.activations, Some(pings.len() as u64));
        prop_assert_eq!(outcome.dials, pings.len());
    }
}
