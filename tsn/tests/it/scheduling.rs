use std::{convert::Infallible, sync::Arc, time::Duration};

use tsn::{Driver, Frame, Frer, GateControlList, GateEntry, InterfaceId, MacAddr, Port, Tas};

const IFACE: InterfaceId = InterfaceId::new(3);
const DST: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x02);
const SRC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);

#[derive(Debug, Default)]
struct Wire(Vec<u8>);

impl Driver for Wire {
    type Error = Infallible;

    fn transmit(&mut self, frame: Frame) -> Result<(), Self::Error> {
        self.0.push(frame.priority());
        Ok(())
    }
}

fn frame(tc: u8) -> Frame {
    Frame::builder(DST, SRC).vlan(1, tc).build(&[0u8; 46])
}

/// Sends one frame of every traffic class and returns the classes that went out.
fn burst(port: &mut Port<Wire>) -> Vec<u8> {
    port.driver_mut().0.clear();
    for tc in 0..8 {
        port.send(frame(tc)).unwrap();
    }

    port.driver().0.clone()
}

/// A 30 ms cycle: 10 ms reserved for classes 6 and 7, then 10 ms for everyone, then 5 ms for
/// classes 0 to 5 only, then 5 ms for everyone again.
fn schedule() -> GateControlList {
    GateControlList::new(30_000_000)
        .entry(GateEntry::close(0x3F, 10_000_000))
        .entry(GateEntry::open(0x3F, 10_000_000))
        .entry(GateEntry::close(0xC0, 5_000_000))
        .entry(GateEntry::open(0xC0, 5_000_000))
}

#[tokio::test(start_paused = true)]
async fn port_follows_the_gate_schedule() {
    let _ = tracing_subscriber::fmt::try_init();

    let tas = Arc::new(Tas::new());
    let mut port = Port::new(IFACE, Arc::new(Frer::new()), Arc::clone(&tas), Wire::default());
    port.init().unwrap();

    // No schedule yet: everything goes out.
    assert_eq!(burst(&mut port), vec![0, 1, 2, 3, 4, 5, 6, 7]);

    tas.configure_gates(IFACE, schedule()).unwrap();
    tas.enable(IFACE, true).unwrap();

    // Sample away from the entry boundaries.
    tokio::time::sleep(Duration::from_millis(2)).await;

    for cycle in 0..3u64 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(burst(&mut port), vec![6, 7], "cycle {cycle}");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(burst(&mut port), vec![0, 1, 2, 3, 4, 5, 6, 7], "cycle {cycle}");

        tokio::time::sleep(Duration::from_millis(7)).await;
        assert_eq!(burst(&mut port), vec![0, 1, 2, 3, 4, 5], "cycle {cycle}");

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(burst(&mut port), vec![0, 1, 2, 3, 4, 5, 6, 7], "cycle {cycle}");

        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let stats = tas.get_stats(IFACE).unwrap();
    assert_eq!(stats.cycle_count(), 3);
    assert_eq!(stats.current_entry_index(), 0);
    assert_eq!(stats.dropped_frames(0), 3);
    assert_eq!(stats.dropped_frames(7), 3);
    // One frame before the schedule was enabled, then three per cycle.
    assert_eq!(stats.transmitted_frames(7), 10);

    tas.enable(IFACE, false).unwrap();
    assert_eq!(burst(&mut port), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(port.stats().gated, 3 * 8);
    assert_eq!(port.stats().transmitted, 8 + 3 * 24 + 8);
}
