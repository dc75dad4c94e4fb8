use std::collections::HashSet;

use rand::Rng;
use tsn::{Frame, Frer, InterfaceId, MacAddr, StreamConfig, StreamIdentification};
use tsn_sim::{LinkImpairment, RedundantLink};

const TALKER: InterfaceId = InterfaceId::new(1);
const LISTENER: InterfaceId = InterfaceId::new(2);
const STREAM_MAC: MacAddr = MacAddr(0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E);
const TALKER_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);

const N_FRAMES: usize = 2_000;

fn setup(frer: &Frer) {
    let id = StreamIdentification::DestMacVlan { mac: STREAM_MAC, vlan: Some(100) };

    frer.init(TALKER).unwrap();
    frer.stream_add(TALKER, StreamConfig::new(1, id.clone()).elimination(false)).unwrap();

    frer.init(LISTENER).unwrap();
    frer.stream_add(LISTENER, StreamConfig::new(1, id).replication(false)).unwrap();
}

/// Replicates a stream over two lossy, duplicating, reordering paths and checks the listener
/// sees every sequence number that made it over at least one path, exactly once.
#[test]
fn frer_over_redundant_paths() {
    let _ = tracing_subscriber::fmt::try_init();

    let frer = Frer::new();
    setup(&frer);

    let impairment = LinkImpairment::lossy(20.0).with_duplicate(5.0).with_gap(3);
    let mut link = RedundantLink::new([impairment; 2], 0xF12E);

    let mut rng = rand::thread_rng();
    let mut arrived = HashSet::new();
    let mut accepted = Vec::new();

    for _ in 0..N_FRAMES {
        let mut payload = vec![0u8; rng.gen_range(46..256)];
        rng.fill(&mut payload[..]);

        let mut frame = Frame::builder(STREAM_MAC, TALKER_MAC).vlan(100, 5).build(&payload);
        frer.replicate(TALKER, &mut frame).unwrap();
        link.send(&frame);

        for frame in link.recv() {
            let seq = frame.rtag().unwrap().seq();
            arrived.insert(seq);

            if frer.eliminate(LISTENER, &frame) {
                accepted.push(seq);
            }
        }
    }

    for frame in link.drain() {
        let seq = frame.rtag().unwrap().seq();
        arrived.insert(seq);

        if frer.eliminate(LISTENER, &frame) {
            accepted.push(seq);
        }
    }

    let unique = accepted.iter().copied().collect::<HashSet<_>>();
    assert_eq!(unique.len(), accepted.len(), "a sequence number was accepted twice");
    assert_eq!(unique, arrived);

    // Both paths lose a fifth of the frames, losing a frame on both is rare.
    assert!(arrived.len() > N_FRAMES * 9 / 10);

    let talker = frer.get_stream_stats(TALKER, 1).unwrap();
    assert_eq!(talker.replicated_frames(), N_FRAMES as u64);
    assert_eq!(talker.next_seq_num(), N_FRAMES as u16);

    let listener = frer.get_stream_stats(LISTENER, 1).unwrap();
    assert_eq!(listener.passed_frames(), accepted.len() as u64);

    let delivered = link.path_stats().iter().map(|s| s.delivered).sum::<u64>();
    assert_eq!(listener.passed_frames() + listener.eliminated_frames(), delivered);
}

/// Sequence numbers wrap at 65536 without the listener mistaking new frames for duplicates.
#[test]
fn frer_across_sequence_wrap() {
    let frer = Frer::new();
    setup(&frer);

    let mut link = RedundantLink::new([LinkImpairment::default(); 2], 7);
    let mut accepted = 0u64;

    for _ in 0..(u16::MAX as usize + 100) {
        let mut frame = Frame::builder(STREAM_MAC, TALKER_MAC).vlan(100, 5).build(&[0u8; 46]);
        frer.replicate(TALKER, &mut frame).unwrap();
        link.send(&frame);

        accepted += link.recv().iter().filter(|f| frer.eliminate(LISTENER, f)).count() as u64;
    }

    let listener = frer.get_stream_stats(LISTENER, 1).unwrap();
    assert_eq!(accepted, u16::MAX as u64 + 100);
    assert_eq!(listener.eliminated_frames(), accepted);
    assert_eq!(frer.get_stream_stats(TALKER, 1).unwrap().next_seq_num(), 99);
}
