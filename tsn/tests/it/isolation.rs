use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use tsn::{
    Frame, Frer, GateControlList, GateEntry, InterfaceId, MacAddr, StreamConfig,
    StreamIdentification, Tas, TasOptions,
};

const ETH0: InterfaceId = InterfaceId::new(0);
const ETH1: InterfaceId = InterfaceId::new(1);
const STREAM_MAC: MacAddr = MacAddr(0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E);
const HOST_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);
const OTHER_MAC: MacAddr = MacAddr(0x01, 0x80, 0xC2, 0x00, 0x00, 0x0F);

const ROUNDS: u64 = 10_000;

#[test]
fn frer_interfaces_are_independent() {
    let frer = Frer::new();
    frer.init(ETH0).unwrap();
    frer.init(ETH1).unwrap();

    let id = StreamIdentification::DestMacVlan { mac: STREAM_MAC, vlan: None };
    frer.stream_add(ETH0, StreamConfig::new(7, id.clone())).unwrap();
    // Same handle on another interface is a different stream.
    frer.stream_add(ETH1, StreamConfig::new(7, id)).unwrap();

    let mut frame = Frame::builder(STREAM_MAC, HOST_MAC).build(b"payload");
    frer.replicate(ETH0, &mut frame).unwrap();

    assert!(frer.eliminate(ETH0, &frame));
    assert!(!frer.eliminate(ETH0, &frame));
    // The other interface has never seen this sequence number.
    assert!(frer.eliminate(ETH1, &frame));

    assert_eq!(frer.get_stream_stats(ETH0, 7).unwrap().next_seq_num(), 1);
    assert_eq!(frer.get_stream_stats(ETH1, 7).unwrap().next_seq_num(), 0);

    assert!(frer.remove(ETH0));
    assert!(frer.get_stream_stats(ETH0, 7).is_err());
    assert_eq!(frer.get_stream_stats(ETH1, 7).unwrap().passed_frames(), 1);
}

#[test]
fn tas_interfaces_are_independent() {
    let tas = Tas::with_options(TasOptions::default().autonomous(false));
    tas.init(ETH0).unwrap();
    tas.init(ETH1).unwrap();

    tas.configure_gates(ETH0, GateControlList::new(1_000).entry(GateEntry::close(0xFF, 1_000)))
        .unwrap();
    tas.enable(ETH0, true).unwrap();

    assert_eq!(tas.get_gate_states(ETH0), [false; 8]);
    assert_eq!(tas.get_gate_states(ETH1), [true; 8]);
    assert!(matches!(tas.enable(ETH1, true), Err(tsn::TasError::InvalidArgument(_))));
    assert_eq!(tas.interfaces(), vec![ETH0, ETH1]);
}

#[test]
fn concurrent_interfaces_keep_their_own_tables() {
    let frer = Arc::new(Frer::new());
    for iface in [ETH0, ETH1] {
        frer.init(iface).unwrap();
        let id = StreamIdentification::DestMacVlan { mac: STREAM_MAC, vlan: None };
        frer.stream_add(iface, StreamConfig::new(1, id)).unwrap();
    }

    let workers = [ETH0, ETH1].map(|iface| {
        let frer = Arc::clone(&frer);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                let mut frame = Frame::builder(STREAM_MAC, HOST_MAC).build(b"payload");
                frer.replicate(iface, &mut frame).unwrap();

                assert!(frer.eliminate(iface, &frame));
                assert!(!frer.eliminate(iface, &frame));
            }
        })
    });

    for worker in workers {
        worker.join().unwrap();
    }

    for iface in [ETH0, ETH1] {
        let stats = frer.get_stream_stats(iface, 1).unwrap();
        assert_eq!(stats.replicated_frames(), ROUNDS);
        assert_eq!(stats.eliminated_frames(), ROUNDS);
        assert_eq!(stats.passed_frames(), ROUNDS);
        assert_eq!(u64::from(stats.next_seq_num()), ROUNDS);
    }
}

#[test]
fn stream_churn_does_not_disturb_replication() {
    let frer = Arc::new(Frer::new());
    frer.init(ETH0).unwrap();

    let stable = StreamIdentification::DestMacVlan { mac: STREAM_MAC, vlan: None };
    let churned = StreamIdentification::DestMacVlan { mac: OTHER_MAC, vlan: None };
    frer.stream_add(ETH0, StreamConfig::new(1, stable)).unwrap();

    let done = Arc::new(AtomicBool::new(false));

    let churn = {
        let (frer, done) = (Arc::clone(&frer), Arc::clone(&done));
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                frer.stream_add(ETH0, StreamConfig::new(2, churned.clone())).unwrap();
                frer.stream_remove(ETH0, 2).unwrap();
            }
        })
    };

    let mut stable_seqs = Vec::new();
    let mut churned_seqs = Vec::new();
    for _ in 0..ROUNDS {
        let mut frame = Frame::builder(STREAM_MAC, HOST_MAC).build(b"stable");
        frer.replicate(ETH0, &mut frame).unwrap();
        stable_seqs.push(frame.rtag().unwrap().seq());

        let mut frame = Frame::builder(OTHER_MAC, HOST_MAC).build(b"churned");
        frer.replicate(ETH0, &mut frame).unwrap();
        churned_seqs.extend(frame.rtag().map(|t| t.seq()));
    }

    done.store(true, Ordering::Relaxed);
    churn.join().unwrap();

    // The stable stream never skipped or repeated a number.
    assert!(stable_seqs.iter().enumerate().all(|(i, &seq)| usize::from(seq) == i));
    let stats = frer.get_stream_stats(ETH0, 1).unwrap();
    assert_eq!(stats.replicated_frames(), ROUNDS);
    assert_eq!(u64::from(stats.next_seq_num()), ROUNDS);

    // Every incarnation of the churned stream counts from zero.
    assert!(churned_seqs.windows(2).all(|w| w[1] == 0 || w[1] == w[0] + 1));
    assert_eq!(churned_seqs.first().copied().unwrap_or(0), 0);
    assert_eq!(frer.streams(ETH0).unwrap(), vec![1]);
}
