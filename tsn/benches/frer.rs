use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use tsn::{
    Frame, Frer, GateControlList, GateEntry, InterfaceId, MacAddr, StreamConfig,
    StreamIdentification, Tas, TasOptions,
};

const TALKER: InterfaceId = InterfaceId::new(0);
const LISTENER: InterfaceId = InterfaceId::new(1);
const STREAM_MAC: MacAddr = MacAddr(0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E);
const HOST_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);

const N_FRAMES: usize = 10_000;
const FRAME_SIZE: usize = 512;

fn frer_with_streams(n_streams: u16, history_length: u16) -> Frer {
    let frer = Frer::new();

    for iface in [TALKER, LISTENER] {
        frer.init(iface).unwrap();

        // Decoy streams first, so matching has to scan past them.
        for handle in 1..n_streams {
            let mac = MacAddr(0x02, 0x00, 0x00, 0x00, (handle >> 8) as u8, handle as u8);
            let id = StreamIdentification::DestMacVlan { mac, vlan: Some(handle) };
            frer.stream_add(iface, StreamConfig::new(handle, id)).unwrap();
        }

        let id = StreamIdentification::DestMacVlan { mac: STREAM_MAC, vlan: None };
        let config = StreamConfig::new(n_streams, id).history_length(history_length);
        frer.stream_add(iface, config).unwrap();
    }

    frer
}

fn frames() -> Vec<Frame> {
    let mut rng = rand::thread_rng();

    (0..N_FRAMES)
        .map(|_| {
            let mut payload = vec![0u8; FRAME_SIZE];
            rng.fill(&mut payload[..]);
            Frame::builder(STREAM_MAC, HOST_MAC).build(&payload)
        })
        .collect()
}

fn replicate_eliminate(c: &mut Criterion) {
    let _ = tracing_subscriber::fmt::try_init();

    let mut group = c.benchmark_group("frer_replicate_eliminate");
    group.throughput(Throughput::Elements(N_FRAMES as u64));

    let frames = frames();

    for n_streams in [1u16, 8, 32] {
        group.bench_function(BenchmarkId::new("streams", n_streams), |b| {
            let frer = frer_with_streams(n_streams, 32);

            b.iter(|| {
                for mut frame in frames.iter().cloned() {
                    frer.replicate(TALKER, &mut frame).unwrap();

                    // Both copies of every frame reach the listener.
                    assert!(frer.eliminate(LISTENER, &frame));
                    assert!(!frer.eliminate(LISTENER, &frame));
                }
            });
        });
    }

    for history_length in [32u16, 256, 1024] {
        group.bench_function(BenchmarkId::new("history", history_length), |b| {
            let frer = frer_with_streams(1, history_length);

            b.iter(|| {
                for mut frame in frames.iter().cloned() {
                    frer.replicate(TALKER, &mut frame).unwrap();
                    frer.eliminate(LISTENER, &frame);
                }
            });
        });
    }

    group.finish();
}

fn gate_lookup(c: &mut Criterion) {
    let tas = Tas::with_options(TasOptions::default().autonomous(false));
    tas.init(TALKER).unwrap();

    let mut gcl = GateControlList::new(1_000_000);
    for i in 0..8u8 {
        gcl = gcl.entry(GateEntry::open(1 << i, 125_000));
    }
    tas.configure_gates(TALKER, gcl).unwrap();
    tas.enable(TALKER, true).unwrap();

    let mut group = c.benchmark_group("tas_gate_lookup");
    group.throughput(Throughput::Elements(N_FRAMES as u64));

    group.bench_function("is_gate_open", |b| {
        b.iter(|| (0..N_FRAMES).filter(|i| tas.is_gate_open(TALKER, (i % 8) as u8)).count());
    });

    group.bench_function("admit", |b| {
        b.iter(|| (0..N_FRAMES).filter(|i| tas.admit(TALKER, (i % 8) as u8)).count());
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().warm_up_time(Duration::from_secs(1));
    targets = replicate_eliminate, gate_lookup
}

criterion_main!(benches);
