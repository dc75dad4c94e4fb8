use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use tsn_common::{Clock, InstanceRegistry, InterfaceId, MonotonicClock};
use tsn_wire::{Frame, RTag};

use super::{
    history::SequenceHistory,
    stats::StreamSnapshot,
    stream::{Stream, StreamConfig, MAX_HISTORY_LENGTH},
    FrerError, FrerOptions,
};

/// FRER state of one interface.
#[derive(Debug)]
pub(crate) struct FrerInstance {
    iface: InterfaceId,
    /// Streams in the order they were added. Matching picks the first stream that matches.
    streams: Vec<Stream>,
}

impl FrerInstance {
    fn new(iface: InterfaceId) -> Self {
        Self { iface, streams: Vec::new() }
    }

    fn stream(&self, handle: u16) -> Option<&Stream> {
        self.streams.iter().find(|s| s.config.handle == handle)
    }

    fn stream_for(&mut self, frame: &Frame) -> Option<&mut Stream> {
        self.streams.iter_mut().find(|s| s.config.identification.matches(frame))
    }
}

/// The FRER engine. Holds one instance per initialized interface.
///
/// All operations on an interface serialize on that interface's lock, including the data path
/// ([`Frer::replicate`], [`Frer::eliminate`]). Interfaces are independent of each other.
#[derive(Debug)]
pub struct Frer {
    options: FrerOptions,
    instances: InstanceRegistry<FrerInstance>,
    clock: Arc<dyn Clock>,
}

impl Default for Frer {
    fn default() -> Self {
        Self::new()
    }
}

impl Frer {
    /// Creates a FRER engine with the default [`FrerOptions`].
    pub fn new() -> Self {
        Self::with_options(FrerOptions::default())
    }

    /// Creates a FRER engine with the given options.
    pub fn with_options(options: FrerOptions) -> Self {
        Self {
            instances: InstanceRegistry::new(options.max_interfaces),
            options,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Sets the clock used to timestamp accepted sequence numbers.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates the FRER instance of `iface`, or resets it (dropping all its streams) if it
    /// already exists.
    pub fn init(&self, iface: InterfaceId) -> Result<(), FrerError> {
        let (instance, created) = self
            .instances
            .get_or_insert_with(iface, || FrerInstance::new(iface))
            .map_err(|e| {
                warn!(%iface, capacity = e.capacity, "No free FRER instance slot");
                FrerError::InvalidArgument("no free instance slot for interface")
            })?;

        if !created {
            instance.lock().streams.clear();
        }

        info!(%iface, "IEEE 802.1CB FRER initialized");

        Ok(())
    }

    /// Tears down the FRER instance of `iface`, releasing all of its streams. Returns `false` if
    /// the interface wasn't initialized.
    pub fn remove(&self, iface: InterfaceId) -> bool {
        let removed = self.instances.remove(iface).is_some();
        if removed {
            info!(%iface, "IEEE 802.1CB FRER removed");
        }

        removed
    }

    /// Adds a stream to the table of `iface`. The stream is eligible for matching as soon as
    /// this returns.
    pub fn stream_add(&self, iface: InterfaceId, config: StreamConfig) -> Result<(), FrerError> {
        let instance = self.instance(iface)?;

        if config.history_length == 0 || config.history_length > MAX_HISTORY_LENGTH {
            warn!(
                %iface,
                handle = config.handle,
                len = config.history_length,
                "Invalid history length"
            );
            return Err(FrerError::InvalidArgument("history length must be in 1..=1024"));
        }

        let mut instance = instance.lock();

        if instance.stream(config.handle).is_some() {
            return Err(FrerError::AlreadyExists(config.handle));
        }

        if instance.streams.len() >= self.options.max_streams {
            warn!(%iface, max = self.options.max_streams, "Stream table full");
            return Err(FrerError::InvalidArgument("stream table is full"));
        }

        // Either the whole stream is built or nothing is added.
        let history = SequenceHistory::with_window(config.history_length as usize)
            .map_err(|_| FrerError::OutOfMemory)?;
        instance.streams.try_reserve(1).map_err(|_| FrerError::OutOfMemory)?;

        info!(
            %iface,
            handle = config.handle,
            replication = config.replication_enabled,
            elimination = config.elimination_enabled,
            window = history.window(),
            "Added stream for FRER processing"
        );

        instance.streams.push(Stream::new(config, history));

        Ok(())
    }

    /// Removes a stream and releases its history.
    pub fn stream_remove(&self, iface: InterfaceId, handle: u16) -> Result<(), FrerError> {
        let instance = self.instance(iface)?;
        let mut instance = instance.lock();

        let Some(idx) = instance.streams.iter().position(|s| s.config.handle == handle) else {
            return Err(FrerError::NotFound(handle));
        };

        // Keep the scan order of the remaining streams.
        instance.streams.remove(idx);

        info!(iface = %instance.iface, handle, "Removed stream from FRER processing");

        Ok(())
    }

    /// Egress path: stamps `frame` with the next sequence number of its stream.
    ///
    /// Frames that match no stream, or a stream without replication, are left alone. On error
    /// the frame is left untagged and the stream's sequence counter is not advanced; it's up to
    /// the caller to forward or drop it.
    pub fn replicate(&self, iface: InterfaceId, frame: &mut Frame) -> Result<(), FrerError> {
        let instance = self.instance(iface)?;
        let mut instance = instance.lock();

        let Some(stream) = instance.stream_for(frame) else {
            return Ok(());
        };

        if !stream.config.replication_enabled {
            return Ok(());
        }

        frame.insert_rtag(RTag::new(stream.next_seq_num))?;

        let seq = stream.take_seq_num();
        stream.stats.replicated_frames += 1;

        debug!(%iface, handle = stream.config.handle, seq, "Replicated frame");

        Ok(())
    }

    /// Ingress path: decides whether `frame` should be processed (`true`) or dropped as a
    /// duplicate (`false`).
    ///
    /// Frames without a redundancy tag, frames matching no stream, frames of streams without
    /// elimination, and any frame on an uninitialized interface are always processed.
    pub fn eliminate(&self, iface: InterfaceId, frame: &Frame) -> bool {
        let Some(tag) = frame.rtag() else {
            return true;
        };

        let Some(instance) = self.instances.get(iface) else {
            return true;
        };

        let now = self.clock.now_ns();
        let mut instance = instance.lock();

        let Some(stream) = instance.stream_for(frame) else {
            return true;
        };

        if !stream.config.elimination_enabled {
            return true;
        }

        let seq = tag.seq();
        if stream.history.contains(seq) {
            stream.stats.eliminated_frames += 1;
            debug!(%iface, handle = stream.config.handle, seq, "Eliminated duplicate frame");
            return false;
        }

        if let Some(evicted) = stream.history.insert(seq, now) {
            let handle = stream.config.handle;
            trace!(%iface, handle, seq = evicted.seq, "Evicted from history");
        }
        stream.stats.passed_frames += 1;
        debug!(%iface, handle = stream.config.handle, seq, "Passed frame");

        true
    }

    /// Returns a snapshot of a stream's configuration and counters.
    pub fn get_stream_stats(
        &self,
        iface: InterfaceId,
        handle: u16,
    ) -> Result<StreamSnapshot, FrerError> {
        let instance = self.instance(iface)?;
        let instance = instance.lock();

        let stream = instance.stream(handle).ok_or(FrerError::NotFound(handle))?;

        Ok(StreamSnapshot {
            config: stream.config.clone(),
            next_seq_num: stream.next_seq_num,
            stats: stream.stats,
            history_occupancy: stream.history.len(),
            last_accepted_ns: stream.history.latest().map(|e| e.timestamp_ns),
        })
    }

    /// Returns the handles of the streams of `iface`, in matching order.
    pub fn streams(&self, iface: InterfaceId) -> Result<Vec<u16>, FrerError> {
        let instance = self.instance(iface)?;
        let instance = instance.lock();

        Ok(instance.streams.iter().map(|s| s.config.handle).collect())
    }

    /// Returns the interfaces with an initialized FRER instance.
    pub fn interfaces(&self) -> Vec<InterfaceId> {
        self.instances.interfaces()
    }

    fn instance(&self, iface: InterfaceId) -> Result<Arc<Mutex<FrerInstance>>, FrerError> {
        self.instances.get(iface).ok_or(FrerError::InvalidArgument("interface not initialized"))
    }
}
