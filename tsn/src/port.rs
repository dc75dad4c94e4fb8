use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace, warn};

use tsn_common::InterfaceId;
use tsn_l2::{Frer, FrerError, Tas, TasError};
use tsn_wire::Frame;

/// The device end of a [`Port`]: puts frames on the wire.
pub trait Driver {
    type Error: std::error::Error + Send + Sync + 'static;

    fn transmit(&mut self, frame: Frame) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum PortError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Frer(#[from] FrerError),
    #[error(transparent)]
    Tas(#[from] TasError),
    #[error("Driver error: {0}")]
    Driver(#[source] E),
}

/// Frame counters of a [`Port`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortStats {
    /// Frames handed to the driver.
    pub transmitted: u64,
    /// Frames dropped because their gate was closed.
    pub gated: u64,
    /// Frames sent without a redundancy tag because tagging failed.
    pub untagged: u64,
    /// Frames accepted on ingress.
    pub received: u64,
    /// Duplicates dropped on ingress.
    pub duplicates: u64,
}

/// An interface as seen by the data path: frames sent through it are replicated and gated
/// before reaching the [`Driver`], frames received through it are deduplicated.
#[derive(Debug)]
pub struct Port<D> {
    iface: InterfaceId,
    frer: Arc<Frer>,
    tas: Arc<Tas>,
    driver: D,
    stats: PortStats,
}

impl<D: Driver> Port<D> {
    pub fn new(iface: InterfaceId, frer: Arc<Frer>, tas: Arc<Tas>, driver: D) -> Self {
        Self { iface, frer, tas, driver, stats: PortStats::default() }
    }

    /// (Re)initializes the FRER and TAS instances of this port's interface.
    pub fn init(&self) -> Result<(), PortError<D::Error>> {
        self.frer.init(self.iface)?;
        self.tas.init(self.iface)?;
        Ok(())
    }

    /// Sends a frame: if the gate of its traffic class is open, tags it when it belongs to a
    /// replicated stream and transmits it.
    ///
    /// Returns `Ok(false)` if the gate was closed. The frame is dropped without consuming a
    /// sequence number, so listeners see no gap in the stream.
    pub fn send(&mut self, mut frame: Frame) -> Result<bool, PortError<D::Error>> {
        let tc = frame.priority();
        if !self.tas.admit(self.iface, tc) {
            trace!(iface = %self.iface, tc, "Gate closed, dropping frame");
            self.stats.gated += 1;
            return Ok(false);
        }

        if let Err(e) = self.frer.replicate(self.iface, &mut frame) {
            warn!(iface = %self.iface, "Sending frame without redundancy tag: {e}");
            self.stats.untagged += 1;
        }

        self.driver.transmit(frame).map_err(PortError::Driver)?;
        self.stats.transmitted += 1;

        Ok(true)
    }

    /// Receives a frame: returns it with its redundancy tag removed, or `None` if it's a
    /// duplicate of a frame already received.
    pub fn receive(&mut self, mut frame: Frame) -> Option<Frame> {
        if !self.frer.eliminate(self.iface, &frame) {
            self.stats.duplicates += 1;
            return None;
        }

        if let Some(tag) = frame.strip_rtag() {
            debug!(iface = %self.iface, seq = tag.seq(), "Accepted tagged frame");
        }

        self.stats.received += 1;

        Some(frame)
    }

    pub fn iface(&self) -> InterfaceId {
        self.iface
    }

    pub fn stats(&self) -> PortStats {
        self.stats
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
