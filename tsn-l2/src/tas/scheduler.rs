use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};

use tsn_common::{
    constants::NUM_TRAFFIC_CLASSES, Clock, InstanceRegistry, InterfaceId, MonotonicClock,
};

use super::{
    cycle::Cycle,
    driver::CycleDriver,
    gcl::GateControlList,
    stats::{GateCounters, TasStats},
    TasError, TasOptions,
};

/// TAS state of one interface.
#[derive(Debug)]
pub(crate) struct TasInstance {
    iface: InterfaceId,
    /// The configured schedule. Only read by [`Tas::enable`].
    admin: Option<GateControlList>,
    /// The running schedule. Kept after a disable so its last position can still be inspected.
    oper: Option<Cycle>,
    gate_enabled: bool,
    /// Bumped whenever the running schedule is invalidated. Drivers and ticks from an older
    /// epoch are ignored.
    epoch: u64,
    driver: Option<JoinHandle<()>>,
    counters: GateCounters,
}

impl TasInstance {
    fn new(iface: InterfaceId) -> Self {
        Self {
            iface,
            admin: None,
            oper: None,
            gate_enabled: false,
            epoch: 0,
            driver: None,
            counters: GateCounters::default(),
        }
    }

    /// Back to the freshly initialized state. The epoch keeps counting.
    fn reset(&mut self) {
        self.stop();
        self.admin = None;
        self.oper = None;
        self.counters = GateCounters::default();
    }

    /// Stops the running schedule, if any, and opens every gate.
    fn stop(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.gate_enabled = false;

        if let Some(driver) = self.driver.take() {
            debug!(iface = %self.iface, epoch = self.epoch, "Stopping cycle driver");
            driver.abort();
        }

        if let Some(cycle) = self.oper.as_mut() {
            cycle.open_all();
        }
    }

    /// Advances the running schedule if it still belongs to `epoch`. Returns the next deadline.
    pub(crate) fn on_timer(&mut self, epoch: u64, now_ns: u64) -> Option<u64> {
        if epoch != self.epoch || !self.gate_enabled {
            return None;
        }

        self.oper.as_mut().map(|cycle| cycle.advance(now_ns))
    }

    fn is_gate_open(&self, tc: usize) -> bool {
        if tc >= NUM_TRAFFIC_CLASSES || !self.gate_enabled {
            return true;
        }

        self.oper.as_ref().map_or(true, |cycle| cycle.states()[tc])
    }

    fn gate_states(&self) -> [bool; NUM_TRAFFIC_CLASSES] {
        match self.oper.as_ref() {
            Some(cycle) if self.gate_enabled => cycle.states(),
            _ => [true; NUM_TRAFFIC_CLASSES],
        }
    }
}

/// The Time-Aware Shaper. Holds one instance per initialized interface.
///
/// Configuration calls, gate lookups and schedule ticks of an interface all serialize on that
/// interface's lock, so a lookup always sees a complete entry transition.
#[derive(Debug)]
pub struct Tas {
    options: TasOptions,
    instances: InstanceRegistry<TasInstance>,
    clock: Arc<dyn Clock>,
}

impl Default for Tas {
    fn default() -> Self {
        Self::new()
    }
}

impl Tas {
    /// Creates a scheduler with the default [`TasOptions`].
    pub fn new() -> Self {
        Self::with_options(TasOptions::default())
    }

    pub fn with_options(options: TasOptions) -> Self {
        Self {
            instances: InstanceRegistry::new(options.max_interfaces),
            options,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Sets the clock cycle anchors and deadlines are taken from.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates the TAS instance of `iface`, or resets it if it already exists: no schedule
    /// configured, scheduler disabled, every gate open.
    pub fn init(&self, iface: InterfaceId) -> Result<(), TasError> {
        let (instance, created) = self
            .instances
            .get_or_insert_with(iface, || TasInstance::new(iface))
            .map_err(|e| {
                warn!(%iface, capacity = e.capacity, "No free TAS instance slot");
                TasError::InvalidArgument("no free instance slot for interface")
            })?;

        if !created {
            instance.lock().reset();
        }

        info!(%iface, "IEEE 802.1Qbv TAS initialized");

        Ok(())
    }

    /// Stops the schedule of `iface` and drops its instance. Returns `false` if the interface
    /// wasn't initialized.
    pub fn remove(&self, iface: InterfaceId) -> bool {
        let Some(instance) = self.instances.remove(iface) else {
            return false;
        };

        instance.lock().stop();
        info!(%iface, "IEEE 802.1Qbv TAS removed");

        true
    }

    /// Replaces the administrative gate control list of `iface`. The running schedule is not
    /// affected until the next [`Tas::enable`].
    pub fn configure_gates(
        &self,
        iface: InterfaceId,
        gcl: GateControlList,
    ) -> Result<(), TasError> {
        let instance = self.instance(iface)?;

        if let Err(e) = gcl.validate() {
            warn!(
                %iface,
                entries = gcl.len(),
                cycle_time = gcl.cycle_time_ns,
                "Rejected gate control list: {e}"
            );
            return Err(e);
        }

        let (entries, cycle_time) = (gcl.len(), gcl.cycle_time_ns);

        // Release the previous list outside the lock.
        let previous = instance.lock().admin.replace(gcl);
        drop(previous);

        info!(%iface, entries, cycle_time, "Configured gate control list");

        Ok(())
    }

    /// The administrative gate control list of `iface`, if one is configured.
    pub fn admin_gcl(&self, iface: InterfaceId) -> Option<GateControlList> {
        self.instances.get(iface)?.lock().admin.clone()
    }

    /// Starts or stops the gate schedule of `iface`.
    ///
    /// Enabling promotes a copy of the administrative list to the operational one and starts a
    /// new cycle at the current time with entry 0 in effect, restarting the schedule if it was
    /// already running. Disabling stops the schedule and opens every gate. Disabling a stopped
    /// schedule does nothing.
    pub fn enable(&self, iface: InterfaceId, enable: bool) -> Result<(), TasError> {
        let instance = self.instance(iface)?;
        let mut state = instance.lock();

        if !enable {
            if state.gate_enabled {
                state.stop();
                info!(%iface, "Gate schedule disabled, all gates open");
            }

            return Ok(());
        }

        let Some(admin) = state.admin.as_ref() else {
            warn!(%iface, "Can't enable TAS without a gate control list");
            return Err(TasError::InvalidArgument("no gate control list configured"));
        };

        let runtime = if self.options.autonomous {
            Some(Handle::try_current().map_err(|_| TasError::NoRuntime)?)
        } else {
            None
        };

        let now = self.clock.now_ns();
        let cycle = Cycle::start(admin, now)?;
        let (entries, deadline) = (cycle.len(), cycle.deadline_ns());

        state.stop();
        state.oper = Some(cycle);
        state.gate_enabled = true;

        if let Some(runtime) = runtime {
            let driver = CycleDriver::new(
                iface,
                state.epoch,
                Arc::downgrade(&instance),
                Arc::clone(&self.clock),
                deadline,
            );

            state.driver = Some(runtime.spawn(driver));
        }

        info!(%iface, entries, epoch = state.epoch, "Gate schedule enabled");

        Ok(())
    }

    /// Advances the schedule of `iface` to its next entry and returns the deadline of that entry.
    /// Returns `None` if the schedule isn't running.
    ///
    /// Meant for hosts that drive the schedule from their own timer (see
    /// [`TasOptions::autonomous`]). Calling it at each returned deadline walks the cycle.
    /// Fails with [`TasError::InvalidArgument`] if schedules are advanced by a background task.
    pub fn tick(&self, iface: InterfaceId) -> Result<Option<u64>, TasError> {
        if self.options.autonomous {
            warn!(%iface, "Manual tick on an autonomously driven schedule");
            return Err(TasError::InvalidArgument("schedule is driven autonomously"));
        }

        let instance = self.instance(iface)?;
        let mut state = instance.lock();

        let epoch = state.epoch;
        let next = state.on_timer(epoch, self.clock.now_ns());
        if let Some(deadline) = next {
            debug!(%iface, deadline, "Gate schedule ticked");
        }

        Ok(next)
    }

    /// When the current entry of the running schedule ends, in clock nanoseconds.
    pub fn next_deadline(&self, iface: InterfaceId) -> Option<u64> {
        let instance = self.instances.get(iface)?;
        let state = instance.lock();

        state.oper.as_ref().filter(|_| state.gate_enabled).map(Cycle::deadline_ns)
    }

    /// Returns `true` if frames of traffic class `tc` may be transmitted on `iface` right now.
    ///
    /// Unknown traffic classes, uninitialized interfaces and disabled schedules are always open.
    pub fn is_gate_open(&self, iface: InterfaceId, tc: u8) -> bool {
        self.instances.get(iface).map_or(true, |instance| instance.lock().is_gate_open(tc as usize))
    }

    /// Like [`Tas::is_gate_open`], but also counts the frame as transmitted or dropped.
    pub fn admit(&self, iface: InterfaceId, tc: u8) -> bool {
        let Some(instance) = self.instances.get(iface) else {
            return true;
        };

        let mut state = instance.lock();
        let tc = tc as usize;
        let open = state.is_gate_open(tc);

        if tc < NUM_TRAFFIC_CLASSES {
            state.counters.record(tc, open);
        }

        open
    }

    /// A snapshot of the gate states of `iface`. All open if the schedule isn't running.
    pub fn get_gate_states(&self, iface: InterfaceId) -> [bool; NUM_TRAFFIC_CLASSES] {
        self.instances
            .get(iface)
            .map_or([true; NUM_TRAFFIC_CLASSES], |instance| instance.lock().gate_states())
    }

    pub fn get_stats(&self, iface: InterfaceId) -> Result<TasStats, TasError> {
        let instance = self.instance(iface)?;
        let state = instance.lock();
        let oper = state.oper.as_ref();

        Ok(TasStats {
            gate_enabled: state.gate_enabled,
            gate_states: state.gate_states(),
            current_entry_index: oper.map_or(0, Cycle::index),
            cycle_start_time_ns: oper.map_or(0, Cycle::cycle_start_ns),
            cycle_count: oper.map_or(0, Cycle::cycle_count),
            admin_entries: state.admin.as_ref().map_or(0, GateControlList::len),
            oper_entries: oper.map_or(0, Cycle::len),
            counters: state.counters,
        })
    }

    /// Returns the initialized interfaces.
    pub fn interfaces(&self) -> Vec<InterfaceId> {
        self.instances.interfaces()
    }

    fn instance(&self, iface: InterfaceId) -> Result<Arc<Mutex<TasInstance>>, TasError> {
        self.instances.get(iface).ok_or(TasError::InvalidArgument("interface not initialized"))
    }
}
