use futures::{Future, FutureExt};
use parking_lot::Mutex;
use std::{
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, trace};

use tsn_common::{Clock, InterfaceId};

use super::scheduler::TasInstance;

/// The most entries a driver advances in one poll before yielding back to the runtime.
const MAX_TICKS_PER_POLL: usize = 64;

/// Drives the gate schedule of one interface: sleeps until the current entry's deadline, then
/// advances the schedule and sleeps again.
///
/// A driver is bound to the epoch of the enable that spawned it. Once the instance moves on to
/// another epoch (disable, re-enable, re-init) or is dropped, the driver exits at its next wakeup
/// without touching the schedule.
pub(crate) struct CycleDriver {
    iface: InterfaceId,
    epoch: u64,
    instance: Weak<Mutex<TasInstance>>,
    clock: Arc<dyn Clock>,
    /// Pinned because `Sleep` is not `Unpin`.
    timeout: Pin<Box<Sleep>>,
}

impl CycleDriver {
    pub(crate) fn new(
        iface: InterfaceId,
        epoch: u64,
        instance: Weak<Mutex<TasInstance>>,
        clock: Arc<dyn Clock>,
        deadline_ns: u64,
    ) -> Self {
        let delay = Duration::from_nanos(deadline_ns.saturating_sub(clock.now_ns()));
        Self { iface, epoch, instance, clock, timeout: Box::pin(sleep(delay)) }
    }
}

impl Future for CycleDriver {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        for _ in 0..MAX_TICKS_PER_POLL {
            if this.timeout.poll_unpin(cx).is_pending() {
                return Poll::Pending;
            }

            let Some(instance) = this.instance.upgrade() else {
                debug!(iface = %this.iface, "TAS instance dropped, stopping cycle driver");
                return Poll::Ready(());
            };

            let now = this.clock.now_ns();
            let Some(deadline) = instance.lock().on_timer(this.epoch, now) else {
                debug!(iface = %this.iface, epoch = this.epoch, "Stale cycle driver, stopping");
                return Poll::Ready(());
            };

            trace!(iface = %this.iface, deadline, "Gate entry advanced");

            let delay = Duration::from_nanos(deadline.saturating_sub(now));
            this.timeout.as_mut().reset(Instant::now() + delay);
        }

        // Still behind after a full batch of entries, let other tasks run first.
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
