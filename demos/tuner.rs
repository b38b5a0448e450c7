//! A simulated radio tuner driving its tune and seek operations through a
//! delayed executor. Logs at `info` by default; set `RUST_LOG=debug` for executor internals.

use delayed_worker::prelude::*;
use env_logger::Env;
use log::info;
use parking_lot::Mutex;
use std::sync::{mpsc, Arc, Weak};
use std::thread;
use std::time::Duration;

const TUNE_DELAY: Duration = Duration::from_millis(30);
const SEEK_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
enum TuneEvent {
    SignalAcquired(u32),
    Tuned(u32),
    Failed(u32, &'static str),
}

struct Tuner {
    executor: DelayedExecutor,
    current: Mutex<Option<u32>>,
    events: mpsc::Sender<TuneEvent>,
}

impl Tuner {
    fn new(events: mpsc::Sender<TuneEvent>) -> Result<Arc<Self>> {
        let config = Config::builder()
            .thread_name("tuner")
            .shutdown_policy(ShutdownPolicy::CancelPending)
            .build()?;

        Ok(Arc::new(Self {
            executor: DelayedExecutor::with_config(config)?,
            current: Mutex::new(None),
            events,
        }))
    }

    /// Tuning happens in two delayed steps; the first schedules the second.
    fn tune(self: &Arc<Self>, frequency_khz: u32) -> Result<()> {
        self.executor.cancel_all();

        let tuner = Arc::downgrade(self);
        let events = self.events.clone();
        let on_canceled = self.canceled_reporter(frequency_khz);
        self.executor.schedule_with_cancel(
            move || {
                let _ = events.send(TuneEvent::SignalAcquired(frequency_khz));
                if let Some(tuner) = tuner.upgrade() {
                    let _ = tuner.finish_tune(frequency_khz);
                }
            },
            on_canceled,
            TUNE_DELAY,
        )?;
        Ok(())
    }

    fn finish_tune(self: &Arc<Self>, frequency_khz: u32) -> Result<()> {
        let tuner: Weak<Self> = Arc::downgrade(self);
        let on_canceled = self.canceled_reporter(frequency_khz);
        self.executor.schedule_with_cancel(
            move || {
                if let Some(tuner) = tuner.upgrade() {
                    *tuner.current.lock() = Some(frequency_khz);
                    let _ = tuner.events.send(TuneEvent::Tuned(frequency_khz));
                }
            },
            on_canceled,
            TUNE_DELAY,
        )?;
        Ok(())
    }

    fn seek(self: &Arc<Self>, from_khz: u32) -> Result<()> {
        self.executor.cancel_all();
        self.tune_after(from_khz + 200, SEEK_DELAY)
    }

    fn tune_after(self: &Arc<Self>, frequency_khz: u32, delay: Duration) -> Result<()> {
        let tuner = Arc::downgrade(self);
        let on_canceled = self.canceled_reporter(frequency_khz);
        self.executor.schedule_with_cancel(
            move || {
                if let Some(tuner) = tuner.upgrade() {
                    let _ = tuner.tune(frequency_khz);
                }
            },
            on_canceled,
            delay,
        )?;
        Ok(())
    }

    fn cancel(&self) -> usize {
        self.executor.cancel_all()
    }

    fn canceled_reporter(&self, frequency_khz: u32) -> impl FnOnce() + Send + 'static {
        let events = self.events.clone();
        move || {
            let _ = events.send(TuneEvent::Failed(frequency_khz, "canceled"));
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .try_init()
        .ok();

    let (tx, rx) = mpsc::channel();
    let tuner = Tuner::new(tx)?;

    tuner.tune(98_100)?;
    for _ in 0..2 {
        info!("{:?}", rx.recv_timeout(Duration::from_secs(1)));
    }

    // a seek that gets interrupted before it lands
    tuner.seek(98_100)?;
    thread::sleep(Duration::from_millis(50));
    info!("canceled {} pending operations", tuner.cancel());
    info!("{:?}", rx.recv_timeout(Duration::from_secs(1)));

    info!("current station: {:?} kHz", *tuner.current.lock());
    info!("{:#?}", tuner.executor.metrics());
    Ok(())
}
