//! # Sysfs GPIO
//!
//! Button and LED adapters on top of the legacy `/sys/class/gpio` interface.
//!
//! Buttons are wired active-low with the pull-up enabled, so a pressed button
//! reads `0`. [`ButtonWatcher`] polls the pin and feeds the edges through a
//! [`PressTracker`], which is where press and hold detection actually lives.
//! Recent kernels number the header pins from a non-zero chip base; the
//! `gpio.base` setting is added to every pin number.

use crate::dispatch::EventClient;
use crate::hardware::{HardwareError, Indicator};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default location of the sysfs GPIO class directory.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

const BLINK_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// One exported GPIO line.
#[derive(Debug, Clone)]
pub struct SysfsPin {
    root: PathBuf,
    number: u32,
}

impl SysfsPin {
    /// Exports the line if needed and sets its direction.
    pub fn export(
        root: impl Into<PathBuf>,
        number: u32,
        direction: Direction,
    ) -> Result<Self, HardwareError> {
        let pin = Self {
            root: root.into(),
            number,
        };
        if !pin.dir().exists() {
            fs::write(pin.root.join("export"), number.to_string()).map_err(|e| {
                HardwareError::Unavailable(format!("gpio{} export failed: {}", number, e))
            })?;
        }
        fs::write(pin.dir().join("direction"), direction.as_str())?;
        debug!(pin = number, direction = direction.as_str(), "GPIO exported");
        Ok(pin)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn read(&self) -> Result<bool, HardwareError> {
        let raw = fs::read_to_string(self.dir().join("value"))?;
        Ok(raw.trim() == "1")
    }

    pub fn write(&self, high: bool) -> Result<(), HardwareError> {
        fs::write(self.dir().join("value"), if high { "1" } else { "0" })?;
        Ok(())
    }

    fn dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.number))
    }
}

/// Status LED on a GPIO output.
///
/// Every pin write, including the blink task's toggles, happens under
/// `generation`. `on` and `off` bump it, and a blink task only writes while
/// the generation it was started with is current, so a toggle can never land
/// after a later `off`.
pub struct SysfsLed {
    pin: SysfsPin,
    generation: Arc<Mutex<u64>>,
    blinker: Option<JoinHandle<()>>,
}

impl SysfsLed {
    pub fn new(pin: SysfsPin) -> Self {
        Self {
            pin,
            generation: Arc::new(Mutex::new(0)),
            blinker: None,
        }
    }

    /// Retires any blink task and writes `level` in the same critical section.
    fn set(&mut self, level: bool) -> Result<(), HardwareError> {
        let result = {
            let mut generation = lock(&self.generation);
            *generation += 1;
            self.pin.write(level)
        };
        self.stop_blinking();
        result
    }

    fn stop_blinking(&mut self) {
        if let Some(task) = self.blinker.take() {
            task.abort();
        }
    }
}

fn lock(generation: &Mutex<u64>) -> MutexGuard<'_, u64> {
    generation.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Indicator for SysfsLed {
    fn on(&mut self) -> Result<(), HardwareError> {
        self.set(true)
    }

    fn off(&mut self) -> Result<(), HardwareError> {
        self.set(false)
    }

    fn blink(&mut self) -> Result<(), HardwareError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| HardwareError::Unavailable(format!("blink needs a runtime: {}", e)))?;
        let started = {
            let mut generation = lock(&self.generation);
            *generation += 1;
            *generation
        };
        self.stop_blinking();

        let pin = self.pin.clone();
        let generation = self.generation.clone();
        self.blinker = Some(runtime.spawn(async move {
            let mut lit = false;
            let mut ticker = tokio::time::interval(BLINK_PERIOD);
            loop {
                ticker.tick().await;
                let written = {
                    let current = lock(&generation);
                    if *current != started {
                        return;
                    }
                    lit = !lit;
                    pin.write(lit)
                };
                if let Err(e) = written {
                    warn!(pin = pin.number(), error = %e, "LED blink write failed");
                    return;
                }
            }
        }));
        Ok(())
    }
}

impl Drop for SysfsLed {
    fn drop(&mut self) {
        self.stop_blinking();
    }
}

/// What a button did between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Held(Duration),
}

/// Edge and hold detection over a stream of pin samples.
///
/// A hold is reported once per press, as soon as the button has been down
/// for at least `hold_time`.
#[derive(Debug, Clone)]
pub struct PressTracker {
    hold_time: Option<Duration>,
    pressed_since: Option<Instant>,
    hold_reported: bool,
}

impl PressTracker {
    pub fn new(hold_time: Option<Duration>) -> Self {
        Self {
            hold_time,
            pressed_since: None,
            hold_reported: false,
        }
    }

    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<ButtonEdge> {
        match (pressed, self.pressed_since) {
            (true, None) => {
                self.pressed_since = Some(now);
                self.hold_reported = false;
                Some(ButtonEdge::Pressed)
            }
            (true, Some(since)) => {
                let held = now.saturating_duration_since(since);
                match self.hold_time {
                    Some(hold_time) if !self.hold_reported && held >= hold_time => {
                        self.hold_reported = true;
                        Some(ButtonEdge::Held(held))
                    }
                    _ => None,
                }
            }
            (false, _) => {
                self.pressed_since = None;
                None
            }
        }
    }
}

/// What a watched button is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Every press starts a session.
    Shutter,
    /// Holding for the given time requests power-off.
    Power { hold_time: Duration },
}

/// Polls a button pin and delivers its edges as device events.
pub struct ButtonWatcher {
    pin: SysfsPin,
    role: ButtonRole,
    poll: Duration,
}

impl ButtonWatcher {
    pub fn new(pin: SysfsPin, role: ButtonRole, poll: Duration) -> Self {
        Self { pin, role, poll }
    }

    /// Spawns the polling task; it ends when the event channel closes.
    pub fn spawn(self, client: EventClient) -> JoinHandle<()> {
        tokio::spawn(self.run(client))
    }

    async fn run(self, client: EventClient) {
        let hold_time = match self.role {
            ButtonRole::Shutter => None,
            ButtonRole::Power { hold_time } => Some(hold_time),
        };
        let mut tracker = PressTracker::new(hold_time);
        let mut ticker = tokio::time::interval(self.poll);
        let mut read_failing = false;
        info!(pin = self.pin.number(), role = ?self.role, "Button watcher started");

        loop {
            ticker.tick().await;
            let pressed = match self.pin.read() {
                Ok(level) => {
                    read_failing = false;
                    !level
                }
                Err(e) => {
                    if !read_failing {
                        warn!(pin = self.pin.number(), error = %e, "Button read failed");
                        read_failing = true;
                    }
                    continue;
                }
            };

            let delivered = match (self.role, tracker.update(pressed, Instant::now())) {
                (ButtonRole::Shutter, Some(ButtonEdge::Pressed)) => client.shutter_pressed().await,
                (ButtonRole::Power { .. }, Some(ButtonEdge::Held(held))) => {
                    client.hold_confirmed(held).await
                }
                _ => Ok(()),
            };
            if delivered.is_err() {
                break;
            }
        }
        debug!(pin = self.pin.number(), "Button watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_pin(root: &std::path::Path, number: u32, value: &str) {
        let dir = root.join(format!("gpio{}", number));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("value"), value).unwrap();
        fs::write(dir.join("direction"), "in").unwrap();
    }

    #[test]
    fn press_is_reported_once_per_edge() {
        let start = Instant::now();
        let mut tracker = PressTracker::new(None);
        assert_eq!(tracker.update(false, start), None);
        assert_eq!(tracker.update(true, start), Some(ButtonEdge::Pressed));
        assert_eq!(tracker.update(true, start + Duration::from_secs(5)), None);
        assert_eq!(tracker.update(false, start + Duration::from_secs(6)), None);
        assert_eq!(
            tracker.update(true, start + Duration::from_secs(7)),
            Some(ButtonEdge::Pressed)
        );
    }

    #[test]
    fn hold_is_reported_after_hold_time() {
        let start = Instant::now();
        let mut tracker = PressTracker::new(Some(Duration::from_secs(2)));
        tracker.update(true, start);
        assert_eq!(tracker.update(true, start + Duration::from_millis(1900)), None);
        assert_eq!(
            tracker.update(true, start + Duration::from_millis(2000)),
            Some(ButtonEdge::Held(Duration::from_millis(2000)))
        );
        assert_eq!(tracker.update(true, start + Duration::from_secs(3)), None);
    }

    #[test]
    fn short_press_never_holds() {
        let start = Instant::now();
        let mut tracker = PressTracker::new(Some(Duration::from_secs(2)));
        tracker.update(true, start);
        tracker.update(false, start + Duration::from_secs(1));
        tracker.update(true, start + Duration::from_millis(1500));
        assert_eq!(tracker.update(true, start + Duration::from_millis(2500)), None);
    }

    #[test]
    fn pin_reads_and_writes_value_file() {
        let root = tempfile::tempdir().unwrap();
        fake_pin(root.path(), 20, "0\n");

        let pin = SysfsPin::export(root.path(), 20, Direction::Out).unwrap();
        assert!(!pin.read().unwrap());
        pin.write(true).unwrap();
        assert!(pin.read().unwrap());
        let direction = fs::read_to_string(root.path().join("gpio20/direction")).unwrap();
        assert_eq!(direction, "out");
    }

    #[test]
    fn unexported_pin_without_sysfs_fails() {
        let root = tempfile::tempdir().unwrap();
        let result = SysfsPin::export(root.path().join("missing"), 4, Direction::In);
        assert!(matches!(result, Err(HardwareError::Unavailable(_))));
    }

    #[tokio::test]
    async fn led_on_off_and_blink() {
        let root = tempfile::tempdir().unwrap();
        fake_pin(root.path(), 21, "0");
        let pin = SysfsPin::export(root.path(), 21, Direction::Out).unwrap();
        let mut led = SysfsLed::new(pin.clone());

        led.on().unwrap();
        assert!(pin.read().unwrap());

        led.blink().unwrap();
        assert!(led.blinker.is_some());

        led.off().unwrap();
        assert!(led.blinker.is_none());
        assert!(!pin.read().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn off_after_blink_always_leaves_led_dark() {
        let root = tempfile::tempdir().unwrap();
        fake_pin(root.path(), 22, "0");
        let pin = SysfsPin::export(root.path(), 22, Direction::Out).unwrap();
        let mut led = SysfsLed::new(pin.clone());

        let mut lit_after_off = 0;
        for _ in 0..500 {
            led.blink().unwrap();
            for _ in 0..50 {
                std::hint::spin_loop();
            }
            led.off().unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
            if pin.read().unwrap() {
                lit_after_off += 1;
            }
        }
        assert_eq!(lit_after_off, 0);
    }

    #[tokio::test]
    async fn shutter_watcher_delivers_press() {
        let root = tempfile::tempdir().unwrap();
        fake_pin(root.path(), 16, "0");
        let pin = SysfsPin::export(root.path(), 16, Direction::In).unwrap();

        let (client, mut receiver) = crate::dispatch::EventClient::channel(4);
        let watcher = ButtonWatcher::new(pin, ButtonRole::Shutter, Duration::from_millis(5));
        let handle = watcher.spawn(client);

        let event = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("watcher should report the press");
        assert_eq!(event, Some(crate::dispatch::DeviceEvent::ShutterPressed));

        handle.abort();
    }
}
