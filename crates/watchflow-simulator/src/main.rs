//! Desktop simulator for the watchflow app framework.
//!
//! Runs the demo app tree through the real wake cycle, drawing into an SDL2
//! window via `embedded-graphics-simulator`. Every key press is one wake,
//! exactly as a button press would be on the device, and a clock wake fires
//! on each real minute boundary.
//!
//! # Key bindings
//!
//! | Key       | Action                                   |
//! |-----------|------------------------------------------|
//! | Return    | Bottom-left button                       |
//! | Backspace | Top-left button                          |
//! | Up        | Top-right button                         |
//! | Down      | Bottom-right button                      |
//! | T         | Advance the clock one minute and tick    |
//! | F         | Force a network fetch                    |
//! | N         | Toggle the simulated network             |
//! | R         | Cold boot                                |
//! | Q / Esc   | Quit                                     |
//!
//! # Environment
//!
//! `WATCHFLOW_DARK=1` inverts the palette, `WATCHFLOW_LAYOUT=right` puts
//! select and back on the right, and `WATCHFLOW_TZ` sets the default UTC
//! offset in seconds.

mod demo;

use std::fmt::Write as _;
use std::mem::MaybeUninit;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    sdl2::Keycode,
};
use log::{error, info};

use watchflow::app_state::RetainedState;
use watchflow::arena::{ARENA_BYTES, Arena};
use watchflow::config::{ButtonLayout, Settings, WifiNetwork};
use watchflow::framebuffer::FrameBuffer;
use watchflow::watch::lifecycle::wake;
use watchflow::watch::platform::{
    NetworkClient, NetworkError, PhysicalButton, Platform, WakeCause,
};
use watchflow::watch::time::DateTime;

use demo::DemoTree;

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

const DISPLAY_SIZE: Size = Size::new(200, 200);

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Event polling interval.
const FRAME_DURATION: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// Simulated board
// ---------------------------------------------------------------------------

fn system_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Answers schedule requests with a few alarms a couple of minutes out.
struct DemoServer;

impl NetworkClient for DemoServer {
    fn request(&mut self, url: &str, buf: &mut [u8]) -> Result<usize, NetworkError> {
        if url != demo::AGENDA_URL {
            return Err(NetworkError::Status(404));
        }

        let minute = system_now() / 60 * 60;
        let mut body = String::from("# demo schedule\n");
        for (offset, summary) in [(2, "Stand-up"), (5, "Coffee"), (90, "Review")] {
            let _ = writeln!(body, "{} {}", minute + offset * 60, summary);
        }

        let bytes = body.as_bytes();
        let Some(dest) = buf.get_mut(..bytes.len()) else {
            return Err(NetworkError::BufferTooSmall {
                capacity: buf.len(),
            });
        };
        dest.copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

struct SimBoard {
    cause: WakeCause,
    /// Seconds the simulated RTC runs ahead of the host clock.
    skew: i64,
    panel: FrameBuffer,
    online: bool,
    server: DemoServer,
}

impl SimBoard {
    fn now(&self) -> i64 {
        system_now() + self.skew
    }
}

impl Platform for SimBoard {
    type Display = FrameBuffer;

    fn wake_cause(&mut self) -> WakeCause {
        self.cause
    }

    fn read_clock(&mut self) -> DateTime {
        DateTime::from_unix(self.now())
    }

    fn set_clock(&mut self, utc: DateTime) {
        self.skew = utc.to_unix() - system_now();
    }

    fn battery_voltage(&mut self) -> f32 {
        // Drains slowly over an hour of simulated time, then starts over.
        4.2 - (self.now() % 3600) as f32 / 3600.0
    }

    fn vibrate(&mut self, interval_ms: u8, pulses: u8) {
        info!("Bzzt: {} pulses of {} ms", pulses, interval_ms);
    }

    fn connect(&mut self, network: &WifiNetwork<'_>) -> bool {
        info!(
            "Joining {}: {}",
            network.ssid,
            if self.online { "ok" } else { "unreachable" }
        );
        self.online
    }

    fn sync_time(&mut self) -> Option<DateTime> {
        self.online.then(|| DateTime::from_unix(system_now()))
    }

    fn disconnect(&mut self) {
        info!("Network down");
    }

    fn display(&mut self) -> &mut FrameBuffer {
        &mut self.panel
    }

    fn network(&mut self) -> &mut dyn NetworkClient {
        &mut self.server
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// The board plus everything that survives deep sleep.
struct Device {
    board: SimBoard,
    app: DemoTree,
    settings: Settings<'static>,
    state: RetainedState,
    arena: Vec<MaybeUninit<u8>>,
}

impl Device {
    fn wake(&mut self, cause: WakeCause) {
        self.board.cause = cause;
        let mut arena = Arena::new(&mut self.arena);
        match wake(
            &mut self.board,
            &mut self.app,
            &self.settings,
            &mut self.state,
            &mut arena,
        ) {
            Ok(report) => info!(
                "{:?}: ticked={} fetch={:?} arena={}B",
                report.cause, report.ticked, report.fetch, report.arena_used
            ),
            Err(e) => error!("Wake failed: {}", e),
        }
    }
}

fn settings_from_env() -> Settings<'static> {
    let mut settings = Settings::new()
        .with_fetch_interval(15 * 60)
        .with_network("simnet", "simulator");

    if std::env::var("WATCHFLOW_DARK").is_ok_and(|v| v == "1") {
        settings = settings.with_dark_mode(true);
    }
    if std::env::var("WATCHFLOW_LAYOUT").is_ok_and(|v| v.eq_ignore_ascii_case("right")) {
        settings = settings.with_button_layout(ButtonLayout::SelectBackRight);
    }
    if let Some(offset) = std::env::var("WATCHFLOW_TZ")
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
    {
        settings = settings.with_timezone_offset(offset);
    }
    settings
}

fn keycode_to_button(keycode: Keycode) -> Option<PhysicalButton> {
    match keycode {
        Keycode::Return | Keycode::KpEnter => Some(PhysicalButton::Menu),
        Keycode::Backspace => Some(PhysicalButton::Back),
        Keycode::Up => Some(PhysicalButton::Up),
        Keycode::Down => Some(PhysicalButton::Down),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting watchflow simulator");
    info!("Keys: Return/Backspace/Up/Down=buttons  T=tick  F=fetch  N=network  R=reboot  Q=quit");

    let mut display = SimulatorDisplay::<BinaryColor>::new(DISPLAY_SIZE);
    let output_settings = OutputSettingsBuilder::new()
        .scale(WINDOW_SCALE)
        .theme(BinaryColorTheme::LcdWhite)
        .build();
    let mut window = Window::new("Watchflow Simulator", &output_settings);

    let mut device = Device {
        board: SimBoard {
            cause: WakeCause::ColdBoot,
            skew: 0,
            panel: FrameBuffer::new(DISPLAY_SIZE),
            online: true,
            server: DemoServer,
        },
        app: demo::build(),
        settings: settings_from_env(),
        state: RetainedState::default(),
        arena: vec![MaybeUninit::uninit(); ARENA_BYTES],
    };

    device.wake(WakeCause::ColdBoot);
    let _ = device.board.panel.flush(&mut display);
    // The SDL window is created by the first update; events() needs it.
    window.update(&display);
    let mut last_minute = device.board.now() / 60;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown {
                    keycode,
                    repeat: false,
                    ..
                } => {
                    if let Some(button) = keycode_to_button(keycode) {
                        device.wake(WakeCause::Button(button));
                        continue;
                    }
                    match keycode {
                        Keycode::Q | Keycode::Escape => break 'running,
                        Keycode::T => {
                            device.board.skew += 60;
                            last_minute = device.board.now() / 60;
                            device.wake(WakeCause::Clock);
                        }
                        Keycode::F => {
                            device.state.lifecycle.fetch_tries = 0;
                            device.wake(WakeCause::Clock);
                        }
                        Keycode::N => {
                            device.board.online = !device.board.online;
                            info!("Network {}", if device.board.online { "on" } else { "off" });
                        }
                        Keycode::R => {
                            device.state = RetainedState::default();
                            device.board.skew = 0;
                            device.wake(WakeCause::ColdBoot);
                        }
                        _ => {}
                    }
                }

                _ => {}
            }
        }

        // --- RTC minute alarm ---------------------------------------------
        let minute = device.board.now() / 60;
        if minute != last_minute {
            last_minute = minute;
            device.wake(WakeCause::Clock);
        }

        // --- Render -------------------------------------------------------
        let _ = device.board.panel.flush(&mut display);
        window.update(&display);

        std::thread::sleep(FRAME_DURATION);
    }

    info!("Simulator exiting");
}
