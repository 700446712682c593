//! Demo leaf apps and the tree the simulator runs.

use log::warn;
use watchflow::app_state::{
    AlertSlot, AltViewSlot, HomeSlot, LeafSlot, MenuSlot, ScheduleSlot,
};
use watchflow::apps::{
    Agenda, AlertGate, AltView, App, AppState, Home, Menu, Timer, present,
};
use watchflow::framebuffer::FrameBuffer;
use watchflow::ui::{Entry, Padding, TextSize};
use watchflow::watch::Watch;
use watchflow::watch::platform::{Panel, Refresh};

/// URL the demo schedule server answers on.
pub const AGENDA_URL: &str = "http://sim.local/agenda";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ---------------------------------------------------------------------------
// Clock face
// ---------------------------------------------------------------------------

/// Date and battery along the top, the time in the middle, sync status below.
pub struct ClockFace;

impl<D: Panel> App<D> for ClockFace {
    fn show(
        &mut self,
        watch: &mut Watch<'_>,
        display: &mut D,
        refresh: Refresh,
    ) -> Result<AppState, D::Error> {
        let now = watch.local_time();
        let ink = watch.palette().foreground;
        let ui = watch.layout();

        let month = MONTHS
            .get(usize::from(now.month).saturating_sub(1))
            .copied()
            .unwrap_or("???");
        let header = ui.columns(&[
            Entry::fixed(ui.fmt(
                format_args!("{} {} {}", now.weekday().short_name(), now.day, month),
                TextSize::Medium,
                ink,
            )),
            Entry::stretch(ui.right_align(ui.fmt(
                format_args!("{}%", watch.battery_percent()),
                TextSize::Medium,
                ink,
            ))),
        ]);

        let synced = watch.last_successful_fetch();
        let footer = if synced == 0 {
            ui.text("never synced", TextSize::Small, ink)
        } else {
            let at = watch.to_local(synced);
            ui.fmt(
                format_args!("synced {}:{:02}", at.hour12(), at.minute),
                TextSize::Small,
                ink,
            )
        };

        let screen = ui.rows(&[
            Entry::fixed(ui.pad(header, Padding::all(4))),
            Entry::stretch(ui.center(ui.fmt(
                format_args!("{:02}:{:02}", now.hour, now.minute),
                TextSize::Large,
                ink,
            ))),
            Entry::fixed(ui.pad(ui.hcenter(footer), Padding::all(4))),
        ]);
        present(watch, display, screen, refresh)?;
        Ok(AppState::Active)
    }
}

// ---------------------------------------------------------------------------
// About
// ---------------------------------------------------------------------------

/// Device diagnostics, including the largest arena use seen since boot.
pub struct About {
    slot: LeafSlot,
}

impl About {
    pub fn new(slot: LeafSlot) -> Self {
        Self { slot }
    }
}

impl<D: Panel> App<D> for About {
    fn show(
        &mut self,
        watch: &mut Watch<'_>,
        display: &mut D,
        refresh: Refresh,
    ) -> Result<AppState, D::Error> {
        let arena = watch.arena();
        let leaf = watch.state().leaf(self.slot);
        let peak = leaf.load::<u32>().max(arena.used() as u32);
        if let Err(e) = leaf.store(&peak) {
            warn!("About state not saved: {}", e);
        }

        let ink = watch.palette().foreground;
        let ui = watch.layout();
        let small = TextSize::Small;
        let remaining = arena.capacity().saturating_sub(peak as usize);
        let screen = ui.pad(
            ui.rows(&[
                Entry::fixed(ui.fmt(format_args!("batt:       {:.2} V", watch.battery_voltage()), small, ink)),
                Entry::fixed(ui.fmt(format_args!("time:       {}", watch.unix_time()), small, ink)),
                Entry::fixed(ui.fmt(format_args!("last fetch: {}", watch.last_successful_fetch()), small, ink)),
                Entry::fixed(ui.fmt(format_args!("wakeup:     {:?}", watch.wake_reason()), small, ink)),
                Entry::fixed(ui.fmt(format_args!("arena peak: {}", peak), small, ink)),
                Entry::fixed(ui.fmt(format_args!("remaining:  {}", remaining), small, ink)),
            ]),
            Padding::all(4),
        );
        present(watch, display, screen, refresh)?;
        Ok(AppState::Active)
    }

    fn reset(&mut self, watch: &mut Watch<'_>) {
        watch.state().leaf(self.slot).clear();
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

pub type DemoTree = AlertGate<Home<AltView<ClockFace, About>, Menu<FrameBuffer>>>;

/// Face with an about screen behind select, and a menu of tools.
pub fn build() -> DemoTree {
    let tools = Menu::new(MenuSlot::new(1), "Tools").with_item("About", About::new(LeafSlot::new(2)));
    let menu = Menu::new(MenuSlot::new(0), "Menu")
        .with_item("Timer", Timer::new(LeafSlot::new(0)))
        .with_item("Agenda", Agenda::new(ScheduleSlot::new(0), AGENDA_URL))
        .with_submenu("Tools", tools);
    let face = AltView::new(AltViewSlot::new(0), ClockFace, About::new(LeafSlot::new(1)));
    AlertGate::new(AlertSlot::new(0), Home::new(HomeSlot::new(0), face, menu))
}
