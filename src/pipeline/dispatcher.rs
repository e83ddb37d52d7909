//! Main panel dispatcher - per-tick sampling and hook routing.
//!
//! Each tick, in order:
//!
//! 1. the panel's own update runs
//! 2. the sampler refreshes raw device state
//! 3. the raw pointer is mapped to panel-relative logical coordinates
//! 4. typed characters are drained into `on_key_press`
//! 5. button edges fire `on_mouse_down` / `on_mouse_press` / `on_mouse_release`
//!    when the pointer is inside, then `on_mouse_inside` fires unconditionally
//! 6. the wheel sum fires `on_mouse_scroll` when inside, and is reset either way
//!
//! Keyboard input and pointer presence are never gated by the bounds test.
//! The wheel counter is reset even when the pointer is outside, so a stale
//! sum can never fire later once the pointer moves in.

use spark_signals::{Signal, signal};
use tracing::{debug, trace};

use super::transform::to_logical;
use crate::host::{InputHost, InputListeners, ListenerId};
use crate::panel::Panel;
use crate::state::{
    ButtonEdge, CharQueue, CharSender, DeviceTracker, KeySampler, WheelAccumulator,
    WheelSender,
};
use crate::types::{DisplaySnapshot, LogicalPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Active(ListenerId),
    TornDown,
}

/// Samples input once per tick and routes it to a single panel.
pub struct MainPanelDispatcher<P, S = DeviceTracker> {
    panel: P,
    sampler: S,
    chars: CharQueue,
    wheel: WheelAccumulator,
    lifecycle: Lifecycle,
    pointer: Signal<LogicalPoint>,
    button: Signal<ButtonEdge>,
}

impl<P: Panel> MainPanelDispatcher<P, DeviceTracker> {
    /// Dispatcher tracking the left mouse button.
    pub fn new(panel: P) -> Self {
        Self::with_sampler(panel, DeviceTracker::default())
    }
}

impl<P: Panel, S: KeySampler> MainPanelDispatcher<P, S> {
    pub fn with_sampler(panel: P, sampler: S) -> Self {
        Self {
            panel,
            sampler,
            chars: CharQueue::new(),
            wheel: WheelAccumulator::new(),
            lifecycle: Lifecycle::Created,
            pointer: signal(LogicalPoint::default()),
            button: signal(ButtonEdge::empty()),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Register the sampler, character listener and wheel listener with the host.
    ///
    /// Calling this again while registered does nothing. A torn-down
    /// dispatcher cannot be initialized again.
    pub fn init<H: InputHost + ?Sized>(&mut self, host: &mut H) {
        match self.lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Active(id) => {
                debug!(?id, "dispatcher already initialized");
                return;
            }
            Lifecycle::TornDown => {
                debug!("dispatcher was torn down, not registering");
                return;
            }
        }

        let listeners = InputListeners {
            device: self.sampler.feed(),
            chars: self.chars.sender(),
            wheel: self.wheel.sender(),
        };
        let id = host.register(listeners);
        self.lifecycle = Lifecycle::Active(id);
        debug!(?id, bounds = ?self.panel.bounds(), "dispatcher initialized");
    }

    /// Deregister from the host and release the sampler.
    ///
    /// Safe to call more than once; only the first call has an effect.
    /// Anything still buffered is discarded and later ticks dispatch nothing.
    /// Senders obtained earlier report themselves disconnected.
    pub fn teardown<H: InputHost + ?Sized>(&mut self, host: &mut H) {
        match self.lifecycle {
            Lifecycle::TornDown => return,
            Lifecycle::Active(id) => host.deregister(id),
            Lifecycle::Created => {}
        }

        // Senders handed out earlier go dead along with the buffered input
        self.sampler.release();
        self.chars.disconnect();
        self.wheel.disconnect();
        self.lifecycle = Lifecycle::TornDown;
        debug!("dispatcher torn down");
    }

    pub fn is_active(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Active(_))
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle == Lifecycle::TornDown
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Run one tick against the host's current display geometry.
    pub fn tick_host<H: InputHost + ?Sized>(&mut self, host: &H) {
        let display = host.display();
        self.tick(&display);
    }

    /// Run one tick against an explicit display snapshot.
    pub fn tick(&mut self, display: &DisplaySnapshot) {
        self.panel.update();

        if self.is_torn_down() {
            return;
        }

        self.sampler.refresh();

        let point = to_logical(
            self.sampler.raw_pointer_position(),
            display,
            self.panel.bounds().origin(),
        );
        self.pointer.set(point);

        self.dispatch_keys();
        self.dispatch_buttons(point);
        self.dispatch_wheel(point);
    }

    fn dispatch_keys(&mut self) {
        for c in self.chars.drain() {
            self.panel.on_key_press(c);
        }
    }

    fn dispatch_buttons(&mut self, point: LogicalPoint) {
        let LogicalPoint { x, y } = point;
        self.button.set(self.sampler.edge());

        if self.sampler.is_down() && self.panel.is_point_inside(x, y) {
            self.panel.on_mouse_down(x, y);
        }
        if self.sampler.just_pressed() && self.panel.is_point_inside(x, y) {
            self.panel.on_mouse_press(x, y);
        }
        if self.sampler.just_released() && self.panel.is_point_inside(x, y) {
            self.panel.on_mouse_release(x, y);
        }

        // Fires even outside the bounds so drags can follow the pointer
        self.panel.on_mouse_inside(x, y);
    }

    fn dispatch_wheel(&mut self, point: LogicalPoint) {
        let delta = self.wheel.take();
        if delta == 0 {
            return;
        }

        let LogicalPoint { x, y } = point;
        if self.panel.is_point_inside(x, y) {
            trace!(delta, x, y, "dispatching wheel");
            self.panel.on_mouse_scroll(x, y, delta);
        } else {
            trace!(delta, "wheel outside panel, discarding");
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn into_panel(self) -> P {
        self.panel
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Logical pointer position as of the last tick.
    pub fn pointer(&self) -> Signal<LogicalPoint> {
        self.pointer.clone()
    }

    /// Edge state of the tracked button as of the last tick.
    pub fn button(&self) -> Signal<ButtonEdge> {
        self.button.clone()
    }

    /// A direct producer handle for typed characters.
    ///
    /// Detached once the dispatcher is torn down.
    pub fn char_sender(&self) -> CharSender {
        if self.is_torn_down() {
            return CharSender::detached();
        }
        self.chars.sender()
    }

    /// A direct producer handle for wheel rotation.
    pub fn wheel_sender(&self) -> WheelSender {
        if self.is_torn_down() {
            return WheelSender::detached();
        }
        self.wheel.sender()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::VirtualHost;
    use crate::state::{Key, MouseButton};
    use crate::types::{ConsoleConfig, PanelBounds};
    use std::cell::RefCell;
    use std::rc::Rc;

    const LEFT: Key = Key::Button(MouseButton::Left);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Update,
        Key(char),
        Down(i32, i32),
        Press(i32, i32),
        Release(i32, i32),
        Inside(i32, i32),
        Scroll(i32, i32, i32),
    }

    struct Recorder {
        bounds: PanelBounds,
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl Panel for Recorder {
        fn bounds(&self) -> PanelBounds {
            self.bounds
        }
        fn update(&mut self) {
            self.calls.borrow_mut().push(Call::Update);
        }
        fn on_key_press(&mut self, c: char) {
            self.calls.borrow_mut().push(Call::Key(c));
        }
        fn on_mouse_down(&mut self, x: i32, y: i32) {
            self.calls.borrow_mut().push(Call::Down(x, y));
        }
        fn on_mouse_press(&mut self, x: i32, y: i32) {
            self.calls.borrow_mut().push(Call::Press(x, y));
        }
        fn on_mouse_release(&mut self, x: i32, y: i32) {
            self.calls.borrow_mut().push(Call::Release(x, y));
        }
        fn on_mouse_inside(&mut self, x: i32, y: i32) {
            self.calls.borrow_mut().push(Call::Inside(x, y));
        }
        fn on_mouse_scroll(&mut self, x: i32, y: i32, delta: i32) {
            self.calls.borrow_mut().push(Call::Scroll(x, y, delta));
        }
    }

    /// Unit-scale host with a panel at (10, 10) sized 20x20.
    fn setup() -> (VirtualHost, MainPanelDispatcher<Recorder>, Rc<RefCell<Vec<Call>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let panel = Recorder {
            bounds: PanelBounds::new(10, 10, 20, 20),
            calls: calls.clone(),
        };
        let mut host = VirtualHost::new(ConsoleConfig::default(), 160, 160).unwrap();
        let mut dispatcher = MainPanelDispatcher::new(panel);
        dispatcher.init(&mut host);
        (host, dispatcher, calls)
    }

    fn take(calls: &Rc<RefCell<Vec<Call>>>) -> Vec<Call> {
        std::mem::take(&mut *calls.borrow_mut())
    }

    // -------------------------------------------------------------------------
    // Ordering and keyboard
    // -------------------------------------------------------------------------

    #[test]
    fn test_idle_tick_fires_update_then_inside() {
        let (host, mut dispatcher, calls) = setup();

        dispatcher.tick_host(&host);

        // Pointer at (0, 0) is (-10, -10) relative to the panel
        assert_eq!(take(&calls), vec![Call::Update, Call::Inside(-10, -10)]);
    }

    #[test]
    fn test_keys_delivered_in_order_once() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();

        feed.type_char('a');
        feed.type_char('b');
        feed.type_char('c');
        dispatcher.tick_host(&host);

        let keys: Vec<_> = take(&calls)
            .into_iter()
            .filter(|c| matches!(c, Call::Key(_)))
            .collect();
        assert_eq!(keys, vec![Call::Key('a'), Call::Key('b'), Call::Key('c')]);

        dispatcher.tick_host(&host);
        assert!(!take(&calls).iter().any(|c| matches!(c, Call::Key(_))));
    }

    #[test]
    fn test_keys_not_gated_by_pointer() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();

        feed.move_pointer(150, 150);
        feed.type_char('z');
        dispatcher.tick_host(&host);

        assert!(take(&calls).contains(&Call::Key('z')));
    }

    #[test]
    fn test_dispatch_order_within_tick() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();

        feed.move_pointer(15, 15);
        feed.type_char('k');
        feed.set_key(LEFT, true);
        feed.rotate_wheel(1);
        dispatcher.tick_host(&host);

        assert_eq!(
            take(&calls),
            vec![
                Call::Update,
                Call::Key('k'),
                Call::Down(5, 5),
                Call::Press(5, 5),
                Call::Inside(5, 5),
                Call::Scroll(5, 5, 1),
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Buttons
    // -------------------------------------------------------------------------

    #[test]
    fn test_press_hold_release_inside() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();
        feed.move_pointer(12, 14);

        feed.set_key(LEFT, true);
        dispatcher.tick_host(&host);
        assert_eq!(
            take(&calls),
            vec![Call::Update, Call::Down(2, 4), Call::Press(2, 4), Call::Inside(2, 4)]
        );

        dispatcher.tick_host(&host);
        dispatcher.tick_host(&host);
        let held = take(&calls);
        assert_eq!(held.iter().filter(|c| **c == Call::Down(2, 4)).count(), 2);
        assert!(!held.iter().any(|c| matches!(c, Call::Press(..) | Call::Release(..))));

        feed.set_key(LEFT, false);
        dispatcher.tick_host(&host);
        assert_eq!(
            take(&calls),
            vec![Call::Update, Call::Release(2, 4), Call::Inside(2, 4)]
        );
    }

    #[test]
    fn test_buttons_gated_outside_but_inside_hook_fires() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();
        feed.move_pointer(100, 5);

        feed.set_key(LEFT, true);
        dispatcher.tick_host(&host);
        feed.set_key(LEFT, false);
        dispatcher.tick_host(&host);

        assert_eq!(
            take(&calls),
            vec![
                Call::Update,
                Call::Inside(90, -5),
                Call::Update,
                Call::Inside(90, -5),
            ]
        );
    }

    #[test]
    fn test_drag_out_of_panel() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();

        feed.move_pointer(20, 20);
        feed.set_key(LEFT, true);
        dispatcher.tick_host(&host);
        take(&calls);

        // Still held, now outside: only the inside hook follows the pointer
        feed.move_pointer(60, 20);
        dispatcher.tick_host(&host);
        assert_eq!(take(&calls), vec![Call::Update, Call::Inside(50, 10)]);

        // Released outside: no release hook
        feed.set_key(LEFT, false);
        dispatcher.tick_host(&host);
        assert_eq!(take(&calls), vec![Call::Update, Call::Inside(50, 10)]);
    }

    #[test]
    fn test_other_buttons_ignored() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();
        feed.move_pointer(15, 15);

        feed.set_key(Key::Button(MouseButton::Right), true);
        feed.set_key(Key::Up, true);
        dispatcher.tick_host(&host);

        assert_eq!(take(&calls), vec![Call::Update, Call::Inside(5, 5)]);
        assert!(dispatcher.sampler().key(Key::Up).just_pressed());
    }

    // -------------------------------------------------------------------------
    // Wheel
    // -------------------------------------------------------------------------

    #[test]
    fn test_wheel_sum_dispatched_once() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();
        feed.move_pointer(15, 15);

        feed.rotate_wheel(1);
        feed.rotate_wheel(1);
        feed.rotate_wheel(-3);
        dispatcher.tick_host(&host);
        assert!(take(&calls).contains(&Call::Scroll(5, 5, -1)));

        dispatcher.tick_host(&host);
        assert!(!take(&calls).iter().any(|c| matches!(c, Call::Scroll(..))));
    }

    #[test]
    fn test_wheel_reset_outside_bounds() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();

        feed.move_pointer(100, 100);
        feed.rotate_wheel(5);
        dispatcher.tick_host(&host);
        assert!(!take(&calls).iter().any(|c| matches!(c, Call::Scroll(..))));

        // Moving inside does not resurrect the old sum
        feed.move_pointer(15, 15);
        dispatcher.tick_host(&host);
        assert!(!take(&calls).iter().any(|c| matches!(c, Call::Scroll(..))));
    }

    #[test]
    fn test_zero_wheel_sum_fires_nothing() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();
        feed.move_pointer(15, 15);

        feed.rotate_wheel(2);
        feed.rotate_wheel(-2);
        dispatcher.tick_host(&host);

        assert!(!take(&calls).iter().any(|c| matches!(c, Call::Scroll(..))));
    }

    // -------------------------------------------------------------------------
    // Display geometry
    // -------------------------------------------------------------------------

    #[test]
    fn test_scaled_display_scenario() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let panel = Recorder {
            bounds: PanelBounds::new(5, 5, 10, 10),
            calls: calls.clone(),
        };
        let mut dispatcher = MainPanelDispatcher::new(panel);
        let display = DisplaySnapshot::scaled(&ConsoleConfig::default(), 2, (10, 10)).unwrap();

        dispatcher.sampler.feed().move_pointer(25, 30);
        dispatcher.tick(&display);

        assert_eq!(take(&calls), vec![Call::Update, Call::Inside(2, 5)]);
        assert_eq!(dispatcher.pointer().get(), LogicalPoint::new(2, 5));
    }

    #[test]
    fn test_resize_between_ticks() {
        let (host, mut dispatcher, calls) = setup();
        let feed = host.handle();
        feed.move_pointer(40, 40);

        dispatcher.tick_host(&host);
        assert!(take(&calls).contains(&Call::Inside(30, 30)));

        // Same physical position, console now drawn at 2x
        feed.resize(320, 320).unwrap();
        dispatcher.tick_host(&host);
        assert!(take(&calls).contains(&Call::Inside(10, 10)));
    }

    #[test]
    fn test_signals_follow_ticks() {
        let (host, mut dispatcher, _calls) = setup();
        let pointer = dispatcher.pointer();
        let button = dispatcher.button();
        let feed = host.handle();

        feed.move_pointer(11, 12);
        feed.set_key(LEFT, true);
        dispatcher.tick_host(&host);

        assert_eq!(pointer.get(), LogicalPoint::new(1, 2));
        assert_eq!(button.get(), ButtonEdge::DOWN | ButtonEdge::PRESSED);

        dispatcher.tick_host(&host);
        assert_eq!(button.get(), ButtonEdge::DOWN);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[test]
    fn test_init_registers_once() {
        let (mut host, mut dispatcher, _calls) = setup();
        assert!(dispatcher.is_active());
        assert_eq!(host.listener_count(), 1);

        dispatcher.init(&mut host);
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_teardown_stops_events() {
        let (mut host, mut dispatcher, calls) = setup();
        let feed = host.handle();

        feed.type_char('a');
        feed.rotate_wheel(3);
        dispatcher.teardown(&mut host);
        assert_eq!(host.listener_count(), 0);
        assert!(dispatcher.is_torn_down());

        feed.type_char('b');
        feed.move_pointer(15, 15);
        feed.set_key(LEFT, true);
        dispatcher.tick_host(&host);

        // Only the panel's own update still runs
        assert_eq!(take(&calls), vec![Call::Update]);
    }

    #[test]
    fn test_senders_disconnected_after_teardown() {
        let (mut host, mut dispatcher, calls) = setup();
        let tx = dispatcher.char_sender();
        let wheel = dispatcher.wheel_sender();
        assert!(tx.push('x'));

        dispatcher.teardown(&mut host);

        assert!(!tx.is_connected());
        assert!(!tx.push('x'));
        assert!(!wheel.is_connected());
        assert!(!wheel.add(1));

        // Handles requested after teardown are dead too
        assert!(!dispatcher.char_sender().push('y'));
        assert!(!dispatcher.wheel_sender().add(1));

        dispatcher.tick_host(&host);
        assert_eq!(take(&calls), vec![Call::Update]);
    }

    #[test]
    fn test_teardown_twice_and_reinit_ignored() {
        let (mut host, mut dispatcher, _calls) = setup();

        dispatcher.teardown(&mut host);
        dispatcher.teardown(&mut host);
        dispatcher.init(&mut host);

        assert!(dispatcher.is_torn_down());
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_teardown_without_init() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let panel = Recorder {
            bounds: PanelBounds::new(0, 0, 1, 1),
            calls,
        };
        let mut host = VirtualHost::new(ConsoleConfig::default(), 160, 160).unwrap();
        let mut dispatcher = MainPanelDispatcher::new(panel);

        dispatcher.teardown(&mut host);
        assert!(dispatcher.is_torn_down());
    }

    #[test]
    fn test_direct_senders() {
        let (host, mut dispatcher, calls) = setup();
        host.handle().move_pointer(15, 15);

        dispatcher.char_sender().push('d');
        dispatcher.wheel_sender().add(-2);
        dispatcher.tick_host(&host);

        let got = take(&calls);
        assert!(got.contains(&Call::Key('d')));
        assert!(got.contains(&Call::Scroll(5, 5, -2)));
    }

    #[test]
    #[should_panic(expected = "hook failed")]
    fn test_hook_panic_propagates() {
        struct Exploding;
        impl Panel for Exploding {
            fn bounds(&self) -> PanelBounds {
                PanelBounds::new(0, 0, 10, 10)
            }
            fn on_mouse_inside(&mut self, _x: i32, _y: i32) {
                panic!("hook failed");
            }
        }

        let mut dispatcher = MainPanelDispatcher::new(Exploding);
        let display = DisplaySnapshot::scaled(&ConsoleConfig::default(), 1, (0, 0)).unwrap();
        dispatcher.tick(&display);
    }
}
