#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use doodad::input::mock::MockInput;
use doodad::prelude::*;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tokio::time::{Duration, Instant, sleep, timeout};

fn config(grace: Duration) -> RuntimeConfig {
    RuntimeConfig::new(Duration::from_millis(5), grace).without_interrupt_handler()
}

#[derive(Debug)]
enum Message {
    Tick,
    System(Event),
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Self::System(event)
    }
}

// Quits as soon as init runs, while other work is still outstanding
struct InitQuitApp;

impl Doodad for InitQuitApp {
    type Message = Message;

    fn init(&self) -> Command<Message> {
        Command::batch([
            Command::tick(Duration::from_secs(3600), |_| Message::Tick),
            Command::quit(),
        ])
    }

    fn update(self, _msg: Message) -> (Self, Command<Message>) {
        (self, Command::none())
    }

    fn view(&self, _: &mut dyn Surface) {}
}

impl Application for InitQuitApp {
    type Flags = ();

    fn new(_: (), _: &IdAllocator) -> Self {
        Self
    }
}

#[tokio::test]
async fn test_quit_from_init_cancels_outstanding_ticks() {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let runtime = Runtime::<InitQuitApp>::with_config((), config(Duration::from_secs(1)));

    let start = Instant::now();
    let result = timeout(Duration::from_secs(1), runtime.run(&mut terminal)).await;
    let elapsed = start.elapsed();

    assert!(result.is_ok(), "Runtime should quit within 1 second");
    assert!(result.unwrap().is_ok(), "Runtime should complete without error");
    assert!(
        elapsed < Duration::from_millis(200),
        "Outstanding ticks must not delay shutdown"
    );
}

// Quits on any key press
struct KeyQuitApp {
    keys: u32,
}

impl Doodad for KeyQuitApp {
    type Message = Message;

    fn update(self, msg: Message) -> (Self, Command<Message>) {
        match msg {
            Message::System(Event::Key(_)) => (Self { keys: self.keys + 1 }, Command::quit()),
            _ => (self, Command::none()),
        }
    }

    fn view(&self, _: &mut dyn Surface) {}
}

impl Application for KeyQuitApp {
    type Flags = ();

    fn new(_: (), _: &IdAllocator) -> Self {
        Self { keys: 0 }
    }
}

#[tokio::test]
async fn test_quit_from_key_press() {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let (input, handle) = MockInput::new(80, 24);
    let runtime = Runtime::<KeyQuitApp>::with_config((), config(Duration::from_secs(1))).with_input(input);

    let press = tokio::spawn(async move {
        sleep(Duration::from_millis(30)).await;
        handle.key(KeyPress::char('q'));
    });

    let app = timeout(Duration::from_secs(1), runtime.run(&mut terminal))
        .await
        .expect("Runtime should quit after the key press")
        .expect("Runtime should complete without error");

    press.await.unwrap();
    assert_eq!(app.keys, 1);
}

// Runs a command that never looks at the cancellation token
struct StubbornApp;

impl Doodad for StubbornApp {
    type Message = Message;

    fn init(&self) -> Command<Message> {
        Command::batch([
            Command::task(|_| async {
                sleep(Duration::from_secs(3600)).await;
                Ok(Some(Message::Tick))
            }),
            Command::quit(),
        ])
    }

    fn update(self, _msg: Message) -> (Self, Command<Message>) {
        (self, Command::none())
    }

    fn view(&self, _: &mut dyn Surface) {}
}

impl Application for StubbornApp {
    type Flags = ();

    fn new(_: (), _: &IdAllocator) -> Self {
        Self
    }
}

#[tokio::test]
async fn test_shutdown_grace_bounds_stubborn_commands() {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let runtime = Runtime::<StubbornApp>::with_config((), config(Duration::from_millis(50)));

    let start = Instant::now();
    let result = timeout(Duration::from_secs(1), runtime.run(&mut terminal)).await;
    let elapsed = start.elapsed();

    assert!(result.unwrap().is_ok(), "Runtime should still return the model");
    assert!(elapsed >= Duration::from_millis(50), "Shutdown waits out the grace period");
    assert!(elapsed < Duration::from_millis(500));
}

// Messages already queued before the quit are folded, later ones are not
struct CountingApp {
    counter: u32,
}

#[derive(Debug)]
enum CountMessage {
    Increment,
    Quit,
    System(Event),
}

impl From<Event> for CountMessage {
    fn from(event: Event) -> Self {
        Self::System(event)
    }
}

impl Doodad for CountingApp {
    type Message = CountMessage;

    fn init(&self) -> Command<CountMessage> {
        Command::sequence([
            Command::emit(CountMessage::Increment),
            Command::emit(CountMessage::Increment),
            Command::emit(CountMessage::Increment),
            Command::emit(CountMessage::Quit),
            Command::emit(CountMessage::Increment),
        ])
    }

    fn update(self, msg: CountMessage) -> (Self, Command<CountMessage>) {
        match msg {
            CountMessage::Increment => (
                Self {
                    counter: self.counter + 1,
                },
                Command::none(),
            ),
            CountMessage::Quit => (self, Command::quit()),
            CountMessage::System(_) => (self, Command::none()),
        }
    }

    fn view(&self, _: &mut dyn Surface) {}
}

impl Application for CountingApp {
    type Flags = ();

    fn new(_: (), _: &IdAllocator) -> Self {
        Self { counter: 0 }
    }
}

#[tokio::test]
async fn test_quit_after_multiple_messages() {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let runtime = Runtime::<CountingApp>::with_config((), config(Duration::from_secs(1)));

    let app = timeout(Duration::from_millis(500), runtime.run(&mut terminal))
        .await
        .expect("Runtime should quit within 500ms")
        .expect("Runtime should complete without error");

    assert!(app.counter >= 3, "Messages before the quit are folded");
    assert!(app.counter <= 4);
}
