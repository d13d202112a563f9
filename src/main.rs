//! Terminal demo for the neomatrix effect engine.
//!
//! Renders the matrix as colored blocks in the terminal. Control messages
//! typed on stdin travel through the same MQTT machinery a real deployment
//! uses: a loopback transport feeds each line to the reserved `effect`
//! sub-topic, so switching effects exercises session dispatch end to end.

use std::cell::{Cell, RefCell};
use std::env;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::error;
use tracing_subscriber::filter::EnvFilter;

use neomatrix::connectivity::mqtt::{
    InboundMessage, MqttManager, MqttOptions, MqttSession, MqttTransport,
};
use neomatrix::settings::DEFAULT_FILE_PATH;
use neomatrix::{effect_handler, Engine, FrameBuffer, MatrixSurface, Registry, Settings};

/// Outer loop cadence; effects self-throttle on top of this.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Cool-down before restarting after a fatal error, to avoid a fast
/// crash-restart cycle.
const REBOOT_COOLDOWN: Duration = Duration::from_secs(20);

const DEFAULT_ROWS: usize = 3;
const DEFAULT_COLS: usize = 4;

/// Parsed command-line arguments.
#[derive(Debug, Default)]
struct CliArgs {
    settings: Option<String>,
    effect: Option<String>,
    rows: Option<usize>,
    cols: Option<usize>,
    list: bool,
    show_help: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut out = CliArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => out.show_help = true,
                "--list" | "-l" => out.list = true,
                "--settings" => out.settings = Some(Self::value(&mut args, "--settings")?),
                "--effect" => out.effect = Some(Self::value(&mut args, "--effect")?),
                "--rows" => out.rows = Some(Self::number(&mut args, "--rows")?),
                "--cols" => out.cols = Some(Self::number(&mut args, "--cols")?),
                other => return Err(format!("Unknown argument: {other}")),
            }
        }
        Ok(out)
    }

    fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
        args.next().ok_or_else(|| format!("{flag} needs a value"))
    }

    fn number(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<usize, String> {
        let raw = Self::value(args, flag)?;
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("{flag} needs a positive number, not {raw}")),
        }
    }
}

fn print_usage() {
    println!("Usage: neomatrix [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --settings <path>  Settings file (default: {DEFAULT_FILE_PATH})");
    println!("  --effect <name>    Start a specific effect instead of the configured one");
    println!("  --rows <n>         Matrix rows (default: {DEFAULT_ROWS})");
    println!("  --cols <n>         Matrix columns (default: {DEFAULT_COLS})");
    println!("  -l, --list         List the available effects and exit");
    println!("  -h, --help         Show this help");
    println!();
    println!("While running, type a control message like");
    println!("  {{ \"effect\": \"cross\", \"color\": [200, 0, 0], \"wait\": 500 }}");
    println!("and press enter to switch effects. Ctrl-D quits.");
}

/// Frame buffer painted to the terminal on every flush.
struct TerminalMatrix {
    buffer: FrameBuffer,
}

impl TerminalMatrix {
    fn new(rows: usize, cols: usize) -> Self {
        // Clear the screen and hide the cursor for the duration.
        print!("\x1b[2J\x1b[?25l");
        Self {
            buffer: FrameBuffer::new(rows, cols),
        }
    }

    fn paint(&self) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\x1b[H");
        for row in 0..self.buffer.rows() {
            for col in 0..self.buffer.cols() {
                let pixel = self.buffer.pixel(row, col);
                let _ = write!(out, "\x1b[38;2;{};{};{}m██", pixel.0, pixel.1, pixel.2);
            }
            let _ = write!(out, "\x1b[0m\r\n");
        }
        let _ = out.flush();
    }
}

impl Drop for TerminalMatrix {
    fn drop(&mut self) {
        print!("\x1b[0m\x1b[?25h\n");
        let _ = io::stdout().flush();
    }
}

impl MatrixSurface for TerminalMatrix {
    fn rows(&self) -> usize {
        self.buffer.rows()
    }

    fn cols(&self) -> usize {
        self.buffer.cols()
    }

    fn set(&mut self, row: usize, col: usize, color: neomatrix::Rgb) {
        self.buffer.set(row, col, color);
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn flush(&mut self) {
        self.buffer.flush();
        self.paint();
    }
}

/// Loopback transport: stdin lines become messages on the `effect`
/// sub-topic.
struct StdinTransport {
    lines: Rc<RefCell<Receiver<String>>>,
    closed: Rc<Cell<bool>>,
}

struct StdinSession {
    lines: Rc<RefCell<Receiver<String>>>,
    closed: Rc<Cell<bool>>,
    topic: String,
}

impl MqttTransport for StdinTransport {
    fn connect(&mut self, options: &MqttOptions) -> neomatrix::Result<Box<dyn MqttSession>> {
        let root = options.root_topic.trim().trim_end_matches('/');
        Ok(Box::new(StdinSession {
            lines: Rc::clone(&self.lines),
            closed: Rc::clone(&self.closed),
            topic: format!("{root}/effect"),
        }))
    }
}

impl MqttSession for StdinSession {
    fn subscribe(&mut self, _topic: &str) -> neomatrix::Result<()> {
        Ok(())
    }

    fn publish(&mut self, _topic: &str, _payload: &[u8], _retain: bool) -> neomatrix::Result<()> {
        Ok(())
    }

    fn try_recv(&mut self) -> neomatrix::Result<Option<InboundMessage>> {
        match self.lines.borrow_mut().try_recv() {
            Ok(line) => Ok(Some(InboundMessage {
                topic: self.topic.clone(),
                payload: line.into_bytes(),
            })),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.closed.set(true);
                Ok(None)
            }
        }
    }

    fn disconnect(&mut self) -> neomatrix::Result<()> {
        Ok(())
    }
}

fn load_settings(args: &CliArgs) -> Settings {
    match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("Cannot read settings from {path}: {err}");
                std::process::exit(2);
            }
        },
        // The default settings file is optional for the demo.
        None => Settings::load(DEFAULT_FILE_PATH).unwrap_or_default(),
    }
}

fn init_logging(settings: &Settings) {
    let filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(settings.get_or("log_level", "info").to_ascii_lowercase())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &CliArgs, settings: &Settings) -> anyhow::Result<()> {
    let registry = Registry::discover().context("effect discovery failed")?;
    if args.list {
        println!("{}", registry.full_help());
        return Ok(());
    }

    let rows = args
        .rows
        .unwrap_or_else(|| settings.get_parsed("pix_rows", DEFAULT_ROWS));
    let cols = args
        .cols
        .unwrap_or_else(|| settings.get_parsed("pix_columns", DEFAULT_COLS));
    let mut engine = Engine::new(TerminalMatrix::new(rows, cols), registry);

    if let Some(name) = &args.effect {
        let params = neomatrix::EffectParams::new();
        if !engine.switch_effect(name, &params) {
            bail!("could not start effect {name}");
        }
    } else {
        engine.start_initial_effect(settings);
    }

    // Reader thread feeding typed control messages into the loopback
    // transport.
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if sender.send(line).is_err() {
                break;
            }
        }
    });

    let closed = Rc::new(Cell::new(false));
    let transport = StdinTransport {
        lines: Rc::new(RefCell::new(receiver)),
        closed: Rc::clone(&closed),
    };
    let options = MqttOptions::from_settings(settings, "neomatrix-demo");
    let mut mqtt: MqttManager<Engine<TerminalMatrix>> =
        MqttManager::new(Box::new(transport), options);
    mqtt.register_callback("effect", effect_handler());
    mqtt.connect();

    while !closed.get() {
        engine.tick();
        mqtt.poll(&mut engine);
        thread::sleep(TICK_INTERVAL);
    }
    Ok(())
}

fn main() {
    let args = match CliArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };
    if args.show_help {
        print_usage();
        return;
    }

    let settings = load_settings(&args);
    init_logging(&settings);

    loop {
        match run(&args, &settings) {
            Ok(()) => break,
            Err(err) => {
                error!("An unhandled error occurred: {err:#}");
                error!("Restarting the matrix controller.");
                thread::sleep(REBOOT_COOLDOWN);
            }
        }
    }
}
