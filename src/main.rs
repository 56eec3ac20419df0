use std::io::{self, Write};
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rmd_serial_codec::config::{MOTOR_BAUDRATE, MOTOR_ID, MOTOR_PORT};
use rmd_serial_codec::motor::{
    CommandParams, CommandTable, MotorDriver, SerialTransport, TelemetrySample, encode_command,
};
use rmd_serial_codec::timing::CycleTimer;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Command-line access to a serial-bus geared actuator
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Serial port of the actuator bus
    #[arg(long, default_value = MOTOR_PORT, global = true)]
    port: String,

    /// Baud rate
    #[arg(long, default_value_t = MOTOR_BAUDRATE, global = true)]
    baud: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the frame for a command without opening the port
    Frame(SendArgs),
    /// Multi-loop position move (degrees)
    Move {
        #[arg(long, default_value_t = MOTOR_ID)]
        motor: u8,
        #[arg(long, allow_hyphen_values = true)]
        degrees: i32,
    },
    /// Send any command from the table and print the decoded reply
    Send(SendArgs),
    /// Read temperature, torque, speed and position
    Status {
        #[arg(long, default_value_t = MOTOR_ID)]
        motor: u8,
        /// Keep polling and redraw the screen
        #[arg(long)]
        watch: bool,
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Stop watching after this many polls
        #[arg(long)]
        count: Option<usize>,
        /// Write per-poll round-trip times (seconds) to this CSV file
        #[arg(long)]
        timing_csv: Option<PathBuf>,
    },
    /// Bridge one motor to zenoh topics
    Bridge {
        #[arg(long, default_value_t = MOTOR_ID)]
        motor: u8,
    },
}

#[derive(Debug, Args)]
struct SendArgs {
    /// Logical command id (see the command table)
    #[arg(long)]
    command_id: u8,
    #[arg(long, default_value_t = MOTOR_ID)]
    motor: u8,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    degrees: i32,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    speed: i32,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    torque: i32,
    #[arg(long, default_value_t = 0)]
    direction: u8,
}

impl SendArgs {
    fn params(&self) -> CommandParams {
        CommandParams {
            motor_id: self.motor,
            degree_position: self.degrees,
            speed: self.speed,
            torque: self.torque,
            direction: self.direction,
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    match cli.command {
        Command::Frame(args) => {
            let frame = encode_command(&CommandTable::standard(), args.command_id, &args.params())?;
            println!("{}", hex(&frame));
        }
        Command::Move { motor, degrees } => {
            let mut driver = open(&cli.port, cli.baud)?;
            driver.multi_loop_control(motor, degrees)?;
            info!("Motor {} moving to {} deg", motor, degrees);
            print_sample(&driver.read_response()?)?;
        }
        Command::Send(args) => {
            let mut driver = open(&cli.port, cli.baud)?;
            let sample = driver.exchange(args.command_id, &args.params())?;
            print_sample(&sample)?;
        }
        Command::Status {
            motor,
            watch,
            interval_ms,
            count,
            timing_csv,
        } => {
            let mut driver = open(&cli.port, cli.baud)?;
            if !watch {
                print_sample(&driver.read_status(motor)?)?;
                return Ok(());
            }
            watch_status(&mut driver, motor, interval_ms, count, timing_csv)?;
        }
        Command::Bridge { motor } => {
            let driver = open(&cli.port, cli.baud)?;
            rmd_serial_codec::bridge::run(driver, motor).await?;
        }
    }
    Ok(())
}

fn open(port: &str, baud: u32) -> Result<MotorDriver<SerialTransport>, BoxError> {
    Ok(MotorDriver::open(port, baud)?)
}

fn watch_status(
    driver: &mut MotorDriver<SerialTransport>,
    motor: u8,
    interval_ms: u64,
    count: Option<usize>,
    timing_csv: Option<PathBuf>,
) -> Result<(), BoxError> {
    let mut timer = CycleTimer::new();
    let mut stdout = io::stdout();
    let mut polls = 0;

    while count.is_none_or(|n| polls < n) {
        timer.start();
        let result = driver.read_status(motor);
        let elapsed = timer.track().unwrap_or_default();

        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        println!("Motor {} ({:.1} ms round trip)", motor, elapsed * 1000.0);
        match result {
            Ok(sample) => {
                for (field, value) in sample.fields() {
                    println!("  {:<12} {:>8} {}", field.label, value, field.unit);
                }
                if sample.partial {
                    println!("  (short reply)");
                }
            }
            Err(e) => println!("  {}", e),
        }
        stdout.flush()?;

        polls += 1;
        sleep(Duration::from_millis(interval_ms));
    }

    if let Some(path) = timing_csv {
        timer.write_csv(&path)?;
        info!("Wrote {} timing samples to {}", timer.samples().len(), path.display());
    }
    Ok(())
}

fn print_sample(sample: &TelemetrySample) -> Result<(), BoxError> {
    let labeled: serde_json::Map<String, serde_json::Value> = sample
        .fields()
        .map(|(field, value)| (field.label.to_lowercase(), value.into()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&labeled)?);
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
