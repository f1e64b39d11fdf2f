use laser_paths::coords::{Point, Point3};
use laser_paths::machine_config::MachineConfig;
use laser_paths::machine_config_parser;
use laser_paths::Engraver;

use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use getopts::Options;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn usage(prg: &str, opts: Options) {
    let brief = format!(
        "Usage: {} [options] COMMAND ARGS\n\n\
         Commands:\n    \
         line SPEED X1 Y1 Z1 X2 Y2 Z2\n    \
         circle CX CY PX PY Z SPEED\n    \
         rect CX CY CZ X Y Z SPEED INTERVAL",
        prg
    );
    print!("{}", opts.usage(&brief));
}

fn parse_args<T: FromStr>(args: &[String], what: &str) -> Result<Vec<T>, String>
where
    T::Err: std::fmt::Display,
{
    args.iter()
        .map(|a| {
            T::from_str(a).map_err(|e| format!("Invalid {} argument '{}': {}", what, a, e))
        })
        .collect()
}

fn run_job(engraver: &Engraver, command: &str, args: &[String], laser_on: bool) -> Result<(), String> {
    match command {
        "line" => {
            let v: Vec<f64> = parse_args(args, "line")?;
            if v.len() != 7 {
                return Err("line needs SPEED X1 Y1 Z1 X2 Y2 Z2".to_string());
            }
            engraver.generate_line(
                v[0],
                laser_on,
                Point3::new(v[1], v[2], v[3]),
                Point3::new(v[4], v[5], v[6]),
            );
        }
        "circle" => {
            let v: Vec<f64> = parse_args(args, "circle")?;
            if v.len() != 6 {
                return Err("circle needs CX CY PX PY Z SPEED".to_string());
            }
            engraver.generate_circle(Point::new(v[0], v[1]), Point::new(v[2], v[3]), v[4], v[5]);
        }
        "rect" => {
            let v: Vec<f64> = parse_args(args, "rect")?;
            if v.len() != 8 {
                return Err("rect needs CX CY CZ X Y Z SPEED INTERVAL".to_string());
            }
            engraver.generate_rectangle(
                Point3::new(v[0], v[1], v[2]),
                Point3::new(v[3], v[4], v[5]),
                v[6],
                v[7],
            );
        }
        _ => return Err(format!("Unknown command '{}'", command)),
    }
    Ok(())
}

fn cli_options() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config", "machine configuration file", "FILE");
    opts.optopt("", "host", "device address", "HOST");
    opts.optopt("", "port", "device port", "PORT");
    opts.optopt("", "power", "laser power (%)", "POWER");
    opts.optopt("", "frequency", "laser repetition rate (Hz)", "FREQ");
    opts.optopt(
        "",
        "drain-timeout",
        "seconds to wait for the device to take the last queued data once the \
         job is generated (default 30). Generating blocks until the device \
         accepts data, this limit does not apply to it",
        "SECS",
    );
    opts.optflag("", "laser-off", "travel only, for line");
    opts.optflag("h", "help", "print this help menu");
    opts
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("laser_paths=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();
    let opts = cli_options();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            println!("{}", f);
            return ExitCode::FAILURE;
        }
    };
    if matches.opt_present("h") {
        usage(&program, opts);
        return ExitCode::SUCCESS;
    }
    if matches.free.is_empty() {
        println!("No command");
        usage(&program, opts);
        return ExitCode::FAILURE;
    }

    let mut config = match matches.opt_str("config") {
        Some(filename) => match machine_config_parser::read_config(&filename) {
            Ok(c) => c,
            Err(e) => {
                error!("{}: {}", filename, e);
                return ExitCode::FAILURE;
            }
        },
        None => MachineConfig::default(),
    };
    if let Some(host) = matches.opt_str("host") {
        config.link.host = host;
    }
    if let Some(arg) = matches.opt_str("port") {
        match u16::from_str(&arg) {
            Ok(port) => config.link.port = port,
            Err(err) => {
                println!("Invalid port: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    let power = match matches.opt_str("power").map(|a| f64::from_str(&a)) {
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            println!("Invalid power: {}", err);
            return ExitCode::FAILURE;
        }
        None => None,
    };
    let frequency = match matches.opt_str("frequency").map(|a| u32::from_str(&a)) {
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            println!("Invalid frequency: {}", err);
            return ExitCode::FAILURE;
        }
        None => None,
    };
    let drain_timeout = match matches.opt_str("drain-timeout").map(|a| f64::from_str(&a)) {
        Some(Ok(value)) if value >= 0.0 && value.is_finite() => Duration::from_secs_f64(value),
        Some(_) => {
            println!("Invalid drain timeout");
            return ExitCode::FAILURE;
        }
        None => Duration::from_secs(30),
    };

    let engraver = match Engraver::new(&config) {
        Ok(e) => e,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(freq) = frequency {
        if let Err(e) = engraver.set_frequency(freq) {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Some(power) = power {
        engraver.set_power(power);
    }

    let laser_on = !matches.opt_present("laser-off");
    if let Err(msg) = run_job(&engraver, &matches.free[0], &matches.free[1..], laser_on) {
        println!("{}", msg);
        engraver.shutdown();
        return ExitCode::FAILURE;
    }
    engraver.flush();

    let status = if engraver.wait_drained(drain_timeout) {
        info!("Job sent, {} slots", engraver.slots_sent());
        ExitCode::SUCCESS
    } else {
        warn!("Device did not take all data within {:?} ({:?})", drain_timeout, engraver.link_state());
        ExitCode::FAILURE
    };
    engraver.shutdown();
    status
}
