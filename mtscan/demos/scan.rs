//! Scan example: connect to a RouterOS device and print the networks seen
//!
//! # Usage
//!
//! ```bash
//! cargo run --example scan -- --host 192.168.88.1 --user admin --password secret
//! ```
//!
//! Press Ctrl-C to stop. Set RUST_LOG=debug to follow the console protocol.

use std::env;
use std::time::Duration;

use mtscan::parser::format_hw_address;
use mtscan::{Command, Event, Info, SessionBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    println!("Connecting to {}:{}...", args.host, args.port);

    let (handle, mut events) = SessionBuilder::new(&args.host)
        .port(args.port)
        .login(&args.user)
        .password(&args.password)
        .interface(&args.interface)
        .duration(args.duration)
        .remote(args.remote)
        .timeout(Duration::from_secs(args.timeout))
        .spawn()?;

    let mut started = false;
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("Canceling...");
                handle.cancel();
                continue;
            }
        };
        let Some(event) = event else {
            break;
        };

        match &event {
            Event::Info(Info::AuthVerify(fingerprint)) => {
                if args.accept_new {
                    println!("Trusting new host key {}", fingerprint);
                    handle.send(Command::Authenticate);
                } else {
                    eprintln!("Unknown host key {} (use --accept-new to trust it)", fingerprint);
                    handle.cancel();
                }
            }
            Event::Info(Info::ScanList(scanlist)) => {
                println!("Scan-list: {}", scanlist);
                // Remote mode starts scanning by itself
                if !started && args.sniff {
                    handle.send(Command::Sniff);
                } else if !started && !args.remote {
                    handle.send(Command::Scan(None));
                }
                started = true;
            }
            Event::Info(Info::Failure(message)) => eprintln!("Device: {}", message),
            Event::Info(info) => println!("{:?}", info),
            Event::Network(record) => println!(
                "{}  {:>8.3}  {:<12} {:>4} {:<32} {}",
                format_hw_address(record.address),
                f64::from(record.frequency) / 1000.0,
                format!("{}/{}", record.channel, record.mode),
                record.signal.map(|s| s.to_string()).unwrap_or_default(),
                record.ssid,
                record.radio_name,
            ),
            Event::Sniffer(stats) => println!(
                "processed {} packets, {} saved, {} dropped",
                stats.processed_packets, stats.memory_saved_packets, stats.stream_dropped_packets
            ),
            Event::ConnectError { kind, detail } => {
                eprintln!("{}: {}", kind.message(), detail);
            }
            Event::Closed => println!("Connection closed"),
            Event::Canceled => println!("Canceled"),
        }

        if event.is_terminal() {
            break;
        }
    }

    if handle.join().is_err() {
        eprintln!("Session worker panicked");
    }
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    interface: String,
    duration: u32,
    remote: bool,
    sniff: bool,
    accept_new: bool,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "192.168.88.1".to_string(),
            port: 22,
            user: "admin".to_string(),
            password: String::new(),
            interface: "wlan1".to_string(),
            duration: 0,
            remote: false,
            sniff: false,
            accept_new: false,
            timeout: 30,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22);
                }
                "--user" | "-u" => parsed.user = value.unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = value.unwrap_or_default(),
                "--interface" | "-i" => parsed.interface = value.unwrap_or(parsed.interface),
                "--duration" | "-d" => {
                    parsed.duration = value.and_then(|v| v.parse().ok()).unwrap_or(0);
                }
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30);
                }
                "--remote" => {
                    parsed.remote = true;
                    i -= 1;
                }
                "--sniff" => {
                    parsed.sniff = true;
                    i -= 1;
                }
                "--accept-new" => {
                    parsed.accept_new = true;
                    i -= 1;
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    i -= 1;
                }
            }
            i += 2;
        }
        parsed
    }

    fn print_help() {
        println!(
            r#"mtscan scan example

USAGE:
    cargo run --example scan -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Target host [default: 192.168.88.1]
    -p, --port <PORT>          SSH port [default: 22]
    -u, --user <USER>          Login [default: admin]
    -P, --password <PASS>      Password
    -i, --interface <NAME>     Wireless interface [default: wlan1]
    -d, --duration <SECS>      Scan duration, 0 until stopped [default: 0]
    -t, --timeout <SECS>       Connection timeout [default: 30]
    --remote                   Scan continuously
    --sniff                    Run the sniffer instead of the scanner
    --accept-new               Trust an unknown host key
    --help                     Print this help message
"#
        );
    }
}
