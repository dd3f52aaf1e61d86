use clap::{App, Arg, ArgMatches, SubCommand};
use sensorwire::{
    config::DEFAULT_REQUEST_TIMEOUT_MS,
    consumer::{FrameGapDetector, GapReport},
    error::SensorWireError,
    messages::{
        CameraParameterRequest, CameraParameterResponse, ColorConversion, ImageHeader, PixelType,
        SetBoolRequest, SetBoolResponse, StampedImage,
    },
    topic::{self, ports, Endpoint, TopicPattern},
    CancellationToken, Publisher, PublisherConfig, RequestClient, Result, Subscriber,
};
use std::{
    str::FromStr,
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

fn main() -> Result<()> {
    env_logger::init();

    let host_arg = || {
        Arg::with_name("host")
            .short("H")
            .long("host")
            .value_name("IP")
            .help("Remote host; omit to use the local machine")
            .takes_value(true)
    };

    let matches = App::new("sensorwire-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sensorwire telemetry transport diagnostics")
        .subcommand(SubCommand::with_name("topics").about("List the fixed topic table"))
        .subcommand(
            SubCommand::with_name("echo")
                .about("Subscribe to a topic and print one line per message")
                .arg(
                    Arg::with_name("topic")
                        .short("t")
                        .long("topic")
                        .value_name("NAME")
                        .help("Topic name, with or without the nodar/ prefix")
                        .required(true)
                        .takes_value(true),
                )
                .arg(host_arg())
                .arg(
                    Arg::with_name("listen")
                        .long("listen")
                        .help("Accept a connecting publisher instead of dialing"),
                )
                .arg(
                    Arg::with_name("count")
                        .short("c")
                        .long("count")
                        .value_name("N")
                        .help("Stop after N messages (0 runs forever)")
                        .default_value("0")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("pattern")
                .about("Publish a synthetic BGR image stream")
                .arg(
                    Arg::with_name("port")
                        .short("p")
                        .long("port")
                        .value_name("PORT")
                        .help("Port to publish on")
                        .default_value("9800")
                        .takes_value(true),
                )
                .arg(host_arg())
                .arg(
                    Arg::with_name("rows")
                        .long("rows")
                        .value_name("ROWS")
                        .default_value("480")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("cols")
                        .long("cols")
                        .value_name("COLS")
                        .default_value("640")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("rate")
                        .short("r")
                        .long("rate")
                        .value_name("HZ")
                        .help("Frames per second")
                        .default_value("10")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("count")
                        .short("c")
                        .long("count")
                        .value_name("N")
                        .help("Number of frames")
                        .default_value("100")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("set-bool")
                .about("Send a SetBoolRequest and print the response")
                .arg(
                    Arg::with_name("port")
                        .short("p")
                        .long("port")
                        .value_name("PORT")
                        .help("Request port (9811 recording, 9814 wait)")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("value")
                        .short("v")
                        .long("value")
                        .value_name("BOOL")
                        .possible_values(&["true", "false"])
                        .required(true)
                        .takes_value(true),
                )
                .arg(host_arg()),
        )
        .subcommand(
            SubCommand::with_name("set-param")
                .about("Set a camera parameter and print the response")
                .arg(
                    Arg::with_name("topic")
                        .short("t")
                        .long("topic")
                        .value_name("PARAM")
                        .possible_values(&["exposure", "gain"])
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("value")
                        .short("v")
                        .long("value")
                        .value_name("VALUE")
                        .required(true)
                        .takes_value(true),
                )
                .arg(host_arg()),
        )
        .subcommand(SubCommand::with_name("info").about("Show version and build information"))
        .get_matches();

    match matches.subcommand() {
        ("topics", Some(_)) => list_topics(),
        ("echo", Some(echo_matches)) => echo(echo_matches),
        ("pattern", Some(pattern_matches)) => pattern(pattern_matches),
        ("set-bool", Some(bool_matches)) => set_bool(bool_matches),
        ("set-param", Some(param_matches)) => set_param(param_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| SensorWireError::invalid_parameter(name, "missing value"))?;
    raw.parse()
        .map_err(|_| SensorWireError::invalid_parameter(name, format!("invalid value '{}'", raw)))
}

fn request_timeout() -> Duration {
    Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
}

fn list_topics() -> Result<()> {
    println!("{:<34} {:>5}  {:<24} {}", "TOPIC", "PORT", "MESSAGE", "PATTERN");
    for topic in ports::ALL_TOPICS.iter() {
        let pattern = match topic.pattern {
            TopicPattern::Publish => "publish",
            TopicPattern::RequestReply => "request/reply",
        };
        println!(
            "{:<34} {:>5}  {:<24} {}",
            topic.name,
            topic.port,
            topic.message.name(),
            pattern
        );
    }
    Ok(())
}

fn echo(matches: &ArgMatches) -> Result<()> {
    let name: String = parse_arg(matches, "topic")?;
    let topic = topic::lookup(&name)
        .ok_or_else(|| SensorWireError::invalid_parameter("topic", format!("unknown topic '{}'", name)))?;
    if topic.pattern != TopicPattern::Publish {
        return Err(SensorWireError::invalid_parameter(
            "topic",
            format!("{} is a request/reply topic", topic.name),
        ));
    }
    let count: u64 = parse_arg(matches, "count")?;

    let mut subscriber = if matches.is_present("listen") {
        Subscriber::bind(topic.port)?
    } else {
        let host = matches.value_of("host").unwrap_or("127.0.0.1");
        Subscriber::connect(Endpoint::connect(host, topic.port))?
    };

    println!("Listening to {} ({})", topic, subscriber.endpoint());
    let mut gaps = FrameGapDetector::new(topic.name);
    let mut received = 0u64;

    while count == 0 || received < count {
        let message = match subscriber.recv_any() {
            Ok(message) => message,
            Err(SensorWireError::Decode(e)) => {
                println!("  ! undecodable frame: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };
        received += 1;

        if let Some(frame_id) = message.frame_id() {
            if let GapReport::Dropped(n) = gaps.observe(frame_id) {
                println!("  ! {} frame(s) dropped before {}", n, frame_id);
            }
        }
        println!("{}", message.summary());
    }

    println!(
        "\n{} messages, {} frames dropped",
        received,
        gaps.dropped()
    );
    Ok(())
}

fn pattern(matches: &ArgMatches) -> Result<()> {
    let port: u16 = parse_arg(matches, "port")?;
    let rows: u32 = parse_arg(matches, "rows")?;
    let cols: u32 = parse_arg(matches, "cols")?;
    let rate: f64 = parse_arg(matches, "rate")?;
    let count: u64 = parse_arg(matches, "count")?;
    if rate <= 0.0 {
        return Err(SensorWireError::invalid_parameter("rate", "must be positive"));
    }

    let mut config = PublisherConfig::new("pattern", port);
    if let Some(host) = matches.value_of("host") {
        config = config.with_host(host);
    }
    let token = CancellationToken::new();
    let mut publisher = Publisher::new(config, &token)?;

    let period = Duration::from_secs_f64(1.0 / rate);
    let mut pixels = vec![0u8; rows as usize * cols as usize * 3];
    let start = Instant::now();

    println!("Publishing {} {}x{} frames at {} Hz", count, rows, cols, rate);
    for frame_id in 0..count {
        fill_gradient(&mut pixels, cols as usize, frame_id);
        let header = ImageHeader {
            time: now_nanos(),
            frame_id,
            rows,
            cols,
            pixel_type: PixelType::CV_8UC3,
            color_conversion: ColorConversion::BGR2BGR,
        };

        let mut buffer = publisher.acquire_buffer();
        StampedImage::encode_parts(&mut buffer, &header, &pixels, &[])?;
        publisher.publish(buffer)?;

        let next = period.mul_f64((frame_id + 1) as f64);
        if let Some(wait) = next.checked_sub(start.elapsed()) {
            thread::sleep(wait);
        }
    }

    publisher.shutdown();
    let stats = publisher.stats();
    let pool = publisher.pool().stats();
    println!("\nResults:");
    println!("  Published: {}", stats.published);
    println!("  Transmitted: {}", stats.transmitted);
    println!("  Superseded: {} ({:.1}%)", stats.superseded, stats.drop_rate() * 100.0);
    println!("  Failed transmits: {}", stats.failed);
    println!("  Buffers allocated: {}", pool.total_allocated);
    Ok(())
}

/// BGR diagonal gradient that scrolls with the frame id
fn fill_gradient(pixels: &mut [u8], cols: usize, frame_id: u64) {
    let shift = frame_id as usize;
    for (index, pixel) in pixels.chunks_exact_mut(3).enumerate() {
        let (row, col) = (index / cols.max(1), index % cols.max(1));
        pixel[0] = (col + shift) as u8;
        pixel[1] = (row + shift) as u8;
        pixel[2] = (row + col) as u8;
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn set_bool(matches: &ArgMatches) -> Result<()> {
    let port: u16 = parse_arg(matches, "port")?;
    let value: bool = parse_arg(matches, "value")?;
    let host = matches.value_of("host").unwrap_or("127.0.0.1");

    let mut client = RequestClient::connect(Endpoint::connect(host, port), request_timeout())?;
    let response: SetBoolResponse = client.request(&SetBoolRequest::new(value))?;
    println!(
        "{} -> {}",
        value,
        if response.value { "applied" } else { "rejected" }
    );
    Ok(())
}

fn set_param(matches: &ArgMatches) -> Result<()> {
    let topic = match matches.value_of("topic") {
        Some("gain") => ports::CAMERA_GAIN,
        _ => ports::CAMERA_EXPOSURE,
    };
    let value: f32 = parse_arg(matches, "value")?;
    let host = matches.value_of("host").unwrap_or("127.0.0.1");

    let mut client =
        RequestClient::connect(Endpoint::connect(host, topic.port), request_timeout())?;
    let response: CameraParameterResponse = client.request(&CameraParameterRequest::new(value))?;
    println!(
        "{} = {} -> {}",
        topic.name,
        value,
        if response.value { "applied" } else { "rejected" }
    );
    Ok(())
}

fn show_info() -> Result<()> {
    println!("Sensorwire v{}", sensorwire::VERSION);
    println!(
        "Wire format: v{}.{}",
        sensorwire::messages::MAJOR_VERSION,
        sensorwire::messages::MINOR_VERSION
    );
    println!(
        "Reserved ports: {}",
        topic::reserved_ports()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Build: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    Ok(())
}
