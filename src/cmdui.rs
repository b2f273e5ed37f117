use crate::clapui::{self, AddressSource, Command};
use futures::FutureExt;
use ipinvite::config::InviteConfig;
use ipinvite::network::{self, HostSession};
use ipinvite::registry::{Detected, InviteRegistry};
use ipinvite::{logging, DynResult, Endpoint, InviteFormat};
use std::net::Ipv4Addr;
use tokio::sync::broadcast::RecvError;

pub const EXIT_OK: i32 = 0;
pub const EXIT_UNKNOWN_INVITE: i32 = 2;
pub const EXIT_NO_PORT: i32 = 3;

fn build_registry(config: &InviteConfig) -> InviteRegistry {
    let builder = InviteRegistry::builder();
    let builder = match config.load_dictionaries() {
        Ok(dicts) => builder.with_dictionaries(dicts),
        Err(e) => {
            log::warn!("Word invites are unavailable: {}", e);
            builder
        }
    };
    builder.build()
}

#[cfg(feature = "stunmapping")]
async fn public_ip(config: &InviteConfig) -> DynResult<Ipv4Addr> {
    println!("Looking up the public address...");
    let ip = network::public_ipv4(config.stun_timeout()).await?;
    Ok(ip)
}

#[cfg(not(feature = "stunmapping"))]
async fn public_ip(_config: &InviteConfig) -> DynResult<Ipv4Addr> {
    Err("This build cannot discover the public address; pass --ip or --local.".into())
}

async fn resolve_ip(source: AddressSource, config: &InviteConfig) -> DynResult<Ipv4Addr> {
    match source {
        AddressSource::Explicit(ip) => Ok(ip),
        AddressSource::Local => Ok(network::local_network_ip().await?),
        AddressSource::Public => public_ip(config).await,
    }
}

fn print_invites(registry: &InviteRegistry, endpoint: Endpoint, formats: &[InviteFormat], config: &InviteConfig) {
    let width = formats
        .iter()
        .map(|format| format.to_string().len())
        .max()
        .unwrap_or(0);
    for &format in formats {
        match registry.encode(endpoint, format, config.dictionary_id) {
            Ok(text) => println!("  {:>width$}: {}", format, text, width = width),
            Err(e) => eprintln!("  {:>width$}: ERROR: {}", format, e, width = width),
        }
    }
}

async fn generate(
    registry: &InviteRegistry,
    config: &InviteConfig,
    source: AddressSource,
    formats: Vec<InviteFormat>,
    ip_only: bool,
) -> DynResult<i32> {
    let ip = resolve_ip(source, config).await?;
    let endpoint = Endpoint::new(ip, config.port);
    let formats = if !formats.is_empty() {
        formats
    } else if !config.formats.is_empty() {
        config.formats.clone()
    } else {
        registry.formats()
    };
    println!("Invites for {}:", endpoint);
    print_invites(registry, endpoint, &formats, config);
    if ip_only {
        let words = registry
            .words()
            .ok_or_else(|| "No word lists are loaded.".to_owned())?;
        let text = words.encode_ip_only(ip, config.dictionary_id)?;
        println!("Address only ({}): {}", ip, text);
    }
    Ok(EXIT_OK)
}

/// One way of reading an invite.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reading {
    Full(InviteFormat, Endpoint),
    AddressOnly { ip: Ipv4Addr, dictionary_id: usize },
}

/// Every reading of `invite`. An all-lowercase word invite can be both a
/// full invite and an address-only one, in which case both are returned.
/// With `ip_only` set only the address-only reading is tried.
fn readings(registry: &InviteRegistry, invite: &str, ip_only: bool) -> DynResult<Vec<Reading>> {
    let address_only = registry
        .words()
        .and_then(|words| words.decode_ip_only(invite.trim()).ok())
        .map(|(ip, dictionary_id)| Reading::AddressOnly { ip, dictionary_id });
    if ip_only {
        return Ok(address_only.into_iter().collect());
    }
    let mut retvl = Vec::new();
    match registry.detect(invite)? {
        Detected::Found(format, endpoint) => {
            retvl.push(Reading::Full(format, endpoint));
            if format == InviteFormat::Words {
                retvl.extend(address_only);
            }
        }
        Detected::Unknown => retvl.extend(address_only),
    }
    Ok(retvl)
}

/// The first reading that names a port something could listen on.
fn dial_target(readings: &[Reading]) -> Option<Endpoint> {
    readings.iter().find_map(|reading| match reading {
        Reading::Full(_, endpoint) if endpoint.port() != 0 => Some(*endpoint),
        _ => None,
    })
}

fn print_reading(reading: &Reading) {
    match reading {
        Reading::Full(format, endpoint) => {
            println!("Format: {}", format);
            println!("Address: {}", endpoint.ip());
            println!("Port: {}", endpoint.port());
        }
        Reading::AddressOnly { ip, dictionary_id } => {
            println!(
                "Format: {} (address only, word list {})",
                InviteFormat::Words,
                dictionary_id
            );
            println!("Address: {}", ip);
        }
    }
}

fn decode(registry: &InviteRegistry, invite: &str, ip_only: bool) -> DynResult<i32> {
    let found = readings(registry, invite, ip_only)?;
    if found.is_empty() {
        eprintln!("ERROR: {} is not a recognised invite.", invite);
        return Ok(EXIT_UNKNOWN_INVITE);
    }
    if found.len() > 1 {
        println!("This invite can be read {} ways:", found.len());
    }
    for reading in &found {
        print_reading(reading);
    }
    Ok(EXIT_OK)
}

async fn host(registry: &InviteRegistry, config: &InviteConfig, source: AddressSource) -> DynResult<i32> {
    let ip = resolve_ip(source, config).await?;
    let endpoint = Endpoint::new(ip, config.port);
    let formats: Vec<InviteFormat> = [InviteFormat::Default, InviteFormat::Words]
        .iter()
        .copied()
        .filter(|format| registry.converter(*format).is_some())
        .collect();
    println!("Share one of these invites:");
    print_invites(registry, endpoint, &formats, config);

    let mut session = HostSession::bind(config.port).await?;
    let mut messages = session.messages();
    println!("Waiting for connections on {}. Press Ctrl-C to stop.", session.local_addr());

    let ctrl_c = tokio::signal::ctrl_c().fuse();
    futures::pin_mut!(ctrl_c);
    loop {
        let next_msg = messages.recv().fuse();
        futures::pin_mut!(next_msg);
        futures::select! {
            msg = next_msg => match msg {
                Ok((peer, text)) => println!("({}): {}", peer, text),
                Err(RecvError::Lagged(missed)) => log::warn!("Missed {} messages.", missed),
                Err(RecvError::Closed) => break,
            },
            _stopped = ctrl_c => break,
        }
    }
    session.stop();
    println!("Stopped.");
    Ok(EXIT_OK)
}

async fn connect(
    registry: &InviteRegistry,
    config: &InviteConfig,
    invite: &str,
    message: Option<String>,
) -> DynResult<i32> {
    let found = readings(registry, invite, false)?;
    let endpoint = match dial_target(&found) {
        Some(endpoint) => endpoint,
        None if found.is_empty() => {
            eprintln!("ERROR: {} is not a recognised invite.", invite);
            return Ok(EXIT_UNKNOWN_INVITE);
        }
        None => {
            eprintln!("ERROR: {} does not carry a port to connect to.", invite);
            return Ok(EXIT_NO_PORT);
        }
    };
    let greeting = message.unwrap_or_else(|| config.greeting.clone());
    println!("Connecting to {}...", endpoint);
    network::connect_and_greet(endpoint, &greeting, config.connect_timeout()).await?;
    println!("Sent \"{}\" to {}.", greeting, endpoint);
    Ok(EXIT_OK)
}

/// Parses the command line, runs the chosen command, and returns the exit code.
pub async fn run() -> DynResult<i32> {
    let args = clapui::map_args(clapui::init_parser().get_matches())?;
    let config = args.config;
    logging::init(
        logging::verbosity_filter(config.verbosity),
        args.log_file.as_deref(),
    )?;
    let registry = build_registry(&config);
    match args.command {
        Command::Generate {
            source,
            formats,
            ip_only,
        } => generate(&registry, &config, source, formats, ip_only).await,
        Command::Decode { invite, ip_only } => decode(&registry, &invite, ip_only),
        Command::Host { source } => host(&registry, &config, source).await,
        Command::Connect { invite, message } => connect(&registry, &config, &invite, message).await,
    }
}
