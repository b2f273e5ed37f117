use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use ipinvite::config::InviteConfig;
use ipinvite::dictionary::MAX_DICTIONARIES;
use ipinvite::{DynResult, InviteFormat};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AddressSource {
    Explicit(Ipv4Addr),
    Local,
    Public,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Command {
    Generate {
        source: AddressSource,
        formats: Vec<InviteFormat>,
        ip_only: bool,
    },
    Decode {
        invite: String,
        ip_only: bool,
    },
    Host {
        source: AddressSource,
    },
    Connect {
        invite: String,
        message: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Args {
    pub config: InviteConfig,
    pub log_file: Option<PathBuf>,
    pub command: Command,
}

fn validate_ip(s: String) -> Result<(), String> {
    s.trim()
        .parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|e| format!("{} is not an IPv4 address: {}", s, e))
}

fn validate_port(s: String) -> Result<(), String> {
    s.trim()
        .parse::<u16>()
        .map(|_| ())
        .map_err(|e| format!("{} is not a port: {}", s, e))
}

fn validate_format(s: String) -> Result<(), String> {
    s.parse::<InviteFormat>().map(|_| ())
}

fn validate_dictionary(s: String) -> Result<(), String> {
    match s.trim().parse::<usize>() {
        Ok(id) if id < MAX_DICTIONARIES => Ok(()),
        Ok(id) => Err(format!(
            "Dictionary ids go from 0 to {}, but got {}.",
            MAX_DICTIONARIES - 1,
            id
        )),
        Err(e) => Err(format!("{} is not a dictionary id: {}", s, e)),
    }
}

fn validate_file(s: String) -> Result<(), String> {
    if Path::new(s.trim()).is_file() {
        Ok(())
    } else {
        Err(format!("File not found at path {}", s))
    }
}

fn address_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("ip")
            .long("ip")
            .value_name("address")
            .takes_value(true)
            .validator(validate_ip)
            .help("Use this IPv4 address instead of discovering one."),
        Arg::with_name("local")
            .long("local")
            .takes_value(false)
            .conflicts_with("ip")
            .help("Use this machine's local network address instead of the public one."),
        Arg::with_name("port")
            .long("port")
            .short("p")
            .value_name("port")
            .takes_value(true)
            .validator(validate_port)
            .help("Port to advertise and listen on."),
    ]
}

fn invite_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("invite")
        .value_name("invite")
        .required(true)
        .index(1)
        .help("An invite in any supported format.")
}

pub fn init_parser<'a, 'b>() -> App<'a, 'b> {
    App::new("ipinvite")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Share an IPv4 address and port as an invite code.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("file")
                .takes_value(true)
                .validator(validate_file)
                .help("Read settings from a JSON file."),
        )
        .arg(
            Arg::with_name("words_dir")
                .long("words-dir")
                .value_name("directory")
                .takes_value(true)
                .help("Read word lists named words_<id>.txt from this directory. Every id has a bundled list, so pair it with --no-bundled-words."),
        )
        .arg(
            Arg::with_name("no_bundled_words")
                .long("no-bundled-words")
                .takes_value(false)
                .help("Ignore the word lists built into the program."),
        )
        .arg(
            Arg::with_name("log_file")
                .long("log-file")
                .value_name("file")
                .takes_value(true)
                .help("Append log output to this file."),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .takes_value(false)
                .help("Log more. Repeat for even more."),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("Print invites for this machine.")
                .args(&address_args())
                .arg(
                    Arg::with_name("format")
                        .long("format")
                        .short("f")
                        .value_name("format")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .validator(validate_format)
                        .help("default, base16, base62, words or qr. Defaults to all of them."),
                )
                .arg(
                    Arg::with_name("dictionary")
                        .long("dictionary")
                        .short("d")
                        .value_name("id")
                        .takes_value(true)
                        .validator(validate_dictionary)
                        .help("Word list used for word invites."),
                )
                .arg(
                    Arg::with_name("ip_only")
                        .long("ip-only")
                        .takes_value(false)
                        .help("Also print a word invite that leaves out the port."),
                ),
        )
        .subcommand(
            SubCommand::with_name("decode")
                .about("Work out the format of an invite and print its address.")
                .arg(invite_arg())
                .arg(
                    Arg::with_name("ip_only")
                        .long("ip-only")
                        .takes_value(false)
                        .help("Read the invite as address-only words, as printed by generate --ip-only."),
                ),
        )
        .subcommand(
            SubCommand::with_name("host")
                .about("Print invites and wait for test connections.")
                .args(&address_args()),
        )
        .subcommand(
            SubCommand::with_name("connect")
                .about("Send a greeting to the host behind an invite.")
                .arg(invite_arg())
                .arg(
                    Arg::with_name("message")
                        .long("message")
                        .short("m")
                        .value_name("text")
                        .takes_value(true)
                        .help("Text to send instead of the configured greeting."),
                ),
        )
}

#[cfg(feature = "jsonconfig")]
fn load_config(path: Option<&str>) -> DynResult<InviteConfig> {
    match path {
        Some(path) => InviteConfig::from_json_file(path.trim()),
        None => Ok(InviteConfig::default()),
    }
}

#[cfg(not(feature = "jsonconfig"))]
fn load_config(path: Option<&str>) -> DynResult<InviteConfig> {
    match path {
        Some(_) => Err("This build cannot read config files.".into()),
        None => Ok(InviteConfig::default()),
    }
}

fn address_source(parsed: &ArgMatches<'_>) -> DynResult<AddressSource> {
    if let Some(ip) = parsed.value_of("ip") {
        return Ok(AddressSource::Explicit(ip.trim().parse()?));
    }
    if parsed.is_present("local") {
        Ok(AddressSource::Local)
    } else {
        Ok(AddressSource::Public)
    }
}

fn apply_port(parsed: &ArgMatches<'_>, config: &mut InviteConfig) -> DynResult<()> {
    if let Some(port) = parsed.value_of("port") {
        config.port = port.trim().parse()?;
    }
    Ok(())
}

pub fn map_args(parsed: ArgMatches<'_>) -> DynResult<Args> {
    let mut config = load_config(parsed.value_of("config"))?;
    if let Some(dir) = parsed.value_of("words_dir") {
        config.words_dir = Some(PathBuf::from(dir));
    }
    if parsed.is_present("no_bundled_words") {
        config.use_bundled_words = false;
    }
    let extra_verbosity = parsed.occurrences_of("verbose").min(u64::from(u8::max_value())) as u8;
    config.verbosity = config.verbosity.saturating_add(extra_verbosity);
    let log_file = parsed.value_of("log_file").map(PathBuf::from);

    let command = match parsed.subcommand() {
        ("generate", Some(sub)) => {
            apply_port(sub, &mut config)?;
            if let Some(id) = sub.value_of("dictionary") {
                config.dictionary_id = id.trim().parse()?;
            }
            let formats = sub
                .values_of("format")
                .into_iter()
                .flatten()
                .map(str::parse)
                .collect::<Result<Vec<InviteFormat>, String>>()?;
            Command::Generate {
                source: address_source(sub)?,
                formats,
                ip_only: sub.is_present("ip_only"),
            }
        }
        ("decode", Some(sub)) => Command::Decode {
            invite: sub.value_of("invite").unwrap_or_default().to_owned(),
            ip_only: sub.is_present("ip_only"),
        },
        ("host", Some(sub)) => {
            apply_port(sub, &mut config)?;
            Command::Host {
                source: address_source(sub)?,
            }
        }
        ("connect", Some(sub)) => Command::Connect {
            invite: sub.value_of("invite").unwrap_or_default().to_owned(),
            message: sub.value_of("message").map(str::to_owned),
        },
        (other, _) => return Err(format!("Unknown command: {}", other).into()),
    };
    Ok(Args {
        config,
        log_file,
        command,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let matches = init_parser().get_matches_from_safe(args).unwrap();
        map_args(matches).unwrap()
    }

    #[test]
    fn test_generate() {
        let args = parse(&[
            "ipinvite", "-vv", "generate", "--ip", "10.0.0.2", "-p", "4000", "-f", "words", "-f",
            "hex", "-d", "7", "--ip-only",
        ]);
        assert_eq!(args.config.port, 4000);
        assert_eq!(args.config.dictionary_id, 7);
        assert_eq!(args.config.verbosity, 2);
        assert_eq!(
            args.command,
            Command::Generate {
                source: AddressSource::Explicit(Ipv4Addr::new(10, 0, 0, 2)),
                formats: vec![InviteFormat::Words, InviteFormat::Base16],
                ip_only: true,
            }
        );
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["ipinvite", "host"]);
        assert_eq!(args.config, InviteConfig::default());
        assert_eq!(
            args.command,
            Command::Host {
                source: AddressSource::Public
            }
        );
        let args = parse(&["ipinvite", "--no-bundled-words", "host", "--local"]);
        assert!(!args.config.use_bundled_words);
        assert_eq!(
            args.command,
            Command::Host {
                source: AddressSource::Local
            }
        );
    }

    #[test]
    fn test_invite_commands() {
        let args = parse(&["ipinvite", "connect", "1.2.3.4:5", "-m", "hi"]);
        assert_eq!(
            args.command,
            Command::Connect {
                invite: "1.2.3.4:5".to_owned(),
                message: Some("hi".to_owned()),
            }
        );
        let args = parse(&["ipinvite", "decode", "C0A80120EA60"]);
        assert_eq!(
            args.command,
            Command::Decode {
                invite: "C0A80120EA60".to_owned(),
                ip_only: false,
            }
        );
        let args = parse(&["ipinvite", "decode", "--ip-only", "silk-parker-parker-mambo-parker"]);
        assert_eq!(
            args.command,
            Command::Decode {
                invite: "silk-parker-parker-mambo-parker".to_owned(),
                ip_only: true,
            }
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        for bad in &[
            vec!["ipinvite", "generate", "--ip", "300.1.1.1"],
            vec!["ipinvite", "generate", "--port", "70000"],
            vec!["ipinvite", "generate", "-f", "morse"],
            vec!["ipinvite", "generate", "-d", "16"],
            vec!["ipinvite", "generate", "--ip", "1.1.1.1", "--local"],
            vec!["ipinvite", "decode"],
            vec!["ipinvite"],
        ] {
            assert!(init_parser().get_matches_from_safe(bad).is_err(), "{:?}", bad);
        }
    }
}
