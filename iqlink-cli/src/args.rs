//! Hand-rolled argument parsing.

pub const USAGE: &str = "\
usage:
  iqlink validate <file|->
  iqlink pretty <file|->
  iqlink source <config-file> <name>
  iqlink stream [--config <file>] [--blocks N]
  iqlink info";

const DEFAULT_BLOCKS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Validate { input: String },
    Pretty { input: String },
    Source { config: String, name: String },
    Stream { config: Option<String>, blocks: usize },
    Info,
}

pub fn parse<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut it = args.into_iter();
    let Some(sub) = it.next() else {
        return Ok(Command::Help);
    };

    let command = match sub.as_str() {
        "-h" | "--help" | "help" => Command::Help,
        "validate" => Command::Validate {
            input: required(&mut it, "input")?,
        },
        "pretty" => Command::Pretty {
            input: required(&mut it, "input")?,
        },
        "source" => Command::Source {
            config: required(&mut it, "config-file")?,
            name: required(&mut it, "name")?,
        },
        "stream" => {
            let mut config = None;
            let mut blocks = DEFAULT_BLOCKS;
            while let Some(flag) = it.next() {
                match flag.as_str() {
                    "--config" => config = Some(required(&mut it, "--config")?),
                    "--blocks" => {
                        let raw = required(&mut it, "--blocks")?;
                        blocks = raw
                            .parse::<usize>()
                            .map_err(|_| format!("--blocks expects a number, got '{raw}'"))?;
                    }
                    other => return Err(format!("unknown stream option '{other}'\n{USAGE}")),
                }
            }
            Command::Stream { config, blocks }
        }
        "info" => Command::Info,
        other => return Err(format!("unknown command '{other}'\n{USAGE}")),
    };

    if let Some(extra) = it.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }
    Ok(command)
}

fn required(it: &mut impl Iterator<Item = String>, what: &str) -> Result<String, String> {
    it.next().ok_or_else(|| format!("missing {what}\n{USAGE}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_strs(args: &[&str]) -> Result<Command, String> {
        parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse_strs(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn parses_source_command() {
        assert_eq!(
            parse_strs(&["source", "config.json", "sdrplay"]).unwrap(),
            Command::Source {
                config: "config.json".into(),
                name: "sdrplay".into()
            }
        );
    }

    #[test]
    fn parses_stream_flags() {
        assert_eq!(
            parse_strs(&["stream", "--blocks", "8", "--config", "pump.json"]).unwrap(),
            Command::Stream {
                config: Some("pump.json".into()),
                blocks: 8
            }
        );
        assert_eq!(
            parse_strs(&["stream"]).unwrap(),
            Command::Stream {
                config: None,
                blocks: DEFAULT_BLOCKS
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_strs(&["pretty"]).is_err());
        assert!(parse_strs(&["stream", "--blocks", "many"]).is_err());
        assert!(parse_strs(&["validate", "a.json", "b.json"]).is_err());
        assert!(parse_strs(&["frobnicate"]).is_err());
    }
}
