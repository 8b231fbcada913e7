//! Command-line argument parsing for modalbar.

use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    /// Config file to use instead of the default location.
    pub config: Option<PathBuf>,
    /// Print the effective configuration as TOML and exit.
    pub print_config: bool,
}

impl Args {
    /// Parse command-line arguments from `std::env::args()`.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        match Self::parse_from(&args) {
            Ok(args) => args,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!("Usage: modalbar [--config PATH] [--print-config]");
                std::process::exit(1);
            }
        }
    }

    fn parse_from(args: &[String]) -> Result<Self, String> {
        let mut parsed = Args::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    let path = args
                        .get(i + 1)
                        .ok_or_else(|| format!("{} requires a value", args[i]))?;
                    parsed.config = Some(PathBuf::from(path));
                    i += 2;
                }
                "--print-config" => {
                    parsed.print_config = true;
                    i += 1;
                }
                other => return Err(format!("unknown argument `{}`", other)),
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Args::parse_from(&args)
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_parse_flags() {
        let args = parse(&["--config", "/tmp/bar.toml", "--print-config"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/bar.toml")));
        assert!(args.print_config);

        let args = parse(&["-c", "x.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }
}
