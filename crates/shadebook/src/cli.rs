use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "shadebook",
    author,
    version,
    about = "Interactive catalog of OpenGL teaching examples",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Example to open first: a 1-based position from `list` or a title substring.
    #[arg(value_name = "EXAMPLE")]
    pub example: Option<String>,

    /// Override the window size (e.g. `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Print the shader sources of each example as it is selected.
    #[arg(long)]
    pub show_source: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every example in catalog order and exit.
    List,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (w, h) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{trimmed}'"))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{trimmed}'"))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_variants() {
        assert_eq!(parse_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_size(" 1280X720 ").unwrap(), (1280, 720));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("800xtall").is_err());
    }
}
