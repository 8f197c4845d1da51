pub mod generate;
pub mod server;
pub mod validate;

use std::fmt::Display;

use clap::Args;
use lcgwalk_core::{GeneratorParams, Result};

/// Generator parameters shared by `generate` and `validate`.
#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Initial state x0
    #[arg(long)]
    pub seed: u64,

    /// Multiplier parameter; a = 1 + 2k
    #[arg(long, allow_negative_numbers = true)]
    pub k: i64,

    /// Additive constant
    #[arg(long, allow_negative_numbers = true)]
    pub c: i64,

    /// Modulus exponent g; m = 2^g (1-64)
    #[arg(long)]
    pub exponent: u32,

    /// Number of values to generate
    #[arg(long)]
    pub count: usize,
}

impl GeneratorArgs {
    pub fn params(&self) -> Result<GeneratorParams> {
        GeneratorParams::new(self.seed, self.k, self.c, self.exponent, self.count)
    }
}

/// Print an error and exit with status 1.
pub fn fail(err: impl Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

/// Write `contents` to `path`, or exit on failure.
pub fn write_output(path: &str, contents: &str) {
    if let Err(e) = std::fs::write(path, contents) {
        fail(format!("failed to write {path}: {e}"));
    }
    log::info!("wrote {} bytes to {path}", contents.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        generator: GeneratorArgs,
    }

    fn parse(args: &[&str]) -> std::result::Result<Harness, clap::Error> {
        Harness::try_parse_from(std::iter::once("lcgwalk").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_generator_args() {
        let h = parse(&[
            "--seed", "1", "--k", "1", "--c", "1", "--exponent", "4", "--count", "5",
        ])
        .unwrap();
        let params = h.generator.params().unwrap();
        assert_eq!(params.multiplier(), 3);
        assert_eq!(params.modulus(), 16);
    }

    #[test]
    fn test_negative_k_and_c_accepted() {
        let h = parse(&[
            "--seed", "1", "--k", "-3", "--c", "-7", "--exponent", "8", "--count", "5",
        ])
        .unwrap();
        assert_eq!(h.generator.k, -3);
        assert_eq!(h.generator.c, -7);
    }

    #[test]
    fn test_missing_parameter_rejected() {
        assert!(parse(&["--seed", "1", "--k", "1", "--c", "1", "--exponent", "4"]).is_err());
    }

    #[test]
    fn test_invalid_exponent_reported_by_params() {
        let h = parse(&[
            "--seed", "1", "--k", "1", "--c", "1", "--exponent", "0", "--count", "5",
        ])
        .unwrap();
        assert!(h.generator.params().is_err());
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(path.to_str().unwrap(), "hello");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }
}
