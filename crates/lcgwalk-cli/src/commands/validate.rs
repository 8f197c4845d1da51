use lcgwalk_core::{Error, GeneratorParams, Result};
use lcgwalk_tests::{BatteryReport, TestConfig, run_battery};

use super::GeneratorArgs;

/// Exit status when `--strict` is set and some test rejected H0.
pub const EXIT_REJECTED: i32 = 2;

pub struct ValidateCommandConfig<'a> {
    pub generator: &'a GeneratorArgs,
    pub tests: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub alpha: f64,
    pub json: bool,
    pub output_path: Option<&'a str>,
    pub strict: bool,
}

pub fn run(cfg: ValidateCommandConfig<'_>) {
    let params = cfg.generator.params().unwrap_or_else(|e| super::fail(e));
    let config = load_config(cfg.tests, cfg.config_path).unwrap_or_else(|e| super::fail(e));

    let sample = params.generate();
    let results = run_battery(&sample, &config, cfg.alpha).unwrap_or_else(|e| super::fail(e));
    let report = BatteryReport::new(cfg.alpha, results);

    if cfg.json {
        let value = report_json(&params, &config, &report);
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{s}"),
            Err(e) => super::fail(e),
        }
    } else {
        print!("{}", render_report(&report));
    }

    if let Some(path) = cfg.output_path {
        let value = report_json(&params, &config, &report);
        match serde_json::to_string_pretty(&value) {
            Ok(s) => {
                super::write_output(path, &s);
                if !cfg.json {
                    println!("Report saved to {path}");
                }
            }
            Err(e) => super::fail(e),
        }
    }

    if cfg.strict && !report.verdict().all_approved() {
        std::process::exit(EXIT_REJECTED);
    }
}

/// Build the test selection from `--tests` or a `--config` JSON file.
/// An empty selection is an error: there is nothing to approve.
pub fn load_config(tests: Option<&str>, config_path: Option<&str>) -> Result<TestConfig> {
    let config = match (tests, config_path) {
        (Some(list), None) => TestConfig::parse_list(list)?,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::invalid(format!("cannot read {path}: {e}")))?;
            TestConfig::from_json(&text)?
        }
        (Some(_), Some(_)) => {
            return Err(Error::invalid("use either --tests or --config, not both"));
        }
        (None, None) => {
            return Err(Error::invalid(
                "no tests selected; pass --tests (e.g. \"all,chi=10,ks=10\") or --config",
            ));
        }
    };
    if config.enabled_count() == 0 {
        return Err(Error::invalid("no tests enabled"));
    }
    Ok(config)
}

fn report_json(
    params: &GeneratorParams,
    config: &TestConfig,
    report: &BatteryReport,
) -> serde_json::Value {
    serde_json::json!({
        "generator": {
            "seed": params.seed(),
            "k": params.k(),
            "c": params.c(),
            "exponent": params.exponent(),
            "count": params.count(),
        },
        "tests": config,
        "report": report,
    })
}

/// Human-readable battery summary.
pub fn render_report(report: &BatteryReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Statistical test battery (alpha = {})\n", report.alpha));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    for result in report.results.values() {
        let mark = if result.is_approved { "PASS" } else { "FAIL" };
        out.push_str(&format!("\n[{mark}] {}\n", result.test_name));
        out.push_str(&format!("  {}\n", result.decision));
        for (name, value) in &result.statistics {
            out.push_str(&format!("  {name:<26} {value:.6}\n"));
        }
    }

    let verdict = report.verdict();
    out.push_str(&format!("\n{}\n", "=".repeat(60)));
    out.push_str(&format!(
        "{}/{} tests approved, {} rejected: {}\n",
        verdict.approved,
        verdict.total,
        verdict.rejected(),
        if verdict.all_approved() {
            "sequence accepted"
        } else {
            "sequence rejected"
        }
    ));
    out
}
