use lcgwalk_core::{Sample, format_truncated};

use super::GeneratorArgs;

pub fn run(generator: &GeneratorArgs, format: &str, output_path: Option<&str>) {
    let params = generator.params().unwrap_or_else(|e| super::fail(e));
    let sample = params.generate();
    let rendered = render(&sample, format).unwrap_or_else(|e| super::fail(e));

    match output_path {
        Some(path) => {
            super::write_output(path, &rendered);
            println!("{} values written to {path}", sample.len());
        }
        None => print!("{rendered}"),
    }
}

/// Render a sample as `table`, `csv` or `json`.
pub fn render(sample: &Sample, format: &str) -> Result<String, String> {
    match format {
        "table" => Ok(render_table(sample)),
        "csv" => Ok(render_csv(sample)),
        "json" => {
            let draws: Vec<_> = sample.draws().collect();
            serde_json::to_string_pretty(&draws)
                .map(|s| s + "\n")
                .map_err(|e| e.to_string())
        }
        other => Err(format!("unknown format '{other}'")),
    }
}

fn state_text(state: Option<u64>) -> String {
    state.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}

fn render_table(sample: &Sample) -> String {
    let mut out = format!("{:>8} {:>22} {:>10}\n", "i", "Xi", "Ri");
    out.push_str(&format!("{}\n", "-".repeat(42)));
    for d in sample.draws() {
        out.push_str(&format!(
            "{:>8} {:>22} {:>10}\n",
            d.index,
            state_text(d.state),
            format_truncated(d.value)
        ));
    }
    out
}

fn render_csv(sample: &Sample) -> String {
    let mut out = String::from("i,Xi,Ri\n");
    for d in sample.draws() {
        out.push_str(&format!(
            "{},{},{}\n",
            d.index,
            state_text(d.state),
            format_truncated(d.value)
        ));
    }
    out
}
