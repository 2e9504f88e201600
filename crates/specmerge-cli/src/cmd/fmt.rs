use crate::cmd::read_spec;
use anyhow::Context;
use specmerge_core::{io, parse, serialize, serializer::lost_lines, syntax};
use std::path::Path;

pub fn run(path: &Path, write: bool) -> anyhow::Result<()> {
    let text = read_spec(path)?;
    if syntax::has_delta_sections(&text) {
        anyhow::bail!(
            "{} is a delta document; only baseline specs can be formatted",
            path.display()
        );
    }

    let formatted = serialize(&parse(&text));
    let lost = lost_lines(&text, &formatted);
    for (line, raw) in &lost {
        eprintln!(
            "warning: {}:{line}: not kept by canonical form: {}",
            path.display(),
            raw.trim()
        );
    }

    if !write {
        print!("{formatted}");
        return Ok(());
    }

    if !lost.is_empty() {
        anyhow::bail!(
            "refusing to rewrite {}: formatting would drop {} line(s)",
            path.display(),
            lost.len()
        );
    }
    if formatted == text {
        println!("{}: already formatted", path.display());
        return Ok(());
    }
    io::atomic_write(path, formatted.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("{}: formatted", path.display());
    Ok(())
}
