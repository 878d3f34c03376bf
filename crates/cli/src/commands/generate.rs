//! `stanblocks generate` — Assemble the baseline and sensitivity models.

use stanblocks_config::GeneratorConfig;
use stanblocks_core::{ModelAssembler, Role};

pub fn run(
    model_name: &str,
    config: &GeneratorConfig,
    dry_run: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let assembler = ModelAssembler::new(model_name, config.assembler_options());

    if dry_run {
        return preview(&assembler, json);
    }

    let report = assembler.assemble()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for written in &report.written {
        println!(
            "✅ Wrote {:<11} model: {} ({} bytes)",
            written.variant,
            written.path.display(),
            written.bytes
        );
    }
    if !report.extra_present {
        println!("   No extra blocks file, trailing section left empty");
    }

    Ok(())
}

/// Read and render everything, but leave the filesystem untouched.
fn preview(assembler: &ModelAssembler, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (baseline, sensitivity) = assembler.render(&assembler.source())?;

    if json {
        let documents: Vec<_> = [&baseline, &sensitivity]
            .into_iter()
            .map(|doc| {
                let section = doc.variant().section_of(Role::Hyperparameters);
                serde_json::json!({
                    "variant": doc.variant(),
                    "hyperparameters_section": section.map(|s| s.name),
                    "path": assembler.output_path(doc.variant()),
                    "bytes": doc.len(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "dry_run": true,
            "plan": assembler.plan(),
            "documents": documents,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("🔍 Dry run for {}", assembler.model_name());
    for doc in [&baseline, &sensitivity] {
        let section = doc
            .variant()
            .section_of(Role::Hyperparameters)
            .map_or("-", |s| s.name);
        println!(
            "   Would write {:<11} model: {} ({} bytes, hyperparameters in {section})",
            doc.variant(),
            assembler.output_path(doc.variant()).display(),
            doc.len()
        );
    }

    Ok(())
}
