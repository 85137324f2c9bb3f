//! `groupnest` command-line tool: validates a saved group hierarchy and logs
//! its outline.
//!
//! ```text
//! groupnest <hierarchy.json> [options.toml]
//! groupnest --presets <dir>
//! groupnest --schema <out.json>
//! ```
//!
//! Logs at `info` unless `RUST_LOG` says otherwise.

use std::path::Path;
use std::process;

use groupnest::error::GroupError;
use groupnest::hierarchy::Hierarchy;
use groupnest::options::Options;

/// One line per group, nested groups indented under their owner.
fn outline(hierarchy: &Hierarchy) -> Vec<String> {
    let mut lines = Vec::with_capacity(hierarchy.len());
    let mut stack: Vec<_> = hierarchy
        .top_level()
        .into_iter()
        .rev()
        .map(|id| (id, 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        let Some(group) = hierarchy.group(id) else {
            continue;
        };
        let shared = hierarchy.parents_of(id).len() > 1;
        lines.push(format!(
            "{:indent$}{} {} ({} members, {} nested){}",
            "",
            group.id(),
            group.name(),
            group.members().len(),
            group.child_groups().len(),
            if shared { " [shared]" } else { "" },
            indent = depth * 2,
        ));
        // Only owned children are expanded; shared ones appear under their
        // owner.
        stack.extend(
            group
                .child_groups()
                .iter()
                .rev()
                .filter(|&&c| {
                    hierarchy.group(c).and_then(|g| g.parent()) == Some(id)
                })
                .map(|&c| (c, depth + 1)),
        );
    }
    lines
}

const USAGE: &str = "Usage: groupnest <hierarchy.json> [options.toml] | \
                     --presets <dir> | --schema <out.json>";

fn fail(message: impl std::fmt::Display) -> ! {
    log::error!("{message}");
    process::exit(1);
}

/// Write the options JSON Schema, for editors that build a settings form.
fn write_schema(path: &Path) -> Result<(), GroupError> {
    let schema = serde_json::to_string_pretty(&Options::json_schema())
        .map_err(|e| GroupError::OptionsParse(e.to_string()))?;
    std::fs::write(path, schema)?;
    log::info!("wrote options schema to {}", path.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let mut args = std::env::args().skip(1);
    let Some(first) = args.next() else {
        fail(USAGE);
    };

    match first.as_str() {
        "--presets" => {
            let Some(dir) = args.next() else { fail(USAGE) };
            let presets = Options::list_presets(Path::new(&dir));
            if presets.is_empty() {
                log::info!("no presets in {dir}");
            }
            for name in presets {
                log::info!("{name}");
            }
            return;
        }
        "--schema" => {
            let Some(out) = args.next() else { fail(USAGE) };
            if let Err(e) = write_schema(Path::new(&out)) {
                fail(e);
            }
            return;
        }
        _ => {}
    }

    let options = match args.next() {
        Some(path) => match Options::load(Path::new(&path)) {
            Ok(options) => options,
            Err(e) => fail(e),
        },
        None => Options::default(),
    };

    let hierarchy = match Hierarchy::load(Path::new(&first)) {
        Ok(h) => h,
        Err(e) => fail(e),
    };

    log::info!(
        "{} groups, {} top-level, storage {:?}, tolerance {}",
        hierarchy.len(),
        hierarchy.top_level().len(),
        options.storage.mode,
        options.transform.tolerance,
    );
    for line in outline(&hierarchy) {
        log::info!("{line}");
    }
}
