use skein_core::timefmt::date_prefix;
use skein_store::Store;
use std::collections::BTreeMap;

pub fn execute(store: &Store, json: bool) -> anyhow::Result<()> {
    let overlay = store.load_overlay();

    if json {
        println!("{}", serde_json::to_string_pretty(&overlay.resolutions)?);
        return Ok(());
    }

    if overlay.resolutions.is_empty() {
        println!("No resolved threads.");
        return Ok(());
    }

    let mut by_project: BTreeMap<&str, Vec<&skein_core::Resolution>> = BTreeMap::new();
    for resolution in &overlay.resolutions {
        by_project
            .entry(resolution.project.as_str())
            .or_default()
            .push(resolution);
    }

    for (project, resolutions) in by_project {
        println!("{project}:");
        for r in resolutions {
            let signal = match r.signal {
                skein_core::ResolutionSignal::Auto => "auto",
                skein_core::ResolutionSignal::Explicit => "explicit",
            };
            println!(
                "  {} [{}] {}",
                date_prefix(&r.resolved_at),
                signal,
                r.pending_text
            );
        }
    }
    Ok(())
}
