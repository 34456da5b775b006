use skein_resolve::ExplicitOutcome;
use skein_store::Store;

pub fn execute(store: &Store, search: &str) -> anyhow::Result<()> {
    if search.trim().is_empty() {
        println!("Nothing to search for.");
        return Ok(());
    }

    match skein_resolve::resolve_explicit(store, search)? {
        ExplicitOutcome::Resolved(resolution) => {
            println!(
                "Resolved [{}] \"{}\"",
                resolution.project, resolution.pending_text
            );
        }
        ExplicitOutcome::Ambiguous(candidates) => {
            println!("\"{search}\" matches {} pending threads:", candidates.len());
            for item in &candidates {
                println!("  [{}] {} ({}d old)", item.project, item.text, item.age_in_days);
            }
            println!("Narrow the search; refusing to guess.");
        }
        ExplicitOutcome::AlreadyResolved(existing) => {
            println!(
                "Already resolved [{}] \"{}\" on {}",
                existing.project, existing.pending_text, existing.resolved_at
            );
        }
        ExplicitOutcome::NotFound => {
            println!("No pending thread matches \"{search}\".");
        }
    }
    Ok(())
}
