use skein_resolve::UndoOutcome;
use skein_store::Store;

pub fn execute(store: &Store, search: &str) -> anyhow::Result<()> {
    if search.trim().is_empty() {
        println!("Nothing to search for.");
        return Ok(());
    }

    match skein_resolve::undo(store, search)? {
        UndoOutcome::Undone(resolution) => {
            println!(
                "Reopened [{}] \"{}\"",
                resolution.project, resolution.pending_text
            );
        }
        UndoOutcome::NotFound => {
            println!("No resolution matches \"{search}\".");
        }
    }
    Ok(())
}
