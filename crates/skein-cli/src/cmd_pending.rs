use skein_store::Store;

pub fn execute(store: &Store, all: bool, json: bool) -> anyhow::Result<()> {
    let items = skein_resolve::load_pending(store, all);

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No pending threads.");
        return Ok(());
    }

    for item in &items {
        let stale = if item.is_stale { " [stale]" } else { "" };
        let seen = if item.occurrences > 1 {
            format!(", seen {}x", item.occurrences)
        } else {
            String::new()
        };
        println!(
            "{:>4}d{}  {}  {}{}",
            item.age_in_days, stale, item.project, item.text, seen
        );
    }
    Ok(())
}
