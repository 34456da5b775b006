use skein_oracle::{AnthropicOracle, Oracle};
use skein_store::Store;
use time::OffsetDateTime;

pub fn execute(store: &Store, json: bool) -> anyhow::Result<()> {
    let config = store.config();
    let oracle = AnthropicOracle::from_env(&config.model);
    let oracle_ref = oracle.as_ref().map(|o| o as &dyn Oracle);

    let report =
        skein_resolve::check_for_resolutions(store, oracle_ref, OffsetDateTime::now_utc())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if oracle.is_none() {
        println!("No reasoning credential; candidates were scored but none confirmed.");
    }
    println!(
        "Checked {} pending thread(s), {} candidate(s), {} unconfirmed.",
        report.pending_checked, report.candidates_considered, report.unconfirmed
    );
    for resolution in &report.resolved {
        println!(
            "Resolved [{}] \"{}\" by \"{}\"",
            resolution.project, resolution.pending_text, resolution.resolved_by
        );
    }
    if report.resolved.is_empty() {
        println!("No threads resolved this run.");
    }
    Ok(())
}
