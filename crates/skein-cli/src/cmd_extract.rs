use skein_oracle::{AnthropicOracle, Oracle};
use skein_store::Store;
use std::path::Path;

pub fn execute(
    store: &Store,
    session_id: &str,
    cwd: &Path,
    transcript: &Path,
) -> anyhow::Result<()> {
    let config = store.config();
    let ctx = skein_extract::extract_context(cwd, transcript, &config.workspace_roots)?;

    let oracle = AnthropicOracle::from_env(&config.model);
    let oracle_ref = oracle.as_ref().map(|o| o as &dyn Oracle);

    match skein_synth::synthesize(&ctx, session_id, oracle_ref) {
        Some(record) => {
            let path = store.write_record(&record)?;
            println!("Recorded session {} -> {}", session_id, path.display());
        }
        None => {
            println!("Session {session_id} was trivial; no record written");
        }
    }
    Ok(())
}
