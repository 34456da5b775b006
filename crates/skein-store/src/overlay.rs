use crate::{write_atomic, Store};
use skein_core::timefmt::now_rfc3339;
use skein_core::Overlay;

impl Store {
    /// Load the resolution overlay. Missing or corrupt overlays read as
    /// "no resolutions yet" — the aggregation and listing paths must
    /// always produce a result.
    pub fn load_overlay(&self) -> Overlay {
        let path = self.overlay_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Overlay::default(),
        };
        match serde_json::from_str::<Overlay>(&content) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("corrupt overlay at {}: {e}; treating as empty", path.display());
                Overlay::default()
            }
        }
    }

    /// Persist the overlay via temp-then-rename. Bumps `last_updated`.
    /// If the rename fails the prior overlay remains authoritative.
    pub fn save_overlay(&self, overlay: &mut Overlay) -> anyhow::Result<()> {
        overlay.last_updated = now_rfc3339();
        let json = serde_json::to_string_pretty(overlay)?;
        write_atomic(&self.overlay_path(), json.as_bytes())
    }
}
