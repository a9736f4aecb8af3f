//! Owning-entity lifecycle hooks
//!
//! The host calls these from its own save and reload paths. They own the
//! lifecycle logging for preference write-back:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure

use crate::errors::Result;
use crate::ops::overlay::PreferenceOverlay;
use crate::ops::store::PreferenceStore;
use crate::{log_op_end, log_op_error, log_op_start};

/// Flush pending preferences after the host entity was saved
///
/// Call exactly once per successful host save, never after a failed one.
/// `owner_id` is the id the host save assigned (or already had).
///
/// # Errors
///
/// Store failures are returned unchanged; the overlay keeps its dirty set.
pub fn after_save<S: PreferenceStore + ?Sized>(
    overlay: &mut PreferenceOverlay,
    store: &mut S,
    owner_id: &str,
) -> Result<usize> {
    log_op_start!(
        "after_save",
        owner_type = overlay.owner_type(),
        owner_id = owner_id
    );
    let start = std::time::Instant::now();

    overlay.mark_persisted(owner_id);
    let written = overlay.flush(store).map_err(|e| {
        log_op_error!(
            "after_save",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            owner_id = owner_id
        );
        e
    })?;

    log_op_end!(
        "after_save",
        duration_ms = start.elapsed().as_millis() as u64,
        owner_id = owner_id,
        written = written as u64
    );
    Ok(written)
}

/// Discard cached and pending preferences after the host entity reloaded
pub fn after_reload(overlay: &mut PreferenceOverlay) {
    let owner_id = overlay.owner_id().unwrap_or_default().to_string();
    log_op_start!(
        "after_reload",
        owner_type = overlay.owner_type(),
        owner_id = owner_id.as_str()
    );
    let start = std::time::Instant::now();

    overlay.reset();

    log_op_end!(
        "after_reload",
        duration_ms = start.elapsed().as_millis() as u64,
        owner_id = owner_id.as_str()
    );
}
