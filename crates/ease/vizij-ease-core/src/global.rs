//! Process-wide default manager.
//!
//! The engine is single-threaded, so "process-wide" means per thread. The
//! default instance is a convenience; any number of `Ease` managers may be
//! constructed directly.

use std::cell::RefCell;

use crate::config::EaseConfig;
use crate::manager::Ease;
use crate::Result;

thread_local! {
    static DEFAULT_EASE: RefCell<Option<Ease>> = const { RefCell::new(None) };
}

/// Install a fresh default manager, destroying any previous one.
///
/// Call at startup when the default configuration is not wanted.
pub fn init_default(config: EaseConfig) -> Result<Ease> {
    let ease = Ease::new(config)?;
    let previous = DEFAULT_EASE.with(|slot| slot.borrow_mut().replace(ease.clone()));
    if let Some(previous) = previous {
        previous.destroy();
    }
    Ok(ease)
}

/// The default manager, created with `EaseConfig::default()` on first use
/// (or after `destroy_default`).
pub fn default_ease() -> Ease {
    DEFAULT_EASE.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                log::debug!("creating default ease manager");
                Ease::default()
            })
            .clone()
    })
}

/// The default manager, if one exists.
pub fn try_default_ease() -> Option<Ease> {
    DEFAULT_EASE.with(|slot| slot.borrow().clone())
}

/// Check if a default manager is installed
pub fn is_default_initialized() -> bool {
    DEFAULT_EASE.with(|slot| slot.borrow().is_some())
}

/// Destroy and forget the default manager.
pub fn destroy_default() {
    let previous = DEFAULT_EASE.with(|slot| slot.borrow_mut().take());
    if let Some(previous) = previous {
        previous.destroy();
    }
}
