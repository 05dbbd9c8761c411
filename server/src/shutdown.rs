//! Process-wide shutdown flag.
//!
//! The interrupt handler only stores `true`; every loop that could otherwise
//! block forever polls [`Shutdown::is_triggered`] instead.

use crate::error::ServerError;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes Ctrl+C into this flag.
    pub fn install_interrupt_handler(&self) -> Result<(), ServerError> {
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })?;
        info!("Interrupt handler installed, press Ctrl+C to shut down");
        Ok(())
    }

    /// Sets the flag. It is never cleared again.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        assert!(!observer.is_triggered());

        shutdown.trigger();
        assert!(observer.is_triggered());

        shutdown.trigger();
        assert!(observer.is_triggered());
    }

    #[test]
    fn test_second_interrupt_handler_is_refused() {
        let shutdown = Shutdown::new();
        let _ = shutdown.install_interrupt_handler();
        assert!(matches!(
            shutdown.install_interrupt_handler(),
            Err(ServerError::Signal(_))
        ));
        assert!(!shutdown.is_triggered());
    }

    #[test]
    fn test_visible_across_threads() {
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        std::thread::spawn(move || remote.trigger()).join().unwrap();
        assert!(shutdown.is_triggered());
    }
}
