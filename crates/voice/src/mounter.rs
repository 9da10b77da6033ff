//! Storage bring-up with configuration fallback.
//!
//! Walks [`MOUNT_SEQUENCE`] in order and keeps the card mounted at the
//! first configuration that works. Bring-up runs once per boot; a card that
//! fails every configuration stays unmounted until the next restart.

use platform::{MountConfig, Storage, MOUNT_SEQUENCE};
use thiserror_no_std::Error;

/// Every configuration in the sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountError {
    /// No configuration brought the card online.
    #[error("SD card mount failed at all {attempts} configurations")]
    AllConfigurationsFailed {
        /// Number of configurations tried.
        attempts: usize,
    },
}

/// A mounted volume.
///
/// Only [`StorageMounter`] can produce one, so holding a `MountedStorage`
/// is proof that the card came up.
pub struct MountedStorage<S> {
    storage: S,
    config: MountConfig,
}

impl<S: Storage> MountedStorage<S> {
    /// Configuration the card was mounted with.
    pub fn config(&self) -> MountConfig {
        self.config
    }

    /// Borrow the underlying storage driver.
    pub fn storage(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// Ordered mount-attempt runner.
pub struct StorageMounter<'a> {
    sequence: &'a [MountConfig],
}

impl StorageMounter<'static> {
    /// Mounter over the board's [`MOUNT_SEQUENCE`].
    pub const fn new() -> Self {
        Self {
            sequence: &MOUNT_SEQUENCE,
        }
    }
}

impl Default for StorageMounter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StorageMounter<'a> {
    /// Mounter over a custom ordered sequence.
    pub const fn with_sequence(sequence: &'a [MountConfig]) -> Self {
        Self { sequence }
    }

    /// Try each configuration in order; stop at the first success.
    ///
    /// On failure the driver is dropped: nothing later in this boot may
    /// touch the card.
    pub async fn mount<S: Storage>(&self, mut storage: S) -> Result<MountedStorage<S>, MountError> {
        for (attempt, &config) in self.sequence.iter().enumerate() {
            tracing::debug!(
                "sd: mount attempt {} ({} bus @ {} kHz)",
                attempt.saturating_add(1),
                config.bus.as_str(),
                config.clock_khz()
            );
            match storage.mount(config).await {
                Ok(()) => {
                    tracing::info!(
                        "sd: mounted ({} bus @ {} kHz)",
                        config.bus.as_str(),
                        config.clock_khz()
                    );
                    return Ok(MountedStorage { storage, config });
                }
                Err(_e) => {
                    tracing::debug!("sd: {} bus @ {} kHz failed", config.bus.as_str(), config.clock_khz());
                }
            }
        }
        tracing::error!("sd: mount failed at all {} configurations", self.sequence.len());
        Err(MountError::AllConfigurationsFailed {
            attempts: self.sequence.len(),
        })
    }
}
