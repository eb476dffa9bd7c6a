use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{diff_mask::DiffMask, error::DirtyChannelError, field_mutate::FieldMutate, FieldMutator};

/// Collects the dirty signals of every replicated field of one owner.
///
/// Collections hold a [`FieldMutator`] built from [`DirtyChannel::mutator`];
/// the tick scheduler keeps the channel and polls the mask to decide which
/// fields go into the next delta.
#[derive(Clone)]
pub struct DirtyChannel {
    mask: Arc<RwLock<DiffMask>>,
}

impl DirtyChannel {
    pub fn new(field_count: u8) -> Self {
        Self {
            mask: Arc::new(RwLock::new(DiffMask::for_fields(field_count))),
        }
    }

    pub fn mutator(&self) -> FieldMutator {
        FieldMutator::new(DirtySender {
            channel: self.clone(),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DiffMask>, DirtyChannelError> {
        self.mask
            .as_ref()
            .read()
            .map_err(|_| DirtyChannelError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DiffMask>, DirtyChannelError> {
        self.mask
            .as_ref()
            .write()
            .map_err(|_| DirtyChannelError::LockPoisoned)
    }

    pub fn is_clear(&self) -> Result<bool, DirtyChannelError> {
        Ok(self.read()?.is_clear())
    }

    /// Copy of the current mask
    pub fn mask(&self) -> Result<DiffMask, DirtyChannelError> {
        Ok(self.read()?.clone())
    }

    pub fn mark(&self, field_index: u8) -> Result<(), DirtyChannelError> {
        let mut mask = self.write()?;
        if !mask.set_bit(field_index, true) {
            return Err(DirtyChannelError::FieldOutOfRange {
                field_index,
                byte_count: mask.byte_count(),
            });
        }
        Ok(())
    }

    /// Returns the mask as it was and clears it
    pub fn take(&self) -> Result<DiffMask, DirtyChannelError> {
        let mut mask = self.write()?;
        let output = mask.clone();
        mask.clear();
        Ok(output)
    }

    pub fn clear(&self) -> Result<(), DirtyChannelError> {
        self.write()?.clear();
        Ok(())
    }
}

// DirtySender
#[derive(Clone)]
struct DirtySender {
    channel: DirtyChannel,
}

impl FieldMutate for DirtySender {
    fn mutate(&mut self, field_index: u8) -> bool {
        self.channel.mark(field_index).is_ok()
    }
}
