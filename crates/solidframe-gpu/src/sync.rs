//! Synchronization primitives.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{self, Result};
use ash::vk;
use solidframe_core::TimelineFence;

/// Create a binary semaphore.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::default();
    let semaphore = device.create_semaphore(&create_info, None)?;
    Ok(semaphore)
}

/// Create `count` binary semaphores, destroying the ones already made if any fails.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphores(device: &ash::Device, count: usize) -> Result<Vec<vk::Semaphore>> {
    create_all(
        count,
        || create_semaphore(device),
        |semaphore| device.destroy_semaphore(semaphore, None),
    )
}

/// Create `count` objects; on failure hand every earlier one to `destroy`.
pub(crate) fn create_all<T, E>(
    count: usize,
    mut create: impl FnMut() -> std::result::Result<T, E>,
    mut destroy: impl FnMut(T),
) -> std::result::Result<Vec<T>, E> {
    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        match create() {
            Ok(object) => created.push(object),
            Err(e) => {
                created.into_iter().for_each(&mut destroy);
                return Err(e);
            }
        }
    }
    Ok(created)
}

/// Create a timeline semaphore starting at `initial_value`.
///
/// # Safety
/// The device must be valid and have the timeline semaphore feature enabled.
pub unsafe fn create_timeline_semaphore(
    device: &ash::Device,
    initial_value: u64,
) -> Result<vk::Semaphore> {
    let mut type_info = vk::SemaphoreTypeCreateInfo::default()
        .semaphore_type(vk::SemaphoreType::TIMELINE)
        .initial_value(initial_value);
    let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut type_info);
    let semaphore = device.create_semaphore(&create_info, None)?;
    Ok(semaphore)
}

/// The frame fence: a timeline semaphore the queue signals and the CPU waits on.
pub struct TimelineSemaphore {
    device: Arc<ash::Device>,
    semaphore: vk::Semaphore,
}

impl TimelineSemaphore {
    /// Create a timeline semaphore at value zero.
    ///
    /// # Safety
    /// The device must be valid and outlive the semaphore.
    pub unsafe fn new(device: Arc<ash::Device>) -> Result<Self> {
        let semaphore = create_timeline_semaphore(&device, 0)?;
        Ok(Self { device, semaphore })
    }

    /// Get the raw semaphore handle.
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl TimelineFence for TimelineSemaphore {
    fn completed_value(&self) -> solidframe_core::Result<u64> {
        unsafe { self.device.get_semaphore_counter_value(self.semaphore) }
            .map_err(error::synchronization)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn wait(&self, value: u64, timeout: Option<Duration>) -> solidframe_core::Result<bool> {
        let timeout_ns = timeout.map_or(u64::MAX, |t| {
            u64::try_from(t.as_nanos()).unwrap_or(u64::MAX)
        });

        let semaphores = [self.semaphore];
        let values = [value];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores)
            .values(&values);

        match unsafe { self.device.wait_semaphores(&wait_info, timeout_ns) } {
            Ok(()) => Ok(true),
            Err(vk::Result::TIMEOUT) => Ok(false),
            Err(e) => Err(error::synchronization(e)),
        }
    }
}

impl Drop for TimelineSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn create_all_returns_every_object() {
        let mut next = 0;
        let created = create_all(
            3,
            || -> std::result::Result<u32, ()> {
                next += 1;
                Ok(next)
            },
            |_| panic!("nothing to destroy"),
        )
        .unwrap();
        assert_eq!(created, vec![1, 2, 3]);
    }

    #[test]
    fn create_all_destroys_earlier_objects_on_failure() {
        let destroyed = RefCell::new(Vec::new());
        let mut next = 0;
        let result = create_all(
            4,
            || {
                next += 1;
                if next == 3 {
                    Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
                } else {
                    Ok(next)
                }
            },
            |object| destroyed.borrow_mut().push(object),
        );

        assert_eq!(result, Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        assert_eq!(destroyed.into_inner(), vec![1, 2]);
    }
}
