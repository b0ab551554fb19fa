//! Back-buffer ownership and state tracking.

use tracing::debug;

use crate::backend::PresentationSurface;
use crate::error::{FrameError, Result};
use crate::types::{BufferState, FrameIndex, Transition};

/// One of the images owned by the presentation surface.
#[derive(Clone, Copy, Debug)]
pub struct BackBuffer<T> {
    /// Position in the surface.
    pub index: FrameIndex,
    /// State declared to the GPU by the most recent recorded transition.
    pub state: BufferState,
    /// Image and view the recorder targets.
    pub target: T,
}

/// Owns the presentation surface and the state of every back buffer.
///
/// Back buffers live in a fixed arena indexed by [`FrameIndex`]; every lookup
/// is bounds-checked.
pub struct SwapchainManager<S: PresentationSurface> {
    surface: S,
    buffers: Box<[BackBuffer<S::Target>]>,
}

impl<S: PresentationSurface> SwapchainManager<S> {
    /// Take ownership of a surface. Every back buffer starts presentable.
    pub fn new(surface: S) -> Result<Self> {
        let buffers = build_arena(&surface)?;
        debug!("Swapchain manager owns {} back buffers", buffers.len());
        Ok(Self { surface, buffers })
    }

    /// Number of back buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// The underlying surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Index of the back buffer to render next.
    pub fn current_index(&mut self) -> Result<FrameIndex> {
        let index = self.surface.current_index()?;
        self.back_buffer(index)?;
        Ok(index)
    }

    /// Look up a back buffer.
    pub fn back_buffer(&self, index: FrameIndex) -> Result<&BackBuffer<S::Target>> {
        self.buffers
            .get(index.as_usize())
            .ok_or(FrameError::BufferOutOfRange {
                index,
                count: self.buffers.len(),
            })
    }

    /// Move back buffer `index` into state `to`, returning the barrier to record.
    pub fn transition(&mut self, index: FrameIndex, to: BufferState) -> Result<Transition> {
        let count = self.buffers.len();
        let buffer = self
            .buffers
            .get_mut(index.as_usize())
            .ok_or(FrameError::BufferOutOfRange { index, count })?;

        if buffer.state == to {
            return Err(FrameError::InvalidBufferState {
                index,
                actual: buffer.state,
                expected: to.opposite(),
            });
        }

        let transition = Transition {
            before: buffer.state,
            after: to,
        };
        buffer.state = to;
        Ok(transition)
    }

    /// Present back buffer `index`. It must be back in the presentable state.
    pub fn present(&mut self, index: FrameIndex) -> Result<()> {
        let buffer = self.back_buffer(index)?;
        if buffer.state != BufferState::Presentable {
            return Err(FrameError::InvalidBufferState {
                index,
                actual: buffer.state,
                expected: BufferState::Presentable,
            });
        }

        self.surface.present(index)
    }

    /// Recreate the surface images. The GPU must be idle.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.resize(width, height)?;
        self.buffers = build_arena(&self.surface)?;
        debug!(
            "Back buffers rebuilt for {}x{} ({} buffers)",
            width,
            height,
            self.buffers.len()
        );
        Ok(())
    }
}

fn build_arena<S: PresentationSurface>(surface: &S) -> Result<Box<[BackBuffer<S::Target>]>> {
    let count = surface.buffer_count();
    if count == 0 {
        return Err(FrameError::Initialization(
            "presentation surface has no back buffers".to_string(),
        ));
    }

    (0..count)
        .map(|i| {
            let index = FrameIndex(i as u32);
            let target = surface.target(index).ok_or_else(|| {
                FrameError::Initialization(format!("back buffer {index} has no render target"))
            })?;
            Ok(BackBuffer {
                index,
                state: BufferState::Presentable,
                target,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoImages {
        current: u32,
        presented: Vec<u32>,
        count: usize,
    }

    impl TwoImages {
        fn new() -> Self {
            Self {
                current: 0,
                presented: Vec::new(),
                count: 2,
            }
        }
    }

    impl PresentationSurface for TwoImages {
        type Target = u32;

        fn buffer_count(&self) -> usize {
            self.count
        }

        fn target(&self, index: FrameIndex) -> Option<u32> {
            (index.as_usize() < self.count).then_some(100 + index.0)
        }

        fn current_index(&mut self) -> Result<FrameIndex> {
            Ok(FrameIndex(self.current))
        }

        fn present(&mut self, index: FrameIndex) -> Result<()> {
            self.presented.push(index.0);
            self.current = (index.0 + 1) % self.count as u32;
            Ok(())
        }

        fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
            self.count = 3;
            Ok(())
        }
    }

    #[test]
    fn buffers_start_presentable() {
        let manager = SwapchainManager::new(TwoImages::new()).unwrap();
        assert_eq!(manager.buffer_count(), 2);
        for i in 0..2 {
            let buffer = manager.back_buffer(FrameIndex(i)).unwrap();
            assert_eq!(buffer.state, BufferState::Presentable);
            assert_eq!(buffer.target, 100 + i);
        }
    }

    #[test]
    fn lookup_is_bounds_checked() {
        let manager = SwapchainManager::new(TwoImages::new()).unwrap();
        let err = manager.back_buffer(FrameIndex(2)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferOutOfRange {
                index: FrameIndex(2),
                count: 2
            }
        ));
    }

    #[test]
    fn transition_round_trip() {
        let mut manager = SwapchainManager::new(TwoImages::new()).unwrap();
        let index = FrameIndex(1);

        let first = manager.transition(index, BufferState::RenderTarget).unwrap();
        assert_eq!(first, Transition::TO_RENDER_TARGET);
        let second = manager.transition(index, BufferState::Presentable).unwrap();
        assert_eq!(second, Transition::TO_PRESENTABLE);

        assert_eq!(
            manager.back_buffer(index).unwrap().state,
            BufferState::Presentable
        );
        assert_eq!(
            manager.back_buffer(FrameIndex(0)).unwrap().state,
            BufferState::Presentable
        );
    }

    #[test]
    fn repeated_transition_rejected() {
        let mut manager = SwapchainManager::new(TwoImages::new()).unwrap();
        let err = manager
            .transition(FrameIndex(0), BufferState::Presentable)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidBufferState {
                actual: BufferState::Presentable,
                expected: BufferState::RenderTarget,
                ..
            }
        ));
    }

    #[test]
    fn present_requires_presentable_state() {
        let mut manager = SwapchainManager::new(TwoImages::new()).unwrap();
        manager
            .transition(FrameIndex(0), BufferState::RenderTarget)
            .unwrap();

        assert!(manager.present(FrameIndex(0)).is_err());
        assert!(manager.surface().presented.is_empty());

        manager
            .transition(FrameIndex(0), BufferState::Presentable)
            .unwrap();
        manager.present(FrameIndex(0)).unwrap();
        assert_eq!(manager.surface().presented, vec![0]);
        assert_eq!(manager.current_index().unwrap(), FrameIndex(1));
    }

    #[test]
    fn resize_rebuilds_arena() {
        let mut manager = SwapchainManager::new(TwoImages::new()).unwrap();
        manager
            .transition(FrameIndex(1), BufferState::RenderTarget)
            .unwrap();
        manager.resize(800, 600).unwrap();

        assert_eq!(manager.buffer_count(), 3);
        for i in 0..3 {
            assert_eq!(
                manager.back_buffer(FrameIndex(i)).unwrap().state,
                BufferState::Presentable
            );
        }
    }

    #[test]
    fn empty_surface_is_initialization_error() {
        let mut surface = TwoImages::new();
        surface.count = 0;
        let err = SwapchainManager::new(surface).err().unwrap();
        assert!(err.is_initialization());
    }
}
