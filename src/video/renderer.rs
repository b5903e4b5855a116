//! Renderer collaborator contract

use bitflags::bitflags;

use super::frame::VideoFrame;

bitflags! {
    /// Capability bits a renderer reports at pacer initialization
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RendererAttributes: u32 {
        /// Draw calls must originate on the thread that initialized the
        /// renderer. The pacer then skips its dedicated render thread
        /// and the owning thread drives drawing through
        /// `Pacer::render_on_main_thread`.
        const MAIN_THREAD_RENDERING = 1 << 0;
    }
}

/// A renderer that draws decoded frames to the display
///
/// Implementations are invoked from the pacer's render thread, or from
/// the embedding application's main thread when
/// [`RendererAttributes::MAIN_THREAD_RENDERING`] is set.
pub trait Renderer: Send + Sync {
    /// Capability bits, queried once during pacer initialization
    fn attributes(&self) -> RendererAttributes {
        RendererAttributes::empty()
    }

    /// Draw a frame
    ///
    /// The pacer retains ownership of the frame. The pixel buffer stays
    /// valid until one further frame has been drawn, so a GPU pipeline
    /// still referencing it is never handed freed memory.
    fn render_frame(&self, frame: &VideoFrame);
}
