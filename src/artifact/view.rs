//! Narrowed classpath window.

use std::path::PathBuf;

use super::{ArtifactSet, BuildContext};

/// Guard that narrows the visible artifacts to the project's direct runtime
/// dependencies for as long as it lives.
///
/// The previous visible set is restored by [`ArtifactView::restore`] or, on
/// every other exit path, when the guard is dropped. The guard holds the
/// build context exclusively, so two windows can never overlap.
#[derive(Debug)]
pub struct ArtifactView<'a> {
    context: &'a mut BuildContext,
    snapshot: Option<ArtifactSet>,
}

impl<'a> ArtifactView<'a> {
    /// Open a narrowed window on `context`.
    pub fn narrow(context: &'a mut BuildContext) -> Self {
        tracing::info!("Configuring classpath...");
        let narrowed = context.artifacts().direct_runtime();
        tracing::debug!(
            "Classpath limited to {} of {} project artifacts",
            narrowed.len(),
            context.artifacts().len()
        );
        let snapshot = context.replace_visible(narrowed);
        Self {
            context,
            snapshot: Some(snapshot),
        }
    }

    /// Roots searched for controller types: the output directory first, then
    /// the visible artifact locations in declaration order.
    #[must_use]
    pub fn classpath_roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.context.output_dir().to_path_buf())
            .chain(self.context.visible().paths().map(std::path::Path::to_path_buf))
            .collect()
    }

    /// The build context seen through this window.
    #[must_use]
    pub fn context(&self) -> &BuildContext {
        &*self.context
    }

    /// Close the window, returning the narrowed set that was visible.
    pub fn restore(mut self) -> ArtifactSet {
        self.reset().unwrap_or_default()
    }

    fn reset(&mut self) -> Option<ArtifactSet> {
        let snapshot = self.snapshot.take()?;
        tracing::info!("Resetting classpath...");
        Some(self.context.replace_visible(snapshot))
    }
}

impl Drop for ArtifactView<'_> {
    fn drop(&mut self) {
        self.reset();
    }
}
