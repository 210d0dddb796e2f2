//! One attach: process, runtime image and metadata catalog

use crate::config::{LocatorConfig, TargetConfig, WalkerConfig};
use crate::core::types::{MirrorError, MirrorResult};
use crate::metadata::MetadataCatalog;
use crate::process::RemoteProcess;
use crate::runtime::{self, RuntimeImage};
use crate::walker::Walker;
use std::sync::Arc;
use tracing::info;

/// Everything derived from a single attach. Dropped as a unit when the
/// target exits, since its descriptors are meaningless for a new process.
pub struct Session {
    process: Arc<RemoteProcess>,
    image: Arc<RuntimeImage>,
    catalog: Arc<MetadataCatalog>,
}

impl Session {
    /// Attaches by process name and waits for the runtime to come up
    ///
    /// Only failures to find or open the process become `AttachFailed`.
    pub fn attach(target: &TargetConfig, locator: &LocatorConfig) -> MirrorResult<Self> {
        let process = RemoteProcess::attach(&target.process_name).map_err(|e| match e {
            MirrorError::AttachFailed(_) => e,
            other => MirrorError::attach_failed(other.to_string()),
        })?;
        let image = runtime::locate_with_retry(&process, target, locator)?;
        Ok(Self::assemble(process, image))
    }

    /// Builds a session over an already opened process, without retrying
    pub fn from_process(process: RemoteProcess, target: &TargetConfig) -> MirrorResult<Self> {
        let image = runtime::locate(&process, target)?;
        Ok(Self::assemble(process, image))
    }

    fn assemble(process: RemoteProcess, image: RuntimeImage) -> Self {
        info!(
            pid = process.pid(),
            version = %image.version,
            assembly = %image.assembly_name,
            "Session established"
        );
        let process = Arc::new(process);
        let image = Arc::new(image);
        let catalog = Arc::new(MetadataCatalog::new(
            Arc::clone(&process),
            Arc::clone(&image),
        ));
        Session {
            process,
            image,
            catalog,
        }
    }

    pub fn process(&self) -> &Arc<RemoteProcess> {
        &self.process
    }

    pub fn image(&self) -> &Arc<RuntimeImage> {
        &self.image
    }

    pub fn catalog(&self) -> &Arc<MetadataCatalog> {
        &self.catalog
    }

    /// A fresh walker with an empty snapshot cache
    pub fn walker(&self, limits: &WalkerConfig) -> Walker<'_> {
        Walker::new(&self.catalog, limits)
    }

    pub fn is_alive(&self) -> bool {
        self.process.is_alive()
    }

    /// Names of all assemblies loaded in the target
    pub fn assembly_names(&self) -> MirrorResult<Vec<String>> {
        runtime::assembly_names(&self.process, &self.image)
    }
}
