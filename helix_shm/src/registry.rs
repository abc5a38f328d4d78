//! Segment registry: maps interface names to shared memory regions.
//!
//! Owner side: a hardware or simulation module `create()`s a registry,
//! `add_segment()`s its interfaces and `publish_module_info()` at startup.
//! Attach side: any process resolves a module's interfaces by name — via a
//! `/dev/shm` scan or an out-of-band name→descriptor map — and requests
//! typed handles.
//!
//! All registry operations may establish memory mappings and are
//! non-realtime; they must never be invoked from the control cycle. Handle
//! accessors obtained here are what the cycle uses.

use crate::error::{ShmError, ShmResult};
use crate::handle::{InterfaceHandle, InterfaceHandleMut, StrictHandle, StrictHandleMut};
use crate::interface::Interface;
use crate::interfaces::CycleState;
use crate::module_info::ModuleInfo;
use crate::platform::get_current_pid;
use crate::segment::MappedSegment;
use helix::consts::{CYCLE_STATE_INTERFACE, MODULE_INFO_INTERFACE, SHM_PREFIX};
use helix::guard::assert_non_realtime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::os::fd::{AsFd, OwnedFd};
use std::sync::{Arc, Mutex};

/// Sidecar metadata written next to each segment file, for discovery
/// tooling that wants segment facts without mapping the segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Module that published the segment.
    pub module: String,
    /// Interface name within the module.
    pub interface: String,
    /// Payload type id.
    pub type_id: String,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// PID of the publishing process.
    pub writer_pid: u32,
}

/// Extension of segment metadata sidecar files.
const META_SUFFIX: &str = ".meta";

/// Enumerate the modules that have published segments under `dir`.
///
/// Reads the metadata sidecars only; no segment is mapped.
pub fn discover_modules(dir: &str) -> ShmResult<Vec<String>> {
    let mut modules = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        if !file_name.starts_with(SHM_PREFIX) || !file_name.ends_with(META_SUFFIX) {
            continue;
        }
        let raw = std::fs::read_to_string(entry.path())?;
        let Ok(meta) = serde_json::from_str::<SegmentMetadata>(&raw) else {
            continue;
        };
        if !modules.contains(&meta.module) {
            modules.push(meta.module);
        }
    }
    modules.sort();
    Ok(modules)
}

/// Default directory for Helix segment files.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

/// Access mode a registry was opened with.
///
/// Read-only registries refuse to hand out mutable handles; the mapping
/// itself is always shared so that handle refcounts in the segment header
/// stay accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Value accessors only.
    ReadOnly,
    /// Value accessors plus in-place mutation.
    ReadWrite,
}

enum SegmentSource {
    Path(String),
    Descriptor(OwnedFd),
}

/// Maps interface names to shared memory segments and hands out typed
/// handles over them.
pub struct SegmentRegistry {
    module: String,
    mode: AccessMode,
    owned: bool,
    dir: String,
    sources: HashMap<String, SegmentSource>,
    mapped: Mutex<HashMap<String, Arc<MappedSegment>>>,
    // Owner side: registration order plus required flags, for module info.
    registered: Vec<(String, bool)>,
}

impl SegmentRegistry {
    /// Create a registry owning the segments of `module`.
    ///
    /// Segment files are created under `/dev/shm` as the module publishes
    /// interfaces and removed again when the registry is dropped.
    pub fn create(module: &str) -> ShmResult<Self> {
        Self::create_in(DEFAULT_SHM_DIR, module)
    }

    /// Like [`SegmentRegistry::create`], with an explicit directory.
    pub fn create_in(dir: &str, module: &str) -> ShmResult<Self> {
        assert_non_realtime("create segment registry");
        Ok(Self {
            module: module.to_string(),
            mode: AccessMode::ReadWrite,
            owned: true,
            dir: dir.to_string(),
            sources: HashMap::new(),
            mapped: Mutex::new(HashMap::new()),
            registered: Vec::new(),
        })
    }

    /// Attach to the segments `module` has published under `/dev/shm`.
    ///
    /// Returns `NotFound` if the module has published nothing.
    pub fn attach(module: &str, mode: AccessMode) -> ShmResult<Self> {
        Self::attach_in(DEFAULT_SHM_DIR, module, mode)
    }

    /// Like [`SegmentRegistry::attach`], with an explicit directory.
    pub fn attach_in(dir: &str, module: &str, mode: AccessMode) -> ShmResult<Self> {
        assert_non_realtime("attach segment registry");
        let prefix = format!("{SHM_PREFIX}{module}_");
        let mut sources = HashMap::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some(name) = file_name.strip_prefix(&prefix) {
                if name.ends_with(META_SUFFIX) {
                    continue;
                }
                sources.insert(
                    name.to_string(),
                    SegmentSource::Path(format!("{dir}/{file_name}")),
                );
            }
        }

        if sources.is_empty() {
            return Err(ShmError::NotFound {
                name: module.to_string(),
            });
        }

        Ok(Self {
            module: module.to_string(),
            mode,
            owned: false,
            dir: dir.to_string(),
            sources,
            mapped: Mutex::new(HashMap::new()),
            registered: Vec::new(),
        })
    }

    /// Attach using an out-of-band name→descriptor map (e.g. received over
    /// a domain socket from a supervising process).
    pub fn from_descriptors(
        module: &str,
        descriptors: HashMap<String, OwnedFd>,
        mode: AccessMode,
    ) -> ShmResult<Self> {
        assert_non_realtime("attach segment registry");
        if descriptors.is_empty() {
            return Err(ShmError::NotFound {
                name: module.to_string(),
            });
        }
        let sources = descriptors
            .into_iter()
            .map(|(name, fd)| (name, SegmentSource::Descriptor(fd)))
            .collect();
        Ok(Self {
            module: module.to_string(),
            mode,
            owned: false,
            dir: String::new(),
            sources,
            mapped: Mutex::new(HashMap::new()),
            registered: Vec::new(),
        })
    }

    /// Module name this registry serves.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Names of all interfaces this registry can resolve.
    pub fn interface_names(&self) -> Vec<String> {
        if self.owned {
            self.registered.iter().map(|(n, _)| n.clone()).collect()
        } else {
            self.sources.keys().cloned().collect()
        }
    }

    fn path_for(&self, name: &str) -> String {
        format!("{}/{}{}_{}", self.dir, SHM_PREFIX, self.module, name)
    }

    /// Publish a new interface segment initialized to `T`'s default payload.
    pub fn add_segment<T: Interface>(&mut self, name: &str, required: bool) -> ShmResult<()> {
        self.add_segment_with::<T>(name, required, T::init)
    }

    /// Publish a new interface segment with a custom payload initializer
    /// (e.g. a variable-layout payload built for a specific `num_dof`).
    pub fn add_segment_with<T: Interface>(
        &mut self,
        name: &str,
        required: bool,
        init: impl FnOnce(&mut [u8]) -> ShmResult<()>,
    ) -> ShmResult<()> {
        assert_non_realtime("publish interface segment");
        if !self.owned {
            return Err(ShmError::PermissionDenied {
                name: name.to_string(),
            });
        }
        if self.registered.iter().any(|(n, _)| n == name) {
            return Err(ShmError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let path = self.path_for(name);
        let segment = MappedSegment::create(name, &path, T::TYPE_ID, T::MAX_SIZE)?;
        // SAFETY: the segment was just created and is not yet visible to
        // any handle; this thread is the only accessor.
        init(unsafe { segment.payload_mut() })?;

        let metadata = SegmentMetadata {
            module: self.module.clone(),
            interface: name.to_string(),
            type_id: T::TYPE_ID.to_string(),
            payload_size: T::MAX_SIZE,
            writer_pid: get_current_pid(),
        };
        std::fs::write(
            format!("{path}{META_SUFFIX}"),
            serde_json::to_string_pretty(&metadata)
                .map_err(|e| ShmError::Io { source: e.into() })?,
        )?;

        tracing::debug!(
            module = %self.module,
            interface = name,
            type_id = T::TYPE_ID,
            size = T::MAX_SIZE,
            "published interface segment"
        );

        self.mapped
            .lock()
            .expect("segment map lock poisoned")
            .insert(name.to_string(), Arc::new(segment));
        self.registered.push((name.to_string(), required));
        Ok(())
    }

    /// Publish the reserved module-info segment enumerating every interface
    /// registered so far. Call last, after all `add_segment` calls.
    pub fn publish_module_info(&mut self) -> ShmResult<()> {
        let mut info = ModuleInfo::default();
        for (name, required) in &self.registered {
            info.push(name, *required)?;
        }
        self.add_segment_with::<ModuleInfo>(MODULE_INFO_INTERFACE, true, move |buf| {
            ModuleInfo::init(buf)?;
            *ModuleInfo::view_mut(buf) = info;
            Ok(())
        })
    }

    /// Resolve the named segment, mapping it if not already mapped.
    fn segment(&self, name: &str) -> ShmResult<Arc<MappedSegment>> {
        let mut mapped = self.mapped.lock().expect("segment map lock poisoned");
        if let Some(segment) = mapped.get(name) {
            return Ok(Arc::clone(segment));
        }

        assert_non_realtime("map interface segment");
        let source = self.sources.get(name).ok_or_else(|| ShmError::NotFound {
            name: name.to_string(),
        })?;
        let segment = match source {
            SegmentSource::Path(path) => MappedSegment::attach(name, path)?,
            SegmentSource::Descriptor(fd) => MappedSegment::attach_fd(name, fd.as_fd())?,
        };
        tracing::debug!(
            module = %self.module,
            interface = name,
            "mapped interface segment"
        );

        let segment = Arc::new(segment);
        mapped.insert(name.to_string(), Arc::clone(&segment));
        Ok(segment)
    }

    /// Read-only handle to the named interface.
    pub fn get<T: Interface>(&self, name: &str) -> ShmResult<InterfaceHandle<T>> {
        InterfaceHandle::new(self.segment(name)?)
    }

    /// Read-write handle to the named interface.
    ///
    /// Fails with `PermissionDenied` on registries attached read-only.
    pub fn get_mut<T: Interface>(&self, name: &str) -> ShmResult<InterfaceHandleMut<T>> {
        if self.mode == AccessMode::ReadOnly {
            return Err(ShmError::PermissionDenied {
                name: name.to_string(),
            });
        }
        InterfaceHandleMut::new(self.segment(name)?)
    }

    /// Read-only handle checked against the module's cycle counter on every
    /// access.
    pub fn get_strict<T: Interface>(&self, name: &str) -> ShmResult<StrictHandle<T>> {
        let interface = self.get::<T>(name)?;
        let cycle_state = self.get::<CycleState>(CYCLE_STATE_INTERFACE)?;
        Ok(StrictHandle::new(interface, cycle_state))
    }

    /// Read-write handle checked against the module's cycle counter on read.
    pub fn get_strict_mut<T: Interface>(&self, name: &str) -> ShmResult<StrictHandleMut<T>> {
        let interface = self.get_mut::<T>(name)?;
        let cycle_state = self.get::<CycleState>(CYCLE_STATE_INTERFACE)?;
        Ok(StrictHandleMut::new(interface, cycle_state))
    }

    /// The module-info enumeration this module published.
    pub fn module_info(&self) -> ShmResult<InterfaceHandle<ModuleInfo>> {
        self.get::<ModuleInfo>(MODULE_INFO_INTERFACE)
    }
}

impl Drop for SegmentRegistry {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        for (name, _) in &self.registered {
            let path = self.path_for(name);
            let _ = std::fs::remove_file(format!("{path}{META_SUFFIX}"));
            let _ = std::fs::remove_file(path);
        }
        tracing::debug!(module = %self.module, "removed published segments");
    }
}
