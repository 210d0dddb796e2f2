//! Runtime bookkeeping layouts per Mono flavour and pointer width
//!
//! Only the runtime's own structures (assemblies, images, classes, fields,
//! vtables) are described here. Game types are never given fixed offsets;
//! their layout is read from the metadata these structures point at.

use crate::core::types::{Address, MirrorError, MirrorResult};
use crate::process::RemoteProcess;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mono runtime flavour shipped with the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeVersion {
    /// Legacy `mono.dll`
    V1,
    /// `mono-2.0-bdwgc.dll` before Unity 2021.2
    V2,
    /// `mono-2.0-bdwgc.dll` from Unity 2021.2 on
    V3,
}

impl RuntimeVersion {
    /// Parses a configuration value; `auto` yields `None`
    pub fn from_setting(setting: &str) -> Option<Self> {
        match setting.to_ascii_lowercase().as_str() {
            "v1" => Some(RuntimeVersion::V1),
            "v2" => Some(RuntimeVersion::V2),
            "v3" => Some(RuntimeVersion::V3),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeVersion::V1 => write!(f, "v1"),
            RuntimeVersion::V2 => write!(f, "v2"),
            RuntimeVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Where a class keeps its static field storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticStorage {
    /// Pointer stored in the vtable at `offset` (`MonoVTable.data`)
    VTableData { offset: usize },
    /// Pointer stored right after the vtable's method slots
    AfterVTable {
        class_vtable_size: usize,
        vtable_methods: usize,
    },
}

/// Offsets into the runtime's own structures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeLayout {
    pub version: RuntimeVersion,
    pub pointer_size: usize,

    pub assembly_aname: usize,
    pub assembly_image: usize,

    pub image_class_cache: usize,
    pub hash_table_size: usize,
    pub hash_table_table: usize,

    pub class_element_class: usize,
    pub class_rank: usize,
    pub class_instance_size: usize,
    pub class_parent: usize,
    pub class_name: usize,
    pub class_namespace: usize,
    pub class_fields: usize,
    pub class_field_count: usize,
    pub class_runtime_info: usize,
    pub class_next_cache: usize,

    pub field_type: usize,
    pub field_name: usize,
    pub field_offset: usize,
    pub field_stride: usize,

    pub type_data: usize,
    pub type_attrs: usize,

    /// `MonoGenericClass` fields
    pub generic_container: usize,
    pub generic_cached_class: usize,

    pub runtime_domain_vtables: usize,
    pub static_storage: StaticStorage,
}

impl RuntimeLayout {
    /// Layout table for a runtime flavour; `pointer_size` must be 4 or 8
    pub fn for_version(version: RuntimeVersion, pointer_size: usize) -> MirrorResult<Self> {
        let wide = match pointer_size {
            4 => false,
            8 => true,
            other => {
                return Err(MirrorError::UnsupportedRuntime(format!(
                    "pointer width {} is not supported",
                    other
                )))
            }
        };

        let (aname, image, class_cache, next_cache, name, fields, field_count, runtime_info) =
            match (wide, version) {
                (true, RuntimeVersion::V1) => (0x10, 0x58, 0x3D0, 0x100, 0x48, 0xA8, 0x94, 0xF8),
                (true, RuntimeVersion::V2) => (0x10, 0x60, 0x4C0, 0x108, 0x48, 0x98, 0x100, 0xD0),
                (true, RuntimeVersion::V3) => (0x10, 0x60, 0x4D0, 0x108, 0x48, 0x98, 0x100, 0xD0),
                (false, RuntimeVersion::V1) => (0x8, 0x40, 0x2A0, 0xA8, 0x30, 0x74, 0x64, 0xA4),
                (false, RuntimeVersion::V2) => (0x8, 0x44, 0x354, 0xA8, 0x2C, 0x60, 0xA4, 0x84),
                (false, RuntimeVersion::V3) => (0x8, 0x48, 0x35C, 0xA0, 0x2C, 0x60, 0x9C, 0x7C),
            };

        let parent = if wide {
            0x30
        } else if version == RuntimeVersion::V1 {
            0x24
        } else {
            0x20
        };

        let static_storage = match (wide, version) {
            (true, RuntimeVersion::V1) => StaticStorage::VTableData { offset: 0x18 },
            (false, RuntimeVersion::V1) => StaticStorage::VTableData { offset: 0xC },
            (true, RuntimeVersion::V2) => StaticStorage::AfterVTable {
                class_vtable_size: 0x5C,
                vtable_methods: 0x40,
            },
            (true, RuntimeVersion::V3) => StaticStorage::AfterVTable {
                class_vtable_size: 0x5C,
                vtable_methods: 0x48,
            },
            (false, RuntimeVersion::V2) => StaticStorage::AfterVTable {
                class_vtable_size: 0x38,
                vtable_methods: 0x28,
            },
            (false, RuntimeVersion::V3) => StaticStorage::AfterVTable {
                class_vtable_size: 0x38,
                vtable_methods: 0x2C,
            },
        };

        Ok(RuntimeLayout {
            version,
            pointer_size,
            assembly_aname: aname,
            assembly_image: image,
            image_class_cache: class_cache,
            hash_table_size: if wide { 0x18 } else { 0xC },
            hash_table_table: if wide { 0x20 } else { 0x14 },
            class_element_class: 0,
            class_rank: if wide { 0x1A } else { 0xE },
            class_instance_size: if wide { 0x1C } else { 0x10 },
            class_parent: parent,
            class_name: name,
            class_namespace: name + pointer_size,
            class_fields: fields,
            class_field_count: field_count,
            class_runtime_info: runtime_info,
            class_next_cache: next_cache,
            field_type: 0,
            field_name: pointer_size,
            field_offset: 3 * pointer_size,
            field_stride: 4 * pointer_size,
            type_data: 0,
            type_attrs: pointer_size,
            generic_container: 0,
            generic_cached_class: 4 * pointer_size,
            runtime_domain_vtables: pointer_size,
            static_storage,
        })
    }

    /// Managed object header: vtable and sync block pointers
    pub fn object_header_size(&self) -> usize {
        2 * self.pointer_size
    }

    pub fn string_length(&self) -> usize {
        self.object_header_size()
    }

    pub fn string_chars(&self) -> usize {
        self.object_header_size() + 4
    }

    /// `MonoArray.max_length`, after the header and the bounds pointer
    pub fn array_length(&self) -> usize {
        3 * self.pointer_size
    }

    pub fn array_data(&self) -> usize {
        4 * self.pointer_size
    }

    /// Reads a pointer of the runtime's width
    pub fn read_ptr(&self, process: &RemoteProcess, address: Address) -> MirrorResult<Address> {
        process.read_pointer_sized(address, self.pointer_size)
    }
}
