//! Name-based metadata resolution against the remote class cache

use super::descriptor::{FieldDescriptor, TypeDescriptor, TypeKind};
use super::tag::TypeTag;
use crate::core::types::{Address, MirrorError, MirrorResult};
use crate::process::RemoteProcess;
use crate::runtime::{RuntimeImage, RuntimeLayout, StaticStorage};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

const NAME_MAX: usize = 512;
const MAX_PARENT_DEPTH: usize = 64;
const MAX_FIELDS: usize = 4096;
const MAX_BUCKETS: usize = 1 << 20;
const MAX_CHAIN: usize = 4096;

const FIELD_ATTR_STATIC: u32 = 0x10;
const FIELD_ATTR_LITERAL: u32 = 0x40;

/// Per-session type cache over the game image's class cache.
///
/// Descriptors are only valid for the [`RuntimeImage`] they were read from.
pub struct MetadataCatalog {
    process: Arc<RemoteProcess>,
    image: Arc<RuntimeImage>,
    by_name: DashMap<String, Arc<TypeDescriptor>>,
    by_class: DashMap<Address, Arc<TypeDescriptor>>,
}

impl MetadataCatalog {
    pub fn new(process: Arc<RemoteProcess>, image: Arc<RuntimeImage>) -> Self {
        MetadataCatalog {
            process,
            image,
            by_name: DashMap::new(),
            by_class: DashMap::new(),
        }
    }

    pub fn layout(&self) -> &RuntimeLayout {
        &self.image.layout
    }

    pub fn process(&self) -> &RemoteProcess {
        &self.process
    }

    /// Number of classes described so far
    pub fn cached_classes(&self) -> usize {
        self.by_class.len()
    }

    /// Resolves `Namespace.Name` or a bare class name; first match wins
    pub fn resolve_type(&self, name: &str) -> MirrorResult<Arc<TypeDescriptor>> {
        if let Some(found) = self.by_name.get(name) {
            return Ok(Arc::clone(found.value()));
        }

        let (namespace, short) = match name.rsplit_once('.') {
            Some((namespace, short)) => (Some(namespace), short),
            None => (None, name),
        };

        for class in self.class_cache()? {
            let Ok(class_name) = self.read_name(class + self.layout().class_name) else {
                continue;
            };
            if class_name != short {
                continue;
            }
            if let Some(namespace) = namespace {
                match self.read_name(class + self.layout().class_namespace) {
                    Ok(ns) if ns == namespace => {}
                    _ => continue,
                }
            }
            let descriptor = self.describe_class(class)?;
            debug!(name, class = %class, fields = descriptor.fields.len(), "Type resolved");
            self.by_name.insert(name.to_string(), Arc::clone(&descriptor));
            return Ok(descriptor);
        }

        debug!(name, "Type not found in class cache");
        Err(MirrorError::UnknownType(name.to_string()))
    }

    /// Describes the class at `class`, e.g. the concrete class of an object
    pub fn describe_class(&self, class: Address) -> MirrorResult<Arc<TypeDescriptor>> {
        self.describe_at_depth(class, 0)
    }

    fn describe_at_depth(&self, class: Address, depth: usize) -> MirrorResult<Arc<TypeDescriptor>> {
        if let Some(found) = self.by_class.get(&class) {
            return Ok(Arc::clone(found.value()));
        }
        if depth > MAX_PARENT_DEPTH {
            return Err(MirrorError::decode_failed(class, "class hierarchy too deep"));
        }
        if class.is_null() {
            return Err(MirrorError::decode_failed(class, "null class pointer"));
        }

        let layout = *self.layout();
        let process = &*self.process;

        let name = self.read_name(class + layout.class_name)?;
        let namespace = self.read_name(class + layout.class_namespace)?;
        let parent = Some(layout.read_ptr(process, class + layout.class_parent)?)
            .filter(|p| !p.is_null() && *p != class);
        let parent_desc = match parent {
            Some(parent) => Some(self.describe_at_depth(parent, depth + 1)?),
            None => None,
        };

        let rank = process.read_u8(class + layout.class_rank)?;
        let instance_size = process.read_u32(class + layout.class_instance_size)? as usize;
        let element_class = if rank > 0 {
            Some(layout.read_ptr(process, class + layout.class_element_class)?)
                .filter(|c| !c.is_null())
        } else {
            None
        };

        let mut fields = self.read_fields(class)?;
        let is_enum = parent_desc
            .as_deref()
            .is_some_and(|p| p.is_named("System.Enum"));
        let kind = if rank > 0 {
            TypeKind::Array
        } else if is_enum {
            let underlying = fields
                .iter()
                .find(|f| f.name == "value__" && !f.is_static)
                .map(|f| f.tag)
                .unwrap_or(TypeTag::I4);
            TypeKind::Enum(underlying)
        } else if parent_desc.as_deref().is_some_and(|p| {
            p.is_named("System.ValueType") || p.kind == TypeKind::ValueType
        }) {
            TypeKind::ValueType
        } else {
            TypeKind::Reference
        };

        let mut ancestors = Vec::new();
        if let Some(parent_desc) = &parent_desc {
            ancestors.push(parent_desc.class);
            ancestors.extend_from_slice(&parent_desc.ancestors);
            fields.extend(parent_desc.fields.iter().cloned());
        }

        let primitive = if namespace == "System" {
            TypeTag::for_system_type(&name)
        } else {
            None
        };

        let descriptor = Arc::new(TypeDescriptor {
            class,
            name,
            namespace,
            parent: parent_desc.as_ref().map(|p| p.class),
            ancestors,
            kind,
            instance_size,
            rank,
            element_class,
            primitive,
            fields,
        });
        trace!(class = %class, name = %descriptor.full_name(), ?kind, "Described class");

        let entry = self
            .by_class
            .entry(class)
            .or_insert_with(|| Arc::clone(&descriptor));
        Ok(Arc::clone(entry.value()))
    }

    /// Fields declared directly on `class`
    fn read_fields(&self, class: Address) -> MirrorResult<Vec<FieldDescriptor>> {
        let layout = *self.layout();
        let process = &*self.process;

        let count = process.read_u32(class + layout.class_field_count)? as usize;
        let table = layout.read_ptr(process, class + layout.class_fields)?;
        if count == 0 || table.is_null() {
            return Ok(Vec::new());
        }
        if count > MAX_FIELDS {
            return Err(MirrorError::decode_failed(
                class,
                format!("implausible field count {}", count),
            ));
        }

        let mut fields = Vec::with_capacity(count);
        for i in 0..count {
            let field = table + i * layout.field_stride;
            let ty = layout.read_ptr(process, field + layout.field_type)?;
            let name = self.read_name(field + layout.field_name)?;
            let offset = process.read_i32(field + layout.field_offset)?;
            let (bits, type_data) = if ty.is_null() {
                (0, Address::null())
            } else {
                (
                    process.read_u32(ty + layout.type_attrs)?,
                    layout.read_ptr(process, ty + layout.type_data)?,
                )
            };
            let attrs = bits & 0xFFFF;
            fields.push(FieldDescriptor {
                name,
                offset: offset.max(0) as usize,
                tag: TypeTag::from_raw(((bits >> 16) & 0xFF) as u8),
                type_data,
                is_static: attrs & FIELD_ATTR_STATIC != 0,
                is_literal: attrs & FIELD_ATTR_LITERAL != 0,
                is_special_static: offset < 0,
                owner: class,
            });
        }
        Ok(fields)
    }

    /// Address of a static field's storage
    pub fn resolve_static_field(
        &self,
        descriptor: &TypeDescriptor,
        name: &str,
    ) -> MirrorResult<Address> {
        let field = descriptor
            .field(name)
            .filter(|f| f.is_static)
            .ok_or_else(|| MirrorError::unknown_field(descriptor.full_name(), name))?;
        if field.is_literal {
            return Err(MirrorError::not_available(format!(
                "{}.{} is a constant",
                descriptor.full_name(),
                name
            )));
        }
        if field.is_special_static {
            return Err(MirrorError::not_available(format!(
                "{}.{} is a thread or context static",
                descriptor.full_name(),
                name
            )));
        }
        Ok(self.static_data(field.owner)? + field.offset)
    }

    /// Static storage block of `class`, `NotAvailable` until the runtime allocates it
    pub fn static_data(&self, class: Address) -> MirrorResult<Address> {
        let layout = *self.layout();
        let process = &*self.process;
        let not_allocated =
            || MirrorError::not_available(format!("static storage of class {} not allocated", class));

        let runtime_info = layout.read_ptr(process, class + layout.class_runtime_info)?;
        if runtime_info.is_null() {
            return Err(not_allocated());
        }
        let vtable = layout.read_ptr(process, runtime_info + layout.runtime_domain_vtables)?;
        if vtable.is_null() {
            return Err(not_allocated());
        }

        let data = match layout.static_storage {
            StaticStorage::VTableData { offset } => layout.read_ptr(process, vtable + offset)?,
            StaticStorage::AfterVTable {
                class_vtable_size,
                vtable_methods,
            } => {
                let slots = process.read_u32(class + class_vtable_size)? as usize;
                layout.read_ptr(
                    process,
                    vtable + vtable_methods + slots * layout.pointer_size,
                )?
            }
        };
        if data.is_null() {
            return Err(not_allocated());
        }
        Ok(data)
    }

    /// Full names of every class in the image's class cache
    pub fn classes(&self) -> MirrorResult<Vec<String>> {
        let layout = *self.layout();
        Ok(self
            .class_cache()?
            .into_iter()
            .filter_map(|class| {
                let name = self.read_name(class + layout.class_name).ok()?;
                let namespace = self.read_name(class + layout.class_namespace).ok()?;
                Some(if namespace.is_empty() {
                    name
                } else {
                    format!("{}.{}", namespace, name)
                })
            })
            .collect())
    }

    /// Every class pointer in the image's `MonoInternalHashTable`
    fn class_cache(&self) -> MirrorResult<Vec<Address>> {
        let layout = *self.layout();
        let process = &*self.process;
        let cache = self.image.image + layout.image_class_cache;

        let size = process.read_u32(cache + layout.hash_table_size)? as usize;
        let table = layout.read_ptr(process, cache + layout.hash_table_table)?;
        if table.is_null() || size == 0 {
            return Err(MirrorError::not_ready("class cache is empty"));
        }
        if size > MAX_BUCKETS {
            return Err(MirrorError::decode_failed(
                table,
                format!("implausible class cache size {}", size),
            ));
        }

        let buckets = process.read_bytes(table, size * layout.pointer_size)?;
        let mut seen = HashSet::new();
        let mut classes = Vec::new();
        for bucket in buckets.chunks_exact(layout.pointer_size) {
            let mut class = pointer_from_bytes(bucket);
            let mut chain = 0;
            while !class.is_null() && chain < MAX_CHAIN && seen.insert(class) {
                classes.push(class);
                class = layout.read_ptr(process, class + layout.class_next_cache)?;
                chain += 1;
            }
        }
        trace!(buckets = size, classes = classes.len(), "Scanned class cache");
        Ok(classes)
    }

    /// Reads a `const char*` stored at `pointer`; a null pointer is the empty name
    fn read_name(&self, pointer: Address) -> MirrorResult<String> {
        let name = self.layout().read_ptr(&self.process, pointer)?;
        if name.is_null() {
            return Ok(String::new());
        }
        self.process.read_c_string(name, NAME_MAX)
    }
}

fn pointer_from_bytes(bytes: &[u8]) -> Address {
    match bytes.len() {
        4 => Address::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        _ => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            Address::from(u64::from_le_bytes(raw))
        }
    }
}
