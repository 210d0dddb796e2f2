//! Object graph decoding
//!
//! A [`Walker`] turns remote objects into [`RemoteValue`] trees using field
//! layouts from the [`MetadataCatalog`]. Each walker serves one query: its
//! [`SnapshotCache`] and decode stack are dropped with it.
//!
//! Every object is checked against its header twice. Before decoding, the
//! concrete class must satisfy what the referencing field declares; after
//! decoding, the header must still carry the same class. A mismatch is
//! retried up to `retry_limit` times and then reported as a failed subtree.

pub mod cache;

pub use cache::{CacheStats, SnapshotCache};

use crate::config::WalkerConfig;
use crate::core::types::{
    Address, DecodeFailure, MirrorError, MirrorResult, RemoteObject, RemoteValue, Scalar,
};
use crate::metadata::{FieldDescriptor, MetadataCatalog, TypeDescriptor, TypeKind, TypeTag};
use crate::process::RemoteProcess;
use crate::runtime::RuntimeLayout;
use std::sync::Arc;
use tracing::{debug, trace};

const LIST_NAMESPACE: &str = "System.Collections.Generic";

/// What the referencing slot allows the concrete class to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Any,
    String,
    Array,
    Derived(Address),
}

/// Decodes objects for a single query
pub struct Walker<'s> {
    process: &'s RemoteProcess,
    catalog: &'s MetadataCatalog,
    layout: RuntimeLayout,
    limits: WalkerConfig,
    cache: SnapshotCache,
    stack: Vec<Address>,
}

impl<'s> Walker<'s> {
    pub fn new(catalog: &'s MetadataCatalog, limits: &WalkerConfig) -> Self {
        Walker {
            process: catalog.process(),
            catalog,
            layout: *catalog.layout(),
            limits: limits.clone(),
            cache: SnapshotCache::new(),
            stack: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &MetadataCatalog {
        self.catalog
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Decodes the value at `address` as an instance of `descriptor`.
    ///
    /// Reference types expect an object pointer, inline types the raw value.
    pub fn decode(
        &mut self,
        descriptor: &TypeDescriptor,
        address: Address,
    ) -> MirrorResult<RemoteValue> {
        if descriptor.is_inline() {
            return self.decode_inline_class(descriptor, address, 0);
        }
        if address.is_null() {
            return Ok(RemoteValue::Null);
        }
        let expect = self.expectation_for(Some(descriptor));
        self.decode_reference(address, expect, 0)
    }

    /// Decodes whatever object lives at `address`, using its runtime class
    pub fn decode_object(&mut self, address: Address) -> MirrorResult<RemoteValue> {
        if address.is_null() {
            return Ok(RemoteValue::Null);
        }
        self.decode_reference(address, Expect::Any, 0)
    }

    /// Decodes a static field, the usual entry point of a query
    pub fn decode_static(&mut self, type_name: &str, field: &str) -> MirrorResult<RemoteValue> {
        let (field, slot) = self.static_slot(type_name, field)?;
        self.decode_slot(field.tag, field.type_data, slot, 0)
    }

    /// Object referenced by a static field, `None` when the field is null
    pub fn root(&mut self, type_name: &str, field: &str) -> MirrorResult<Option<Address>> {
        let (field, slot) = self.static_slot(type_name, field)?;
        if !self.stores_pointer(&field)? {
            return Err(MirrorError::decode_failed(
                slot,
                format!("static field {}.{} is not a reference", type_name, field.name),
            ));
        }
        let target = self.layout.read_ptr(self.process, slot)?;
        Ok((!target.is_null()).then_some(target))
    }

    /// Follows reference fields from `address`, reading only the pointers on the path
    pub fn follow(&mut self, address: Address, path: &[&str]) -> MirrorResult<Option<Address>> {
        let mut current = address;
        for name in path {
            if current.is_null() {
                return Ok(None);
            }
            let descriptor = self.describe_object(current)?;
            let field = instance_field(&descriptor, name)?;
            if !self.stores_pointer(field)? {
                return Err(MirrorError::decode_failed(
                    current,
                    format!("field {} is not a reference", name),
                ));
            }
            current = self.layout.read_ptr(self.process, current + field.offset)?;
        }
        Ok((!current.is_null()).then_some(current))
    }

    /// Decodes one field of the object at `address`
    pub fn read_field(&mut self, address: Address, name: &str) -> MirrorResult<RemoteValue> {
        let object = self.decode_fields(address, &[name])?;
        Ok(object
            .fields
            .into_iter()
            .next()
            .map(|(_, value)| value)
            .unwrap_or(RemoteValue::Null))
    }

    /// Decodes only the named fields of the object at `address`, in the order given
    pub fn decode_fields(&mut self, address: Address, names: &[&str]) -> MirrorResult<RemoteObject> {
        let class = self.object_class(address)?;
        let descriptor = self.catalog.describe_class(class)?;
        let fields = names
            .iter()
            .map(|name| instance_field(&descriptor, name).cloned())
            .collect::<MirrorResult<Vec<_>>>()?;

        self.stack.push(address);
        let mut object = RemoteObject::new(descriptor.full_name(), address);
        for field in &fields {
            let value = self.decode_field(field, address + field.offset, 1);
            object.fields.push((field.name.clone(), value));
        }
        self.stack.pop();

        if self.object_class(address)? != class {
            return Err(MirrorError::decode_failed(
                address,
                "object header changed during decode",
            ));
        }
        Ok(object)
    }

    /// Descriptor of the runtime class of the object at `address`
    pub fn describe_object(&self, address: Address) -> MirrorResult<Arc<TypeDescriptor>> {
        let class = self.object_class(address)?;
        self.catalog.describe_class(class)
    }

    /// Whether the slot of `field` holds an object pointer
    fn stores_pointer(&self, field: &FieldDescriptor) -> MirrorResult<bool> {
        match field.tag {
            TypeTag::GenericInst => {
                let class = self.generic_class(field.type_data)?;
                Ok(!class.is_some_and(|class| class.is_inline()))
            }
            tag => Ok(tag.is_reference()),
        }
    }

    /// Class of a generic instance from its `MonoGenericClass`
    ///
    /// Falls back to the generic definition until the instance is inflated.
    fn generic_class(&self, generic: Address) -> MirrorResult<Option<Arc<TypeDescriptor>>> {
        if generic.is_null() {
            return Ok(None);
        }
        let cached = self
            .layout
            .read_ptr(self.process, generic + self.layout.generic_cached_class)?;
        let class = if cached.is_null() {
            self.layout
                .read_ptr(self.process, generic + self.layout.generic_container)?
        } else {
            cached
        };
        if class.is_null() {
            return Ok(None);
        }
        self.catalog.describe_class(class).map(Some)
    }

    /// `MonoObject.vtable->klass`
    fn object_class(&self, address: Address) -> MirrorResult<Address> {
        let vtable = self.layout.read_ptr(self.process, address)?;
        if vtable.is_null() {
            return Err(MirrorError::decode_failed(address, "object has no vtable"));
        }
        let class = self.layout.read_ptr(self.process, vtable)?;
        if class.is_null() {
            return Err(MirrorError::decode_failed(address, "vtable has no class"));
        }
        Ok(class)
    }

    fn static_slot(
        &self,
        type_name: &str,
        field: &str,
    ) -> MirrorResult<(FieldDescriptor, Address)> {
        let descriptor = self.catalog.resolve_type(type_name)?;
        let slot = self.catalog.resolve_static_field(&descriptor, field)?;
        let field = descriptor
            .field(field)
            .cloned()
            .ok_or_else(|| MirrorError::unknown_field(descriptor.full_name(), field))?;
        Ok((field, slot))
    }

    /// Decodes one field, turning failures into a failed node
    fn decode_field(&mut self, field: &FieldDescriptor, slot: Address, depth: usize) -> RemoteValue {
        match self.decode_slot(field.tag, field.type_data, slot, depth) {
            Ok(value) => value,
            Err(e) => {
                debug!(field = %field.name, slot = %slot, error = %e, "Field decode failed");
                RemoteValue::Failed(DecodeFailure::new(slot, e.to_string()))
            }
        }
    }

    /// Decodes the value stored at `slot` according to its declared type
    fn decode_slot(
        &mut self,
        tag: TypeTag,
        type_data: Address,
        slot: Address,
        depth: usize,
    ) -> MirrorResult<RemoteValue> {
        match tag {
            TypeTag::String => self.decode_pointer(slot, Expect::String, depth),
            TypeTag::Array | TypeTag::SzArray => self.decode_pointer(slot, Expect::Array, depth),
            TypeTag::Object => self.decode_pointer(slot, Expect::Any, depth),
            TypeTag::GenericInst => match self.generic_class(type_data)? {
                Some(class) if class.is_inline() => self.decode_inline_class(&class, slot, depth),
                _ => self.decode_pointer(slot, Expect::Any, depth),
            },
            TypeTag::Class => {
                let declared = if type_data.is_null() {
                    None
                } else {
                    Some(self.catalog.describe_class(type_data)?)
                };
                let expect = self.expectation_for(declared.as_deref());
                self.decode_pointer(slot, expect, depth)
            }
            TypeTag::ValueType => {
                let descriptor = self.catalog.describe_class(type_data)?;
                self.decode_inline_class(&descriptor, slot, depth)
            }
            TypeTag::Var | TypeTag::MVar => Err(MirrorError::decode_failed(
                slot,
                "open generic parameter types are not supported",
            )),
            tag => match tag.primitive_size(self.layout.pointer_size) {
                Some(_) => Ok(RemoteValue::Scalar(self.read_scalar(tag, slot)?)),
                None => Err(MirrorError::decode_failed(
                    slot,
                    format!("unsupported type tag {}", tag),
                )),
            },
        }
    }

    fn decode_pointer(
        &mut self,
        slot: Address,
        expect: Expect,
        depth: usize,
    ) -> MirrorResult<RemoteValue> {
        let target = self.layout.read_ptr(self.process, slot)?;
        if target.is_null() {
            return Ok(RemoteValue::Null);
        }
        self.decode_reference(target, expect, depth)
    }

    /// What a slot declared as `declared` accepts
    fn expectation_for(&self, declared: Option<&TypeDescriptor>) -> Expect {
        match declared {
            // Interfaces and System.Object have no parent
            None => Expect::Any,
            Some(d) if d.parent.is_none() => Expect::Any,
            Some(d) if d.is_named("System.String") => Expect::String,
            Some(d) if d.is_array() => Expect::Array,
            Some(d) => Expect::Derived(d.class),
        }
    }

    fn check_expectation(&self, descriptor: &TypeDescriptor, expect: Expect) -> Result<(), String> {
        let ok = match expect {
            Expect::Any => true,
            Expect::String => descriptor.is_named("System.String"),
            Expect::Array => descriptor.is_array(),
            Expect::Derived(class) => descriptor.derives_from(class),
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "header class {} does not match {:?}",
                descriptor.full_name(),
                expect
            ))
        }
    }

    /// Decodes a heap object, validating its header before and after
    fn decode_reference(
        &mut self,
        address: Address,
        expect: Expect,
        depth: usize,
    ) -> MirrorResult<RemoteValue> {
        if depth > self.limits.max_depth {
            return Err(MirrorError::RecursionLimit { depth });
        }
        if self.stack.contains(&address) {
            return Err(MirrorError::decode_failed(address, "reference cycle"));
        }
        if let Some(value) = self.cache.get(address) {
            return Ok(value);
        }

        let mut reason = String::new();
        for attempt in 0..=self.limits.retry_limit {
            if attempt > 0 {
                debug!(address = %address, attempt, %reason, "Retrying inconsistent object");
            }
            let class = self.object_class(address)?;
            let descriptor = self.catalog.describe_class(class)?;
            if let Err(mismatch) = self.check_expectation(&descriptor, expect) {
                reason = mismatch;
                continue;
            }

            self.stack.push(address);
            let body = self.decode_body(&descriptor, address, depth);
            self.stack.pop();

            let after = self.object_class(address)?;
            if after != class {
                reason = format!("object header changed from {} to {}", class, after);
                continue;
            }
            let value = body?;
            self.cache.insert(address, value.clone());
            return Ok(value);
        }
        Err(MirrorError::decode_failed(address, reason))
    }

    fn decode_body(
        &mut self,
        descriptor: &TypeDescriptor,
        address: Address,
        depth: usize,
    ) -> MirrorResult<RemoteValue> {
        if descriptor.is_named("System.String") {
            return self.read_string(address).map(RemoteValue::String);
        }
        if descriptor.is_array() {
            return self.decode_array(descriptor, address, None, depth);
        }
        if descriptor.namespace == LIST_NAMESPACE && descriptor.generic_name() == "List" {
            if let Some(list) = self.decode_list(descriptor, address, depth)? {
                return Ok(list);
            }
        }
        let object = self.decode_members(descriptor, address, 0, depth)?;
        Ok(RemoteValue::Object(Arc::new(object)))
    }

    /// `List<T>` as the first `_size` elements of `_items`
    fn decode_list(
        &mut self,
        descriptor: &TypeDescriptor,
        address: Address,
        depth: usize,
    ) -> MirrorResult<Option<RemoteValue>> {
        let (Some(items), Some(size)) = (descriptor.field("_items"), descriptor.field("_size"))
        else {
            return Ok(None);
        };
        let size = self.process.read_i32(address + size.offset)?;
        let items = self.layout.read_ptr(self.process, address + items.offset)?;
        if items.is_null() {
            return Ok(Some(RemoteValue::Sequence(Vec::new())));
        }
        if size < 0 {
            return Err(MirrorError::decode_failed(
                address,
                format!("negative list size {}", size),
            ));
        }

        let items_class = self.object_class(items)?;
        let items_descriptor = self.catalog.describe_class(items_class)?;
        if !items_descriptor.is_array() {
            return Err(MirrorError::decode_failed(items, "list storage is not an array"));
        }
        self.decode_array(&items_descriptor, items, Some(size as usize), depth + 1)
            .map(Some)
    }

    /// Decodes instance fields. `header_adjust` is subtracted from every
    /// offset, which is the object header size for unboxed value types.
    fn decode_members(
        &mut self,
        descriptor: &TypeDescriptor,
        base: Address,
        header_adjust: usize,
        depth: usize,
    ) -> MirrorResult<RemoteObject> {
        if depth > self.limits.max_depth {
            return Err(MirrorError::RecursionLimit { depth });
        }
        let mut object = RemoteObject::new(descriptor.full_name(), base);
        for field in descriptor.instance_fields() {
            let value = match field.offset.checked_sub(header_adjust) {
                Some(offset) => self.decode_field(field, base + offset, depth + 1),
                None => RemoteValue::Failed(DecodeFailure::new(
                    base,
                    format!("field {} lies inside the object header", field.name),
                )),
            };
            object.fields.push((field.name.clone(), value));
        }
        trace!(class = %object.class_name, address = %base, "Decoded object");
        Ok(object)
    }

    /// Decodes an inline value: primitive, enum or struct
    fn decode_inline_class(
        &mut self,
        descriptor: &TypeDescriptor,
        slot: Address,
        depth: usize,
    ) -> MirrorResult<RemoteValue> {
        if let Some(tag) = descriptor
            .primitive
            .filter(|t| t.primitive_size(self.layout.pointer_size).is_some())
        {
            return Ok(RemoteValue::Scalar(self.read_scalar(tag, slot)?));
        }
        match descriptor.kind {
            TypeKind::Enum(underlying) => {
                let value = self.read_scalar(underlying, slot)?.as_i64().ok_or_else(|| {
                    MirrorError::decode_failed(slot, format!("enum backed by {}", underlying))
                })?;
                Ok(RemoteValue::Enum {
                    type_name: descriptor.full_name(),
                    value,
                })
            }
            TypeKind::ValueType => {
                let header = self.layout.object_header_size();
                let object = self.decode_members(descriptor, slot, header, depth)?;
                Ok(RemoteValue::Object(Arc::new(object)))
            }
            _ => Err(MirrorError::decode_failed(
                slot,
                format!("{} is not a value type", descriptor.full_name()),
            )),
        }
    }

    fn decode_array(
        &mut self,
        descriptor: &TypeDescriptor,
        address: Address,
        limit: Option<usize>,
        depth: usize,
    ) -> MirrorResult<RemoteValue> {
        let length = self
            .process
            .read_uint_sized(address + self.layout.array_length(), self.layout.pointer_size)?;
        let count = limit.map_or(length, |limit| (limit as u64).min(length));
        if count > self.limits.max_sequence_length as u64 {
            return Err(MirrorError::SequenceTooLong {
                address: address.to_string(),
                length: count,
                max: self.limits.max_sequence_length,
            });
        }
        let element_class = descriptor
            .element_class
            .ok_or_else(|| MirrorError::decode_failed(address, "array without element class"))?;
        let element = self.catalog.describe_class(element_class)?;
        let (tag, stride) = self.element_layout(&element)?;

        let data = address + self.layout.array_data();
        let mut items = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let slot = data + i * stride;
            let value = match self.decode_slot(tag, element.class, slot, depth + 1) {
                Ok(value) => value,
                Err(e) => {
                    debug!(index = i, slot = %slot, error = %e, "Element decode failed");
                    RemoteValue::Failed(DecodeFailure::new(slot, e.to_string()))
                }
            };
            items.push(value);
        }
        Ok(RemoteValue::Sequence(items))
    }

    /// Slot tag and byte stride for array elements of class `element`
    fn element_layout(&self, element: &TypeDescriptor) -> MirrorResult<(TypeTag, usize)> {
        let pointer_size = self.layout.pointer_size;
        if element.is_named("System.String") {
            return Ok((TypeTag::String, pointer_size));
        }
        if let Some(tag) = element.primitive {
            if let Some(size) = tag.primitive_size(pointer_size) {
                return Ok((tag, size));
            }
        }
        match element.kind {
            TypeKind::Enum(underlying) => {
                let size = underlying.primitive_size(pointer_size).ok_or_else(|| {
                    MirrorError::decode_failed(element.class, "enum without integral backing")
                })?;
                Ok((TypeTag::ValueType, size))
            }
            TypeKind::ValueType => {
                let size = element
                    .instance_size
                    .checked_sub(self.layout.object_header_size())
                    .filter(|size| *size > 0)
                    .ok_or_else(|| {
                        MirrorError::decode_failed(element.class, "value type without size")
                    })?;
                Ok((TypeTag::ValueType, size))
            }
            TypeKind::Array => Ok((TypeTag::SzArray, pointer_size)),
            TypeKind::Reference => Ok((TypeTag::Class, pointer_size)),
        }
    }

    fn read_scalar(&self, tag: TypeTag, slot: Address) -> MirrorResult<Scalar> {
        let process = self.process;
        Ok(match tag {
            TypeTag::Boolean => Scalar::Bool(process.read_u8(slot)? != 0),
            TypeTag::Char => {
                let unit = process.read_u16(slot)? as u32;
                Scalar::Char(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            TypeTag::I1 => Scalar::I8(process.read_i8(slot)?),
            TypeTag::U1 => Scalar::U8(process.read_u8(slot)?),
            TypeTag::I2 => Scalar::I16(process.read_i16(slot)?),
            TypeTag::U2 => Scalar::U16(process.read_u16(slot)?),
            TypeTag::I4 => Scalar::I32(process.read_i32(slot)?),
            TypeTag::U4 => Scalar::U32(process.read_u32(slot)?),
            TypeTag::I8 => Scalar::I64(process.read_i64(slot)?),
            TypeTag::U8 => Scalar::U64(process.read_u64(slot)?),
            TypeTag::R4 => Scalar::F32(process.read_f32(slot)?),
            TypeTag::R8 => Scalar::F64(process.read_f64(slot)?),
            TypeTag::I | TypeTag::U | TypeTag::Ptr => {
                Scalar::Native(process.read_uint_sized(slot, self.layout.pointer_size)?)
            }
            other => {
                return Err(MirrorError::decode_failed(
                    slot,
                    format!("{} is not a primitive", other),
                ))
            }
        })
    }

    /// Reads a `MonoString` body
    fn read_string(&self, address: Address) -> MirrorResult<String> {
        let length = self.process.read_i32(address + self.layout.string_length())?;
        if length < 0 || length as usize > self.limits.max_string_length {
            return Err(MirrorError::StringTooLong {
                address: address.to_string(),
                length: length as i64,
                max: self.limits.max_string_length,
            });
        }
        let bytes = self
            .process
            .read_bytes(address + self.layout.string_chars(), length as usize * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

/// Non-static field by exact name
fn instance_field<'d>(
    descriptor: &'d TypeDescriptor,
    name: &str,
) -> MirrorResult<&'d FieldDescriptor> {
    descriptor
        .instance_fields()
        .find(|f| f.name == name)
        .ok_or_else(|| MirrorError::unknown_field(descriptor.full_name(), name))
}
