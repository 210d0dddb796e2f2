//! A fake Mono runtime laid out in mock memory
//!
//! [`FakeMono`] writes the same structures the runtime keeps: a PE image
//! exporting `mono_assembly_foreach`, the loaded-assembly list, a class
//! cache, classes with field tables and vtables, and managed objects,
//! strings, arrays, lists and dictionaries on a bump-allocated heap.

#![allow(dead_code)]

pub mod hearthstone;

use hearth_mirror::config::Config;
use hearth_mirror::process::RemoteProcess;
use hearth_mirror::runtime::{RuntimeLayout, RuntimeVersion, StaticStorage};
use hearth_mirror::{
    Address, MemorySource, Mirror, MirrorResult, MockMemory, ModuleInfo, ProcessArchitecture,
    ProcessInfo, Session,
};
use std::collections::HashMap;

pub const PID: u32 = 4242;
pub const MODULE_BASE: usize = 0x0010_0000;
pub const MODULE_SIZE: usize = 0x4000;
pub const EXPORT_RVA: usize = 0x200;
pub const CODE_RVA: usize = 0x1000;
pub const GLOBAL_RVA: usize = 0x2000;
pub const HEAP_BASE: usize = 0x0100_0000;
pub const HEAP_SIZE: usize = 0x0040_0000;
/// Pointer left in list storage past `_size`; reading it would fail
pub const STALE_POINTER: usize = 0x0DEA_D000;

const CACHE_BUCKETS: usize = 16;
const FIELD_STATIC: u32 = 0x10;
const FIELD_LITERAL: u32 = 0x40;

/// Declared type of a fake field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Bool,
    Char,
    I4,
    U4,
    I8,
    U8,
    R8,
    Str,
    Object,
    /// The class being defined
    This,
    Class(Address),
    Value(Address),
    /// Single-dimension array of the given element class
    Array(Address),
    /// Generic instance with no `MonoGenericClass` behind it
    Generic,
    /// Generic instance of a struct, inflated to the given class
    GenericValue(Address),
    /// Generic instance of a reference class, inflated to the given class
    GenericRef(Address),
    Var,
}

impl Ty {
    fn tag(self) -> u8 {
        match self {
            Ty::Bool => 0x02,
            Ty::Char => 0x03,
            Ty::I4 => 0x08,
            Ty::U4 => 0x09,
            Ty::I8 => 0x0A,
            Ty::U8 => 0x0B,
            Ty::R8 => 0x0D,
            Ty::Str => 0x0E,
            Ty::Value(_) => 0x11,
            Ty::Class(_) | Ty::This => 0x12,
            Ty::Var => 0x13,
            Ty::Generic | Ty::GenericValue(_) | Ty::GenericRef(_) => 0x15,
            Ty::Object => 0x1C,
            Ty::Array(_) => 0x1D,
        }
    }

    fn data(self) -> Address {
        match self {
            Ty::Class(class) | Ty::Value(class) | Ty::Array(class) => class,
            _ => Address::null(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub attrs: u32,
    /// Stored per thread: offset -1 and no room in the static block
    pub thread_static: bool,
}

impl Field {
    pub fn new(name: &str, ty: Ty) -> Self {
        Field {
            name: name.to_string(),
            ty,
            attrs: 0,
            thread_static: false,
        }
    }

    pub fn stat(name: &str, ty: Ty) -> Self {
        Field {
            attrs: FIELD_STATIC,
            ..Field::new(name, ty)
        }
    }

    /// `[ThreadStatic]` field
    pub fn thread_static(name: &str, ty: Ty) -> Self {
        Field {
            thread_static: true,
            ..Field::stat(name, ty)
        }
    }

    pub fn literal(name: &str, ty: Ty) -> Self {
        Field {
            attrs: FIELD_STATIC | FIELD_LITERAL,
            ..Field::new(name, ty)
        }
    }
}

#[derive(Debug, Clone)]
struct ClassInfo {
    full_name: String,
    parent: Option<Address>,
    instance_size: usize,
    align: usize,
    is_value: bool,
    fields: Vec<(String, usize, bool)>,
    statics: Address,
    vtable: Address,
}

/// Well-known corlib classes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClasses {
    pub object: Address,
    pub value_type: Address,
    pub enum_: Address,
    pub string: Address,
    pub array: Address,
    pub boolean: Address,
    pub int32: Address,
    pub int64: Address,
}

pub struct FakeMono {
    pub memory: MockMemory,
    pub layout: RuntimeLayout,
    pub sys: SystemClasses,
    /// `MonoImage` of the game assembly, null until it is loaded
    pub image: Address,
    next: usize,
    global: Address,
    last_node: Option<Address>,
    cache_table: Option<Address>,
    classes: HashMap<Address, ClassInfo>,
    names: HashMap<String, Address>,
    objects: HashMap<Address, Address>,
    array_classes: HashMap<Address, Address>,
    list_classes: HashMap<Address, Address>,
    dictionary_classes: HashMap<(u8, Address), (Address, Address)>,
}

impl FakeMono {
    /// A 64-bit runtime with corlib and the game assembly loaded
    pub fn new() -> Self {
        Self::with_pointer_size(8)
    }

    pub fn with_pointer_size(pointer_size: usize) -> Self {
        let mut fake = Self::without_assemblies(pointer_size);
        fake.add_assembly("mscorlib");
        fake.add_assembly("Assembly-CSharp");
        fake.define_corlib();
        fake
    }

    /// Just the runtime module: no assembly has been loaded yet
    pub fn without_assemblies(pointer_size: usize) -> Self {
        let layout = RuntimeLayout::for_version(RuntimeVersion::V1, pointer_size).unwrap();
        let memory = MockMemory::new();
        memory.map(Address::new(HEAP_BASE), vec![0u8; HEAP_SIZE]);

        let mut fake = FakeMono {
            memory,
            layout,
            sys: SystemClasses::default(),
            image: Address::null(),
            next: HEAP_BASE + 0x10,
            global: Address::new(MODULE_BASE + GLOBAL_RVA),
            last_node: None,
            cache_table: None,
            classes: HashMap::new(),
            names: HashMap::new(),
            objects: HashMap::new(),
            array_classes: HashMap::new(),
            list_classes: HashMap::new(),
            dictionary_classes: HashMap::new(),
        };
        fake.map_runtime_module();
        fake
    }

    pub fn ptr(&self) -> usize {
        self.layout.pointer_size
    }

    pub fn header(&self) -> usize {
        2 * self.ptr()
    }

    // Process and sessions

    pub fn process(&self) -> RemoteProcess {
        let mut info = ProcessInfo::new(PID, "Hearthstone.exe".to_string());
        info.architecture = ProcessArchitecture::from_pointer_size(self.ptr());
        RemoteProcess::from_source(info, self.memory.clone())
    }

    pub fn session(&self) -> Session {
        Session::from_process(self.process(), &Config::default().target).unwrap()
    }

    pub fn mirror(&self) -> Mirror {
        Mirror::with_session(Config::default(), self.session())
    }

    /// Attaches to this fake's memory on every call, without retrying
    pub fn connector(&self) -> impl Fn(&Config) -> MirrorResult<Session> + Send + Sync + 'static {
        let memory = self.memory.clone();
        let pointer_size = self.ptr();
        move |config: &Config| {
            let mut info = ProcessInfo::new(PID, "Hearthstone.exe".to_string());
            info.architecture = ProcessArchitecture::from_pointer_size(pointer_size);
            let process = RemoteProcess::from_source(info, memory.clone());
            Session::from_process(process, &config.target)
        }
    }

    // Raw memory

    pub fn alloc(&mut self, size: usize) -> Address {
        let address = (self.next + 7) & !7;
        self.next = address + size.max(1);
        assert!(self.next < HEAP_BASE + HEAP_SIZE, "fake heap exhausted");
        Address::new(address)
    }

    pub fn write(&self, address: Address, bytes: &[u8]) {
        self.memory.write(address, bytes).unwrap();
    }

    pub fn write_ptr(&self, address: Address, value: Address) {
        let raw = value.as_usize() as u64;
        if self.ptr() == 8 {
            self.write(address, &raw.to_le_bytes());
        } else {
            self.write(address, &(raw as u32).to_le_bytes());
        }
    }

    pub fn write_u8(&self, address: Address, value: u8) {
        self.write(address, &[value]);
    }

    pub fn write_u32(&self, address: Address, value: u32) {
        self.write(address, &value.to_le_bytes());
    }

    pub fn write_i32(&self, address: Address, value: i32) {
        self.write(address, &value.to_le_bytes());
    }

    pub fn write_i64(&self, address: Address, value: i64) {
        self.write(address, &value.to_le_bytes());
    }

    pub fn cstr(&mut self, text: &str) -> Address {
        let address = self.alloc(text.len() + 1);
        self.write(address, text.as_bytes());
        address
    }

    // Runtime module and assemblies

    fn map_runtime_module(&mut self) {
        let mut image = vec![0u8; MODULE_SIZE];
        let put = |image: &mut Vec<u8>, at: usize, bytes: &[u8]| {
            image[at..at + bytes.len()].copy_from_slice(bytes);
        };
        let wide = self.ptr() == 8;

        put(&mut image, 0, b"MZ");
        put(&mut image, 0x3C, &0x80u32.to_le_bytes());
        put(&mut image, 0x80, b"PE\0\0");
        let machine: u16 = if wide { 0x8664 } else { 0x014C };
        put(&mut image, 0x84, &machine.to_le_bytes());
        let optional = 0x80 + 4 + 20;
        let magic: u16 = if wide { 0x20B } else { 0x10B };
        put(&mut image, optional, &magic.to_le_bytes());
        put(&mut image, optional + 56, &(MODULE_SIZE as u32).to_le_bytes());
        let directories = optional + if wide { 112 } else { 96 };
        put(&mut image, directories, &(EXPORT_RVA as u32).to_le_bytes());
        put(&mut image, directories + 4, &0x100u32.to_le_bytes());

        put(&mut image, EXPORT_RVA + 0x14, &1u32.to_le_bytes());
        put(&mut image, EXPORT_RVA + 0x18, &1u32.to_le_bytes());
        put(&mut image, EXPORT_RVA + 0x1C, &0x300u32.to_le_bytes());
        put(&mut image, EXPORT_RVA + 0x20, &0x310u32.to_le_bytes());
        put(&mut image, EXPORT_RVA + 0x24, &0x320u32.to_le_bytes());
        put(&mut image, 0x300, &(CODE_RVA as u32).to_le_bytes());
        put(&mut image, 0x310, &0x340u32.to_le_bytes());
        put(&mut image, 0x340, b"mono_assembly_foreach\0");

        let code = CODE_RVA;
        if wide {
            // sub rsp, 0x28; mov rcx, [rip + rel32]
            put(&mut image, code, &[0x48, 0x83, 0xEC, 0x28]);
            let rel = GLOBAL_RVA as i32 - (code + 4 + 7) as i32;
            put(&mut image, code + 4, &[0x48, 0x8B, 0x0D]);
            put(&mut image, code + 7, &rel.to_le_bytes());
        } else {
            // push ebp; mov ebp, esp; push [abs32]
            put(&mut image, code, &[0x55, 0x8B, 0xEC]);
            put(&mut image, code + 3, &[0xFF, 0x35]);
            put(&mut image, code + 5, &((MODULE_BASE + GLOBAL_RVA) as u32).to_le_bytes());
        }

        self.memory.map(Address::new(MODULE_BASE), image);
        self.memory
            .add_module(ModuleInfo::new("Hearthstone.exe", Address::new(0x0040_0000), 0x1000));
        self.memory
            .add_module(ModuleInfo::new("mono.dll", Address::new(MODULE_BASE), MODULE_SIZE));
    }

    /// Appends an assembly to the loaded-assembly list
    pub fn add_assembly(&mut self, name: &str) -> Address {
        let p = self.ptr();
        let assembly = self.alloc(self.layout.assembly_image + p);
        let aname = self.cstr(name);
        self.write_ptr(assembly + self.layout.assembly_aname, aname);

        let image = self.alloc(self.layout.image_class_cache + self.layout.hash_table_table + p);
        self.write_ptr(assembly + self.layout.assembly_image, image);

        let node = self.alloc(2 * p);
        self.write_ptr(node, assembly);
        match self.last_node {
            Some(previous) => self.write_ptr(previous + p, node),
            None => self.write_ptr(self.global, node),
        }
        self.last_node = Some(node);

        if name == "Assembly-CSharp" {
            let table = self.alloc(CACHE_BUCKETS * p);
            let cache = image + self.layout.image_class_cache;
            self.write_u32(cache + self.layout.hash_table_size, CACHE_BUCKETS as u32);
            self.write_ptr(cache + self.layout.hash_table_table, table);
            self.cache_table = Some(table);
            self.image = image;
        }
        assembly
    }

    // Classes

    fn define_corlib(&mut self) {
        let object = self.define_class("System", "Object", None, &[]);
        self.sys.object = object;
        let value_type = self.define_class("System", "ValueType", Some(object), &[]);
        self.sys.value_type = value_type;
        self.sys.enum_ = self.define_class("System", "Enum", Some(value_type), &[]);
        self.sys.string = self.define_class(
            "System",
            "String",
            Some(object),
            &[Field::new("m_stringLength", Ty::I4), Field::new("m_firstChar", Ty::Char)],
        );
        self.sys.array = self.define_class("System", "Array", Some(object), &[]);
        self.sys.boolean =
            self.define_class("System", "Boolean", Some(value_type), &[Field::new("m_value", Ty::Bool)]);
        self.sys.int32 =
            self.define_class("System", "Int32", Some(value_type), &[Field::new("m_value", Ty::I4)]);
        self.sys.int64 =
            self.define_class("System", "Int64", Some(value_type), &[Field::new("m_value", Ty::I8)]);
    }

    fn size_align(&self, ty: Ty) -> (usize, usize) {
        let p = self.ptr();
        match ty {
            Ty::Bool => (1, 1),
            Ty::Char => (2, 2),
            Ty::I4 | Ty::U4 => (4, 4),
            Ty::I8 | Ty::U8 | Ty::R8 => (8, 8),
            Ty::Value(class) | Ty::GenericValue(class) => {
                let info = &self.classes[&class];
                (info.instance_size - self.header(), info.align)
            }
            _ => (p, p),
        }
    }

    /// Defines a class and links it into the game image's class cache
    pub fn define_class(
        &mut self,
        namespace: &str,
        name: &str,
        parent: Option<Address>,
        fields: &[Field],
    ) -> Address {
        let p = self.ptr();
        let layout = self.layout;
        let class = self.alloc(layout.class_next_cache + 2 * p);
        let parent_info = parent.map(|parent| self.classes[&parent].clone());
        let is_value = parent.is_some_and(|parent| {
            parent == self.sys.value_type || parent == self.sys.enum_ || self.classes[&parent].is_value
        });

        let mut cursor = parent_info.as_ref().map_or(self.header(), |i| i.instance_size);
        let mut align = parent_info.as_ref().map_or(1, |i| i.align);
        let mut static_cursor = 0;
        let mut laid = Vec::new();
        for field in fields {
            let ty = if field.ty == Ty::This {
                Ty::Class(class)
            } else {
                field.ty
            };
            let (size, field_align) = self.size_align(ty);
            let offset = if field.attrs & FIELD_LITERAL != 0 {
                0
            } else if field.thread_static {
                -1
            } else if field.attrs & FIELD_STATIC != 0 {
                let offset = align_up(static_cursor, field_align);
                static_cursor = offset + size;
                offset as i32
            } else {
                let offset = align_up(cursor, field_align);
                cursor = offset + size;
                align = align.max(field_align);
                offset as i32
            };
            laid.push((field.clone(), ty, offset));
        }
        let instance_size = if is_value {
            align_up(cursor, align)
        } else {
            align_up(cursor, p)
        };

        let table = if laid.is_empty() {
            Address::null()
        } else {
            self.alloc(laid.len() * layout.field_stride)
        };
        for (i, (field, ty, offset)) in laid.iter().enumerate() {
            let entry = table + i * layout.field_stride;
            let mono_type = self.alloc(2 * p);
            let data = match *ty {
                Ty::GenericValue(inflated) | Ty::GenericRef(inflated) => {
                    self.generic_class(inflated)
                }
                other => other.data(),
            };
            self.write_ptr(mono_type + layout.type_data, data);
            self.write_u32(
                mono_type + layout.type_attrs,
                field.attrs | ((ty.tag() as u32) << 16),
            );
            self.write_ptr(entry + layout.field_type, mono_type);
            let field_name = self.cstr(&field.name);
            self.write_ptr(entry + layout.field_name, field_name);
            self.write_ptr(entry + 2 * p, class);
            self.write_i32(entry + layout.field_offset, *offset);
        }

        let statics = if static_cursor > 0 {
            self.alloc(static_cursor.max(p))
        } else {
            Address::null()
        };
        let vtable = self.alloc(0x40);
        self.write_ptr(vtable, class);
        match layout.static_storage {
            StaticStorage::VTableData { offset } => self.write_ptr(vtable + offset, statics),
            StaticStorage::AfterVTable { .. } => panic!("fake runtime only lays out v1 vtables"),
        }
        let runtime_info = self.alloc(2 * p);
        self.write_ptr(runtime_info + layout.runtime_domain_vtables, vtable);

        let name_ptr = self.cstr(name);
        let namespace_ptr = self.cstr(namespace);
        self.write_ptr(class + layout.class_name, name_ptr);
        self.write_ptr(class + layout.class_namespace, namespace_ptr);
        self.write_ptr(class + layout.class_parent, parent.unwrap_or_default());
        self.write_u32(class + layout.class_instance_size, instance_size as u32);
        self.write_ptr(class + layout.class_fields, table);
        self.write_u32(class + layout.class_field_count, laid.len() as u32);
        self.write_ptr(class + layout.class_runtime_info, runtime_info);

        if let Some(table) = self.cache_table {
            let bucket = table + (name.len() % CACHE_BUCKETS) * p;
            let head = self.memory_ptr(bucket);
            self.write_ptr(class + layout.class_next_cache, head);
            self.write_ptr(bucket, class);
        }

        let full_name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", namespace, name)
        };
        self.names.insert(full_name.clone(), class);
        self.classes.insert(
            class,
            ClassInfo {
                full_name,
                parent,
                instance_size,
                align,
                is_value,
                fields: laid
                    .into_iter()
                    .map(|(field, _, offset)| {
                        let is_static = field.attrs & FIELD_STATIC != 0;
                        (field.name, offset.max(0) as usize, is_static)
                    })
                    .collect(),
                statics,
                vtable,
            },
        );
        class
    }

    /// `MonoGenericClass` whose container and cached class are both `inflated`
    fn generic_class(&mut self, inflated: Address) -> Address {
        let p = self.ptr();
        let generic = self.alloc(5 * p);
        self.write_ptr(generic + self.layout.generic_container, inflated);
        self.write_ptr(generic + self.layout.generic_cached_class, inflated);
        generic
    }

    /// An enum backed by `int`
    pub fn define_enum(&mut self, namespace: &str, name: &str) -> Address {
        let parent = self.sys.enum_;
        self.define_class(namespace, name, Some(parent), &[Field::new("value__", Ty::I4)])
    }

    /// A class with an `s_instance` static pointing at itself, and that instance
    pub fn singleton(&mut self, name: &str, fields: &[Field]) -> (Address, Address) {
        let class = self.empty_singleton(name, fields);
        let instance = self.object(class);
        self.set_static_ptr(class, "s_instance", instance);
        (class, instance)
    }

    /// A singleton class whose `s_instance` is still null
    pub fn empty_singleton(&mut self, name: &str, fields: &[Field]) -> Address {
        let mut fields = fields.to_vec();
        fields.push(Field::stat("s_instance", Ty::This));
        let parent = self.sys.object;
        self.define_class("", name, Some(parent), &fields)
    }

    pub fn class_named(&self, full_name: &str) -> Option<Address> {
        self.names.get(full_name).copied()
    }

    pub fn vtable(&self, class: Address) -> Address {
        self.classes[&class].vtable
    }

    fn memory_ptr(&self, address: Address) -> Address {
        let mut raw = [0u8; 8];
        self.memory
            .read_exact(address, &mut raw[..self.ptr()])
            .unwrap();
        Address::new(u64::from_le_bytes(raw) as usize)
    }

    /// Offset of a field declared on `class` or an ancestor
    pub fn offset_of(&self, class: Address, name: &str) -> usize {
        let mut current = Some(class);
        while let Some(class) = current {
            let info = &self.classes[&class];
            if let Some((_, offset, _)) = info.fields.iter().find(|(n, _, _)| n == name) {
                return *offset;
            }
            current = info.parent;
        }
        panic!("no field {} on fake class {}", name, class);
    }

    /// Nulls the static storage pointer, as before the class is initialized
    pub fn clear_static_storage(&self, class: Address) {
        if let StaticStorage::VTableData { offset } = self.layout.static_storage {
            self.write_ptr(self.classes[&class].vtable + offset, Address::null());
        }
    }

    pub fn set_static_ptr(&self, class: Address, name: &str, value: Address) {
        let statics = self.classes[&class].statics;
        let offset = self.offset_of(class, name);
        self.write_ptr(statics + offset, value);
    }

    pub fn set_static_i32(&self, class: Address, name: &str, value: i32) {
        let statics = self.classes[&class].statics;
        let offset = self.offset_of(class, name);
        self.write_i32(statics + offset, value);
    }

    // Objects

    pub fn object(&mut self, class: Address) -> Address {
        let size = self.classes[&class].instance_size.max(self.header());
        let object = self.alloc(size);
        self.write_ptr(object, self.classes[&class].vtable);
        self.objects.insert(object, class);
        object
    }

    fn slot(&self, object: Address, name: &str) -> Address {
        object + self.offset_of(self.objects[&object], name)
    }

    pub fn set_ptr(&self, object: Address, name: &str, value: Address) {
        self.write_ptr(self.slot(object, name), value);
    }

    pub fn set_bool(&self, object: Address, name: &str, value: bool) {
        self.write_u8(self.slot(object, name), value as u8);
    }

    pub fn set_i32(&self, object: Address, name: &str, value: i32) {
        self.write_i32(self.slot(object, name), value);
    }

    pub fn set_i64(&self, object: Address, name: &str, value: i64) {
        self.write_i64(self.slot(object, name), value);
    }

    pub fn set_u64(&self, object: Address, name: &str, value: u64) {
        self.write(self.slot(object, name), &value.to_le_bytes());
    }

    pub fn set_str(&mut self, object: Address, name: &str, value: &str) {
        let string = self.string(value);
        self.set_ptr(object, name, string);
    }

    /// Points the object's header at another class's vtable
    pub fn retype(&mut self, object: Address, class: Address) {
        self.write_ptr(object, self.classes[&class].vtable);
        self.objects.insert(object, class);
    }

    pub fn string(&mut self, text: &str) -> Address {
        let units: Vec<u16> = text.encode_utf16().collect();
        let header = self.header();
        let string = self.alloc(header + 4 + 2 * units.len() + 2);
        self.write_ptr(string, self.classes[&self.sys.string].vtable);
        self.write_i32(string + header, units.len() as i32);
        let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        self.write(string + header + 4, &bytes);
        self.objects.insert(string, self.sys.string);
        string
    }

    // Arrays and collections

    pub fn array_class(&mut self, element: Address) -> Address {
        if let Some(class) = self.array_classes.get(&element) {
            return *class;
        }
        let (namespace, name) = self.split_name(element);
        let parent = self.sys.array;
        let class = self.define_class(&namespace, &format!("{}[]", name), Some(parent), &[]);
        self.write_ptr(class + self.layout.class_element_class, element);
        self.write_u8(class + self.layout.class_rank, 1);
        self.array_classes.insert(element, class);
        class
    }

    fn split_name(&self, class: Address) -> (String, String) {
        let full = &self.classes[&class].full_name;
        match full.rsplit_once('.') {
            Some((namespace, name)) => (namespace.to_string(), name.to_string()),
            None => (String::new(), full.clone()),
        }
    }

    /// Allocates an array object with room for `count` elements of `stride` bytes
    pub fn array(&mut self, element: Address, stride: usize, count: usize) -> Address {
        let class = self.array_class(element);
        let p = self.ptr();
        let array = self.alloc(4 * p + stride * count);
        self.write_ptr(array, self.classes[&class].vtable);
        self.write_ptr(array + self.layout.array_length(), Address::new(count));
        self.objects.insert(array, class);
        array
    }

    pub fn ref_array(&mut self, element: Address, items: &[Address]) -> Address {
        let p = self.ptr();
        let array = self.array(element, p, items.len());
        let data = array + self.layout.array_data();
        for (i, item) in items.iter().enumerate() {
            self.write_ptr(data + i * p, *item);
        }
        array
    }

    pub fn i32_array(&mut self, element: Address, items: &[i32]) -> Address {
        let array = self.array(element, 4, items.len());
        let data = array + self.layout.array_data();
        for (i, item) in items.iter().enumerate() {
            self.write_i32(data + i * 4, *item);
        }
        array
    }

    fn list_class(&mut self, element: Address) -> Address {
        if let Some(class) = self.list_classes.get(&element) {
            return *class;
        }
        let parent = self.sys.object;
        let class = self.define_class(
            "System.Collections.Generic",
            "List`1",
            Some(parent),
            &[
                Field::new("_items", Ty::Array(element)),
                Field::new("_size", Ty::I4),
                Field::new("_version", Ty::I4),
            ],
        );
        self.list_classes.insert(element, class);
        class
    }

    /// `List<T>` of references; the backing array has one extra stale slot
    pub fn list(&mut self, element: Address, items: &[Address]) -> Address {
        let class = self.list_class(element);
        let mut storage = items.to_vec();
        storage.push(Address::new(STALE_POINTER));
        let array = self.ref_array(element, &storage);
        let list = self.object(class);
        self.set_ptr(list, "_items", array);
        self.set_i32(list, "_size", items.len() as i32);
        list
    }

    /// `List<T>` of an int-sized value type, e.g. an enum
    pub fn int_list(&mut self, element: Address, items: &[i32]) -> Address {
        let class = self.list_class(element);
        let mut storage = items.to_vec();
        storage.push(-77);
        let array = self.i32_array(element, &storage);
        let list = self.object(class);
        self.set_ptr(list, "_items", array);
        self.set_i32(list, "_size", items.len() as i32);
        list
    }

    /// `Dictionary<TKey, TValue>` with reference values and an `int` or `long` key.
    ///
    /// A freed entry is left between the first and second live entries.
    pub fn dictionary(&mut self, key: Ty, value: Address, entries: &[(i64, Address)]) -> Address {
        assert!(matches!(key, Ty::I4 | Ty::I8), "fake dictionaries use integral keys");
        let known = self.dictionary_classes.get(&(key.tag(), value)).copied();
        let (dictionary_class, entry_class) = match known {
            Some(classes) => classes,
            None => {
                let value_type = self.sys.value_type;
                let entry = self.define_class(
                    "",
                    "Entry",
                    Some(value_type),
                    &[
                        Field::new("hashCode", Ty::I4),
                        Field::new("next", Ty::I4),
                        Field::new("key", key),
                        Field::new("value", Ty::Class(value)),
                    ],
                );
                let int32 = self.sys.int32;
                let object = self.sys.object;
                let dictionary = self.define_class(
                    "System.Collections.Generic",
                    "Dictionary`2",
                    Some(object),
                    &[
                        Field::new("buckets", Ty::Array(int32)),
                        Field::new("entries", Ty::Array(entry)),
                        Field::new("count", Ty::I4),
                        Field::new("version", Ty::I4),
                        Field::new("freeList", Ty::I4),
                        Field::new("freeCount", Ty::I4),
                    ],
                );
                self.dictionary_classes
                    .insert((key.tag(), value), (dictionary, entry));
                (dictionary, entry)
            }
        };

        let mut slots: Vec<Option<(i64, Address)>> = entries.iter().copied().map(Some).collect();
        if !slots.is_empty() {
            slots.insert(1.min(slots.len()), None);
        }

        let header = self.header();
        let stride = self.classes[&entry_class].instance_size - header;
        let array = self.array(entry_class, stride, slots.len());
        let data = array + self.layout.array_data();
        let hash_at = self.offset_of(entry_class, "hashCode") - header;
        let key_at = self.offset_of(entry_class, "key") - header;
        let value_at = self.offset_of(entry_class, "value") - header;
        for (i, slot) in slots.iter().enumerate() {
            let element = data + i * stride;
            match slot {
                Some((k, v)) => {
                    self.write_i32(element + hash_at, (*k as i32) & 0x7FFF_FFFF);
                    match key {
                        Ty::I4 => self.write_i32(element + key_at, *k as i32),
                        _ => self.write_i64(element + key_at, *k),
                    }
                    self.write_ptr(element + value_at, *v);
                }
                None => self.write_i32(element + hash_at, -1),
            }
        }

        let int32 = self.sys.int32;
        let buckets = self.i32_array(int32, &vec![-1; slots.len().max(1)]);
        let dictionary = self.object(dictionary_class);
        self.set_ptr(dictionary, "buckets", buckets);
        self.set_ptr(dictionary, "entries", array);
        self.set_i32(dictionary, "count", slots.len() as i32);
        self.set_i32(dictionary, "freeList", if slots.len() > entries.len() { 1 } else { -1 });
        self.set_i32(dictionary, "freeCount", (slots.len() - entries.len()) as i32);
        dictionary
    }
}

impl Default for FakeMono {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(value: usize, align: usize) -> usize {
    let align = align.max(1);
    value.div_ceil(align) * align
}
