//! Immutable class shape snapshots.

use graft_ir::{Access, ClassNode, MemberAnnotation, MemberSignature};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Where a member came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberOrigin {
    /// Declared by the class itself.
    Declared,
    /// Grafted by an overlay in an earlier merge.
    Merged { overlay: String, priority: i32 },
}

impl MemberOrigin {
    fn from_annotations(annotations: &[MemberAnnotation]) -> Self {
        annotations
            .iter()
            .find_map(|a| match a {
                MemberAnnotation::Merged { overlay, priority } => Some(MemberOrigin::Merged {
                    overlay: overlay.clone(),
                    priority: *priority,
                }),
                _ => None,
            })
            .unwrap_or(MemberOrigin::Declared)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: String,
    pub desc: String,
    pub access: Access,
    pub origin: MemberOrigin,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub name: String,
    pub desc: String,
    pub access: Access,
    pub origin: MemberOrigin,
}

impl FieldDescriptor {
    pub fn signature(&self) -> MemberSignature {
        MemberSignature::new(self.name.clone(), self.desc.clone())
    }
}

impl MethodDescriptor {
    pub fn signature(&self) -> MemberSignature {
        MemberSignature::new(self.name.clone(), self.desc.clone())
    }
}

/// Snapshot of one class's declared shape.
///
/// Field signatures are unique within `fields` and method signatures within
/// `methods`; a class tree carrying duplicates keeps the first declaration.
#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: SmallVec<[String; 4]>,
    pub access: Access,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    /// Signature → index into `fields`.
    field_index: FxHashMap<MemberSignature, usize>,
    /// Signature → index into `methods`.
    method_index: FxHashMap<MemberSignature, usize>,
}

impl ClassDescriptor {
    /// Build a snapshot from a class tree.
    pub fn from_node(node: &ClassNode) -> Self {
        let mut fields = Vec::with_capacity(node.fields.len());
        let mut field_index = FxHashMap::default();
        for field in &node.fields {
            let sig = field.signature();
            if field_index.contains_key(&sig) {
                tracing::warn!(class = %node.name, field = %sig, "duplicate field declaration ignored");
                continue;
            }
            field_index.insert(sig, fields.len());
            fields.push(FieldDescriptor {
                name: field.name.clone(),
                desc: field.desc.clone(),
                access: field.access,
                origin: MemberOrigin::from_annotations(&field.annotations),
            });
        }

        let mut methods = Vec::with_capacity(node.methods.len());
        let mut method_index = FxHashMap::default();
        for method in &node.methods {
            let sig = method.signature();
            if method_index.contains_key(&sig) {
                tracing::warn!(class = %node.name, method = %sig, "duplicate method declaration ignored");
                continue;
            }
            method_index.insert(sig, methods.len());
            methods.push(MethodDescriptor {
                name: method.name.clone(),
                desc: method.desc.clone(),
                access: method.access,
                origin: MemberOrigin::from_annotations(&method.annotations),
            });
        }

        ClassDescriptor {
            name: node.name.clone(),
            super_name: node.super_name.clone(),
            interfaces: node.interfaces.iter().cloned().collect(),
            access: node.access,
            fields,
            methods,
            field_index,
            method_index,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn field(&self, sig: &MemberSignature) -> Option<&FieldDescriptor> {
        self.field_index.get(sig).map(|&i| &self.fields[i])
    }

    pub fn method(&self, sig: &MemberSignature) -> Option<&MethodDescriptor> {
        self.method_index.get(sig).map(|&i| &self.methods[i])
    }

    pub fn has_field(&self, sig: &MemberSignature) -> bool {
        self.field_index.contains_key(sig)
    }

    pub fn has_method(&self, sig: &MemberSignature) -> bool {
        self.method_index.contains_key(sig)
    }

    /// First field with this name, whatever its descriptor.
    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All methods with this name, in declaration order.
    pub fn methods_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MethodDescriptor> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }
}
