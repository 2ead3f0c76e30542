//! Editable class tree.
//!
//! A `ClassNode` is what a class parser produces and a class writer consumes.
//! Phases mutate it in place; nothing here enforces member uniqueness, that
//! is the merge engine's job.

use serde::{Deserialize, Serialize};

use crate::{Access, Insn, MemberAnnotation, MemberSignature};

/// A field declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct FieldNode {
    pub access: Access,
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub annotations: Vec<MemberAnnotation>,
}

impl FieldNode {
    pub fn new(access: Access, name: impl Into<String>, desc: impl Into<String>) -> Self {
        FieldNode {
            access,
            name: name.into(),
            desc: desc.into(),
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: MemberAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn signature(&self) -> MemberSignature {
        MemberSignature::new(self.name.clone(), self.desc.clone())
    }

    pub fn has(&self, annotation: &MemberAnnotation) -> bool {
        self.annotations.contains(annotation)
    }

    /// Name recorded for `target` by an earlier rename pass, if any.
    pub fn renamed_to(&self, target: &str) -> Option<&str> {
        renamed_to(&self.annotations, target)
    }
}

fn renamed_to<'a>(annotations: &'a [MemberAnnotation], target: &str) -> Option<&'a str> {
    annotations.iter().find_map(|a| match a {
        MemberAnnotation::Renamed { target: t, name, .. } if t == target => Some(name.as_str()),
        _ => None,
    })
}

/// A method declaration with its body.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct MethodNode {
    pub access: Access,
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub annotations: Vec<MemberAnnotation>,
    #[serde(default)]
    pub body: Vec<Insn>,
}

impl MethodNode {
    pub fn new(access: Access, name: impl Into<String>, desc: impl Into<String>) -> Self {
        MethodNode {
            access,
            name: name.into(),
            desc: desc.into(),
            annotations: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: MemberAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<Insn>) -> Self {
        self.body = body;
        self
    }

    pub fn signature(&self) -> MemberSignature {
        MemberSignature::new(self.name.clone(), self.desc.clone())
    }

    pub fn has(&self, annotation: &MemberAnnotation) -> bool {
        self.annotations.contains(annotation)
    }

    /// First annotation matching `pred`.
    pub fn find_annotation<F>(&self, pred: F) -> Option<&MemberAnnotation>
    where
        F: Fn(&MemberAnnotation) -> bool,
    {
        self.annotations.iter().find(|a| pred(a))
    }

    /// Name recorded for `target` by an earlier rename pass, if any.
    pub fn renamed_to(&self, target: &str) -> Option<&str> {
        renamed_to(&self.annotations, target)
    }

    /// Constructors and static initializers.
    pub fn is_initializer(&self) -> bool {
        self.name == crate::CONSTRUCTOR || self.name == crate::CLASS_INITIALIZER
    }
}

/// Entry of a class's inner class table.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct InnerClassNode {
    pub name: String,
    pub outer: Option<String>,
    pub access: Access,
}

/// A complete class body.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ClassNode {
    pub name: String,
    #[serde(default)]
    pub super_name: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
    #[serde(default)]
    pub methods: Vec<MethodNode>,
    #[serde(default)]
    pub inner_classes: Vec<InnerClassNode>,
}

impl ClassNode {
    pub fn new(name: impl Into<String>, access: Access) -> Self {
        ClassNode {
            name: name.into(),
            super_name: None,
            interfaces: Vec::new(),
            access,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_super(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodNode) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_inner_class(mut self, inner: InnerClassNode) -> Self {
        self.inner_classes.push(inner);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }

    pub fn field(&self, sig: &MemberSignature) -> Option<&FieldNode> {
        self.fields
            .iter()
            .find(|f| f.name == sig.name && f.desc == sig.desc)
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, sig: &MemberSignature) -> Option<&MethodNode> {
        self.methods
            .iter()
            .find(|m| m.name == sig.name && m.desc == sig.desc)
    }

    /// All methods with the given name, in declaration order.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodNode> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Add `interface` unless it is already declared. Returns whether it was added.
    pub fn add_interface(&mut self, interface: &str) -> bool {
        if self.interfaces.iter().any(|i| i == interface) {
            return false;
        }
        self.interfaces.push(interface.to_owned());
        true
    }
}
