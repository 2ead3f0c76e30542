//! Overlay preprocessing.
//!
//! Validates one overlay against one target and produces the merge plan
//! (`OverlayDefinition`). Both overlay kinds run the same steps; the
//! `PreprocessPolicy` only switches on the extra structural rules for
//! interface overlays.
//!
//! # Steps
//!
//! 1. The overlay must declare the class as a target.
//! 2. Interface structure (interface policy only). Failure stops here.
//! 3. Interface bindings resolve through the class model.
//! 4. Fields, then methods, in declaration order.
//! 5. References inside grafted bodies are redirected to final names.
//!
//! Synthesized names are recorded on the declaration as `Renamed` tags keyed
//! by target, so preprocessing the same declaration against the same target
//! again reuses them.

use graft_diagnostic::{Diagnostic, DiagnosticSink, ErrorCode};
use graft_ir::{
    descriptor, FieldNode, MemberAnnotation, MemberSignature, MethodNode, Visibility,
};
use graft_model::{ClassDescriptor, ClassModel};
use rustc_hash::FxHashSet;

use crate::remap::Remapper;
use crate::uid::{self, IdentifierRegistry};
use crate::{
    IdentifierExhaustionError, InterfaceBinding, InvalidOverlayError, MemberKind, MemberTag,
    MixinConfig, OverlayDecl, OverlayDefinition, OverlayError, PlannedField, PlannedMethod,
    RenameOp,
};

/// Prefix shadow members may carry to avoid clashing with overlay names.
pub const SHADOW_PREFIX: &str = "shadow$";

/// Which rule set an overlay is validated under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PreprocessPolicy {
    Standard,
    /// Interface overlays: methods must be public or synthetic, fields static.
    Interface,
}

impl PreprocessPolicy {
    pub fn for_overlay(decl: &OverlayDecl) -> Self {
        if decl.is_interface() {
            PreprocessPolicy::Interface
        } else {
            PreprocessPolicy::Standard
        }
    }

    fn check_structure(self, decl: &OverlayDecl) -> Result<(), InvalidOverlayError> {
        if self == PreprocessPolicy::Standard {
            return Ok(());
        }
        let overlay = decl.name();
        for method in &decl.class.methods {
            if method.is_initializer() {
                continue;
            }
            let public = method.access.visibility() == Visibility::Public;
            if !public && !method.access.is_synthetic() {
                return Err(InvalidOverlayError::NonPublicInterfaceMethod {
                    overlay: overlay.to_owned(),
                    member: method.signature(),
                });
            }
        }
        if let Some(field) = decl.class.fields.iter().find(|f| !f.access.is_static()) {
            return Err(InvalidOverlayError::InstanceFieldInInterface {
                overlay: overlay.to_owned(),
                member: field.signature(),
            });
        }
        Ok(())
    }
}

/// Shared services preprocessing reads from.
#[derive(Clone, Copy)]
pub struct PreprocessContext<'a> {
    pub model: &'a ClassModel,
    pub registry: &'a IdentifierRegistry,
    pub config: &'a MixinConfig,
    pub sink: &'a dyn DiagnosticSink,
}

/// Validate `decl` against `target` and plan its merge.
///
/// `order` is the overlay's discovery order, kept on the definition to break
/// priority ties. The declaration is only mutated to record synthesized
/// names.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(overlay = %decl.class.name, target = %target.name)
)]
pub fn preprocess(
    decl: &mut OverlayDecl,
    target: &ClassDescriptor,
    order: usize,
    cx: &PreprocessContext<'_>,
) -> Result<OverlayDefinition, OverlayError> {
    if !decl.targets_class(&target.name) {
        return Err(InvalidOverlayError::NotATarget {
            overlay: decl.name().to_owned(),
            target: target.name.clone(),
        }
        .into());
    }

    let policy = PreprocessPolicy::for_overlay(decl);
    policy.check_structure(decl)?;

    let mut bindings = Vec::with_capacity(decl.bindings.len());
    for binding in &decl.bindings {
        let methods = cx.model.transitive_interface_methods(&binding.interface)?;
        bindings.push((binding.clone(), methods));
    }

    let mut pass = Pass {
        overlay: decl.name().to_owned(),
        target,
        cx,
        bindings,
        class_token: None,
        remap: Remapper::new(decl.name(), &target.name),
        added_fields: FxHashSet::default(),
        added_methods: FxHashSet::default(),
    };

    let mut fields = Vec::with_capacity(decl.class.fields.len());
    for field in &mut decl.class.fields {
        let (tag, name) = pass.plan_field(field)?;
        if tag == MemberTag::Renamed && field.renamed_to(&target.name).is_none() {
            field.annotations.push(MemberAnnotation::Renamed {
                target: target.name.clone(),
                original: field.name.clone(),
                name: name.clone(),
            });
        }
        let desc = pass.remap.desc(&field.desc);
        fields.push(PlannedField {
            tag,
            source: field.signature(),
            node: FieldNode {
                access: field.access,
                name,
                desc,
                annotations: field.annotations.clone(),
            },
        });
    }

    let mut methods = Vec::with_capacity(decl.class.methods.len());
    for method in &mut decl.class.methods {
        if method.is_initializer() {
            tracing::trace!(method = %method.signature(), "initializer not grafted");
            continue;
        }
        let (tag, name) = pass.plan_method(method)?;
        if tag == MemberTag::Renamed && method.renamed_to(&target.name).is_none() {
            method.annotations.push(MemberAnnotation::Renamed {
                target: target.name.clone(),
                original: method.name.clone(),
                name: name.clone(),
            });
        }
        let mut node = method.clone();
        node.name = name;
        methods.push(PlannedMethod {
            tag,
            source: method.signature(),
            node,
        });
    }

    let renames: Vec<RenameOp> = fields
        .iter()
        .filter(|f| f.node.name != f.source.name)
        .map(|f| RenameOp {
            kind: MemberKind::Field,
            from: f.source.clone(),
            to: f.node.name.clone(),
        })
        .chain(
            methods
                .iter()
                .filter(|m| m.node.name != m.source.name)
                .map(|m| RenameOp {
                    kind: MemberKind::Method,
                    from: m.source.clone(),
                    to: m.node.name.clone(),
                }),
        )
        .collect();

    let mut remap = pass.remap;
    for op in &renames {
        remap.add(op);
    }
    for planned in &mut methods {
        remap.method(&mut planned.node);
    }

    let mut interfaces = decl.class.interfaces.clone();
    if decl.is_accessor() {
        interfaces.push(decl.name().to_owned());
    }

    tracing::debug!(
        fields = fields.len(),
        methods = methods.len(),
        renames = renames.len(),
        "overlay validated"
    );

    Ok(OverlayDefinition {
        name: decl.name().to_owned(),
        target: target.name.clone(),
        priority: decl.priority.unwrap_or(cx.config.default_priority),
        order,
        policy,
        interfaces,
        fields,
        methods,
        renames,
        hooks: decl.hooks.clone(),
    })
}

/// State for one preprocessing run.
struct Pass<'a> {
    overlay: String,
    target: &'a ClassDescriptor,
    cx: &'a PreprocessContext<'a>,
    bindings: Vec<(InterfaceBinding, FxHashSet<MemberSignature>)>,
    class_token: Option<String>,
    remap: Remapper,
    /// Final names of fields added so far.
    added_fields: FxHashSet<String>,
    /// Final signatures of methods added so far.
    added_methods: FxHashSet<MemberSignature>,
}

impl Pass<'_> {
    fn class_token(&mut self) -> Result<String, IdentifierExhaustionError> {
        if let Some(token) = &self.class_token {
            return Ok(token.clone());
        }
        let token = self.cx.registry.uid_for_class(&self.target.name)?;
        self.class_token = Some(token.clone());
        Ok(token)
    }

    /// Issue member tokens until `build` yields a name `taken` rejects.
    fn synthesize(
        &mut self,
        name: &str,
        desc: &str,
        build: impl Fn(&str, &str) -> String,
        taken: impl Fn(&Self, &str) -> bool,
    ) -> Result<String, IdentifierExhaustionError> {
        let class_token = self.class_token()?;
        loop {
            let member_token = self.cx.registry.uid_for_member(name, desc, true)?;
            let candidate = build(&class_token, &member_token);
            if !taken(&*self, &candidate) {
                return Ok(candidate);
            }
            tracing::trace!(candidate, "synthesized name taken, retrying");
        }
    }

    fn method_taken(&self, sig: &MemberSignature) -> bool {
        self.target.has_method(sig) || self.added_methods.contains(sig)
    }

    fn field_taken(&self, name: &str) -> bool {
        self.target.field_named(name).is_some() || self.added_fields.contains(name)
    }

    fn warn(&self, code: ErrorCode, member: &MemberSignature, message: String) {
        self.cx.sink.report(
            Diagnostic::warning(code)
                .with_message(message)
                .with_class(self.target.name.clone())
                .with_overlay(self.overlay.clone())
                .with_member(member),
        );
    }

    fn invalid(&self) -> InvalidFactory<'_> {
        InvalidFactory {
            overlay: &self.overlay,
            target: &self.target.name,
        }
    }

    fn plan_field(&mut self, field: &FieldNode) -> Result<(MemberTag, String), OverlayError> {
        let desc = self.remap.desc(&field.desc);
        let sig = MemberSignature::new(field.name.clone(), desc.clone());

        if field.has(&MemberAnnotation::Overwrite) {
            return Err(InvalidOverlayError::OverwriteField {
                overlay: self.overlay.clone(),
                member: sig,
            }
            .into());
        }

        if field.has(&MemberAnnotation::Shadow) {
            let name = field.name.strip_prefix(SHADOW_PREFIX).unwrap_or(&field.name);
            return match self.target.field_named(name) {
                Some(existing) if existing.desc == desc => Ok((MemberTag::Shadow, name.to_owned())),
                Some(existing) => Err(self.invalid().shadow_mismatch(sig, &existing.desc).into()),
                None => Err(self.invalid().shadow_missing(sig).into()),
            };
        }

        let (tag, name) = if field.has(&MemberAnnotation::Unique) {
            if self.field_taken(&field.name) {
                let name = self.rename_unique(
                    field.access.visibility(),
                    &sig,
                    field.renamed_to(&self.target.name),
                    |pass, candidate| pass.field_taken(candidate),
                )?;
                (MemberTag::Renamed, name)
            } else {
                (MemberTag::Unique, field.name.clone())
            }
        } else if self.field_taken(&field.name) {
            return Err(self.invalid().collision(sig).into());
        } else {
            (MemberTag::New, field.name.clone())
        };

        self.added_fields.insert(name.clone());
        Ok((tag, name))
    }

    fn plan_method(&mut self, method: &MethodNode) -> Result<(MemberTag, String), OverlayError> {
        let desc = self.remap.desc(&method.desc);
        let sig = MemberSignature::new(method.name.clone(), desc.clone());

        let (tag, name) = self.classify_method(method, &sig)?;
        if tag.is_added() {
            self.added_methods.insert(sig.renamed(name.clone()));
        }
        Ok((tag, name))
    }

    fn classify_method(
        &mut self,
        method: &MethodNode,
        sig: &MemberSignature,
    ) -> Result<(MemberTag, String), OverlayError> {
        if let Some(annotation) = method.find_annotation(|a| {
            matches!(
                a,
                MemberAnnotation::Accessor { .. } | MemberAnnotation::Invoker { .. }
            )
        }) {
            self.check_accessor(method, sig, annotation)?;
            if self.method_taken(sig) {
                return Err(self.invalid().collision(sig.clone()).into());
            }
            return Ok((MemberTag::New, method.name.clone()));
        }

        if method.has(&MemberAnnotation::Shadow) {
            let name = method.name.strip_prefix(SHADOW_PREFIX).unwrap_or(&method.name);
            let target_sig = sig.renamed(name);
            if self.target.has_method(&target_sig) {
                return Ok((MemberTag::Shadow, name.to_owned()));
            }
            return Err(match self.target.methods_named(name).next() {
                Some(existing) => self.invalid().shadow_mismatch(sig.clone(), &existing.desc),
                None => self.invalid().shadow_missing(sig.clone()),
            }
            .into());
        }

        if let Some(kind) = method.annotations.iter().find_map(MemberAnnotation::injector_kind) {
            if method.has(&MemberAnnotation::Unique) && self.cx.config.warn_redundant_unique {
                self.warn(
                    ErrorCode::W1001,
                    sig,
                    format!("handler `{sig}` is renamed anyway; its unique tag is redundant"),
                );
            }
            let name = match method.renamed_to(&self.target.name) {
                Some(name) => name.to_owned(),
                None => self.synthesize(
                    &method.name,
                    &sig.desc,
                    |class_token, member_token| {
                        uid::handler_name(kind, &method.name, class_token, member_token)
                    },
                    |pass, candidate| pass.method_taken(&sig.renamed(candidate)),
                )?,
            };
            tracing::debug!(handler = %sig, name, "handler renamed");
            return Ok((MemberTag::Renamed, name));
        }

        if method.has(&MemberAnnotation::Overwrite) {
            if self.target.has_method(sig) {
                return Ok((MemberTag::Overwrite, method.name.clone()));
            }
            if self.cx.config.require_overwrite_targets {
                return Err(InvalidOverlayError::OverwriteTargetMissing {
                    overlay: self.overlay.clone(),
                    target: self.target.name.clone(),
                    member: sig.clone(),
                }
                .into());
            }
            self.warn(
                ErrorCode::W1002,
                sig,
                format!("overwrite target `{sig}` is missing; the method is added instead"),
            );
            return Ok((MemberTag::New, method.name.clone()));
        }

        if method.has(&MemberAnnotation::Unique) {
            if !self.method_taken(sig) {
                return Ok((MemberTag::Unique, method.name.clone()));
            }
            let name = self.rename_unique(
                method.access.visibility(),
                sig,
                method.renamed_to(&self.target.name),
                |pass, candidate| pass.method_taken(&sig.renamed(candidate)),
            )?;
            return Ok((MemberTag::Renamed, name));
        }

        for (binding, methods) in &self.bindings {
            let Some(stripped) = binding.strip(&method.name) else {
                continue;
            };
            let stripped_sig = sig.renamed(stripped);
            if !methods.contains(&stripped_sig) {
                return Err(InvalidOverlayError::UnknownInterfaceMethod {
                    overlay: self.overlay.clone(),
                    interface: binding.interface.clone(),
                    member: stripped_sig,
                }
                .into());
            }
            let tag = if self.target.has_method(&stripped_sig) {
                MemberTag::Overwrite
            } else {
                MemberTag::New
            };
            return Ok((tag, stripped.to_owned()));
        }

        if self.method_taken(sig) {
            return Err(self.invalid().collision(sig.clone()).into());
        }
        Ok((MemberTag::New, method.name.clone()))
    }

    /// Name for a unique member that collides with an existing one.
    fn rename_unique(
        &mut self,
        visibility: Visibility,
        sig: &MemberSignature,
        recorded: Option<&str>,
        taken: impl Fn(&Self, &str) -> bool,
    ) -> Result<String, OverlayError> {
        if visibility == Visibility::Public {
            return Err(InvalidOverlayError::PublicUniqueCollision {
                overlay: self.overlay.clone(),
                target: self.target.name.clone(),
                member: sig.clone(),
            }
            .into());
        }
        if !self.cx.config.rename_conflicting_unique {
            return Err(self.invalid().collision(sig.clone()).into());
        }
        let name = match recorded {
            Some(name) => name.to_owned(),
            None => self.synthesize(
                &sig.name,
                &sig.desc,
                |class_token, member_token| uid::unique_name(&sig.name, class_token, member_token),
                taken,
            )?,
        };
        self.warn(
            ErrorCode::W1003,
            sig,
            format!("unique member `{sig}` collides with the target and becomes `{name}`"),
        );
        Ok(name)
    }

    fn check_accessor(
        &self,
        method: &MethodNode,
        sig: &MemberSignature,
        annotation: &MemberAnnotation,
    ) -> Result<(), InvalidOverlayError> {
        let invalid = self.invalid();
        match annotation {
            MemberAnnotation::Accessor { field } => {
                let Some(existing) = self.target.field_named(field) else {
                    return Err(invalid.accessor_missing(sig.clone(), field));
                };
                let fits = match descriptor::split_method(&sig.desc) {
                    Some((params, ret)) => match params.as_slice() {
                        [] => ret == existing.desc,
                        [value] => *value == existing.desc && ret == "V",
                        _ => false,
                    },
                    None => false,
                };
                if !fits {
                    return Err(invalid.accessor_mismatch(
                        sig.clone(),
                        field,
                        format!("expected `(){0}` or `({0})V`", existing.desc),
                    ));
                }
                check_static(&invalid, method, sig, field, existing.access.is_static())
            }
            MemberAnnotation::Invoker { method: wanted } => {
                match self.target.method(&sig.renamed(wanted.as_str())) {
                    Some(existing) => {
                        check_static(&invalid, method, sig, wanted, existing.access.is_static())
                    }
                    None if self.target.methods_named(wanted).next().is_some() => Err(invalid
                        .accessor_mismatch(
                            sig.clone(),
                            wanted,
                            format!("no overload takes `{}`", sig.desc),
                        )),
                    None => Err(invalid.accessor_missing(sig.clone(), wanted)),
                }
            }
            _ => Ok(()),
        }
    }
}

fn check_static(
    invalid: &InvalidFactory<'_>,
    method: &MethodNode,
    sig: &MemberSignature,
    wanted: &str,
    target_static: bool,
) -> Result<(), InvalidOverlayError> {
    match (method.access.is_static(), target_static) {
        (true, false) => Err(invalid.accessor_mismatch(
            sig.clone(),
            wanted,
            "static stub for an instance member".to_owned(),
        )),
        (false, true) => Err(invalid.accessor_mismatch(
            sig.clone(),
            wanted,
            "instance stub for a static member".to_owned(),
        )),
        _ => Ok(()),
    }
}

/// Builds errors that carry the overlay and target names.
struct InvalidFactory<'a> {
    overlay: &'a str,
    target: &'a str,
}

impl InvalidFactory<'_> {
    fn shadow_missing(&self, member: MemberSignature) -> InvalidOverlayError {
        InvalidOverlayError::ShadowNotFound {
            overlay: self.overlay.to_owned(),
            target: self.target.to_owned(),
            member,
        }
    }

    fn shadow_mismatch(&self, member: MemberSignature, found: &str) -> InvalidOverlayError {
        InvalidOverlayError::ShadowDescriptorMismatch {
            overlay: self.overlay.to_owned(),
            target: self.target.to_owned(),
            member,
            found: found.to_owned(),
        }
    }

    fn collision(&self, member: MemberSignature) -> InvalidOverlayError {
        InvalidOverlayError::MemberCollision {
            overlay: self.overlay.to_owned(),
            target: self.target.to_owned(),
            member,
        }
    }

    fn accessor_missing(&self, member: MemberSignature, wanted: &str) -> InvalidOverlayError {
        InvalidOverlayError::AccessorTargetMissing {
            overlay: self.overlay.to_owned(),
            target: self.target.to_owned(),
            member,
            wanted: wanted.to_owned(),
        }
    }

    fn accessor_mismatch(
        &self,
        member: MemberSignature,
        wanted: &str,
        reason: String,
    ) -> InvalidOverlayError {
        InvalidOverlayError::AccessorDescriptorMismatch {
            overlay: self.overlay.to_owned(),
            target: self.target.to_owned(),
            member,
            wanted: wanted.to_owned(),
            reason,
        }
    }
}
