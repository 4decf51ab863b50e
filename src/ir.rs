// SPDX-License-Identifier: BSD-3-Clause
//! Representation of an object-oriented program that is amenable to
//! analysis.
//!
//! The raw form, [`ProgramDef`], is plain data (and can be read from JSON).
//! [`Program::new`] checks it for well-formedness once, up front, and builds
//! the indexes the analyses query all the time: the class hierarchy,
//! per-method return variables and call sites, and, for every variable, the
//! heap accesses and calls that use it as a base or receiver. The analyses
//! assume a well-formed program and do not re-check it.

use rustc_hash::FxHashSet;

use crate::hierarchy::ClassHierarchy;

mod builder;
pub use builder::*;
mod error;
pub use error::*;
mod name;
pub(crate) use name::id;
pub use name::*;
pub mod stmt;
pub use stmt::{BinaryOp, CallKind, Invoke, MethodRef, Stmt, Type};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<ClassId>,
    #[serde(default)]
    pub interfaces: Vec<ClassId>,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_abstract: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FieldDef {
    pub class: ClassId,
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct VarDef {
    pub method: MethodId,
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct MethodDef {
    pub class: ClassId,
    pub name: String,
    pub subsignature: Subsignature,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub params: Vec<VarId>,
    #[serde(default)]
    pub this: Option<VarId>,
    pub return_type: Type,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

/// Raw program model, as produced by a front end
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ProgramDef {
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub vars: Vec<VarDef>,
    pub entry: MethodId,
}

/// Heap accesses and calls through a variable. Only instance accesses are
/// recorded, since only those depend on what the variable points to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VarUses {
    /// `x.f = y`
    pub store_fields: Vec<StmtId>,
    /// `y = x.f`
    pub load_fields: Vec<StmtId>,
    /// `x[i] = y`
    pub store_arrays: Vec<StmtId>,
    /// `y = x[i]`
    pub load_arrays: Vec<StmtId>,
    /// `x.m(...)`
    pub invokes: Vec<StmtId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub def: MethodDef,
    /// Variables returned by some `return` statement
    pub return_vars: Vec<VarId>,
    /// All variables declared in this method
    pub vars: Vec<VarId>,
    pub call_sites: Vec<StmtId>,
}

impl Method {
    #[inline]
    pub fn class(&self) -> ClassId {
        self.def.class
    }

    #[inline]
    pub fn params(&self) -> &[VarId] {
        &self.def.params
    }

    #[inline]
    pub fn this(&self) -> Option<VarId> {
        self.def.this
    }

    #[inline]
    pub fn stmts(&self) -> &[Stmt] {
        &self.def.body
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.def.is_static
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.def.is_abstract
    }

    #[inline]
    pub fn subsignature(&self) -> &Subsignature {
        &self.def.subsignature
    }
}

#[derive(Debug)]
pub struct Program {
    classes: Vec<ClassDef>,
    fields: Vec<FieldDef>,
    methods: Vec<Method>,
    vars: Vec<VarDef>,
    var_uses: Vec<VarUses>,
    entry: MethodId,
    hierarchy: ClassHierarchy,
}

impl Program {
    pub fn new(def: ProgramDef) -> Result<Self, Error> {
        let ProgramDef {
            classes,
            fields,
            methods,
            vars,
            entry,
        } = def;

        let nclasses = classes.len();
        let check_class = |c: ClassId| -> Result<(), Error> {
            if c.index() < nclasses {
                Ok(())
            } else {
                Err(Error::UnknownClass(c))
            }
        };
        for c in &classes {
            if let Some(s) = c.superclass {
                check_class(s)?;
            }
            for i in &c.interfaces {
                check_class(*i)?;
            }
        }
        for f in &fields {
            check_class(f.class)?;
            check_type(&f.ty, nclasses)?;
        }
        for v in &vars {
            if v.method.index() >= methods.len() {
                return Err(Error::UnknownMethod(v.method));
            }
            check_type(&v.ty, nclasses)?;
        }
        for m in &methods {
            check_class(m.class)?;
        }
        if entry.index() >= methods.len() {
            return Err(Error::UnknownMethod(entry));
        }

        let hierarchy = ClassHierarchy::new(&classes, &methods)?;

        let mut method_vars = vec![Vec::new(); methods.len()];
        for (idx, v) in vars.iter().enumerate() {
            method_vars[v.method.index()].push(VarId::from_index(idx));
        }

        let arities: Vec<usize> = methods.iter().map(|m| m.params.len()).collect();
        let mut var_uses = vec![VarUses::default(); vars.len()];
        let mut ms = Vec::with_capacity(methods.len());
        for (m_idx, m) in methods.into_iter().enumerate() {
            let m_id = MethodId::from_index(m_idx);
            if m.is_abstract && !m.body.is_empty() {
                return Err(Error::AbstractWithBody(m_id));
            }
            if !m.is_static && !m.is_abstract && m.this.is_none() {
                return Err(Error::MissingThis(m_id));
            }
            for v in m.params.iter().chain(m.this.iter()) {
                check_var(&vars, m_id, StmtId::new(m_id, 0), *v)?;
            }

            let mut return_vars = FxHashSet::default();
            let mut ordered_return_vars = Vec::new();
            let mut call_sites = Vec::new();
            for (s_idx, s) in m.body.iter().enumerate() {
                let s_id = StmtId::new(m_id, s_idx);
                for v in s.def().into_iter().chain(s.uses()) {
                    check_var(&vars, m_id, s_id, v)?;
                }
                let check_target = |t: usize| -> Result<(), Error> {
                    if t < m.body.len() {
                        Ok(())
                    } else {
                        Err(Error::BadTarget {
                            stmt: s_id,
                            target: t,
                        })
                    }
                };
                match s {
                    Stmt::New(n) => check_type(&n.ty, nclasses)?,
                    Stmt::Cast(c) => check_type(&c.ty, nclasses)?,
                    Stmt::LoadField(stmt::LoadField { access, .. }) => {
                        check_access(&fields, s_id, access)?;
                        if let Some(base) = access.base {
                            var_uses[base.index()].load_fields.push(s_id);
                        }
                    }
                    Stmt::StoreField(stmt::StoreField { access, .. }) => {
                        check_access(&fields, s_id, access)?;
                        if let Some(base) = access.base {
                            var_uses[base.index()].store_fields.push(s_id);
                        }
                    }
                    Stmt::LoadArray(l) => var_uses[l.base.index()].load_arrays.push(s_id),
                    Stmt::StoreArray(st) => var_uses[st.base.index()].store_arrays.push(s_id),
                    Stmt::Invoke(i) => {
                        check_class(i.method.class)?;
                        match (i.kind, i.receiver) {
                            (CallKind::Static, Some(_)) => {
                                return Err(Error::StaticWithReceiver(s_id))
                            }
                            (CallKind::Static, None) => {
                                let declared = hierarchy
                                    .declared_method(i.method.class, &i.method.subsignature);
                                let concrete = declared
                                    .map(|d| !hierarchy.is_abstract_method(d))
                                    .unwrap_or(false);
                                if !concrete {
                                    return Err(Error::MissingStaticTarget {
                                        stmt: s_id,
                                        class: i.method.class,
                                        subsignature: i.method.subsignature.clone(),
                                    });
                                }
                            }
                            (_, None) => return Err(Error::MissingReceiver(s_id)),
                            (_, Some(recv)) => var_uses[recv.index()].invokes.push(s_id),
                        }
                        // Overrides share the subsignature, so the referenced
                        // method fixes the arity when it is declared
                        if let Some(d) =
                            hierarchy.declared_method(i.method.class, &i.method.subsignature)
                        {
                            let expected = arities[d.index()];
                            if i.args.len() != expected {
                                return Err(Error::ArityMismatch {
                                    stmt: s_id,
                                    subsignature: i.method.subsignature.clone(),
                                    expected,
                                    found: i.args.len(),
                                });
                            }
                        }
                        call_sites.push(s_id);
                    }
                    Stmt::If(i) => {
                        if !i.op.is_comparison() {
                            return Err(Error::NonComparisonBranch(s_id));
                        }
                        check_target(i.target)?
                    }
                    Stmt::Switch(sw) => {
                        check_target(sw.default)?;
                        for (_, t) in &sw.cases {
                            check_target(*t)?;
                        }
                    }
                    Stmt::Goto(g) => check_target(g.target)?,
                    Stmt::Return(stmt::Return { value: Some(v) }) => {
                        if return_vars.insert(*v) {
                            ordered_return_vars.push(*v);
                        }
                    }
                    Stmt::Return(stmt::Return { value: None }) => (),
                    Stmt::Copy(_) | Stmt::Literal(_) | Stmt::Binary(_) | Stmt::Nop => (),
                }
            }

            ms.push(Method {
                def: m,
                return_vars: ordered_return_vars,
                vars: std::mem::take(&mut method_vars[m_idx]),
                call_sites,
            });
        }

        let entry_method = &ms[entry.index()];
        if !entry_method.is_static() || entry_method.is_abstract() {
            return Err(Error::BadEntry(entry));
        }

        Ok(Program {
            classes,
            fields,
            methods: ms,
            vars,
            var_uses,
            entry,
            hierarchy,
        })
    }

    #[inline]
    pub fn entry(&self) -> MethodId {
        self.entry
    }

    #[inline]
    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    #[inline]
    pub fn class(&self, c: ClassId) -> &ClassDef {
        &self.classes[c.index()]
    }

    #[inline]
    pub fn field(&self, f: FieldId) -> &FieldDef {
        &self.fields[f.index()]
    }

    #[inline]
    pub fn method(&self, m: MethodId) -> &Method {
        &self.methods[m.index()]
    }

    #[inline]
    pub fn var(&self, v: VarId) -> &VarDef {
        &self.vars[v.index()]
    }

    #[inline]
    pub fn var_uses(&self, v: VarId) -> &VarUses {
        &self.var_uses[v.index()]
    }

    #[inline]
    pub fn stmt(&self, s: StmtId) -> &Stmt {
        &self.methods[s.method.index()].def.body[s.index as usize]
    }

    pub fn invoke(&self, s: StmtId) -> Option<&Invoke> {
        self.stmt(s).as_invoke()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId::from_index(i), c))
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &Method)> + '_ {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId::from_index(i), m))
    }

    /// Human-readable `Class.method` name, for output
    pub fn method_name(&self, m: MethodId) -> String {
        let method = self.method(m);
        format!("{}.{}", self.class(method.class()).name, method.def.name)
    }

    /// Human-readable `Class.method/var` name, for output
    pub fn var_name(&self, v: VarId) -> String {
        let var = self.var(v);
        format!("{}/{}", self.method_name(var.method), var.name)
    }
}

fn check_type(ty: &Type, nclasses: usize) -> Result<(), Error> {
    match ty {
        Type::Class(c) if c.index() >= nclasses => Err(Error::UnknownClass(*c)),
        Type::Array(elem) => check_type(elem, nclasses),
        _ => Ok(()),
    }
}

fn check_field(fields: &[FieldDef], f: FieldId) -> Result<(), Error> {
    if f.index() < fields.len() {
        Ok(())
    } else {
        Err(Error::UnknownField(f))
    }
}

/// `base` is present exactly for instance fields
fn check_access(
    fields: &[FieldDef],
    site: StmtId,
    access: &stmt::FieldAccess,
) -> Result<(), Error> {
    check_field(fields, access.field)?;
    let field = access.field;
    match (fields[field.index()].is_static, access.base) {
        (true, Some(_)) => Err(Error::StaticFieldThroughObject { stmt: site, field }),
        (false, None) => Err(Error::InstanceFieldWithoutObject { stmt: site, field }),
        (true, None) | (false, Some(_)) => Ok(()),
    }
}

fn check_var(vars: &[VarDef], method: MethodId, stmt: StmtId, var: VarId) -> Result<(), Error> {
    match vars.get(var.index()) {
        None => Err(Error::UnknownVar { stmt, var }),
        Some(v) if v.method != method => Err(Error::ForeignVar {
            method,
            owner: v.method,
            var,
        }),
        Some(_) => Ok(()),
    }
}
