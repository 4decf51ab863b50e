// SPDX-License-Identifier: BSD-3-Clause
//! Incremental construction of programs, for embedders and tests.

use super::stmt::{
    BinaryOp, Binary, Copy, FieldAccess, Literal, LoadArray, LoadField, New, Return, StoreArray,
    StoreField,
};
use super::{
    CallKind, ClassDef, ClassId, Error, FieldDef, FieldId, Invoke, MethodDef, MethodId,
    MethodRef, Program, ProgramDef, Stmt, StmtId, Type, VarDef, VarId,
};

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    classes: Vec<ClassDef>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    vars: Vec<VarDef>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Declarations

    pub fn class(&mut self, name: &str) -> ClassId {
        self.classes.push(ClassDef {
            name: name.to_string(),
            ..ClassDef::default()
        });
        ClassId::from_index(self.classes.len() - 1)
    }

    pub fn subclass(&mut self, name: &str, superclass: ClassId) -> ClassId {
        let c = self.class(name);
        self.classes[c.index()].superclass = Some(superclass);
        c
    }

    pub fn interface(&mut self, name: &str) -> ClassId {
        let c = self.class(name);
        self.classes[c.index()].is_interface = true;
        self.classes[c.index()].is_abstract = true;
        c
    }

    /// Class `class` implements (or, for an interface, extends) `iface`
    pub fn implements(&mut self, class: ClassId, iface: ClassId) {
        self.classes[class.index()].interfaces.push(iface);
    }

    pub fn set_abstract(&mut self, class: ClassId) {
        self.classes[class.index()].is_abstract = true;
    }

    pub fn field(&mut self, class: ClassId, name: &str, ty: Type) -> FieldId {
        self.push_field(class, name, ty, false)
    }

    pub fn static_field(&mut self, class: ClassId, name: &str, ty: Type) -> FieldId {
        self.push_field(class, name, ty, true)
    }

    fn push_field(&mut self, class: ClassId, name: &str, ty: Type, is_static: bool) -> FieldId {
        self.fields.push(FieldDef {
            class,
            name: name.to_string(),
            ty,
            is_static,
        });
        FieldId::from_index(self.fields.len() - 1)
    }

    fn push_method(
        &mut self,
        class: ClassId,
        subsignature: &str,
        return_type: Type,
        is_static: bool,
        is_abstract: bool,
    ) -> MethodId {
        let name = subsignature
            .split_once('(')
            .and_then(|(before, _)| before.split_whitespace().last())
            .unwrap_or(subsignature)
            .to_string();
        self.methods.push(MethodDef {
            class,
            name,
            subsignature: subsignature.into(),
            is_static,
            is_abstract,
            params: Vec::new(),
            this: None,
            return_type,
            body: Vec::new(),
        });
        MethodId::from_index(self.methods.len() - 1)
    }

    /// A static method. The method name is taken from `subsignature`, e.g.
    /// `main` for `void main()`.
    pub fn static_method(&mut self, class: ClassId, subsignature: &str, ret: Type) -> MethodId {
        self.push_method(class, subsignature, ret, true, false)
    }

    /// A concrete instance method, with a fresh `this` variable
    pub fn method(&mut self, class: ClassId, subsignature: &str, ret: Type) -> MethodId {
        let m = self.push_method(class, subsignature, ret, false, false);
        let this = self.var(m, "this", Type::Class(class));
        self.methods[m.index()].this = Some(this);
        m
    }

    pub fn abstract_method(&mut self, class: ClassId, subsignature: &str, ret: Type) -> MethodId {
        self.push_method(class, subsignature, ret, false, true)
    }

    pub fn var(&mut self, method: MethodId, name: &str, ty: Type) -> VarId {
        self.vars.push(VarDef {
            method,
            name: name.to_string(),
            ty,
        });
        VarId::from_index(self.vars.len() - 1)
    }

    pub fn param(&mut self, method: MethodId, name: &str, ty: Type) -> VarId {
        let v = self.var(method, name, ty);
        self.methods[method.index()].params.push(v);
        v
    }

    pub fn this(&self, method: MethodId) -> Option<VarId> {
        self.methods[method.index()].this
    }

    // ------------------------------------------------------------------
    // Statements

    /// Index the next statement pushed onto `method` will get
    pub fn next_index(&self, method: MethodId) -> usize {
        self.methods[method.index()].body.len()
    }

    pub fn push(&mut self, method: MethodId, stmt: Stmt) -> StmtId {
        let body = &mut self.methods[method.index()].body;
        body.push(stmt);
        StmtId::new(method, body.len() - 1)
    }

    pub fn alloc(&mut self, method: MethodId, lhs: VarId, ty: Type) -> StmtId {
        self.push(method, Stmt::New(New { lhs, ty }))
    }

    pub fn copy(&mut self, method: MethodId, lhs: VarId, rhs: VarId) -> StmtId {
        self.push(method, Stmt::Copy(Copy { lhs, rhs }))
    }

    pub fn literal(&mut self, method: MethodId, lhs: VarId, value: i32) -> StmtId {
        self.push(method, Stmt::Literal(Literal { lhs, value }))
    }

    pub fn binary(
        &mut self,
        method: MethodId,
        lhs: VarId,
        op: BinaryOp,
        op0: VarId,
        op1: VarId,
    ) -> StmtId {
        self.push(method, Stmt::Binary(Binary { lhs, op, op0, op1 }))
    }

    /// `lhs = base.field`, or `lhs = C.field` if `base` is `None`
    pub fn load_field(
        &mut self,
        method: MethodId,
        lhs: VarId,
        base: Option<VarId>,
        field: FieldId,
    ) -> StmtId {
        let access = FieldAccess { base, field };
        self.push(method, Stmt::LoadField(LoadField { lhs, access }))
    }

    /// `base.field = rhs`, or `C.field = rhs` if `base` is `None`
    pub fn store_field(
        &mut self,
        method: MethodId,
        base: Option<VarId>,
        field: FieldId,
        rhs: VarId,
    ) -> StmtId {
        let access = FieldAccess { base, field };
        self.push(method, Stmt::StoreField(StoreField { access, rhs }))
    }

    pub fn load_array(&mut self, method: MethodId, lhs: VarId, base: VarId, index: VarId) -> StmtId {
        self.push(method, Stmt::LoadArray(LoadArray { lhs, base, index }))
    }

    pub fn store_array(
        &mut self,
        method: MethodId,
        base: VarId,
        index: VarId,
        rhs: VarId,
    ) -> StmtId {
        self.push(method, Stmt::StoreArray(StoreArray { base, index, rhs }))
    }

    /// A call referencing `callee` (its class and subsignature). Dispatch,
    /// if any, happens during analysis.
    pub fn call(
        &mut self,
        method: MethodId,
        kind: CallKind,
        lhs: Option<VarId>,
        receiver: Option<VarId>,
        callee: MethodId,
        args: Vec<VarId>,
    ) -> StmtId {
        let target = &self.methods[callee.index()];
        let invoke = Invoke {
            kind,
            lhs,
            receiver,
            method: MethodRef {
                class: target.class,
                subsignature: target.subsignature.clone(),
            },
            args,
        };
        self.push(method, Stmt::Invoke(invoke))
    }

    pub fn ret(&mut self, method: MethodId, value: Option<VarId>) -> StmtId {
        self.push(method, Stmt::Return(Return { value }))
    }

    // ------------------------------------------------------------------
    // Finishing

    pub fn into_def(self, entry: MethodId) -> ProgramDef {
        ProgramDef {
            classes: self.classes,
            fields: self.fields,
            methods: self.methods,
            vars: self.vars,
            entry,
        }
    }

    pub fn build(self, entry: MethodId) -> Result<Program, Error> {
        Program::new(self.into_def(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_small_program() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let foo = b.method(a, "int foo(int)", Type::Int);
        let p = b.param(foo, "p", Type::Int);
        b.ret(foo, Some(p));
        let x = b.var(main, "x", Type::Class(a));
        let i = b.var(main, "i", Type::Int);
        let r = b.var(main, "r", Type::Int);
        b.alloc(main, x, Type::Class(a));
        b.literal(main, i, 3);
        let call = b.call(main, CallKind::Virtual, Some(r), Some(x), foo, vec![i]);
        b.ret(main, None);

        let program = b.build(main).unwrap();
        assert_eq!("foo", program.method(foo).def.name);
        assert_eq!(vec![p], program.method(foo).return_vars);
        assert_eq!(vec![call], program.method(main).call_sites);
        assert_eq!(vec![call], program.var_uses(x).invokes);
        assert_eq!("A.main/x", program.var_name(x));
    }

    #[test]
    fn static_call_without_body_is_rejected() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        b.push(
            main,
            Stmt::Invoke(Invoke {
                kind: CallKind::Static,
                lhs: None,
                receiver: None,
                method: MethodRef {
                    class: a,
                    subsignature: "void missing()".into(),
                },
                args: vec![],
            }),
        );
        assert!(matches!(
            b.build(main),
            Err(Error::MissingStaticTarget { .. })
        ));
    }

    #[test]
    fn instance_call_needs_receiver() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let g = b.method(a, "void g()", Type::Void);
        b.call(main, CallKind::Virtual, None, None, g, vec![]);
        assert!(matches!(
            b.build(main),
            Err(Error::MissingReceiver(s)) if s == StmtId::new(main, 0)
        ));
    }

    #[test]
    fn foreign_variables_are_rejected() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let other = b.static_method(a, "void other()", Type::Void);
        let x = b.var(other, "x", Type::Int);
        b.literal(main, x, 1);
        assert!(matches!(
            b.build(main),
            Err(Error::ForeignVar { .. })
        ));
    }
}
