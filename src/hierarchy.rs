// SPDX-License-Identifier: BSD-3-Clause
//! Class hierarchy and dispatch resolution.
//!
//! Dispatch rules:
//!
//! - Static calls target the method declared by the referenced class.
//! - Special calls (constructors, private and `super` calls) dispatch on the
//!   referenced class.
//! - Virtual and interface calls dispatch on the class of the receiver
//!   object. Without a receiver object (class-hierarchy analysis), every
//!   subtype of the referenced class is a possible receiver class.
//!
//! Dispatching on a class with no matching concrete method anywhere on its
//! superclass chain yields no target. This is not an error: a hierarchy may
//! contain abstract-only branches.

use std::collections::VecDeque;

use either::Either;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::{CallKind, ClassDef, ClassId, Error, Invoke, MethodDef, MethodId, Subsignature};

#[derive(Debug)]
pub struct ClassHierarchy {
    superclass: Vec<Option<ClassId>>,
    interfaces: Vec<Vec<ClassId>>,
    is_interface: Vec<bool>,
    declared: Vec<FxHashMap<Subsignature, MethodId>>,
    abstract_methods: FxHashSet<MethodId>,
    direct_subclasses: Vec<Vec<ClassId>>,
    direct_implementors: Vec<Vec<ClassId>>,
    direct_subinterfaces: Vec<Vec<ClassId>>,
}

impl ClassHierarchy {
    pub(crate) fn new(classes: &[ClassDef], methods: &[MethodDef]) -> Result<Self, Error> {
        let n = classes.len();
        let mut direct_subclasses = vec![Vec::new(); n];
        let mut direct_implementors = vec![Vec::new(); n];
        let mut direct_subinterfaces = vec![Vec::new(); n];
        for (idx, c) in classes.iter().enumerate() {
            let id = ClassId::from_index(idx);
            if let Some(s) = c.superclass {
                direct_subclasses[s.index()].push(id);
            }
            for i in &c.interfaces {
                if c.is_interface {
                    direct_subinterfaces[i.index()].push(id);
                } else {
                    direct_implementors[i.index()].push(id);
                }
            }
        }

        let superclass: Vec<Option<ClassId>> = classes.iter().map(|c| c.superclass).collect();
        for idx in 0..n {
            // A chain longer than the number of classes must revisit one
            let mut current = superclass[idx];
            let mut steps = 0;
            while let Some(s) = current {
                steps += 1;
                if steps > n {
                    return Err(Error::CyclicHierarchy(ClassId::from_index(idx)));
                }
                current = superclass[s.index()];
            }
        }

        let mut declared: Vec<FxHashMap<Subsignature, MethodId>> = vec![FxHashMap::default(); n];
        let mut abstract_methods = FxHashSet::default();
        for (idx, m) in methods.iter().enumerate() {
            let id = MethodId::from_index(idx);
            let prev = declared[m.class.index()].insert(m.subsignature.clone(), id);
            if prev.is_some() {
                return Err(Error::DuplicateMethod {
                    class: m.class,
                    subsignature: m.subsignature.clone(),
                });
            }
            if m.is_abstract {
                abstract_methods.insert(id);
            }
        }

        Ok(ClassHierarchy {
            superclass,
            interfaces: classes.iter().map(|c| c.interfaces.clone()).collect(),
            is_interface: classes.iter().map(|c| c.is_interface).collect(),
            declared,
            abstract_methods,
            direct_subclasses,
            direct_implementors,
            direct_subinterfaces,
        })
    }

    #[inline]
    pub fn superclass(&self, c: ClassId) -> Option<ClassId> {
        self.superclass[c.index()]
    }

    #[inline]
    pub fn is_interface(&self, c: ClassId) -> bool {
        self.is_interface[c.index()]
    }

    #[inline]
    pub fn is_abstract_method(&self, m: MethodId) -> bool {
        self.abstract_methods.contains(&m)
    }

    pub fn declared_method(&self, c: ClassId, subsig: &Subsignature) -> Option<MethodId> {
        self.declared[c.index()].get(subsig).copied()
    }

    /// Subclasses of a class; implementors and subinterfaces of an interface
    pub fn direct_subtypes(&self, c: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        if self.is_interface(c) {
            Either::Left(
                self.direct_implementors[c.index()]
                    .iter()
                    .chain(self.direct_subinterfaces[c.index()].iter())
                    .copied(),
            )
        } else {
            Either::Right(self.direct_subclasses[c.index()].iter().copied())
        }
    }

    /// Reflexive subtyping, following superclasses and interfaces
    pub fn is_subtype(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([sub]);
        while let Some(c) = queue.pop_front() {
            if c == sup {
                return true;
            }
            if !seen.insert(c) {
                continue;
            }
            queue.extend(self.superclass(c));
            queue.extend(self.interfaces[c.index()].iter().copied());
        }
        false
    }

    /// The first concrete method matching `subsig` on the superclass chain
    /// starting at `class`.
    pub fn dispatch(&self, class: ClassId, subsig: &Subsignature) -> Option<MethodId> {
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(m) = self.declared_method(c, subsig) {
                if !self.is_abstract_method(m) {
                    return Some(m);
                }
            }
            current = self.superclass(c);
        }
        None
    }

    /// Every dispatch target of `subsig` over `declared` and all of its
    /// transitive subtypes.
    pub fn resolve_virtual_targets(
        &self,
        declared: ClassId,
        subsig: &Subsignature,
    ) -> FxHashSet<MethodId> {
        let mut targets = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([declared]);
        while let Some(c) = queue.pop_front() {
            if !visited.insert(c) {
                continue;
            }
            if let Some(m) = self.dispatch(c, subsig) {
                targets.insert(m);
            }
            queue.extend(self.direct_subtypes(c));
        }
        targets
    }

    /// Callee of `invoke` given the class of a receiver object, `None` for
    /// static calls.
    pub fn resolve_callee(&self, recv: Option<ClassId>, invoke: &Invoke) -> Option<MethodId> {
        let mref = &invoke.method;
        match invoke.kind {
            CallKind::Static => self.declared_method(mref.class, &mref.subsignature),
            CallKind::Special => self.dispatch(mref.class, &mref.subsignature),
            CallKind::Virtual | CallKind::Interface => {
                recv.and_then(|r| self.dispatch(r, &mref.subsignature))
            }
        }
    }

    /// Callees of `invoke` according to class-hierarchy analysis
    pub fn resolve_cha(&self, invoke: &Invoke) -> FxHashSet<MethodId> {
        let mref = &invoke.method;
        match invoke.kind {
            CallKind::Static | CallKind::Special => {
                self.resolve_callee(None, invoke).into_iter().collect()
            }
            CallKind::Virtual | CallKind::Interface => {
                self.resolve_virtual_targets(mref.class, &mref.subsignature)
            }
        }
    }
}
