//! Lexical scopes: an arena of scopes linked to their parents.
//!
//! Scopes are pushed on entry to the file, a class body, a function or a
//! catch clause and popped on exit. Resolution walks from the current scope
//! outward and returns the first declaration with the requested name.

/// Index of a scope in the [`ScopeStack`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    Class,
    Function,
    Catch,
}

/// A name visible in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Declared type as written in the source, e.g. `Vector.<int>`.
    pub type_name: Option<String>,
    /// Qualifier required to reach the name: `this` or a class name.
    pub bound: Option<String>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            bound: None,
        }
    }

    pub fn typed(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
            bound: None,
        }
    }

    pub fn bound_to(mut self, qualifier: impl Into<String>) -> Self {
        self.bound = Some(qualifier.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    /// Name of the class whose body this scope is.
    class_name: Option<String>,
    declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl ScopeStack {
    /// A stack holding only the file scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::File,
                parent: None,
                class_name: None,
                declarations: Vec::new(),
            }],
            current: ScopeId(0),
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn is_at_root(&self) -> bool {
        self.current == self.root()
    }

    pub fn push(&mut self, kind: ScopeKind, class_name: Option<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(self.current),
            class_name,
            declarations: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Leave `expected`, which must be the current scope.
    pub fn pop(&mut self, expected: ScopeId) -> Result<(), String> {
        if self.current != expected {
            return Err(format!(
                "scope mismatch: leaving scope {} while scope {} is current",
                expected.0, self.current.0
            ));
        }
        match self.scopes[expected.0].parent {
            Some(parent) => {
                self.current = parent;
                Ok(())
            }
            None => Err("cannot leave the file scope".to_string()),
        }
    }

    pub fn declare(&mut self, declaration: Declaration) {
        self.declare_in(self.current, declaration);
    }

    pub fn declare_in(&mut self, scope: ScopeId, declaration: Declaration) {
        self.scopes[scope.0].declarations.push(declaration);
    }

    fn chain(&self) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(&self.scopes[self.current.0]), move |scope| {
            scope.parent.map(|p| &self.scopes[p.0])
        })
    }

    /// Nearest declaration of `name`, innermost scope first.
    pub fn resolve(&self, name: &str) -> Option<&Declaration> {
        self.chain()
            .find_map(|scope| scope.declarations.iter().rev().find(|d| d.name == name))
    }

    /// Like [`resolve`](Self::resolve) but ignores the file scope.
    pub fn resolve_local(&self, name: &str) -> Option<&Declaration> {
        self.chain()
            .filter(|scope| scope.kind != ScopeKind::File)
            .find_map(|scope| scope.declarations.iter().rev().find(|d| d.name == name))
    }

    /// A member of the nearest enclosing class.
    pub fn resolve_member(&self, name: &str) -> Option<&Declaration> {
        self.chain()
            .find(|scope| scope.kind == ScopeKind::Class)
            .and_then(|scope| scope.declarations.iter().find(|d| d.name == name))
    }

    /// Name of the nearest enclosing class.
    pub fn class_name(&self) -> Option<&str> {
        self.chain().find_map(|scope| scope.class_name.as_deref())
    }

    pub fn in_class(&self) -> bool {
        self.chain().any(|scope| scope.kind == ScopeKind::Class)
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
